use std::collections::HashMap;
use std::sync::Mutex;

use crate::encryption::{EncryptionKey, KeyStore};
use crate::Error;

/// Key store over a mutex-guarded map.
#[derive(Debug, Default)]
pub struct MapKeyStore(Mutex<HashMap<String, EncryptionKey>>);

impl KeyStore for MapKeyStore {
    fn get_key(&self, subject: &str) -> Result<Option<EncryptionKey>, Error> {
        let keys = self.0.lock().map_err(|_| Error::RwPoison)?;
        Ok(keys.get(subject).cloned())
    }

    fn put_key(&self, subject: &str, key: EncryptionKey) -> Result<(), Error> {
        let mut keys = self.0.lock().map_err(|_| Error::RwPoison)?;
        keys.entry(subject.to_string()).or_insert(key);
        Ok(())
    }

    fn delete_key(&self, subject: &str) -> Result<(), Error> {
        let mut keys = self.0.lock().map_err(|_| Error::RwPoison)?;
        keys.remove(subject);
        Ok(())
    }
}
