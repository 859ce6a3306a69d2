use std::collections::HashMap;
use std::sync::RwLock;

use strata::{EncryptionKey, Error, KeyStore};

/// An in memory key store.
///
/// Keys are lost when the store is dropped, shredding everything encrypted
/// with them.
#[derive(Debug, Default)]
pub struct InMemoryKeyStore {
    keys: RwLock<HashMap<String, EncryptionKey>>,
}

impl InMemoryKeyStore {
    /// Creates an empty key store.
    pub fn new() -> Self {
        InMemoryKeyStore::default()
    }

    /// Returns whether a key is stored for `subject`.
    pub fn contains(&self, subject: &str) -> Result<bool, Error> {
        let keys_lock = self.keys.read().map_err(|_| Error::RwPoison)?;
        Ok(keys_lock.contains_key(subject))
    }
}

impl KeyStore for InMemoryKeyStore {
    fn get_key(&self, subject: &str) -> Result<Option<EncryptionKey>, Error> {
        let keys_lock = self.keys.read().map_err(|_| Error::RwPoison)?;
        Ok(keys_lock.get(subject).cloned())
    }

    fn put_key(&self, subject: &str, key: EncryptionKey) -> Result<(), Error> {
        let mut keys_lock = self.keys.write().map_err(|_| Error::RwPoison)?;
        // The first key stored for a subject wins.
        keys_lock.entry(subject.to_string()).or_insert(key);
        Ok(())
    }

    fn delete_key(&self, subject: &str) -> Result<(), Error> {
        let mut keys_lock = self.keys.write().map_err(|_| Error::RwPoison)?;
        keys_lock.remove(subject);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use strata::{EncryptionKey, KeyRepository, KeyStore};

    use super::InMemoryKeyStore;

    #[test]
    fn first_key_wins() -> Result<(), strata::Error> {
        let store = InMemoryKeyStore::new();
        let first = EncryptionKey::generate();

        store.put_key("abc", first.clone())?;
        store.put_key("abc", EncryptionKey::generate())?;
        assert_eq!(store.get_key("abc")?, Some(first));

        Ok(())
    }

    #[test]
    fn concurrent_creation_converges() {
        let store: Arc<dyn KeyStore> = Arc::new(InMemoryKeyStore::new());
        let keys = KeyRepository::from_arc(store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let keys = keys.clone();
                thread::spawn(move || keys.get_or_create("abc"))
            })
            .collect();
        let created: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap().unwrap())
            .collect();

        assert!(created.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn delete_is_idempotent() -> Result<(), strata::Error> {
        let store = InMemoryKeyStore::new();

        store.put_key("abc", EncryptionKey::generate())?;
        assert!(store.contains("abc")?);
        store.delete_key("abc")?;
        store.delete_key("abc")?;
        assert!(!store.contains("abc")?);

        Ok(())
    }
}
