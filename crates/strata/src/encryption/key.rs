use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use base64::Engine;
use rand::RngCore;
use thiserror::Error;
use tracing::info;

use crate::Error;

/// Size of an [`EncryptionKey`] in bytes.
pub const KEY_BYTES: usize = 32;

/// A 256-bit symmetric key owned by a subject.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_BYTES]);

impl EncryptionKey {
    /// Generates a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        EncryptionKey(bytes)
    }

    pub fn from_bytes(bytes: [u8; KEY_BYTES]) -> Self {
        EncryptionKey(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_BYTES] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}

/// Base64 encoding of the key material.
impl fmt::Display for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&base64::engine::general_purpose::STANDARD.encode(self.0))
    }
}

impl FromStr for EncryptionKey {
    type Err = InvalidEncryptionKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(s.trim())
            .map_err(|_| InvalidEncryptionKey)?;
        let bytes = bytes
            .as_slice()
            .try_into()
            .map_err(|_| InvalidEncryptionKey)?;

        Ok(EncryptionKey(bytes))
    }
}

#[derive(Clone, Copy, Debug, Error)]
#[error("invalid encryption key encoding")]
pub struct InvalidEncryptionKey;

/// Storage of encryption keys by subject id.
///
/// Called synchronously from inside encoding and decoding, so
/// implementations should be fast. Backends report their own failures through
/// [`Error::KeyStore`].
pub trait KeyStore: Send + Sync {
    fn get_key(&self, subject: &str) -> Result<Option<EncryptionKey>, Error>;

    fn put_key(&self, subject: &str, key: EncryptionKey) -> Result<(), Error>;

    /// Deletes the key of a subject. Deleting an absent key is not an error.
    fn delete_key(&self, subject: &str) -> Result<(), Error>;
}

/// Shared handle over a [`KeyStore`], creating keys on demand.
#[derive(Clone)]
pub struct KeyRepository {
    store: Arc<dyn KeyStore>,
}

impl KeyRepository {
    pub fn new(store: impl KeyStore + 'static) -> Self {
        KeyRepository {
            store: Arc::new(store),
        }
    }

    pub fn from_arc(store: Arc<dyn KeyStore>) -> Self {
        KeyRepository { store }
    }

    /// Returns the key of `subject`, generating and storing one if none exists.
    ///
    /// When two callers race on the first key of a subject, both return the
    /// key read back from the store.
    pub fn get_or_create(&self, subject: &str) -> Result<EncryptionKey, Error> {
        if let Some(key) = self.store.get_key(subject)? {
            return Ok(key);
        }

        self.store.put_key(subject, EncryptionKey::generate())?;
        info!(subject, "generated encryption key");

        self.store
            .get_key(subject)?
            .ok_or_else(|| Error::key_store(KeyVanished(subject.to_string())))
    }

    /// Returns the key of `subject`, never creating one.
    pub fn get(&self, subject: &str) -> Result<Option<EncryptionKey>, Error> {
        self.store.get_key(subject)
    }

    /// Deletes the key of `subject`, making everything encrypted for it
    /// permanently unreadable.
    pub fn delete(&self, subject: &str) -> Result<(), Error> {
        self.store.delete_key(subject)?;
        info!(subject, "deleted encryption key");
        Ok(())
    }
}

impl fmt::Debug for KeyRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRepository").finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
#[error("key for subject '{0}' vanished after it was stored")]
struct KeyVanished(String);
