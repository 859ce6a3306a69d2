//! Authenticated encryption of single field values.
//!
//! Cipher: AES-256-GCM with a random nonce per value and the subject id bound
//! as associated data, so ciphertext copied between subjects fails to open.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use base64::Engine;
use rand::RngCore;

use super::EncryptionKey;

const NONCE_BYTES: usize = 12;

/// Prefix marking a string as sealed ciphertext.
pub const SEALED_PREFIX: &str = "enc:";

/// Reasons a value could not be sealed or opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CipherError {
    /// The value is not sealed ciphertext.
    Malformed,
    Encrypt,
    /// Authentication failed.
    Decrypt,
}

/// Whether `s` holds sealed ciphertext.
pub fn is_sealed(s: &str) -> bool {
    s.starts_with(SEALED_PREFIX)
}

pub(crate) fn seal(key: &EncryptionKey, subject: &str, plaintext: &str) -> Result<String, CipherError> {
    let mut nonce_bytes = [0u8; NONCE_BYTES];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CipherError::Encrypt)?;
    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext.as_bytes(),
                aad: subject.as_bytes(),
            },
        )
        .map_err(|_| CipherError::Encrypt)?;

    let mut sealed = Vec::with_capacity(NONCE_BYTES + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);

    Ok(format!(
        "{SEALED_PREFIX}{}",
        base64::engine::general_purpose::STANDARD.encode(sealed)
    ))
}

pub(crate) fn open(key: &EncryptionKey, subject: &str, sealed: &str) -> Result<String, CipherError> {
    let encoded = sealed
        .strip_prefix(SEALED_PREFIX)
        .ok_or(CipherError::Malformed)?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|_| CipherError::Malformed)?;
    if bytes.len() < NONCE_BYTES {
        return Err(CipherError::Malformed);
    }
    let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_BYTES);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CipherError::Decrypt)?;
    let plaintext = cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad: subject.as_bytes(),
            },
        )
        .map_err(|_| CipherError::Decrypt)?;

    String::from_utf8(plaintext).map_err(|_| CipherError::Decrypt)
}

#[cfg(test)]
mod tests {
    use super::{is_sealed, open, seal, CipherError};
    use crate::encryption::EncryptionKey;

    #[test]
    fn seal_then_open() {
        let key = EncryptionKey::generate();

        let sealed = seal(&key, "abc", "Alice").unwrap();
        assert!(is_sealed(&sealed));
        assert!(!sealed.contains("Alice"));
        assert_eq!(open(&key, "abc", &sealed).unwrap(), "Alice");
    }

    #[test]
    fn nonces_differ() {
        let key = EncryptionKey::generate();

        assert_ne!(
            seal(&key, "abc", "Alice").unwrap(),
            seal(&key, "abc", "Alice").unwrap()
        );
    }

    #[test]
    fn wrong_key_or_subject_fails() {
        let key = EncryptionKey::generate();
        let sealed = seal(&key, "abc", "Alice").unwrap();

        assert_eq!(
            open(&EncryptionKey::generate(), "abc", &sealed),
            Err(CipherError::Decrypt)
        );
        assert_eq!(open(&key, "xyz", &sealed), Err(CipherError::Decrypt));
    }

    #[test]
    fn unsealed_text_is_malformed() {
        let key = EncryptionKey::generate();

        assert_eq!(open(&key, "abc", "Alice"), Err(CipherError::Malformed));
        assert_eq!(open(&key, "abc", "enc:!!"), Err(CipherError::Malformed));
        assert_eq!(open(&key, "abc", "enc:AAAA"), Err(CipherError::Malformed));
    }
}
