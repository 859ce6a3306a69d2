//! Field-level encryption with per-subject keys.
//!
//! An [`Encryption`] adapter is wired around a record type with
//! [`CodecBuilder::encrypt`](crate::CodecBuilder::encrypt). When the codec
//! encodes that record, the adapter reads the subject id from one of its
//! fields, fetches (or creates) the subject's key, and replaces each encrypted
//! field with sealed ciphertext. Decoding reverses this.
//!
//! Deleting a subject's key with [`KeyRepository::delete`] is crypto-shredding:
//! the ciphertext can never be opened again. Decoding such a record leaves the
//! sealed text in place instead of failing, so `String` and [`Protected`]
//! fields still decode.

mod cipher;
mod key;
mod protected;

use serde_json::Value;
use tracing::{debug, warn};

pub use self::cipher::{is_sealed, SEALED_PREFIX};
pub use self::key::{EncryptionKey, InvalidEncryptionKey, KeyRepository, KeyStore, KEY_BYTES};
pub use self::protected::Protected;
use self::cipher::CipherError;
use crate::codec::{value_kind, Field, FieldKind, Fields, RecordFields, Schema};
use crate::{ConfigError, Error};

/// Encrypting adapter of one record type.
#[derive(Clone, Debug)]
pub struct Encryption {
    schema: &'static Schema,
    subject: &'static Field,
    encrypted: Vec<&'static Field>,
}

impl Encryption {
    /// Validates the configuration against the record's schema.
    ///
    /// `kind` is the decode strategy of the configured type and must describe a
    /// record. Every missing field is reported at once.
    pub fn new(
        kind: FieldKind,
        type_name: &'static str,
        subject_field: &str,
        encrypted_fields: &[&str],
    ) -> Result<Self, ConfigError> {
        let schema = kind.schema().ok_or(ConfigError::NotARecord(type_name))?;

        let mut missing = Vec::new();
        let subject = schema.field(subject_field);
        if subject.is_none() {
            missing.push(subject_field.to_string());
        }
        let mut encrypted = Vec::with_capacity(encrypted_fields.len());
        for name in encrypted_fields {
            match schema.field(name) {
                Some(field) => encrypted.push(field),
                None => missing.push(name.to_string()),
            }
        }

        let subject = match subject {
            Some(subject) if missing.is_empty() => subject,
            _ => {
                return Err(ConfigError::MissingFields {
                    record: schema.name(),
                    fields: missing,
                })
            }
        };

        for field in &encrypted {
            if field.name() == subject.name() {
                warn!(
                    record = schema.name(),
                    field = field.name(),
                    "subject field is encrypted, records will not decrypt"
                );
            } else if !field.kind().tolerates_ciphertext() {
                warn!(
                    record = schema.name(),
                    field = field.name(),
                    kind = %field.kind(),
                    "encrypted field will fail to decode once its key is deleted, wrap it in Protected"
                );
            }
        }

        Ok(Encryption {
            schema,
            subject,
            encrypted,
        })
    }

    /// Name of the encrypted record.
    pub fn record(&self) -> &'static str {
        self.schema.name()
    }

    pub fn subject_field(&self) -> &'static str {
        self.subject.name()
    }

    pub fn encrypted_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.encrypted.iter().map(|field| field.name())
    }

    /// Replaces each encrypted field with its sealed ciphertext, creating the
    /// subject's key if needed.
    ///
    /// Fields named in `sealed` already hold ciphertext from a shredded read
    /// and are stored as they are.
    pub fn encrypt(
        &self,
        mut fields: Fields,
        sealed: &[&str],
        keys: &KeyRepository,
    ) -> Result<Fields, Error> {
        let subject = self.subject(&fields)?.ok_or(Error::MissingField {
            record: self.record(),
            field: self.subject_field(),
        })?;
        let key = keys.get_or_create(&subject)?;

        for field in &self.encrypted {
            let Some(value) = fields.get_mut(field.name()) else {
                continue;
            };
            if sealed.contains(&field.name()) {
                continue;
            }

            let plaintext = render(field.kind(), value)?;
            let sealed =
                cipher::seal(&key, &subject, &plaintext).map_err(|_| Error::Encryption {
                    field: field.name().to_string(),
                })?;
            *value = Value::String(sealed);
        }

        Ok(fields)
    }

    /// Opens each encrypted field and coerces it back to its declared type.
    ///
    /// When the subject has no key, every encrypted field is left sealed. So
    /// is a field sealed under a deleted key, as long as its kind tolerates
    /// ciphertext.
    pub fn decrypt(&self, mut fields: Fields, keys: &KeyRepository) -> Result<RecordFields, Error> {
        let Some(subject) = self.subject(&fields)? else {
            return Ok(RecordFields::new(fields));
        };
        let Some(key) = keys.get(&subject)? else {
            debug!(
                record = self.record(),
                subject = %subject,
                "no encryption key, leaving fields sealed"
            );
            let sealed = self
                .encrypted
                .iter()
                .filter(|field| fields.get(field.name()).is_some_and(Value::is_string))
                .map(|field| field.name())
                .collect();
            return Ok(RecordFields::with_sealed(fields, sealed));
        };

        let mut left_sealed = Vec::new();
        for field in &self.encrypted {
            let Some(value) = fields.get_mut(field.name()) else {
                continue;
            };
            let Value::String(sealed) = value else {
                return Err(Error::MalformedCiphertext {
                    field: field.name().to_string(),
                });
            };

            let plaintext = match cipher::open(&key, &subject, sealed) {
                Ok(plaintext) => plaintext,
                Err(CipherError::Decrypt) if field.kind().tolerates_ciphertext() => {
                    debug!(
                        record = self.record(),
                        field = field.name(),
                        "field sealed under a deleted key"
                    );
                    left_sealed.push(field.name());
                    continue;
                }
                Err(CipherError::Malformed) => {
                    return Err(Error::MalformedCiphertext {
                        field: field.name().to_string(),
                    })
                }
                Err(_) => {
                    return Err(Error::Decryption {
                        field: field.name().to_string(),
                    })
                }
            };

            *value = coerce(field.kind(), plaintext).map_err(|source| Error::Coercion {
                field: field.name().to_string(),
                source,
            })?;
        }

        Ok(RecordFields::with_sealed(fields, left_sealed))
    }

    /// Reads the subject id, a string or a number rendered as text.
    fn subject(&self, fields: &Fields) -> Result<Option<String>, Error> {
        match fields.get(self.subject_field()) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(value) => Err(Error::InvalidSubject {
                field: self.subject_field().to_string(),
                found: value_kind(value),
            }),
        }
    }
}

/// Text form of a field before encryption: raw text for text kinds, JSON text
/// for everything else.
fn render(kind: &FieldKind, value: &Value) -> Result<String, Error> {
    match value {
        Value::String(s) if kind.is_text() => Ok(s.clone()),
        value => Ok(serde_json::to_string(value)?),
    }
}

fn coerce(kind: &FieldKind, plaintext: String) -> Result<Value, serde_json::Error> {
    if kind.is_text() {
        return Ok(Value::String(plaintext));
    }
    serde_json::from_str(&plaintext)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{is_sealed, Encryption, Protected};
    use crate::codec::Decode;
    use crate::tests_cfg::keys::MapKeyStore;
    use crate::tests_cfg::records::{Address, Customer, Invoice, Note};
    use crate::{Codec, ConfigError, Error, KeyRepository};

    fn codec() -> (Codec, KeyRepository) {
        let keys = KeyRepository::new(MapKeyStore::default());
        let codec = Codec::builder(keys.clone())
            .encrypt::<Customer>("id", &["name", "birth_year", "address"])
            .unwrap()
            .build();
        (codec, keys)
    }

    fn customer() -> Customer {
        Customer {
            id: "abc".to_string(),
            name: "Alice".to_string(),
            birth_year: Protected::Plain(1990),
            address: Some(Address {
                street: "Main Street".to_string(),
                number: 12,
            }),
            tier: 3,
        }
    }

    #[test]
    fn encrypts_configured_fields() -> Result<(), Error> {
        let (codec, keys) = codec();

        let tree = codec.encode(&customer())?;
        assert_eq!(tree["id"], "abc");
        assert_eq!(tree["tier"], 3);
        assert_ne!(tree["name"], "Alice");
        assert!(tree["name"].as_str().is_some_and(is_sealed));
        assert!(tree["birth_year"].as_str().is_some_and(is_sealed));
        assert!(tree["address"].as_str().is_some_and(is_sealed));
        assert!(keys.get("abc")?.is_some());

        let decoded: Customer = codec.decode(tree)?;
        assert_eq!(decoded, customer());

        Ok(())
    }

    #[test]
    fn subjects_share_one_key() -> Result<(), Error> {
        let (codec, keys) = codec();

        codec.encode(&customer())?;
        let key = keys.get("abc")?;
        codec.encode(&customer())?;
        assert_eq!(keys.get("abc")?, key);

        Ok(())
    }

    #[test]
    fn numeric_subjects_are_rendered_as_text() -> Result<(), Error> {
        let keys = KeyRepository::new(MapKeyStore::default());
        let codec = Codec::builder(keys.clone())
            .encrypt::<Address>("number", &["street"])
            .unwrap()
            .build();

        let address = Address {
            street: "Main Street".to_string(),
            number: 12,
        };
        let tree = codec.encode(&address)?;
        assert!(keys.get("12")?.is_some());
        assert_eq!(codec.decode::<Address>(tree)?, address);

        Ok(())
    }

    #[test]
    fn shredded_fields_stay_sealed() -> Result<(), Error> {
        let (codec, keys) = codec();

        let mut tree = codec.encode(&customer())?;
        keys.delete("abc")?;

        // Record fields cannot hold ciphertext.
        assert!(matches!(
            codec.decode::<Customer>(tree.clone()),
            Err(Error::NotAMapping {
                record: "Address",
                ..
            })
        ));
        tree["address"] = json!(null);

        let decoded: Customer = codec.decode(tree.clone())?;
        assert_eq!(decoded.id, "abc");
        assert_eq!(decoded.tier, 3);
        assert_eq!(Some(decoded.name.as_str()), tree["name"].as_str());
        assert!(decoded.birth_year.is_shredded());
        assert!(keys.get("abc")?.is_none());

        Ok(())
    }

    #[test]
    fn decoding_never_creates_keys() -> Result<(), Error> {
        let (codec, keys) = codec();

        let tree = codec.encode(&customer())?;
        keys.delete("abc")?;
        let _ = codec.decode::<Customer>(tree);
        assert!(keys.get("abc")?.is_none());

        Ok(())
    }

    #[test]
    fn shredded_values_survive_a_new_key() -> Result<(), Error> {
        let (codec, keys) = codec();

        let mut tree = codec.encode(&customer())?;
        keys.delete("abc")?;
        tree["address"] = json!(null);
        let shredded: Customer = codec.decode(tree)?;

        let decoded: Customer = codec.decode(codec.encode(&shredded)?)?;
        assert!(decoded.birth_year.is_shredded());
        assert_eq!(decoded.name, shredded.name);

        Ok(())
    }

    #[test]
    fn fields_sealed_under_a_deleted_key_stay_sealed() -> Result<(), Error> {
        let keys = KeyRepository::new(MapKeyStore::default());
        let codec = Codec::builder(keys.clone())
            .encrypt::<Customer>("id", &["name", "birth_year"])
            .unwrap()
            .build();

        let tree = codec.encode(&customer())?;
        keys.delete("abc")?;
        keys.get_or_create("abc")?;

        let encryption = codec.encryption_for::<Customer>().unwrap();
        let Value::Object(fields) = tree.clone() else {
            panic!("expected a mapping");
        };
        let fields = encryption.decrypt(fields, &keys)?;
        assert!(fields.is_sealed("name"));
        assert!(fields.is_sealed("birth_year"));
        assert!(!fields.is_sealed("address"));

        let decoded: Customer = codec.decode(tree.clone())?;
        assert_eq!(Some(decoded.name.as_str()), tree["name"].as_str());
        assert!(decoded.birth_year.is_shredded());
        assert_eq!(decoded.address, customer().address);

        Ok(())
    }

    #[test]
    fn prefixed_plaintext_is_encrypted() -> Result<(), Error> {
        let keys = KeyRepository::new(MapKeyStore::default());
        let codec = Codec::builder(keys)
            .encrypt::<Note>("id", &["text"])
            .unwrap()
            .build();
        let note = Note {
            id: "abc".to_string(),
            text: Protected::Plain("enc:my-ssn-123".to_string()),
        };

        let tree = codec.encode(&note)?;
        assert_ne!(tree["text"], "enc:my-ssn-123");
        assert!(!tree.to_string().contains("my-ssn-123"));
        assert_eq!(codec.decode::<Note>(tree)?, note);

        Ok(())
    }

    #[test]
    fn encrypted_records_nest() -> Result<(), Error> {
        let (codec, _keys) = codec();
        let invoice = Invoice {
            number: 7,
            customer: customer(),
        };

        let tree = codec.encode(&invoice)?;
        assert_eq!(tree["number"], 7);
        assert!(tree["customer"]["name"].as_str().is_some_and(is_sealed));
        assert_eq!(codec.decode::<Invoice>(tree)?, invoice);

        Ok(())
    }

    #[test]
    fn tampered_ciphertext_fails() -> Result<(), Error> {
        let (codec, _keys) = codec();

        let mut tree = codec.encode(&customer())?;
        tree["address"] = json!("enc:AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
        assert!(matches!(
            codec.decode::<Customer>(tree.clone()),
            Err(Error::Decryption { .. })
        ));

        tree["name"] = json!("Alice");
        assert!(matches!(
            codec.decode::<Customer>(tree),
            Err(Error::MalformedCiphertext { .. })
        ));

        Ok(())
    }

    #[test]
    fn invalid_subject_fails() {
        let (codec, _keys) = codec();

        let mut tree = Codec::new().encode(&customer()).unwrap();
        tree["id"] = json!(true);
        assert!(matches!(
            codec.decode::<Customer>(tree),
            Err(Error::InvalidSubject { found: "bool", .. })
        ));
    }

    #[test]
    fn missing_fields_are_reported_together() {
        let res = Encryption::new(
            Customer::kind(),
            "Customer",
            "missing_subject",
            &["name", "foo", "bar"],
        );

        assert_eq!(
            res.unwrap_err(),
            ConfigError::MissingFields {
                record: "Customer",
                fields: vec![
                    "missing_subject".to_string(),
                    "foo".to_string(),
                    "bar".to_string()
                ],
            }
        );
    }

    #[test]
    fn only_records_can_be_encrypted() {
        let keys = KeyRepository::new(MapKeyStore::default());

        let res = Codec::builder(keys).encrypt::<Vec<Customer>>("id", &["name"]);
        assert!(matches!(res, Err(ConfigError::NotARecord(_))));
    }
}
