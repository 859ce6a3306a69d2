//! Type-directed conversion between records and a tree of primitives.
//!
//! The tree is a [`serde_json::Value`]: records become mappings, sequences
//! become arrays, and everything else is a scalar. Conversion is driven by the
//! [`Encode`] and [`Decode`] traits; records additionally implement [`Record`],
//! usually through `#[derive(Record)]`.
//!
//! Records always encode and decode through [`Codec::encode_record`] and
//! [`Codec::decode_record`]. This is where the codec applies the field
//! encryption registered for a record type, which makes encryption compose
//! with nesting: a record inside another record still goes through its own
//! adapter.
//!
//! # Examples
//!
//! ```
//! use strata::{Codec, Record};
//!
//! #[derive(Clone, Debug, PartialEq, Record)]
//! struct Address {
//!     street: String,
//!     number: u32,
//! }
//!
//! let codec = Codec::new();
//! let address = Address { street: "Main".to_string(), number: 12 };
//!
//! let tree = codec.encode(&address)?;
//! assert_eq!(tree["street"], "Main");
//!
//! let decoded: Address = codec.decode(tree)?;
//! assert_eq!(decoded, address);
//! # Ok::<_, strata::Error>(())
//! ```

mod impls;
mod schema;

use std::any::{self, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

pub use self::schema::{Field, FieldKind, ScalarKind, Schema};
use crate::encryption::{Encryption, KeyRepository};
use crate::{ConfigError, Error};

/// Encoded fields of a record.
pub type Fields = Map<String, Value>;

/// Converts a value into a tree.
pub trait Encode {
    fn encode(&self, codec: &Codec) -> Result<Value, Error>;

    /// Ciphertext held by a value that was read back without its key.
    ///
    /// Encrypted fields returning `Some` are stored as they are instead of
    /// being encrypted again.
    fn sealed(&self) -> Option<&str> {
        None
    }
}

/// Reconstructs a value from a tree.
pub trait Decode: Sized {
    /// Decode strategy of the type, recorded in the schema of any record
    /// holding a field of this type.
    fn kind() -> FieldKind;

    fn decode(value: Value, codec: &Codec) -> Result<Self, Error>;

    /// Value used when a record field is absent from the tree.
    ///
    /// Absent fields are an error unless this returns `Some`.
    fn missing() -> Option<Self> {
        None
    }

    /// Value of an encrypted field that could not be decrypted.
    ///
    /// Types returning `None` decode the sealed text like any other string.
    fn shredded(sealed: &str) -> Option<Self> {
        let _ = sealed;
        None
    }
}

/// A structured record with named fields.
pub trait Record: Encode + Decode + 'static {
    /// Field descriptors of the record.
    fn schema() -> &'static Schema;

    /// Encodes every field, without any encryption applied.
    fn encode_fields(&self, codec: &Codec) -> Result<Fields, Error>;

    /// Names of the fields still holding ciphertext from a previous decode.
    fn sealed_fields(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Builds the record from plaintext fields. Keys unknown to the record are
    /// ignored.
    fn decode_fields(fields: RecordFields, codec: &Codec) -> Result<Self, Error>;

    /// Builds the record from a value that is not a mapping.
    ///
    /// Records with a single field construct it from the value directly.
    fn from_scalar(value: Value, codec: &Codec) -> Result<Self, Error> {
        let _ = codec;
        Err(Error::NotAMapping {
            record: Self::schema().name(),
            found: value_kind(&value),
        })
    }
}

/// Fields of a record being decoded, with the ones left sealed by decryption.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordFields {
    fields: Fields,
    sealed: Vec<&'static str>,
}

impl RecordFields {
    pub fn new(fields: Fields) -> Self {
        RecordFields {
            fields,
            sealed: Vec::new(),
        }
    }

    pub(crate) fn with_sealed(fields: Fields, sealed: Vec<&'static str>) -> Self {
        RecordFields { fields, sealed }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Whether `field` still holds ciphertext that could not be decrypted.
    pub fn is_sealed(&self, field: &str) -> bool {
        self.sealed.contains(&field)
    }

    pub fn into_inner(self) -> Fields {
        self.fields
    }
}

impl From<Fields> for RecordFields {
    fn from(fields: Fields) -> Self {
        RecordFields::new(fields)
    }
}

/// Encodes and decodes values, applying field encryption to the record types
/// it was configured with.
///
/// A default codec performs plain structural conversion. Use
/// [`Codec::builder`] to wire encryption.
#[derive(Clone, Default)]
pub struct Codec {
    keys: Option<KeyRepository>,
    encryptions: Arc<HashMap<TypeId, Encryption>>,
}

impl Codec {
    /// Creates a codec without any encryption.
    pub fn new() -> Self {
        Codec::default()
    }

    /// Starts configuring a codec whose encrypted records use keys from
    /// `keys`.
    pub fn builder(keys: KeyRepository) -> CodecBuilder {
        CodecBuilder {
            keys,
            encryptions: HashMap::new(),
        }
    }

    pub fn key_repository(&self) -> Option<&KeyRepository> {
        self.keys.as_ref()
    }

    /// Returns the encryption adapter wired for `T`, if any.
    pub fn encryption_for<T: 'static>(&self) -> Option<&Encryption> {
        self.encryptions.get(&TypeId::of::<T>())
    }

    pub fn encode<T>(&self, value: &T) -> Result<Value, Error>
    where
        T: Encode + ?Sized,
    {
        value.encode(self)
    }

    pub fn decode<T>(&self, value: Value) -> Result<T, Error>
    where
        T: Decode,
    {
        T::decode(value, self)
    }

    /// Encodes a record, encrypting its fields if an adapter is wired for
    /// `T`.
    pub fn encode_record<T>(&self, record: &T) -> Result<Value, Error>
    where
        T: Record,
    {
        let fields = record.encode_fields(self)?;
        let fields = match self.adapter::<T>() {
            Some((encryption, keys)) => {
                encryption.encrypt(fields, &record.sealed_fields(), keys)?
            }
            None => fields,
        };

        Ok(Value::Object(fields))
    }

    /// Decodes a record, decrypting its fields first if an adapter is wired for
    /// `T`.
    ///
    /// Values which are not mappings are handed to [`Record::from_scalar`].
    pub fn decode_record<T>(&self, value: Value) -> Result<T, Error>
    where
        T: Record,
    {
        let fields = match value {
            Value::Object(fields) => fields,
            value => return T::from_scalar(value, self),
        };
        let fields = match self.adapter::<T>() {
            Some((encryption, keys)) => encryption.decrypt(fields, keys)?,
            None => RecordFields::new(fields),
        };

        T::decode_fields(fields, self)
    }

    /// Takes a field out of `fields` and decodes it.
    ///
    /// Fields left sealed by decryption become [`Decode::shredded`] when the
    /// type supports it.
    pub fn decode_field<T>(
        &self,
        fields: &mut RecordFields,
        record: &'static str,
        field: &'static str,
    ) -> Result<T, Error>
    where
        T: Decode,
    {
        let value = fields.fields.remove(field);
        if fields.is_sealed(field) {
            if let Some(shredded) = value.as_ref().and_then(Value::as_str).and_then(T::shredded) {
                return Ok(shredded);
            }
        }

        match value {
            Some(value) => T::decode(value, self),
            None => T::missing().ok_or(Error::MissingField { record, field }),
        }
    }

    fn adapter<T: 'static>(&self) -> Option<(&Encryption, &KeyRepository)> {
        let encryption = self.encryption_for::<T>()?;
        let keys = self.keys.as_ref()?;
        Some((encryption, keys))
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("keys", &self.keys)
            .field(
                "encrypted",
                &self
                    .encryptions
                    .values()
                    .map(|encryption| encryption.record())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builds a [`Codec`] with encrypted record types.
pub struct CodecBuilder {
    keys: KeyRepository,
    encryptions: HashMap<TypeId, Encryption>,
}

impl CodecBuilder {
    /// Encrypts `encrypted_fields` of record `T` with the key of the subject
    /// found in `subject_field`.
    ///
    /// Fails if `T` is not a record, or if any named field doesn't exist on
    /// it.
    ///
    /// Once the subject's key is deleted, only `String`, [`Value`] and
    /// [`Protected`](crate::Protected) fields (optional or not) still decode.
    /// Other encrypted fields, such as integers or nested records, make the
    /// whole record fail to decode, so wrap them in `Protected<T>`. A warning
    /// is logged for each such field.
    pub fn encrypt<T>(
        mut self,
        subject_field: &str,
        encrypted_fields: &[&str],
    ) -> Result<Self, ConfigError>
    where
        T: Decode + 'static,
    {
        let encryption = Encryption::new(
            T::kind(),
            any::type_name::<T>(),
            subject_field,
            encrypted_fields,
        )?;
        self.encryptions.insert(TypeId::of::<T>(), encryption);
        Ok(self)
    }

    pub fn build(self) -> Codec {
        Codec {
            keys: Some(self.keys),
            encryptions: Arc::new(self.encryptions),
        }
    }
}

/// Short name of a tree value's shape, for error messages.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::{Codec, Decode, FieldKind, Record, ScalarKind};
    use crate::tests_cfg::records::{Address, Contact, Person, Tag};
    use crate::{Error, Protected};

    fn person() -> Person {
        Person {
            id: "p-1".to_string(),
            name: "Alice".to_string(),
            age: 34,
            score: 9.5,
            active: true,
            nickname: None,
            address: Address {
                street: "Main Street".to_string(),
                number: 12,
            },
            tags: vec![
                Tag {
                    label: "a".to_string(),
                },
                Tag {
                    label: "b".to_string(),
                },
            ],
            contacts: HashMap::from([(
                "home".to_string(),
                Contact {
                    kind: "phone".to_string(),
                    value: "555-0100".to_string(),
                },
            )]),
        }
    }

    #[test]
    fn record_encodes_to_mapping() -> Result<(), Error> {
        let tree = Codec::new().encode(&person())?;

        assert_eq!(tree["id"], "p-1");
        assert_eq!(tree["age"], 34);
        assert_eq!(tree["score"], 9.5);
        assert_eq!(tree["nickname"], json!(null));
        assert_eq!(
            tree["address"],
            json!({ "street": "Main Street", "number": 12 })
        );
        assert_eq!(tree["tags"], json!([{ "label": "a" }, { "label": "b" }]));
        assert_eq!(tree["contacts"]["home"]["value"], "555-0100");

        Ok(())
    }

    #[test]
    fn round_trip() -> Result<(), Error> {
        let codec = Codec::new();
        let person = person();

        let decoded: Person = codec.decode(codec.encode(&person)?)?;
        assert_eq!(decoded, person);

        Ok(())
    }

    #[test]
    fn extra_keys_are_ignored() -> Result<(), Error> {
        let address: Address = Codec::new().decode(json!({
            "street": "Main Street",
            "number": 12,
            "postcode": "1234",
        }))?;

        assert_eq!(address.street, "Main Street");
        assert_eq!(address.number, 12);

        Ok(())
    }

    #[test]
    fn missing_optional_field_is_none() -> Result<(), Error> {
        let mut tree = Codec::new().encode(&person())?;
        if let Some(fields) = tree.as_object_mut() {
            fields.remove("nickname");
        }

        let decoded: Person = Codec::new().decode(tree)?;
        assert_eq!(decoded.nickname, None);

        Ok(())
    }

    #[test]
    fn missing_field_fails() {
        let res = Codec::new().decode::<Address>(json!({ "street": "Main Street" }));

        assert!(matches!(
            res,
            Err(Error::MissingField {
                record: "Address",
                field: "number"
            })
        ));
    }

    #[test]
    fn scalar_constructs_single_field_record() -> Result<(), Error> {
        let tags: Vec<Tag> = Codec::new().decode(json!(["x", { "label": "y" }]))?;

        assert_eq!(
            tags,
            vec![
                Tag {
                    label: "x".to_string()
                },
                Tag {
                    label: "y".to_string()
                },
            ]
        );

        Ok(())
    }

    #[test]
    fn scalar_fails_for_multi_field_record() {
        let res = Codec::new().decode::<Address>(json!("Main Street"));

        assert!(matches!(
            res,
            Err(Error::NotAMapping {
                record: "Address",
                found: "string"
            })
        ));
    }

    #[test]
    fn nested_failure_is_not_wrapped() {
        let mut tree = Codec::new().encode(&person()).unwrap();
        tree["address"]["number"] = json!("twelve");

        let res = Codec::new().decode::<Person>(tree);
        assert!(matches!(
            res,
            Err(Error::TypeMismatch {
                expected: "integer",
                found: "string"
            })
        ));
    }

    #[test]
    fn decodes_maps_of_records() -> Result<(), Error> {
        let contacts: HashMap<String, Contact> = Codec::new().decode(json!({
            "work": { "kind": "email", "value": "a@example.com" },
        }))?;

        assert_eq!(contacts["work"].kind, "email");

        Ok(())
    }

    #[test]
    fn schema_describes_fields() {
        let schema = Person::schema();

        assert_eq!(schema.name(), "Person");
        assert!(matches!(
            schema.field("age").map(|field| field.kind()),
            Some(FieldKind::Scalar(ScalarKind::Integer))
        ));
        assert!(matches!(
            schema.field("address").and_then(|field| field.kind().schema()),
            Some(schema) if schema.name() == "Address"
        ));
        assert!(matches!(
            schema.field("tags").map(|field| field.kind()),
            Some(FieldKind::Seq(_))
        ));
        assert!(matches!(
            schema.field("contacts").map(|field| field.kind()),
            Some(FieldKind::Map(_))
        ));
        assert!(matches!(
            schema.field("nickname").map(|field| field.kind()),
            Some(FieldKind::Optional(_))
        ));
        assert!(matches!(Person::kind(), FieldKind::Record(_)));
    }

    #[test]
    fn ciphertext_tolerance_follows_kind() {
        assert!(String::kind().tolerates_ciphertext());
        assert!(Option::<String>::kind().tolerates_ciphertext());
        assert!(Protected::<u32>::kind().tolerates_ciphertext());
        assert!(Option::<Protected<Address>>::kind().tolerates_ciphertext());
        assert!(!u32::kind().tolerates_ciphertext());
        assert!(!Option::<Address>::kind().tolerates_ciphertext());
        assert!(!Vec::<String>::kind().tolerates_ciphertext());
    }
}
