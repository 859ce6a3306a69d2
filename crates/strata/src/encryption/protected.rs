use serde_json::Value;

use crate::codec::{Codec, Decode, Encode, FieldKind};
use crate::Error;

/// An encrypted field which may have been crypto-shredded.
///
/// Decodes to [`Protected::Plain`] while the subject's key exists. Once the key
/// is deleted the field can no longer be decrypted, and it decodes to
/// [`Protected::Shredded`] holding the sealed ciphertext instead of failing.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Protected<T> {
    Plain(T),
    Shredded(String),
}

impl<T> Protected<T> {
    pub fn as_plain(&self) -> Option<&T> {
        match self {
            Protected::Plain(value) => Some(value),
            Protected::Shredded(_) => None,
        }
    }

    pub fn into_plain(self) -> Option<T> {
        match self {
            Protected::Plain(value) => Some(value),
            Protected::Shredded(_) => None,
        }
    }

    pub fn is_shredded(&self) -> bool {
        matches!(self, Protected::Shredded(_))
    }
}

impl<T> From<T> for Protected<T> {
    fn from(value: T) -> Self {
        Protected::Plain(value)
    }
}

impl<T: Encode> Encode for Protected<T> {
    fn encode(&self, codec: &Codec) -> Result<Value, Error> {
        match self {
            Protected::Plain(value) => value.encode(codec),
            Protected::Shredded(sealed) => Ok(Value::String(sealed.clone())),
        }
    }

    fn sealed(&self) -> Option<&str> {
        match self {
            Protected::Plain(_) => None,
            Protected::Shredded(sealed) => Some(sealed),
        }
    }
}

impl<T: Decode> Decode for Protected<T> {
    fn kind() -> FieldKind {
        FieldKind::Protected(Box::new(T::kind()))
    }

    fn decode(value: Value, codec: &Codec) -> Result<Self, Error> {
        T::decode(value, codec).map(Protected::Plain)
    }

    fn missing() -> Option<Self> {
        T::missing().map(Protected::Plain)
    }

    fn shredded(sealed: &str) -> Option<Self> {
        Some(Protected::Shredded(sealed.to_string()))
    }
}
