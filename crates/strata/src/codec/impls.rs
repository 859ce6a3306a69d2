use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use serde_json::{Map, Number, Value};
use uuid::Uuid;

use super::{Codec, Decode, Encode, FieldKind, ScalarKind};
use crate::Error;

macro_rules! impl_integer {
    ($as:ident => $($t:ty),*) => {
        $(
            impl Encode for $t {
                fn encode(&self, _codec: &Codec) -> Result<Value, Error> {
                    Ok(Value::from(*self))
                }
            }

            impl Decode for $t {
                fn kind() -> FieldKind {
                    FieldKind::Scalar(ScalarKind::Integer)
                }

                fn decode(value: Value, _codec: &Codec) -> Result<Self, Error> {
                    let Value::Number(n) = &value else {
                        return Err(Error::type_mismatch("integer", &value));
                    };
                    let n = n.$as().ok_or_else(|| Error::OutOfRange {
                        value: n.to_string(),
                        target: stringify!($t),
                    })?;

                    <$t>::try_from(n).map_err(|_| Error::OutOfRange {
                        value: n.to_string(),
                        target: stringify!($t),
                    })
                }
            }
        )*
    };
}

impl_integer!(as_i64 => i8, i16, i32, i64, isize);
impl_integer!(as_u64 => u8, u16, u32, u64, usize);

macro_rules! impl_float {
    ($($t:ty),*) => {
        $(
            impl Encode for $t {
                fn encode(&self, _codec: &Codec) -> Result<Value, Error> {
                    Number::from_f64(f64::from(*self))
                        .map(Value::Number)
                        .ok_or(Error::NonFiniteFloat)
                }
            }

            impl Decode for $t {
                fn kind() -> FieldKind {
                    FieldKind::Scalar(ScalarKind::Float)
                }

                fn decode(value: Value, _codec: &Codec) -> Result<Self, Error> {
                    value
                        .as_f64()
                        .map(|n| n as $t)
                        .ok_or_else(|| Error::type_mismatch("float", &value))
                }
            }
        )*
    };
}

impl_float!(f32, f64);

impl Encode for bool {
    fn encode(&self, _codec: &Codec) -> Result<Value, Error> {
        Ok(Value::Bool(*self))
    }
}

impl Decode for bool {
    fn kind() -> FieldKind {
        FieldKind::Scalar(ScalarKind::Bool)
    }

    fn decode(value: Value, _codec: &Codec) -> Result<Self, Error> {
        value
            .as_bool()
            .ok_or_else(|| Error::type_mismatch("bool", &value))
    }
}

impl Encode for String {
    fn encode(&self, _codec: &Codec) -> Result<Value, Error> {
        Ok(Value::String(self.clone()))
    }
}

impl Encode for str {
    fn encode(&self, _codec: &Codec) -> Result<Value, Error> {
        Ok(Value::String(self.to_string()))
    }
}

impl Decode for String {
    fn kind() -> FieldKind {
        FieldKind::Scalar(ScalarKind::String)
    }

    fn decode(value: Value, _codec: &Codec) -> Result<Self, Error> {
        match value {
            Value::String(s) => Ok(s),
            value => Err(Error::type_mismatch("string", &value)),
        }
    }
}

impl Encode for char {
    fn encode(&self, _codec: &Codec) -> Result<Value, Error> {
        Ok(Value::String(self.to_string()))
    }
}

impl Decode for char {
    fn kind() -> FieldKind {
        FieldKind::Scalar(ScalarKind::String)
    }

    fn decode(value: Value, codec: &Codec) -> Result<Self, Error> {
        let s = String::decode(value, codec)?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(Error::InvalidValue {
                expected: "char",
                value: s,
            }),
        }
    }
}

impl Encode for Uuid {
    fn encode(&self, _codec: &Codec) -> Result<Value, Error> {
        Ok(Value::String(self.to_string()))
    }
}

impl Decode for Uuid {
    fn kind() -> FieldKind {
        FieldKind::Scalar(ScalarKind::String)
    }

    fn decode(value: Value, codec: &Codec) -> Result<Self, Error> {
        let s = String::decode(value, codec)?;
        Uuid::parse_str(&s).map_err(|_| Error::InvalidValue {
            expected: "uuid",
            value: s,
        })
    }
}

impl Encode for Value {
    fn encode(&self, _codec: &Codec) -> Result<Value, Error> {
        Ok(self.clone())
    }
}

impl Decode for Value {
    fn kind() -> FieldKind {
        FieldKind::Scalar(ScalarKind::Any)
    }

    fn decode(value: Value, _codec: &Codec) -> Result<Self, Error> {
        Ok(value)
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, codec: &Codec) -> Result<Value, Error> {
        (**self).encode(codec)
    }

    fn sealed(&self) -> Option<&str> {
        (**self).sealed()
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode(&self, codec: &Codec) -> Result<Value, Error> {
        (**self).encode(codec)
    }

    fn sealed(&self) -> Option<&str> {
        (**self).sealed()
    }
}

impl<T: Decode> Decode for Box<T> {
    fn kind() -> FieldKind {
        T::kind()
    }

    fn decode(value: Value, codec: &Codec) -> Result<Self, Error> {
        T::decode(value, codec).map(Box::new)
    }

    fn missing() -> Option<Self> {
        T::missing().map(Box::new)
    }

    fn shredded(sealed: &str) -> Option<Self> {
        T::shredded(sealed).map(Box::new)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, codec: &Codec) -> Result<Value, Error> {
        match self {
            Some(value) => value.encode(codec),
            None => Ok(Value::Null),
        }
    }

    fn sealed(&self) -> Option<&str> {
        self.as_ref().and_then(Encode::sealed)
    }
}

impl<T: Decode> Decode for Option<T> {
    fn kind() -> FieldKind {
        FieldKind::Optional(Box::new(T::kind()))
    }

    fn decode(value: Value, codec: &Codec) -> Result<Self, Error> {
        match value {
            Value::Null => Ok(None),
            value => T::decode(value, codec).map(Some),
        }
    }

    fn missing() -> Option<Self> {
        Some(None)
    }

    fn shredded(sealed: &str) -> Option<Self> {
        T::shredded(sealed).map(Some)
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, codec: &Codec) -> Result<Value, Error> {
        self.iter()
            .map(|item| item.encode(codec))
            .collect::<Result<_, _>>()
            .map(Value::Array)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, codec: &Codec) -> Result<Value, Error> {
        self.as_slice().encode(codec)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn kind() -> FieldKind {
        FieldKind::Seq(Box::new(T::kind()))
    }

    fn decode(value: Value, codec: &Codec) -> Result<Self, Error> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| T::decode(item, codec))
                .collect(),
            value => Err(Error::type_mismatch("sequence", &value)),
        }
    }
}

fn encode_entries<'a, T, I>(entries: I, codec: &Codec) -> Result<Value, Error>
where
    T: Encode + 'a,
    I: IntoIterator<Item = (&'a String, &'a T)>,
{
    entries
        .into_iter()
        .map(|(key, value)| Ok((key.clone(), value.encode(codec)?)))
        .collect::<Result<Map<_, _>, Error>>()
        .map(Value::Object)
}

fn decode_entries<T, C>(value: Value, codec: &Codec) -> Result<C, Error>
where
    T: Decode,
    C: FromIterator<(String, T)>,
{
    match value {
        Value::Object(entries) => entries
            .into_iter()
            .map(|(key, value)| T::decode(value, codec).map(|value| (key, value)))
            .collect(),
        value => Err(Error::type_mismatch("mapping", &value)),
    }
}

impl<T: Encode, S> Encode for HashMap<String, T, S> {
    fn encode(&self, codec: &Codec) -> Result<Value, Error> {
        encode_entries(self, codec)
    }
}

impl<T: Decode, S: BuildHasher + Default> Decode for HashMap<String, T, S> {
    fn kind() -> FieldKind {
        FieldKind::Map(Box::new(T::kind()))
    }

    fn decode(value: Value, codec: &Codec) -> Result<Self, Error> {
        decode_entries(value, codec)
    }
}

impl<T: Encode> Encode for BTreeMap<String, T> {
    fn encode(&self, codec: &Codec) -> Result<Value, Error> {
        encode_entries(self, codec)
    }
}

impl<T: Decode> Decode for BTreeMap<String, T> {
    fn kind() -> FieldKind {
        FieldKind::Map(Box::new(T::kind()))
    }

    fn decode(value: Value, codec: &Codec) -> Result<Self, Error> {
        decode_entries(value, codec)
    }
}
