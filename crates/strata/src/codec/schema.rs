use std::fmt;

/// Type descriptor of a record, built once per record type.
///
/// Decoding a record never inspects types at runtime: each field carries the
/// [`FieldKind`] its declared type reported when the schema was built.
#[derive(Clone, Debug)]
pub struct Schema {
    name: &'static str,
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(name: &'static str, fields: Vec<Field>) -> Self {
        Schema { name, fields }
    }

    /// Record type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// A named field of a [`Schema`].
#[derive(Clone, Debug)]
pub struct Field {
    name: &'static str,
    kind: FieldKind,
}

impl Field {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Field { name, kind }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }
}

/// How a value of a declared type is decoded.
#[derive(Clone, Debug)]
pub enum FieldKind {
    /// A primitive taken as-is after a type check.
    Scalar(ScalarKind),
    /// A nested record, decoded through its own schema.
    ///
    /// Stored as a function so self-referencing records don't recurse while
    /// their schema is being built.
    Record(fn() -> &'static Schema),
    /// A mapping of string keys to values of the inner kind.
    Map(Box<FieldKind>),
    /// A sequence of values of the inner kind.
    Seq(Box<FieldKind>),
    /// A value of the inner kind, or null.
    Optional(Box<FieldKind>),
    /// A value of the inner kind which may instead hold ciphertext whose key
    /// has been deleted.
    Protected(Box<FieldKind>),
}

impl FieldKind {
    /// Returns the record schema if this kind describes a record.
    pub fn schema(&self) -> Option<&'static Schema> {
        match self {
            FieldKind::Record(schema) => Some(schema()),
            _ => None,
        }
    }

    /// Whether values of this kind are represented as raw text.
    pub fn is_text(&self) -> bool {
        match self {
            FieldKind::Scalar(ScalarKind::String) => true,
            FieldKind::Protected(inner) => inner.is_text(),
            _ => false,
        }
    }

    /// Whether a field of this kind can still be decoded once its ciphertext
    /// can no longer be decrypted.
    pub fn tolerates_ciphertext(&self) -> bool {
        match self {
            FieldKind::Scalar(ScalarKind::String | ScalarKind::Any) | FieldKind::Protected(_) => true,
            FieldKind::Optional(inner) => inner.tolerates_ciphertext(),
            _ => false,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar(kind) => kind.fmt(f),
            FieldKind::Record(schema) => write!(f, "record '{}'", schema().name()),
            FieldKind::Map(inner) => write!(f, "map of {inner}"),
            FieldKind::Seq(inner) => write!(f, "sequence of {inner}"),
            FieldKind::Optional(inner) => write!(f, "optional {inner}"),
            FieldKind::Protected(inner) => write!(f, "protected {inner}"),
        }
    }
}

/// Primitive value kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Integer,
    Float,
    String,
    /// Any tree value, passed through raw.
    Any,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Integer => "integer",
            ScalarKind::Float => "float",
            ScalarKind::String => "string",
            ScalarKind::Any => "any",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
