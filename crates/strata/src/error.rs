use std::error::Error as StdError;

use thiserror::Error;
use tracing::{metadata::LevelFilter, Level};

#[derive(Error, Debug)]
pub enum Error {
    #[error("decrypted field '{field}' does not fit its declared type: {source}")]
    Coercion {
        field: String,
        source: serde_json::Error,
    },
    #[error("failed to decrypt field '{field}'")]
    Decryption { field: String },
    #[error("failed to encrypt field '{field}'")]
    Encryption { field: String },
    #[error("invalid {expected} value '{value}'")]
    InvalidValue {
        expected: &'static str,
        value: String,
    },
    #[error("subject field '{field}' must be a string or number, found {found}")]
    InvalidSubject {
        field: String,
        found: &'static str,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("key store error: {0}")]
    KeyStore(Box<dyn StdError + Send + Sync>),
    #[error("encrypted field '{field}' is not sealed ciphertext")]
    MalformedCiphertext { field: String },
    #[error("record '{record}' is missing field '{field}'")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },
    #[error("cannot encode non-finite float")]
    NonFiniteFloat,
    #[error("record '{record}' expected a mapping, found {found}")]
    NotAMapping {
        record: &'static str,
        found: &'static str,
    },
    #[error("type '{0}' is registered but is not an event")]
    NotAnEvent(String),
    #[error("value {value} out of range for {target}")]
    OutOfRange { value: String, target: &'static str },
    #[error("rw lock poisoned")]
    RwPoison,
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("unknown event type '{0}'")]
    UnknownEventType(String),
}

impl Error {
    /// Wraps an error raised by a key store backend.
    pub fn key_store<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Error::KeyStore(Box::new(err))
    }

    /// Recommended log level for the current error.
    pub fn level(&self) -> LevelFilter {
        use Error::*;

        match self {
            Coercion { .. } => LevelFilter::WARN,
            Decryption { .. } => LevelFilter::ERROR,
            Encryption { .. } => LevelFilter::ERROR,
            InvalidValue { .. } => LevelFilter::WARN,
            InvalidSubject { .. } => LevelFilter::WARN,
            Json(_) => LevelFilter::WARN,
            KeyStore(_) => LevelFilter::ERROR,
            MalformedCiphertext { .. } => LevelFilter::WARN,
            MissingField { .. } => LevelFilter::WARN,
            NonFiniteFloat => LevelFilter::WARN,
            NotAMapping { .. } => LevelFilter::WARN,
            NotAnEvent(_) => LevelFilter::ERROR,
            OutOfRange { .. } => LevelFilter::WARN,
            RwPoison => LevelFilter::ERROR,
            TypeMismatch { .. } => LevelFilter::WARN,
            UnknownEventType(_) => LevelFilter::ERROR,
        }
    }

    /// Log the error based on the recommended level.
    pub fn log(&self) {
        use tracing::{debug, error, info, trace, warn};

        let level = self.level();
        if level == Level::ERROR {
            error!(%self);
        } else if level == Level::WARN {
            warn!(%self);
        } else if level == Level::INFO {
            info!(%self);
        } else if level == Level::DEBUG {
            debug!(%self);
        } else if level == Level::TRACE {
            trace!(%self);
        }
    }

    pub(crate) fn type_mismatch(expected: &'static str, found: &serde_json::Value) -> Self {
        Error::TypeMismatch {
            expected,
            found: crate::codec::value_kind(found),
        }
    }
}

/// Invalid wiring, raised once at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("type '{0}' is already registered")]
    DuplicateType(String),
    #[error("record '{record}' has no field(s) {}", .fields.join(", "))]
    MissingFields {
        record: &'static str,
        fields: Vec<String>,
    },
    #[error("type '{0}' is not a record")]
    NotARecord(&'static str),
}
