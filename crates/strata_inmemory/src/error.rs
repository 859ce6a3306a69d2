use thiserror::Error;

/// Error enum.
#[derive(Debug, Error)]
pub enum Error {
    /// Unable to decode a stored event.
    #[error("decode event error: {0}")]
    DecodeEvent(#[source] strata::Error),
    /// Unable to encode an event.
    #[error("encode event error: {0}")]
    EncodeEvent(#[source] strata::Error),
    /// Read write lock error.
    #[error("could not get read/write lock")]
    RwPoison,
}
