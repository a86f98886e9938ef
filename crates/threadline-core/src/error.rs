//! Error types for the core crate.

use thiserror::Error;

/// Failure to turn a raw payload into a model value.
///
/// Always recoverable: the applier logs it and moves on to the next event.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Part payload without a `type` tag.
    #[error("part payload has no type tag")]
    MissingType,

    /// Part variant this client does not know.
    #[error("unsupported part type: {0}")]
    UnknownPartType(String),

    /// Known shape, bad contents.
    #[error("malformed {what} payload: {source}")]
    Malformed {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for decoding.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
