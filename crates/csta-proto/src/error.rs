use thiserror::Error;

/// Errors surfaced by the CSTA/ACSE codec layer.
///
/// `FramingError` and `TransportError` are connection-fatal; `UnknownMessage`
/// is not — the caller is expected to log and continue reading the stream.
#[derive(Debug, Error)]
pub enum CstaError {
    #[error("invalid frame: {0}")]
    FramingError(String),

    #[error("unknown message type: {0}")]
    UnknownMessage(String),

    #[error("failed to encode message: {0}")]
    EncodeError(String),

    #[error("failed to decode message: {0}")]
    DecodeError(String),

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("connection closed")]
    Eof,
}

pub type Result<T> = std::result::Result<T, CstaError>;
