use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("network interface not found: {0}")]
    InterfaceNotFound(String),

    #[error("unsupported datalink channel type for this interface")]
    UnsupportedChannelType,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Media(#[from] cra_media_codec::MediaError),
}

pub type Result<T> = std::result::Result<T, CaptureError>;
