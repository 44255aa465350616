use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("no idle RTP listener available")]
    PoolExhausted,

    #[error("listener is not currently recording")]
    NotRecording,

    #[error(transparent)]
    Media(#[from] cra_media_codec::MediaError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RecorderError>;
