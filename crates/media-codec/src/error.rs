use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("wav encoder error: {0}")]
    Wav(#[from] hound::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MediaError>;
