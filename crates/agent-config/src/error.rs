use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("unknown device extension: {0}")]
    UnknownDevice(String),

    #[error("uploader queue is closed")]
    QueueClosed,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
