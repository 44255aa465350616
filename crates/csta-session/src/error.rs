use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("application session is not idle")]
    NotIdle,

    #[error("switch rejected StartApplicationSession")]
    SessionStartRejected,

    #[error("connection closed")]
    Closed,

    #[error(transparent)]
    Proto(#[from] cra_csta_proto::CstaError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request dropped before a reply arrived")]
    RequestDropped,
}

pub type Result<T> = std::result::Result<T, SessionError>;
