use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("not connected")]
    NotConnected,

    /// `serve()` returned because the underlying connection closed on its
    /// own (switch-initiated disconnect, transport error) rather than
    /// because the supervisor cancelled it. Distinct from a graceful
    /// `Ok(())` return so the supervisor knows to back off and reconnect.
    #[error("PBX connection lost")]
    ConnectionLost,

    #[error("switch rejected request: {0}")]
    Rejected(String),

    #[error(transparent)]
    Session(#[from] cra_csta_session::SessionError),

    #[error(transparent)]
    Proto(#[from] cra_csta_proto::CstaError),

    #[error(transparent)]
    Recorder(#[from] cra_rtp_recorder::RecorderError),

    #[error(transparent)]
    Config(#[from] cra_agent_config::ConfigError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AdapterError>;
