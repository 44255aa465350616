//! Application session lifecycle (ECMA-354): start, periodic refresh, stop.
//! Mirrors `application_session_services.go` (`cstaConn.StartApplicationSession`),
//! with the `// TODO start periodic refresh` it left unimplemented now
//! filled in with a real 30 s ticker.

use std::time::Duration;

use cra_csta_proto::messages::application_session::{
    ResetApplicationSessionTimer, StartApplicationSession, StartApplicationSessionNegResponse,
    StartApplicationSessionPosResponse, StopApplicationSession, StopApplicationSessionResponse,
};
use cra_csta_proto::{Message, XmlElement};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::connection::{Connection, ConnectionState};
use crate::error::{Result, SessionError};

pub const DEFAULT_REQUESTED_SESSION_DURATION: u32 = 60;
const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// An active application session layered on top of a [`Connection`]. Owns
/// the background refresh ticker for as long as the session stays active.
pub struct ApplicationSession {
    connection: Connection,
    refresh_task: Option<JoinHandle<()>>,
}

impl ApplicationSession {
    /// Starts a new application session with no vendor-specific login
    /// payload and the default (ed4) protocol version.
    pub async fn start(connection: Connection, application_id: impl Into<String>) -> Result<Self> {
        Self::start_with_login(connection, application_id, None, None).await
    }

    /// Starts a new application session, optionally carrying a
    /// vendor-specific login payload and/or overriding the protocol version
    /// negotiated (Avaya AES speaks ed3 against a priv5 login info block;
    /// see the switching-function adapters). Fails immediately with
    /// [`SessionError::NotIdle`] if the connection isn't `Idle`.
    #[instrument(skip(connection, application_specific_info), fields(application_id = %application_id))]
    pub async fn start_with_login(
        connection: Connection,
        application_id: impl Into<String>,
        application_specific_info: Option<XmlElement>,
        protocol_version: Option<String>,
    ) -> Result<Self> {
        if connection.state() != ConnectionState::Idle {
            return Err(SessionError::NotIdle);
        }
        connection.set_state(ConnectionState::StartingSession);

        let mut request = StartApplicationSession::new(application_id);
        request.application_specific_info = application_specific_info;
        request.requested_session_duration = DEFAULT_REQUESTED_SESSION_DURATION;
        if let Some(version) = protocol_version {
            request.protocol_version = version;
        }
        let request = Message::StartApplicationSession(request);

        let reply = connection.request(request).await;
        let reply = match reply {
            Ok(r) => r,
            Err(e) => {
                connection.set_state(ConnectionState::Error);
                return Err(e);
            }
        };

        match reply {
            Message::StartApplicationSessionPosResponse(StartApplicationSessionPosResponse {
                session_id,
                ..
            }) => {
                connection.set_session_id(session_id);
                connection.set_state(ConnectionState::Active);
                info!(session_id = %connection.session_id(), "application session active");

                let refresh_task = spawn_refresh_ticker(connection.clone());
                Ok(Self {
                    connection,
                    refresh_task: Some(refresh_task),
                })
            }
            Message::StartApplicationSessionNegResponse(StartApplicationSessionNegResponse) => {
                connection.set_state(ConnectionState::Error);
                connection.close().await;
                Err(SessionError::SessionStartRejected)
            }
            other => {
                warn!(message_type = other.local_name(), "unexpected reply to StartApplicationSession");
                connection.set_state(ConnectionState::Error);
                Err(SessionError::SessionStartRejected)
            }
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Best-effort teardown: sends `StopApplicationSession` if the
    /// connection is still `Active`, then closes the transport. The refresh
    /// ticker is always stopped.
    pub async fn stop(mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }

        if self.connection.state() == ConnectionState::Active {
            let session_id = self.connection.session_id();
            let request = Message::StopApplicationSession(StopApplicationSession { session_id });
            match self.connection.request(request).await {
                Ok(Message::StopApplicationSessionResponse(StopApplicationSessionResponse)) => {}
                Ok(other) => warn!(
                    message_type = other.local_name(),
                    "unexpected reply to StopApplicationSession"
                ),
                Err(e) => warn!(error = %e, "StopApplicationSession failed"),
            }
        }

        self.connection.close().await;
    }
}

fn spawn_refresh_ticker(connection: Connection) -> JoinHandle<()> {
    let cancel = connection.cancellation_token();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(REFRESH_INTERVAL);
        interval.tick().await; // first tick fires immediately; discard it
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                mut closed = connection.closed() => {
                    let _ = closed.recv().await;
                    break;
                }
                _ = interval.tick() => {
                    if connection.state() != ConnectionState::Active {
                        break;
                    }
                    let request = Message::ResetApplicationSessionTimer(ResetApplicationSessionTimer {
                        session_id: connection.session_id(),
                        requested_session_duration: DEFAULT_REQUESTED_SESSION_DURATION,
                    });
                    match connection.request(request).await {
                        Ok(Message::ResetApplicationSessionTimerNegResponse(_)) => {
                            warn!("switch rejected ResetApplicationSessionTimer");
                        }
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "failed to send ResetApplicationSessionTimer"),
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cra_csta_proto::codec;
    use tokio::net::TcpListener;

    #[tokio::test(start_paused = true)]
    async fn active_session_sends_refresh_on_schedule() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let (mut rd, mut wr) = sock.split();

            // StartApplicationSession
            let frame = codec::read_frame(&mut rd).await.unwrap();
            assert!(matches!(frame.message, Message::StartApplicationSession(_)));
            let reply = codec::encode_frame(
                frame.invoke_id,
                &Message::StartApplicationSessionPosResponse(StartApplicationSessionPosResponse {
                    session_id: "sess-1".to_string(),
                    actual_protocol_version: "ed4".to_string(),
                    actual_session_duration: 60,
                }),
            )
            .unwrap();
            use tokio::io::AsyncWriteExt;
            wr.write_all(&reply).await.unwrap();

            // Two refresh cycles
            for _ in 0..2 {
                let frame = codec::read_frame(&mut rd).await.unwrap();
                assert!(matches!(frame.message, Message::ResetApplicationSessionTimer(_)));
            }
        });

        let connection = Connection::connect(&addr.to_string(), CancellationToken::new())
            .await
            .unwrap();
        let session = ApplicationSession::start(connection, "testApplicationId")
            .await
            .unwrap();

        tokio::time::advance(REFRESH_INTERVAL * 2 + Duration::from_millis(10)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        server.await.unwrap();
        session.stop().await;
    }
}
