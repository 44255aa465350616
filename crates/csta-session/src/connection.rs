//! A single transport connection: invocation-ID allocation, request/reply
//! correlation, default handler dispatch, and the background read loop.
//! Mirrors `conn.go` (`cstaConn`), adapted to Rust idiom: replies are
//! delivered through a `oneshot` channel instead of a callback, and handler
//! dispatch runs on fresh tokio tasks.

use std::collections::HashMap;
use std::sync::Arc;

use cra_csta_proto::messages::system_services::{SystemStatus, SystemStatusResponse};
use cra_csta_proto::{codec, CstaError, Message};
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::error::{Result, SessionError};

/// Upper bound on invocation IDs; a protocol compatibility constraint with
/// the switch (see `nextInvokeID`). Do not change without also changing
/// the switch-side expectation.
pub const INVOKE_ID_WRAP: u16 = 9000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    StartingSession,
    Active,
    Closed,
    Error,
}

/// A handler installed for unsolicited messages of a given type. Receives
/// the owning connection (so it can reply, e.g. `SystemStatus` keep-alive),
/// the invoke ID the message arrived on, and the decoded message.
pub type HandleFn = Arc<dyn Fn(Connection, u16, Message) + Send + Sync>;

struct Shared {
    write_half: tokio::sync::Mutex<OwnedWriteHalf>,
    next_invoke_id: Mutex<u16>,
    state: Mutex<ConnectionState>,
    session_id: Mutex<String>,
    transactions: Mutex<HashMap<u16, oneshot::Sender<Message>>>,
    handlers: Mutex<HashMap<&'static str, HandleFn>>,
    cancel: CancellationToken,
    closed_tx: broadcast::Sender<()>,
}

/// A process-local handle to one CSTA transport connection. Cheaply
/// cloneable; all clones share the same underlying state.
#[derive(Clone)]
pub struct Connection(Arc<Shared>);

impl Connection {
    /// Dials `addr`, splits the stream, installs the default `SystemStatus`
    /// handler, and spawns the background dispatch loop.
    ///
    /// `upstream` is only ever observed, never cancelled by this connection:
    /// internally a `child_token()` is taken so that `close()` (ordinary
    /// per-connection teardown, e.g. on peer EOF) cannot cancel `upstream`
    /// itself, while a cancellation of `upstream` still tears this
    /// connection down.
    #[instrument(skip(upstream))]
    pub async fn connect(addr: &str, upstream: CancellationToken) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, write_half) = stream.into_split();
        let (closed_tx, _) = broadcast::channel(1);

        let shared = Arc::new(Shared {
            write_half: tokio::sync::Mutex::new(write_half),
            next_invoke_id: Mutex::new(0),
            state: Mutex::new(ConnectionState::Idle),
            session_id: Mutex::new(String::new()),
            transactions: Mutex::new(HashMap::new()),
            handlers: Mutex::new(HashMap::new()),
            cancel: upstream.child_token(),
            closed_tx,
        });

        let conn = Connection(shared);
        conn.handle(SystemStatus::LOCAL_NAME, |conn, invoke_id, _msg| {
            let conn = conn.clone();
            tokio::spawn(async move {
                if let Err(e) = conn
                    .write(invoke_id, Message::SystemStatusResponse(SystemStatusResponse))
                    .await
                {
                    warn!(error = %e, "failed to acknowledge SystemStatus");
                }
            });
        });

        conn.clone().spawn_dispatch_loop(read_half);
        Ok(conn)
    }

    pub fn state(&self) -> ConnectionState {
        *self.0.state.lock()
    }

    pub fn set_state(&self, state: ConnectionState) {
        let mut guard = self.0.state.lock();
        if *guard == ConnectionState::Error && state != ConnectionState::Error {
            // preserve Error, matching the original's Close() semantics
            return;
        }
        *guard = state;
    }

    pub fn session_id(&self) -> String {
        self.0.session_id.lock().clone()
    }

    pub fn set_session_id(&self, id: impl Into<String>) {
        *self.0.session_id.lock() = id.into();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.0.cancel.clone()
    }

    /// A receiver that resolves exactly once, when the connection closes.
    pub fn closed(&self) -> broadcast::Receiver<()> {
        self.0.closed_tx.subscribe()
    }

    /// Installs a default handler for unsolicited messages of `local_name`.
    /// Overwrites a previously installed handler for the same name.
    pub fn handle(&self, local_name: &'static str, f: impl Fn(Connection, u16, Message) + Send + Sync + 'static) {
        self.0.handlers.lock().insert(local_name, Arc::new(f));
    }

    pub fn remove_handler(&self, local_name: &str) {
        self.0.handlers.lock().remove(local_name);
    }

    fn next_invoke_id(&self) -> u16 {
        let mut guard = self.0.next_invoke_id.lock();
        *guard += 1;
        if *guard >= INVOKE_ID_WRAP {
            *guard = 0;
        }
        *guard
    }

    /// Encodes and writes `message` on `invoke_id`, flushing immediately.
    pub async fn write(&self, invoke_id: u16, message: Message) -> Result<()> {
        let frame = codec::encode_frame(invoke_id, &message)?;
        let mut w = self.0.write_half.lock().await;
        w.write_all(&frame).await?;
        w.flush().await?;
        Ok(())
    }

    /// Allocates an invoke ID, registers a one-shot reply slot for it
    /// *before* writing (so the dispatch loop's lookup always happens after
    /// the insert), then writes the request and awaits the reply.
    pub async fn request(&self, message: Message) -> Result<Message> {
        let invoke_id = self.next_invoke_id();
        let (tx, rx) = oneshot::channel();
        self.0.transactions.lock().insert(invoke_id, tx);

        if let Err(e) = self.write(invoke_id, message).await {
            self.0.transactions.lock().remove(&invoke_id);
            return Err(e);
        }

        rx.await.map_err(|_| SessionError::RequestDropped)
    }

    /// Closes the transport, transitions to `Closed` (preserving `Error`
    /// if already set), and signals the closed-channel exactly once.
    pub async fn close(&self) {
        self.0.cancel.cancel();
        self.set_state(ConnectionState::Closed);
        let mut w = self.0.write_half.lock().await;
        let _ = w.shutdown().await;
        let _ = self.0.closed_tx.send(());
    }

    fn spawn_dispatch_loop(self, mut read_half: tokio::net::tcp::OwnedReadHalf) {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = self.0.cancel.cancelled() => {
                        debug!("dispatch loop cancelled");
                        break;
                    }
                    result = codec::read_frame(&mut read_half) => {
                        match result {
                            Ok(frame) => self.dispatch(frame.invoke_id, frame.message),
                            Err(CstaError::Eof) => {
                                debug!("connection closed by peer");
                                self.close().await;
                                break;
                            }
                            Err(e) => {
                                warn!(error = %e, "error reading CSTA frame");
                                self.set_state(ConnectionState::Error);
                            }
                        }
                    }
                }
            }
        });
    }

    fn dispatch(&self, invoke_id: u16, message: Message) {
        if let Some(tx) = self.0.transactions.lock().remove(&invoke_id) {
            let _ = tx.send(message);
            return;
        }

        let handler = self.0.handlers.lock().get(message.local_name()).cloned();
        if let Some(handler) = handler {
            let conn = self.clone();
            tokio::spawn(async move {
                handler(conn, invoke_id, message);
            });
        } else {
            warn!(message_type = message.local_name(), "unhandled message type");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cra_csta_proto::messages::monitoring::{MonitorStart, MonitorStartResponse};
    use tokio::net::TcpListener;

    async fn connected_pair() -> (Connection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });
        let conn = Connection::connect(&addr.to_string(), CancellationToken::new())
            .await
            .unwrap();
        let server_sock = accept.await.unwrap();
        (conn, server_sock)
    }

    #[tokio::test]
    async fn invoke_id_wraps_at_9000() {
        let (conn, _server) = connected_pair().await;
        for _ in 0..INVOKE_ID_WRAP - 1 {
            conn.next_invoke_id();
        }
        assert_eq!(conn.next_invoke_id(), 0);
    }

    #[tokio::test]
    async fn system_status_is_acknowledged_on_same_invoke_id() {
        let (conn, mut server) = connected_pair().await;
        let (mut rd, mut wr) = server.split();

        let probe = codec::encode_frame(17, &Message::SystemStatus(SystemStatus)).unwrap();
        wr.write_all(&probe).await.unwrap();

        let reply = codec::read_frame(&mut rd).await.unwrap();
        assert_eq!(reply.invoke_id, 17);
        assert!(matches!(reply.message, Message::SystemStatusResponse(_)));
        let _ = conn;
    }

    #[tokio::test]
    async fn request_is_resolved_by_matching_invoke_id_reply() {
        let (conn, mut server) = connected_pair().await;
        let (mut rd, mut wr) = server.split();

        let client = tokio::spawn({
            let conn = conn.clone();
            async move {
                conn.request(Message::MonitorStart(MonitorStart::device("212700")))
                    .await
            }
        });

        let frame = codec::read_frame(&mut rd).await.unwrap();
        assert!(matches!(frame.message, Message::MonitorStart(_)));
        let reply = codec::encode_frame(
            frame.invoke_id,
            &Message::MonitorStartResponse(MonitorStartResponse {
                monitor_cross_ref_id: "5001".to_string(),
            }),
        )
        .unwrap();
        wr.write_all(&reply).await.unwrap();

        let result = client.await.unwrap().unwrap();
        match result {
            Message::MonitorStartResponse(r) => assert_eq!(r.monitor_cross_ref_id, "5001"),
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn close_does_not_cancel_the_upstream_token() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });
        let upstream = CancellationToken::new();
        let conn = Connection::connect(&addr.to_string(), upstream.clone()).await.unwrap();
        let _server_sock = accept.await.unwrap();

        conn.close().await;

        assert!(conn.cancellation_token().is_cancelled());
        assert!(!upstream.is_cancelled(), "closing one connection must not cancel the shared upstream token");
    }

    #[tokio::test]
    async fn peer_eof_closes_without_cancelling_the_upstream_token() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });
        let upstream = CancellationToken::new();
        let conn = Connection::connect(&addr.to_string(), upstream.clone()).await.unwrap();
        let server_sock = accept.await.unwrap();

        drop(server_sock);
        let mut closed = conn.closed();
        closed.recv().await.unwrap();

        assert!(!upstream.is_cancelled(), "a remote EOF must not poison the shared upstream token");
    }

    #[tokio::test]
    async fn cancelling_the_upstream_token_also_closes_the_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });
        let upstream = CancellationToken::new();
        let conn = Connection::connect(&addr.to_string(), upstream.clone()).await.unwrap();
        let _server_sock = accept.await.unwrap();

        upstream.cancel();

        assert!(conn.cancellation_token().is_cancelled());
    }
}
