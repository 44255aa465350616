//! Reconnect supervisor: drives a single [`PbxAdapter`] through
//! connect → serve → backoff against one cancellation signal.
//!
//! Mirrors `callRecordingAgentService.reestablishPBXConnection`
//! (`cmd/root.go`): a fixed 30 s retry after a failed `Connect()`, a fixed
//! 30 s retry after `Serve()` returns an error, and an immediate, final
//! `Close()` on cancellation. One behavioral difference: `cmd/root.go` treats any
//! `Serve()` return — error or not — the same as "stop retrying" in one
//! code path and "retry" in another depending on which `err` check it
//! hits; here the adapter's `serve()` return type makes that explicit
//! (`Ok(())` is a graceful shutdown, `Err(_)` is a lost connection).

use std::sync::Arc;
use std::time::Duration;

use cra_agent_config::DeviceStore;
use cra_pbx_adapters::PbxAdapter;
use cra_rtp_recorder::RecorderPool;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Matches the original's `connectionRetryTimeout`.
pub const RECONNECT_BACKOFF: Duration = Duration::from_secs(30);

/// Drives one PBX adapter through its lifecycle until cancelled or the
/// adapter reports a graceful shutdown.
pub struct Supervisor {
    adapter: Arc<dyn PbxAdapter>,
    recorder_pool: Arc<RecorderPool>,
    devices: Arc<dyn DeviceStore>,
    cancel: CancellationToken,
}

impl Supervisor {
    pub fn new(
        adapter: Arc<dyn PbxAdapter>,
        recorder_pool: Arc<RecorderPool>,
        devices: Arc<dyn DeviceStore>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            adapter,
            recorder_pool,
            devices,
            cancel,
        }
    }

    /// Runs the Connecting/Serving/Backoff loop. Returns once the adapter
    /// shuts down gracefully or the supervisor is cancelled.
    #[instrument(skip(self))]
    pub async fn run(&self) {
        loop {
            if self.cancel.is_cancelled() {
                self.adapter.close().await;
                return;
            }

            info!("connecting to PBX");
            let connected = tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.adapter.close().await;
                    return;
                }
                result = self.adapter.connect() => result,
            };

            if let Err(e) = connected {
                warn!(error = %e, backoff_secs = RECONNECT_BACKOFF.as_secs(), "failed to connect to PBX");
                if self.backoff().await {
                    return;
                }
                continue;
            }

            info!("connected to PBX, serving");
            match self
                .adapter
                .serve(self.recorder_pool.clone(), self.devices.clone())
                .await
            {
                Ok(()) => {
                    info!("PBX adapter shut down gracefully");
                    return;
                }
                Err(e) => {
                    warn!(error = %e, backoff_secs = RECONNECT_BACKOFF.as_secs(), "PBX connection lost");
                    if self.backoff().await {
                        return;
                    }
                }
            }
        }
    }

    /// Waits out the fixed backoff, or closes the adapter and reports
    /// "stop" if cancelled first.
    async fn backoff(&self) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => {
                self.adapter.close().await;
                true
            }
            _ = tokio::time::sleep(RECONNECT_BACKOFF) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cra_agent_config::InMemoryDeviceStore;
    use cra_pbx_adapters::{AdapterError, ConnectionState, MonitorPoint};
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeAdapter {
        connect_calls: AtomicUsize,
        serve_calls: AtomicUsize,
        serve_should_fail: Vec<bool>,
        closed: AtomicUsize,
    }

    impl FakeAdapter {
        fn new(serve_should_fail: Vec<bool>) -> Self {
            Self {
                connect_calls: AtomicUsize::new(0),
                serve_calls: AtomicUsize::new(0),
                serve_should_fail,
                closed: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PbxAdapter for FakeAdapter {
        async fn connect(&self) -> cra_pbx_adapters::Result<()> {
            self.connect_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn connection_state(&self) -> ConnectionState {
            ConnectionState::Connected
        }

        async fn monitor_start(&self, _extension: &str) -> cra_pbx_adapters::Result<Arc<MonitorPoint>> {
            unimplemented!("not exercised by supervisor tests")
        }

        async fn register_terminal(
            &self,
            _extension: &str,
            _password: &str,
            _local_rtp_endpoint: SocketAddr,
        ) -> cra_pbx_adapters::Result<()> {
            unimplemented!("not exercised by supervisor tests")
        }

        async fn serve(
            &self,
            _recorder_pool: Arc<RecorderPool>,
            _devices: Arc<dyn DeviceStore>,
        ) -> cra_pbx_adapters::Result<()> {
            let call = self.serve_calls.fetch_add(1, Ordering::SeqCst);
            if self.serve_should_fail.get(call).copied().unwrap_or(false) {
                Err(AdapterError::ConnectionLost)
            } else {
                Ok(())
            }
        }

        async fn close(&self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn harness(adapter: Arc<FakeAdapter>) -> Supervisor {
        let recorder_pool = Arc::new(RecorderPool::bind("127.0.0.1", 1, CancellationToken::new()).await.unwrap());
        let devices: Arc<dyn DeviceStore> = Arc::new(InMemoryDeviceStore::new(vec![]));
        Supervisor::new(adapter, recorder_pool, devices, CancellationToken::new())
    }

    #[tokio::test]
    async fn graceful_serve_return_exits_without_reconnecting() {
        let adapter = Arc::new(FakeAdapter::new(vec![false]));
        let supervisor = harness(adapter.clone()).await;

        supervisor.run().await;

        assert_eq!(adapter.connect_calls.load(Ordering::SeqCst), 1);
        assert_eq!(adapter.serve_calls.load(Ordering::SeqCst), 1);
        assert_eq!(adapter.closed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn lost_connection_backs_off_then_reconnects() {
        let adapter = Arc::new(FakeAdapter::new(vec![true, false]));
        let recorder_pool = Arc::new(RecorderPool::bind("127.0.0.1", 1, CancellationToken::new()).await.unwrap());
        let devices: Arc<dyn DeviceStore> = Arc::new(InMemoryDeviceStore::new(vec![]));
        let supervisor = Supervisor::new(adapter.clone(), recorder_pool, devices, CancellationToken::new());

        let handle = tokio::spawn(async move { supervisor.run().await });

        // Let the task run synchronously up to the backoff sleep.
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        tokio::time::advance(RECONNECT_BACKOFF + Duration::from_millis(1)).await;

        handle.await.unwrap();

        assert_eq!(adapter.connect_calls.load(Ordering::SeqCst), 2);
        assert_eq!(adapter.serve_calls.load(Ordering::SeqCst), 2);
        assert_eq!(adapter.closed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_backoff_closes_adapter_and_stops() {
        let adapter = Arc::new(FakeAdapter::new(vec![true]));
        let recorder_pool = Arc::new(RecorderPool::bind("127.0.0.1", 1, CancellationToken::new()).await.unwrap());
        let devices: Arc<dyn DeviceStore> = Arc::new(InMemoryDeviceStore::new(vec![]));
        let cancel = CancellationToken::new();
        let supervisor = Supervisor::new(adapter.clone(), recorder_pool, devices, cancel.clone());

        let handle = tokio::spawn(async move { supervisor.run().await });

        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        cancel.cancel();

        handle.await.unwrap();

        assert_eq!(adapter.connect_calls.load(Ordering::SeqCst), 1);
        assert_eq!(adapter.serve_calls.load(Ordering::SeqCst), 1);
        assert_eq!(adapter.closed.load(Ordering::SeqCst), 1);
    }
}
