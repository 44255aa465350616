//! The RTP recorder pool: N pre-bound UDP listeners, each capable of
//! decoding one RTP stream into a WAV file while "recording".
//!
//! Mirrors `rtp_receiver_task.go` (`RTPReceiverTask`/`rtpReceiver`), whose
//! `receive()` loop was an empty stub (`// TODO`) — the RTP parse/decode/
//! write logic here is carried over instead from the passive recorder's
//! `passive_monitoring/recorder.go`'s `recordPacket`, since both paths
//! decode the same G.711 payload types.

use std::fs::File;
use std::net::SocketAddr;
use std::sync::Arc;

use cra_media_codec::{MonoWavWriter, PayloadType};
use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::error::{RecorderError, Result};

const RECV_BUFFER_SIZE: usize = 2048;

enum ListenerState {
    Idle,
    Recording(MonoWavWriter<File>),
}

struct Listener {
    index: usize,
    socket: UdpSocket,
    local_addr: SocketAddr,
    state: Mutex<ListenerState>,
}

impl Listener {
    fn is_idle(&self) -> bool {
        matches!(*self.state.lock(), ListenerState::Idle)
    }

    fn handle_packet(&self, data: &[u8]) {
        let mut state = self.state.lock();
        let writer = match &mut *state {
            ListenerState::Recording(w) => w,
            ListenerState::Idle => return,
        };

        let rtp = match rtp_rs::RtpReader::new(data) {
            Ok(r) => r,
            Err(e) => {
                debug!(listener = self.index, error = ?e, "dropping malformed RTP packet");
                return;
            }
        };

        let Some(payload_type) = PayloadType::from_rtp(rtp.payload_type()) else {
            debug!(listener = self.index, payload_type = rtp.payload_type(), "unsupported RTP payload type, skipping");
            return;
        };

        let samples = payload_type.decode(rtp.payload());
        if let Err(e) = writer.write_samples(&samples) {
            warn!(listener = self.index, error = %e, "failed to write decoded samples");
        }
    }

    fn spawn_receive_loop(self: Arc<Self>, cancel: CancellationToken) {
        tokio::spawn(async move {
            let mut buf = vec![0u8; RECV_BUFFER_SIZE];
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!(listener = self.index, "RTP listener cancelled");
                        break;
                    }
                    result = self.socket.recv_from(&mut buf) => {
                        match result {
                            Ok((n, _src)) => self.handle_packet(&buf[..n]),
                            Err(e) => {
                                warn!(listener = self.index, error = %e, "RTP listener read error, closing");
                                break;
                            }
                        }
                    }
                }
            }
        });
    }
}

/// A handle to one allocated (recording-capable) listener. Returned by
/// [`RecorderPool::get_recorder`]; `local_addr()` is the endpoint a
/// switching-function adapter should steer RTP at via `RegisterTerminal`.
pub struct RecorderHandle {
    listener: Arc<Listener>,
}

impl RecorderHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr
    }

    /// Atomically opens a WAV encoder on `file` and marks the listener
    /// recording. Replaces (and silently drops) any prior encoder.
    pub fn start_recording(&self, file: File) -> Result<()> {
        let encoder = MonoWavWriter::create(file)?;
        *self.listener.state.lock() = ListenerState::Recording(encoder);
        Ok(())
    }

    /// Clears the recording flag and finalizes the WAV file. A second call
    /// is a no-op, matching the original's idempotent `StopRecording`.
    pub fn stop_recording(&self) -> Result<()> {
        let previous = std::mem::replace(&mut *self.listener.state.lock(), ListenerState::Idle);
        if let ListenerState::Recording(encoder) = previous {
            encoder.finalize()?;
        }
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        !self.listener.is_idle()
    }
}

/// Fixed-size pool of UDP listeners bound once at startup.
pub struct RecorderPool {
    listeners: Vec<Arc<Listener>>,
    cancel: CancellationToken,
}

impl RecorderPool {
    /// Binds `count` listeners to ephemeral ports on `address`.
    #[instrument(skip(cancel))]
    pub async fn bind(address: &str, count: usize, cancel: CancellationToken) -> Result<Self> {
        let mut listeners = Vec::with_capacity(count);
        for index in 0..count {
            let socket = UdpSocket::bind((address, 0)).await?;
            let local_addr = socket.local_addr()?;
            let listener = Arc::new(Listener {
                index,
                socket,
                local_addr,
                state: Mutex::new(ListenerState::Idle),
            });
            listener.clone().spawn_receive_loop(cancel.clone());
            listeners.push(listener);
        }
        Ok(Self { listeners, cancel })
    }

    /// Returns the first idle listener, in pool order, marking nothing
    /// (the caller must still call `start_recording` to claim it).
    pub fn get_recorder(&self) -> Result<RecorderHandle> {
        self.listeners
            .iter()
            .find(|l| l.is_idle())
            .map(|l| RecorderHandle { listener: l.clone() })
            .ok_or(RecorderError::PoolExhausted)
    }

    /// Every listener in fixed pool order, used by adapters to pair
    /// recording terminals with listeners by position.
    pub fn all(&self) -> Vec<RecorderHandle> {
        self.listeners
            .iter()
            .map(|l| RecorderHandle { listener: l.clone() })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tokio::net::UdpSocket as TokioUdpSocket;

    #[tokio::test]
    async fn pool_exhaustion_is_reported() {
        let pool = RecorderPool::bind("127.0.0.1", 2, CancellationToken::new()).await.unwrap();
        let a = pool.get_recorder().unwrap();
        a.start_recording(tempfile::tempfile().unwrap()).unwrap();
        let b = pool.get_recorder().unwrap();
        b.start_recording(tempfile::tempfile().unwrap()).unwrap();

        assert!(matches!(pool.get_recorder(), Err(RecorderError::PoolExhausted)));

        a.stop_recording().unwrap();
        assert!(pool.get_recorder().is_ok());
    }

    #[tokio::test]
    async fn decodes_mulaw_rtp_into_wav_file() {
        let pool = RecorderPool::bind("127.0.0.1", 1, CancellationToken::new()).await.unwrap();
        let handle = pool.get_recorder().unwrap();

        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        handle.start_recording(tmp.reopen().unwrap()).unwrap();

        let sender = TokioUdpSocket::bind("127.0.0.1:0").await.unwrap();
        let rtp_header = [0x80u8, 0x00, 0x00, 0x01, 0, 0, 0, 1, 0, 0, 0, 1];
        let mut packet = rtp_header.to_vec();
        packet.extend_from_slice(&[0xFF; 160]);
        sender.send_to(&packet, handle.local_addr()).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        handle.stop_recording().unwrap();

        tmp.flush().unwrap();
        let reader = hound::WavReader::open(tmp.path()).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 8000);
    }
}
