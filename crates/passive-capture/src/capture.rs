//! Passive recorder: pairs SIP dialogs with their RTP flows purely from
//! what's visible on a mirrored switch port, without registering anything
//! with the PBX. Mirrors `passiveRecorder` in `passive_monitoring/recorder.go`.
//!
//! The packet-processing logic (`handle_ip_packet`/`handle_sip`/
//! `handle_rtp_candidate`) is plain, synchronous, and independent of
//! `pnet` so it can be unit tested directly; only [`PassiveRecorder::run`]
//! touches the platform capture API, and it is meant to be driven from
//! inside `tokio::task::spawn_blocking` since `pnet::datalink` blocks.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cra_agent_config::{UploadQueue, UploadRecord, UploadRecordType};
use cra_media_codec::PayloadType;
use pnet::datalink::{self, Channel, NetworkInterface};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::udp::UdpPacket;
use pnet::packet::Packet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::call::SipCall;
use crate::defrag::Ipv4Defragmenter;
use crate::error::{CaptureError, Result};
use crate::sdp::SessionDescription;
use crate::sip::{SipMessage, SipMethod};

/// How often the blocking read loop wakes up to check for cancellation,
/// matching the periodic `select { default: }` poll in the original's
/// `for packet := range packetSource.Packets()` loop.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub struct PassiveRecorder {
    recordings_dir: PathBuf,
    upload_queue: Arc<dyn UploadQueue>,
    calls: HashMap<String, SipCall>,
    defrag: Ipv4Defragmenter,
}

impl PassiveRecorder {
    pub fn new(recordings_dir: PathBuf, upload_queue: Arc<dyn UploadQueue>) -> Self {
        Self {
            recordings_dir,
            upload_queue,
            calls: HashMap::new(),
            defrag: Ipv4Defragmenter::new(),
        }
    }

    /// Feeds one reassembled IPv4 datagram's UDP payload through SIP/RTP
    /// dispatch, returning any upload records produced (a dialog ending
    /// finalizes its WAV file and becomes one record). Pure and
    /// synchronous; callers await [`UploadQueue::enqueue`] themselves.
    pub fn handle_udp_payload(
        &mut self,
        _src_ip: IpAddr,
        dst_ip: IpAddr,
        _src_port: u16,
        dst_port: u16,
        payload: &[u8],
    ) -> Vec<UploadRecord> {
        if let Some(msg) = SipMessage::parse(payload) {
            return self.handle_sip(msg);
        }
        if let Err(e) = self.handle_rtp_candidate(dst_ip, dst_port, payload) {
            warn!(error = %e, "failed to record RTP packet");
        }
        Vec::new()
    }

    fn handle_sip(&mut self, msg: SipMessage) -> Vec<UploadRecord> {
        let Some(call_id) = msg.call_id.clone() else { return Vec::new() };

        if !msg.is_response {
            return match msg.method {
                Some(SipMethod::Invite) => {
                    self.start_call(call_id, &msg.body);
                    Vec::new()
                }
                Some(SipMethod::Cancel) => {
                    self.calls.remove(&call_id);
                    Vec::new()
                }
                Some(SipMethod::Bye) => self.finish_call(&call_id),
                _ => Vec::new(),
            };
        }

        if msg.is_success_response() {
            if let Some(sdp) = SessionDescription::parse(&msg.body) {
                if let (Some(call), Some(address), Some(port)) =
                    (self.calls.get_mut(&call_id), sdp.connection_address, sdp.media_port)
                {
                    call.to_callee = Some(crate::call::RtpFlow { address, port });
                }
            }
        }
        Vec::new()
    }

    fn start_call(&mut self, call_id: String, invite_body: &[u8]) {
        let path = self.recordings_dir.join(format!("{call_id}.wav"));
        let mut call = SipCall::new(call_id.clone(), path, Utc::now());
        if let Some(sdp) = SessionDescription::parse(invite_body) {
            if let (Some(address), Some(port)) = (sdp.connection_address, sdp.media_port) {
                call.to_caller = Some(crate::call::RtpFlow { address, port });
            }
        }
        self.calls.insert(call_id, call);
    }

    fn finish_call(&mut self, call_id: &str) -> Vec<UploadRecord> {
        let Some(call) = self.calls.remove(call_id) else { return Vec::new() };
        let Some(recorder) = call.recorder else { return Vec::new() };

        if let Err(e) = recorder.finalize() {
            warn!(call_id, error = %e, "failed to finalize recording");
            return Vec::new();
        }

        vec![UploadRecord::new(
            call.file_path.to_string_lossy().to_string(),
            UploadRecordType::CfsAudio,
            call.begin_time,
            Utc::now(),
        )]
    }

    fn handle_rtp_candidate(&mut self, dst_ip: IpAddr, dst_port: u16, payload: &[u8]) -> Result<()> {
        let Ok(rtp) = rtp_rs::RtpReader::new(payload) else { return Ok(()) };
        let Some(payload_type) = PayloadType::from_rtp(rtp.payload_type()) else {
            return Ok(());
        };
        let samples = payload_type.decode(rtp.payload());

        for call in self.calls.values_mut() {
            let Some(channel) = call.channel_for(dst_ip, dst_port) else { continue };
            let recorder = call.ensure_recorder()?;
            recorder.feed(channel, &samples)?;
            break;
        }
        Ok(())
    }

    /// Runs the blocking capture loop against `interface_name`, enqueuing
    /// finished recordings as dialogs end. Must run inside
    /// `tokio::task::spawn_blocking`; bridges back into async via
    /// `Handle::current().block_on` to hand off to the upload queue,
    /// mirroring the original's goroutine-per-packet dispatch without
    /// needing its own async runtime.
    #[instrument(skip(self, cancel))]
    pub fn run(&mut self, interface_name: &str, cancel: CancellationToken) -> Result<()> {
        let interface = find_interface(interface_name)?;
        let config = datalink::Config {
            read_timeout: Some(POLL_INTERVAL),
            ..Default::default()
        };
        let (_tx, mut rx) = match datalink::channel(&interface, config) {
            Ok(Channel::Ethernet(tx, rx)) => (tx, rx),
            Ok(_) => return Err(CaptureError::UnsupportedChannelType),
            Err(e) => return Err(CaptureError::Io(e)),
        };

        let handle = tokio::runtime::Handle::current();

        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            let packet = match rx.next() {
                Ok(p) => p,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut || e.kind() == std::io::ErrorKind::WouldBlock => {
                    continue;
                }
                Err(e) => return Err(CaptureError::Io(e)),
            };

            let records = self.process_ethernet_frame(packet);
            for record in records {
                if let Err(e) = handle.block_on(self.upload_queue.enqueue(record)) {
                    warn!(error = %e, "failed to enqueue finished recording");
                }
            }
        }
    }

    fn process_ethernet_frame(&mut self, frame: &[u8]) -> Vec<UploadRecord> {
        let Some(eth) = EthernetPacket::new(frame) else { return Vec::new() };
        if eth.get_ethertype() != EtherTypes::Ipv4 {
            return Vec::new();
        }
        let Some(ip) = Ipv4Packet::new(eth.payload()) else { return Vec::new() };
        if ip.get_next_level_protocol() != IpNextHeaderProtocols::Udp {
            return Vec::new();
        }

        let src_ip = IpAddr::V4(ip.get_source());
        let dst_ip = IpAddr::V4(ip.get_destination());

        let Some(payload) = self.defrag.feed(&ip) else {
            return Vec::new();
        };
        let Some(udp) = UdpPacket::new(&payload) else {
            return Vec::new();
        };

        debug!(%src_ip, %dst_ip, src_port = udp.get_source(), dst_port = udp.get_destination(), "captured UDP datagram");

        self.handle_udp_payload(
            src_ip,
            dst_ip,
            udp.get_source(),
            udp.get_destination(),
            udp.payload(),
        )
    }
}

fn find_interface(name: &str) -> Result<NetworkInterface> {
    datalink::interfaces()
        .into_iter()
        .find(|i| i.name == name)
        .ok_or_else(|| CaptureError::InterfaceNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cra_agent_config::ConfigError;
    use std::sync::Mutex;

    struct CapturingQueue {
        records: Mutex<Vec<UploadRecord>>,
    }

    impl CapturingQueue {
        fn new() -> Self {
            Self { records: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl UploadQueue for CapturingQueue {
        async fn enqueue(&self, record: UploadRecord) -> std::result::Result<(), ConfigError> {
            self.records.lock().unwrap().push(record);
            Ok(())
        }
    }

    fn recorder(dir: &std::path::Path) -> PassiveRecorder {
        PassiveRecorder::new(dir.to_path_buf(), Arc::new(CapturingQueue::new()))
    }

    fn invite_with_sdp(call_id: &str, addr: &str, port: u16) -> Vec<u8> {
        format!(
            "INVITE sip:bob@example.com SIP/2.0\r\n\
             Call-ID: {call_id}\r\n\
             Content-Type: application/sdp\r\n\
             \r\n\
             v=0\r\nc=IN IP4 {addr}\r\nm=audio {port} RTP/AVP 0\r\n"
        )
        .into_bytes()
    }

    fn ok_with_sdp(call_id: &str, addr: &str, port: u16) -> Vec<u8> {
        format!(
            "SIP/2.0 200 OK\r\n\
             Call-ID: {call_id}\r\n\
             Content-Type: application/sdp\r\n\
             \r\n\
             v=0\r\nc=IN IP4 {addr}\r\nm=audio {port} RTP/AVP 0\r\n"
        )
        .into_bytes()
    }

    fn bye(call_id: &str) -> Vec<u8> {
        format!("BYE sip:bob@example.com SIP/2.0\r\nCall-ID: {call_id}\r\n\r\n").into_bytes()
    }

    fn mulaw_rtp_packet(seq: u16) -> Vec<u8> {
        let mut packet = vec![0x80u8, 0x00, (seq >> 8) as u8, (seq & 0xFF) as u8, 0, 0, 0, 1, 0, 0, 0, 1];
        packet.extend_from_slice(&[0xFF; 160]);
        packet
    }

    #[test]
    fn invite_then_bye_with_no_rtp_produces_empty_wav_upload_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(dir.path());
        let any: IpAddr = "10.0.0.9".parse().unwrap();

        let out = rec.handle_udp_payload(any, any, 5060, 5060, &invite_with_sdp("call-1", "10.0.0.1", 30000));
        assert!(out.is_empty());
        assert!(rec.calls.contains_key("call-1"));

        let out = rec.handle_udp_payload(any, any, 5060, 5060, &bye("call-1"));
        // No RTP ever arrived, so no recorder was opened, and no upload is produced.
        assert!(out.is_empty());
        assert!(!rec.calls.contains_key("call-1"));
    }

    #[test]
    fn full_dialog_with_rtp_on_both_legs_produces_one_upload_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(dir.path());
        let any: IpAddr = "10.0.0.9".parse().unwrap();

        rec.handle_udp_payload(any, any, 5060, 5060, &invite_with_sdp("call-2", "10.0.0.1", 30000));
        rec.handle_udp_payload(any, any, 5060, 5060, &ok_with_sdp("call-2", "10.0.0.2", 40000));

        let caller_dst: IpAddr = "10.0.0.1".parse().unwrap();
        let callee_dst: IpAddr = "10.0.0.2".parse().unwrap();
        rec.handle_udp_payload(any, caller_dst, 4000, 30000, &mulaw_rtp_packet(1));
        rec.handle_udp_payload(any, callee_dst, 4000, 40000, &mulaw_rtp_packet(1));

        let out = rec.handle_udp_payload(any, any, 5060, 5060, &bye("call-2"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].record_type, UploadRecordType::CfsAudio);
        assert!(std::path::Path::new(&out[0].file_path).exists());
    }

    #[test]
    fn cancel_drops_call_without_upload() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(dir.path());
        let any: IpAddr = "10.0.0.9".parse().unwrap();

        rec.handle_udp_payload(any, any, 5060, 5060, &invite_with_sdp("call-3", "10.0.0.1", 30000));
        let out = rec.handle_udp_payload(
            any,
            any,
            5060,
            5060,
            b"CANCEL sip:bob@example.com SIP/2.0\r\nCall-ID: call-3\r\n\r\n",
        );
        assert!(out.is_empty());
        assert!(!rec.calls.contains_key("call-3"));
    }

    #[test]
    fn rtp_for_unknown_endpoint_is_silently_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = recorder(dir.path());
        let any: IpAddr = "10.0.0.9".parse().unwrap();
        let out = rec.handle_udp_payload(any, any, 4000, 30000, &mulaw_rtp_packet(1));
        assert!(out.is_empty());
    }
}
