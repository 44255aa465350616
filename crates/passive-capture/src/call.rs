//! Call table: one entry per in-progress SIP dialog, tracking the two RTP
//! flows negotiated by its offer/answer exchange and the stereo recorder
//! writing them to disk. Mirrors `passiveRecorder.calls map[string]*call`
//! and its `ToCaller`/`ToCallee` `rtpFlow` fields in
//! `passive_monitoring/recorder.go`.

use std::fs::File;
use std::net::IpAddr;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use cra_media_codec::MultichannelRecorder;

/// Channel index fed into [`MultichannelRecorder`]: caller audio on the
/// left channel, callee audio on the right.
pub const CHANNEL_CALLER: usize = 0;
pub const CHANNEL_CALLEE: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtpFlow {
    pub address: IpAddr,
    pub port: u16,
}

impl RtpFlow {
    pub fn matches(&self, address: IpAddr, port: u16) -> bool {
        self.address == address && self.port == port
    }
}

/// One tracked SIP dialog, from INVITE to BYE/CANCEL.
pub struct SipCall {
    pub call_id: String,
    pub to_caller: Option<RtpFlow>,
    pub to_callee: Option<RtpFlow>,
    pub recorder: Option<MultichannelRecorder<File>>,
    pub file_path: PathBuf,
    pub begin_time: DateTime<Utc>,
}

impl SipCall {
    pub fn new(call_id: String, file_path: PathBuf, begin_time: DateTime<Utc>) -> Self {
        Self {
            call_id,
            to_caller: None,
            to_callee: None,
            recorder: None,
            file_path,
            begin_time,
        }
    }

    /// Returns which channel (if any) an RTP packet arriving from
    /// `source` belongs to. Matched against the flow endpoints learned
    /// from the call's SDP offer/answer, same as the original's per-call
    /// "does this packet's destination match ToCaller or ToCallee" check.
    pub fn channel_for(&self, source: IpAddr, port: u16) -> Option<usize> {
        if self.to_caller.is_some_and(|f| f.matches(source, port)) {
            Some(CHANNEL_CALLER)
        } else if self.to_callee.is_some_and(|f| f.matches(source, port)) {
            Some(CHANNEL_CALLEE)
        } else {
            None
        }
    }

    /// Opens the WAV file on first use; a no-op on later calls for the
    /// same dialog.
    pub fn ensure_recorder(&mut self) -> cra_media_codec::Result<&mut MultichannelRecorder<File>> {
        if self.recorder.is_none() {
            let file = File::create(&self.file_path)?;
            self.recorder = Some(MultichannelRecorder::create(file, 2)?);
        }
        Ok(self.recorder.as_mut().expect("just inserted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(addr: &str, port: u16) -> RtpFlow {
        RtpFlow { address: addr.parse().unwrap(), port }
    }

    #[test]
    fn channel_for_matches_caller_and_callee_flows() {
        let mut call = SipCall::new("abc".to_string(), PathBuf::from("/tmp/abc.wav"), Utc::now());
        call.to_caller = Some(flow("10.0.0.1", 30000));
        call.to_callee = Some(flow("10.0.0.2", 40000));

        assert_eq!(call.channel_for("10.0.0.1".parse().unwrap(), 30000), Some(CHANNEL_CALLER));
        assert_eq!(call.channel_for("10.0.0.2".parse().unwrap(), 40000), Some(CHANNEL_CALLEE));
        assert_eq!(call.channel_for("10.0.0.3".parse().unwrap(), 50000), None);
    }
}
