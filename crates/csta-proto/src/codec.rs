//! Wire framing: the 8-byte CSTA header (format indicator + length + invoke
//! ID) wrapping an XML body, plus the streaming reader used by the
//! connection's read loop. Mirrors `message.go` (`marshal`/`unmarshal`)
//! and `conn.go` (`cstaConn.Read`).

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{CstaError, Result};
use crate::messages::Message;
use crate::registry;
use crate::xmltree::XmlElement;

pub const HEADER_SIZE: usize = 8;
const FORMAT_INDICATOR_TCP_WITHOUT_SOAP: u16 = 0x0000;

/// Encodes `message` into a complete on-wire frame: 2-byte format
/// indicator, 2-byte big-endian total length (including this header), a
/// 4-ASCII-digit invoke ID, then the XML body.
pub fn encode_frame(invoke_id: u16, message: &Message) -> Result<Vec<u8>> {
    let body = message.to_xml()?;
    let total_len = HEADER_SIZE + body.len();
    if total_len > u16::MAX as usize {
        return Err(CstaError::EncodeError(format!(
            "message too large to frame: {total_len} bytes"
        )));
    }

    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(&FORMAT_INDICATOR_TCP_WITHOUT_SOAP.to_be_bytes());
    out.extend_from_slice(&(total_len as u16).to_be_bytes());
    out.extend_from_slice(format!("{:04}", invoke_id % 10000).as_bytes());
    out.extend_from_slice(body.as_bytes());
    Ok(out)
}

/// A decoded frame: its invoke ID and parsed message body.
pub struct DecodedFrame {
    pub invoke_id: u16,
    pub message: Message,
}

/// Decodes a single complete frame (header + body) read off the wire.
pub fn decode_frame(frame: &[u8]) -> Result<DecodedFrame> {
    if frame.len() < HEADER_SIZE {
        return Err(CstaError::FramingError("frame shorter than header".into()));
    }
    let format_indicator = u16::from_be_bytes([frame[0], frame[1]]);
    if format_indicator != FORMAT_INDICATOR_TCP_WITHOUT_SOAP {
        return Err(CstaError::FramingError("invalid format indicator".into()));
    }
    let length = u16::from_be_bytes([frame[2], frame[3]]) as usize;
    if length != frame.len() {
        return Err(CstaError::FramingError(format!(
            "length mismatch: header says {length}, frame is {} bytes",
            frame.len()
        )));
    }
    if length <= HEADER_SIZE {
        return Err(CstaError::FramingError("invalid message length".into()));
    }

    let invoke_id: u16 = std::str::from_utf8(&frame[4..8])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| CstaError::FramingError("invalid invoke ID".into()))?;

    let body = std::str::from_utf8(&frame[HEADER_SIZE..])
        .map_err(|e| CstaError::DecodeError(e.to_string()))?;
    let root = XmlElement::from_xml_str(body)?;
    let message = registry::decode_by_local_name(&root)?;

    Ok(DecodedFrame { invoke_id, message })
}

/// Reads one complete frame from an async byte stream: the fixed 8-byte
/// header, then `length - 8` body bytes, then decodes it. Returns
/// [`CstaError::Eof`] on a clean stream close before any header bytes
/// arrive.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<DecodedFrame> {
    let mut header = [0u8; HEADER_SIZE];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(CstaError::Eof),
        Err(e) => return Err(CstaError::TransportError(e.to_string())),
    }

    let length = u16::from_be_bytes([header[2], header[3]]) as usize;
    if length <= HEADER_SIZE {
        return Err(CstaError::FramingError("invalid message length".into()));
    }

    let mut frame = Vec::with_capacity(length);
    frame.extend_from_slice(&header);
    frame.resize(length, 0);
    reader
        .read_exact(&mut frame[HEADER_SIZE..])
        .await
        .map_err(|e| CstaError::TransportError(e.to_string()))?;

    decode_frame(&frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::application_session::StartApplicationSession;
    use crate::messages::monitoring::MonitorStart;

    #[test]
    fn start_application_session_frame_matches_spec_scenario() {
        let msg = Message::StartApplicationSession(StartApplicationSession::new("testApplicationId"));
        let frame = encode_frame(1, &msg).unwrap();
        assert_eq!(&frame[0..4], &[0x00, 0x00, 0x01, 0xA7]);
        assert_eq!(&frame[4..8], b"0001");
        assert_eq!(frame.len(), 0x01A7);
    }

    #[test]
    fn monitor_start_frame_matches_spec_scenario() {
        let msg = Message::MonitorStart(MonitorStart::device("212700"));
        let frame = encode_frame(1, &msg).unwrap();
        assert_eq!(&frame[0..4], &[0x00, 0x00, 0x00, 0xEB]);
        assert_eq!(frame.len(), 0x00EB);
    }

    #[test]
    fn decode_frame_roundtrips_through_encode() {
        let msg = Message::MonitorStart(MonitorStart::device("212700"));
        let frame = encode_frame(42, &msg).unwrap();
        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(decoded.invoke_id, 42);
        assert!(matches!(decoded.message, Message::MonitorStart(_)));
    }

    #[test]
    fn decode_frame_rejects_length_mismatch() {
        let mut frame = encode_frame(1, &Message::MonitorStart(MonitorStart::device("1"))).unwrap();
        frame.push(0xFF);
        let err = decode_frame(&frame).unwrap_err();
        assert!(matches!(err, CstaError::FramingError(_)));
    }

    #[tokio::test]
    async fn read_frame_reports_eof_on_clean_close() {
        let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
        let err = read_frame(&mut cursor).await.unwrap_err();
        assert!(matches!(err, CstaError::Eof));
    }

    #[tokio::test]
    async fn read_frame_decodes_from_stream() {
        let msg = Message::MonitorStart(MonitorStart::device("212700"));
        let frame = encode_frame(7, &msg).unwrap();
        let mut cursor = std::io::Cursor::new(frame);
        let decoded = read_frame(&mut cursor).await.unwrap();
        assert_eq!(decoded.invoke_id, 7);
        assert!(matches!(decoded.message, Message::MonitorStart(_)));
    }
}
