//! Minimal SIP message parsing: just enough to dispatch on method/status
//! and pull out `Call-ID` and `Content-Type`. Grounded in the original
//! implementation's use of `gopacket/layers`' SIP decoder
//! (`sip.Method`, `sip.IsResponse`, `sip.ResponseCode`,
//! `sip.GetFirstHeader`, `sip.GetCallID`).

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SipMethod {
    Invite,
    Cancel,
    Bye,
    Other(String),
}

impl SipMethod {
    fn parse(token: &str) -> Self {
        match token.to_ascii_uppercase().as_str() {
            "INVITE" => SipMethod::Invite,
            "CANCEL" => SipMethod::Cancel,
            "BYE" => SipMethod::Bye,
            other => SipMethod::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SipMessage {
    pub is_response: bool,
    pub method: Option<SipMethod>,
    pub status_code: Option<u16>,
    pub call_id: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl SipMessage {
    /// Parses a UDP payload as a SIP message. Returns `None` if it doesn't
    /// look like SIP at all (no header/body split, no recognizable start
    /// line) rather than erroring — most UDP traffic on a mirrored port
    /// isn't SIP.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(data).ok()?;
        let (header_block, body) = split_headers_and_body(text)?;

        let mut lines = header_block.split("\r\n").flat_map(|l| l.split('\n'));
        let start_line = lines.next()?.trim();
        if start_line.is_empty() {
            return None;
        }

        let (is_response, method, status_code) = if let Some(rest) = start_line.strip_prefix("SIP/2.0") {
            let code = rest.trim().split_whitespace().next()?.parse::<u16>().ok()?;
            (true, None, Some(code))
        } else {
            let method = start_line.split_whitespace().next()?;
            (false, Some(SipMethod::parse(method)), None)
        };

        let mut call_id = None;
        let mut content_type = None;
        for line in header_block.split("\r\n").flat_map(|l| l.split('\n')).skip(1) {
            let Some((name, value)) = line.split_once(':') else { continue };
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim().to_string();
            match name.as_str() {
                "call-id" | "i" => call_id = Some(value),
                "content-type" | "c" => content_type = Some(value),
                _ => {}
            }
        }

        Some(SipMessage {
            is_response,
            method,
            status_code,
            call_id,
            content_type,
            body: body.as_bytes().to_vec(),
        })
    }

    pub fn is_success_response(&self) -> bool {
        matches!(self.status_code, Some(code) if (200..300).contains(&code))
    }
}

fn split_headers_and_body(text: &str) -> Option<(&str, &str)> {
    if let Some(idx) = text.find("\r\n\r\n") {
        return Some((&text[..idx], &text[idx + 4..]));
    }
    if let Some(idx) = text.find("\n\n") {
        return Some((&text[..idx], &text[idx + 2..]));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_invite_with_call_id_and_sdp_content_type() {
        let raw = "INVITE sip:bob@example.com SIP/2.0\r\n\
            Call-ID: abc-123\r\n\
            Content-Type: application/sdp\r\n\
            \r\n\
            v=0\r\n";
        let msg = SipMessage::parse(raw.as_bytes()).unwrap();
        assert!(!msg.is_response);
        assert_eq!(msg.method, Some(SipMethod::Invite));
        assert_eq!(msg.call_id.as_deref(), Some("abc-123"));
        assert_eq!(msg.content_type.as_deref(), Some("application/sdp"));
        assert_eq!(msg.body, b"v=0\r\n");
    }

    #[test]
    fn parses_bye_with_compact_call_id_header() {
        let raw = "BYE sip:bob@example.com SIP/2.0\r\ni: xyz-789\r\n\r\n";
        let msg = SipMessage::parse(raw.as_bytes()).unwrap();
        assert_eq!(msg.method, Some(SipMethod::Bye));
        assert_eq!(msg.call_id.as_deref(), Some("xyz-789"));
    }

    #[test]
    fn parses_200_ok_response_as_success() {
        let raw = "SIP/2.0 200 OK\r\nCall-ID: abc-123\r\n\r\nv=0\r\n";
        let msg = SipMessage::parse(raw.as_bytes()).unwrap();
        assert!(msg.is_response);
        assert_eq!(msg.status_code, Some(200));
        assert!(msg.is_success_response());
    }

    #[test]
    fn non_sip_udp_payload_returns_none() {
        assert!(SipMessage::parse(b"\x80\x08\x00\x00\x12\x34rtpaudio").is_none());
    }
}
