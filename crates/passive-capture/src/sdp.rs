//! Minimal SDP parsing: only the session-level connection address and the
//! first audio media port are needed to learn where a call's RTP will
//! land. Mirrors the `pion/sdp` fields this reads upstream:
//! `SessionDescription.ConnectionInformation`, `MediaDescriptions[0]`.

use std::net::IpAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    pub connection_address: Option<IpAddr>,
    pub media_port: Option<u16>,
}

impl SessionDescription {
    pub fn parse(body: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(body).ok()?;

        let mut connection_address = None;
        let mut media_port = None;

        for line in text.lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix("c=") {
                if connection_address.is_none() {
                    connection_address = parse_connection_line(rest);
                }
            } else if let Some(rest) = line.strip_prefix("m=audio ") {
                if media_port.is_none() {
                    media_port = rest.split_whitespace().next().and_then(|p| p.parse().ok());
                }
            }
        }

        if connection_address.is_none() && media_port.is_none() {
            return None;
        }

        Some(SessionDescription { connection_address, media_port })
    }
}

fn parse_connection_line(rest: &str) -> Option<IpAddr> {
    // "IN IP4 10.0.0.5" (or IP6)
    let mut parts = rest.split_whitespace();
    let _nettype = parts.next()?;
    let _addrtype = parts.next()?;
    parts.next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_connection_address_and_media_port() {
        let body = "v=0\r\no=- 0 0 IN IP4 10.0.0.5\r\ns=-\r\nc=IN IP4 10.0.0.5\r\nt=0 0\r\nm=audio 30000 RTP/AVP 0 8\r\n";
        let sdp = SessionDescription::parse(body.as_bytes()).unwrap();
        assert_eq!(sdp.connection_address, Some("10.0.0.5".parse().unwrap()));
        assert_eq!(sdp.media_port, Some(30000));
    }

    #[test]
    fn ignores_video_media_lines() {
        let body = "v=0\r\nc=IN IP4 10.0.0.5\r\nm=video 40000 RTP/AVP 96\r\nm=audio 30000 RTP/AVP 0\r\n";
        let sdp = SessionDescription::parse(body.as_bytes()).unwrap();
        assert_eq!(sdp.media_port, Some(30000));
    }

    #[test]
    fn body_with_no_recognizable_lines_returns_none() {
        assert!(SessionDescription::parse(b"not sdp at all").is_none());
    }
}
