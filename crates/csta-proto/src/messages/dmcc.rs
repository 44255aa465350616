//! DMCC services (Avaya AES vendor namespace): terminal registration and
//! extension-to-device resolution.

use crate::error::{CstaError, Result};
use crate::namespaces::AVAYA_CSTA;
use crate::types::DeviceId;
use crate::xmltree::XmlElement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaMode {
    Server,
    Client,
}

impl MediaMode {
    fn as_str(self) -> &'static str {
        match self {
            MediaMode::Server => "SERVER",
            MediaMode::Client => "CLIENT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyMode {
    Main,
    Independent,
    Dependent,
}

impl DependencyMode {
    fn as_str(self) -> &'static str {
        match self {
            DependencyMode::Main => "MAIN",
            DependencyMode::Independent => "INDEPENDENT",
            DependencyMode::Dependent => "DEPENDENT",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginInfo {
    pub force_login: bool,
    pub shared_control: bool,
    pub password: String,
    pub media_mode: MediaMode,
    pub dependency_mode: DependencyMode,
}

impl LoginInfo {
    fn encode(&self) -> XmlElement {
        XmlElement::new("loginInfo")
            .with_child(XmlElement::leaf("forceLogin", self.force_login.to_string()))
            .with_child(XmlElement::leaf("sharedControl", self.shared_control.to_string()))
            .with_child(XmlElement::leaf("password", self.password.clone()))
            .with_child(XmlElement::leaf("mediaMode", self.media_mode.as_str()))
            .with_child(XmlElement::leaf("dependencyMode", self.dependency_mode.as_str()))
    }
}

/// `address`/`port` pair used for `rtpAddress`/`rtcpAddress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkEndpoint {
    pub address: std::net::IpAddr,
    pub port: u16,
}

impl NetworkEndpoint {
    fn encode(&self, element_name: &str) -> XmlElement {
        XmlElement::new(element_name)
            .with_child(XmlElement::leaf("address", self.address.to_string()))
            .with_child(XmlElement::leaf("port", self.port.to_string()))
    }

    fn decode(el: &XmlElement) -> Result<Self> {
        let address = el
            .require_child_text("address")?
            .parse()
            .map_err(|_| CstaError::DecodeError("invalid address in NetworkEndpoint".into()))?;
        let port = el
            .require_child_text("port")?
            .parse()
            .map_err(|_| CstaError::DecodeError("invalid port in NetworkEndpoint".into()))?;
        Ok(Self { address, port })
    }
}

/// Tells the switch where to stream a registered virtual station's audio.
/// The agent always asks for G.711 mu-law, 20 ms packets, no encryption —
/// the only combination the RTP recorder pool decodes.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMediaInfo {
    pub rtp_address: NetworkEndpoint,
    pub rtcp_address: Option<NetworkEndpoint>,
    pub codecs: Vec<String>,
    pub packet_size_ms: u32,
    pub encryption_list: Vec<String>,
}

impl LocalMediaInfo {
    pub fn g711_mu_law(rtp_address: NetworkEndpoint) -> Self {
        Self {
            rtp_address,
            rtcp_address: None,
            codecs: vec!["G.711MU".to_string()],
            packet_size_ms: 20,
            encryption_list: vec!["NONE".to_string()],
        }
    }

    fn encode(&self) -> XmlElement {
        let mut el = XmlElement::new("localMediaInfo").with_child(self.rtp_address.encode("rtpAddress"));
        if let Some(rtcp) = &self.rtcp_address {
            el = el.with_child(rtcp.encode("rtcpAddress"));
        }
        for codec in &self.codecs {
            el = el.with_child(XmlElement::leaf("codecs", codec.clone()));
        }
        el = el.with_child(XmlElement::leaf("packetSize", self.packet_size_ms.to_string()));
        for encryption in &self.encryption_list {
            el = el.with_child(XmlElement::leaf("encryptionList", encryption.clone()));
        }
        el
    }

    fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            rtp_address: NetworkEndpoint::decode(el.require_child("rtpAddress")?)?,
            rtcp_address: el.child("rtcpAddress").map(NetworkEndpoint::decode).transpose()?,
            codecs: el.children_named("codecs").map(|c| c.require_text().map(str::to_string)).collect::<Result<Vec<_>>>()?,
            packet_size_ms: el
                .require_child_text("packetSize")?
                .parse()
                .map_err(|_| CstaError::DecodeError("invalid packetSize".into()))?,
            encryption_list: el
                .children_named("encryptionList")
                .map(|c| c.require_text().map(str::to_string))
                .collect::<Result<Vec<_>>>()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterTerminalRequest {
    pub device: DeviceId,
    pub login_info: LoginInfo,
    pub local_media_info: Option<LocalMediaInfo>,
}

impl RegisterTerminalRequest {
    pub const LOCAL_NAME: &'static str = "RegisterTerminalRequest";
    pub const NAMESPACE: &'static str = AVAYA_CSTA;

    pub fn new(extension: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            device: DeviceId::dialing_number(extension),
            login_info: LoginInfo {
                force_login: true,
                shared_control: false,
                password: password.into(),
                media_mode: MediaMode::Server,
                dependency_mode: DependencyMode::Independent,
            },
            local_media_info: None,
        }
    }

    /// Registers a virtual recording station whose audio streams to
    /// `rtp_address` as G.711 mu-law, 20 ms packets, unencrypted.
    pub fn with_local_rtp_endpoint(mut self, rtp_address: NetworkEndpoint) -> Self {
        self.local_media_info = Some(LocalMediaInfo::g711_mu_law(rtp_address));
        self
    }

    pub fn encode(&self) -> XmlElement {
        let mut el = XmlElement::new(Self::LOCAL_NAME)
            .with_child(self.device.encode("device"))
            .with_child(self.login_info.encode());
        if let Some(media) = &self.local_media_info {
            el = el.with_child(media.encode());
        }
        el
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        let login = el.require_child("loginInfo")?;
        Ok(Self {
            device: DeviceId::decode(el.require_child("device")?)?,
            login_info: LoginInfo {
                force_login: login.require_child_text("forceLogin")? == "true",
                shared_control: login.require_child_text("sharedControl")? == "true",
                password: login.require_child_text("password")?.to_string(),
                media_mode: match login.require_child_text("mediaMode")? {
                    "SERVER" => MediaMode::Server,
                    "CLIENT" => MediaMode::Client,
                    other => return Err(CstaError::DecodeError(format!("unknown mediaMode: {other}"))),
                },
                dependency_mode: match login.require_child_text("dependencyMode")? {
                    "MAIN" => DependencyMode::Main,
                    "INDEPENDENT" => DependencyMode::Independent,
                    "DEPENDENT" => DependencyMode::Dependent,
                    other => {
                        return Err(CstaError::DecodeError(format!(
                            "unknown dependencyMode: {other}"
                        )))
                    }
                },
            },
            local_media_info: el.child("localMediaInfo").map(LocalMediaInfo::decode).transpose()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterTerminalResponse {
    pub device: DeviceId,
    pub signalling_encryption: String,
    pub code: String,
}

impl RegisterTerminalResponse {
    pub const LOCAL_NAME: &'static str = "RegisterTerminalResponse";
    pub const NAMESPACE: &'static str = AVAYA_CSTA;

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME)
            .with_child(XmlElement::new("device").with_child(self.device.encode("deviceIdentifier")))
            .with_child(XmlElement::leaf(
                "signallingEncryption",
                self.signalling_encryption.clone(),
            ))
            .with_child(XmlElement::leaf("code", self.code.clone()))
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            device: DeviceId::decode(el.path(&["device", "deviceIdentifier"]).ok_or_else(|| {
                CstaError::DecodeError("missing device/deviceIdentifier".into())
            })?)?,
            signalling_encryption: el.require_child_text("signallingEncryption")?.to_string(),
            code: el.require_child_text("code")?.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetDeviceId {
    pub switch_name: Option<String>,
    pub extension: String,
}

impl GetDeviceId {
    pub const LOCAL_NAME: &'static str = "GetDeviceId";
    pub const NAMESPACE: &'static str = AVAYA_CSTA;

    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            switch_name: None,
            extension: extension.into(),
        }
    }

    pub fn encode(&self) -> XmlElement {
        let mut el = XmlElement::new(Self::LOCAL_NAME);
        if let Some(sw) = &self.switch_name {
            el = el.with_child(XmlElement::leaf("switchName", sw.clone()));
        }
        el.with_child(XmlElement::leaf("extension", self.extension.clone()))
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            switch_name: el.child_text("switchName").map(str::to_string),
            extension: el.require_child_text("extension")?.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetDeviceIdResponse {
    pub device: DeviceId,
}

impl GetDeviceIdResponse {
    pub const LOCAL_NAME: &'static str = "GetDeviceIdResponse";
    pub const NAMESPACE: &'static str = AVAYA_CSTA;

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME).with_child(self.device.encode("device"))
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            device: DeviceId::decode(el.require_child("device")?)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_terminal_request_round_trips_with_local_media_info() {
        let endpoint = NetworkEndpoint {
            address: "10.0.0.5".parse().unwrap(),
            port: 31000,
        };
        let request = RegisterTerminalRequest::new("212700", "secret").with_local_rtp_endpoint(endpoint);

        let xml = request.encode();
        let decoded = RegisterTerminalRequest::decode(&xml).unwrap();
        assert_eq!(decoded, request);

        let media = decoded.local_media_info.unwrap();
        assert_eq!(media.codecs, vec!["G.711MU".to_string()]);
        assert_eq!(media.packet_size_ms, 20);
        assert_eq!(media.encryption_list, vec!["NONE".to_string()]);
    }

    #[test]
    fn register_terminal_request_without_media_info_round_trips() {
        let request = RegisterTerminalRequest::new("212700", "secret");
        let xml = request.encode();
        let decoded = RegisterTerminalRequest::decode(&xml).unwrap();
        assert_eq!(decoded, request);
        assert!(decoded.local_media_info.is_none());
    }
}
