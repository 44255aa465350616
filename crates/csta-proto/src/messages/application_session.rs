//! Application session services (ECMA-354): start, refresh and stop.

use crate::error::{CstaError, Result};
use crate::namespaces::APPL_SESSION;
use crate::xmltree::XmlElement;

pub const DEFAULT_SESSION_DURATION: u32 = 60;
pub const PROTOCOL_VERSION_ED4: &str = "http://www.ecma-international.org/standards/ecma-323/csta/ed4";
/// Avaya AES speaks against an older revision of the protocol.
pub const PROTOCOL_VERSION_ED3: &str = "http://www.ecma-international.org/standards/ecma-323/csta/ed3";

#[derive(Debug, Clone, PartialEq)]
pub struct StartApplicationSession {
    pub application_id: String,
    /// Vendor-specific login payload (e.g. OSBiz's `user`/`password`, Avaya's
    /// ed3/priv5 login info), carried opaquely under
    /// `applicationInfo>applicationSpecificInfo`. Only `children` is used —
    /// they become `applicationSpecificInfo`'s direct children, so e.g.
    /// OSBiz's flat `user`/`password` pair is built as an unnamed element
    /// holding two leaf children.
    pub application_specific_info: Option<XmlElement>,
    pub protocol_version: String,
    pub requested_session_duration: u32,
}

impl StartApplicationSession {
    pub const LOCAL_NAME: &'static str = "StartApplicationSession";
    pub const NAMESPACE: &'static str = APPL_SESSION;

    pub fn new(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            application_specific_info: None,
            protocol_version: PROTOCOL_VERSION_ED4.to_string(),
            requested_session_duration: 300,
        }
    }

    pub fn encode(&self) -> XmlElement {
        let mut application_info = XmlElement::new("applicationInfo")
            .with_child(XmlElement::leaf("applicationID", self.application_id.clone()));
        if let Some(info) = &self.application_specific_info {
            let mut wrapper = XmlElement::new("applicationSpecificInfo");
            wrapper.children = info.children.clone();
            application_info = application_info.with_child(wrapper);
        }
        XmlElement::new(Self::LOCAL_NAME)
            .with_child(application_info)
            .with_child(
                XmlElement::new("requestedProtocolVersions")
                    .with_child(XmlElement::leaf("protocolVersion", self.protocol_version.clone())),
            )
            .with_child(XmlElement::leaf(
                "requestedSessionDuration",
                self.requested_session_duration.to_string(),
            ))
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        let application_id = el
            .path(&["applicationInfo", "applicationID"])
            .and_then(|e| e.text.as_deref())
            .ok_or_else(|| CstaError::DecodeError("missing applicationID".into()))?
            .to_string();
        let requested_session_duration = el
            .require_child_text("requestedSessionDuration")?
            .parse()
            .map_err(|_| CstaError::DecodeError("invalid requestedSessionDuration".into()))?;
        let application_specific_info = el
            .path(&["applicationInfo", "applicationSpecificInfo"])
            .map(|e| XmlElement {
                children: e.children.clone(),
                ..XmlElement::new("applicationSpecificInfo")
            });
        let protocol_version = el
            .path(&["requestedProtocolVersions", "protocolVersion"])
            .and_then(|e| e.text.clone())
            .unwrap_or_else(|| PROTOCOL_VERSION_ED4.to_string());
        Ok(Self {
            application_id,
            application_specific_info,
            protocol_version,
            requested_session_duration,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartApplicationSessionPosResponse {
    pub session_id: String,
    pub actual_protocol_version: String,
    pub actual_session_duration: u32,
}

impl StartApplicationSessionPosResponse {
    pub const LOCAL_NAME: &'static str = "StartApplicationSessionPosResponse";
    pub const NAMESPACE: &'static str = APPL_SESSION;

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME)
            .with_child(XmlElement::leaf("sessionID", self.session_id.clone()))
            .with_child(XmlElement::leaf(
                "actualProtocolVersion",
                self.actual_protocol_version.clone(),
            ))
            .with_child(XmlElement::leaf(
                "actualSessionDuration",
                self.actual_session_duration.to_string(),
            ))
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            session_id: el.require_child_text("sessionID")?.to_string(),
            actual_protocol_version: el.require_child_text("actualProtocolVersion")?.to_string(),
            actual_session_duration: el
                .require_child_text("actualSessionDuration")?
                .parse()
                .map_err(|_| CstaError::DecodeError("invalid actualSessionDuration".into()))?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartApplicationSessionNegResponse;

impl StartApplicationSessionNegResponse {
    pub const LOCAL_NAME: &'static str = "StartApplicationSessionNegResponse";
    pub const NAMESPACE: &'static str = APPL_SESSION;

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME)
    }

    pub fn decode(_el: &XmlElement) -> Result<Self> {
        Ok(Self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResetApplicationSessionTimer {
    pub session_id: String,
    pub requested_session_duration: u32,
}

impl ResetApplicationSessionTimer {
    pub const LOCAL_NAME: &'static str = "ResetApplicationSessionTimer";
    pub const NAMESPACE: &'static str = APPL_SESSION;

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME)
            .with_child(XmlElement::leaf("sessionID", self.session_id.clone()))
            .with_child(XmlElement::leaf(
                "requestedSessionDuration",
                self.requested_session_duration.to_string(),
            ))
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            session_id: el.require_child_text("sessionID")?.to_string(),
            requested_session_duration: el
                .require_child_text("requestedSessionDuration")?
                .parse()
                .map_err(|_| CstaError::DecodeError("invalid requestedSessionDuration".into()))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResetApplicationSessionTimerPosResponse {
    pub actual_session_duration: u32,
}

impl ResetApplicationSessionTimerPosResponse {
    pub const LOCAL_NAME: &'static str = "ResetApplicationSessionTimerPosResponse";
    pub const NAMESPACE: &'static str = APPL_SESSION;

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME).with_child(XmlElement::leaf(
            "actualSessionDuration",
            self.actual_session_duration.to_string(),
        ))
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            actual_session_duration: el
                .require_child_text("actualSessionDuration")?
                .parse()
                .map_err(|_| CstaError::DecodeError("invalid actualSessionDuration".into()))?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResetApplicationSessionTimerNegResponse;

impl ResetApplicationSessionTimerNegResponse {
    pub const LOCAL_NAME: &'static str = "ResetApplicationSessionTimerNegResponse";
    pub const NAMESPACE: &'static str = APPL_SESSION;

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME)
    }

    pub fn decode(_el: &XmlElement) -> Result<Self> {
        Ok(Self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopApplicationSession {
    pub session_id: String,
}

impl StopApplicationSession {
    pub const LOCAL_NAME: &'static str = "StopApplicationSession";
    pub const NAMESPACE: &'static str = APPL_SESSION;

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME)
            .with_child(XmlElement::leaf("sessionID", self.session_id.clone()))
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            session_id: el.require_child_text("sessionID")?.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopApplicationSessionResponse;

impl StopApplicationSessionResponse {
    pub const LOCAL_NAME: &'static str = "StopApplicationSessionResponse";
    pub const NAMESPACE: &'static str = APPL_SESSION;

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME)
    }

    pub fn decode(_el: &XmlElement) -> Result<Self> {
        Ok(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_application_session_matches_known_wire_shape() {
        let msg = StartApplicationSession::new("testApplicationId");
        let xml = msg.encode().to_xml_string(StartApplicationSession::NAMESPACE).unwrap();
        assert_eq!(
            xml,
            "<StartApplicationSession xmlns=\"http://www.ecma-international.org/standards/ecma-354/appl_session\">\
<applicationInfo><applicationID>testApplicationId</applicationID></applicationInfo>\
<requestedProtocolVersions><protocolVersion>http://www.ecma-international.org/standards/ecma-323/csta/ed4</protocolVersion></requestedProtocolVersions>\
<requestedSessionDuration>300</requestedSessionDuration></StartApplicationSession>"
        );
        assert_eq!(xml.len(), 415);
    }

    #[test]
    fn start_application_session_roundtrip() {
        let msg = StartApplicationSession::new("foo");
        let parsed = StartApplicationSession::decode(&msg.encode()).unwrap();
        assert_eq!(parsed.application_id, "foo");
    }
}
