//! Call control events: the five event types a device monitor delivers
//! across a call's lifetime. None of these carry an XML namespace in the
//! wire format the agent talks to.

use crate::error::Result;
use crate::types::{ConnectionId, CrossRefId, ExtendedDeviceId, RedirectionDeviceId};
use crate::xmltree::XmlElement;

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceInitiatedEvent {
    pub monitor_cross_ref_id: CrossRefId,
    pub initiated_connection: ConnectionId,
    pub initiating_device: ExtendedDeviceId,
    pub local_connection_info: String,
    pub cause: String,
}

impl ServiceInitiatedEvent {
    pub const LOCAL_NAME: &'static str = "ServiceInitiatedEvent";
    pub const NAMESPACE: &'static str = "";

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            monitor_cross_ref_id: el.require_child_text("monitorCrossRefID")?.to_string(),
            initiated_connection: ConnectionId::decode(el.require_child("initiatedConnection")?)?,
            initiating_device: ExtendedDeviceId::decode(el.require_child("initiatingDevice")?)?,
            local_connection_info: el.require_child_text("localConnectionInfo")?.to_string(),
            cause: el.require_child_text("cause")?.to_string(),
        })
    }

    #[cfg(test)]
    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME)
            .with_child(XmlElement::leaf(
                "monitorCrossRefID",
                self.monitor_cross_ref_id.clone(),
            ))
            .with_child(self.initiated_connection.encode("initiatedConnection"))
            .with_child(self.initiating_device.encode("initiatingDevice"))
            .with_child(XmlElement::leaf(
                "localConnectionInfo",
                self.local_connection_info.clone(),
            ))
            .with_child(XmlElement::leaf("cause", self.cause.clone()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OriginatedEvent {
    pub monitor_cross_ref_id: CrossRefId,
    pub originated_connection: ConnectionId,
    pub calling_device: ExtendedDeviceId,
    pub called_device: ExtendedDeviceId,
    pub local_connection_info: String,
    pub cause: String,
}

impl OriginatedEvent {
    pub const LOCAL_NAME: &'static str = "OriginatedEvent";
    pub const NAMESPACE: &'static str = "";

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            monitor_cross_ref_id: el.require_child_text("monitorCrossRefID")?.to_string(),
            originated_connection: ConnectionId::decode(el.require_child("originatedConnection")?)?,
            calling_device: ExtendedDeviceId::decode(el.require_child("callingDevice")?)?,
            called_device: ExtendedDeviceId::decode(el.require_child("calledDevice")?)?,
            local_connection_info: el.require_child_text("localConnectionInfo")?.to_string(),
            cause: el.require_child_text("cause")?.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredEvent {
    pub monitor_cross_ref_id: CrossRefId,
    pub connection: ConnectionId,
    pub alerting_device: ExtendedDeviceId,
    pub calling_device: ExtendedDeviceId,
    pub called_device: ExtendedDeviceId,
    pub last_redirection_device: RedirectionDeviceId,
    pub local_connection_info: String,
    pub cause: String,
}

impl DeliveredEvent {
    pub const LOCAL_NAME: &'static str = "DeliveredEvent";
    pub const NAMESPACE: &'static str = "";

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            monitor_cross_ref_id: el.require_child_text("monitorCrossRefID")?.to_string(),
            connection: ConnectionId::decode(el.require_child("connection")?)?,
            alerting_device: ExtendedDeviceId::decode(el.require_child("alertingDevice")?)?,
            calling_device: ExtendedDeviceId::decode(el.require_child("callingDevice")?)?,
            called_device: ExtendedDeviceId::decode(el.require_child("calledDevice")?)?,
            last_redirection_device: RedirectionDeviceId::decode(
                el.require_child("lastRedirectionDevice")?,
            )?,
            local_connection_info: el.require_child_text("localConnectionInfo")?.to_string(),
            cause: el.require_child_text("cause")?.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EstablishedEvent {
    pub monitor_cross_ref_id: CrossRefId,
    pub established_connection: ConnectionId,
    pub answering_device: ExtendedDeviceId,
    pub calling_device: ExtendedDeviceId,
    pub called_device: ExtendedDeviceId,
    pub last_redirection_device: RedirectionDeviceId,
    pub local_connection_info: String,
    pub cause: String,
}

impl EstablishedEvent {
    pub const LOCAL_NAME: &'static str = "EstablishedEvent";
    pub const NAMESPACE: &'static str = "";

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            monitor_cross_ref_id: el.require_child_text("monitorCrossRefID")?.to_string(),
            established_connection: ConnectionId::decode(el.require_child("establishedConnection")?)?,
            answering_device: ExtendedDeviceId::decode(el.require_child("answeringDevice")?)?,
            calling_device: ExtendedDeviceId::decode(el.require_child("callingDevice")?)?,
            called_device: ExtendedDeviceId::decode(el.require_child("calledDevice")?)?,
            last_redirection_device: RedirectionDeviceId::decode(
                el.require_child("lastRedirectionDevice")?,
            )?,
            local_connection_info: el.require_child_text("localConnectionInfo")?.to_string(),
            cause: el.require_child_text("cause")?.to_string(),
        })
    }

    #[cfg(test)]
    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME)
            .with_child(XmlElement::leaf(
                "monitorCrossRefID",
                self.monitor_cross_ref_id.clone(),
            ))
            .with_child(self.established_connection.encode("establishedConnection"))
            .with_child(self.answering_device.encode("answeringDevice"))
            .with_child(self.calling_device.encode("callingDevice"))
            .with_child(self.called_device.encode("calledDevice"))
            .with_child(self.last_redirection_device.encode("lastRedirectionDevice"))
            .with_child(XmlElement::leaf(
                "localConnectionInfo",
                self.local_connection_info.clone(),
            ))
            .with_child(XmlElement::leaf("cause", self.cause.clone()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionClearedEvent {
    pub monitor_cross_ref_id: CrossRefId,
    pub dropped_connection: ConnectionId,
    pub releasing_device: ExtendedDeviceId,
    pub local_connection_info: String,
    pub cause: String,
}

impl ConnectionClearedEvent {
    pub const LOCAL_NAME: &'static str = "ConnectionClearedEvent";
    pub const NAMESPACE: &'static str = "";

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            monitor_cross_ref_id: el.require_child_text("monitorCrossRefID")?.to_string(),
            dropped_connection: ConnectionId::decode(el.require_child("droppedConnection")?)?,
            releasing_device: ExtendedDeviceId::decode(el.require_child("releasingDevice")?)?,
            local_connection_info: el.require_child_text("localConnectionInfo")?.to_string(),
            cause: el.require_child_text("cause")?.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CstaObject, DeviceId, LocalDeviceId};

    #[test]
    fn established_event_roundtrip() {
        let ev = EstablishedEvent {
            monitor_cross_ref_id: "1001".to_string(),
            established_connection: ConnectionId {
                call_id: "42".to_string(),
                device_id: Some(LocalDeviceId {
                    type_of_number: "dialingNumber".to_string(),
                    value: "212700".to_string(),
                }),
            },
            answering_device: ExtendedDeviceId::Known(DeviceId::dialing_number("212700")),
            calling_device: ExtendedDeviceId::Known(DeviceId::dialing_number("212701")),
            called_device: ExtendedDeviceId::Known(DeviceId::dialing_number("212700")),
            last_redirection_device: RedirectionDeviceId::NotRequired,
            local_connection_info: "connected".to_string(),
            cause: "normal".to_string(),
        };

        let xml = ev.encode().to_xml_string("").unwrap();
        let parsed = XmlElement::from_xml_str(&xml).unwrap();
        let decoded = EstablishedEvent::decode(&parsed).unwrap();
        assert_eq!(decoded.monitor_cross_ref_id, "1001");
        assert_eq!(decoded.answering_device.number(), Some("212700"));
        // lastRedirectionDevice round-trips through notRequired-only alternatives below.
        let _ = CstaObject::device("x");
    }
}
