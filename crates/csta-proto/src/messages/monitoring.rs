//! Monitoring services (ECMA-323 ed4): `MonitorStart`/`MonitorStop`.

use crate::error::Result;
use crate::namespaces::CSTA_ED4;
use crate::types::{CrossRefId, CstaObject, MonitorType};
use crate::xmltree::XmlElement;

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorStart {
    pub monitor_object: CstaObject,
    pub monitor_type: MonitorType,
}

impl MonitorStart {
    pub const LOCAL_NAME: &'static str = "MonitorStart";
    pub const NAMESPACE: &'static str = CSTA_ED4;

    pub fn device(extension: impl Into<String>) -> Self {
        Self {
            monitor_object: CstaObject::device(extension),
            monitor_type: MonitorType::Device,
        }
    }

    /// Monitors a device already resolved to a vendor-specific device
    /// identifier (e.g. Avaya's `typeOfNumber="other"` after `GetDeviceId`).
    pub fn device_with_id(device_id: crate::types::DeviceId) -> Self {
        Self {
            monitor_object: crate::types::CstaObject::Device(device_id),
            monitor_type: MonitorType::Device,
        }
    }

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME)
            .with_child(self.monitor_object.encode("monitorObject"))
            .with_child(XmlElement::leaf("monitorType", self.monitor_type.as_str()))
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            monitor_object: CstaObject::decode(el.require_child("monitorObject")?)?,
            monitor_type: MonitorType::parse(el.require_child_text("monitorType")?)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorStartResponse {
    pub monitor_cross_ref_id: CrossRefId,
}

impl MonitorStartResponse {
    pub const LOCAL_NAME: &'static str = "MonitorStartResponse";
    pub const NAMESPACE: &'static str = CSTA_ED4;

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME).with_child(XmlElement::leaf(
            "monitorCrossRefID",
            self.monitor_cross_ref_id.clone(),
        ))
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            monitor_cross_ref_id: el.require_child_text("monitorCrossRefID")?.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorStop {
    pub monitor_cross_ref_id: CrossRefId,
}

impl MonitorStop {
    pub const LOCAL_NAME: &'static str = "MonitorStop";
    pub const NAMESPACE: &'static str = CSTA_ED4;

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME).with_child(XmlElement::leaf(
            "monitorCrossRefID",
            self.monitor_cross_ref_id.clone(),
        ))
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            monitor_cross_ref_id: el.require_child_text("monitorCrossRefID")?.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorStopResponse;

impl MonitorStopResponse {
    pub const LOCAL_NAME: &'static str = "MonitorStopResponse";
    pub const NAMESPACE: &'static str = CSTA_ED4;

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
    fn monitor_start_matches_known_wire_shape() {
        let msg = MonitorStart::device("212700");
        let xml = msg.encode().to_xml_string(MonitorStart::NAMESPACE).unwrap();
        assert_eq!(
            xml,
            "<MonitorStart xmlns=\"http://www.ecma-international.org/standards/ecma-323/csta/ed4\">\
<monitorObject><deviceObject typeOfNumber=\"dialingNumber\">212700</deviceObject></monitorObject>\
<monitorType>device</monitorType></MonitorStart>"
        );
        assert_eq!(xml.len(), 227);
    }
}
