//! Capability exchange services: switching-function device enumeration.

use crate::error::Result;
use crate::namespaces::CSTA_ED4;
use crate::types::DeviceList;
use crate::xmltree::XmlElement;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetSwitchingFunctionDevices;

impl GetSwitchingFunctionDevices {
    pub const LOCAL_NAME: &'static str = "GetSwitchingFunctionDevices";
    pub const NAMESPACE: &'static str = CSTA_ED4;

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME)
    }

    pub fn decode(_el: &XmlElement) -> Result<Self> {
        Ok(Self)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetSwitchingFunctionDevicesResponse;

impl GetSwitchingFunctionDevicesResponse {
    pub const LOCAL_NAME: &'static str = "GetSwitchingFunctionDevicesResponse";
    pub const NAMESPACE: &'static str = CSTA_ED4;

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME)
    }

    pub fn decode(_el: &XmlElement) -> Result<Self> {
        Ok(Self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchingFunctionDevices {
    pub service_cross_ref_id: String,
    pub segment_id: u32,
    pub last_segment: bool,
    pub device_list: DeviceList,
}

impl SwitchingFunctionDevices {
    pub const LOCAL_NAME: &'static str = "SwitchingFunctionDevices";
    pub const NAMESPACE: &'static str = CSTA_ED4;

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME)
            .with_child(XmlElement::leaf(
                "serviceCrossRefID",
                self.service_cross_ref_id.clone(),
            ))
            .with_child(XmlElement::leaf("segmentID", self.segment_id.to_string()))
            .with_child(XmlElement::leaf("lastSegment", self.last_segment.to_string()))
            .with_child(self.device_list.encode())
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            service_cross_ref_id: el.require_child_text("serviceCrossRefID")?.to_string(),
            segment_id: el
                .require_child_text("segmentID")?
                .parse()
                .unwrap_or_default(),
            last_segment: el.require_child_text("lastSegment")? == "true",
            device_list: DeviceList::decode(el.require_child("deviceList")?)?,
        })
    }
}
