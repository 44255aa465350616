//! Physical device events: button presses reported by a monitored set.

use crate::error::Result;
use crate::types::{CrossRefId, ExtendedDeviceId};
use crate::xmltree::XmlElement;

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonInformationEvent {
    pub monitor_cross_ref_id: CrossRefId,
    pub device: ExtendedDeviceId,
    pub button: String,
}

impl ButtonInformationEvent {
    pub const LOCAL_NAME: &'static str = "ButtonInformationEvent";
    pub const NAMESPACE: &'static str = "";

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            monitor_cross_ref_id: el.require_child_text("monitorCrossRefID")?.to_string(),
            device: ExtendedDeviceId::decode(el.require_child("device")?)?,
            button: el.require_child_text("button")?.to_string(),
        })
    }
}
