//! Device maintenance events: PBX-side device availability changes.

use crate::error::Result;
use crate::namespaces::CSTA_ED4;
use crate::types::{CrossRefId, ExtendedDeviceId};
use crate::xmltree::XmlElement;

#[derive(Debug, Clone, PartialEq)]
pub struct OutOfServiceEvent {
    pub monitor_cross_ref_id: CrossRefId,
    pub device: ExtendedDeviceId,
}

impl OutOfServiceEvent {
    pub const LOCAL_NAME: &'static str = "OutOfServiceEvent";
    pub const NAMESPACE: &'static str = CSTA_ED4;

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            monitor_cross_ref_id: el.require_child_text("monitorCrossRefID")?.to_string(),
            device: ExtendedDeviceId::decode(el.require_child("device")?)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackInServiceEvent {
    pub monitor_cross_ref_id: CrossRefId,
    pub device: ExtendedDeviceId,
}

impl BackInServiceEvent {
    pub const LOCAL_NAME: &'static str = "BackInServiceEvent";
    pub const NAMESPACE: &'static str = CSTA_ED4;

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            monitor_cross_ref_id: el.require_child_text("monitorCrossRefID")?.to_string(),
            device: ExtendedDeviceId::decode(el.require_child("device")?)?,
        })
    }
}
