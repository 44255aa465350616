//! Snapshot services: point-in-time device state queries.

use crate::error::Result;
use crate::namespaces::CSTA_ED4;
use crate::types::CstaObject;
use crate::xmltree::XmlElement;

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotDevice {
    pub snapshot_object: CstaObject,
}

impl SnapshotDevice {
    pub const LOCAL_NAME: &'static str = "SnapshotDevice";
    pub const NAMESPACE: &'static str = CSTA_ED4;

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME).with_child(self.snapshot_object.encode("snapshotObject"))
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            snapshot_object: CstaObject::decode(el.require_child("snapshotObject")?)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotDeviceResponse {
    pub service_cross_ref_id: String,
}

impl SnapshotDeviceResponse {
    pub const LOCAL_NAME: &'static str = "SnapshotDeviceResponse";
    pub const NAMESPACE: &'static str = CSTA_ED4;

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME).with_child(XmlElement::leaf(
            "serviceCrossRefID",
            self.service_cross_ref_id.clone(),
        ))
    }

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            service_cross_ref_id: el.require_child_text("serviceCrossRefID")?.to_string(),
        })
    }
}
