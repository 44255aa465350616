//! System services: the empty `SystemStatus` keep-alive ping.

use crate::error::Result;
use crate::namespaces::CSTA_ED4;
use crate::xmltree::XmlElement;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemStatus;

impl SystemStatus {
    pub const LOCAL_NAME: &'static str = "SystemStatus";
    pub const NAMESPACE: &'static str = CSTA_ED4;

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME)
    }

    pub fn decode(_el: &XmlElement) -> Result<Self> {
        Ok(Self)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemStatusResponse;

impl SystemStatusResponse {
    pub const LOCAL_NAME: &'static str = "SystemStatusResponse";
    pub const NAMESPACE: &'static str = CSTA_ED4;

    pub fn encode(&self) -> XmlElement {
        XmlElement::new(Self::LOCAL_NAME)
    }

    pub fn decode(_el: &XmlElement) -> Result<Self> {
        Ok(Self)
    }
}
