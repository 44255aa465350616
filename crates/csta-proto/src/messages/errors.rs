//! The generic CSTA fault message. A PBX sends this in place of a positive
//! response when an operation is refused or otherwise fails.

use crate::error::Result;
use crate::xmltree::XmlElement;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CstaErrorCode {
    pub operation: Option<String>,
}

impl CstaErrorCode {
    pub const LOCAL_NAME: &'static str = "CSTAErrorCode";
    pub const NAMESPACE: &'static str = "";

    pub fn decode(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            operation: el.child_text("operation").map(str::to_string),
        })
    }
}
