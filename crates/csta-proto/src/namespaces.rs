//! XML namespaces used across the three CSTA/ACSE vendor dialects.

pub const APPL_SESSION: &str = "http://www.ecma-international.org/standards/ecma-354/appl_session";
pub const CSTA_ED4: &str = "http://www.ecma-international.org/standards/ecma-323/csta/ed4";
pub const AVAYA_CSTA: &str = "http://www.avaya.com/csta";
