//! CSTA/ACSE framed message codec and type registry.
//!
//! This crate owns the wire format only: framing ([`codec`]), the XML tree
//! representation messages are built from ([`xmltree`]), the message
//! catalogue and its decode registry ([`messages`], [`registry`]), and the
//! handful of value types shared across message bodies ([`types`]).
//! Connection/session state machines live in `cra-csta-session`.

pub mod codec;
pub mod error;
pub mod messages;
pub mod namespaces;
pub mod registry;
pub mod types;
pub mod xmltree;

pub use codec::{decode_frame, encode_frame, read_frame, DecodedFrame};
pub use error::{CstaError, Result};
pub use messages::Message;
pub use xmltree::XmlElement;
