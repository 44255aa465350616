//! Connection management and application session lifecycle layered on top
//! of `cra-csta-proto`'s wire codec.

pub mod connection;
pub mod error;
pub mod session;

pub use connection::{Connection, ConnectionState, HandleFn, INVOKE_ID_WRAP};
pub use error::{Result, SessionError};
pub use session::ApplicationSession;
