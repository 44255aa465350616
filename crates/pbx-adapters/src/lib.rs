//! Switching-function adapters: vendor-specific connect/login/monitor logic
//! behind one [`PbxAdapter`] trait the reconnect supervisor drives.

mod adapter;
mod avaya;
mod error;
mod monitor_point;
mod osbiz;

pub use adapter::{ConnectionState, PbxAdapter};
pub use avaya::AvayaAesAdapter;
pub use error::{AdapterError, Result};
pub use monitor_point::MonitorPoint;
pub use osbiz::OsbizAdapter;
