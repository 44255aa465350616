//! A fixed pool of pre-bound UDP listeners that decode G.711 RTP streams
//! into WAV recordings on demand.

pub mod error;
pub mod pool;

pub use error::{RecorderError, Result};
pub use pool::{RecorderHandle, RecorderPool};
