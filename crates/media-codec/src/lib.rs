//! G.711 decode and WAV recording shared by the active RTP recorder pool
//! and the passive SIP/RTP capture pipeline.

pub mod error;
pub mod g711;
pub mod wav;

pub use error::{MediaError, Result};
pub use g711::{decode_alaw, decode_mulaw, PayloadType};
pub use wav::{MonoWavWriter, MultichannelRecorder};
