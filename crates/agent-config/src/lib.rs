//! Configuration, device directory and upload-queue plumbing shared by
//! every PBX adapter and the passive capture pipeline.

pub mod device;
pub mod error;
pub mod settings;
pub mod upload;

pub use device::{load_devices, ConfiguredDevice, DeviceStore, InMemoryDeviceStore};
pub use error::{ConfigError, Result};
pub use settings::{AgentConfig, LogSettings, PassiveMonitoringSettings, PbxType, RtpSettings};
pub use upload::{ChannelUploadQueue, UploadQueue, UploadRecord, UploadRecordType, UploadStatus};
