//! Device directory: which extensions the agent is configured to record.
//!
//! Grounded in `models/device.go`'s `Device` struct and the OSBiz/Avaya
//! adapters' need to resolve an extension to a `DeviceId` and cross
//! reference ID before starting a recording.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Deserialize;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct ConfiguredDevice {
    pub extension: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub device_id: String,
    #[serde(default = "default_record_calls")]
    pub record_calls: bool,
    #[serde(default)]
    pub cross_reference_id: Option<u32>,
    #[serde(default)]
    pub last_recorded_call: Option<DateTime<Utc>>,
    /// Security code for force-registering a virtual recording station on
    /// active-recording vendors (Avaya AES). Unused by passive-monitoring
    /// and OSBiz, which never register a station.
    #[serde(default)]
    pub station_security_code: Option<String>,
}

fn default_record_calls() -> bool {
    true
}

impl ConfiguredDevice {
    pub fn new(extension: impl Into<String>, description: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            device_id: extension.clone(),
            extension,
            description: description.into(),
            record_calls: true,
            cross_reference_id: None,
            station_security_code: None,
            last_recorded_call: None,
        }
    }
}

/// Read/write access to the set of devices the agent knows about.
///
/// Kept as a trait, mirroring the original's interface split between the
/// configured device list and the PBX adapters that consume it, so a
/// persistent-backed implementation can replace the in-memory one later
/// without touching callers.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn devices(&self) -> Vec<ConfiguredDevice>;

    async fn device(&self, extension: &str) -> Result<ConfiguredDevice>;

    /// Records the cross reference ID a PBX assigned to a monitor point,
    /// and the time recording last started, so a reconnect can report it.
    async fn record_started(&self, extension: &str, cross_reference_id: u32) -> Result<()>;
}

pub struct InMemoryDeviceStore {
    devices: RwLock<HashMap<String, ConfiguredDevice>>,
}

impl InMemoryDeviceStore {
    pub fn new(devices: impl IntoIterator<Item = ConfiguredDevice>) -> Self {
        let devices = devices
            .into_iter()
            .map(|d| (d.extension.clone(), d))
            .collect();
        Self {
            devices: RwLock::new(devices),
        }
    }
}

#[async_trait]
impl DeviceStore for InMemoryDeviceStore {
    async fn devices(&self) -> Vec<ConfiguredDevice> {
        self.devices.read().values().cloned().collect()
    }

    async fn device(&self, extension: &str) -> Result<ConfiguredDevice> {
        self.devices
            .read()
            .get(extension)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownDevice(extension.to_string()))
    }

    async fn record_started(&self, extension: &str, cross_reference_id: u32) -> Result<()> {
        let mut devices = self.devices.write();
        let device = devices
            .get_mut(extension)
            .ok_or_else(|| ConfigError::UnknownDevice(extension.to_string()))?;
        device.cross_reference_id = Some(cross_reference_id);
        device.last_recorded_call = Some(Utc::now());
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct DeviceFile {
    #[serde(default)]
    devices: Vec<ConfiguredDevice>,
}

/// Loads the configured device list from a YAML/TOML/JSON file (format
/// inferred from extension). Returns an empty list if `path` is `None` or
/// the file doesn't exist, since a fresh deployment has nothing recorded
/// yet and should still start up.
pub fn load_devices(path: Option<&str>) -> Result<Vec<ConfiguredDevice>> {
    let Some(path) = path else { return Ok(Vec::new()) };

    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .build()?;
    let file: DeviceFile = settings.try_deserialize()?;
    Ok(file.devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_extension_is_reported() {
        let store = InMemoryDeviceStore::new(vec![]);
        let err = store.device("9999").await.unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDevice(ext) if ext == "9999"));
    }

    #[tokio::test]
    async fn record_started_updates_cross_reference_id() {
        let store = InMemoryDeviceStore::new(vec![ConfiguredDevice::new("1001", "Lobby")]);
        store.record_started("1001", 42).await.unwrap();
        let device = store.device("1001").await.unwrap();
        assert_eq!(device.cross_reference_id, Some(42));
        assert!(device.last_recorded_call.is_some());
    }

    #[test]
    fn missing_device_file_yields_empty_list() {
        let devices = load_devices(Some("/nonexistent/devices")).unwrap();
        assert!(devices.is_empty());
    }

    #[test]
    fn no_path_yields_empty_list() {
        let devices = load_devices(None).unwrap();
        assert!(devices.is_empty());
    }

    #[test]
    fn loads_devices_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.yaml");
        std::fs::write(
            &path,
            "devices:\n  - extension: \"1001\"\n    description: Lobby\n  - extension: \"1002\"\n    record_calls: false\n",
        )
        .unwrap();

        let devices = load_devices(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].extension, "1001");
        assert!(devices[0].record_calls);
        assert!(!devices[1].record_calls);
    }
}
