//! Typed, layered configuration for the recording agent.
//!
//! Layered the way configuration typically is in this stack: built-in
//! defaults, then an optional file, then environment variables.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PbxType {
    Osbiz,
    AvayaAes,
    Passive,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RtpSettings {
    pub recorder_count: usize,
    pub recorder_address: String,
}

impl Default for RtpSettings {
    fn default() -> Self {
        Self {
            recorder_count: 16,
            recorder_address: "0.0.0.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PassiveMonitoringSettings {
    pub interface_name: String,
    pub mtu_size: u32,
}

impl Default for PassiveMonitoringSettings {
    fn default() -> Self {
        Self {
            interface_name: "eth0".to_string(),
            mtu_size: 1500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub pbx_type: PbxType,
    pub pbx_address: String,
    pub pbx_username: String,
    pub pbx_password: String,
    pub pbx_switch_name: Option<String>,
    pub application_id: String,

    #[serde(default = "default_recordings_dir")]
    pub recordings_dir: String,

    #[serde(default)]
    pub rtp: RtpSettings,
    #[serde(default)]
    pub passive_monitoring: PassiveMonitoringSettings,
    #[serde(default)]
    pub log: LogSettings,
}

fn default_recordings_dir() -> String {
    "./recordings".to_string()
}

impl AgentConfig {
    /// Loads configuration layered as built-in defaults, an optional file
    /// at `config_path` (YAML or TOML, inferred from extension), then
    /// environment variables prefixed `CRA_` (nested keys separated by
    /// `__`, e.g. `CRA_RTP__RECORDER_COUNT`).
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("pbx_type", "osbiz")?
            .set_default("pbx_address", "192.168.1.30:8800")?
            .set_default("pbx_username", "AMHOST")?
            .set_default("pbx_password", "77777")?
            .set_default("application_id", "CRA")?
            .set_default("recordings_dir", "./recordings")?
            .set_default("rtp.recorder_count", 16)?
            .set_default("rtp.recorder_address", "0.0.0.0")?
            .set_default("passive_monitoring.interface_name", "eth0")?
            .set_default("passive_monitoring.mtu_size", 1500)?
            .set_default("log.level", "info")?
            .set_default("log.json", false)?;

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CRA")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_viper_defaults() {
        let config = AgentConfig::load(None).unwrap();
        assert_eq!(config.pbx_type, PbxType::Osbiz);
        assert_eq!(config.pbx_address, "192.168.1.30:8800");
        assert_eq!(config.pbx_username, "AMHOST");
        assert_eq!(config.pbx_password, "77777");
        assert_eq!(config.application_id, "CRA");
        assert_eq!(config.rtp.recorder_count, 16);
    }

    #[test]
    fn env_override_changes_resolved_value() {
        std::env::set_var("CRA_PBX_USERNAME", "override-user");
        let config = AgentConfig::load(None).unwrap();
        std::env::remove_var("CRA_PBX_USERNAME");
        assert_eq!(config.pbx_username, "override-user");
    }
}
