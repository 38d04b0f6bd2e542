//! Daemon configuration: FROST group parameters, VDF defaults, the
//! Unix-socket path, and log settings.
//!
//! Loaded the way the teacher's `ochra_daemon::config::DaemonConfig`
//! loads: read `$TXGUARD_DATA_DIR/config.toml` if it exists, otherwise
//! fall back to built-in defaults. A missing config file is not an
//! error — a guardian node should start with sane defaults and let an
//! operator override what it needs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::DaemonError;

fn default_threshold() -> u16 {
    7
}

fn default_total_participants() -> u16 {
    10
}

fn default_vdf_iterations() -> u64 {
    1_000_000
}

fn default_security_parameter_bits() -> u32 {
    128
}

fn default_socket_path() -> PathBuf {
    default_data_dir().join("txguard.sock")
}

fn default_dev_mode() -> bool {
    false
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_job_max_age_secs() -> u64 {
    3_600
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// FROST group parameters for this guardian node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrostConfig {
    /// Signing threshold `t`.
    #[serde(default = "default_threshold")]
    pub threshold: u16,
    /// Total guardian count `n`.
    #[serde(default = "default_total_participants")]
    pub total_participants: u16,
}

impl Default for FrostConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            total_participants: default_total_participants(),
        }
    }
}

/// Defaults applied to newly created VDF jobs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VdfConfig {
    /// Default iteration count `T` for new jobs.
    #[serde(default = "default_vdf_iterations")]
    pub iterations: u64,
    /// Security parameter `κ`, in bits.
    #[serde(default = "default_security_parameter_bits")]
    pub security_parameter_bits: u32,
    /// Whether `get_mock_proof` is reachable over RPC.
    #[serde(default = "default_dev_mode")]
    pub dev_mode: bool,
    /// How often the job manager's terminal-job sweeper runs.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Minimum age before a terminal job is swept.
    #[serde(default = "default_job_max_age_secs")]
    pub job_max_age_secs: u64,
}

impl Default for VdfConfig {
    fn default() -> Self {
        Self {
            iterations: default_vdf_iterations(),
            security_parameter_bits: default_security_parameter_bits(),
            dev_mode: default_dev_mode(),
            sweep_interval_secs: default_sweep_interval_secs(),
            job_max_age_secs: default_job_max_age_secs(),
        }
    }
}

/// Top-level daemon configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// FROST group parameters.
    #[serde(default)]
    pub frost: FrostConfig,
    /// VDF job defaults.
    #[serde(default)]
    pub vdf: VdfConfig,
    /// Path to the Unix domain socket the JSON-RPC façade listens on.
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
    /// `tracing_subscriber` env-filter directive, e.g. `"info"` or `"debug"`.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            frost: FrostConfig::default(),
            vdf: VdfConfig::default(),
            socket_path: default_socket_path(),
            log_filter: default_log_filter(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from `$TXGUARD_DATA_DIR/config.toml` if it
    /// exists, otherwise return [`DaemonConfig::default`].
    pub fn load() -> Result<Self, DaemonError> {
        let path = config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        let config = toml::from_str(&raw)
            .map_err(|e| DaemonError::Config(format!("invalid config at {}: {e}", path.display())))?;
        Ok(config)
    }

    /// Serialize this configuration to TOML.
    pub fn to_toml(&self) -> Result<String, DaemonError> {
        toml::to_string_pretty(self)
            .map_err(|e| DaemonError::Config(format!("failed to serialize config: {e}")))
    }
}

/// `$TXGUARD_DATA_DIR/config.toml`, or the platform default data
/// directory if the env var is unset.
pub fn config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

/// `$TXGUARD_DATA_DIR`, or `~/.txguard` if unset.
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TXGUARD_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs_fallback().join(".txguard")
}

fn dirs_fallback() -> PathBuf {
    std::env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_sane_frost_params() {
        let config = DaemonConfig::default();
        assert!(config.frost.threshold <= config.frost.total_participants);
    }

    #[test]
    fn test_toml_round_trip_preserves_values() {
        let mut config = DaemonConfig::default();
        config.frost.threshold = 3;
        config.frost.total_participants = 5;
        config.vdf.dev_mode = true;

        let toml_text = config.to_toml().expect("a default config always serializes");
        let reloaded: DaemonConfig =
            toml::from_str(&toml_text).expect("just-serialized config always parses");

        assert_eq!(reloaded.frost.threshold, 3);
        assert_eq!(reloaded.frost.total_participants, 5);
        assert!(reloaded.vdf.dev_mode);
    }

    #[test]
    fn test_partial_toml_fills_in_defaults() {
        let partial = "[frost]\nthreshold = 2\n";
        let config: DaemonConfig =
            toml::from_str(partial).expect("a partial table fills remaining fields from defaults");
        assert_eq!(config.frost.threshold, 2);
        assert_eq!(config.frost.total_participants, default_total_participants());
        assert_eq!(config.vdf.iterations, default_vdf_iterations());
    }
}
