//! Application configuration.
//!
//! Rigscan has no command-line flags. Everything runs on defaults unless a
//! JSON config file exists at the standard location.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{RigscanError, RigscanResult};

/// Shortest poll interval the loop accepts.
const MIN_POLL_INTERVAL_MS: u64 = 10;

/// Global application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Delay between two poll/cycle/render iterations.
    pub poll_interval_ms: u64,

    /// What to do with a device whose prober cannot be constructed.
    pub probe_policy: ProbePolicy,

    /// Which hardware registry to enumerate devices from.
    pub backend: BackendConfig,

    /// Optional JSON file the current status snapshot is exported to.
    pub status_file: Option<PathBuf>,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Handling of devices that fail capability detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProbePolicy {
    /// Treat any failing device as fatal for the whole run.
    #[default]
    Abort,
    /// Log the failing device and keep monitoring the rest.
    Skip,
}

/// Hardware registry selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// The vendor capture driver.
    #[default]
    Driver,
    /// A simulated rig described by a JSON file.
    Simulated { rig: PathBuf },
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "warn", "debug", "rigscan_prober=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path. Logs go to stderr when unset.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            probe_policy: ProbePolicy::default(),
            backend: BackendConfig::default(),
            status_file: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load_from(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                Self::default()
            }
        }
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> RigscanResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| RigscanError::config(format!("{}: {e}", path.display())))
    }

    /// Poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    config_path_from(
        std::env::var_os("XDG_CONFIG_HOME"),
        std::env::var_os("HOME"),
    )
}

/// Resolve the config path. Empty variables count as unset.
fn config_path_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> PathBuf {
    let non_empty = |value: Option<OsString>| value.filter(|v| !v.is_empty()).map(PathBuf::from);
    let base = non_empty(xdg_config_home).unwrap_or_else(|| {
        non_empty(home)
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".config")
    });
    base.join("rigscan").join("config.json")
}
