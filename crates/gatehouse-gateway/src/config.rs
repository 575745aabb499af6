// config.rs — Gateway configuration.
//
// GateConfig carries the process-wide knobs: the pending-operation TTL,
// the background sweep interval, and the remote tracker connection
// settings. Loaded from a TOML file or built from defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use gatehouse_tracker::HttpTrackerConfig;

use crate::error::GatewayError;

/// Remote tracker connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSettings {
    /// API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Repository in `owner/name` form.
    #[serde(default)]
    pub repo: String,

    /// Name of the environment variable holding the bearer token.
    /// The token itself never appears in config files.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            repo: String::new(),
            token_env: default_token_env(),
        }
    }
}

impl From<TrackerSettings> for HttpTrackerConfig {
    fn from(settings: TrackerSettings) -> Self {
        Self {
            api_base: settings.api_base,
            repo: settings.repo,
            token_env: settings.token_env,
        }
    }
}

/// Configuration for the gate server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Negotiation window for pending operations, in seconds.
    /// Process-wide and fixed: individual operations cannot override it.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Interval between background sweeps of expired operations.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Remote tracker connection settings.
    #[serde(default)]
    pub tracker: TrackerSettings,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            tracker: TrackerSettings::default(),
        }
    }
}

impl GateConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_token_env() -> String {
    "GATEHOUSE_TOKEN".to_string()
}

fn default_ttl_secs() -> u64 {
    gatehouse_ops::registry::DEFAULT_TTL_SECS
}

fn default_sweep_interval_secs() -> u64 {
    60
}
