//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use kycdao_types::{Address, GovernanceParams};

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a governance node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so
/// an empty file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Address holding `ADMIN_ROLE` when a fresh state is bootstrapped.
    #[serde(default = "default_genesis_admin")]
    pub genesis_admin: Address,

    /// Addresses granted `MINTER_ROLE` at bootstrap.
    #[serde(default)]
    pub minters: Vec<Address>,

    /// Addresses granted `KYC_ROLE` at bootstrap.
    #[serde(default)]
    pub kyc_officers: Vec<Address>,

    /// State is loaded from here on start (if the file exists) and saved
    /// back on [`crate::GovernanceNode::save_snapshot`].
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Initial governance parameters. Ignored when a snapshot is loaded,
    /// since parameters are governable and live in the snapshot.
    #[serde(default)]
    pub params: GovernanceParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_genesis_admin() -> Address {
    Address::from_low_u64(1)
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Reject parameter values the engine would refuse.
    pub fn validate(&self) -> Result<(), NodeError> {
        self.params
            .validate()
            .map_err(|e| NodeError::Config(format!("params: {e}")))
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            genesis_admin: default_genesis_admin(),
            minters: Vec::new(),
            kyc_officers: Vec::new(),
            snapshot_path: None,
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            params: GovernanceParams::default(),
        }
    }
}
