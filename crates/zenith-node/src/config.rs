//! Node configuration loading and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use zenith_core::LedgerConfig;

/// Full configuration for the Zenith node.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ZenithConfig {
    /// API server settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Channel ledger parameters.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Block production on the local chain.
    #[serde(default)]
    pub chain: ChainConfig,

    /// Balances minted when the data directory is first initialized.
    #[serde(default)]
    pub genesis: GenesisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API listen address.
    #[serde(default = "default_api_addr")]
    pub listen_addr: String,
    /// API port.
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the data directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Milliseconds between blocks. `0` disables the ticker; height then only
    /// moves through the mine endpoint.
    #[serde(default = "default_block_interval_ms")]
    pub block_interval_ms: u64,
    /// Whether `POST /api/v1/chain/mine` is served.
    #[serde(default = "default_true")]
    pub allow_mine: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisConfig {
    #[serde(default = "default_genesis_accounts")]
    pub accounts: Vec<GenesisAccount>,
}

/// A pre-funded account. TOML integers are 64-bit, so genesis balances are
/// `u64` and widened to the ledger's amount type on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub principal: String,
    pub balance: u64,
}

// Default value functions
fn default_api_addr() -> String {
    "127.0.0.1".into()
}
fn default_api_port() -> u16 {
    9001
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_block_interval_ms() -> u64 {
    10_000
}
fn default_true() -> bool {
    true
}
fn default_genesis_accounts() -> Vec<GenesisAccount> {
    ["deployer", "wallet_1", "wallet_2", "wallet_3"]
        .into_iter()
        .map(|principal| GenesisAccount {
            principal: principal.into(),
            balance: 100_000_000_000_000,
        })
        .collect()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_api_addr(),
            port: default_api_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            block_interval_ms: default_block_interval_ms(),
            allow_mine: true,
        }
    }
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            accounts: default_genesis_accounts(),
        }
    }
}

impl ZenithConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: ZenithConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// `listen_addr:port` for the HTTP API.
    pub fn api_addr(&self) -> String {
        format!("{}:{}", self.api.listen_addr, self.api.port)
    }
}
