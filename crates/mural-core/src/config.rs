//! Configuration system for Mural.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $MURAL_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/mural/config.toml
//!   3. ~/.config/mural/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cost::CostModel;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MuralConfig {
    pub gas: GasConfig,
    pub cost: CostModel,
    pub planner: PlannerConfig,
    pub ledger: LedgerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GasConfig {
    /// Hard per-submission ceiling used for chunk planning.
    pub ceiling: u64,
    /// Gas limit used when the ledger's estimate call fails.
    pub fallback_gas_limit: u64,
    /// Padding added on top of a successful ledger estimate, in percent.
    pub estimate_margin_percent: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannerStrategy {
    /// One chunk size from the list prefix, applied to the whole list.
    #[default]
    Uniform,
    /// Re-plan the remaining list after every chunk.
    Adaptive,
}

impl std::str::FromStr for PlannerStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uniform" => Ok(PlannerStrategy::Uniform),
            "adaptive" => Ok(PlannerStrategy::Adaptive),
            other => Err(format!("unknown planner strategy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub strategy: PlannerStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Base URL of the ledger gateway.
    pub endpoint: String,
    /// Drawing contract address, hex.
    pub contract: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON snapshot per in-progress queue.
    pub queue_dir: PathBuf,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            ceiling: 3_000_000,
            fallback_gas_limit: 3_000_000,
            estimate_margin_percent: 20,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8545/mural".to_string(),
            contract: format!("0x{}", "0".repeat(40)),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            queue_dir: data_dir().join("queues"),
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("mural")
}

pub fn data_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".local").join("share"))
        .join("mural")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl MuralConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            Self::from_toml(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            MuralConfig::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("MURAL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&MuralConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply MURAL_* overrides. `lookup` is `std::env::var` outside of tests.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MURAL_GAS__CEILING") {
            if let Ok(n) = v.parse() {
                self.gas.ceiling = n;
            }
        }
        if let Some(v) = lookup("MURAL_GAS__FALLBACK_GAS_LIMIT") {
            if let Ok(n) = v.parse() {
                self.gas.fallback_gas_limit = n;
            }
        }
        if let Some(v) = lookup("MURAL_LEDGER__ENDPOINT") {
            self.ledger.endpoint = v;
        }
        if let Some(v) = lookup("MURAL_LEDGER__CONTRACT") {
            self.ledger.contract = v;
        }
        if let Some(v) = lookup("MURAL_PLANNER__STRATEGY") {
            if let Ok(s) = v.parse() {
                self.planner.strategy = s;
            }
        }
        if let Some(v) = lookup("MURAL_STORAGE__QUEUE_DIR") {
            self.storage.queue_dir = PathBuf::from(v);
        }
    }
}
