//! Broker configuration.
//!
//! Loaded from JSON; every field has a default so `{}` is a valid config.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::{FileStore, KeyValueStore, KeyringStore, MemoryStore};

pub const DEFAULT_NAMESPACE: &str = "eip6963";
pub const DEFAULT_SETTLE_WINDOW_MS: u64 = 500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("namespace must not be empty")]
    EmptyNamespace,
    #[error("namespace must not contain ':' (got {0:?})")]
    InvalidNamespace(String),
}

/// Where the default wallet identifier is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageConfig {
    Memory,
    File {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },
    Keyring {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        service: Option<String>,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::File { path: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Event namespace, the part before `:` in bus event names.
    pub namespace: String,
    /// How long [`crate::DiscoveryBroker::discover`] waits for announcements.
    pub settle_window_ms: u64,
    pub storage: StorageConfig,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            settle_window_ms: DEFAULT_SETTLE_WINDOW_MS,
            storage: StorageConfig::default(),
        }
    }
}

impl BrokerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("invalid broker config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.namespace.is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        if self.namespace.contains(':') {
            return Err(ConfigError::InvalidNamespace(self.namespace.clone()));
        }
        Ok(())
    }

    pub fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_window_ms)
    }

    /// Build the configured store backend.
    pub fn open_store(&self) -> Arc<dyn KeyValueStore> {
        match &self.storage {
            StorageConfig::Memory => Arc::new(MemoryStore::new()),
            StorageConfig::File { path: Some(path) } => Arc::new(FileStore::new(path)),
            StorageConfig::File { path: None } => Arc::new(FileStore::open_default()),
            StorageConfig::Keyring { service: Some(s) } => Arc::new(KeyringStore::new(s)),
            StorageConfig::Keyring { service: None } => Arc::new(KeyringStore::default()),
        }
    }
}
