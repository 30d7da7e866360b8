//! Durable key-value slot for the user's default wallet.
//!
//! Backends:
//! - **memory**: process-local map, lost on exit
//! - **file**: JSON file under the platform config directory
//! - **keyring**: OS keychain (macOS Keychain, Secret Service, Credential Manager)

pub mod file;
pub mod keyring;

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

pub use self::file::FileStore;
pub use self::keyring::KeyringStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("keychain error: {0}")]
    Keyring(#[from] ::keyring::Error),
    #[error("store file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A string-to-string slot store. Absence is `Ok(None)`, never an error.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrites any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Succeeds when the key is already absent.
    fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory store. Does not survive restarts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}
