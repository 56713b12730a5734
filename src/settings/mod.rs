//! Per-user settings
//!
//! The only persisted setting is whether a user opted out of automatic
//! (passive) host checks. Stores are async and fallible; failures are
//! surfaced to the command that triggered them instead of aborting the
//! process.
//!
//! ## Backends
//!
//! - **SQLite** (default): survives restarts
//! - **In-Memory**: for tests and throwaway setups

pub mod error;
pub mod memory;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SettingsConfig;

pub use error::{SettingsError, SettingsResult};
pub use memory::MemorySettingsStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub id: String,
    pub checks_disabled: bool,
}

impl UserSettings {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            checks_disabled: false,
        }
    }
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Settings for `user`, or the defaults if none were saved yet
    async fn get(&self, user: &str) -> SettingsResult<UserSettings>;

    /// Insert or update
    async fn set(&self, settings: &UserSettings) -> SettingsResult<()>;

    /// Every saved entry, sorted by user id
    async fn all(&self) -> SettingsResult<Vec<UserSettings>>;
}

/// Open the store selected in the configuration
pub async fn open(config: &SettingsConfig) -> SettingsResult<Arc<dyn SettingsStore>> {
    match config {
        SettingsConfig::Memory => Ok(Arc::new(MemorySettingsStore::new())),
        #[cfg(feature = "storage-sqlite")]
        SettingsConfig::Sqlite { path } => Ok(Arc::new(sqlite::SqliteSettingsStore::new(path).await?)),
        #[cfg(not(feature = "storage-sqlite"))]
        SettingsConfig::Sqlite { .. } => Err(SettingsError::InvalidConfig(
            "sqlite backend requires the storage-sqlite feature".to_string(),
        )),
    }
}
