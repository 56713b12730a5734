//! In-memory settings store (no persistence)

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::error::SettingsResult;
use super::{SettingsStore, UserSettings};

#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    users: RwLock<HashMap<String, UserSettings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, user: &str) -> SettingsResult<UserSettings> {
        let users = self.users.read().await;
        Ok(users.get(user).cloned().unwrap_or_else(|| UserSettings::new(user)))
    }

    async fn set(&self, settings: &UserSettings) -> SettingsResult<()> {
        debug!("saving settings for {}", settings.id);
        self.users
            .write()
            .await
            .insert(settings.id.clone(), settings.clone());
        Ok(())
    }

    async fn all(&self) -> SettingsResult<Vec<UserSettings>> {
        let mut all: Vec<UserSettings> = self.users.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }
}
