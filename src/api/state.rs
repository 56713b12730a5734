//! Shared state passed to all API handlers

use std::sync::Arc;

use crate::registry::Registry;
use crate::settings::SettingsStore;

#[derive(Clone)]
pub struct ApiState {
    /// Registry of monitored hosts
    pub registry: Registry,

    /// Per-user settings store
    pub settings: Arc<dyn SettingsStore>,
}

impl ApiState {
    pub fn new(registry: Registry, settings: Arc<dyn SettingsStore>) -> Self {
        Self { registry, settings }
    }
}
