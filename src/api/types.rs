//! API response types

use serde::Serialize;

use crate::registry::HostSnapshot;
use crate::settings::UserSettings;

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub active_checks: usize,
}

/// Active checks
#[derive(Debug, Clone, Serialize)]
pub struct ChecksResponse {
    pub checks: Vec<HostSnapshot>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSettingsResponse {
    pub users: Vec<UserSettings>,
    pub total: usize,
}
