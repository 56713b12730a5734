//! Active host checks

use axum::Json;
use axum::extract::State;
use tracing::debug;

use crate::api::state::ApiState;
use crate::api::types::ChecksResponse;

/// GET /api/v1/checks
///
/// Snapshot of every monitored host, sorted by key
pub async fn list_checks(State(state): State<ApiState>) -> Json<ChecksResponse> {
    let checks = state.registry.snapshot().await;
    debug!("listing {} checks", checks.len());

    Json(ChecksResponse {
        total: checks.len(),
        checks,
    })
}
