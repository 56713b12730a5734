//! Saved user settings

use axum::Json;
use axum::extract::State;

use crate::api::error::ApiResult;
use crate::api::state::ApiState;
use crate::api::types::UserSettingsResponse;

/// GET /api/v1/usersettings
pub async fn list_user_settings(State(state): State<ApiState>) -> ApiResult<Json<UserSettingsResponse>> {
    let users = state.settings.all().await?;

    Ok(Json(UserSettingsResponse {
        total: users.len(),
        users,
    }))
}
