//! Read-only HTTP view of the registry
//!
//! ## Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/checks` - Snapshot of all monitored hosts
//! - `GET /api/v1/usersettings` - Saved per-user settings
//!
//! All routes sit behind [`require_bearer`] when a token is configured.

#[cfg(feature = "api")]
pub mod error;
#[cfg(feature = "api")]
pub mod routes;
#[cfg(feature = "api")]
pub mod state;
#[cfg(feature = "api")]
pub mod types;

#[cfg(feature = "api")]
pub use error::{ApiError, ApiResult};
#[cfg(feature = "api")]
pub use state::ApiState;
#[cfg(feature = "api")]
pub use types::{ChecksResponse, HealthResponse, UserSettingsResponse};

#[cfg(feature = "api")]
use axum::{
    Router,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    routing::get,
};
use std::net::SocketAddr;
#[cfg(feature = "api")]
use std::sync::Arc;
#[cfg(feature = "api")]
use tracing::{debug, info};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8080")
    pub bind_addr: SocketAddr,

    /// Optional authentication token
    pub auth_token: Option<String>,

    /// Enable CORS for browser dashboards
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            auth_token: None,
            enable_cors: true,
        }
    }
}

/// Build the API router
#[cfg(feature = "api")]
pub fn router(config: &ApiConfig, state: ApiState) -> Router {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    let mut app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/checks", get(routes::checks::list_checks))
        .route(
            "/api/v1/usersettings",
            get(routes::usersettings::list_user_settings),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    if let Some(token) = &config.auth_token {
        let token: Arc<str> = Arc::from(token.as_str());
        app = app.layer(axum::middleware::from_fn_with_state(
            token,
            require_bearer,
        ));
    }

    app
}

/// Only let through requests carrying `Authorization: Bearer <token>`
/// with the configured token
#[cfg(feature = "api")]
pub async fn require_bearer(
    State(expected): State<Arc<str>>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let Some(header) = request.headers().get(AUTHORIZATION) else {
        debug!("snapshot request to {} without a token", request.uri());
        return Err(ApiError::Unauthorized("missing bearer token"));
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized("malformed Authorization header"))?;

    if token != &*expected {
        debug!("snapshot request to {} with a foreign token", request.uri());
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(request).await)
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
#[cfg(feature = "api")]
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(&config, state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
