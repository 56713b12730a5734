//! Integration tests for the HTTP snapshot endpoint
//!
//! These tests verify that:
//! - the registry snapshot is served as JSON
//! - saved user settings are listed
//! - the bearer token middleware rejects bad requests

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::http::StatusCode;
use hostwatch::{
    api::{ApiConfig, ApiState, spawn_api_server},
    config::MonitorSettings,
    registry::Trigger,
    settings::{MemorySettingsStore, SettingsStore, UserSettings},
    tracker::{CheckRequest, Tracker},
};
use serde_json::Value;

use crate::helpers::{RecordingNotifier, ScriptedProber, origin, tracker};

const TOKEN: &str = "test-token";

async fn spawn_test_api() -> (SocketAddr, Tracker, Arc<MemorySettingsStore>) {
    let tracker = tracker(
        ScriptedProber::always(true),
        RecordingNotifier::new(),
        MonitorSettings::default(),
    );
    let settings = Arc::new(MemorySettingsStore::new());

    let state = ApiState::new(tracker.registry().clone(), settings.clone());
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        auth_token: Some(TOKEN.to_string()),
        enable_cors: true,
    };

    let addr = spawn_api_server(config, state).await.unwrap();
    (addr, tracker, settings)
}

async fn get(addr: SocketAddr, path: &str, token: Option<&str>) -> reqwest::Response {
    let client = reqwest::Client::new();
    let mut request = client.get(format!("http://{addr}{path}"));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    request.send().await.unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (addr, _tracker, _settings) = spawn_test_api().await;

    let response = get(addr, "/api/v1/health", Some(TOKEN)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["active_checks"], 0);
}

#[tokio::test]
async fn test_checks_endpoint_lists_snapshot() {
    let (addr, tracker, _settings) = spawn_test_api().await;

    tracker
        .track(CheckRequest {
            key: "db.example.com".to_string(),
            address: "10.4.4.4".parse::<IpAddr>().unwrap(),
            origin: origin("alice"),
            trigger: Trigger::Command,
            source: "via !check in ops".to_string(),
        })
        .await
        .unwrap();

    let body: Value = get(addr, "/api/v1/checks", Some(TOKEN))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["total"], 1);
    let check = &body["checks"][0];
    assert_eq!(check["key"], "db.example.com");
    assert_eq!(check["address"], "10.4.4.4");
    assert_eq!(check["source"], "via !check in ops");
    assert_eq!(check["origin"]["user"], "alice");

    tracker.registry().glob_remove("", "").await.unwrap();
}

#[tokio::test]
async fn test_usersettings_endpoint() {
    let (addr, _tracker, settings) = spawn_test_api().await;

    let mut alice = UserSettings::new("alice");
    alice.checks_disabled = true;
    settings.set(&alice).await.unwrap();

    let body: Value = get(addr, "/api/v1/usersettings", Some(TOKEN))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["total"], 1);
    assert_eq!(body["users"][0]["id"], "alice");
    assert_eq!(body["users"][0]["checks_disabled"], true);
}

#[tokio::test]
async fn test_auth_is_enforced() {
    let (addr, _tracker, _settings) = spawn_test_api().await;

    let missing = get(addr, "/api/v1/checks", None).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = get(addr, "/api/v1/checks", Some("nope")).await;
    assert_eq!(wrong.status(), StatusCode::FORBIDDEN);
}
