#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use dealer_session::config::{extract_config, ConfigV1};
use dealer_session::models::SessionIdentity;
use dealer_session::routes::create_router;
use dealer_session::startup::build_state;
use dealer_session::state::AppState;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use serde_json::Value;

/// Config used by the integration tests. `{base_url}` and `{storage_path}`
/// are filled in per test.
const TEST_CONFIG: &str = r#"
version: "1.0.0"
logging:
  level: "debug"
  format: "json"
backend:
  name: "dealership test api"
  base_url: "{base_url}"
  session_path: /auth/check_session.php
  profile_path: /user/get_profile.php
storage:
  enabled: true
  type: file
  path: "{storage_path}"
routes:
  login: /login
  public_home: /
  role_homes:
    admin: /admin/dashboard
    staff: /staff/dashboard
bind_address: 127.0.0.1:0
"#;

pub fn load_test_config(base_url: &str, storage_path: &str) -> ConfigV1 {
    let yaml = TEST_CONFIG
        .replace("{base_url}", base_url)
        .replace("{storage_path}", storage_path);
    extract_config(Figment::new().merge(Yaml::string(&yaml)))
        .expect("Failed to parse test config YAML")
}

/// A storage file path unique to `name` within this test process.
pub fn storage_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dealer-session-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join(format!("{}.json", name));
    let _ = std::fs::remove_file(&path);
    path
}

pub fn read_storage(path: &PathBuf) -> Value {
    match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).expect("storage file is JSON"),
        Err(_) => Value::Object(Default::default()),
    }
}

pub fn build_app(config: ConfigV1) -> (Router, AppState) {
    let state = build_state(Arc::new(config)).expect("state should build");
    (create_router(state.clone()), state)
}

/// Waits until the mounted store has finished its verification sequence.
pub async fn settled(state: &AppState) -> SessionIdentity {
    let mut rx = state.session.subscribe();
    let identity = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| !s.is_initializing),
    )
    .await
    .expect("session should settle")
    .expect("store alive")
    .clone();
    identity
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

pub fn send_json(method: Method, path: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub fn empty(method: Method, path: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
