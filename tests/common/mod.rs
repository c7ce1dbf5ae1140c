use std::fs;
use std::path::PathBuf;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fluxnova::api::HttpBackend;
use fluxnova::config::ApiConfig;

/// API key every test client sends
#[allow(dead_code)]
pub const API_KEY: &str = "test-api-key";

/// Bearer token every authenticated test client sends
#[allow(dead_code)]
pub const TOKEN: &str = "test-token";

/// 1x1 transparent PNG
#[allow(dead_code)]
pub const PNG_PIXEL: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Backend pointed at the mock server, without a token
#[allow(dead_code)]
pub fn anonymous_backend(server: &MockServer) -> HttpBackend {
    let config = ApiConfig {
        base_url: server.uri(),
        api_key: API_KEY.to_string(),
        request_timeout_seconds: 5,
    };
    HttpBackend::new(&config).expect("valid api config")
}

/// Backend pointed at the mock server, carrying [`TOKEN`]
#[allow(dead_code)]
pub fn authed_backend(server: &MockServer) -> HttpBackend {
    anonymous_backend(server).with_token(TOKEN)
}

/// Wrap `data` in the backend's response envelope
#[allow(dead_code)]
pub fn envelope(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": data }))
}

/// Mount `GET /snap` and `GET /user` with the given bodies
#[allow(dead_code)]
pub async fn mount_feed(server: &MockServer, snaps: Value, users: Value) {
    Mock::given(method("GET"))
        .and(path("/snap"))
        .respond_with(envelope(snaps))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(envelope(users))
        .mount(server)
        .await;
}

/// Requests the server received for `method_name` on `path_str`
#[allow(dead_code)]
pub async fn count_requests(server: &MockServer, method_name: &str, path_str: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.to_string() == method_name && r.url.path() == path_str)
        .count()
}
