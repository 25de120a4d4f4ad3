// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 示例应用在进程内走完整条分发流水线

use std::fs;
use std::sync::Arc;

use webframe::app;
use webframe::config::{Config, MaintenanceConfig};
use webframe::db::{Database, TcpConnector};
use webframe::dispatcher::Dispatcher;
use webframe::param::HttpRequestMethod;
use webframe::request::Request;
use webframe::response::Response;
use webframe::session::MemorySessionStore;

const CONFIG: &str = r#"
[maintenance]
flag_file = "tests/no-such-maintenance.flag"

[security]
csrf_exempt = ["/webhook/*"]

[security.bearer]
enabled = true
tokens = ["secret-token-123", "another-token"]
exempt = ["/", "/hello/*", "/form", "/submit", "/api/status", "/api/db"]

[security.cors]
enabled = true
allowed_origins = ["https://app.example.com"]
"#;

fn build(config: Config) -> Dispatcher {
    let database = Arc::new(Database::new(config.database().cloned(), TcpConnector));
    let router = app::routes(database).unwrap();
    Dispatcher::new(config, router, Arc::new(MemorySessionStore::new())).unwrap()
}

fn dispatcher() -> Dispatcher {
    build(Config::from_toml_str(CONFIG).unwrap())
}

fn get(d: &Dispatcher, path: &str) -> Response {
    d.handle(Request::new(HttpRequestMethod::Get, path), 0)
}

/// 取出 `Set-Cookie` 中的 `name=value` 部分
fn session_cookie(response: &Response) -> String {
    let cookie = response.header("Set-Cookie").unwrap();
    cookie.split(';').next().unwrap().to_string()
}

/// 从表单页面中取出隐藏字段里的 CSRF 令牌
fn form_token(response: &Response) -> String {
    let body = response.body_str();
    let start = body.find(r#"name="csrf_token" value=""#).unwrap() + r#"name="csrf_token" value=""#.len();
    body[start..start + 64].to_string()
}

#[test]
fn test_hello_route_with_param() {
    let response = get(&dispatcher(), "/hello/World");
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.body_str(), "Hello, World!");
    assert_eq!(response.header("X-Content-Type-Options"), Some("nosniff"));
}

#[test]
fn test_status_json() {
    let response = get(&dispatcher(), "/api/status");
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.content_type(), Some("application/json"));
    let value: serde_json::Value = serde_json::from_str(&response.body_str()).unwrap();
    assert_eq!(value["status"], "ok");
    assert_eq!(value["framework"], "webframe");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_form_submit_roundtrip() {
    let d = dispatcher();
    let form = get(&d, "/form");
    assert_eq!(form.status_code(), 200);
    let cookie = session_cookie(&form);
    let token = form_token(&form);

    let response = d.handle(
        Request::new(HttpRequestMethod::Post, "/submit")
            .with_header("Cookie", &cookie)
            .with_form(&[("csrf_token", token.as_str()), ("message", "<hi>")]),
        1,
    );
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.body_str(), "<p>已收到：&lt;hi&gt;</p>");
}

#[test]
fn test_csrf_token_stable_across_requests() {
    let d = dispatcher();
    let first = get(&d, "/form");
    let cookie = session_cookie(&first);

    let second = d.handle(
        Request::new(HttpRequestMethod::Get, "/form").with_header("Cookie", &cookie),
        1,
    );
    assert_eq!(form_token(&first), form_token(&second));
    assert!(second.header("Set-Cookie").is_none());
}

#[test]
fn test_submit_without_token_is_forbidden() {
    let d = dispatcher();
    let cookie = session_cookie(&get(&d, "/form"));

    let response = d.handle(
        Request::new(HttpRequestMethod::Post, "/submit")
            .with_header("Cookie", &cookie)
            .with_form(&[("message", "hello")]),
        2,
    );
    assert_eq!(response.status_code(), 403);
    assert_eq!(response.body_str(), r#"{"error":"CSRF token validation failed"}"#);
}

#[test]
fn test_token_in_header_accepted() {
    let d = dispatcher();
    let form = get(&d, "/form");
    let response = d.handle(
        Request::new(HttpRequestMethod::Post, "/submit")
            .with_header("Cookie", &session_cookie(&form))
            .with_header("X-CSRF-Token", &form_token(&form)),
        3,
    );
    assert_eq!(response.status_code(), 200);
}

#[test]
fn test_bearer_request_skips_csrf() {
    let response = dispatcher().handle(
        Request::new(HttpRequestMethod::Post, "/api/echo")
            .with_header("Authorization", "Bearer another-token")
            .with_header("Content-Type", "application/json")
            .with_body(r#"{"message":"ping"}"#),
        4,
    );
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.body_str(), r#"{"echo":"ping"}"#);
}

#[test]
fn test_private_requires_bearer() {
    let d = dispatcher();
    let denied = get(&d, "/api/private");
    assert_eq!(denied.status_code(), 401);
    assert_eq!(denied.header("WWW-Authenticate"), Some("Bearer"));

    let allowed = d.handle(
        Request::new(HttpRequestMethod::Get, "/api/private")
            .with_header("Authorization", "bearer secret-token-123"),
        5,
    );
    assert_eq!(allowed.status_code(), 200);
    assert_eq!(allowed.body_str(), r#"{"authenticated":true}"#);
}

#[test]
fn test_unconfigured_database_is_500() {
    let response = get(&dispatcher(), "/api/db");
    assert_eq!(response.status_code(), 500);
    assert_eq!(response.header("X-Frame-Options"), Some("SAMEORIGIN"));
}

#[test]
fn test_database_failure_location_in_debug_page() {
    let config = Config::from_toml_str(&format!("{}\n[app]\ndebug = true\n", CONFIG)).unwrap();
    let body = get(&build(config), "/api/db").body_str();
    assert!(body.contains("Database unavailable"));
    assert!(body.contains("位置：路由 GET /api/db"));
    assert!(!body.contains("位置：unknown"));
}

#[test]
fn test_preflight_short_circuits() {
    let response = dispatcher().handle(
        Request::new(HttpRequestMethod::Options, "/api/echo")
            .with_header("Origin", "https://app.example.com"),
        6,
    );
    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.header("Access-Control-Allow-Origin"),
        Some("https://app.example.com")
    );
    assert_eq!(response.header("Access-Control-Max-Age"), Some("86400"));
}

#[test]
fn test_unknown_path_is_404() {
    let response = get(&dispatcher(), "/no/such/page");
    assert_eq!(response.status_code(), 404);
    assert!(response.body_str().contains("404"));
}

#[test]
fn test_maintenance_overrides_everything() {
    let tmp = tempfile::tempdir().unwrap();
    let flag = tmp.path().join("maintenance.flag");
    fs::write(&flag, "").unwrap();
    let config = Config::from_toml_str(CONFIG)
        .unwrap()
        .with_maintenance(MaintenanceConfig {
            flag_file: flag,
            page_file: None,
        });
    let d = build(config);

    for path in ["/", "/hello/World", "/api/private", "/missing"] {
        let response = get(&d, path);
        assert_eq!(response.status_code(), 503);
        assert!(response.header("X-Frame-Options").is_none());
    }
    let post = d.handle(Request::new(HttpRequestMethod::Post, "/submit"), 7);
    assert_eq!(post.status_code(), 503);
}
