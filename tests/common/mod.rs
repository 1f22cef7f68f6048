#![allow(dead_code)]

use axum::body::Body;
use sessionward::cli::IpExtractor;
use sessionward::config::{CookieFlags, SessionConfig};
use sessionward::db::Database;
use sessionward::password::hash_password;
use sessionward::session::SessionManager;
use sessionward::{AppSessions, ServerConfig, create_app};

pub const ACCESS_SECRET: &[u8] = b"test-access-secret-0123456789abcdef";
pub const REFRESH_SECRET: &[u8] = b"test-refresh-secret-0123456789abcdef";

pub struct TestApp {
    pub app: axum::Router,
    pub db: Database,
    /// Manager sharing the app's secrets and database, for minting tokens
    /// without going through login.
    pub sessions: AppSessions,
}

pub fn test_session_config() -> SessionConfig {
    let mut config = SessionConfig::new(ACCESS_SECRET.to_vec(), REFRESH_SECRET.to_vec());
    config.cookie_flags = CookieFlags {
        http_only: true,
        secure: false,
    };
    config
}

/// Create a test app backed by an in-memory database.
pub async fn create_test_app() -> TestApp {
    create_test_app_with(test_session_config(), 1000, 1000).await
}

pub async fn create_test_app_with(
    session: SessionConfig,
    login_rate_per_minute: u32,
    refresh_rate_per_minute: u32,
) -> TestApp {
    create_test_app_behind_proxy(session, login_rate_per_minute, refresh_rate_per_minute, None).await
}

pub async fn create_test_app_behind_proxy(
    session: SessionConfig,
    login_rate_per_minute: u32,
    refresh_rate_per_minute: u32,
    ip_extractor: Option<IpExtractor>,
) -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        db: db.clone(),
        session,
        login_rate_per_minute,
        refresh_rate_per_minute,
        ip_extractor,
    };
    let app = create_app(&config);
    let sessions = SessionManager::from_config(&config.session, db.clone(), db.clone());
    TestApp { app, db, sessions }
}

/// Create a user with the given password and return its uuid.
pub async fn create_user(db: &Database, username: &str, password: &str) -> String {
    let uuid = uuid::Uuid::new_v4().to_string();
    let hash = hash_password(password).unwrap();
    db.users().create(&uuid, username, &hash).await.unwrap();
    uuid
}

pub fn access_cookie(token: &str) -> String {
    format!("accessToken={}", token)
}

pub fn refresh_cookie(token: &str) -> String {
    format!("refreshToken={}", token)
}

/// Extract Set-Cookie headers from response
pub fn extract_set_cookies(response: &axum::http::Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}

/// Value of a cookie set by the response, unless it is being cleared.
pub fn set_cookie_value(cookies: &[String], name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    cookies
        .iter()
        .filter(|c| c.starts_with(&prefix) && !c.contains("Max-Age=0"))
        .find_map(|c| c[prefix.len()..].split(';').next().map(str::to_string))
}

/// Check if cookies contain a token being cleared (Max-Age=0)
pub fn has_cleared_cookie(cookies: &[String], name: &str) -> bool {
    let prefix = format!("{}=", name);
    cookies
        .iter()
        .any(|c| c.starts_with(&prefix) && c.contains("Max-Age=0"))
}

pub async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
