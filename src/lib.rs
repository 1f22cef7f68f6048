pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod db;
pub mod jwt;
pub mod password;
pub mod rate_limit;
pub mod session;
pub mod store;

use api::create_api_router;
use axum::Router;
use cli::IpExtractor;
use config::SessionConfig;
use db::Database;
use rate_limit::RateLimitConfig;
use session::SessionManager;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Session manager backed by the SQLite database for both stores.
pub type AppSessions = SessionManager<Database, Database>;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Token secrets, lifetimes and cookie flags
    pub session: SessionConfig,
    /// Login attempts allowed per minute per IP
    pub login_rate_per_minute: u32,
    /// Refresh requests allowed per minute per IP
    pub refresh_rate_per_minute: u32,
    /// Trusted proxy header for client IPs; None uses the socket address
    pub ip_extractor: Option<IpExtractor>,
}

/// Build the session manager for a server configuration.
pub fn create_sessions(config: &ServerConfig) -> Arc<AppSessions> {
    Arc::new(SessionManager::from_config(
        &config.session,
        config.db.clone(),
        config.db.clone(),
    ))
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let sessions = create_sessions(config);
    let rate_limit_config = Arc::new(
        RateLimitConfig::new(config.login_rate_per_minute, config.refresh_rate_per_minute)
            .with_ip_extractor(config.ip_extractor),
    );

    let api_router = create_api_router(
        config.db.clone(),
        sessions,
        config.session.cookie_flags,
        rate_limit_config,
    );

    Router::new().nest("/api", api_router)
}

/// Run cleanup tasks and spawn background scheduler.
/// Call this before starting the server.
pub async fn init_cleanup(db: &Database) {
    cleanup::run_cleanup(db).await;
    cleanup::spawn_cleanup_scheduler(db.clone());
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Call `init_cleanup` before this to run cleanup on startup.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

