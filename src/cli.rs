//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::config::{
    CookieFlags, DEFAULT_ACCESS_TOKEN_TTL, DEFAULT_REFRESH_TOKEN_TTL, SessionConfig,
};
use crate::db::Database;
use crate::password::{generate_password, hash_password};
use crate::rate_limit::{DEFAULT_LOGIN_PER_MINUTE, DEFAULT_REFRESH_PER_MINUTE};
use clap::Parser;
use std::net::IpAddr;
use tracing::{error, info};
use uuid::Uuid;

/// Environment variable holding the access token secret.
pub const ACCESS_SECRET_ENV: &str = "ACCESS_TOKEN_SECRET";

/// Environment variable holding the refresh token secret.
pub const REFRESH_SECRET_ENV: &str = "REFRESH_TOKEN_SECRET";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// Reverse-proxy header carrying the client address.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientIpHeader {
    /// `X-Forwarded-For`; the rightmost entry, appended by the proxy, is used
    XForwardFor,
    /// `X-Real-IP`
    XRealIp,
    /// `CF-Connecting-IP`
    CfConnectingIp,
}

/// Reads the client IP from a trusted proxy header.
#[derive(Clone, Copy, Debug)]
pub struct IpExtractor {
    pub header_name: &'static str,
    parse: fn(&str) -> Result<String, &'static str>,
}

impl IpExtractor {
    /// Parse the client IP out of the header value.
    pub fn extract(&self, header_value: &str) -> Result<String, &'static str> {
        (self.parse)(header_value)
    }
}

fn parse_single_ip(value: &str) -> Result<String, &'static str> {
    value
        .trim()
        .parse::<IpAddr>()
        .map(|ip| ip.to_string())
        .map_err(|_| "IP header is not a valid address")
}

fn parse_forwarded_for(value: &str) -> Result<String, &'static str> {
    let last = value
        .rsplit(',')
        .map(str::trim)
        .find(|hop| !hop.is_empty())
        .ok_or("IP header is empty")?;
    parse_single_ip(last)
}

impl From<ClientIpHeader> for IpExtractor {
    fn from(header: ClientIpHeader) -> Self {
        match header {
            ClientIpHeader::XForwardFor => IpExtractor {
                header_name: "x-forwarded-for",
                parse: parse_forwarded_for,
            },
            ClientIpHeader::XRealIp => IpExtractor {
                header_name: "x-real-ip",
                parse: parse_single_ip,
            },
            ClientIpHeader::CfConnectingIp => IpExtractor {
                header_name: "cf-connecting-ip",
                parse: parse_single_ip,
            },
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "sessionward",
    about = "Access/refresh token sessions with rotation and reuse detection"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000", env = "PORT")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "sessionward.db")]
    pub database: String,

    /// Access token lifetime in seconds
    #[arg(long, default_value_t = DEFAULT_ACCESS_TOKEN_TTL, env = "ACCESS_TOKEN_TTL")]
    pub access_token_ttl: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, default_value_t = DEFAULT_REFRESH_TOKEN_TTL, env = "REFRESH_TOKEN_TTL")]
    pub refresh_token_ttl: u64,

    /// Path to file containing the access token secret. Prefer ACCESS_TOKEN_SECRET env var
    #[arg(long)]
    pub access_token_secret_file: Option<String>,

    /// Path to file containing the refresh token secret. Prefer REFRESH_TOKEN_SECRET env var
    #[arg(long)]
    pub refresh_token_secret_file: Option<String>,

    /// Send cookies without the Secure flag (plain HTTP development only)
    #[arg(long)]
    pub insecure_cookies: bool,

    /// Clear a user's stored refresh token when a rotated-out token is replayed
    #[arg(long)]
    pub revoke_on_reuse: bool,

    /// Login attempts allowed per minute per client IP
    #[arg(long, default_value_t = DEFAULT_LOGIN_PER_MINUTE)]
    pub login_rate_per_minute: u32,

    /// Refresh requests allowed per minute per client IP
    #[arg(long, default_value_t = DEFAULT_REFRESH_PER_MINUTE)]
    pub refresh_rate_per_minute: u32,

    /// Take the client IP for rate limiting from this proxy header instead of the
    /// socket address. Only set this behind a reverse proxy that overwrites it
    #[arg(long, value_enum, env = "IP_HEADER")]
    pub ip_header: Option<ClientIpHeader>,

    /// Create a user with a random password on startup and print the password
    #[arg(long, value_name = "USERNAME")]
    pub create_user: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load a token secret from an environment variable or a file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_secret(env_var: &str, secret_file: Option<&str>) -> Option<Vec<u8>> {
    let secret = if let Ok(secret) = std::env::var(env_var) {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var(env_var) };
        secret
    } else if let Some(path) = secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read secret file");
                return None;
            }
        }
    } else {
        error!(
            env = %env_var,
            "Token secret is required. Set the environment variable (recommended) or pass a secret file"
        );
        return None;
    };

    Some(secret.into_bytes())
}

/// Build and validate the session configuration from arguments and secrets.
/// Returns None and logs an error if validation fails.
pub fn build_session_config(
    args: &Args,
    access_token_secret: Vec<u8>,
    refresh_token_secret: Vec<u8>,
) -> Option<SessionConfig> {
    let config = SessionConfig {
        access_token_secret,
        access_token_ttl: args.access_token_ttl,
        refresh_token_secret,
        refresh_token_ttl: args.refresh_token_ttl,
        cookie_flags: CookieFlags {
            http_only: true,
            secure: !args.insecure_cookies,
        },
        revoke_on_reuse: args.revoke_on_reuse,
    };

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid session configuration");
        return None;
    }

    Some(config)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(args: &Args, db: Database, session: SessionConfig) -> ServerConfig {
    ServerConfig {
        db,
        session,
        login_rate_per_minute: args.login_rate_per_minute,
        refresh_rate_per_minute: args.refresh_rate_per_minute,
        ip_extractor: args.ip_header.map(IpExtractor::from),
    }
}

/// Handle the --create-user flag: create the user and print its generated password.
/// Returns false if the user could not be created.
pub async fn handle_create_user(db: &Database, username: &str) -> bool {
    let username = username.trim();
    if username.is_empty() {
        error!("Username for --create-user cannot be empty");
        return false;
    }

    match db.users().get_by_username(username).await {
        Ok(Some(_)) => {
            error!(username = %username, "User already exists");
            return false;
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Failed to check for existing user");
            return false;
        }
    }

    let password = generate_password();
    let hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return false;
        }
    };

    let uuid = Uuid::new_v4().to_string();
    match db.users().create(&uuid, username, &hash).await {
        Ok(_) => {
            info!(username = %username, id = %uuid, "User created");
            println!();
            println!("User created: {}", username);
            println!("Password: {}", password);
            println!();
            true
        }
        Err(e) => {
            error!(error = %e, "Failed to create user");
            false
        }
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
