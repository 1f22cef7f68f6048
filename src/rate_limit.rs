//! Rate limiting for session endpoints.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down password
//! guessing and refresh-token probing.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{num::NonZeroU32, sync::Arc};
use tracing::{debug, warn};

use crate::auth::extract_client_ip;
use crate::cli::IpExtractor;

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Default login attempts per minute per IP.
pub const DEFAULT_LOGIN_PER_MINUTE: u32 = 10;

/// Default refresh requests per minute per IP.
pub const DEFAULT_REFRESH_PER_MINUTE: u32 = 30;

/// Key shared by requests whose client address cannot be determined.
const UNKNOWN_CLIENT: &str = "unknown";

/// Rate limiting configuration for session endpoints.
#[derive(Clone)]
pub struct RateLimitConfig {
    pub login: Arc<IpLimiter>,
    pub refresh: Arc<IpLimiter>,
    /// Trusted proxy header; None keys on the socket address
    pub ip_extractor: Option<IpExtractor>,
}

impl RateLimitConfig {
    pub fn new(login_per_minute: u32, refresh_per_minute: u32) -> Self {
        Self {
            login: Arc::new(RateLimiter::keyed(per_minute(login_per_minute))),
            refresh: Arc::new(RateLimiter::keyed(per_minute(refresh_per_minute))),
            ip_extractor: None,
        }
    }

    pub fn with_ip_extractor(mut self, ip_extractor: Option<IpExtractor>) -> Self {
        self.ip_extractor = ip_extractor;
        self
    }

    /// Limiter key for a request. Requests whose address cannot be determined
    /// share one bucket.
    pub fn client_key(&self, request: &Request) -> String {
        extract_client_ip(request, self.ip_extractor.as_ref()).unwrap_or_else(|reason| {
            debug!(reason, "Client IP unavailable, using shared rate limit bucket");
            UNKNOWN_CLIENT.to_string()
        })
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LOGIN_PER_MINUTE, DEFAULT_REFRESH_PER_MINUTE)
    }
}

fn per_minute(n: u32) -> Quota {
    Quota::per_minute(NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN))
}

fn too_many_requests(message: &'static str) -> Response {
    (StatusCode::TOO_MANY_REQUESTS, message).into_response()
}

/// Middleware for rate limiting login attempts.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = config.client_key(&request);
    match config.login.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            warn!(ip = %ip, "Login rate limit exceeded");
            too_many_requests("Too many login attempts. Please wait before trying again.")
        }
    }
}

/// Middleware for rate limiting refresh requests.
pub async fn rate_limit_refresh(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = config.client_key(&request);
    match config.refresh.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            warn!(ip = %ip, "Refresh rate limit exceeded");
            too_many_requests("Too many requests. Please try again later.")
        }
    }
}
