//! Session API endpoints.
//!
//! - POST `/login` - Check username/password and issue a session
//! - POST `/refresh` - Exchange the refresh token for a new pair (rotation)
//! - POST `/logout` - Clear the stored refresh token and both cookies

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    middleware,
    response::{AppendHeaders, IntoResponse},
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use super::error::{ApiError, ResultExt};
use crate::auth::{
    ACCESS_COOKIE_NAME, Auth, AuthRejection, REFRESH_COOKIE_NAME, clear_session_cookies,
    get_cookie, require_session, session_cookie,
};
use crate::config::CookieFlags;
use crate::db::Database;
use crate::impl_has_auth_backend;
use crate::jwt::unix_now;
use crate::password::verify_password;
use crate::rate_limit::{RateLimitConfig, rate_limit_login, rate_limit_refresh};
use crate::session::{SessionError, SessionPair};
use crate::AppSessions;

#[derive(Clone)]
pub struct SessionsState {
    pub db: Database,
    pub sessions: Arc<AppSessions>,
    pub cookie_flags: CookieFlags,
    pub rate_limit_config: Arc<RateLimitConfig>,
}

impl_has_auth_backend!(SessionsState);

pub fn router(state: SessionsState) -> Router {
    let login_router = Router::new()
        .route("/login", post(login))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit_config.clone(),
            rate_limit_login,
        ));

    let refresh_router = Router::new()
        .route("/refresh", post(refresh))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit_config.clone(),
            rate_limit_refresh,
        ));

    let logout_router = Router::new()
        .route("/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session::<SessionsState>,
        ))
        .with_state(state);

    Router::new()
        .merge(login_router)
        .merge(refresh_router)
        .merge(logout_router)
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct UserInfo {
    id: String,
    username: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    user: UserInfo,
    access_token: String,
    refresh_token: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    refresh_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    refresh_token: String,
}

/// Set-Cookie headers for a freshly issued pair.
fn pair_cookies(pair: &SessionPair, flags: CookieFlags) -> AppendHeaders<[(axum::http::HeaderName, String); 2]> {
    AppendHeaders([
        (
            SET_COOKIE,
            session_cookie(ACCESS_COOKIE_NAME, &pair.access.token, pair.access.ttl, flags),
        ),
        (
            SET_COOKIE,
            session_cookie(REFRESH_COOKIE_NAME, &pair.refresh.token, pair.refresh.ttl, flags),
        ),
    ])
}

/// Credential failures on refresh also drop the client's cookies; server
/// faults leave them alone since the stored token is still valid.
fn refresh_rejection(reason: SessionError, flags: CookieFlags) -> AuthRejection {
    if reason.is_server_fault() {
        AuthRejection::new(reason)
    } else {
        AuthRejection::new(reason).clearing_cookies(flags)
    }
}

async fn login(
    State(state): State<SessionsState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    let user = state
        .db
        .users()
        .get_by_username(username)
        .await
        .db_err("Failed to look up user")?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let password = payload.password;
    let hash = user.password_hash.clone();
    let password_ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| {
            error!("Password verification task failed: {}", e);
            ApiError::internal("Failed to verify credentials")
        })?;

    if !password_ok {
        info!(username = %user.username, "Login failed");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let pair = state
        .sessions
        .issue_session(&user.uuid, unix_now())
        .await
        .map_err(|e| {
            error!(principal = %user.uuid, error = %e, "Failed to issue session");
            ApiError::internal("Failed to issue session")
        })?;

    Ok((
        StatusCode::OK,
        pair_cookies(&pair, state.cookie_flags),
        Json(LoginResponse {
            user: UserInfo {
                id: user.uuid,
                username: user.username,
            },
            access_token: pair.access.token,
            refresh_token: pair.refresh.token,
        }),
    ))
}

/// Rotate the refresh token. Reads it from the `refreshToken` cookie, or
/// from a JSON body `{"refreshToken": "..."}` when no cookie is sent.
async fn refresh(
    State(state): State<SessionsState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AuthRejection> {
    let flags = state.cookie_flags;

    let presented = get_cookie(&headers, REFRESH_COOKIE_NAME)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| {
            serde_json::from_slice::<RefreshRequest>(&body)
                .unwrap_or_default()
                .refresh_token
                .filter(|t| !t.is_empty())
        });

    let Some(token) = presented else {
        return Err(refresh_rejection(SessionError::NoCredential, flags));
    };

    let rotated = state
        .sessions
        .verify_and_rotate_refresh(&token, unix_now())
        .await
        .map_err(|e| refresh_rejection(e, flags))?;

    let pair = rotated.pair;
    Ok((
        StatusCode::OK,
        pair_cookies(&pair, flags),
        Json(RefreshResponse {
            access_token: pair.access.token,
            refresh_token: pair.refresh.token,
        }),
    ))
}

/// Logout - clear the stored refresh token and both cookies.
async fn logout(
    State(state): State<SessionsState>,
    Auth(principal): Auth,
) -> Result<impl IntoResponse, AuthRejection> {
    state.sessions.end_session(&principal.principal_id).await?;

    let [clear_access, clear_refresh] = clear_session_cookies(state.cookie_flags);

    Ok((
        StatusCode::OK,
        AppendHeaders([(SET_COOKIE, clear_access), (SET_COOKIE, clear_refresh)]),
        Json(serde_json::json!({ "success": true })),
    ))
}
