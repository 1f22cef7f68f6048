//! User API endpoints.
//!
//! - GET `/me` - The principal behind the access token
//! - POST `/change-password` - Replace the password and end the session

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    middleware,
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use super::error::{ApiError, ResultExt};
use crate::AppSessions;
use crate::auth::{Auth, AuthRejection, clear_session_cookies, require_session};
use crate::config::CookieFlags;
use crate::db::Database;
use crate::impl_has_auth_backend;
use crate::password::{PASSWORD_RULE_MESSAGE, hash_password, is_strong_password, verify_password};
use crate::session::SessionError;

#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
    pub sessions: Arc<AppSessions>,
    pub cookie_flags: CookieFlags,
}

impl_has_auth_backend!(UsersState);

pub fn router(state: UsersState) -> Router {
    Router::new()
        .route("/me", get(current_user))
        .route("/change-password", post(change_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session::<UsersState>,
        ))
        .with_state(state)
}

#[derive(Serialize)]
struct CurrentUserResponse {
    id: String,
    username: String,
}

/// The principal behind the presented access token.
async fn current_user(
    State(state): State<UsersState>,
    Auth(principal): Auth,
) -> Result<impl IntoResponse, AuthRejection> {
    let user = state
        .db
        .users()
        .get_by_uuid(&principal.principal_id)
        .await
        .map_err(|e| SessionError::StoreUnavailable(e.into()))?
        .ok_or(SessionError::PrincipalNotFound)?;

    Ok(Json(CurrentUserResponse {
        id: user.uuid,
        username: user.username,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    #[serde(default)]
    old_password: String,
    #[serde(default)]
    new_password: String,
}

/// Replace the caller's password. The stored refresh token is cleared and
/// both cookies are dropped, so every client has to log in again.
async fn change_password(
    State(state): State<UsersState>,
    Auth(principal): Auth,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.old_password.is_empty() || payload.new_password.is_empty() {
        return Err(ApiError::bad_request(
            "Old password and new password are required",
        ));
    }

    let user = state
        .db
        .users()
        .get_by_uuid(&principal.principal_id)
        .await
        .db_err("Failed to look up user")?
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    let old_password = payload.old_password;
    let hash = user.password_hash;
    let old_ok = tokio::task::spawn_blocking(move || verify_password(&old_password, &hash))
        .await
        .map_err(|e| {
            error!("Password verification task failed: {}", e);
            ApiError::internal("Failed to verify credentials")
        })?;

    if !old_ok {
        info!(username = %user.username, "Password change rejected");
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    if !is_strong_password(&payload.new_password) {
        return Err(ApiError::bad_request(PASSWORD_RULE_MESSAGE));
    }

    let new_password = payload.new_password;
    let new_hash = tokio::task::spawn_blocking(move || hash_password(&new_password))
        .await
        .map_err(|e| {
            error!("Password hashing task failed: {}", e);
            ApiError::internal("Failed to hash password")
        })?
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            ApiError::internal("Failed to hash password")
        })?;

    let updated = state
        .db
        .users()
        .update_password(&user.uuid, &new_hash)
        .await
        .db_err("Failed to update password")?;
    if !updated {
        return Err(ApiError::unauthorized("Unauthorized"));
    }

    state.sessions.end_session(&user.uuid).await.map_err(|e| {
        error!(principal = %user.uuid, error = %e, "Failed to end session after password change");
        ApiError::internal("Failed to end session")
    })?;

    info!(username = %user.username, "Password changed");

    let [clear_access, clear_refresh] = clear_session_cookies(state.cookie_flags);

    Ok((
        StatusCode::OK,
        AppendHeaders([(SET_COOKIE, clear_access), (SET_COOKIE, clear_refresh)]),
        Json(serde_json::json!({ "success": true })),
    ))
}
