mod error;
mod sessions;
mod users;

use axum::Router;
use std::sync::Arc;

use crate::AppSessions;
use crate::config::CookieFlags;
use crate::db::Database;
use crate::rate_limit::RateLimitConfig;

pub use error::{ApiError, ResultExt};
pub use sessions::SessionsState;
pub use users::UsersState;

/// Create the API router.
pub fn create_api_router(
    db: Database,
    sessions: Arc<AppSessions>,
    cookie_flags: CookieFlags,
    rate_limit_config: Arc<RateLimitConfig>,
) -> Router {
    let sessions_state = sessions::SessionsState {
        db: db.clone(),
        sessions: sessions.clone(),
        cookie_flags,
        rate_limit_config,
    };

    let users_state = users::UsersState {
        db,
        sessions,
        cookie_flags,
    };

    Router::new()
        .nest("/sessions", sessions::router(sessions_state))
        .nest("/users", users::router(users_state))
}
