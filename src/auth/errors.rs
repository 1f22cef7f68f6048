//! Authentication rejection responses.
//!
//! All credential failures produce the same status and body so a client
//! cannot tell an expired token from a forged or replayed one.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, error};

use super::cookie::clear_session_cookies;
use crate::config::CookieFlags;
use crate::session::SessionError;

/// Body returned for every rejected credential.
pub const UNAUTHENTICATED_MESSAGE: &str = "Unauthorized";

/// Body returned when the session backend itself failed.
pub const SERVER_FAULT_MESSAGE: &str = "Internal server error";

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

/// A rejected authentication attempt.
#[derive(Debug)]
pub struct AuthRejection {
    pub(super) reason: SessionError,
    clear_cookies: Option<CookieFlags>,
}

impl AuthRejection {
    pub fn new(reason: SessionError) -> Self {
        Self {
            reason,
            clear_cookies: None,
        }
    }

    /// Also remove both session cookies on the client.
    pub fn clearing_cookies(mut self, flags: CookieFlags) -> Self {
        self.clear_cookies = Some(flags);
        self
    }

    pub fn reason(&self) -> &SessionError {
        &self.reason
    }

    fn status_code(&self) -> StatusCode {
        if self.reason.is_server_fault() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::UNAUTHORIZED
        }
    }

    fn message(&self) -> &'static str {
        if self.reason.is_server_fault() {
            SERVER_FAULT_MESSAGE
        } else {
            UNAUTHENTICATED_MESSAGE
        }
    }
}

impl From<SessionError> for AuthRejection {
    fn from(reason: SessionError) -> Self {
        Self::new(reason)
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        if self.reason.is_server_fault() {
            error!(reason = self.reason.audit_label(), error = %self.reason, "Session backend failure");
        } else {
            debug!(reason = self.reason.audit_label(), "Authentication rejected");
        }

        let mut response = (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response();

        if let Some(flags) = self.clear_cookies {
            let headers = response.headers_mut();
            for cookie in clear_session_cookies(flags) {
                if let Ok(value) = HeaderValue::from_str(&cookie) {
                    headers.append(header::SET_COOKIE, value);
                }
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn test_credential_failures_are_indistinguishable() {
        let reasons = [
            SessionError::Malformed,
            SessionError::BadSignature,
            SessionError::Expired,
            SessionError::PrincipalNotFound,
            SessionError::TokenReuseDetected,
            SessionError::NoCredential,
        ];

        for reason in reasons {
            let rejection = AuthRejection::new(reason);
            assert_eq!(rejection.status_code(), StatusCode::UNAUTHORIZED);
            assert_eq!(rejection.message(), UNAUTHENTICATED_MESSAGE);
        }
    }

    #[test]
    fn test_server_faults_map_to_500() {
        let issuance = AuthRejection::new(SessionError::IssuanceFailed("disk full".into()));
        assert_eq!(issuance.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(issuance.message(), SERVER_FAULT_MESSAGE);

        let store = AuthRejection::new(SessionError::StoreUnavailable(StoreError::Unavailable(
            "down".into(),
        )));
        assert_eq!(store.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_clearing_cookies_appends_set_cookie() {
        let response = AuthRejection::new(SessionError::Expired)
            .clearing_cookies(CookieFlags::default())
            .into_response();

        let cookies: Vec<_> = response.headers().get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies.len(), 2);
    }
}
