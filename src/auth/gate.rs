//! The authentication gate: a middleware stage in front of protected routes.
//!
//! Each request starts `Unauthenticated` and ends either `Authenticated`
//! (principal attached to the request extensions, pipeline continues) or
//! `Rejected` (pipeline stops with a 401). Handlers behind the gate never
//! run for a rejected request.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::bearer::extract_bearer;
use super::errors::AuthRejection;
use super::state::HasAuthBackend;
use crate::jwt::unix_now;
use crate::session::{SessionError, SessionManager};
use crate::store::{CredentialStore, PrincipalStore};

/// Principal resolved from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal {
    pub principal_id: String,
}

/// Per-request gate state.
#[derive(Debug)]
pub enum GateState {
    Unauthenticated,
    Authenticated(AuthenticatedPrincipal),
    Rejected(SessionError),
}

impl GateState {
    /// Run the gate on a request's headers. Terminal states are returned as-is.
    pub fn advance<C, P>(self, headers: &HeaderMap, sessions: &SessionManager<C, P>, now: u64) -> Self
    where
        C: CredentialStore,
        P: PrincipalStore,
    {
        match self {
            GateState::Unauthenticated => {
                let Some(token) = extract_bearer(headers) else {
                    return GateState::Rejected(SessionError::NoCredential);
                };
                match sessions.verify_access(token, now) {
                    Ok(principal_id) => {
                        GateState::Authenticated(AuthenticatedPrincipal { principal_id })
                    }
                    Err(reason) => GateState::Rejected(reason),
                }
            }
            terminal => terminal,
        }
    }
}

/// Middleware guarding every route it wraps.
pub async fn require_session<S>(State(state): State<S>, mut request: Request, next: Next) -> Response
where
    S: HasAuthBackend + Clone + Send + Sync + 'static,
{
    let outcome = GateState::Unauthenticated.advance(request.headers(), state.sessions(), unix_now());

    match outcome {
        GateState::Authenticated(principal) => {
            debug!(principal = %principal.principal_id, "Request authenticated");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        GateState::Rejected(reason) => AuthRejection::new(reason).into_response(),
        GateState::Unauthenticated => {
            AuthRejection::new(SessionError::NoCredential).into_response()
        }
    }
}

/// Extractor for the principal attached by [`require_session`].
///
/// Rejects when used on a route that is not behind the gate.
pub struct Auth(pub AuthenticatedPrincipal);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedPrincipal>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| AuthRejection::new(SessionError::NoCredential))
    }
}
