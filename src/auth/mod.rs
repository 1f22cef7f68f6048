//! Request authentication for API routes.
//!
//! Protected routes sit behind [`require_session`], which reads the access
//! token from the `accessToken` cookie or an `Authorization: Bearer` header
//! and verifies it statelessly. Refresh tokens are never accepted here; they
//! are only exchanged at the refresh endpoint.

mod bearer;
mod cookie;
mod errors;
mod gate;
mod ip;
mod state;

pub use bearer::{CREDENTIAL_SOURCES, CredentialSource, extract_bearer, read_credential};
pub use cookie::{
    ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, clear_cookie, clear_session_cookies, get_cookie,
    session_cookie,
};
pub use errors::{AuthRejection, SERVER_FAULT_MESSAGE, UNAUTHENTICATED_MESSAGE};
pub use gate::{Auth, AuthenticatedPrincipal, GateState, require_session};
pub use ip::extract_client_ip;
pub use state::HasAuthBackend;
