//! Authentication state trait and macro.

use crate::session::SessionManager;
use crate::store::{CredentialStore, PrincipalStore};

/// Trait for state types that can run the authentication gate.
pub trait HasAuthBackend {
    type Credentials: CredentialStore;
    type Principals: PrincipalStore;

    fn sessions(&self) -> &SessionManager<Self::Credentials, Self::Principals>;
}

/// Macro to implement `HasAuthBackend` for state structs with the standard fields.
///
/// The struct must have a `sessions: Arc<AppSessions>` field.
///
/// # Example
/// ```ignore
/// use crate::impl_has_auth_backend;
///
/// #[derive(Clone)]
/// pub struct MyState {
///     pub sessions: Arc<AppSessions>,
///     // ... other fields
/// }
///
/// impl_has_auth_backend!(MyState);
/// ```
#[macro_export]
macro_rules! impl_has_auth_backend {
    ($state_type:ty) => {
        impl $crate::auth::HasAuthBackend for $state_type {
            type Credentials = $crate::db::Database;
            type Principals = $crate::db::Database;

            fn sessions(&self) -> &$crate::AppSessions {
                &self.sessions
            }
        }
    };
}
