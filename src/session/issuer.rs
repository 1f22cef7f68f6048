use tracing::{error, info};

use super::{SessionError, SessionManager, SessionPair};
use crate::jwt::TokenKind;
use crate::store::{CredentialStore, PrincipalStore};

impl<C, P> SessionManager<C, P>
where
    C: CredentialStore,
    P: PrincipalStore,
{
    /// Mint a new session for an already authenticated principal and store
    /// its refresh token, replacing any previous one.
    ///
    /// No tokens are returned unless the store write succeeded.
    pub async fn issue_session(
        &self,
        principal_id: &str,
        now: u64,
    ) -> Result<SessionPair, SessionError> {
        let _guard = self.locks.acquire(principal_id).await;
        let pair = self.issue_locked(principal_id, now).await?;
        info!(principal = %principal_id, "Session issued");
        Ok(pair)
    }

    /// Issue and persist a pair. Caller must hold the principal's lock.
    pub(super) async fn issue_locked(
        &self,
        principal_id: &str,
        now: u64,
    ) -> Result<SessionPair, SessionError> {
        let access = self.codec.issue(TokenKind::Access, principal_id, now)?;
        let refresh = self.codec.issue(TokenKind::Refresh, principal_id, now)?;

        self.credentials
            .set(principal_id, &refresh.token, refresh.expires_at)
            .await
            .map_err(|e| {
                error!(principal = %principal_id, error = %e, "Failed to store refresh token");
                SessionError::IssuanceFailed(e.to_string())
            })?;

        Ok(SessionPair { access, refresh })
    }
}
