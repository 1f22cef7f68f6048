use tracing::{debug, error, info, warn};

use super::{RotatedSession, SessionError, SessionManager};
use crate::jwt::TokenKind;
use crate::store::{CredentialStore, PrincipalStore};

impl<C, P> SessionManager<C, P>
where
    C: CredentialStore,
    P: PrincipalStore,
{
    /// Verify an access token and return its principal id. Stateless.
    pub fn verify_access(&self, token: &str, now: u64) -> Result<String, SessionError> {
        self.codec
            .verify(TokenKind::Access, token, now)
            .map_err(SessionError::from)
    }

    /// Verify a refresh token against the stored value and rotate it.
    ///
    /// The presented token must be the exact value currently stored for the
    /// principal. On success a new pair is issued and stored, which makes the
    /// presented token unusable from then on.
    pub async fn verify_and_rotate_refresh(
        &self,
        token: &str,
        now: u64,
    ) -> Result<RotatedSession, SessionError> {
        let principal_id = self
            .codec
            .verify(TokenKind::Refresh, token, now)
            .map_err(|e| {
                let e = SessionError::from(e);
                debug!(reason = e.audit_label(), "Refresh token rejected");
                e
            })?;

        let principal = self
            .principals
            .find_by_id(&principal_id)
            .await
            .map_err(|e| {
                error!(principal = %principal_id, error = %e, "Failed to look up principal");
                SessionError::StoreUnavailable(e)
            })?;

        if principal.is_none() {
            debug!(principal = %principal_id, "Refresh for unknown principal");
            return Err(SessionError::PrincipalNotFound);
        }

        let _guard = self.locks.acquire(&principal_id).await;

        let stored = self.credentials.get(&principal_id).await.map_err(|e| {
            error!(principal = %principal_id, error = %e, "Failed to load refresh token");
            SessionError::StoreUnavailable(e)
        })?;

        if stored.as_deref() != Some(token) {
            warn!(
                principal = %principal_id,
                stored = stored.is_some(),
                "Refresh token reuse detected"
            );
            if self.revoke_on_reuse && stored.is_some() {
                match self.credentials.clear(&principal_id).await {
                    Ok(()) => warn!(principal = %principal_id, "Session revoked after reuse"),
                    Err(e) => {
                        error!(principal = %principal_id, error = %e, "Failed to revoke session")
                    }
                }
            }
            return Err(SessionError::TokenReuseDetected);
        }

        let pair = self.issue_locked(&principal_id, now).await?;
        info!(principal = %principal_id, "Session rotated");

        Ok(RotatedSession { principal_id, pair })
    }

    /// Clear the principal's stored refresh token (logout).
    pub async fn end_session(&self, principal_id: &str) -> Result<(), SessionError> {
        let _guard = self.locks.acquire(principal_id).await;
        self.credentials.clear(principal_id).await.map_err(|e| {
            error!(principal = %principal_id, error = %e, "Failed to clear refresh token");
            SessionError::StoreUnavailable(e)
        })?;
        info!(principal = %principal_id, "Session ended");
        Ok(())
    }
}
