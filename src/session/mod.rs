//! Session issuance, verification and rotation.
//!
//! A session is an (access, refresh) token pair. The refresh token is stored
//! in the credential store and is single-use: rotating it overwrites the
//! stored value, so the presented token stops working immediately.

mod error;
mod issuer;
mod locks;
mod verifier;

use std::sync::Arc;

pub use error::SessionError;
pub use locks::PrincipalLocks;

use crate::config::SessionConfig;
use crate::jwt::{IssuedToken, TokenCodec};
use crate::store::{CredentialStore, PrincipalStore};

/// A freshly issued token pair.
#[derive(Debug, Clone)]
pub struct SessionPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Result of a successful refresh-token rotation.
#[derive(Debug, Clone)]
pub struct RotatedSession {
    pub principal_id: String,
    pub pair: SessionPair,
}

pub struct SessionManager<C, P> {
    codec: Arc<TokenCodec>,
    credentials: C,
    principals: P,
    locks: PrincipalLocks,
    revoke_on_reuse: bool,
}

impl<C, P> SessionManager<C, P>
where
    C: CredentialStore,
    P: PrincipalStore,
{
    pub fn new(codec: Arc<TokenCodec>, credentials: C, principals: P) -> Self {
        Self {
            codec,
            credentials,
            principals,
            locks: PrincipalLocks::new(),
            revoke_on_reuse: false,
        }
    }

    pub fn from_config(config: &SessionConfig, credentials: C, principals: P) -> Self {
        Self::new(
            Arc::new(TokenCodec::from_config(config)),
            credentials,
            principals,
        )
        .with_revoke_on_reuse(config.revoke_on_reuse)
    }

    /// Also clear the stored refresh token when reuse is detected.
    pub fn with_revoke_on_reuse(mut self, revoke: bool) -> Self {
        self.revoke_on_reuse = revoke;
        self
    }

    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }
}
