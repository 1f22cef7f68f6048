//! Storage contracts consumed by the session core.
//!
//! `CredentialStore` holds the single active refresh token per principal.
//! Only one slot exists per principal, so a second login replaces the first
//! session's refresh token. Supporting several devices would mean keying the
//! slot by `(principal_id, session_id)` instead.
//!
//! `PrincipalStore` is the user-persistence collaborator; the core only asks
//! whether a principal still exists.

mod memory;

use std::future::Future;

pub use memory::MemoryStore;

/// A principal as seen by the session core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Opaque unique identifier (UUID)
    pub id: String,
    pub username: String,
}

/// Errors from a backing store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("no principal with id {0}")]
    UnknownPrincipal(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Per-principal refresh token slot.
///
/// `set` overwrites unconditionally and is the only point where rotation
/// becomes visible. Implementations give last-writer-wins semantics; the
/// session manager serialises read-then-write sequences per principal.
pub trait CredentialStore: Send + Sync {
    /// Currently stored refresh token for the principal, if any.
    fn get(
        &self,
        principal_id: &str,
    ) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Replace the stored refresh token. `expires_at` is the token's Unix expiry.
    fn set(
        &self,
        principal_id: &str,
        refresh_token: &str,
        expires_at: u64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove the stored refresh token.
    fn clear(&self, principal_id: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// User-persistence lookup.
pub trait PrincipalStore: Send + Sync {
    fn find_by_id(
        &self,
        principal_id: &str,
    ) -> impl Future<Output = Result<Option<Principal>, StoreError>> + Send;
}
