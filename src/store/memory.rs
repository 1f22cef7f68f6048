//! In-memory store implementing both storage contracts.
//!
//! Reads and writes yield to the scheduler first so that concurrent callers
//! interleave the way they would against a networked store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{CredentialStore, Principal, PrincipalStore, StoreError};

#[derive(Debug, Default)]
struct Slots {
    principals: HashMap<String, Principal>,
    /// principal id -> (refresh token, expires_at)
    refresh: HashMap<String, (String, u64)>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    slots: Arc<Mutex<Slots>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a principal. Returns its id.
    pub fn add_principal(&self, id: &str, username: &str) -> String {
        self.slots().principals.insert(
            id.to_string(),
            Principal {
                id: id.to_string(),
                username: username.to_string(),
            },
        );
        id.to_string()
    }

    pub fn remove_principal(&self, id: &str) {
        let mut slots = self.slots();
        slots.principals.remove(id);
        slots.refresh.remove(id);
    }

    /// Make every subsequent `set`/`clear` fail with `StoreError::Unavailable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Stored refresh token without going through the async contract.
    pub fn stored_token(&self, id: &str) -> Option<String> {
        self.slots().refresh.get(id).map(|(token, _)| token.clone())
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        Ok(())
    }
}

impl CredentialStore for MemoryStore {
    async fn get(&self, principal_id: &str) -> Result<Option<String>, StoreError> {
        tokio::task::yield_now().await;
        Ok(self.stored_token(principal_id))
    }

    async fn set(
        &self,
        principal_id: &str,
        refresh_token: &str,
        expires_at: u64,
    ) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.check_writable()?;
        let mut slots = self.slots();
        if !slots.principals.contains_key(principal_id) {
            return Err(StoreError::UnknownPrincipal(principal_id.to_string()));
        }
        slots.refresh.insert(
            principal_id.to_string(),
            (refresh_token.to_string(), expires_at),
        );
        Ok(())
    }

    async fn clear(&self, principal_id: &str) -> Result<(), StoreError> {
        tokio::task::yield_now().await;
        self.check_writable()?;
        self.slots().refresh.remove(principal_id);
        Ok(())
    }
}

impl PrincipalStore for MemoryStore {
    async fn find_by_id(&self, principal_id: &str) -> Result<Option<Principal>, StoreError> {
        tokio::task::yield_now().await;
        Ok(self.slots().principals.get(principal_id).cloned())
    }
}
