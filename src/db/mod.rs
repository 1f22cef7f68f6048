mod credential;
mod user;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub use credential::RefreshSlotStore;
pub use user::{User, UserStore};

use crate::store::{CredentialStore, Principal, PrincipalStore, StoreError};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create a database at the given path.
    /// Use ":memory:" for an in-memory database.
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        let (url, max_connections) = if path == ":memory:" {
            // Every connection to sqlite::memory: is a separate database.
            ("sqlite::memory:".to_string(), 1)
        } else {
            (format!("sqlite:{}?mode=rwc", path), 5)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get the current schema version.
    async fn get_version(&self) -> Result<i32, sqlx::Error> {
        let result: Option<(i32,)> = sqlx::query_as("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(result.map(|r| r.0).unwrap_or(0))
    }

    /// Set the schema version within a transaction.
    async fn set_version(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        version: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM schema_version")
            .execute(&mut **tx)
            .await?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(version)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Run database migrations.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await?;

        let version = self.get_version().await?;

        if version < 1 {
            self.migrate_v1().await?;
        }

        Ok(())
    }

    /// Execute a list of queries in a transaction, then set the version.
    async fn run_migration(
        &self,
        version: i32,
        queries: &[&'static str],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for query in queries {
            sqlx::query(*query).execute(&mut *tx).await?;
        }
        Self::set_version(&mut tx, version).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn migrate_v1(&self) -> Result<(), sqlx::Error> {
        self.run_migration(
            1,
            &[
                // One refresh token slot per user, overwritten on login and rotation
                "CREATE TABLE users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT UNIQUE NOT NULL,
                    username TEXT UNIQUE NOT NULL COLLATE NOCASE,
                    password_hash TEXT NOT NULL,
                    refresh_token TEXT,
                    refresh_expires_at INTEGER,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_users_uuid ON users(uuid)",
                "CREATE INDEX idx_users_refresh_expires_at ON users(refresh_expires_at)",
            ],
        )
        .await
    }

    /// Get the user store.
    pub fn users(&self) -> UserStore {
        UserStore::new(self.pool.clone())
    }

    /// Get the refresh token slot store.
    pub fn refresh_slots(&self) -> RefreshSlotStore {
        RefreshSlotStore::new(self.pool.clone())
    }

    /// Underlying connection pool, for tests that need raw SQL such as fault-injecting triggers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl CredentialStore for Database {
    async fn get(&self, principal_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.refresh_slots().get(principal_id).await?)
    }

    async fn set(
        &self,
        principal_id: &str,
        refresh_token: &str,
        expires_at: u64,
    ) -> Result<(), StoreError> {
        let updated = self
            .refresh_slots()
            .set(principal_id, refresh_token, expires_at)
            .await?;
        if !updated {
            return Err(StoreError::UnknownPrincipal(principal_id.to_string()));
        }
        Ok(())
    }

    async fn clear(&self, principal_id: &str) -> Result<(), StoreError> {
        self.refresh_slots().clear(principal_id).await?;
        Ok(())
    }
}

impl PrincipalStore for Database {
    async fn find_by_id(&self, principal_id: &str) -> Result<Option<Principal>, StoreError> {
        let user = self.users().get_by_uuid(principal_id).await?;
        Ok(user.map(|u| Principal {
            id: u.uuid,
            username: u.username,
        }))
    }
}
