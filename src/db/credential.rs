//! Refresh token slot stored on the user row.
//!
//! Each user holds at most one refresh token. Access tokens are stateless and
//! never reach the database.

use sqlx::sqlite::SqlitePool;

/// SQLite integers are signed; out-of-range timestamps are refused, not wrapped.
fn to_sql_timestamp(secs: u64) -> Result<i64, sqlx::Error> {
    i64::try_from(secs).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

/// Store for the per-user refresh token column.
pub struct RefreshSlotStore {
    pool: SqlitePool,
}

impl RefreshSlotStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the stored refresh token for a user UUID.
    pub async fn get(&self, uuid: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT refresh_token FROM users WHERE uuid = ?")
                .bind(uuid)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.and_then(|r| r.0))
    }

    /// Overwrite the stored refresh token. Returns false if the user does not exist.
    pub async fn set(&self, uuid: &str, token: &str, expires_at: u64) -> Result<bool, sqlx::Error> {
        let expires_at = to_sql_timestamp(expires_at)?;
        let result = sqlx::query(
            "UPDATE users SET refresh_token = ?, refresh_expires_at = ? WHERE uuid = ?",
        )
        .bind(token)
        .bind(expires_at)
        .bind(uuid)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear the stored refresh token.
    pub async fn clear(&self, uuid: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = NULL, refresh_expires_at = NULL WHERE uuid = ? AND refresh_token IS NOT NULL",
        )
        .bind(uuid)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear every stored refresh token that expired at or before `now`.
    pub async fn clear_expired(&self, now: u64) -> Result<u64, sqlx::Error> {
        let now = to_sql_timestamp(now)?;
        let result = sqlx::query(
            "UPDATE users SET refresh_token = NULL, refresh_expires_at = NULL
             WHERE refresh_expires_at IS NOT NULL AND refresh_expires_at <= ?",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;

    #[tokio::test]
    async fn test_clear_reports_whether_a_token_was_present() {
        let db = Database::open(":memory:").await.unwrap();
        db.users().create("uuid-1", "alice", "hash").await.unwrap();

        assert!(!db.refresh_slots().clear("uuid-1").await.unwrap());

        db.refresh_slots().set("uuid-1", "token", 100).await.unwrap();
        assert!(db.refresh_slots().clear("uuid-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_expired() {
        let db = Database::open(":memory:").await.unwrap();
        db.users().create("uuid-1", "alice", "hash").await.unwrap();
        db.users().create("uuid-2", "bob", "hash").await.unwrap();
        db.users().create("uuid-3", "carol", "hash").await.unwrap();

        db.refresh_slots().set("uuid-1", "old", 100).await.unwrap();
        db.refresh_slots().set("uuid-2", "edge", 200).await.unwrap();
        db.refresh_slots().set("uuid-3", "fresh", 300).await.unwrap();

        let cleared = db.refresh_slots().clear_expired(200).await.unwrap();
        assert_eq!(cleared, 2);

        assert_eq!(db.refresh_slots().get("uuid-1").await.unwrap(), None);
        assert_eq!(db.refresh_slots().get("uuid-2").await.unwrap(), None);
        assert_eq!(
            db.refresh_slots().get("uuid-3").await.unwrap().as_deref(),
            Some("fresh")
        );
    }

    #[tokio::test]
    async fn test_out_of_range_expiry_is_refused() {
        let db = Database::open(":memory:").await.unwrap();
        db.users().create("uuid-1", "alice", "hash").await.unwrap();
        db.refresh_slots().set("uuid-1", "live", 1_000).await.unwrap();

        assert!(db.refresh_slots().set("uuid-1", "far", u64::MAX).await.is_err());

        // The previous slot survives and is not swept as expired
        assert_eq!(db.refresh_slots().clear_expired(500).await.unwrap(), 0);
        assert_eq!(
            db.refresh_slots().get("uuid-1").await.unwrap().as_deref(),
            Some("live")
        );
    }
}
