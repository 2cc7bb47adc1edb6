//! # Session Repository
//!
//! One row per issued bearer token, keyed by the token's `jti`. A token is
//! honoured only while its row exists and has not expired, so logout is a
//! delete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;

/// An issued login session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Repository for session rows.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Opens a new session for `user_id` that lasts until `expires_at`.
    pub async fn create(&self, user_id: i64, expires_at: DateTime<Utc>) -> DbResult<Session> {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            created_at: Utc::now(),
            expires_at,
        };

        sqlx::query(
            "INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        debug!(session_id = %session.id, user_id, "Session opened");
        Ok(session)
    }

    /// Returns the session if it exists and has not expired at `now`.
    pub async fn find_live(&self, id: &str, now: DateTime<Utc>) -> DbResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, user_id, created_at, expires_at FROM sessions WHERE id = ?1 AND expires_at > ?2",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    /// Ends a session. Returns false if it was already gone.
    pub async fn revoke(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        debug!(session_id = %id, revoked = result.rows_affected() > 0, "Session revoked");
        Ok(result.rows_affected() > 0)
    }

    /// Drops every session of a user (after deactivation).
    pub async fn revoke_all_for_user(&self, user_id: i64) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Deletes sessions that expired before `now`.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{add_user, test_db};
    use chrono::Duration;
    use medisync_core::Role;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let db = test_db().await;
        let user = add_user(&db, "cashier1", Role::Cashier).await;
        let now = Utc::now();

        let session = db
            .sessions()
            .create(user.id, now + Duration::hours(8))
            .await
            .unwrap();

        let found = db.sessions().find_live(&session.id, now).await.unwrap();
        assert_eq!(found.map(|s| s.user_id), Some(user.id));

        assert!(db.sessions().revoke(&session.id).await.unwrap());
        assert!(!db.sessions().revoke(&session.id).await.unwrap());
        assert!(db.sessions().find_live(&session.id, now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_not_live() {
        let db = test_db().await;
        let user = add_user(&db, "cashier1", Role::Cashier).await;
        let now = Utc::now();

        let session = db
            .sessions()
            .create(user.id, now - Duration::minutes(1))
            .await
            .unwrap();
        assert!(db.sessions().find_live(&session.id, now).await.unwrap().is_none());
        assert_eq!(db.sessions().purge_expired(now).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sessions_cascade_with_user() {
        let db = test_db().await;
        let user = add_user(&db, "temp", Role::Cashier).await;
        let now = Utc::now();
        let session = db
            .sessions()
            .create(user.id, now + Duration::hours(1))
            .await
            .unwrap();

        db.users().delete(user.id).await.unwrap();
        assert!(db.sessions().find_live(&session.id, now).await.unwrap().is_none());
    }
}
