//! # User Repository
//!
//! Staff accounts: creation, login lookup, activation and deletion.
//!
//! ## Deletion Rule
//! ```text
//! delete(id)
//!   ├── user has sales?  → CoreError::UserHasSales (deactivate instead)
//!   ├── no such user?    → DbError::NotFound
//!   └── DELETE (sessions cascade)
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::credentials::{hash_password, verify_password};
use crate::error::{DbError, DbResult};
use medisync_core::input::{NewUser, ProfileUpdate};
use medisync_core::{CoreError, User};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, is_active, created_at, last_login";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Gets a user by ID.
    pub async fn get(&self, id: i64) -> DbResult<User> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Looks up a user by login name.
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Lists all accounts, oldest first.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// Creates an account. The input must already be validated.
    ///
    /// ## Errors
    /// `UniqueViolation` naming `username` or `email` on duplicates.
    pub async fn create(&self, input: &NewUser) -> DbResult<User> {
        debug!(username = %input.username, role = %input.role, "Creating user");

        let hash = hash_password(&input.password)?;
        let now = Utc::now();

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, email, password_hash, role, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, 1, ?5)
            RETURNING id
            "#,
        )
        .bind(&input.username)
        .bind(&input.email)
        .bind(&hash)
        .bind(input.role)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DbError::from(e)
                .with_value("username", &input.username)
                .with_value("email", &input.email)
        })?;

        info!(id, username = %input.username, "User created");
        self.get(id).await
    }

    /// Verifies a username/password pair and stamps `last_login`.
    ///
    /// Unknown users, wrong passwords and deactivated accounts all fail
    /// with the same `InvalidCredentials`.
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<User> {
        let user = match self.find_by_username(username).await? {
            Some(user) if user.is_active && verify_password(password, &user.password_hash) => user,
            _ => {
                debug!(username = %username, "Login rejected");
                return Err(CoreError::InvalidCredentials.into());
            }
        };

        let now = Utc::now();
        sqlx::query("UPDATE users SET last_login = ?2 WHERE id = ?1")
            .bind(user.id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(User {
            last_login: Some(now),
            ..user
        })
    }

    /// Flips the active flag and returns the updated user.
    pub async fn toggle_active(&self, id: i64) -> DbResult<User> {
        let result = sqlx::query("UPDATE users SET is_active = 1 - is_active WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        let user = self.get(id).await?;
        info!(id, is_active = user.is_active, "User active flag toggled");
        Ok(user)
    }

    /// Updates the caller's own email and, optionally, password.
    pub async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> DbResult<User> {
        debug!(id, "Updating profile");

        let hash = match &update.password {
            Some(p) => Some(hash_password(p)?),
            None => None,
        };

        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = ?2,
                password_hash = COALESCE(?3, password_hash)
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&update.email)
        .bind(hash)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value("email", &update.email))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        self.get(id).await
    }

    /// Deletes an account that has never recorded a sale.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let sales: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE cashier_id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        if sales > 0 {
            return Err(CoreError::UserHasSales { user_id: id, sales }.into());
        }

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(id, "User deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{add_user, test_db};
    use medisync_core::Role;

    #[tokio::test]
    async fn test_create_and_authenticate() {
        let db = test_db().await;
        let user = add_user(&db, "pharma1", Role::Pharmacist).await;
        assert_eq!(user.role, Role::Pharmacist);
        assert!(user.is_active);
        assert!(user.last_login.is_none());

        let logged_in = db.users().authenticate("pharma1", "password1").await.unwrap();
        assert!(logged_in.last_login.is_some());
        assert!(db.users().get(user.id).await.unwrap().last_login.is_some());

        let err = db.users().authenticate("pharma1", "wrong").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidCredentials)));
        let err = db.users().authenticate("ghost", "password1").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_log_in() {
        let db = test_db().await;
        let user = add_user(&db, "cashier1", Role::Cashier).await;

        let toggled = db.users().toggle_active(user.id).await.unwrap();
        assert!(!toggled.is_active);

        let err = db.users().authenticate("cashier1", "password1").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidCredentials)));

        assert!(db.users().toggle_active(user.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email() {
        let db = test_db().await;
        add_user(&db, "cashier1", Role::Cashier).await;

        let err = db
            .users()
            .create(&NewUser {
                username: "cashier1".to_string(),
                email: "other@medisync.com".to_string(),
                password: "password1".to_string(),
                role: Role::Cashier,
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err, DbError::UniqueViolation { ref field, ref value } if field == "username" && value == "cashier1")
        );

        let err = db
            .users()
            .create(&NewUser {
                username: "cashier2".to_string(),
                email: "cashier1@medisync.com".to_string(),
                password: "password1".to_string(),
                role: Role::Cashier,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let db = test_db().await;
        let user = add_user(&db, "pharma1", Role::Pharmacist).await;

        let updated = db
            .users()
            .update_profile(
                user.id,
                &ProfileUpdate {
                    email: "new@medisync.com".to_string(),
                    password: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "new@medisync.com");
        assert!(db.users().authenticate("pharma1", "password1").await.is_ok());

        db.users()
            .update_profile(
                user.id,
                &ProfileUpdate {
                    email: "new@medisync.com".to_string(),
                    password: Some("changed99".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(db.users().authenticate("pharma1", "password1").await.is_err());
        assert!(db.users().authenticate("pharma1", "changed99").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_user_without_sales() {
        let db = test_db().await;
        let user = add_user(&db, "temp", Role::Cashier).await;

        db.users().delete(user.id).await.unwrap();
        assert!(matches!(
            db.users().get(user.id).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            db.users().delete(user.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
