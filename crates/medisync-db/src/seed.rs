//! # Startup Seeding
//!
//! A fresh database gets a default administrator and one supplier so the
//! application is usable on first start.
//!
//! ```text
//! ensure_defaults()
//!   ├── user "admin" exists?  → nothing to do (Ok(false))
//!   └── BEGIN
//!         ├── INSERT admin / admin@medisync.com (argon2 hash)
//!         ├── INSERT supplier "MediSupply Co."
//!       COMMIT                                   (Ok(true))
//! ```

use chrono::Utc;
use tracing::{info, warn};

use crate::credentials::hash_password;
use crate::error::{DbError, DbResult};
use crate::pool::Database;
use medisync_core::Role;

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@medisync.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

struct DefaultSupplier {
    name: &'static str,
    contact_person: &'static str,
    email: &'static str,
    phone: &'static str,
    address: &'static str,
}

const DEFAULT_SUPPLIER: DefaultSupplier = DefaultSupplier {
    name: "MediSupply Co.",
    contact_person: "John Smith",
    email: "contact@medisupply.com",
    phone: "+1-555-0123",
    address: "123 Healthcare Ave, Medical City",
};

/// Creates the default admin and supplier if no `admin` user exists.
///
/// Returns true if anything was created. Safe to call on every start.
pub async fn ensure_defaults(db: &Database) -> DbResult<bool> {
    if db.users().find_by_username(DEFAULT_ADMIN_USERNAME).await?.is_some() {
        return Ok(false);
    }

    let hash = hash_password(DEFAULT_ADMIN_PASSWORD)?;
    let now = Utc::now();
    let mut tx = db.pool().begin().await?;

    sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, role, is_active, created_at)
        VALUES (?1, ?2, ?3, ?4, 1, ?5)
        "#,
    )
    .bind(DEFAULT_ADMIN_USERNAME)
    .bind(DEFAULT_ADMIN_EMAIL)
    .bind(&hash)
    .bind(Role::Admin)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO suppliers (name, contact_person, email, phone, address, is_active, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
        "#,
    )
    .bind(DEFAULT_SUPPLIER.name)
    .bind(DEFAULT_SUPPLIER.contact_person)
    .bind(DEFAULT_SUPPLIER.email)
    .bind(DEFAULT_SUPPLIER.phone)
    .bind(DEFAULT_SUPPLIER.address)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit()
        .await
        .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

    info!(username = DEFAULT_ADMIN_USERNAME, "Default admin created");
    warn!("Default admin password is in use; change it from the profile page");
    Ok(true)
}
