//! # Supplier Repository
//!
//! Supplier CRUD. Deletion is restricted while active medicines point at
//! the supplier.
//!
//! ## Delete Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── UPDATE inactive medicines SET supplier_id = NULL  (write lock)   │
//! │    ├── COUNT active medicines with supplier_id = id                     │
//! │    │      └── > 0 → SupplierInUse (rollback)                            │
//! │    │                                                                    │
//! │    ├── DELETE supplier  (0 rows → NotFound, rollback)                   │
//! │    │                                                                    │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use medisync_core::input::NewSupplier;
use medisync_core::{CoreError, Supplier};

const SUPPLIER_COLUMNS: &str = "id, name, contact_person, email, phone, address, tax_id, \
                                payment_terms, is_active, created_at";

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn get(&self, id: i64) -> DbResult<Supplier> {
        let sql = format!("SELECT {} FROM suppliers WHERE id = ?1", SUPPLIER_COLUMNS);
        sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    /// Lists suppliers by name.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!(
            "SELECT {} FROM suppliers ORDER BY name COLLATE NOCASE, id",
            SUPPLIER_COLUMNS
        );
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(suppliers)
    }

    pub async fn create(&self, input: &NewSupplier) -> DbResult<Supplier> {
        debug!(name = %input.name, "Creating supplier");

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO suppliers (
                name, contact_person, email, phone, address, tax_id, payment_terms,
                is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(&input.contact_person)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.tax_id)
        .bind(&input.payment_terms)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(id, name = %input.name, "Supplier created");
        self.get(id).await
    }

    /// Replaces a supplier's editable fields.
    pub async fn update(&self, id: i64, input: &NewSupplier) -> DbResult<Supplier> {
        debug!(id, "Updating supplier");

        let result = sqlx::query(
            r#"
            UPDATE suppliers
            SET name = ?2,
                contact_person = ?3,
                email = ?4,
                phone = ?5,
                address = ?6,
                tax_id = ?7,
                payment_terms = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.contact_person)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.tax_id)
        .bind(&input.payment_terms)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        self.get(id).await
    }

    /// Deletes a supplier no active medicine refers to.
    ///
    /// The first statement is a write, so the transaction takes the write
    /// lock (waiting out the busy timeout) before it reads anything.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE medicines SET supplier_id = NULL WHERE supplier_id = ?1 AND is_active = 0")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let in_use: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM medicines WHERE supplier_id = ?1 AND is_active = 1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if in_use > 0 {
            return Err(CoreError::SupplierInUse {
                supplier_id: id,
                medicines: in_use,
            }
            .into());
        }

        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id, "Supplier deleted");
        Ok(())
    }

    /// Whether the supplier exists (used to validate medicine references).
    pub async fn exists(&self, id: i64) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM suppliers WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suppliers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{new_medicine, new_supplier, test_db};
    use crate::{Database, DbConfig};

    async fn supplier_refs(db: &Database, supplier_id: i64) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM medicines WHERE supplier_id = ?1")
            .bind(supplier_id)
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_update_get() {
        let db = test_db().await;
        let supplier = db
            .suppliers()
            .create(&NewSupplier {
                name: "PharmaDist".to_string(),
                phone: Some("+1-555-0100".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(supplier.is_active);
        assert_eq!(supplier.phone.as_deref(), Some("+1-555-0100"));

        let updated = db
            .suppliers()
            .update(
                supplier.id,
                &NewSupplier {
                    name: "PharmaDist Ltd".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "PharmaDist Ltd");
        assert_eq!(updated.phone, None);
        assert_eq!(db.suppliers().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_restricted_while_active_medicines_reference_it() {
        let db = test_db().await;
        let supplier = db.suppliers().create(&new_supplier("MediSupply")).await.unwrap();

        let mut input = new_medicine("Amoxicillin", "AMX-1", 50, 1200);
        input.supplier_id = Some(supplier.id);
        let medicine = db.medicines().create(&input).await.unwrap();

        let err = db.suppliers().delete(supplier.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::SupplierInUse { medicines: 1, .. })
        ));
        assert!(db.suppliers().exists(supplier.id).await.unwrap());

        // Once the medicine is deleted the supplier can go.
        db.medicines().soft_delete(medicine.id).await.unwrap();
        db.suppliers().delete(supplier.id).await.unwrap();
        assert!(!db.suppliers().exists(supplier.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_refused_delete_keeps_inactive_references() {
        let db = test_db().await;
        let supplier = db.suppliers().create(&new_supplier("MediSupply")).await.unwrap();

        let mut retired = new_medicine("Old Syrup", "OS-1", 0, 300);
        retired.supplier_id = Some(supplier.id);
        let retired = db.medicines().create(&retired).await.unwrap();
        db.medicines().soft_delete(retired.id).await.unwrap();

        let mut active = new_medicine("Amoxicillin", "AMX-1", 50, 1200);
        active.supplier_id = Some(supplier.id);
        let active = db.medicines().create(&active).await.unwrap();

        // The refusal rolls back the cleanup that ran before the check.
        assert!(db.suppliers().delete(supplier.id).await.is_err());
        assert_eq!(supplier_refs(&db, supplier.id).await, 2);

        db.medicines().soft_delete(active.id).await.unwrap();
        db.suppliers().delete(supplier.id).await.unwrap();
        assert_eq!(supplier_refs(&db, supplier.id).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deletes_wait_for_the_write_lock() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("suppliers.db"))
            .max_connections(8)
            .busy_timeout(std::time::Duration::from_secs(30));
        let db = Database::new(config).await.unwrap();

        let mut ids = Vec::new();
        for i in 0..8 {
            let supplier = db
                .suppliers()
                .create(&new_supplier(&format!("Supplier {i}")))
                .await
                .unwrap();
            let mut input = new_medicine(&format!("Retired {i}"), &format!("R-{i}"), 0, 100);
            input.supplier_id = Some(supplier.id);
            let medicine = db.medicines().create(&input).await.unwrap();
            db.medicines().soft_delete(medicine.id).await.unwrap();
            ids.push(supplier.id);
        }

        let mut handles = Vec::new();
        for id in ids.iter().copied() {
            let db = db.clone();
            handles.push(tokio::spawn(async move { db.suppliers().delete(id).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(db.suppliers().count().await.unwrap(), 0);
        for id in ids {
            assert_eq!(supplier_refs(&db, id).await, 0);
        }
        db.close().await;
    }

    #[tokio::test]
    async fn test_delete_missing_supplier() {
        let db = test_db().await;
        assert!(matches!(
            db.suppliers().delete(42).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
