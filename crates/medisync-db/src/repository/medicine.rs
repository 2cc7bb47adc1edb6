//! # Medicine Repository
//!
//! Database operations for the medicine catalog.
//!
//! ## Soft Delete
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DELETE /api/medicines/7                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE medicines SET is_active = 0 WHERE id = 7                        │
//! │       │                                                                 │
//! │       ├── gone from every listing and report (is_active = 1 filters)    │
//! │       ├── batch number freed (partial unique index)                     │
//! │       └── historical sale_items still resolve medicine_id = 7           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is only decremented by the sale transaction in
//! [`super::sale`]; manual edits replace the quantity outright.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use medisync_core::input::NewMedicine;
use medisync_core::Medicine;

pub(crate) const MEDICINE_COLUMNS: &str = "id, name, generic_name, category, batch_number, \
     quantity, price_cents, cost_price_cents, expiry_date, supplier_id, barcode, \
     min_stock_level, is_prescription_required, is_active, created_at, updated_at";

/// Repository for medicine database operations.
#[derive(Debug, Clone)]
pub struct MedicineRepository {
    pool: SqlitePool,
}

impl MedicineRepository {
    /// Creates a new MedicineRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MedicineRepository { pool }
    }

    /// Gets an active medicine by ID.
    pub async fn get(&self, id: i64) -> DbResult<Medicine> {
        let sql = format!(
            "SELECT {} FROM medicines WHERE id = ?1 AND is_active = 1",
            MEDICINE_COLUMNS
        );
        sqlx::query_as::<_, Medicine>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Medicine", id))
    }

    /// Lists active medicines by name.
    pub async fn list(&self) -> DbResult<Vec<Medicine>> {
        let sql = format!(
            "SELECT {} FROM medicines WHERE is_active = 1 ORDER BY name COLLATE NOCASE, id",
            MEDICINE_COLUMNS
        );
        let medicines = sqlx::query_as::<_, Medicine>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(medicines)
    }

    /// Lists active medicines with stock on hand, for the sale screen.
    pub async fn list_saleable(&self) -> DbResult<Vec<Medicine>> {
        let sql = format!(
            "SELECT {} FROM medicines WHERE is_active = 1 AND quantity > 0 \
             ORDER BY name COLLATE NOCASE, id",
            MEDICINE_COLUMNS
        );
        let medicines = sqlx::query_as::<_, Medicine>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(medicines)
    }

    /// Inserts a medicine. The input must already be validated.
    ///
    /// ## Errors
    /// - `UniqueViolation { field: "batch_number" }` if an active medicine
    ///   already uses the batch
    /// - `NotFound` if `supplier_id` names no supplier
    pub async fn create(&self, input: &NewMedicine) -> DbResult<Medicine> {
        debug!(name = %input.name, batch = %input.batch_number, "Creating medicine");

        self.check_supplier(input.supplier_id).await?;
        let now = Utc::now();

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO medicines (
                name, generic_name, category, batch_number,
                quantity, price_cents, cost_price_cents, expiry_date,
                supplier_id, barcode, min_stock_level, is_prescription_required,
                is_active, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8,
                ?9, ?10, ?11, ?12,
                1, ?13, ?13
            )
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(&input.generic_name)
        .bind(&input.category)
        .bind(&input.batch_number)
        .bind(input.quantity)
        .bind(input.price_cents)
        .bind(input.cost_price_cents)
        .bind(input.expiry_date)
        .bind(input.supplier_id)
        .bind(&input.barcode)
        .bind(input.min_stock_level)
        .bind(input.is_prescription_required)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value("batch_number", &input.batch_number))?;

        info!(id, name = %input.name, "Medicine created");
        self.get(id).await
    }

    /// Replaces every editable field of an active medicine.
    pub async fn update(&self, id: i64, input: &NewMedicine) -> DbResult<Medicine> {
        debug!(id, "Updating medicine");

        self.check_supplier(input.supplier_id).await?;

        let result = sqlx::query(
            r#"
            UPDATE medicines
            SET name = ?2,
                generic_name = ?3,
                category = ?4,
                batch_number = ?5,
                quantity = ?6,
                price_cents = ?7,
                cost_price_cents = ?8,
                expiry_date = ?9,
                supplier_id = ?10,
                barcode = ?11,
                min_stock_level = ?12,
                is_prescription_required = ?13,
                updated_at = ?14
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.generic_name)
        .bind(&input.category)
        .bind(&input.batch_number)
        .bind(input.quantity)
        .bind(input.price_cents)
        .bind(input.cost_price_cents)
        .bind(input.expiry_date)
        .bind(input.supplier_id)
        .bind(&input.barcode)
        .bind(input.min_stock_level)
        .bind(input.is_prescription_required)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value("batch_number", &input.batch_number))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medicine", id));
        }

        self.get(id).await
    }

    /// Soft-deletes a medicine by setting is_active = 0.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Soft-deleting medicine");

        let result = sqlx::query(
            "UPDATE medicines SET is_active = 0, updated_at = ?2 WHERE id = ?1 AND is_active = 1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medicine", id));
        }

        info!(id, "Medicine deleted");
        Ok(())
    }

    /// Counts active medicines.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM medicines WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn check_supplier(&self, supplier_id: Option<i64>) -> DbResult<()> {
        let Some(supplier_id) = supplier_id else {
            return Ok(());
        };

        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM suppliers WHERE id = ?1")
            .bind(supplier_id)
            .fetch_optional(&self.pool)
            .await?;

        match found {
            Some(_) => Ok(()),
            None => Err(DbError::not_found("Supplier", supplier_id)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{add_medicine, new_medicine, new_supplier, test_db};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_create_and_read_back() {
        let db = test_db().await;
        let supplier = db.suppliers().create(&new_supplier("MediSupply")).await.unwrap();

        let input = NewMedicine {
            name: "Amoxicillin 500mg".to_string(),
            generic_name: Some("Amoxicillin".to_string()),
            category: Some("Antibiotic".to_string()),
            batch_number: "AMX-2026-01".to_string(),
            quantity: 120,
            price_cents: 1250,
            cost_price_cents: Some(800),
            expiry_date: NaiveDate::from_ymd_opt(2027, 3, 31).unwrap(),
            supplier_id: Some(supplier.id),
            barcode: Some("8901234567890".to_string()),
            min_stock_level: 20,
            is_prescription_required: true,
        };
        let created = db.medicines().create(&input).await.unwrap();
        let read = db.medicines().get(created.id).await.unwrap();

        assert_eq!(read, created);
        assert_eq!(read.name, input.name);
        assert_eq!(read.generic_name, input.generic_name);
        assert_eq!(read.category, input.category);
        assert_eq!(read.batch_number, input.batch_number);
        assert_eq!(read.quantity, input.quantity);
        assert_eq!(read.price_cents, input.price_cents);
        assert_eq!(read.cost_price_cents, input.cost_price_cents);
        assert_eq!(read.expiry_date, input.expiry_date);
        assert_eq!(read.supplier_id, input.supplier_id);
        assert_eq!(read.barcode, input.barcode);
        assert_eq!(read.min_stock_level, input.min_stock_level);
        assert!(read.is_prescription_required);
        assert!(read.is_active);
    }

    #[tokio::test]
    async fn test_duplicate_active_batch_rejected() {
        let db = test_db().await;
        add_medicine(&db, "Paracetamol", "PCM-1", 10, 299).await;

        let err = db
            .medicines()
            .create(&new_medicine("Paracetamol copy", "PCM-1", 5, 299))
            .await
            .unwrap_err();
        assert!(
            matches!(err, DbError::UniqueViolation { ref field, ref value } if field == "batch_number" && value == "PCM-1")
        );
    }

    #[tokio::test]
    async fn test_deleted_batch_can_be_reused() {
        let db = test_db().await;
        let first = add_medicine(&db, "Paracetamol", "PCM-1", 10, 299).await;
        db.medicines().soft_delete(first.id).await.unwrap();

        let second = add_medicine(&db, "Paracetamol", "PCM-1", 10, 299).await;
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_medicine() {
        let db = test_db().await;
        let med = add_medicine(&db, "Ibuprofen", "IBU-1", 10, 350).await;
        add_medicine(&db, "Cetirizine", "CET-1", 0, 150).await;

        assert_eq!(db.medicines().list().await.unwrap().len(), 2);
        assert_eq!(db.medicines().list_saleable().await.unwrap().len(), 1);

        db.medicines().soft_delete(med.id).await.unwrap();

        assert!(matches!(
            db.medicines().get(med.id).await,
            Err(DbError::NotFound { .. })
        ));
        assert_eq!(db.medicines().list().await.unwrap().len(), 1);
        assert!(db.medicines().list_saleable().await.unwrap().is_empty());
        assert_eq!(db.medicines().count().await.unwrap(), 1);
        assert!(matches!(
            db.medicines().soft_delete(med.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let db = test_db().await;
        let med = add_medicine(&db, "Ibuprofen", "IBU-1", 10, 350).await;

        let mut input = new_medicine("Ibuprofen 400mg", "IBU-2", 40, 450);
        input.min_stock_level = 5;
        let updated = db.medicines().update(med.id, &input).await.unwrap();

        assert_eq!(updated.name, "Ibuprofen 400mg");
        assert_eq!(updated.batch_number, "IBU-2");
        assert_eq!(updated.quantity, 40);
        assert_eq!(updated.min_stock_level, 5);
        assert!(updated.updated_at >= med.updated_at);
    }

    #[tokio::test]
    async fn test_unknown_supplier_rejected() {
        let db = test_db().await;
        let mut input = new_medicine("Ibuprofen", "IBU-1", 10, 350);
        input.supplier_id = Some(999);

        let err = db.medicines().create(&input).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Supplier"));
    }
}
