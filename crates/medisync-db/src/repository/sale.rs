//! # Sale Repository
//!
//! The sale transaction and the read paths over recorded sales.
//!
//! ## Sale Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       record_sale()                                     │
//! │                                                                         │
//! │  authorize(actor, RecordSale) + request.validate()   (no I/O yet)      │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │   │                                                                     │
//! │   ├── INSERT sales (placeholder invoice, zero totals)                  │
//! │   │     └── first statement is a write: takes the SQLite write lock    │
//! │   │                                                                     │
//! │   ├── for each line:                                                   │
//! │   │     ├── SELECT active medicine      (missing → MedicineNotFound)    │
//! │   │     ├── price_line()                (claim differs → TotalsMismatch)│
//! │   │     ├── UPDATE medicines SET quantity = quantity - q               │
//! │   │     │     WHERE id = ? AND is_active = 1 AND quantity >= q         │
//! │   │     │     └── 0 rows → InsufficientStock { id, name, avail, q }    │
//! │   │     └── INSERT sale_items (name + price snapshot)                  │
//! │   │                                                                     │
//! │   ├── compute_totals() + verify_claimed_totals()                       │
//! │   ├── UPDATE sales SET invoice_number = INV-YYYYMMDD-{id:06}, totals   │
//! │   │                                                                     │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Any `?` before COMMIT drops the Transaction → sqlx rolls back.        │
//! │  No partial sale, no partial stock change.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! The conditional decrement makes overselling impossible. Two sales of the
//! same medicine serialize on SQLite's single writer; the second sees the
//! decremented quantity and fails with `InsufficientStock`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::medicine::MEDICINE_COLUMNS;
use medisync_core::report::DateRange;
use medisync_core::sale::{
    compute_totals, invoice_number, price_line, verify_claimed_totals, PricedLine, SaleReceipt,
    SaleRequest,
};
use medisync_core::{
    authorize, Action, Actor, CoreError, Medicine, Money, Sale, SaleDetail, SaleItem,
};

pub(crate) const SALE_COLUMNS: &str = "id, invoice_number, customer_name, customer_phone, \
     total_amount_cents, discount_cents, tax_amount_cents, final_amount_cents, \
     payment_method, cashier_id, created_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Write Path
    // =========================================================================

    /// Records a sale atomically: header, lines, stock decrements and
    /// invoice number commit together or not at all.
    pub async fn record_sale(&self, actor: &Actor, request: &SaleRequest) -> DbResult<SaleReceipt> {
        authorize(actor, Action::RecordSale)?;
        request.validate().map_err(CoreError::from)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let placeholder = format!("PENDING-{}", Uuid::new_v4());
        let sale_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sales (
                invoice_number, customer_name, customer_phone,
                total_amount_cents, discount_cents, tax_amount_cents, final_amount_cents,
                payment_method, cashier_id, created_at
            ) VALUES (?1, ?2, ?3, 0, 0, 0, 0, ?4, ?5, ?6)
            RETURNING id
            "#,
        )
        .bind(&placeholder)
        .bind(request.customer_name())
        .bind(request.customer_phone())
        .bind(request.payment_method)
        .bind(actor.user_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        debug!(sale_id, cashier_id = actor.user_id, lines = request.items.len(), "Sale started");

        let select_medicine = format!(
            "SELECT {} FROM medicines WHERE id = ?1 AND is_active = 1",
            MEDICINE_COLUMNS
        );

        let mut lines: Vec<PricedLine> = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let medicine = sqlx::query_as::<_, Medicine>(&select_medicine)
                .bind(line.medicine_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(CoreError::MedicineNotFound(line.medicine_id))?;

            let priced = price_line(line, &medicine)?;

            let decremented = sqlx::query(
                r#"
                UPDATE medicines
                SET quantity = quantity - ?1,
                    updated_at = ?2
                WHERE id = ?3 AND is_active = 1 AND quantity >= ?1
                "#,
            )
            .bind(priced.quantity)
            .bind(now)
            .bind(priced.medicine_id)
            .execute(&mut *tx)
            .await?;

            if decremented.rows_affected() == 0 {
                let available: i64 =
                    sqlx::query_scalar("SELECT quantity FROM medicines WHERE id = ?1")
                        .bind(priced.medicine_id)
                        .fetch_one(&mut *tx)
                        .await?;

                warn!(
                    medicine_id = priced.medicine_id,
                    available,
                    requested = priced.quantity,
                    "Sale rejected: insufficient stock"
                );
                return Err(CoreError::InsufficientStock {
                    medicine_id: priced.medicine_id,
                    medicine: medicine.name,
                    available,
                    requested: priced.quantity,
                }
                .into());
            }

            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    sale_id, medicine_id, medicine_name, quantity,
                    unit_price_cents, total_price_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(sale_id)
            .bind(priced.medicine_id)
            .bind(&priced.medicine_name)
            .bind(priced.quantity)
            .bind(priced.unit_price.cents())
            .bind(priced.total_price.cents())
            .execute(&mut *tx)
            .await?;

            lines.push(priced);
        }

        let totals = compute_totals(
            &lines,
            Money::from_cents(request.discount_cents),
            Money::from_cents(request.tax_amount_cents),
        )?;
        verify_claimed_totals(request, &totals)?;

        let invoice = invoice_number(now.date_naive(), sale_id);

        sqlx::query(
            r#"
            UPDATE sales
            SET invoice_number = ?2,
                total_amount_cents = ?3,
                discount_cents = ?4,
                tax_amount_cents = ?5,
                final_amount_cents = ?6
            WHERE id = ?1
            "#,
        )
        .bind(sale_id)
        .bind(&invoice)
        .bind(totals.total_amount.cents())
        .bind(totals.discount.cents())
        .bind(totals.tax_amount.cents())
        .bind(totals.final_amount.cents())
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id,
            invoice = %invoice,
            final_amount = %totals.final_amount,
            items = lines.len(),
            "Sale recorded"
        );

        Ok(SaleReceipt {
            sale_id,
            invoice_number: invoice,
            final_amount_cents: totals.final_amount.cents(),
            item_count: lines.len(),
        })
    }

    // =========================================================================
    // Read Paths
    // =========================================================================

    /// Gets a sale header by ID.
    pub async fn get(&self, id: i64) -> DbResult<Sale> {
        let sql = format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS);
        sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))
    }

    /// Lines of a sale in insertion order.
    pub async fn items(&self, sale_id: i64) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, medicine_id, medicine_name, quantity,
                   unit_price_cents, total_price_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Header, lines and cashier username.
    pub async fn get_detail(&self, id: i64) -> DbResult<SaleDetail> {
        let sale = self.get(id).await?;
        let items = self.items(id).await?;
        let cashier_username: String =
            sqlx::query_scalar("SELECT username FROM users WHERE id = ?1")
                .bind(sale.cashier_id)
                .fetch_optional(&self.pool)
                .await?
                .unwrap_or_default();

        Ok(SaleDetail {
            sale,
            items,
            cashier_username,
        })
    }

    /// Sales in an optional inclusive date range, newest first.
    pub async fn list(&self, range: &DateRange) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales \
             WHERE (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at < ?2) \
             ORDER BY created_at DESC, id DESC",
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(range.start_bound())
            .bind(range.end_bound())
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
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
    use crate::repository::test_support::{add_medicine, add_user, test_db};
    use crate::{Database, DbConfig};
    use medisync_core::sale::SaleLineRequest;
    use medisync_core::{PaymentMethod, Role, ValidationError, WALK_IN_CUSTOMER};

    fn line(medicine_id: i64, quantity: i64) -> SaleLineRequest {
        SaleLineRequest {
            medicine_id,
            quantity,
            unit_price_cents: None,
            total_price_cents: None,
        }
    }

    fn request(items: Vec<SaleLineRequest>) -> SaleRequest {
        SaleRequest {
            customer_name: None,
            customer_phone: None,
            payment_method: PaymentMethod::Cash,
            items,
            discount_cents: 0,
            tax_amount_cents: 0,
            total_amount_cents: None,
            final_amount_cents: None,
        }
    }

    async fn cashier(db: &Database) -> Actor {
        let user = add_user(db, "cashier1", Role::Cashier).await;
        Actor::new(user.id, user.role, user.is_active)
    }

    #[tokio::test]
    async fn test_sell_three_of_ten() {
        let db = test_db().await;
        let actor = cashier(&db).await;
        let med = add_medicine(&db, "Paracetamol", "PCM-1", 10, 299).await;

        let receipt = db
            .sales()
            .record_sale(&actor, &request(vec![line(med.id, 3)]))
            .await
            .unwrap();

        assert_eq!(receipt.item_count, 1);
        assert_eq!(receipt.final_amount_cents, 897);
        assert!(receipt.invoice_number.starts_with("INV-"));
        assert!(receipt
            .invoice_number
            .ends_with(&format!("-{:06}", receipt.sale_id)));

        assert_eq!(db.medicines().get(med.id).await.unwrap().quantity, 7);
        assert_eq!(db.sales().count().await.unwrap(), 1);

        let detail = db.sales().get_detail(receipt.sale_id).await.unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].medicine_name, "Paracetamol");
        assert_eq!(detail.items[0].unit_price_cents, 299);
        assert_eq!(detail.sale.customer_name, WALK_IN_CUSTOMER);
        assert_eq!(detail.cashier_username, "cashier1");
    }

    #[tokio::test]
    async fn test_invoice_numbers_unique() {
        let db = test_db().await;
        let actor = cashier(&db).await;
        let med = add_medicine(&db, "Paracetamol", "PCM-1", 10, 299).await;

        let a = db.sales().record_sale(&actor, &request(vec![line(med.id, 1)])).await.unwrap();
        let b = db.sales().record_sale(&actor, &request(vec![line(med.id, 1)])).await.unwrap();
        assert_ne!(a.invoice_number, b.invoice_number);
    }

    #[tokio::test]
    async fn test_unknown_medicine_changes_nothing() {
        let db = test_db().await;
        let actor = cashier(&db).await;
        let med = add_medicine(&db, "Paracetamol", "PCM-1", 10, 299).await;

        let err = db
            .sales()
            .record_sale(&actor, &request(vec![line(med.id, 2), line(9999, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::MedicineNotFound(9999))));
        assert_eq!(db.medicines().get(med.id).await.unwrap().quantity, 10);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_earlier_lines() {
        let db = test_db().await;
        let actor = cashier(&db).await;
        let first = add_medicine(&db, "Paracetamol", "PCM-1", 10, 299).await;
        let second = add_medicine(&db, "Amoxicillin", "AMX-1", 3, 1200).await;

        let err = db
            .sales()
            .record_sale(&actor, &request(vec![line(first.id, 4), line(second.id, 5)]))
            .await
            .unwrap_err();

        match err {
            DbError::Domain(CoreError::InsufficientStock {
                medicine_id,
                medicine,
                available,
                requested,
            }) => {
                assert_eq!(medicine_id, second.id);
                assert_eq!(medicine, "Amoxicillin");
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert_eq!(db.medicines().get(first.id).await.unwrap().quantity, 10);
        assert_eq!(db.medicines().get(second.id).await.unwrap().quantity, 3);
        assert_eq!(db.sales().count().await.unwrap(), 0);
        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(items, 0);
    }

    #[tokio::test]
    async fn test_same_medicine_on_two_lines_counts_cumulatively() {
        let db = test_db().await;
        let actor = cashier(&db).await;
        let med = add_medicine(&db, "Paracetamol", "PCM-1", 5, 299).await;

        let err = db
            .sales()
            .record_sale(&actor, &request(vec![line(med.id, 3), line(med.id, 3)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 2, requested: 3, .. })
        ));
        assert_eq!(db.medicines().get(med.id).await.unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_amount_overflow_rolls_back() {
        let db = test_db().await;
        let actor = cashier(&db).await;
        let pricey = add_medicine(&db, "Compounded infusion", "CMP-1", 10, i64::MAX / 2).await;

        let err = db
            .sales()
            .record_sale(&actor, &request(vec![line(pricey.id, 3)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        let cheap = add_medicine(&db, "Paracetamol", "PCM-1", 10, 299).await;
        let mut req = request(vec![line(cheap.id, 2)]);
        req.tax_amount_cents = i64::MAX;
        let err = db.sales().record_sale(&actor, &req).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        assert_eq!(db.medicines().get(pricey.id).await.unwrap().quantity, 10);
        assert_eq!(db.medicines().get(cheap.id).await.unwrap().quantity, 10);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_totals_with_discount_and_tax() {
        let db = test_db().await;
        let actor = cashier(&db).await;
        let a = add_medicine(&db, "Paracetamol", "PCM-1", 10, 500).await;
        let b = add_medicine(&db, "Cetirizine", "CET-1", 10, 250).await;

        let mut req = request(vec![line(a.id, 2), line(b.id, 1)]);
        req.discount_cents = 100;
        req.tax_amount_cents = 60;
        req.total_amount_cents = Some(1250);
        req.final_amount_cents = Some(1210);

        let receipt = db.sales().record_sale(&actor, &req).await.unwrap();
        let sale = db.sales().get(receipt.sale_id).await.unwrap();
        assert_eq!(sale.total_amount_cents, 1250);
        assert_eq!(sale.discount_cents, 100);
        assert_eq!(sale.tax_amount_cents, 60);
        assert_eq!(sale.final_amount_cents, 1210);
        assert_eq!(
            sale.final_amount_cents,
            sale.total_amount_cents - sale.discount_cents + sale.tax_amount_cents
        );
    }

    #[tokio::test]
    async fn test_mismatched_claimed_total_rejected() {
        let db = test_db().await;
        let actor = cashier(&db).await;
        let med = add_medicine(&db, "Paracetamol", "PCM-1", 10, 500).await;

        let mut req = request(vec![line(med.id, 2)]);
        req.final_amount_cents = Some(900);

        let err = db.sales().record_sale(&actor, &req).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::TotalsMismatch { .. })));
        assert_eq!(db.medicines().get(med.id).await.unwrap().quantity, 10);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deleted_medicine_cannot_be_sold() {
        let db = test_db().await;
        let actor = cashier(&db).await;
        let med = add_medicine(&db, "Paracetamol", "PCM-1", 10, 500).await;
        db.medicines().soft_delete(med.id).await.unwrap();

        let err = db
            .sales()
            .record_sale(&actor, &request(vec![line(med.id, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::MedicineNotFound(_))));
    }

    #[tokio::test]
    async fn test_inactive_actor_denied_before_any_write() {
        let db = test_db().await;
        let mut actor = cashier(&db).await;
        actor.is_active = false;
        let med = add_medicine(&db, "Paracetamol", "PCM-1", 10, 500).await;

        let err = db
            .sales()
            .record_sale(&actor, &request(vec![line(med.id, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::AccessDenied { .. })));
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_user_with_sales_cannot_be_deleted() {
        let db = test_db().await;
        let actor = cashier(&db).await;
        let med = add_medicine(&db, "Paracetamol", "PCM-1", 10, 500).await;
        db.sales()
            .record_sale(&actor, &request(vec![line(med.id, 1)]))
            .await
            .unwrap();

        let err = db.users().delete(actor.user_id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::UserHasSales { sales: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_list_newest_first_with_range() {
        let db = test_db().await;
        let actor = cashier(&db).await;
        let med = add_medicine(&db, "Paracetamol", "PCM-1", 10, 500).await;
        let first = db.sales().record_sale(&actor, &request(vec![line(med.id, 1)])).await.unwrap();
        let second = db.sales().record_sale(&actor, &request(vec![line(med.id, 1)])).await.unwrap();

        let all = db.sales().list(&DateRange::default()).await.unwrap();
        assert_eq!(
            all.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![second.sale_id, first.sale_id]
        );

        let today = Utc::now().date_naive();
        let yesterday = today - chrono::Duration::days(1);
        let range = DateRange::new(None, Some(yesterday)).unwrap();
        assert!(db.sales().list(&range).await.unwrap().is_empty());
        let range = DateRange::new(Some(today), Some(today)).unwrap();
        assert_eq!(db.sales().list(&range).await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("concurrency.db"))
            .max_connections(8)
            .busy_timeout(std::time::Duration::from_secs(30));
        let db = Database::new(config).await.unwrap();

        let actor = cashier(&db).await;
        let med = add_medicine(&db, "Paracetamol", "PCM-1", 10, 100).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = db.clone();
            let req = request(vec![line(med.id, 3)]);
            handles.push(tokio::spawn(async move {
                db.sales().record_sale(&actor, &req).await
            }));
        }

        let mut sold = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => sold += 3,
                Err(DbError::Domain(CoreError::InsufficientStock { .. })) => {}
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        let remaining = db.medicines().get(med.id).await.unwrap().quantity;
        assert_eq!(sold, 9);
        assert_eq!(remaining, 1);
        assert_eq!(db.sales().count().await.unwrap(), 3);
        db.close().await;
    }
}
