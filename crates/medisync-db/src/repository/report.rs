//! # Report Repository
//!
//! Read-only rollups behind the dashboard, analytics and report endpoints.
//! Every query filters `is_active = 1` on medicines; historical sales are
//! reported regardless of what happened to their medicines since.
//!
//! ## Data Flow
//! ```text
//! ┌───────────────┐    raw rows     ┌─────────────────────────┐
//! │  SQLite       │ ──────────────▶ │  medisync_core::report  │
//! │  (aggregates, │                 │  bucket_daily()         │
//! │   date bounds)│                 │  StockReportRow::from() │
//! └───────────────┘                 │  SalesReportRow::new()  │
//!                                   └─────────────────────────┘
//! ```
//!
//! "Today" is always the `as_of` argument. Date ranges are half-open on the
//! UTC timestamp: `[start_of_day(start), start_of_day(end + 1))`.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;
use crate::repository::medicine::MEDICINE_COLUMNS;
use crate::repository::sale::SALE_COLUMNS;
use medisync_core::report::{
    bucket_daily, expiry_horizon, start_of_day, validate_series_days, window_start,
    CategoryCount, DailyPoint, Dashboard, DateRange, RevenueSummary, SalesReportRow,
    StockReportRow, StockSummary, TopMedicine,
};
use medisync_core::{CoreError, Medicine, Sale, DASHBOARD_EXPIRING_LIMIT};

#[derive(sqlx::FromRow)]
struct SaleWithItemCount {
    #[sqlx(flatten)]
    sale: Sale,
    item_count: i64,
}

/// Repository for reporting queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// Counts over active medicines as of `as_of`.
    pub async fn stock_summary(&self, as_of: NaiveDate) -> DbResult<StockSummary> {
        let (total_medicines, low_stock, out_of_stock, expiring_soon): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(CASE WHEN quantity <= min_stock_level THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN quantity = 0 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN expiry_date <= ?1 THEN 1 ELSE 0 END), 0)
                FROM medicines
                WHERE is_active = 1
                "#,
            )
            .bind(expiry_horizon(as_of))
            .fetch_one(&self.pool)
            .await?;

        Ok(StockSummary {
            total_medicines,
            low_stock,
            out_of_stock,
            expiring_soon,
        })
    }

    /// Active medicines per category, largest first. Uncategorized
    /// medicines are left out.
    pub async fn category_distribution(&self) -> DbResult<Vec<CategoryCount>> {
        let rows = sqlx::query_as::<_, CategoryCount>(
            r#"
            SELECT category, COUNT(*) AS count
            FROM medicines
            WHERE is_active = 1 AND category IS NOT NULL
            GROUP BY category
            ORDER BY count DESC, category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Active medicines ordered by quantity ascending.
    pub async fn stock_report(&self) -> DbResult<Vec<StockReportRow>> {
        let sql = format!(
            "SELECT {} FROM medicines WHERE is_active = 1 \
             ORDER BY quantity ASC, name COLLATE NOCASE, id",
            MEDICINE_COLUMNS
        );
        let medicines = sqlx::query_as::<_, Medicine>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(medicines.iter().map(StockReportRow::from).collect())
    }

    /// Soonest-expiring active medicines within the horizon of `as_of`.
    pub async fn expiring_medicines(&self, as_of: NaiveDate, limit: u32) -> DbResult<Vec<Medicine>> {
        let sql = format!(
            "SELECT {} FROM medicines WHERE is_active = 1 AND expiry_date <= ?1 \
             ORDER BY expiry_date, id LIMIT ?2",
            MEDICINE_COLUMNS
        );
        let medicines = sqlx::query_as::<_, Medicine>(&sql)
            .bind(expiry_horizon(as_of))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(medicines)
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Units sold per active medicine, best sellers first.
    pub async fn top_medicines(&self, limit: u32) -> DbResult<Vec<TopMedicine>> {
        let rows = sqlx::query_as::<_, TopMedicine>(
            r#"
            SELECT m.id AS medicine_id, m.name AS name, SUM(si.quantity) AS units_sold
            FROM sale_items si
            JOIN medicines m ON m.id = si.medicine_id
            WHERE m.is_active = 1
            GROUP BY m.id, m.name
            ORDER BY units_sold DESC, m.name
            LIMIT ?1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// `(created_at, final_amount_cents)` for sales in `[from, until)`.
    async fn sale_amounts_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DbResult<Vec<(DateTime<Utc>, i64)>> {
        let rows = sqlx::query_as::<_, (DateTime<Utc>, i64)>(
            r#"
            SELECT created_at, final_amount_cents
            FROM sales
            WHERE created_at >= ?1 AND created_at < ?2
            ORDER BY created_at
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// One point per day for the `days` days ending at `as_of`, oldest first.
    pub async fn daily_series(&self, as_of: NaiveDate, days: u32) -> DbResult<Vec<DailyPoint>> {
        validate_series_days(days).map_err(CoreError::from)?;

        let from = start_of_day(window_start(as_of, days));
        let until = start_of_day(as_of + Duration::days(1));
        let rows = self.sale_amounts_between(from, until).await?;

        Ok(bucket_daily(&rows, as_of, days))
    }

    /// Sale count and revenue over an optional inclusive date range.
    pub async fn revenue(&self, range: &DateRange) -> DbResult<RevenueSummary> {
        let (sales_count, revenue_cents): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(final_amount_cents), 0)
            FROM sales
            WHERE (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at < ?2)
            "#,
        )
        .bind(range.start_bound())
        .bind(range.end_bound())
        .fetch_one(&self.pool)
        .await?;

        Ok(RevenueSummary {
            start_date: range.start_date,
            end_date: range.end_date,
            sales_count,
            revenue_cents,
        })
    }

    /// Sales report rows, newest first.
    pub async fn sales_report(&self, range: &DateRange) -> DbResult<Vec<SalesReportRow>> {
        let sql = format!(
            "SELECT {cols}, \
                (SELECT COUNT(*) FROM sale_items si WHERE si.sale_id = sales.id) AS item_count \
             FROM sales \
             WHERE (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at < ?2) \
             ORDER BY created_at DESC, id DESC",
            cols = SALE_COLUMNS
        );
        let rows = sqlx::query_as::<_, SaleWithItemCount>(&sql)
            .bind(range.start_bound())
            .bind(range.end_bound())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| SalesReportRow::new(&row.sale, row.item_count))
            .collect())
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    pub async fn dashboard(&self, as_of: NaiveDate) -> DbResult<Dashboard> {
        let stock = self.stock_summary(as_of).await?;
        let today = self
            .revenue(&DateRange {
                start_date: Some(as_of),
                end_date: Some(as_of),
            })
            .await?;
        let expiring_soon = self
            .expiring_medicines(as_of, DASHBOARD_EXPIRING_LIMIT)
            .await?;

        Ok(Dashboard {
            as_of,
            total_medicines: stock.total_medicines,
            low_stock: stock.low_stock,
            today_sales: today.sales_count,
            today_revenue_cents: today.revenue_cents,
            expiring_soon,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{add_medicine, add_user, new_medicine, test_db};
    use crate::Database;
    use medisync_core::sale::{SaleLineRequest, SaleRequest};
    use medisync_core::{Actor, PaymentMethod, Role};

    fn sale_of(lines: &[(i64, i64)]) -> SaleRequest {
        SaleRequest {
            customer_name: Some("Jane".to_string()),
            customer_phone: None,
            payment_method: PaymentMethod::Card,
            items: lines
                .iter()
                .map(|&(medicine_id, quantity)| SaleLineRequest {
                    medicine_id,
                    quantity,
                    unit_price_cents: None,
                    total_price_cents: None,
                })
                .collect(),
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

    async fn backdate(db: &Database, sale_id: i64, at: DateTime<Utc>) {
        sqlx::query("UPDATE sales SET created_at = ?2 WHERE id = ?1")
            .bind(sale_id)
            .bind(at)
            .execute(db.pool())
            .await
            .unwrap();
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_stock_summary_classification() {
        let db = test_db().await;
        let as_of = ymd(2026, 10, 16);

        add_medicine(&db, "Healthy", "B-1", 50, 100).await;
        add_medicine(&db, "Low", "B-2", 10, 100).await;
        add_medicine(&db, "Empty", "B-3", 0, 100).await;

        let mut expiring = new_medicine("Expiring", "B-4", 40, 100);
        expiring.expiry_date = ymd(2026, 11, 15);
        db.medicines().create(&expiring).await.unwrap();

        let mut expired = new_medicine("Expired", "B-5", 40, 100);
        expired.expiry_date = ymd(2026, 9, 1);
        db.medicines().create(&expired).await.unwrap();

        let gone = add_medicine(&db, "Gone", "B-6", 0, 100).await;
        db.medicines().soft_delete(gone.id).await.unwrap();

        let summary = db.reports().stock_summary(as_of).await.unwrap();
        assert_eq!(summary.total_medicines, 5);
        assert_eq!(summary.low_stock, 2);
        assert_eq!(summary.out_of_stock, 1);
        assert_eq!(summary.expiring_soon, 2);

        let report = db.reports().stock_report().await.unwrap();
        assert_eq!(report[0].name, "Empty");
        assert_eq!(report[0].status, "Out of Stock");
        assert_eq!(report[1].status, "Low Stock");
        assert_eq!(report.last().unwrap().status, "In Stock");
    }

    #[tokio::test]
    async fn test_category_distribution_skips_uncategorized() {
        let db = test_db().await;
        add_medicine(&db, "A", "B-1", 5, 100).await;
        add_medicine(&db, "B", "B-2", 5, 100).await;
        let mut antibiotic = new_medicine("C", "B-3", 5, 100);
        antibiotic.category = Some("Antibiotic".to_string());
        db.medicines().create(&antibiotic).await.unwrap();
        let mut none = new_medicine("D", "B-4", 5, 100);
        none.category = None;
        db.medicines().create(&none).await.unwrap();

        let counts = db.reports().category_distribution().await.unwrap();
        assert_eq!(
            counts,
            vec![
                CategoryCount {
                    category: "Analgesic".to_string(),
                    count: 2
                },
                CategoryCount {
                    category: "Antibiotic".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_top_medicines_excludes_deleted() {
        let db = test_db().await;
        let actor = cashier(&db).await;
        let a = add_medicine(&db, "Paracetamol", "B-1", 100, 100).await;
        let b = add_medicine(&db, "Ibuprofen", "B-2", 100, 100).await;
        let c = add_medicine(&db, "Cetirizine", "B-3", 100, 100).await;

        db.sales().record_sale(&actor, &sale_of(&[(a.id, 2), (b.id, 5)])).await.unwrap();
        db.sales().record_sale(&actor, &sale_of(&[(a.id, 4), (c.id, 9)])).await.unwrap();
        db.medicines().soft_delete(c.id).await.unwrap();

        let top = db.reports().top_medicines(10).await.unwrap();
        assert_eq!(
            top.iter().map(|t| (t.name.as_str(), t.units_sold)).collect::<Vec<_>>(),
            vec![("Paracetamol", 6), ("Ibuprofen", 5)]
        );
        assert_eq!(db.reports().top_medicines(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_daily_series_and_revenue() {
        let db = test_db().await;
        let actor = cashier(&db).await;
        let med = add_medicine(&db, "Paracetamol", "B-1", 100, 250).await;
        let as_of = ymd(2026, 10, 16);

        let s1 = db.sales().record_sale(&actor, &sale_of(&[(med.id, 2)])).await.unwrap();
        let s2 = db.sales().record_sale(&actor, &sale_of(&[(med.id, 1)])).await.unwrap();
        let s3 = db.sales().record_sale(&actor, &sale_of(&[(med.id, 4)])).await.unwrap();
        let old = db.sales().record_sale(&actor, &sale_of(&[(med.id, 1)])).await.unwrap();

        let day = |d: u32, h: u32| ymd(2026, 10, d).and_hms_opt(h, 30, 0).unwrap().and_utc();
        backdate(&db, s1.sale_id, day(16, 9)).await;
        backdate(&db, s2.sale_id, day(16, 23)).await;
        backdate(&db, s3.sale_id, day(12, 0)).await;
        backdate(&db, old.sale_id, day(1, 12)).await;

        let series = db.reports().daily_series(as_of, 7).await.unwrap();
        assert_eq!(series.len(), 7);
        assert_eq!(series[0].label, "10-10");
        assert_eq!(series[2].sales_count, 1);
        assert_eq!(series[2].revenue_cents, 1000);
        assert_eq!(series[6].sales_count, 2);
        assert_eq!(series[6].revenue_cents, 750);
        assert_eq!(series.iter().map(|p| p.sales_count).sum::<i64>(), 3);

        let month = db.reports().daily_series(as_of, 30).await.unwrap();
        assert_eq!(month.iter().map(|p| p.sales_count).sum::<i64>(), 4);

        let range = DateRange::new(Some(ymd(2026, 10, 12)), Some(ymd(2026, 10, 16))).unwrap();
        let revenue = db.reports().revenue(&range).await.unwrap();
        assert_eq!(revenue.sales_count, 3);
        assert_eq!(revenue.revenue_cents, 1750);

        let all = db.reports().revenue(&DateRange::default()).await.unwrap();
        assert_eq!(all.sales_count, 4);

        assert!(db.reports().daily_series(as_of, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_sales_report_rows() {
        let db = test_db().await;
        let actor = cashier(&db).await;
        let a = add_medicine(&db, "Paracetamol", "B-1", 100, 250).await;
        let b = add_medicine(&db, "Ibuprofen", "B-2", 100, 300).await;

        let first = db.sales().record_sale(&actor, &sale_of(&[(a.id, 1)])).await.unwrap();
        let second = db
            .sales()
            .record_sale(&actor, &sale_of(&[(a.id, 1), (b.id, 2)]))
            .await
            .unwrap();

        let rows = db.reports().sales_report(&DateRange::default()).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].invoice_number, second.invoice_number);
        assert_eq!(rows[0].items, 2);
        assert_eq!(rows[0].total_amount_cents, 850);
        assert_eq!(rows[0].customer, "Jane");
        assert_eq!(rows[0].payment_method, PaymentMethod::Card);
        assert_eq!(rows[1].invoice_number, first.invoice_number);
        assert_eq!(rows[1].items, 1);
    }

    #[tokio::test]
    async fn test_dashboard() {
        let db = test_db().await;
        let actor = cashier(&db).await;
        let as_of = Utc::now().date_naive();

        let med = add_medicine(&db, "Paracetamol", "B-1", 12, 500).await;
        for (i, days) in [20_i64, 5, 40, 10, 1, 25, 29].iter().enumerate() {
            let mut input = new_medicine(&format!("Soon {}", i), &format!("S-{}", i), 50, 100);
            input.expiry_date = as_of + Duration::days(*days);
            db.medicines().create(&input).await.unwrap();
        }

        db.sales().record_sale(&actor, &sale_of(&[(med.id, 3)])).await.unwrap();

        let dashboard = db.reports().dashboard(as_of).await.unwrap();
        assert_eq!(dashboard.total_medicines, 8);
        assert_eq!(dashboard.low_stock, 1);
        assert_eq!(dashboard.today_sales, 1);
        assert_eq!(dashboard.today_revenue_cents, 1500);
        assert_eq!(dashboard.expiring_soon.len(), DASHBOARD_EXPIRING_LIMIT as usize);
        assert_eq!(dashboard.expiring_soon[0].expiry_date, as_of + Duration::days(1));
        assert!(dashboard
            .expiring_soon
            .windows(2)
            .all(|w| w[0].expiry_date <= w[1].expiry_date));
    }
}
