//! # Report Module
//!
//! Pure read-side rollups: stock classification, expiry horizon, daily
//! revenue buckets and the row shapes of the report endpoints.
//!
//! The database layer fetches raw rows; everything that depends on "today"
//! happens here with an explicit `as_of` date.
//!
//! ## Daily Buckets
//! ```text
//! as_of = 10-16, days = 7
//!
//!   10-10  10-11  10-12  10-13  10-14  10-15  10-16
//!   ┌────┐ ┌────┐ ┌────┐ ┌────┐ ┌────┐ ┌────┐ ┌────┐
//!   │ 0  │ │ 2  │ │ 0  │ │ 1  │ │ 0  │ │ 4  │ │ 1  │  ← sales_count
//!   └────┘ └────┘ └────┘ └────┘ └────┘ └────┘ └────┘
//!   Oldest first. Days without sales are present with zeros.
//! ```

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{Medicine, PaymentMethod, Sale, StockStatus};
use crate::validation::{validate_date_range, ValidationResult};
use crate::EXPIRY_HORIZON_DAYS;

// =============================================================================
// Stock Classification
// =============================================================================

/// Classifies a stock level. Out of stock takes precedence over low stock.
pub fn classify_stock(quantity: i64, min_stock_level: i64) -> StockStatus {
    if quantity <= 0 {
        StockStatus::OutOfStock
    } else if quantity <= min_stock_level {
        StockStatus::LowStock
    } else {
        StockStatus::InStock
    }
}

/// Last expiry date that still counts as "expiring soon" on `as_of`.
pub fn expiry_horizon(as_of: NaiveDate) -> NaiveDate {
    as_of + Duration::days(EXPIRY_HORIZON_DAYS)
}

/// True if `expiry` falls on or before the horizon. Already expired stock
/// counts too.
pub fn is_expiring_soon(expiry: NaiveDate, as_of: NaiveDate) -> bool {
    expiry <= expiry_horizon(as_of)
}

// =============================================================================
// Date Windows
// =============================================================================

/// An optional inclusive date range from report query strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> ValidationResult<Self> {
        validate_date_range(start_date, end_date)?;
        Ok(Self {
            start_date,
            end_date,
        })
    }

    /// Inclusive lower bound as a timestamp (midnight UTC).
    pub fn start_bound(&self) -> Option<DateTime<Utc>> {
        self.start_date.map(start_of_day)
    }

    /// Exclusive upper bound: midnight after `end_date`.
    pub fn end_bound(&self) -> Option<DateTime<Utc>> {
        self.end_date.map(|d| start_of_day(d + Duration::days(1)))
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// First day of a `days`-long window ending at `as_of`.
pub fn window_start(as_of: NaiveDate, days: u32) -> NaiveDate {
    as_of - Duration::days(i64::from(days.saturating_sub(1)))
}

// =============================================================================
// Daily Series
// =============================================================================

/// One day of the revenue series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    /// `%m-%d`, as shown on chart axes.
    pub label: String,
    pub sales_count: i64,
    pub revenue_cents: i64,
}

/// Buckets `(created_at, final_amount_cents)` rows into one point per day
/// for the `days` days ending at `as_of`. Rows outside the window are
/// ignored.
pub fn bucket_daily(rows: &[(DateTime<Utc>, i64)], as_of: NaiveDate, days: u32) -> Vec<DailyPoint> {
    let start = window_start(as_of, days);

    let mut points: Vec<DailyPoint> = (0..days)
        .map(|offset| {
            let date = start + Duration::days(i64::from(offset));
            DailyPoint {
                date,
                label: date.format("%m-%d").to_string(),
                sales_count: 0,
                revenue_cents: 0,
            }
        })
        .collect();

    for (created_at, cents) in rows {
        let day = created_at.date_naive();
        if day < start || day > as_of {
            continue;
        }
        let index = (day - start).num_days() as usize;
        if let Some(point) = points.get_mut(index) {
            point.sales_count += 1;
            point.revenue_cents += cents;
        }
    }

    points
}

// =============================================================================
// Report Shapes
// =============================================================================

/// Counts over active medicines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSummary {
    pub total_medicines: i64,
    /// quantity <= min_stock_level, out-of-stock included.
    pub low_stock: i64,
    pub out_of_stock: i64,
    pub expiring_soon: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TopMedicine {
    pub medicine_id: i64,
    pub name: String,
    pub units_sold: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

/// Revenue over an inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueSummary {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sales_count: i64,
    pub revenue_cents: i64,
}

/// One row of the sales report and its CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReportRow {
    pub invoice_number: String,
    /// `%Y-%m-%d %H:%M`
    pub date: String,
    pub customer: String,
    pub items: i64,
    pub total_amount_cents: i64,
    pub payment_method: PaymentMethod,
}

impl SalesReportRow {
    pub fn new(sale: &Sale, items: i64) -> Self {
        Self {
            invoice_number: sale.invoice_number.clone(),
            date: sale.display_date(),
            customer: sale.customer_name.clone(),
            items,
            total_amount_cents: sale.final_amount_cents,
            payment_method: sale.payment_method,
        }
    }
}

/// One row of the stock report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReportRow {
    pub medicine_id: i64,
    pub name: String,
    pub generic_name: Option<String>,
    pub batch_number: String,
    pub quantity: i64,
    pub min_stock_level: i64,
    pub price_cents: i64,
    /// `%Y-%m-%d`
    pub expiry_date: String,
    pub status: String,
}

impl From<&Medicine> for StockReportRow {
    fn from(m: &Medicine) -> Self {
        Self {
            medicine_id: m.id,
            name: m.name.clone(),
            generic_name: m.generic_name.clone(),
            batch_number: m.batch_number.clone(),
            quantity: m.quantity,
            min_stock_level: m.min_stock_level,
            price_cents: m.price_cents,
            expiry_date: m.expiry_date.format("%Y-%m-%d").to_string(),
            status: m.stock_status().label().to_string(),
        }
    }
}

/// Landing-page figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub as_of: NaiveDate,
    pub total_medicines: i64,
    pub low_stock: i64,
    pub today_sales: i64,
    pub today_revenue_cents: i64,
    /// Soonest-expiring active medicines within the horizon.
    pub expiring_soon: Vec<Medicine>,
}

/// Rejects a `days` argument outside 1..=366.
pub fn validate_series_days(days: u32) -> ValidationResult<()> {
    if days == 0 || days > 366 {
        return Err(ValidationError::OutOfRange {
            field: "days".to_string(),
            min: 1,
            max: 366,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
