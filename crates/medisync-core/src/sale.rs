//! # Sale Module
//!
//! The pure half of recording a sale: request validation, line pricing,
//! header totals and invoice numbering. The atomic unit of work that
//! touches stock lives in `medisync-db` and calls into these functions.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleRequest (JSON)                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  request.validate()            ← lines, quantities, adjustments         │
//! │       │                                                                 │
//! │  ═════╪═══════════════ BEGIN (medisync-db) ════════════════════════════ │
//! │       │                                                                 │
//! │       ├── for each line: price_line(line, medicine) ← catalog price     │
//! │       │        └── conditional stock decrement (db)                     │
//! │       │                                                                 │
//! │       ├── compute_totals(lines, discount, tax)                          │
//! │       ├── verify_claimed_totals(request, totals)                        │
//! │       ├── invoice_number(date, sale_id)                                 │
//! │       │                                                                 │
//! │  ═════╪═══════════════ COMMIT ═════════════════════════════════════════ │
//! │       ▼                                                                 │
//! │  SaleReceipt                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Medicine, PaymentMethod};
use crate::validation::{
    validate_line_quantity, validate_non_negative, validate_optional_text, ValidationResult,
};
use crate::{MAX_SALE_LINES, WALK_IN_CUSTOMER};

// =============================================================================
// Request
// =============================================================================

/// One requested line of a sale.
///
/// The unit/total prices are optional echoes of what the client showed the
/// customer. When present they must match the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLineRequest {
    pub medicine_id: i64,
    pub quantity: i64,
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
    #[serde(default)]
    pub total_price_cents: Option<i64>,
}

/// A request to record a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRequest {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub items: Vec<SaleLineRequest>,
    #[serde(default)]
    pub discount_cents: i64,
    #[serde(default)]
    pub tax_amount_cents: i64,
    #[serde(default)]
    pub total_amount_cents: Option<i64>,
    #[serde(default)]
    pub final_amount_cents: Option<i64>,
}

impl SaleRequest {
    /// Checks everything that can be checked without the catalog.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            });
        }

        if self.items.len() > MAX_SALE_LINES {
            return Err(ValidationError::OutOfRange {
                field: "items".to_string(),
                min: 1,
                max: MAX_SALE_LINES as i64,
            });
        }

        for line in &self.items {
            if line.medicine_id <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "medicine_id".to_string(),
                });
            }
            validate_line_quantity(line.quantity)?;
        }

        validate_non_negative("discount_cents", self.discount_cents)?;
        validate_non_negative("tax_amount_cents", self.tax_amount_cents)?;
        validate_optional_text("customer_name", self.customer_name.as_deref(), 100)?;
        validate_optional_text("customer_phone", self.customer_phone.as_deref(), 20)?;

        Ok(())
    }

    /// Customer name to record, falling back to the walk-in default.
    pub fn customer_name(&self) -> String {
        match self.customer_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => WALK_IN_CUSTOMER.to_string(),
        }
    }

    pub fn customer_phone(&self) -> Option<String> {
        self.customer_phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
    }
}

// =============================================================================
// Line Pricing
// =============================================================================

/// A line priced from the catalog, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub medicine_id: i64,
    pub medicine_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
}

/// Prices one line from the medicine's current catalog price.
///
/// ## Errors
/// - `TotalsMismatch` if the client sent a unit or line total that differs
/// - `Validation` if the line total does not fit in an `i64` of cents
pub fn price_line(line: &SaleLineRequest, medicine: &Medicine) -> CoreResult<PricedLine> {
    let unit_price = medicine.price();
    let total_price = unit_price
        .checked_mul(line.quantity)
        .ok_or_else(|| amount_overflow("total_price"))?;

    check_claim("unit_price", line.unit_price_cents, unit_price)?;
    check_claim("total_price", line.total_price_cents, total_price)?;

    Ok(PricedLine {
        medicine_id: medicine.id,
        medicine_name: medicine.name.clone(),
        quantity: line.quantity,
        unit_price,
        total_price,
    })
}

fn check_claim(field: &str, claimed: Option<i64>, computed: Money) -> CoreResult<()> {
    match claimed {
        Some(cents) if cents != computed.cents() => Err(CoreError::TotalsMismatch {
            field: field.to_string(),
            claimed: Money::from_cents(cents),
            computed,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Header amounts of a sale. `final_amount = total - discount + tax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaleTotals {
    pub total_amount: Money,
    pub discount: Money,
    pub tax_amount: Money,
    pub final_amount: Money,
}

/// Computes header totals from priced lines.
///
/// ## Example
/// ```rust
/// use medisync_core::money::Money;
/// use medisync_core::sale::{compute_totals, PricedLine};
///
/// let lines = vec![PricedLine {
///     medicine_id: 1,
///     medicine_name: "Paracetamol".into(),
///     quantity: 2,
///     unit_price: Money::from_cents(500),
///     total_price: Money::from_cents(1000),
/// }];
/// let totals = compute_totals(&lines, Money::from_cents(100), Money::from_cents(50)).unwrap();
/// assert_eq!(totals.final_amount.cents(), 950);
/// ```
pub fn compute_totals(lines: &[PricedLine], discount: Money, tax: Money) -> CoreResult<SaleTotals> {
    let total_amount = lines
        .iter()
        .try_fold(Money::zero(), |acc, l| acc.checked_add(l.total_price))
        .ok_or_else(|| amount_overflow("total_amount"))?;
    let before_discount = total_amount
        .checked_add(tax)
        .ok_or_else(|| amount_overflow("tax_amount_cents"))?;
    let final_amount = before_discount
        .checked_sub(discount)
        .ok_or_else(|| amount_overflow("discount_cents"))?;

    if final_amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "discount_cents".to_string(),
            min: 0,
            max: before_discount.cents(),
        }
        .into());
    }

    Ok(SaleTotals {
        total_amount,
        discount,
        tax_amount: tax,
        final_amount,
    })
}

/// Rejects client-claimed header totals that differ from the computed ones.
pub fn verify_claimed_totals(request: &SaleRequest, totals: &SaleTotals) -> CoreResult<()> {
    check_claim("total_amount", request.total_amount_cents, totals.total_amount)?;
    check_claim("final_amount", request.final_amount_cents, totals.final_amount)
}

fn amount_overflow(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

// =============================================================================
// Invoice Numbering
// =============================================================================

/// Formats an invoice number from the sale date and its database id.
///
/// ```rust
/// use chrono::NaiveDate;
/// use medisync_core::sale::invoice_number;
///
/// let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
/// assert_eq!(invoice_number(date, 42), "INV-20261016-000042");
/// ```
pub fn invoice_number(date: NaiveDate, sale_id: i64) -> String {
    format!("INV-{}-{:06}", date.format("%Y%m%d"), sale_id)
}

// =============================================================================
// Receipt
// =============================================================================

/// What a successful sale returns to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleReceipt {
    pub sale_id: i64,
    pub invoice_number: String,
    pub final_amount_cents: i64,
    pub item_count: usize,
}

// =============================================================================
// Unit Tests
// =============================================================================
