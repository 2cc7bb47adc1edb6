//! # Domain Types
//!
//! Core domain records used throughout MediSync.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Supplier     │1 N│    Medicine     │1 N│    SaleItem     │       │
//! │  │  ─────────────  │──►│  ─────────────  │◄──│  ─────────────  │       │
//! │  │  id             │   │  id             │   │  medicine_id    │       │
//! │  │  name           │   │  batch_number   │   │  medicine_name  │       │
//! │  │  contact info   │   │  quantity ≥ 0   │   │  unit_price     │       │
//! │  └─────────────────┘   │  price_cents    │   │  total_price    │       │
//! │                        │  expiry_date    │   └────────┬────────┘       │
//! │                        └─────────────────┘            │ N (cascade)    │
//! │  ┌─────────────────┐                        ┌────────▼────────┐       │
//! │  │      User       │1                     N │      Sale       │       │
//! │  │  ─────────────  │───────────────────────►│  ─────────────  │       │
//! │  │  role           │       (cashier)        │  invoice_number │       │
//! │  │  is_active      │                        │  totals (cents) │       │
//! │  └─────────────────┘                        └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   Prescription has its own lifecycle; the         │
//! │  │  Prescription   │   medicines it names are free text.               │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Sales carry two identifiers:
//! - `id`: database-assigned integer, used for relations
//! - `invoice_number`: human-facing, unique, printed on invoices

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;
use crate::report::{classify_stock, is_expiring_soon};

// =============================================================================
// Role
// =============================================================================

/// A user's role, which decides module access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "TEXT", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Pharmacist,
    Cashier,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Pharmacist, Role::Cashier];

    /// Stored/serialized form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Pharmacist => "pharmacist",
            Role::Cashier => "cashier",
        }
    }

    /// Name shown in user-management screens.
    pub const fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Pharmacist => "Pharmacist",
            Role::Cashier => "Cashier",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "pharmacist" => Ok(Role::Pharmacist),
            "cashier" => Ok(Role::Cashier),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: Role::ALL.iter().map(|r| r.as_str().to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "TEXT", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Upi,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Stock Status
// =============================================================================

/// Stock level bucket for a medicine.
///
/// Out of stock wins over low stock, so a quantity of zero is never "Low".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
}

impl StockStatus {
    pub const fn label(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "Out of Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::InStock => "In Stock",
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A staff account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

// =============================================================================
// Supplier
// =============================================================================

/// A vendor that medicines are bought from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub payment_terms: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Medicine
// =============================================================================

/// A stocked item.
///
/// `quantity` never goes below zero: the schema has a CHECK constraint and
/// sales decrement it conditionally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Medicine {
    pub id: i64,
    pub name: String,
    pub generic_name: Option<String>,
    pub category: Option<String>,
    /// Supplier lot number, unique among active medicines.
    pub batch_number: String,
    pub quantity: i64,
    pub price_cents: i64,
    pub cost_price_cents: Option<i64>,
    pub expiry_date: NaiveDate,
    pub supplier_id: Option<i64>,
    pub barcode: Option<String>,
    /// Reorder threshold; at or below it the medicine is "Low Stock".
    pub min_stock_level: i64,
    pub is_prescription_required: bool,
    /// False once deleted. Inactive medicines vanish from listings and reports.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medicine {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    pub fn stock_status(&self) -> StockStatus {
        classify_stock(self.quantity, self.min_stock_level)
    }

    pub fn is_expiring_soon(&self, as_of: NaiveDate) -> bool {
        is_expiring_soon(self.expiry_date, as_of)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One completed sale. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    /// Sum of line totals.
    pub total_amount_cents: i64,
    pub discount_cents: i64,
    pub tax_amount_cents: i64,
    /// Always `total - discount + tax`.
    pub final_amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub cashier_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn final_amount(&self) -> Money {
        Money::from_cents(self.final_amount_cents)
    }

    /// Human-readable timestamp shown next to the invoice number.
    pub fn display_date(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M").to_string()
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line of a sale.
/// Uses the snapshot pattern: name and price are frozen at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub medicine_id: i64,
    pub medicine_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

/// A sale with its lines and the cashier's username, as shown on the
/// detail screen and the invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub cashier_username: String,
}

// =============================================================================
// Prescription
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Prescription {
    pub id: i64,
    pub patient_name: String,
    pub patient_age: Option<i64>,
    pub patient_gender: Option<String>,
    pub doctor_name: String,
    pub doctor_license: Option<String>,
    pub diagnosis: Option<String>,
    /// Free text; not linked to any sale.
    pub prescribed_medicines: Option<String>,
    pub date_issued: NaiveDate,
    pub is_fulfilled: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
