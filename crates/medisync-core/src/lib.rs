//! # medisync-core: Pure Business Logic for MediSync
//!
//! This crate holds the pharmacy rules of MediSync as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        MediSync Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP Client (browser / POS UI)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    medisync-server (axum)                       │   │
//! │  │    login, medicines, sales, reports, users, export             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ medisync-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │ access  │ │  sale   │ │ report  │  │   │
//! │  │   │Medicine │ │  Money  │ │  gate   │ │ pricing │ │ stock   │  │   │
//! │  │   │  Sale   │ │ (cents) │ │  rules  │ │ totals  │ │ buckets │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  medisync-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (User, Medicine, Sale, Prescription, ...)
//! - [`input`] - Create/update payloads with their validation
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`access`] - The role/action rule table
//! - [`sale`] - Sale request validation, line pricing and header totals
//! - [`report`] - Stock classification and daily revenue bucketing
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validation helpers
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: "today" is always a parameter, never a clock read
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use medisync_core::access::{authorize, Action, Actor};
//! use medisync_core::Role;
//!
//! let cashier = Actor::new(7, Role::Cashier, true);
//! assert!(authorize(&cashier, Action::RecordSale).is_ok());
//! assert!(authorize(&cashier, Action::CreateSupplier).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod error;
pub mod input;
pub mod money;
pub mod report;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use access::{authorize, authorize_on_user, Action, Actor, Module};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Customer name recorded when a sale arrives without one.
pub const WALK_IN_CUSTOMER: &str = "Walk-in Customer";

/// Days ahead of "today" within which a medicine counts as expiring soon.
pub const EXPIRY_HORIZON_DAYS: i64 = 30;

/// Reorder threshold applied when a medicine is created without one.
pub const DEFAULT_MIN_STOCK_LEVEL: i64 = 10;

/// Maximum number of lines in a single sale.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single medicine on one sale line.
///
/// Catches typing 1000 instead of 10 at the till.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// How many best sellers the analytics endpoint returns.
pub const TOP_MEDICINES_LIMIT: u32 = 10;

/// How many soon-to-expire medicines the dashboard lists.
pub const DASHBOARD_EXPIRING_LIMIT: u32 = 5;
