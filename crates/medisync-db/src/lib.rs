//! # medisync-db: Database Layer for MediSync
//!
//! This crate provides database access for the MediSync pharmacy system.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        MediSync Data Flow                               │
//! │                                                                         │
//! │  axum handler (POST /api/sales)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     medisync-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (sale.rs ...) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │    │ MedicineRepo  │    │ 001_initial_ │  │   │
//! │  │   │ WAL, FKs on   │◄───│ SaleRepo      │    │   schema.sql │  │   │
//! │  │   │ busy_timeout  │    │ ReportRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (medisync.db)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (medicine, sale, etc.)
//! - [`credentials`] - Password hashing
//! - [`seed`] - Default admin and supplier on first start
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medisync_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("medisync.db")).await?;
//! medisync_db::seed::ensure_defaults(&db).await?;
//!
//! let saleable = db.medicines().list_saleable().await?;
//! let receipt = db.sales().record_sale(&actor, &request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod credentials;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::medicine::MedicineRepository;
pub use repository::prescription::PrescriptionRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::SaleRepository;
pub use repository::session::{Session, SessionRepository};
pub use repository::supplier::SupplierRepository;
pub use repository::user::UserRepository;
