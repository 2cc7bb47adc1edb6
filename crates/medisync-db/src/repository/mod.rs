//! # Repository Module
//!
//! Database repository implementations for MediSync.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                           │
//! │       │                                                                 │
//! │       │  db.medicines().get(id)                                         │
//! │       ▼                                                                 │
//! │  MedicineRepository                                                     │
//! │  ├── list / list_saleable / get                                         │
//! │  ├── create / update                                                    │
//! │  └── soft_delete                                                        │
//! │       │                                                                 │
//! │       │  SQL (sqlx::query_as + bind)                                    │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`] - Accounts, login lookup, activation
//! - [`SessionRepository`] - Issued bearer-token sessions
//! - [`SupplierRepository`] - Supplier CRUD with restrict-on-delete
//! - [`MedicineRepository`] - Medicine CRUD and soft delete
//! - [`SaleRepository`] - The sale transaction and sale reads
//! - [`PrescriptionRepository`] - Prescriptions and fulfilment
//! - [`ReportRepository`] - Read-only rollups for dashboard/analytics/reports

pub mod medicine;
pub mod prescription;
pub mod report;
pub mod sale;
pub mod session;
pub mod supplier;
pub mod user;

pub use medicine::MedicineRepository;
pub use prescription::PrescriptionRepository;
pub use report::ReportRepository;
pub use sale::SaleRepository;
pub use session::SessionRepository;
pub use supplier::SupplierRepository;
pub use user::UserRepository;

/// Shared fixtures for repository tests.
#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use medisync_core::input::{NewMedicine, NewSupplier, NewUser};
    use medisync_core::{Medicine, Role, User};

    use crate::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn new_medicine(name: &str, batch: &str, quantity: i64, price_cents: i64) -> NewMedicine {
        NewMedicine {
            name: name.to_string(),
            generic_name: None,
            category: Some("Analgesic".to_string()),
            batch_number: batch.to_string(),
            quantity,
            price_cents,
            cost_price_cents: None,
            expiry_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            supplier_id: None,
            barcode: None,
            min_stock_level: 10,
            is_prescription_required: false,
        }
    }

    pub async fn add_medicine(
        db: &Database,
        name: &str,
        batch: &str,
        quantity: i64,
        price_cents: i64,
    ) -> Medicine {
        db.medicines()
            .create(&new_medicine(name, batch, quantity, price_cents))
            .await
            .unwrap()
    }

    pub async fn add_user(db: &Database, username: &str, role: Role) -> User {
        db.users()
            .create(&NewUser {
                username: username.to_string(),
                email: format!("{}@medisync.com", username),
                password: "password1".to_string(),
                role,
            })
            .await
            .unwrap()
    }

    pub fn new_supplier(name: &str) -> NewSupplier {
        NewSupplier {
            name: name.to_string(),
            ..Default::default()
        }
    }
}
