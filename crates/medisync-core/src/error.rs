//! # Error Types
//!
//! Domain-specific error types for medisync-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  medisync-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  medisync-db errors (separate crate)                                   │
//! │  └── DbError          - Database failures, wraps CoreError raised      │
//! │                         inside a transaction (Domain variant)          │
//! │                                                                         │
//! │  medisync-server errors                                                │
//! │  └── ApiError         - What HTTP clients see (code + message)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::access::Action;
use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Medicine does not exist or has been deleted.
    #[error("Medicine not found: {0}")]
    MedicineNotFound(i64),

    /// Not enough stock to complete a sale line.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale line: Amoxicillin x 5
    ///      │
    ///      ▼
    /// Conditional decrement touches 0 rows, re-read: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { medicine_id: 7, medicine: "Amoxicillin", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Client highlights the line for medicine 7, nothing was persisted
    /// ```
    #[error("Insufficient stock for {medicine}: available {available}, requested {requested}")]
    InsufficientStock {
        medicine_id: i64,
        medicine: String,
        available: i64,
        requested: i64,
    },

    /// Client-supplied amount disagrees with the server computation.
    #[error("{field} mismatch: claimed {claimed}, computed {computed}")]
    TotalsMismatch {
        field: String,
        claimed: Money,
        computed: Money,
    },

    /// Caller's role (or self-targeting) forbids the action.
    ///
    /// Displays only "Access denied"; `action` is for logs.
    #[error("Access denied")]
    AccessDenied { action: Action },

    /// Unknown username, wrong password, or deactivated account.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Supplier is still referenced by active medicines.
    #[error("Supplier {supplier_id} is still referenced by {medicines} active medicine(s)")]
    SupplierInUse { supplier_id: i64, medicines: i64 },

    /// User has recorded sales and can only be deactivated.
    #[error("User {user_id} has {sales} recorded sale(s); deactivate the account instead")]
    UserHasSales { user_id: i64, sales: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur before any database work starts.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., malformed email, unknown role).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            medicine_id: 7,
            medicine: "Amoxicillin 500mg".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Amoxicillin 500mg: available 3, requested 5"
        );

        let err = CoreError::TotalsMismatch {
            field: "final_amount".to_string(),
            claimed: Money::from_cents(1000),
            computed: Money::from_cents(1099),
        };
        assert_eq!(
            err.to_string(),
            "final_amount mismatch: claimed $10.00, computed $10.99"
        );
    }

    #[test]
    fn test_access_denied_reveals_nothing() {
        let err = CoreError::AccessDenied {
            action: Action::DeleteUser,
        };
        assert_eq!(err.to_string(), "Access denied");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "batch_number".to_string(),
        };
        assert_eq!(err.to_string(), "batch_number is required");

        let err = ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
