//! # Validation Module
//!
//! Field-level validation helpers for MediSync payloads.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (axum Json)                                   │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: input / sale modules                                         │
//! │  └── THIS MODULE: field rules (required, length, range, format)        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0, final = total - discount + tax)             │
//! │  ├── UNIQUE (username, email, active batch_number, invoice)            │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use medisync_core::validation::{validate_batch_number, validate_line_quantity};
//!
//! assert!(validate_batch_number("AMX-2026-01").is_ok());
//! assert!(validate_line_quantity(5).is_ok());
//! assert!(validate_line_quantity(0).is_err());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::MAX_LINE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required text field and returns it trimmed.
///
/// ## Example
/// ```rust
/// use medisync_core::validation::validate_required_text;
///
/// assert_eq!(validate_required_text("name", "  Ibuprofen ", 200).unwrap(), "Ibuprofen");
/// assert!(validate_required_text("name", "   ", 200).is_err());
/// ```
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    check_length(field, value, max)?;
    Ok(value.to_string())
}

/// Validates an optional text field.
///
/// Blank input collapses to `None` so the column stores NULL rather than "".
pub fn validate_optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> ValidationResult<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => {
            check_length(field, v, max)?;
            Ok(Some(v.to_string()))
        }
    }
}

fn check_length(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Validates a batch (lot) number.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens, underscores and slashes only
pub fn validate_batch_number(batch: &str) -> ValidationResult<String> {
    let batch = validate_required_text("batch_number", batch, 50)?;

    if !batch
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '/')
    {
        return Err(ValidationError::InvalidFormat {
            field: "batch_number".to_string(),
            reason: "must contain only letters, numbers, hyphens, underscores, and slashes"
                .to_string(),
        });
    }

    Ok(batch)
}

/// Validates a login name.
///
/// ## Rules
/// - 3 to 80 characters
/// - Letters, digits, `.`, `_` and `-`
pub fn validate_username(username: &str) -> ValidationResult<String> {
    let username = validate_required_text("username", username, 80)?;

    if username.chars().count() < 3 {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must be at least 3 characters".to_string(),
        });
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '_' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, dots, underscores, and hyphens"
                .to_string(),
        });
    }

    Ok(username)
}

/// Validates an email address and returns it trimmed and lowercased.
///
/// Only the shape is checked: one `@`, a non-empty local part and a dotted
/// domain.
///
/// ## Example
/// ```rust
/// use medisync_core::validation::validate_email;
///
/// assert_eq!(validate_email("email", "Admin@MediSync.com").unwrap(), "admin@medisync.com");
/// assert!(validate_email("email", "not-an-email").is_err());
/// ```
pub fn validate_email(field: &str, email: &str) -> ValidationResult<String> {
    let email = validate_required_text(field, email, 120)?.to_lowercase();

    let invalid = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid email address".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }

    Ok(email)
}

/// Validates a plaintext password before hashing.
///
/// ## Rules
/// - 6 to 128 characters
pub fn validate_password(password: &str) -> ValidationResult<()> {
    let len = password.chars().count();

    if len == 0 {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if len < 6 {
        return Err(ValidationError::InvalidFormat {
            field: "password".to_string(),
            reason: "must be at least 6 characters".to_string(),
        });
    }

    check_length("password", password, 128)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the quantity of one sale line.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Sale screen: Add Line                                                  │
/// │                                                                         │
/// │  Cashier enters quantity: 5                                            │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_line_quantity(5) ← THIS FUNCTION                             │
/// │       │                                                                 │
/// │       ├── qty <= 0?  → Error: "quantity must be positive"              │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       │                                                                 │
/// │       └── OK → line is priced inside the sale transaction              │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_line_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a value that may be zero but never negative
/// (stock quantity, prices, discounts, tax).
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an inclusive numeric range.
pub fn validate_range(field: &str, value: i64, min: i64, max: i64) -> ValidationResult<()> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates that a report window is not inverted.
pub fn validate_date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ValidationResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(ValidationError::InvalidFormat {
                field: "start_date".to_string(),
                reason: "must not be after end_date".to_string(),
            });
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
