//! # API Errors
//!
//! Every failure a client can see is an [`ApiError`]: an HTTP status, a
//! stable `SCREAMING_SNAKE` code and a human message.
//!
//! ## Mapping
//! ```text
//! ┌──────────────────────────────────┬───────────────────────┬────────┐
//! │ Source                           │ code                  │ status │
//! ├──────────────────────────────────┼───────────────────────┼────────┤
//! │ ValidationError, bad JSON/query  │ VALIDATION_ERROR      │ 400    │
//! │ missing/expired/revoked token,   │ UNAUTHENTICATED       │ 401    │
//! │   InvalidCredentials             │                       │        │
//! │ CoreError::AccessDenied          │ ACCESS_DENIED         │ 403    │
//! │ DbError::NotFound,               │ NOT_FOUND             │ 404    │
//! │   CoreError::MedicineNotFound    │                       │        │
//! │ DbError::UniqueViolation         │ DUPLICATE_KEY         │ 409    │
//! │ CoreError::InsufficientStock     │ INSUFFICIENT_STOCK    │ 409    │
//! │ SupplierInUse, UserHasSales,     │ CONFLICT              │ 409    │
//! │   ForeignKeyViolation            │                       │        │
//! │ CoreError::TotalsMismatch        │ TOTALS_MISMATCH       │ 422    │
//! │ any other DbError                │ DATABASE_ERROR        │ 500    │
//! │ token signing, export rendering  │ INTERNAL              │ 500    │
//! └──────────────────────────────────┴───────────────────────┴────────┘
//! ```
//!
//! 5xx details are logged with `tracing::error!` and replaced by a generic
//! message in the response body.
//!
//! Sale line failures (`INSUFFICIENT_STOCK`, and `NOT_FOUND` for an unknown
//! medicine) also carry a `details` object naming the medicine id, so the
//! client can mark the offending line even when two batches share a name:
//!
//! ```text
//! {"code": "INSUFFICIENT_STOCK", "message": "...",
//!  "details": {"medicine_id": 7, "available": 3, "requested": 5}}
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use medisync_core::{CoreError, ValidationError};
use medisync_db::DbError;

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned by every handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Option<ErrorDetails>,
}

/// Machine-readable context for a failed sale line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub medicine_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested: Option<i64>,
}

/// JSON body of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", message)
    }

    pub fn access_denied() -> Self {
        Self::new(StatusCode::FORBIDDEN, "ACCESS_DENIED", "Access denied")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "DUPLICATE_KEY", message)
    }

    pub fn insufficient_stock(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "INSUFFICIENT_STOCK", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "CONFLICT", message)
    }

    pub fn totals_mismatch(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "TOTALS_MISMATCH", message)
    }

    /// Logs the cause and hides it from the client.
    pub fn database(cause: impl std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "Database error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "DATABASE_ERROR",
            "A database error occurred",
        )
    }

    /// Logs the cause and hides it from the client.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "Internal error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL",
            "An internal error occurred",
        )
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code.to_string(),
            message: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MedicineNotFound(medicine_id) => {
                ApiError::not_found(err.to_string()).with_details(ErrorDetails {
                    medicine_id,
                    available: None,
                    requested: None,
                })
            }
            CoreError::InsufficientStock {
                medicine_id,
                available,
                requested,
                ..
            } => ApiError::insufficient_stock(err.to_string()).with_details(ErrorDetails {
                medicine_id,
                available: Some(available),
                requested: Some(requested),
            }),
            CoreError::TotalsMismatch { .. } => ApiError::totals_mismatch(err.to_string()),
            CoreError::AccessDenied { action } => {
                tracing::warn!(?action, "Access denied");
                ApiError::access_denied()
            }
            CoreError::InvalidCredentials => ApiError::unauthenticated(err.to_string()),
            CoreError::SupplierInUse { .. } | CoreError::UserHasSales { .. } => {
                ApiError::conflict(err.to_string())
            }
            CoreError::Validation(inner) => inner.into(),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { .. } => ApiError::not_found(err.to_string()),
            DbError::UniqueViolation { .. } => ApiError::duplicate(err.to_string()),
            DbError::ForeignKeyViolation { .. } => ApiError::conflict(err.to_string()),
            other => ApiError::database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medisync_core::{Action, Money};

    #[test]
    fn test_core_error_mapping() {
        let err: ApiError = CoreError::InsufficientStock {
            medicine_id: 7,
            medicine: "Amoxicillin".to_string(),
            available: 3,
            requested: 5,
        }
        .into();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "INSUFFICIENT_STOCK");
        assert!(err.message.contains("Amoxicillin"));
        assert_eq!(
            err.details,
            Some(ErrorDetails {
                medicine_id: 7,
                available: Some(3),
                requested: Some(5),
            })
        );

        let err: ApiError = CoreError::AccessDenied {
            action: Action::DeleteUser,
        }
        .into();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, "Access denied");

        let err: ApiError = CoreError::TotalsMismatch {
            field: "final_amount".to_string(),
            claimed: Money::from_cents(900),
            computed: Money::from_cents(1000),
        }
        .into();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

        let err: ApiError = CoreError::MedicineNotFound(4).into();
        assert_eq!(err.code, "NOT_FOUND");
        assert_eq!(err.details.map(|d| d.medicine_id), Some(4));
    }

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::duplicate("batch_number", "PCM-1").into();
        assert_eq!(err.code, "DUPLICATE_KEY");
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err: ApiError = DbError::not_found("Supplier", 9).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.details, None);

        let err: ApiError = DbError::QueryFailed("disk I/O error".to_string()).into();
        assert_eq!(err.code, "DATABASE_ERROR");
        assert!(!err.message.contains("disk"));

        let err: ApiError = DbError::Domain(CoreError::UserHasSales {
            user_id: 2,
            sales: 4,
        })
        .into();
        assert_eq!(err.code, "CONFLICT");
    }
}
