//! # Routes
//!
//! One module per screen of the application. Every handler follows the
//! same shape:
//!
//! ```text
//! CurrentUser (401 if absent) ─► authorize(&actor, Action::X) (403)
//!                             ─► validate payload (400)
//!                             ─► state.db.<repo>().<op>() (404/409/422/500)
//!                             ─► Json / file response
//! ```

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::AppState;
use medisync_core::report::DateRange;
use medisync_core::ValidationError;

pub mod analytics;
pub mod auth;
pub mod dashboard;
pub mod medicines;
pub mod prescriptions;
pub mod reports;
pub mod sales;
pub mod suppliers;
pub mod users;

/// All routes, without state.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(dashboard::routes())
        .merge(medicines::routes())
        .merge(suppliers::routes())
        .merge(sales::routes())
        .merge(prescriptions::routes())
        .merge(analytics::routes())
        .merge(reports::routes())
        .merge(users::routes())
}

/// The date handlers treat as "today".
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: bool,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = state.db.health_check().await;
    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            database,
        }),
    )
}

// =============================================================================
// Date Range Query
// =============================================================================

/// `?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD`; blank values mean
/// unbounded, as report forms submit them.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl RangeQuery {
    pub fn into_range(self) -> Result<DateRange, ValidationError> {
        let start = parse_date("start_date", self.start_date.as_deref())?;
        let end = parse_date("end_date", self.end_date.as_deref())?;
        DateRange::new(start, end)
    }
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "expected YYYY-MM-DD".to_string(),
            }),
    }
}
