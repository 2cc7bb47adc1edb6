//! Tabular reports and the sales CSV export.

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use super::{today, RangeQuery};
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::export::sales_report_csv;
use crate::extract::QueryParams;
use crate::AppState;
use medisync_core::report::{RevenueSummary, SalesReportRow, StockReportRow};
use medisync_core::{authorize, Action};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/reports/sales", get(sales))
        .route("/api/reports/sales/export", get(export_sales))
        .route("/api/reports/stock", get(stock))
        .route("/api/reports/revenue", get(revenue))
}

async fn sales(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    QueryParams(query): QueryParams<RangeQuery>,
) -> ApiResult<Json<Vec<SalesReportRow>>> {
    authorize(&user.actor(), Action::ViewReports)?;
    let range = query.into_range()?;
    Ok(Json(state.db.reports().sales_report(&range).await?))
}

async fn stock(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<StockReportRow>>> {
    authorize(&user.actor(), Action::ViewReports)?;
    Ok(Json(state.db.reports().stock_report().await?))
}

async fn revenue(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    QueryParams(query): QueryParams<RangeQuery>,
) -> ApiResult<Json<RevenueSummary>> {
    authorize(&user.actor(), Action::ViewReports)?;
    let range = query.into_range()?;
    Ok(Json(state.db.reports().revenue(&range).await?))
}

/// `sales_report_YYYYMMDD.csv` over the same optional range as the report.
async fn export_sales(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    QueryParams(query): QueryParams<RangeQuery>,
) -> ApiResult<impl IntoResponse> {
    authorize(&user.actor(), Action::ExportReports)?;
    let range = query.into_range()?;

    let rows = state.db.reports().sales_report(&range).await?;
    let csv = sales_report_csv(&rows)?;
    let disposition = format!(
        "attachment; filename=\"sales_report_{}.csv\"",
        today().format("%Y%m%d")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}
