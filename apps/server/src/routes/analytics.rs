//! Chart data for the analytics screen. Every series ends today (UTC).

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use super::today;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;
use medisync_core::report::{CategoryCount, DailyPoint, StockSummary, TopMedicine};
use medisync_core::{authorize, Action, TOP_MEDICINES_LIMIT};

const REVENUE_DAYS: u32 = 7;
const SALES_DAYS: u32 = 30;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/analytics/daily-revenue", get(daily_revenue))
        .route("/api/analytics/top-medicines", get(top_medicines))
        .route("/api/analytics/sales-data", get(sales_data))
        .route("/api/analytics/stock-data", get(stock_data))
        .route("/api/analytics/category-data", get(category_data))
}

async fn daily_revenue(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<DailyPoint>>> {
    authorize(&user.actor(), Action::ViewAnalytics)?;
    Ok(Json(state.db.reports().daily_series(today(), REVENUE_DAYS).await?))
}

async fn top_medicines(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<TopMedicine>>> {
    authorize(&user.actor(), Action::ViewAnalytics)?;
    Ok(Json(state.db.reports().top_medicines(TOP_MEDICINES_LIMIT).await?))
}

async fn sales_data(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<DailyPoint>>> {
    authorize(&user.actor(), Action::ViewAnalytics)?;
    Ok(Json(state.db.reports().daily_series(today(), SALES_DAYS).await?))
}

async fn stock_data(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> ApiResult<Json<StockSummary>> {
    authorize(&user.actor(), Action::ViewAnalytics)?;
    Ok(Json(state.db.reports().stock_summary(today()).await?))
}

async fn category_data(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<CategoryCount>>> {
    authorize(&user.actor(), Action::ViewAnalytics)?;
    Ok(Json(state.db.reports().category_distribution().await?))
}
