use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use super::today;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::AppState;
use medisync_core::report::Dashboard;
use medisync_core::{authorize, Action};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/dashboard", get(dashboard))
}

async fn dashboard(State(state): State<Arc<AppState>>, user: CurrentUser) -> ApiResult<Json<Dashboard>> {
    authorize(&user.actor(), Action::ViewDashboard)?;
    Ok(Json(state.db.reports().dashboard(today()).await?))
}
