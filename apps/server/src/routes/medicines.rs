//! Medicine catalog endpoints.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::extract::{PathParam, Payload};
use crate::AppState;
use medisync_core::input::NewMedicine;
use medisync_core::{authorize, Action, Medicine};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/medicines", get(list).post(create))
        .route("/api/medicines/saleable", get(list_saleable))
        .route("/api/medicines/{id}", get(show).put(update).delete(remove))
}

async fn list(State(state): State<Arc<AppState>>, user: CurrentUser) -> ApiResult<Json<Vec<Medicine>>> {
    authorize(&user.actor(), Action::ListMedicines)?;
    Ok(Json(state.db.medicines().list().await?))
}

/// Medicines with stock on hand, for the sale screen.
async fn list_saleable(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Medicine>>> {
    authorize(&user.actor(), Action::ListSaleableMedicines)?;
    Ok(Json(state.db.medicines().list_saleable().await?))
}

async fn show(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<Medicine>> {
    authorize(&user.actor(), Action::ViewMedicine)?;
    Ok(Json(state.db.medicines().get(id).await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Payload(input): Payload<NewMedicine>,
) -> ApiResult<(StatusCode, Json<Medicine>)> {
    authorize(&user.actor(), Action::CreateMedicine)?;
    let input = input.validated()?;
    let medicine = state.db.medicines().create(&input).await?;
    Ok((StatusCode::CREATED, Json(medicine)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    PathParam(id): PathParam<i64>,
    Payload(input): Payload<NewMedicine>,
) -> ApiResult<Json<Medicine>> {
    authorize(&user.actor(), Action::UpdateMedicine)?;
    let input = input.validated()?;
    Ok(Json(state.db.medicines().update(id, &input).await?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    PathParam(id): PathParam<i64>,
) -> ApiResult<StatusCode> {
    authorize(&user.actor(), Action::DeleteMedicine)?;
    state.db.medicines().soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
