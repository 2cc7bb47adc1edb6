//! Supplier endpoints (administrators only).

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::extract::{PathParam, Payload};
use crate::AppState;
use medisync_core::input::NewSupplier;
use medisync_core::{authorize, Action, Supplier};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/suppliers", get(list).post(create))
        .route("/api/suppliers/{id}", get(show).put(update).delete(remove))
}

async fn list(State(state): State<Arc<AppState>>, user: CurrentUser) -> ApiResult<Json<Vec<Supplier>>> {
    authorize(&user.actor(), Action::ListSuppliers)?;
    Ok(Json(state.db.suppliers().list().await?))
}

async fn show(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<Supplier>> {
    authorize(&user.actor(), Action::ViewSupplier)?;
    Ok(Json(state.db.suppliers().get(id).await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Payload(input): Payload<NewSupplier>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    authorize(&user.actor(), Action::CreateSupplier)?;
    let input = input.validated()?;
    let supplier = state.db.suppliers().create(&input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    PathParam(id): PathParam<i64>,
    Payload(input): Payload<NewSupplier>,
) -> ApiResult<Json<Supplier>> {
    authorize(&user.actor(), Action::UpdateSupplier)?;
    let input = input.validated()?;
    Ok(Json(state.db.suppliers().update(id, &input).await?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    PathParam(id): PathParam<i64>,
) -> ApiResult<StatusCode> {
    authorize(&user.actor(), Action::DeleteSupplier)?;
    state.db.suppliers().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
