use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::extract::{PathParam, Payload};
use crate::AppState;
use medisync_core::input::NewPrescription;
use medisync_core::{authorize, Action, Prescription};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/prescriptions", get(list).post(create))
        .route("/api/prescriptions/{id}/fulfill", post(fulfill))
}

async fn list(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Prescription>>> {
    authorize(&user.actor(), Action::ListPrescriptions)?;
    Ok(Json(state.db.prescriptions().list().await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Payload(input): Payload<NewPrescription>,
) -> ApiResult<(StatusCode, Json<Prescription>)> {
    authorize(&user.actor(), Action::CreatePrescription)?;
    let input = input.validated()?;
    let prescription = state.db.prescriptions().create(&input).await?;
    Ok((StatusCode::CREATED, Json(prescription)))
}

async fn fulfill(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<Prescription>> {
    authorize(&user.actor(), Action::FulfillPrescription)?;
    Ok(Json(state.db.prescriptions().fulfill(id).await?))
}
