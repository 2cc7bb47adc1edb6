//! Account management (administrators only). Administrators cannot toggle
//! or delete their own account.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::info;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::extract::{PathParam, Payload};
use crate::AppState;
use medisync_core::input::NewUser;
use medisync_core::{authorize, authorize_on_user, Action, User};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(list).post(create))
        .route("/api/users/{id}/toggle", post(toggle))
        .route("/api/users/{id}", delete(remove))
}

async fn list(State(state): State<Arc<AppState>>, user: CurrentUser) -> ApiResult<Json<Vec<User>>> {
    authorize(&user.actor(), Action::ListUsers)?;
    Ok(Json(state.db.users().list().await?))
}

async fn create(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Payload(input): Payload<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    authorize(&user.actor(), Action::CreateUser)?;
    let input = input.validated()?;
    let created = state.db.users().create(&input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Flips the active flag. Deactivation ends the user's open sessions.
async fn toggle(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    PathParam(id): PathParam<i64>,
) -> ApiResult<Json<User>> {
    authorize_on_user(&user.actor(), Action::ToggleUserActive, id)?;

    let toggled = state.db.users().toggle_active(id).await?;
    if !toggled.is_active {
        let revoked = state.db.sessions().revoke_all_for_user(id).await?;
        info!(user_id = id, revoked, "User deactivated");
    }
    Ok(Json(toggled))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    PathParam(id): PathParam<i64>,
) -> ApiResult<StatusCode> {
    authorize_on_user(&user.actor(), Action::DeleteUser, id)?;
    state.db.users().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
