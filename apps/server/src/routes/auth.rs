//! Login, logout and the caller's own profile.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::extract::Payload;
use crate::AppState;
use medisync_core::input::ProfileUpdate;
use medisync_core::{authorize, authorize_on_user, Action, User, ValidationError};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/auth/profile", put(update_profile))
}

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

async fn login(
    State(state): State<Arc<AppState>>,
    Payload(req): Payload<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    if req.username.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        }
        .into());
    }
    if req.password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        }
        .into());
    }

    let user = state.db.users().authenticate(&req.username, &req.password).await?;

    let now = Utc::now();
    let purged = state.db.sessions().purge_expired(now).await?;
    if purged > 0 {
        debug!(purged, "Expired sessions purged");
    }

    let session = state
        .db
        .sessions()
        .create(user.id, state.jwt.expiry_from(now))
        .await?;
    let token = state.jwt.issue(&user, &session)?;

    info!(user_id = user.id, role = %user.role, "User logged in");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_at: session.expires_at,
        user,
    }))
}

async fn logout(State(state): State<Arc<AppState>>, user: CurrentUser) -> ApiResult<StatusCode> {
    state.db.sessions().revoke(&user.session_id).await?;
    info!(user_id = user.user.id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

async fn me(user: CurrentUser) -> ApiResult<Json<User>> {
    authorize(&user.actor(), Action::ViewOwnProfile)?;
    Ok(Json(user.user))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Payload(update): Payload<ProfileUpdate>,
) -> ApiResult<Json<User>> {
    let actor = user.actor();
    authorize_on_user(&actor, Action::UpdateOwnProfile, actor.user_id)?;

    let update = update.validated()?;
    let updated = state.db.users().update_profile(actor.user_id, &update).await?;
    Ok(Json(updated))
}
