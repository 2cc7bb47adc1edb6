//! # MediSync Server
//!
//! JSON API for the pharmacy: catalog, point of sale, prescriptions,
//! suppliers, analytics, reports and accounts.
//!
//! ## Request Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Request Pipeline                               │
//! │                                                                         │
//! │  HTTP ──► log_request ──► Router ──► CurrentUser ──► handler ──► JSON   │
//! │           (middleware)    /api/*     (JWT + session)    │               │
//! │                                                         ▼               │
//! │                                              authorize() ─► Database    │
//! │                                                                         │
//! │  Any failure becomes ApiError { code, message, details? }               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod routes;

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response, Router};
use tracing::info;

use crate::auth::JwtManager;
use crate::config::ServerConfig;
use medisync_db::Database;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let jwt = JwtManager::new(&config.jwt_secret, config.session_lifetime_secs);
        AppState { db, jwt, config }
    }
}

/// Builds the full application with state and middleware attached.
pub fn build_router(state: Arc<AppState>) -> Router {
    routes::router()
        .layer(axum::middleware::from_fn(log_request))
        .with_state(state)
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request handled"
    );
    response
}

// =============================================================================
// Unit Tests
// =============================================================================
