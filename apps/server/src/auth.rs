//! # Authentication
//!
//! Bearer tokens are JWTs whose `jti` names a row in the `sessions` table.
//! A token is accepted only while the signature verifies, the session row
//! is live, and the user is still active. Logout deletes the row.
//!
//! ## Request Flow
//! ```text
//! Authorization: Bearer eyJ...
//!      │
//!      ▼
//! extract_bearer_token()          missing/malformed → 401 UNAUTHENTICATED
//!      │
//!      ▼
//! JwtManager::validate()          bad signature/expired → 401
//!      │
//!      ▼
//! sessions.find_live(jti, now)    revoked/expired → 401
//!      │
//!      ▼
//! users.get(sub), is_active?      gone/deactivated → 401
//!      │
//!      ▼
//! CurrentUser { user, session_id } → handler → authorize(&user.actor(), ..)
//! ```

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;
use medisync_core::{Actor, Role, User};
use medisync_db::{DbError, Session};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Role at issue time; informational, the database role is authoritative
    pub role: Role,

    /// JWT ID, equal to the session id
    pub jti: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    /// When a session opened now should end.
    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + chrono::Duration::seconds(self.lifetime_secs)
    }

    /// Signs a token for an opened session.
    pub fn issue(&self, user: &User, session: &Session) -> Result<String, ApiError> {
        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role,
            jti: session.id.clone(),
            iat: session.created_at.timestamp(),
            exp: session.expires_at.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to sign token: {}", e)))
    }

    /// Verifies signature and expiry.
    pub fn validate(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Token rejected");
                ApiError::unauthenticated("Invalid or expired token")
            })
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Extractor
// =============================================================================

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session_id: String,
}

impl CurrentUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.user.id, self.user.role, self.user.is_active)
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthenticated("Authentication required"))?;

        let token = extract_bearer_token(header)
            .ok_or_else(|| ApiError::unauthenticated("Expected a bearer token"))?;

        let claims = state.jwt.validate(token)?;
        let user_id = claims
            .user_id()
            .ok_or_else(|| ApiError::unauthenticated("Invalid or expired token"))?;

        let session = state
            .db
            .sessions()
            .find_live(&claims.jti, Utc::now())
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| ApiError::unauthenticated("Session has ended"))?;

        let user = match state.db.users().get(user_id).await {
            Ok(user) if user.is_active => user,
            Ok(_) | Err(DbError::NotFound { .. }) => {
                return Err(ApiError::unauthenticated("Account is not active"));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(CurrentUser {
            user,
            session_id: session.id,
        })
    }
}
