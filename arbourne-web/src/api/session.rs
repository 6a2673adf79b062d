//! Session resolution and admin gating
//!
//! The `session` cookie carries an opaque random token; identity is resolved
//! server-side against the `sessions` table. Nothing is ever parsed out of
//! the cookie value itself.
//!
//! Admin access requires the `admin` role or membership of a small static
//! email allowlist (founder accounts predating the role column).

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::warn;

use arbourne_common::db::models::Role;
use arbourne_common::session::is_well_formed_token;

use crate::api::ApiError;
use crate::AppState;

/// Founder accounts with dashboard access regardless of role
const ADMIN_ALLOWLIST: [&str; 2] = ["nico@arbourne.audio", "workshop@arbourne.audio"];

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// The authenticated user behind a request, resolved from the session cookie
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin || ADMIN_ALLOWLIST.contains(&self.email.as_str())
    }
}

/// Extract the session token from the Cookie header, if present
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        let pair = pair.trim();
        if let Some(value) = pair.strip_prefix("session=") {
            return Some(value.to_string());
        }
    }
    None
}

/// Resolve a token to its user. Expired sessions and unknown tokens both
/// resolve to `None`.
pub async fn resolve_user(db: &SqlitePool, token: &str) -> Result<Option<CurrentUser>, sqlx::Error> {
    if !is_well_formed_token(token) {
        return Ok(None);
    }

    let row: Option<(String, String, String, String, chrono::DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT u.id, u.email, u.display_name, u.role, s.expires_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = ?
        "#,
    )
    .bind(token)
    .fetch_optional(db)
    .await?;

    let Some((id, email, display_name, role, expires_at)) = row else {
        return Ok(None);
    };

    if expires_at <= Utc::now() {
        return Ok(None);
    }

    Ok(Some(CurrentUser {
        id,
        email,
        display_name,
        role: Role::parse(&role).unwrap_or(Role::Member),
    }))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Not signed in".to_string()))?;

        resolve_user(&state.db, &token)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Session is invalid or expired".to_string()))
    }
}

/// A session that may or may not be present. Never rejects: a missing or
/// stale cookie yields `None` so tracking calls keep working for anonymous
/// visitors.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Ok(MaybeUser(None));
        };
        let user = resolve_user(&state.db, &token).await?;
        Ok(MaybeUser(user))
    }
}

/// Admin gate middleware for the dashboard read views.
///
/// 401 for a missing/invalid session and for a valid session belonging to a
/// non-admin, non-allowlisted user.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(request.headers())
        .ok_or_else(|| ApiError::Unauthorized("Not signed in".to_string()))?;

    let user = resolve_user(&state.db, &token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Session is invalid or expired".to_string()))?;

    if !user.is_admin() {
        warn!(user_id = %user.id, "non-admin attempted dashboard access");
        return Err(ApiError::Unauthorized("Admin access required".to_string()));
    }

    Ok(next.run(request).await)
}
