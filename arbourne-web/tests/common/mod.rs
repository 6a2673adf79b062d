//! Shared fixtures for the HTTP integration tests

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use chrono::{Duration, Utc};
use serde_json::Value;
use sqlx::SqlitePool;

use arbourne_common::db::init::init_memory_database;
use arbourne_common::session::generate_token;
use arbourne_web::clients::{MetadataProvider, ReleaseGroupInfo};
use arbourne_web::{build_router, AppState};

/// Canned metadata responses keyed by release group MBID
pub struct StubMetadata {
    albums: HashMap<String, ReleaseGroupInfo>,
}

impl StubMetadata {
    pub fn new() -> Self {
        Self {
            albums: HashMap::new(),
        }
    }

    pub fn album(mut self, mbid: &str, title: &str, artist: &str) -> Self {
        self.albums.insert(
            mbid.to_string(),
            ReleaseGroupInfo {
                mbid: mbid.to_string(),
                title: title.to_string(),
                artist: artist.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl MetadataProvider for StubMetadata {
    async fn lookup_release_group(
        &self,
        mbid: &str,
    ) -> arbourne_common::Result<Option<ReleaseGroupInfo>> {
        Ok(self.albums.get(mbid).cloned())
    }

    async fn lookup_cover_url(&self, _mbid: &str) -> arbourne_common::Result<Option<String>> {
        Ok(Some("https://coverartarchive.org/front-250.jpg".to_string()))
    }
}

/// In-memory database plus a router wired to the stub metadata provider
pub async fn setup_app(metadata: StubMetadata) -> (axum::Router, SqlitePool) {
    let pool = init_memory_database()
        .await
        .expect("Should open in-memory database");
    let state = AppState::new(pool.clone(), Arc::new(metadata));
    (build_router(state), pool)
}

/// Insert a user row and return its id
pub async fn seed_user(pool: &SqlitePool, id: &str, email: &str, role: &str) {
    sqlx::query(
        "INSERT INTO users (id, email, display_name, role, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(email)
    .bind(id)
    .bind(role)
    .bind(Utc::now())
    .execute(pool)
    .await
    .expect("Should insert user");
}

/// Insert a session for a user, expiring `ttl_hours` from now (negative for
/// an already-expired session). Returns the token.
pub async fn seed_session(pool: &SqlitePool, user_id: &str, ttl_hours: i64) -> String {
    let token = generate_token();
    sqlx::query("INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)")
        .bind(&token)
        .bind(user_id)
        .bind(Utc::now())
        .bind(Utc::now() + Duration::hours(ttl_hours))
        .execute(pool)
        .await
        .expect("Should insert session");
    token
}

/// Insert an event row directly, `days_ago` in the past
pub async fn seed_event(
    pool: &SqlitePool,
    user_id: Option<&str>,
    event_type: &str,
    event_data: Option<&str>,
    days_ago: i64,
) {
    sqlx::query(
        "INSERT INTO user_events (id, user_id, event_type, event_data, path, session_id, timestamp)
         VALUES (?, ?, ?, ?, '/', 'sess-seed', ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(event_type)
    .bind(event_data)
    .bind(Utc::now() - Duration::days(days_ago))
    .execute(pool)
    .await
    .expect("Should insert event");
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("session={}", token));
    }
    builder.body(Body::empty()).expect("Should build request")
}

pub fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("session={}", token));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("Should build request")
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
