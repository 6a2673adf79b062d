//! arbourne-web library - site backend service
//!
//! HTTP service for the Arbourne Audio marketing site: visitor event
//! ingestion, lead-scoring and traffic read views for the admin dashboard,
//! and the community recommendation board.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod analytics;
pub mod api;
pub mod board;
pub mod clients;

use clients::MetadataProvider;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Upstream music metadata lookups (MusicBrainz + Cover Art Archive)
    pub metadata: Arc<dyn MetadataProvider>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, metadata: Arc<dyn MetadataProvider>) -> Self {
        Self { db, metadata }
    }
}

/// Build application router
///
/// Route groups:
/// - admin: dashboard read views, gated by the admin middleware
/// - public: health, event ingestion, board reads; board writes enforce a
///   session through the `CurrentUser` extractor
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    let admin = Router::new()
        .route("/api/admin/leads", get(api::admin::get_leads))
        .route("/api/admin/stats", get(api::admin::get_stats))
        .route("/api/admin/pages", get(api::admin::get_pages))
        .route("/api/admin/users/:id/intent", get(api::admin::get_user_intent))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::session::require_admin,
        ));

    let public = Router::new()
        .route("/api/events", post(api::events::ingest_event))
        .route("/api/board/vote", post(api::board::submit_vote))
        .route("/api/board/albums", get(api::board::list_albums))
        .route(
            "/api/board/albums/:id/comments",
            get(api::board::list_comments).post(api::board::post_comment),
        )
        .merge(api::health::health_routes());

    Router::new()
        .merge(admin)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
