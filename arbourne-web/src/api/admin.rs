//! Admin analytics endpoints
//!
//! All routes in this group sit behind the admin gate in `api::session`.
//! Each takes an optional `?range=` lookback (7d, 30d, 1y), defaulting to
//! 30 days.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::analytics::timerange::Lookback;
use crate::analytics::{intent, leads, stats};
use crate::api::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub range: Option<String>,
}

impl RangeParams {
    fn lookback(&self) -> Result<Lookback, ApiError> {
        match self.range.as_deref() {
            Some(s) => Ok(Lookback::parse(s)?),
            None => Ok(Lookback::default()),
        }
    }
}

/// GET /api/admin/leads
pub async fn get_leads(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Value>, ApiError> {
    let cutoff = params.lookback()?.cutoff(Utc::now());
    let leads = leads::compute_leads(&state.db, cutoff).await?;
    Ok(Json(json!({ "leads": leads })))
}

/// GET /api/admin/stats
pub async fn get_stats(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Value>, ApiError> {
    let cutoff = params.lookback()?.cutoff(Utc::now());
    let site = stats::compute_site_stats(&state.db, cutoff).await?;
    Ok(Json(json!(site)))
}

/// GET /api/admin/pages
pub async fn get_pages(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Value>, ApiError> {
    let cutoff = params.lookback()?.cutoff(Utc::now());
    let pages = stats::compute_page_stats(&state.db, cutoff).await?;
    Ok(Json(json!(pages)))
}

/// GET /api/admin/users/:id/intent
pub async fn get_user_intent(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Value>, ApiError> {
    let cutoff = params.lookback()?.cutoff(Utc::now());
    let profile = intent::compute_user_intent(&state.db, &user_id, cutoff).await?;
    Ok(Json(json!(profile)))
}
