//! Visitor event ingestion
//!
//! One row per tracked interaction. The client swallows failures so
//! analytics never breaks a page; server-side, validation failures are 400
//! and infrastructure failures are 500, with no dedup and no batching.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use arbourne_common::events::{EventPayload, EventType};

use crate::api::session::MaybeUser;
use crate::api::ApiError;
use crate::AppState;

/// Ingestion request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub event_type: String,
    pub event_data: Option<Value>,
    pub path: String,
    pub session_id: String,
    pub referrer: Option<String>,
}

/// POST /api/events
///
/// Persists one interaction event, linked to the signed-in user when a valid
/// session cookie accompanies the call.
pub async fn ingest_event(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let request: IngestRequest = serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid event: {}", e)))?;

    if request.path.is_empty() {
        return Err(ApiError::BadRequest("path is required".to_string()));
    }
    if request.session_id.is_empty() {
        return Err(ApiError::BadRequest("sessionId is required".to_string()));
    }

    let event_type = EventType::parse(&request.event_type).ok_or_else(|| {
        ApiError::BadRequest(format!("Unknown event type: {}", request.event_type))
    })?;

    let payload = EventPayload::parse(event_type, request.event_data.as_ref())?;
    let event_data = payload.to_json().map(|v| v.to_string());

    sqlx::query(
        r#"
        INSERT INTO user_events (id, user_id, event_type, event_data, path, session_id, referrer, timestamp)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user.map(|u| u.id))
    .bind(event_type.as_str())
    .bind(event_data)
    .bind(&request.path)
    .bind(&request.session_id)
    .bind(&request.referrer)
    .bind(Utc::now())
    .execute(&state.db)
    .await?;

    Ok(Json(json!({ "success": true })))
}
