//! HTTP surface of the recommendation board

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::session::CurrentUser;
use crate::api::ApiError;
use crate::board::{self, CommentSort};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VoteRequest {
    pub music_brainz_release_group_id: String,
    pub comment: String,
}

/// POST /api/board/vote
pub async fn submit_vote(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<VoteRequest>,
) -> Result<Json<Value>, ApiError> {
    let album = board::submit_vote(
        &state.db,
        state.metadata.as_ref(),
        &user.id,
        &req.music_brainz_release_group_id,
        &req.comment,
        Utc::now(),
    )
    .await?;

    Ok(Json(json!({ "success": true, "album": album })))
}

/// GET /api/board/albums
pub async fn list_albums(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let albums = board::list_albums(&state.db).await?;
    Ok(Json(json!({ "albums": albums })))
}

#[derive(Debug, Deserialize)]
pub struct CommentListParams {
    pub sort: Option<String>,
}

/// GET /api/board/albums/:id/comments
pub async fn list_comments(
    State(state): State<AppState>,
    Path(album_id): Path<String>,
    Query(params): Query<CommentListParams>,
) -> Result<Json<Value>, ApiError> {
    let sort = match params.sort.as_deref() {
        Some(s) => CommentSort::parse(s)?,
        None => CommentSort::Newest,
    };
    let comments = board::list_comments(&state.db, &album_id, sort).await?;
    Ok(Json(json!({ "comments": comments })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommentRequest {
    pub content: String,
    pub parent_id: Option<String>,
}

/// POST /api/board/albums/:id/comments
pub async fn post_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(album_id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Result<Json<Value>, ApiError> {
    let comment = board::add_comment(
        &state.db,
        &album_id,
        &user.id,
        req.parent_id.as_deref(),
        &req.content,
        Utc::now(),
    )
    .await?;

    Ok(Json(json!({ "success": true, "comment": comment })))
}
