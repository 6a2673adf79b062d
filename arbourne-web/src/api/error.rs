//! API error type and JSON envelope
//!
//! Every handler failure reduces to a status code and an
//! `{"error": "<message>"}` body. Infrastructure failures are logged with
//! context server-side and reported with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// API errors, one variant per HTTP failure class
#[derive(Debug)]
pub enum ApiError {
    /// 400: missing or malformed required fields
    BadRequest(String),
    /// 401: missing/invalid session or insufficient role
    Unauthorized(String),
    /// 404: unknown album, parent comment, user
    NotFound(String),
    /// 409: duplicate vote, closed album
    Conflict(String),
    /// 500: database or upstream provider failure; detail stays in the log
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => msg,
            ApiError::Internal(detail) => {
                error!("internal error: {}", detail);
                "Something went wrong. Please try again.".to_string()
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(format!("database error: {}", e))
    }
}

impl From<arbourne_common::Error> for ApiError {
    fn from(e: arbourne_common::Error) -> Self {
        use arbourne_common::Error;
        match e {
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn common_error_mapping() {
        use arbourne_common::Error;
        assert_eq!(
            ApiError::from(Error::Conflict("dup".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(Error::Upstream("mb down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
