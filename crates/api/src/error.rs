//! API error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use session::SessionError;
use thiserror::Error;
use tracing::error;

/// Errors returned by the HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A batch stopped at an invalid sample; earlier samples were ingested
    #[error("Sample {accepted} of the batch rejected: {source}")]
    BatchRejected {
        accepted: usize,
        #[source]
        source: SessionError,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    /// Samples of a batch ingested before the failing one
    #[serde(skip_serializing_if = "Option::is_none")]
    accepted: Option<usize>,
}

fn session_status(err: &SessionError) -> (StatusCode, &'static str) {
    match err {
        SessionError::InvalidSample(_) => (StatusCode::BAD_REQUEST, "invalid_sample"),
        SessionError::UnknownAlert(_) => (StatusCode::NOT_FOUND, "unknown_alert"),
        SessionError::UnknownSession(_) => (StatusCode::NOT_FOUND, "unknown_session"),
        SessionError::SessionClosed(_) => (StatusCode::CONFLICT, "session_closed"),
        SessionError::AlreadyCheckedIn(_) => (StatusCode::CONFLICT, "already_checked_in"),
        SessionError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config"),
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Session(err) | ApiError::BatchRejected { source: err, .. } => {
                session_status(err)
            }
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let accepted = match &self {
            ApiError::BatchRejected { accepted, .. } => Some(*accepted),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            code,
            accepted,
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        let id = Uuid::new_v4();
        let cases = [
            (ApiError::from(SessionError::UnknownSession(id)), StatusCode::NOT_FOUND),
            (ApiError::from(SessionError::SessionClosed(id)), StatusCode::CONFLICT),
            (
                ApiError::from(SessionError::AlreadyCheckedIn("DR-001".into())),
                StatusCode::CONFLICT,
            ),
            (ApiError::BadRequest("empty reason".into()), StatusCode::BAD_REQUEST),
            (ApiError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
