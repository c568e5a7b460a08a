//! Error responses for the REST surface

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::SwarmError;

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub href: String,
    pub id: u16,
    pub kind: String,
    pub reason: String,
}

impl ErrorBody {
    pub fn new(status: StatusCode, reason: impl Into<String>) -> Self {
        Self {
            code: status.as_u16().to_string(),
            href: String::new(),
            id: status.as_u16(),
            kind: "Error".to_string(),
            reason: reason.into(),
        }
    }
}

/// Application error carried out of a handler
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    reason: String,
}

impl ApiError {
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            reason: reason.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, reason = %self.reason, "Request failed");
        } else {
            tracing::debug!(status = %self.status, reason = %self.reason, "Request rejected");
        }
        (self.status, Json(ErrorBody::new(self.status, self.reason))).into_response()
    }
}

impl From<SwarmError> for ApiError {
    fn from(err: SwarmError) -> Self {
        Self {
            status: err.status_code(),
            reason: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}
