//! API error handling.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use shipyard_core::{ErrorKind, Stage, ValidationError};

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    /// The request could not be accepted; no stage ran.
    BadRequest(String),
    PayloadTooLarge(String),
    /// A deployment stage failed.
    Deployment {
        stage: Stage,
        error_kind: ErrorKind,
        message: String,
    },
}

/// HTTP status reported for a failed deployment.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::AuthFailure => StatusCode::UNAUTHORIZED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict | ErrorKind::RemoteAlreadyBound | ErrorKind::NonFastForward => {
            StatusCode::CONFLICT
        }
        ErrorKind::EmptyWorkspace => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::RemoteUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::FilesystemError | ErrorKind::VcsToolError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": msg })),
            )
                .into_response(),
            ApiError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({ "success": false, "error": msg })),
            )
                .into_response(),
            ApiError::Deployment {
                stage,
                error_kind,
                message,
            } => {
                let body = Json(json!({
                    "success": false,
                    "stage": stage,
                    "errorKind": error_kind,
                    "message": message,
                }));
                (status_for(error_kind), body).into_response()
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}
