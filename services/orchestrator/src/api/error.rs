//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::runtime::RuntimeError;
use crate::scheduler::SchedulerError;
use crate::store::StoreError;

/// JSON error body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// An API-level error: a status code plus a structured body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        match &err {
            SchedulerError::DeploymentExists(_) | SchedulerError::ServiceExists(_) => {
                Self::conflict("already_exists", err.to_string())
            }
            SchedulerError::DeploymentNotFound(_) | SchedulerError::ServiceNotFound(_) => {
                Self::not_found("not_found", err.to_string())
            }
            SchedulerError::Validation(_) => Self::bad_request("invalid_spec", err.to_string()),
            SchedulerError::Runtime { .. } => Self::internal("runtime_error", err.to_string()),
        }
    }
}

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        match &err {
            RuntimeError::NotFound(_) => Self::not_found("not_found", err.to_string()),
            RuntimeError::InvalidPort(_) => Self::bad_request("invalid_spec", err.to_string()),
            _ => Self::internal("runtime_error", err.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::NotFound(_) => Self::not_found("not_found", err.to_string()),
            _ => Self::internal("persistence_error", err.to_string()),
        }
    }
}
