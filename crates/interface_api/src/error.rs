//! API error handling
//!
//! Domain errors are mapped onto status codes here and nowhere else.
//! A department with nothing to export answers 409 with `error = "no_data"`
//! so clients can show it as a warning.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use core_kernel::PortError;
use domain_claims::ClaimError;
use domain_export::ExportError;

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The claim's status does not allow the action
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("No data: {0}")]
    NoData(String),

    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidState(_) | ApiError::Conflict(_) | ApiError::NoData(_) => {
                StatusCode::CONFLICT
            }
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_type, message, field) = match self {
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::InvalidState(msg) => ("invalid_state", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::NoData(msg) => ("no_data", msg, None),
            ApiError::Validation { field, message } => ("validation_error", message, Some(field)),
            ApiError::Unavailable(msg) => ("service_unavailable", msg, None),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                ("internal_error", "Internal server error".to_string(), None)
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            field,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => {
                ApiError::NotFound(format!("{} {} not found", entity_type, id))
            }
            PortError::Validation { message, field } => ApiError::Validation {
                field: field.unwrap_or_else(|| "input".to_string()),
                message,
            },
            PortError::Conflict { message } => ApiError::Conflict(message),
            e if e.is_transient() => ApiError::Unavailable(e.to_string()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::Validation { field, message } => ApiError::Validation { field, message },
            ClaimError::PermissionDenied(msg) => ApiError::Forbidden(msg),
            e @ ClaimError::InvalidState { .. } => ApiError::InvalidState(e.to_string()),
            e @ ClaimError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ClaimError::Storage(port) => port.into(),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            e @ ExportError::NoData { .. } => ApiError::NoData(e.to_string()),
            ExportError::PermissionDenied(msg) => ApiError::Forbidden(msg),
            ExportError::Port(port) => port.into(),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            e @ AuthError::Inactive => ApiError::Forbidden(e.to_string()),
            e => ApiError::Unauthorized(e.to_string()),
        }
    }
}
