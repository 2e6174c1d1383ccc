//! Claims domain errors

use thiserror::Error;

use core_kernel::PortError;
use crate::claim::ClaimStatus;
use crate::workflow::ClaimAction;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    /// Malformed input; nothing was saved
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// The actor lacks the role or department scope for the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The claim's status does not allow the requested action
    #[error("Cannot {action} a claim that is {status}")]
    InvalidState {
        status: ClaimStatus,
        action: ClaimAction,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Storage error: {0}")]
    Storage(PortError),
}

impl ClaimError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ClaimError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn denied(message: impl Into<String>) -> Self {
        ClaimError::PermissionDenied(message.into())
    }

    pub fn not_found(entity: impl Into<String>, id: impl std::fmt::Display) -> Self {
        ClaimError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<PortError> for ClaimError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => ClaimError::NotFound {
                entity: entity_type,
                id,
            },
            PortError::Validation { message, field } => ClaimError::Validation {
                field: field.unwrap_or_else(|| "input".to_string()),
                message,
            },
            other => ClaimError::Storage(other),
        }
    }
}
