//! Ports and Adapters Infrastructure
//!
//! The claim domain talks to persistence and file storage only through port
//! traits. This module holds what every port shares: the error type, the
//! marker trait, and health reporting.
//!
//! ```text
//!        ClaimService / ExportService
//!                    │
//!                    ▼
//!   ClaimStore · UserDirectory · BlobStore      (domain_claims::ports)
//!          ▲                        ▲
//!          │                        │
//!   PostgresClaimStore        LocalBlobStore     (infra_db, infra_storage)
//!   MockClaimStore            MockBlobStore      (domain_claims, feature "mock")
//! ```

use std::fmt;
use thiserror::Error;
use serde::{Deserialize, Serialize};

/// Failure reported by any port adapter
///
/// Adapters translate their own errors into this type at the seam, so the
/// services above never see SQLx or `std::io` errors directly.
#[derive(Debug, Error)]
pub enum PortError {
    #[error("{entity_type} {id} not found")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// The adapter refused the input, e.g. an unsafe blob path
    #[error("Invalid {}: {message}", .field.as_deref().unwrap_or("input"))]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// A uniqueness rule rejected the write
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    /// The backing system could not be reached; retrying may help
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Invalid input on `field`
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Internal error keeping the underlying cause
    pub fn internal_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PortError::Internal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// True when the backing system was unreachable
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Connection { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    /// True when a uniqueness constraint rejected the write
    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }
}

/// Supertrait of every port: adapters are shared across tasks
pub trait DomainPort: Send + Sync + 'static {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    Unhealthy,
}

/// Outcome of one readiness probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub adapter_id: String,
    pub status: AdapterHealth,
    /// Time the probe took
    pub latency_ms: u64,
    /// Why the adapter is unhealthy
    pub message: Option<String>,
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl HealthCheckResult {
    pub fn healthy(adapter_id: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Healthy,
            latency_ms,
            message: None,
            checked_at: chrono::Utc::now(),
        }
    }

    pub fn unhealthy(adapter_id: impl Into<String>, latency_ms: u64, message: impl Into<String>) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Unhealthy,
            latency_ms,
            message: Some(message.into()),
            checked_at: chrono::Utc::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == AdapterHealth::Healthy
    }
}

/// Adapters probed by the readiness endpoint
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}
