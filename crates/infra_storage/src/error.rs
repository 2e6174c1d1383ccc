//! Storage error types

use core_kernel::PortError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The key is empty, absolute, or walks out of the media root
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(path.to_string())
        } else {
            StorageError::Io {
                path: path.to_string(),
                source,
            }
        }
    }
}

impl From<StorageError> for PortError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::InvalidPath(path) => {
                PortError::invalid("path", format!("{} escapes the media root", path))
            }
            StorageError::NotFound(path) => PortError::not_found("File", path),
            StorageError::Io { path, source } => {
                PortError::internal_with(format!("I/O error on {}", path), source)
            }
        }
    }
}
