//! Export errors

use thiserror::Error;

use core_kernel::PortError;

/// Errors that abort an export
///
/// An unreadable receipt is not one of them; it is reported in
/// [`crate::ExportArchive::skipped`] instead.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Nothing to export; shown to the lead as a warning
    #[error("No submitted or packed claims to export for {department}")]
    NoData { department: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Storage error: {0}")]
    Port(#[from] PortError),

    /// A document could not be generated
    #[error("Failed to render {document}: {message}")]
    Render { document: String, message: String },

    #[error("Failed to write archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn render(document: impl Into<String>, message: impl ToString) -> Self {
        ExportError::Render {
            document: document.into(),
            message: message.to_string(),
        }
    }
}
