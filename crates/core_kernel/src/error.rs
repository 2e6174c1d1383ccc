//! Kernel errors

use thiserror::Error;
use crate::money::MoneyError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// A calendar or amount value was out of range
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configured value could not be parsed, e.g. an unknown timezone
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }
}
