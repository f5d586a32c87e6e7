//! Defines common error types for the Gatehouse core library.

use crate::types::IdentityId;
use thiserror::Error;

/// The primary error type for Gatehouse operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatehouseError {
    /// An enrollment was attempted for an identity id that is already registered.
    #[error("Duplicate Identity: {0} is already enrolled")]
    DuplicateIdentity(IdentityId),

    /// A template's length differs from the configured encoding dimensionality.
    #[error("Dimension Mismatch: expected {expected} components, got {actual}")]
    DimensionMismatch {
        /// Dimensionality shared by every enrolled encoding.
        expected: usize,
        /// Dimensionality of the offending template.
        actual: usize,
    },

    /// An authorization window could not be parsed or is not a same-day window.
    #[error("Invalid Time Window ({value}): {message}")]
    InvalidTimeWindow {
        /// The raw value that was rejected.
        value: String,
        /// Why it was rejected.
        message: String,
    },

    /// The template store or access log could not be reached.
    #[error("Storage Unavailable: {0}")]
    StorageUnavailable(String),

    /// Error indicating a failure during data validation.
    #[error("Validation Error ({context}): {message}")]
    ValidationError {
        /// Context or field where validation failed.
        context: String,
        /// Specific validation failure message.
        message: String,
    },

    /// Error related to configuration loading or validation.
    #[error("Configuration Error: {0}")]
    ConfigError(String),
}

impl GatehouseError {
    /// Shorthand for building a [`GatehouseError::ValidationError`].
    pub fn validation_error(context: &str, message: &str) -> Self {
        GatehouseError::ValidationError {
            context: context.to_string(),
            message: message.to_string(),
        }
    }

    /// Shorthand for building a [`GatehouseError::InvalidTimeWindow`].
    pub fn invalid_window(value: impl Into<String>, message: impl Into<String>) -> Self {
        GatehouseError::InvalidTimeWindow {
            value: value.into(),
            message: message.into(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for GatehouseError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        GatehouseError::StorageUnavailable(format!("store lock poisoned: {}", err))
    }
}
