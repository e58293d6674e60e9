//! Domain error model.

use thiserror::Error;

/// Deterministic domain failure.
///
/// Everything here is a function of the submitted input and current state;
/// retrying without changing either is pointless. Infrastructure faults
/// (connections, transactions) live in the storage layer's error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (malformed name, bad quantity, bad payload).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The referenced order, menu item or ingredient does not exist.
    #[error("not found")]
    NotFound,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
