//! Validation error model.

use thiserror::Error;

/// Result type used by the primitive layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic input failures.
///
/// Storage and authorization outcomes are modelled by the crates that own
/// them; this type only covers values that are malformed on arrival.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An argument had the wrong shape or an unusable value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An identifier was empty or otherwise unusable.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
