//! Error types for the tree store

/// Errors surfaced by a store adapter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Uniqueness or referential constraint violated
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Referenced record does not exist
    #[error("record not found: {0}")]
    Missing(String),

    /// Store unreachable or refused the operation
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other adapter failure
    #[error("store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Create constraint violation
    #[inline]
    pub fn constraint(message: impl Into<String>) -> Self {
        Self::Constraint(message.into())
    }

    /// Create missing-record error
    #[inline]
    pub fn missing(what: impl Into<String>) -> Self {
        Self::Missing(what.into())
    }

    /// Check if error is a constraint violation
    #[inline]
    #[must_use]
    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
