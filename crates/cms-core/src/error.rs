//! Error types for the CMS core
//!
//! Every failure a caller can see falls into one of these kinds:
//! - Validation: malformed descriptors, nothing touched
//! - NotFound: referenced tree or node missing or soft-deleted
//! - OutOfSync: stale snapshot, rejected before any write
//! - NameCollision: uniqueness violated
//! - Store: unexpected adapter failure, transaction rolled back
//!
//! Cache failures never show up here.

use cms_model::Timestamp;
use cms_store::{EntityRef, StoreError};

/// Main CMS error type
#[derive(Debug, thiserror::Error)]
pub enum CmsError {
    /// Malformed or missing descriptor fields
    #[error("validation failed: {0}")]
    Validation(String),

    /// Referenced record does not exist or is soft-deleted
    #[error("{entity} not found")]
    NotFound {
        /// Missing record
        entity: String,
    },

    /// Client snapshot is older than the stored record
    #[error("{entity} is out of sync: stored {stored}, submitted {submitted}")]
    OutOfSync {
        /// Stale record
        entity: String,
        /// Stored `updated_at`
        stored: Timestamp,
        /// Client-supplied `updated_at`
        submitted: Timestamp,
    },

    /// Uniqueness constraint violated
    #[error("name collision: {0}")]
    NameCollision(String),

    /// Store failed mid-operation
    #[error("store failure: {0}")]
    Store(#[source] StoreError),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl CmsError {
    /// Create not-found error
    #[inline]
    pub fn not_found(entity: &EntityRef) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
        }
    }

    /// Create validation error
    #[inline]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if the caller is at fault
    #[inline]
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::NotFound { .. }
                | Self::OutOfSync { .. }
                | Self::NameCollision(_)
        )
    }

    /// Check if error is an out-of-sync rejection
    #[inline]
    #[must_use]
    pub fn is_out_of_sync(&self) -> bool {
        matches!(self, Self::OutOfSync { .. })
    }
}

impl From<StoreError> for CmsError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Constraint(message) => Self::NameCollision(message),
            other => Self::Store(other),
        }
    }
}

/// Result type alias for CMS operations
pub type CmsResult<T> = Result<T, CmsError>;
