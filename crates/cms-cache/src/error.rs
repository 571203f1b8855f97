//! Cache error types

/// Errors from a cache backend or payload codec
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Backend unreachable or rejected the command
    #[error("cache backend error: {0}")]
    Backend(String),

    /// Cached payload could not be encoded or decoded
    #[error("cache codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Result type alias for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
