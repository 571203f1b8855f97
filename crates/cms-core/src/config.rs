//! CMS configuration
//!
//! Loaded from TOML, then optionally overridden from the environment:
//!
//! | key              | env                  | default |
//! |------------------|----------------------|---------|
//! | `cache_ttl_secs` | `CMS_CACHE_TTL_SECS` | 600     |
//! | `cache_capacity` | `CMS_CACHE_CAPACITY` | 10000   |
//! | `max_tree_depth` | `CMS_MAX_TREE_DEPTH` | 16      |

use crate::error::{CmsError, CmsResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CmsConfig {
    /// Lifetime of every cache entry, in seconds
    pub cache_ttl_secs: u64,
    /// Maximum entries held by the in-process cache
    pub cache_capacity: u64,
    /// Deepest menu nesting accepted from clients
    pub max_tree_depth: usize,
}

impl CmsConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns `CmsError::Config` on malformed TOML or invalid values.
    pub fn from_toml_str(text: &str) -> CmsResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| CmsError::Config(e.to_string()))?;
        config.validate()
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// Returns `CmsError::Config` if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> CmsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CmsError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Defaults overridden by `CMS_*` environment variables
    ///
    /// # Errors
    /// Returns `CmsError::Config` if a variable does not parse.
    pub fn from_env() -> CmsResult<Self> {
        Self::default().with_env()
    }

    /// Apply `CMS_*` environment overrides
    ///
    /// # Errors
    /// Returns `CmsError::Config` if a variable does not parse.
    pub fn with_env(self) -> CmsResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    ///
    /// # Errors
    /// Returns `CmsError::Config` if a value does not parse.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> CmsResult<Self> {
        if let Some(ttl) = parse_var(&lookup, "CMS_CACHE_TTL_SECS")? {
            self.cache_ttl_secs = ttl;
        }
        if let Some(capacity) = parse_var(&lookup, "CMS_CACHE_CAPACITY")? {
            self.cache_capacity = capacity;
        }
        if let Some(depth) = parse_var(&lookup, "CMS_MAX_TREE_DEPTH")? {
            self.max_tree_depth = depth;
        }
        self.validate()
    }

    /// With cache TTL
    #[inline]
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_secs = ttl.as_secs();
        self
    }

    /// With cache capacity
    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// With maximum tree depth
    #[inline]
    #[must_use]
    pub fn with_max_tree_depth(mut self, depth: usize) -> Self {
        self.max_tree_depth = depth;
        self
    }

    /// Cache entry lifetime
    #[inline]
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    fn validate(self) -> CmsResult<Self> {
        if self.cache_ttl_secs == 0 {
            return Err(CmsError::Config("cache_ttl_secs must be positive".to_string()));
        }
        if self.max_tree_depth == 0 {
            return Err(CmsError::Config("max_tree_depth must be positive".to_string()));
        }
        Ok(self)
    }
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 600,
            cache_capacity: 10_000,
            max_tree_depth: 16,
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> CmsResult<Option<T>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| CmsError::Config(format!("{key}: cannot parse '{raw}'")))
}
