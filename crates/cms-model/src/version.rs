//! Versions, modules and lookup entries

use crate::ids::{ModuleId, VersionId};
use crate::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant that owns versions and modules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    /// Unique app name
    pub name: String,
    /// Creation time
    pub created_at: Timestamp,
}

/// Version of an app's content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    /// Version ID
    pub id: VersionId,
    /// Owning app
    pub app_name: String,
    /// Name, unique within the app
    pub name: String,
    /// Enabled-at time
    pub enabled_at: Option<Timestamp>,
    /// Publication time; at most one version per app is published
    pub published_at: Option<Timestamp>,
    /// Public identifier of the published content
    pub publish_id: Uuid,
    /// Last write time
    pub updated_at: Timestamp,
    /// Soft-delete marker
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<Timestamp>,
}

/// Content module referenced by partial columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// Module ID
    pub id: ModuleId,
    /// Owning app
    pub app_name: String,
    /// Module type name
    pub module_type: String,
    /// Name, unique within the app
    pub name: String,
    /// Opaque settings blob
    pub settings: serde_json::Value,
    /// Last write time
    pub updated_at: Timestamp,
    /// Soft-delete marker
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<Timestamp>,
}

/// Id/name pair served by the lookup endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupEntry<I> {
    /// Entity ID
    pub id: I,
    /// Entity name
    pub name: String,
}

impl<I> LookupEntry<I> {
    /// Create new lookup entry
    #[inline]
    #[must_use]
    pub fn new(id: I, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Case-insensitive substring match on the name
    ///
    /// An empty or whitespace-only needle matches everything.
    #[must_use]
    pub fn name_contains(&self, needle: &str) -> bool {
        let needle = needle.trim();
        needle.is_empty() || self.name.to_lowercase().contains(&needle.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_name_filter_is_case_insensitive() {
        let entry = LookupEntry::new(VersionId(1), "Summer Release");

        assert!(entry.name_contains("summer"));
        assert!(entry.name_contains("  RELEASE "));
        assert!(entry.name_contains(""));
        assert!(!entry.name_contains("winter"));
    }
}
