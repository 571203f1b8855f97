//! Indexing directives
//!
//! A small controlled vocabulary of search-engine directives attached to
//! menu items (and pages). Each directive carries an optional value, e.g.
//! `max-snippet: 50`.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Indexing directive option
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndexingOption {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "follow")]
    Follow,
    #[serde(rename = "index")]
    Index,
    #[serde(rename = "indexifembedded")]
    IndexIfEmbedded,
    #[serde(rename = "max-image-preview")]
    MaxImagePreview,
    #[serde(rename = "max-snippet")]
    MaxSnippet,
    #[serde(rename = "max-video-preview")]
    MaxVideoPreview,
    #[serde(rename = "noai")]
    NoAi,
    #[serde(rename = "noarchive")]
    NoArchive,
    #[serde(rename = "nocache")]
    NoCache,
    #[serde(rename = "nofollow")]
    NoFollow,
    #[serde(rename = "noimageai")]
    NoImageAi,
    #[serde(rename = "noimageindex")]
    NoImageIndex,
    #[serde(rename = "noindex")]
    NoIndex,
    #[serde(rename = "noindexifembedded")]
    NoIndexIfEmbedded,
    #[serde(rename = "none")]
    None,
    /// Deprecated, kept for compatibility
    #[serde(rename = "noodp")]
    NoOdp,
    #[serde(rename = "nosnippet")]
    NoSnippet,
    #[serde(rename = "notranslate")]
    NoTranslate,
    /// Deprecated, kept for compatibility
    #[serde(rename = "noydir")]
    NoYdir,
    #[serde(rename = "unavailable_after")]
    UnavailableAfter,
}

impl IndexingOption {
    /// Every option in the vocabulary
    pub const ALL: [IndexingOption; 21] = [
        Self::All,
        Self::Follow,
        Self::Index,
        Self::IndexIfEmbedded,
        Self::MaxImagePreview,
        Self::MaxSnippet,
        Self::MaxVideoPreview,
        Self::NoAi,
        Self::NoArchive,
        Self::NoCache,
        Self::NoFollow,
        Self::NoImageAi,
        Self::NoImageIndex,
        Self::NoIndex,
        Self::NoIndexIfEmbedded,
        Self::None,
        Self::NoOdp,
        Self::NoSnippet,
        Self::NoTranslate,
        Self::NoYdir,
        Self::UnavailableAfter,
    ];

    /// Wire name of the option
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Follow => "follow",
            Self::Index => "index",
            Self::IndexIfEmbedded => "indexifembedded",
            Self::MaxImagePreview => "max-image-preview",
            Self::MaxSnippet => "max-snippet",
            Self::MaxVideoPreview => "max-video-preview",
            Self::NoAi => "noai",
            Self::NoArchive => "noarchive",
            Self::NoCache => "nocache",
            Self::NoFollow => "nofollow",
            Self::NoImageAi => "noimageai",
            Self::NoImageIndex => "noimageindex",
            Self::NoIndex => "noindex",
            Self::NoIndexIfEmbedded => "noindexifembedded",
            Self::None => "none",
            Self::NoOdp => "noodp",
            Self::NoSnippet => "nosnippet",
            Self::NoTranslate => "notranslate",
            Self::NoYdir => "noydir",
            Self::UnavailableAfter => "unavailable_after",
        }
    }
}

impl fmt::Display for IndexingOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexingOption {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|option| option.as_str() == s)
            .ok_or_else(|| ModelError::UnknownIndexing(s.to_string()))
    }
}

/// One indexing directive attached to a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexingDirective {
    /// Directive option
    pub option: IndexingOption,
    /// Optional directive value
    #[serde(default)]
    pub value: Option<String>,
}

impl IndexingDirective {
    /// Directive without a value
    #[inline]
    #[must_use]
    pub fn new(option: IndexingOption) -> Self {
        Self {
            option,
            value: None,
        }
    }

    /// Directive with a value
    #[inline]
    #[must_use]
    pub fn with_value(option: IndexingOption, value: impl Into<String>) -> Self {
        Self {
            option,
            value: Some(value.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_parses_every_wire_name() {
        for option in IndexingOption::ALL {
            assert_eq!(option.as_str().parse::<IndexingOption>(), Ok(option));
        }
    }

    #[test]
    fn option_rejects_unknown_name() {
        let err = "sometimes".parse::<IndexingOption>().unwrap_err();
        assert_eq!(err, ModelError::UnknownIndexing("sometimes".to_string()));
    }

    #[test]
    fn directive_deserializes_missing_value_as_none() {
        let directive: IndexingDirective = serde_json::from_str(r#"{"option":"index"}"#).unwrap();
        assert_eq!(directive, IndexingDirective::new(IndexingOption::Index));

        let json = serde_json::to_string(&directive).unwrap();
        assert_eq!(json, r#"{"option":"index","value":null}"#);
    }
}
