//! Core record types for the antirec engine.
//!
//! Every catalog entry is identified by a [`RecordKey`] and described by an
//! [`Item`]. Resolution works purely on keys; items are only looked up when a
//! frame is materialized for a client.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Stable, unique key of a catalog record (for Wikipedia records, the title).
///
/// Keys are trimmed and NFC-normalized on construction so that keys read from
/// the catalog and keys read back from RDF literals compare equal. The derived
/// `Ord` is the ordering of the "sorted universe" used by global scans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordKey(String);

/// Returned when a record key is empty after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("record key must not be blank")]
pub struct BlankKey;

impl RecordKey {
    /// Create a key, returning `None` if `raw` is blank.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.nfc().collect()))
    }

    /// The normalized key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RecordKey {
    type Error = BlankKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(BlankKey)
    }
}

impl TryFrom<&str> for RecordKey {
    type Error = BlankKey;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(BlankKey)
    }
}

impl From<RecordKey> for String {
    fn from(key: RecordKey) -> Self {
        key.0
    }
}

impl Borrow<str> for RecordKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RecordKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A canonical catalog record. Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique key of the record.
    #[serde(alias = "title")]
    pub key: RecordKey,
    /// Canonical URL, if the source provided a non-blank one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// All remaining fields of the source record (abstract, categories, ...).
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Item {
    /// Create an item with no metadata.
    pub fn new(key: RecordKey, url: Option<String>) -> Self {
        Self {
            key,
            url: url.filter(|u| !u.trim().is_empty()),
            metadata: serde_json::Map::new(),
        }
    }

    /// Attach a metadata field.
    pub fn with_metadata(mut self, field: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(field.into(), value);
        self
    }
}

/// A resolved alternative to show a client. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntiRecommendation {
    pub key: RecordKey,
    pub url: String,
}

impl AntiRecommendation {
    /// Build from a catalog item, deriving the URL from `url_base` when the
    /// item carries none. Spaces in the key become underscores, the way
    /// Wikipedia article URLs are formed.
    pub fn from_item(item: &Item, url_base: &str) -> Self {
        let url = match &item.url {
            Some(url) => url.clone(),
            None => format!("{url_base}{}", item.key.as_str().replace(' ', "_")),
        };
        Self {
            key: item.key.clone(),
            url,
        }
    }
}
