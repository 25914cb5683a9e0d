//! Record catalog: read-only keyed lookup of canonical items.
//!
//! The catalog is materialized once at startup and shared read-only across
//! sessions. Iteration order is load order; the first loaded key is the
//! default anchor for users with no history.

use std::collections::HashMap;
use std::path::Path;

use crate::error::CatalogError;
use crate::record::{Item, RecordKey};

/// Result type for catalog operations.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Read-only keyed lookup of canonical items.
pub trait RecordStore: Send + Sync {
    /// Look up an item by key.
    fn get(&self, key: &RecordKey) -> Option<Item>;

    /// All keys in the store's iteration order.
    fn keys(&self) -> Vec<RecordKey>;

    /// The first key in iteration order, if any.
    fn first_key(&self) -> Option<RecordKey> {
        self.keys().into_iter().next()
    }

    /// Whether `key` has an entry.
    fn contains(&self, key: &RecordKey) -> bool {
        self.get(key).is_some()
    }
}

/// In-memory catalog preserving load order.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    items: Vec<Item>,
    index: HashMap<RecordKey, usize>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from items. Later duplicates of a key are ignored.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut catalog = Self::new();
        for item in items {
            catalog.insert(item);
        }
        catalog
    }

    /// Insert an item unless its key is already present. Returns whether it was inserted.
    pub fn insert(&mut self, item: Item) -> bool {
        if self.index.contains_key(&item.key) {
            tracing::debug!(key = %item.key, "duplicate catalog key ignored");
            return false;
        }
        self.index.insert(item.key.clone(), self.items.len());
        self.items.push(item);
        true
    }

    /// Load a catalog file: a JSON array of records, or one JSON record per line.
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::parse(&content, &path.display().to_string())?;
        tracing::info!(path = %path.display(), records = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Parse catalog text. `origin` is only used in error locations.
    pub fn parse(content: &str, origin: &str) -> CatalogResult<Self> {
        if content.trim_start().starts_with('[') {
            let items: Vec<Item> =
                serde_json::from_str(content).map_err(|e| CatalogError::Parse {
                    location: origin.to_string(),
                    message: e.to_string(),
                })?;
            return Ok(Self::from_items(items.into_iter().map(clean_url)));
        }

        let mut catalog = Self::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let item: Item = serde_json::from_str(line).map_err(|e| CatalogError::Parse {
                location: format!("{origin}:{}", line_no + 1),
                message: e.to_string(),
            })?;
            catalog.insert(clean_url(item));
        }
        Ok(catalog)
    }

    /// Borrow an item by key.
    pub fn item(&self, key: &RecordKey) -> Option<&Item> {
        self.index.get(key).map(|&i| &self.items[i])
    }

    /// Iterate items in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn clean_url(mut item: Item) -> Item {
    item.url = item.url.filter(|u| !u.trim().is_empty());
    item
}

impl RecordStore for Catalog {
    fn get(&self, key: &RecordKey) -> Option<Item> {
        self.item(key).cloned()
    }

    fn keys(&self) -> Vec<RecordKey> {
        self.items.iter().map(|item| item.key.clone()).collect()
    }

    fn first_key(&self) -> Option<RecordKey> {
        self.items.first().map(|item| item.key.clone())
    }

    fn contains(&self, key: &RecordKey) -> bool {
        self.index.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> RecordKey {
        RecordKey::new(s).unwrap()
    }

    #[test]
    fn json_lines_preserve_load_order() {
        let catalog = Catalog::parse(
            "{\"key\": \"Zebra\"}\n\n{\"key\": \"Aardvark\", \"url\": \"\"}\n",
            "test",
        )
        .unwrap();
        assert_eq!(catalog.keys(), vec![key("Zebra"), key("Aardvark")]);
        assert_eq!(catalog.first_key(), Some(key("Zebra")));
        assert_eq!(catalog.item(&key("Aardvark")).unwrap().url, None);
    }

    #[test]
    fn json_array_is_accepted() {
        let catalog = Catalog::parse(r#"[{"title": "A"}, {"title": "B"}]"#, "test").unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains(&key("B")));
    }

    #[test]
    fn duplicate_keys_keep_first() {
        let catalog = Catalog::from_items([
            Item::new(key("A"), Some("first".into())),
            Item::new(key("A"), Some("second".into())),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(&key("A")).unwrap().url.as_deref(), Some("first"));
    }

    #[test]
    fn malformed_line_reports_location() {
        let err = Catalog::parse("{\"key\": \"A\"}\n{\"key\": \"  \"}\n", "cat.jsonl").unwrap_err();
        match err {
            CatalogError::Parse { location, .. } => assert_eq!(location, "cat.jsonl:2"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_catalog_has_no_first_key() {
        let catalog = Catalog::new();
        assert!(catalog.is_empty());
        assert_eq!(catalog.first_key(), None);
    }
}
