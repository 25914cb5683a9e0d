//! Relation graph: directed subject → object anti-recommendation edges.
//!
//! Two backends implement [`RelationGraph`]:
//!
//! - **In-memory** ([`RelationIndex`](index::RelationIndex)): `petgraph` + `DashMap`, loaded from JSON
//! - **RDF** ([`ArkgStore`](sparql::ArkgStore)): `oxigraph` store holding an
//!   Anti-Recommendation Knowledge Graph, queried with SPARQL
//!
//! Both are read-only after load and shared across sessions behind an `Arc`.

pub mod index;
pub mod sparql;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::record::RecordKey;

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// A store of directed relation edges, queryable by subject.
pub trait RelationGraph: Send + Sync {
    /// Keys directly related to `subject`, in the backend's native order.
    ///
    /// The order must be deterministic for a fixed graph state. A subject
    /// with no edges yields an empty list, not an error.
    fn related_keys(&self, subject: &RecordKey) -> GraphResult<Vec<RecordKey>>;
}

/// One subject with its outgoing edges, as stored in JSON relation files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relations {
    pub subject: RecordKey,
    pub objects: Vec<RecordKey>,
}

/// Drop self-edges and repeated objects, keeping first occurrences.
pub(crate) fn distinct_objects(subject: &RecordKey, objects: Vec<RecordKey>) -> Vec<RecordKey> {
    let mut seen = std::collections::HashSet::with_capacity(objects.len());
    objects
        .into_iter()
        .filter(|object| object != subject && seen.insert(object.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> RecordKey {
        RecordKey::new(s).unwrap()
    }

    #[test]
    fn distinct_objects_drops_self_and_repeats() {
        let out = distinct_objects(&key("A"), vec![key("B"), key("A"), key("C"), key("B")]);
        assert_eq!(out, vec![key("B"), key("C")]);
    }
}
