//! Anti-recommendation resolvers.
//!
//! A [`Resolver`] maps a record key to an ordered list of candidate keys,
//! preferring keys the user has not seen yet. The strategy is chosen once,
//! at construction, through [`ResolverKind`]:
//!
//! - [`GraphResolver`](graph::GraphResolver): queries the relation graph on every call
//! - [`PathGraphResolver`](path::PathGraphResolver): walks the graph once at warm-up

pub mod graph;
pub mod path;

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::graph::{GraphResult, RelationGraph};
use crate::record::RecordKey;

/// Strategy producing ordered candidates for a key.
pub trait Resolver: Send + Sync {
    /// Resolve `key` against the user's history `seen`.
    ///
    /// Position 0 is the primary candidate. An empty result means there is
    /// nothing further to show, not a failure.
    fn resolve(&self, key: &RecordKey, seen: &[RecordKey]) -> GraphResult<Vec<RecordKey>>;

    /// Short name for logs and diagnostics.
    fn name(&self) -> &'static str;
}

/// Which resolver implementation to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    #[default]
    Graph,
    Path,
}

impl std::fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolverKind::Graph => write!(f, "graph"),
            ResolverKind::Path => write!(f, "path"),
        }
    }
}

/// The sorted, de-duplicated set of every known key.
#[derive(Debug, Clone, Default)]
pub struct KeyUniverse {
    keys: Arc<[RecordKey]>,
}

impl KeyUniverse {
    pub fn new(keys: impl IntoIterator<Item = RecordKey>) -> Self {
        let mut keys: Vec<RecordKey> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();
        Self { keys: keys.into() }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordKey> {
        self.keys.iter()
    }

    pub fn contains(&self, key: &RecordKey) -> bool {
        self.keys.binary_search(key).is_ok()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Split `candidates` into unseen-then-seen, preserving relative order.
pub(crate) fn novelty_first(
    candidates: &[RecordKey],
    seen: &HashSet<&RecordKey>,
) -> (Vec<RecordKey>, Vec<RecordKey>) {
    candidates
        .iter()
        .cloned()
        .partition(|candidate| !seen.contains(candidate))
}

/// Construct the configured resolver.
///
/// The path variant walks the whole graph here, so this belongs in warm-up,
/// never on a request path.
pub fn build_resolver(
    kind: ResolverKind,
    graph: Arc<dyn RelationGraph>,
    universe: KeyUniverse,
    seed: Option<&RecordKey>,
) -> GraphResult<Arc<dyn Resolver>> {
    let resolver: Arc<dyn Resolver> = match kind {
        ResolverKind::Graph => Arc::new(graph::GraphResolver::new(graph, universe)),
        ResolverKind::Path => {
            let path = path::PathGraph::build(graph.as_ref(), &universe, seed)?;
            Arc::new(path::PathGraphResolver::new(path))
        }
    };
    tracing::info!(resolver = resolver.name(), "resolver ready");
    Ok(resolver)
}
