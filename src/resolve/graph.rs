//! On-demand resolution over the relation graph.

use std::collections::HashSet;
use std::sync::Arc;

use crate::graph::{GraphResult, RelationGraph, distinct_objects};
use crate::record::RecordKey;

use super::{KeyUniverse, Resolver, novelty_first};

/// Resolves each key by querying its direct edges.
///
/// Unseen direct edges come first (the first of them is the primary
/// candidate), previously seen direct edges follow; no edge is dropped. When
/// every direct edge has been seen, or there are none, the first unseen key of
/// the sorted universe becomes the sole candidate.
pub struct GraphResolver {
    graph: Arc<dyn RelationGraph>,
    universe: KeyUniverse,
}

impl GraphResolver {
    pub fn new(graph: Arc<dyn RelationGraph>, universe: KeyUniverse) -> Self {
        Self { graph, universe }
    }

    /// Global scan: the first key of the sorted universe that is neither
    /// `key` nor in `seen`.
    ///
    /// Public so a caller can fall back to it directly after a graph failure.
    pub fn fallback(&self, key: &RecordKey, seen: &[RecordKey]) -> Option<RecordKey> {
        let seen: HashSet<&RecordKey> = seen.iter().collect();
        self.global_scan(key, &seen)
    }

    fn global_scan(&self, key: &RecordKey, seen: &HashSet<&RecordKey>) -> Option<RecordKey> {
        self.universe
            .iter()
            .find(|candidate| *candidate != key && !seen.contains(candidate))
            .cloned()
    }
}

impl Resolver for GraphResolver {
    fn resolve(&self, key: &RecordKey, seen: &[RecordKey]) -> GraphResult<Vec<RecordKey>> {
        let direct = distinct_objects(key, self.graph.related_keys(key)?);
        let seen: HashSet<&RecordKey> = seen.iter().collect();
        let (mut unseen, already_seen) = novelty_first(&direct, &seen);

        if !unseen.is_empty() {
            tracing::debug!(
                %key,
                primary = %unseen[0],
                unseen = unseen.len(),
                seen = already_seen.len(),
                "resolved from direct edges"
            );
            unseen.extend(already_seen);
            return Ok(unseen);
        }

        let scanned = self.global_scan(key, &seen);
        match &scanned {
            Some(primary) => tracing::debug!(%key, %primary, "resolved by global scan"),
            None => tracing::debug!(%key, "no unseen keys remain"),
        }
        Ok(scanned.into_iter().collect())
    }

    fn name(&self) -> &'static str {
        "graph"
    }
}

impl std::fmt::Debug for GraphResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphResolver")
            .field("universe", &self.universe.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::graph::index::RelationIndex;

    fn key(s: &str) -> RecordKey {
        RecordKey::new(s).unwrap()
    }

    fn keys(names: &[&str]) -> Vec<RecordKey> {
        names.iter().map(|n| key(n)).collect()
    }

    fn resolver(edges: &[(&str, &[&str])], universe: &[&str]) -> GraphResolver {
        let index = RelationIndex::new();
        for (subject, objects) in edges {
            index.insert_edges(&key(subject), keys(objects));
        }
        GraphResolver::new(Arc::new(index), KeyUniverse::new(keys(universe)))
    }

    struct BrokenGraph;

    impl RelationGraph for BrokenGraph {
        fn related_keys(&self, subject: &RecordKey) -> GraphResult<Vec<RecordKey>> {
            Err(GraphError::Query {
                subject: subject.to_string(),
                message: "connection refused".into(),
            })
        }
    }

    #[test]
    fn unseen_direct_edge_is_primary() {
        let r = resolver(&[("A", &["B", "C", "D"])], &["A", "B", "C", "D"]);
        let out = r.resolve(&key("A"), &keys(&["B"])).unwrap();
        assert_eq!(out, keys(&["C", "D", "B"]));
    }

    #[test]
    fn native_order_when_nothing_seen() {
        let r = resolver(&[("A", &["C", "B"])], &["A", "B", "C"]);
        assert_eq!(r.resolve(&key("A"), &[]).unwrap(), keys(&["C", "B"]));
    }

    #[test]
    fn no_edges_falls_back_to_global_scan() {
        let r = resolver(&[("A", &["B", "C"])], &["A", "B", "C"]);
        let out = r.resolve(&key("B"), &keys(&["A"])).unwrap();
        assert_eq!(out, keys(&["C"]));
    }

    #[test]
    fn all_edges_seen_falls_back_to_global_scan() {
        let r = resolver(&[("A", &["B"])], &["A", "B", "C", "D"]);
        let out = r.resolve(&key("A"), &keys(&["B", "C"])).unwrap();
        assert_eq!(out, keys(&["D"]));
    }

    #[test]
    fn exhausted_pool_is_empty_not_error() {
        let r = resolver(&[("A", &["B"])], &["A", "B"]);
        assert!(r.resolve(&key("A"), &keys(&["A", "B"])).unwrap().is_empty());
    }

    #[test]
    fn global_scan_never_returns_the_key_itself() {
        let r = resolver(&[], &["A"]);
        assert!(r.resolve(&key("A"), &[]).unwrap().is_empty());
    }

    #[test]
    fn graph_failure_propagates() {
        let r = GraphResolver::new(Arc::new(BrokenGraph), KeyUniverse::new(keys(&["A", "B"])));
        let err = r.resolve(&key("A"), &[]).unwrap_err();
        assert!(matches!(err, GraphError::Query { .. }));
        assert_eq!(r.fallback(&key("A"), &[]), Some(key("B")));
    }

    #[test]
    fn every_key_with_unseen_edges_gets_one_at_position_zero() {
        let r = resolver(
            &[("A", &["B", "C"]), ("B", &["A", "C"]), ("C", &["A"])],
            &["A", "B", "C"],
        );
        let histories = [vec![], keys(&["B"]), keys(&["A", "C"]), keys(&["C"])];
        for subject in ["A", "B", "C"] {
            for seen in &histories {
                let direct = r.graph.related_keys(&key(subject)).unwrap();
                let has_unseen = direct.iter().any(|k| !seen.contains(k));
                let out = r.resolve(&key(subject), seen).unwrap();
                if has_unseen {
                    assert!(direct.contains(&out[0]));
                    assert!(!seen.contains(&out[0]));
                    assert_eq!(out.len(), direct.len());
                }
            }
        }
    }
}
