//! In-memory relation graph.
//!
//! Uses `petgraph` for the edge structure and `DashMap` for O(1) node lookups
//! by record key.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use dashmap::DashMap;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::GraphError;
use crate::record::RecordKey;

use super::{GraphResult, RelationGraph, Relations};

/// In-memory relation graph backed by petgraph.
pub struct RelationIndex {
    /// The directed graph: nodes are record keys, edges carry no data.
    graph: RwLock<DiGraph<RecordKey, ()>>,
    /// RecordKey → NodeIndex mapping.
    node_index: DashMap<RecordKey, NodeIndex>,
    edge_count: AtomicUsize,
}

impl RelationIndex {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            graph: RwLock::new(DiGraph::new()),
            node_index: DashMap::new(),
            edge_count: AtomicUsize::new(0),
        }
    }

    /// Build a graph from subject/objects groups.
    pub fn from_relations(relations: impl IntoIterator<Item = Relations>) -> Self {
        let index = Self::new();
        for group in relations {
            index.insert_edges(&group.subject, group.objects);
        }
        index
    }

    /// Load a JSON relations file: `[{"subject": "...", "objects": ["..."]}, ...]`.
    pub fn load(path: &Path) -> GraphResult<Self> {
        let load_err = |message: String| GraphError::Load {
            path: path.display().to_string(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let relations: Vec<Relations> =
            serde_json::from_str(&content).map_err(|e| load_err(e.to_string()))?;
        let index = Self::from_relations(relations);
        tracing::info!(
            path = %path.display(),
            nodes = index.node_count(),
            edges = index.edge_count(),
            "relation index loaded"
        );
        Ok(index)
    }

    fn ensure_node(&self, key: &RecordKey) -> NodeIndex {
        if let Some(idx) = self.node_index.get(key) {
            return *idx.value();
        }
        let mut graph = self.graph.write().unwrap_or_else(PoisonError::into_inner);
        // Double-check after acquiring write lock
        if let Some(idx) = self.node_index.get(key) {
            return *idx.value();
        }
        let idx = graph.add_node(key.clone());
        self.node_index.insert(key.clone(), idx);
        idx
    }

    /// Insert a directed edge. Returns `false` for self-edges and duplicates.
    pub fn insert_edge(&self, subject: &RecordKey, object: &RecordKey) -> bool {
        if subject == object {
            return false;
        }
        let subj_idx = self.ensure_node(subject);
        let obj_idx = self.ensure_node(object);

        let mut graph = self.graph.write().unwrap_or_else(PoisonError::into_inner);
        if graph.find_edge(subj_idx, obj_idx).is_some() {
            return false;
        }
        graph.add_edge(subj_idx, obj_idx, ());
        self.edge_count.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Insert edges from `subject` to each object, in order. Returns how many were new.
    pub fn insert_edges(
        &self,
        subject: &RecordKey,
        objects: impl IntoIterator<Item = RecordKey>,
    ) -> usize {
        objects
            .into_iter()
            .filter(|object| self.insert_edge(subject, object))
            .count()
    }

    /// Check if a node exists.
    pub fn has_node(&self, key: &RecordKey) -> bool {
        self.node_index.contains_key(key)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count.load(Ordering::Relaxed)
    }

    /// Objects of `subject` in insertion order.
    pub fn objects_of(&self, subject: &RecordKey) -> Vec<RecordKey> {
        let Some(subj_idx) = self.node_index.get(subject).map(|idx| *idx.value()) else {
            return Vec::new();
        };
        let graph = self.graph.read().unwrap_or_else(PoisonError::into_inner);
        // petgraph walks a node's adjacency list newest-first.
        let mut objects: Vec<RecordKey> = graph
            .neighbors_directed(subj_idx, Direction::Outgoing)
            .filter_map(|n| graph.node_weight(n).cloned())
            .collect();
        objects.reverse();
        objects
    }
}

impl RelationGraph for RelationIndex {
    fn related_keys(&self, subject: &RecordKey) -> GraphResult<Vec<RecordKey>> {
        Ok(self.objects_of(subject))
    }
}

impl Default for RelationIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RelationIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationIndex")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}
