//! Eager path-graph resolution.
//!
//! A [`PathGraph`] is built once from a seed key by walking the relation graph
//! until every known key has been visited exactly once. Resolution afterwards
//! is a map lookup with no graph queries. Building costs time and memory
//! proportional to the catalog and must happen at warm-up.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::graph::{GraphResult, RelationGraph, distinct_objects};
use crate::record::RecordKey;

use super::{KeyUniverse, Resolver, novelty_first};

/// One recorded step of the walk: a subject and the candidates shown for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFrame {
    pub subject: RecordKey,
    pub candidates: Vec<RecordKey>,
}

/// The ordered frames of a full walk over the catalog.
#[derive(Debug, Clone, Default)]
pub struct PathGraph {
    frames: Vec<PathFrame>,
    by_subject: HashMap<RecordKey, usize>,
    visit_order: Vec<RecordKey>,
}

impl PathGraph {
    /// Walk `graph` starting from `seed`.
    ///
    /// The work queue is the sorted universe. At each step the head leaves
    /// the queue and its direct edges are queried:
    ///
    /// - with edges, a frame `(head, edges)` is recorded and the next head is
    ///   the first edge still queued;
    /// - without edges, the queue front is popped, recorded as the single
    ///   candidate of `head`, and becomes the next head.
    ///
    /// When no next head was chosen the queue front is taken. An unknown or
    /// absent seed starts from the first key of the universe.
    pub fn build(
        graph: &dyn RelationGraph,
        universe: &KeyUniverse,
        seed: Option<&RecordKey>,
    ) -> GraphResult<Self> {
        let mut queue: BTreeSet<RecordKey> = universe.iter().cloned().collect();
        let mut path = PathGraph::default();

        let mut head = match seed {
            Some(seed) if queue.contains(seed) => Some(seed.clone()),
            _ => queue.pop_first(),
        };

        while let Some(current) = head.take() {
            queue.remove(&current);
            path.visit_order.push(current.clone());

            let edges = distinct_objects(&current, graph.related_keys(&current)?);
            if !edges.is_empty() {
                head = edges.iter().find(|edge| queue.contains(*edge)).cloned();
                path.record(current, edges);
            } else if let Some(next) = queue.pop_first() {
                path.record(current, vec![next.clone()]);
                head = Some(next);
            }

            if head.is_none() {
                head = queue.pop_first();
            }
        }

        tracing::info!(
            frames = path.frames.len(),
            visited = path.visit_order.len(),
            "path graph built"
        );
        Ok(path)
    }

    fn record(&mut self, subject: RecordKey, candidates: Vec<RecordKey>) {
        self.by_subject.insert(subject.clone(), self.frames.len());
        self.frames.push(PathFrame {
            subject,
            candidates,
        });
    }

    /// Frames in walk order.
    pub fn frames(&self) -> &[PathFrame] {
        &self.frames
    }

    /// The frame whose subject is `key`, if the walk recorded one.
    pub fn frame_for(&self, key: &RecordKey) -> Option<&PathFrame> {
        self.by_subject.get(key).map(|&i| &self.frames[i])
    }

    /// Every visited key, in the order the walk reached it.
    pub fn visit_order(&self) -> &[RecordKey] {
        &self.visit_order
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Resolver serving candidates from a prebuilt [`PathGraph`].
#[derive(Debug)]
pub struct PathGraphResolver {
    path: PathGraph,
}

impl PathGraphResolver {
    pub fn new(path: PathGraph) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathGraph {
        &self.path
    }
}

impl Resolver for PathGraphResolver {
    fn resolve(&self, key: &RecordKey, seen: &[RecordKey]) -> GraphResult<Vec<RecordKey>> {
        let Some(frame) = self.path.frame_for(key) else {
            tracing::debug!(%key, "no path frame for key");
            return Ok(Vec::new());
        };
        let seen: HashSet<&RecordKey> = seen.iter().collect();
        let (mut unseen, already_seen) = novelty_first(&frame.candidates, &seen);
        unseen.extend(already_seen);
        Ok(unseen)
    }

    fn name(&self) -> &'static str {
        "path"
    }
}
