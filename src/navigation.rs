//! Navigation engine: forward/backward paging through resolution chains.
//!
//! A [`NavigationEngine`] belongs to one session. It keeps the frame currently
//! shown to the client and a LIFO stack of earlier frames, and keeps the
//! user's [`History`] in step with both:
//!
//! - `next` appends the anchor key (unless it is already the newest entry)
//!   before committing the new frame;
//! - `previous` truncates exactly what the undone step appended before
//!   restoring the older frame.
//!
//! The engine is not internally synchronized; callers serialize access
//! (see [`SessionRegistry`](crate::session::SessionRegistry)).

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::catalog::RecordStore;
use crate::error::AntirecResult;
use crate::history::{History, UserId};
use crate::record::{Item, RecordKey};
use crate::resolve::Resolver;

/// One page shown to a client: the anchor item followed by its candidates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    items: Vec<Item>,
}

impl Frame {
    fn new(anchor: Item, candidates: Vec<Item>) -> Self {
        let mut items = Vec::with_capacity(candidates.len() + 1);
        items.push(anchor);
        items.extend(candidates);
        Self { items }
    }

    pub fn anchor(&self) -> &Item {
        &self.items[0]
    }

    pub fn candidates(&self) -> &[Item] {
        &self.items[1..]
    }

    /// Anchor first, then candidates.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn keys(&self) -> Vec<&RecordKey> {
        self.items.iter().map(|item| &item.key).collect()
    }
}

/// A frame together with the number of history entries its forward step appended.
#[derive(Debug, Clone)]
struct Step {
    frame: Frame,
    appended: usize,
}

/// Per-session navigation state over shared, read-only resolution inputs.
pub struct NavigationEngine {
    user: UserId,
    records: Arc<dyn RecordStore>,
    resolver: Arc<dyn Resolver>,
    history: Arc<dyn History>,
    current: Option<Step>,
    stack: Vec<Step>,
    stale_references: usize,
}

impl NavigationEngine {
    pub fn new(
        user: UserId,
        records: Arc<dyn RecordStore>,
        resolver: Arc<dyn Resolver>,
        history: Arc<dyn History>,
    ) -> Self {
        Self {
            user,
            records,
            resolver,
            history,
            current: None,
            stack: Vec::new(),
            stale_references: 0,
        }
    }

    /// First page for the session: resolve from the newest history entry that
    /// still has a catalog record, or from the first catalog key.
    ///
    /// History entries whose records left the catalog are skipped and counted
    /// as stale references.
    pub fn initial(&mut self) -> AntirecResult<Vec<Item>> {
        let history = self.history.get(&self.user)?;
        let mut start = None;
        for key in history.iter().rev() {
            if self.records.contains(key) {
                start = Some(key.clone());
                break;
            }
            self.note_stale(key);
        }
        let start = start.or_else(|| self.records.first_key());
        match start {
            Some(key) => self.next(&key),
            None => {
                tracing::debug!(user = %self.user, "empty catalog, nothing to show");
                Ok(Vec::new())
            }
        }
    }

    /// Resolve `key` and, if anything resolves, make it the current frame.
    ///
    /// Returns the candidates (anchor excluded). An empty result leaves the
    /// navigation state and history untouched.
    pub fn next(&mut self, key: &RecordKey) -> AntirecResult<Vec<Item>> {
        let Some(anchor) = self.records.get(key) else {
            self.note_stale(key);
            return Ok(Vec::new());
        };

        let seen = self.history.get(&self.user)?;
        let resolved = self.resolver.resolve(key, &seen)?;
        let candidates = self.materialize(key, resolved);

        if candidates.is_empty() {
            tracing::debug!(user = %self.user, %key, "dead end, state unchanged");
            return Ok(Vec::new());
        }

        // History first: a failed write must leave the frame uncommitted.
        let appended = if seen.last() == Some(key) {
            0
        } else {
            self.history.append(&self.user, key)?;
            1
        };

        if let Some(previous) = self.current.take() {
            self.stack.push(previous);
        }
        self.current = Some(Step {
            frame: Frame::new(anchor, candidates.clone()),
            appended,
        });
        tracing::debug!(
            user = %self.user,
            %key,
            candidates = candidates.len(),
            depth = self.stack.len(),
            "advanced"
        );
        Ok(candidates)
    }

    /// Step back to the previous frame and return it whole (anchor included).
    ///
    /// With nothing to go back to, returns an empty list and leaves history alone.
    pub fn previous(&mut self) -> AntirecResult<Vec<Item>> {
        if self.stack.is_empty() {
            return Ok(Vec::new());
        }

        let undo = self.current.as_ref().map_or(0, |step| step.appended);
        if undo > 0 {
            self.history.truncate_last(&self.user, undo)?;
        }

        let Some(restored) = self.stack.pop() else {
            return Ok(Vec::new());
        };
        let items = restored.frame.items.clone();
        self.current = Some(restored);
        tracing::debug!(user = %self.user, depth = self.stack.len(), "stepped back");
        Ok(items)
    }

    /// Drop all in-memory navigation state and switch to `user`.
    ///
    /// Persisted history is not touched.
    pub fn reset(&mut self, user: UserId) {
        tracing::debug!(from = %self.user, to = %user, "navigation reset");
        self.user = user;
        self.current = None;
        self.stack.clear();
    }

    /// The frame currently shown, if any.
    pub fn current_frame(&self) -> Option<&Frame> {
        self.current.as_ref().map(|step| &step.frame)
    }

    /// Number of frames that `previous` can step back through.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Resolved keys so far that had no catalog entry.
    pub fn stale_references(&self) -> usize {
        self.stale_references
    }

    /// Map resolved keys to items, dropping stale keys, repeats, and the anchor.
    fn materialize(&mut self, anchor: &RecordKey, resolved: Vec<RecordKey>) -> Vec<Item> {
        let mut emitted: HashSet<RecordKey> = HashSet::with_capacity(resolved.len());
        let mut items = Vec::with_capacity(resolved.len());
        for key in resolved {
            if &key == anchor || emitted.contains(&key) {
                continue;
            }
            match self.records.get(&key) {
                Some(item) => {
                    emitted.insert(key);
                    items.push(item);
                }
                None => self.note_stale(&key),
            }
        }
        items
    }

    fn note_stale(&mut self, key: &RecordKey) {
        self.stale_references += 1;
        tracing::warn!(
            %key,
            resolver = self.resolver.name(),
            "stale reference: key has no catalog record"
        );
    }
}

impl std::fmt::Debug for NavigationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationEngine")
            .field("user", &self.user)
            .field("current", &self.current_frame().map(Frame::keys))
            .field("depth", &self.depth())
            .finish()
    }
}
