//! Per-user visit history.
//!
//! History is an ordered log of record keys a user has already been shown.
//! The resolver reads it to avoid repeats, forward navigation appends to it
//! and backward navigation truncates it. The production backend is an
//! external service; [`MemHistory`] and [`DurableHistory`](durable::DurableHistory)
//! are the in-process adapters.
//!
//! Every call is a blocking round trip with no retry: retry policy belongs
//! to the backend client.

pub mod durable;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::HistoryError;
use crate::record::RecordKey;

/// Result type for history operations.
pub type HistoryResult<T> = std::result::Result<T, HistoryError>;

/// Opaque identifier of a user, issued by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create a user id, returning `None` if `raw` is blank.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Append-only ordered log of surfaced keys, per user.
pub trait History: Send + Sync {
    /// The user's full history, oldest first. Unknown users have an empty history.
    fn get(&self, user: &UserId) -> HistoryResult<Vec<RecordKey>>;

    /// Append `key` to the user's history.
    fn append(&self, user: &UserId, key: &RecordKey) -> HistoryResult<()>;

    /// Remove the last `n` entries (fewer if the history is shorter).
    fn truncate_last(&self, user: &UserId, n: usize) -> HistoryResult<()>;

    /// The most recently appended key.
    fn last_seen(&self, user: &UserId) -> HistoryResult<Option<RecordKey>> {
        Ok(self.get(user)?.pop())
    }
}

/// Concurrent in-memory history. All data is lost on process exit.
#[derive(Debug, Default)]
pub struct MemHistory {
    logs: DashMap<UserId, Vec<RecordKey>>,
}

impl MemHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with a history entry.
    pub fn user_count(&self) -> usize {
        self.logs.len()
    }
}

impl History for MemHistory {
    fn get(&self, user: &UserId) -> HistoryResult<Vec<RecordKey>> {
        Ok(self
            .logs
            .get(user)
            .map(|log| log.value().clone())
            .unwrap_or_default())
    }

    fn append(&self, user: &UserId, key: &RecordKey) -> HistoryResult<()> {
        self.logs.entry(user.clone()).or_default().push(key.clone());
        Ok(())
    }

    fn truncate_last(&self, user: &UserId, n: usize) -> HistoryResult<()> {
        if let Some(mut log) = self.logs.get_mut(user) {
            let keep = log.len().saturating_sub(n);
            log.truncate(keep);
        }
        Ok(())
    }

    fn last_seen(&self, user: &UserId) -> HistoryResult<Option<RecordKey>> {
        Ok(self.logs.get(user).and_then(|log| log.last().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> RecordKey {
        RecordKey::new(s).unwrap()
    }

    fn user(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    #[test]
    fn append_and_get_in_order() {
        let history = MemHistory::new();
        history.append(&user("u1"), &key("A")).unwrap();
        history.append(&user("u1"), &key("B")).unwrap();

        assert_eq!(history.get(&user("u1")).unwrap(), vec![key("A"), key("B")]);
        assert_eq!(history.last_seen(&user("u1")).unwrap(), Some(key("B")));
    }

    #[test]
    fn users_are_isolated() {
        let history = MemHistory::new();
        history.append(&user("u1"), &key("A")).unwrap();
        assert!(history.get(&user("u2")).unwrap().is_empty());
        assert_eq!(history.last_seen(&user("u2")).unwrap(), None);
    }

    #[test]
    fn truncate_last_removes_exactly_n() {
        let history = MemHistory::new();
        for k in ["A", "B", "C"] {
            history.append(&user("u1"), &key(k)).unwrap();
        }
        history.truncate_last(&user("u1"), 2).unwrap();
        assert_eq!(history.get(&user("u1")).unwrap(), vec![key("A")]);

        history.truncate_last(&user("u1"), 5).unwrap();
        assert!(history.get(&user("u1")).unwrap().is_empty());
    }

    #[test]
    fn blank_user_id_is_rejected() {
        assert!(UserId::new("  ").is_none());
    }
}
