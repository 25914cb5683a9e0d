//! Crash-safe history store backed by redb.
//!
//! Each user's log is one row: user id → bincode-encoded `Vec<RecordKey>`.
//! Appends and truncations are read-modify-write inside a single write
//! transaction, so concurrent sessions of the same user never lose entries.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use crate::error::HistoryError;
use crate::record::RecordKey;

use super::{History, HistoryResult, UserId};

const HISTORY_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("history");

/// History persisted in a redb database file.
pub struct DurableHistory {
    db: Arc<Database>,
}

impl DurableHistory {
    /// Open or create the history database in `data_dir`.
    pub fn open(data_dir: &Path) -> HistoryResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|source| HistoryError::Io { source })?;
        let db_path = data_dir.join("history.redb");
        let db = Database::create(&db_path).map_err(|e| HistoryError::Backend {
            user: "*".into(),
            message: format!("failed to open redb at {}: {e}", db_path.display()),
        })?;

        // Create the table up front so read transactions never see it missing.
        let txn = db.begin_write().map_err(|e| backend("*", "begin_write", e))?;
        txn.open_table(HISTORY_TABLE)
            .map_err(|e| backend("*", "open_table", e))?;
        txn.commit().map_err(|e| backend("*", "commit", e))?;

        tracing::info!(path = %db_path.display(), "durable history opened");
        Ok(Self { db: Arc::new(db) })
    }

    /// Apply `edit` to the user's log inside one write transaction.
    fn modify(
        &self,
        user: &UserId,
        edit: impl FnOnce(&mut Vec<RecordKey>),
    ) -> HistoryResult<()> {
        let who = user.as_str();
        let txn = self
            .db
            .begin_write()
            .map_err(|e| backend(who, "begin_write", e))?;
        {
            let mut table = txn
                .open_table(HISTORY_TABLE)
                .map_err(|e| backend(who, "open_table", e))?;
            let mut log = match table.get(who).map_err(|e| backend(who, "get", e))? {
                Some(guard) => decode(who, guard.value())?,
                None => Vec::new(),
            };
            edit(&mut log);
            let encoded = bincode::serialize(&log).map_err(|e| HistoryError::Decode {
                user: who.to_string(),
                message: format!("failed to encode history: {e}"),
            })?;
            table
                .insert(who, encoded.as_slice())
                .map_err(|e| backend(who, "insert", e))?;
        }
        txn.commit().map_err(|e| backend(who, "commit", e))?;
        Ok(())
    }
}

impl History for DurableHistory {
    fn get(&self, user: &UserId) -> HistoryResult<Vec<RecordKey>> {
        let who = user.as_str();
        let txn = self
            .db
            .begin_read()
            .map_err(|e| backend(who, "begin_read", e))?;
        let table = txn
            .open_table(HISTORY_TABLE)
            .map_err(|e| backend(who, "open_table", e))?;
        match table.get(who).map_err(|e| backend(who, "get", e))? {
            Some(guard) => decode(who, guard.value()),
            None => Ok(Vec::new()),
        }
    }

    fn append(&self, user: &UserId, key: &RecordKey) -> HistoryResult<()> {
        self.modify(user, |log| log.push(key.clone()))
    }

    fn truncate_last(&self, user: &UserId, n: usize) -> HistoryResult<()> {
        self.modify(user, |log| log.truncate(log.len().saturating_sub(n)))
    }
}

fn backend(user: &str, op: &str, err: impl std::fmt::Display) -> HistoryError {
    HistoryError::Backend {
        user: user.to_string(),
        message: format!("{op} failed: {err}"),
    }
}

fn decode(user: &str, bytes: &[u8]) -> HistoryResult<Vec<RecordKey>> {
    bincode::deserialize(bytes).map_err(|e| HistoryError::Decode {
        user: user.to_string(),
        message: e.to_string(),
    })
}

impl std::fmt::Debug for DurableHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableHistory").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(s: &str) -> RecordKey {
        RecordKey::new(s).unwrap()
    }

    fn user(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    #[test]
    fn append_get_truncate() {
        let dir = TempDir::new().unwrap();
        let history = DurableHistory::open(dir.path()).unwrap();

        assert!(history.get(&user("u1")).unwrap().is_empty());
        history.append(&user("u1"), &key("A")).unwrap();
        history.append(&user("u1"), &key("B")).unwrap();
        assert_eq!(history.get(&user("u1")).unwrap(), vec![key("A"), key("B")]);

        history.truncate_last(&user("u1"), 1).unwrap();
        assert_eq!(history.get(&user("u1")).unwrap(), vec![key("A")]);
    }

    #[test]
    fn persistence_across_reopens() {
        let dir = TempDir::new().unwrap();
        {
            let history = DurableHistory::open(dir.path()).unwrap();
            history.append(&user("u1"), &key("Octopus")).unwrap();
        }

        let history = DurableHistory::open(dir.path()).unwrap();
        assert_eq!(history.last_seen(&user("u1")).unwrap(), Some(key("Octopus")));
    }

    #[test]
    fn truncating_unknown_user_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let history = DurableHistory::open(dir.path()).unwrap();
        history.truncate_last(&user("ghost"), 3).unwrap();
        assert!(history.get(&user("ghost")).unwrap().is_empty());
    }
}
