//! Session registry: one navigation engine per active session.
//!
//! Engines are kept in a `DashMap` keyed by [`SessionId`], each behind its own
//! mutex. Calls against one session are serialized; different sessions
//! proceed concurrently and share the read-only catalog and resolver.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};

use crate::catalog::RecordStore;
use crate::error::{AntirecResult, SessionError};
use crate::history::{History, UserId};
use crate::navigation::NavigationEngine;
use crate::resolve::Resolver;

/// Opaque handle of a client session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry of per-session navigation engines.
pub struct SessionRegistry {
    records: Arc<dyn RecordStore>,
    resolver: Arc<dyn Resolver>,
    history: Arc<dyn History>,
    sessions: DashMap<SessionId, Arc<Mutex<NavigationEngine>>>,
}

impl SessionRegistry {
    pub fn new(
        records: Arc<dyn RecordStore>,
        resolver: Arc<dyn Resolver>,
        history: Arc<dyn History>,
    ) -> Self {
        Self {
            records,
            resolver,
            history,
            sessions: DashMap::new(),
        }
    }

    /// Open `session` for `user`.
    ///
    /// Reopening an existing session for a different user resets its
    /// navigation state; reopening for the same user keeps it.
    pub fn open(&self, session: &SessionId, user: UserId) -> AntirecResult<()> {
        // Check and insert under one entry lock so racing opens cannot both
        // see the session as missing.
        let existing = match self.sessions.entry(session.clone()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                tracing::debug!(%session, %user, "session opened");
                entry.insert(Arc::new(Mutex::new(NavigationEngine::new(
                    user,
                    Arc::clone(&self.records),
                    Arc::clone(&self.resolver),
                    Arc::clone(&self.history),
                ))));
                return Ok(());
            }
        };

        let mut engine = existing.lock().map_err(|_| SessionError::Poisoned {
            session: session.to_string(),
        })?;
        if engine.user() != &user {
            engine.reset(user);
        }
        Ok(())
    }

    /// Run `f` with exclusive access to the session's engine.
    pub fn with_session<T>(
        &self,
        session: &SessionId,
        f: impl FnOnce(&mut NavigationEngine) -> AntirecResult<T>,
    ) -> AntirecResult<T> {
        // Clone the handle out so the map shard is not held while `f` runs.
        let engine = self
            .sessions
            .get(session)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SessionError::NotFound {
                session: session.to_string(),
            })?;
        let mut engine = engine.lock().map_err(|_| SessionError::Poisoned {
            session: session.to_string(),
        })?;
        f(&mut engine)
    }

    /// Forget a session. Returns whether it existed.
    pub fn close(&self, session: &SessionId) -> bool {
        let removed = self.sessions.remove(session).is_some();
        if removed {
            tracing::debug!(%session, "session closed");
        }
        removed
    }

    pub fn contains(&self, session: &SessionId) -> bool {
        self.sessions.contains_key(session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.len())
            .finish()
    }
}
