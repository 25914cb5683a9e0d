// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # antirec
//!
//! An anti-recommendation engine: for a catalog record it resolves a small set
//! of deliberately dissimilar-but-related records, and lets a client page
//! forward through chains of such resolutions and step back again.
//!
//! ## Architecture
//!
//! - **Catalog** (`catalog`): read-only keyed record store, loaded once
//! - **Relation graph** (`graph`): petgraph index or oxigraph ARKG store
//! - **Resolvers** (`resolve`): on-demand graph resolver and eager path-graph resolver
//! - **History** (`history`): per-user visit log (in-memory or redb)
//! - **Navigation** (`navigation`, `session`): per-session frames with undo
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use antirec::catalog::Catalog;
//! use antirec::config::EngineConfig;
//! use antirec::engine::Engine;
//! use antirec::graph::index::RelationIndex;
//! use antirec::history::{MemHistory, UserId};
//! use antirec::record::{Item, RecordKey};
//!
//! let key = |s: &str| RecordKey::new(s).unwrap();
//! let catalog = Catalog::from_items(["Octopus", "Tardigrade"].map(|k| Item::new(key(k), None)));
//! let graph = RelationIndex::new();
//! graph.insert_edge(&key("Octopus"), &key("Tardigrade"));
//!
//! let engine = Engine::from_parts(
//!     EngineConfig::default(),
//!     catalog,
//!     Arc::new(graph),
//!     Arc::new(MemHistory::new()),
//! )
//! .unwrap();
//! let mut nav = engine.navigator(UserId::new("user-1").unwrap());
//! let candidates = nav.initial().unwrap();
//! assert_eq!(candidates[0].key, key("Tardigrade"));
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod history;
pub mod navigation;
pub mod paths;
pub mod record;
pub mod resolve;
pub mod session;
