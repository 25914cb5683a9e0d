//! Engine facade: top-level API for the antirec system.
//!
//! The `Engine` loads the catalog and relation graph once, constructs the
//! configured resolver and history backend, and hands out per-session
//! navigation engines that share them.

use std::sync::Arc;

use crate::catalog::{Catalog, RecordStore};
use crate::config::{EngineConfig, HistoryConfig, RelationSource};
use crate::error::{AntirecResult, ConfigError};
use crate::graph::RelationGraph;
use crate::graph::index::RelationIndex;
use crate::graph::sparql::ArkgStore;
use crate::history::durable::DurableHistory;
use crate::history::{History, MemHistory, UserId};
use crate::navigation::NavigationEngine;
use crate::paths::AntirecPaths;
use crate::record::{AntiRecommendation, RecordKey};
use crate::resolve::path::PathGraph;
use crate::resolve::{KeyUniverse, Resolver, ResolverKind, build_resolver};
use crate::session::SessionRegistry;

/// The antirec engine.
///
/// Owns the shared, read-only resolution inputs: catalog, relation graph,
/// resolver, and the history client.
pub struct Engine {
    config: EngineConfig,
    catalog: Arc<Catalog>,
    graph: Arc<dyn RelationGraph>,
    universe: KeyUniverse,
    resolver: Arc<dyn Resolver>,
    history: Arc<dyn History>,
}

impl Engine {
    /// Load everything the configuration names. `paths` supplies the default
    /// history directory when a durable backend has none configured.
    pub fn new(config: EngineConfig, paths: Option<&AntirecPaths>) -> AntirecResult<Self> {
        config.validate()?;

        let catalog = match &config.catalog {
            Some(path) => Catalog::load(path)?,
            None => Catalog::new(),
        };

        let graph: Arc<dyn RelationGraph> = match &config.relations {
            RelationSource::None => Arc::new(RelationIndex::new()),
            RelationSource::Json { path } => Arc::new(RelationIndex::load(path)?),
            RelationSource::Arkg {
                path,
                base_iri,
                format,
            } => Arc::new(ArkgStore::load(path, *format, base_iri)?),
        };

        let history: Arc<dyn History> = match &config.history {
            HistoryConfig::Memory => Arc::new(MemHistory::new()),
            HistoryConfig::Durable { data_dir } => {
                let dir = data_dir
                    .clone()
                    .or_else(|| paths.map(AntirecPaths::history_dir))
                    .ok_or_else(|| ConfigError::Invalid {
                        message: "durable history needs `history.data_dir` or a resolvable home directory"
                            .into(),
                    })?;
                Arc::new(DurableHistory::open(&dir)?)
            }
        };

        Self::from_parts(config, catalog, graph, history)
    }

    /// Assemble an engine from already-loaded parts.
    pub fn from_parts(
        config: EngineConfig,
        catalog: Catalog,
        graph: Arc<dyn RelationGraph>,
        history: Arc<dyn History>,
    ) -> AntirecResult<Self> {
        let universe = KeyUniverse::new(catalog.keys());
        let resolver = build_resolver(
            config.resolver.kind,
            Arc::clone(&graph),
            universe.clone(),
            config.resolver.seed.as_ref(),
        )?;

        tracing::info!(
            records = catalog.len(),
            resolver = resolver.name(),
            "antirec engine ready"
        );

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
            graph,
            universe,
            resolver,
            history,
        })
    }

    /// A fresh navigation engine for `user`.
    pub fn navigator(&self, user: UserId) -> NavigationEngine {
        NavigationEngine::new(
            user,
            self.catalog.clone(),
            Arc::clone(&self.resolver),
            Arc::clone(&self.history),
        )
    }

    /// A session registry sharing this engine's inputs.
    pub fn sessions(&self) -> SessionRegistry {
        SessionRegistry::new(
            self.catalog.clone(),
            Arc::clone(&self.resolver),
            Arc::clone(&self.history),
        )
    }

    /// One-shot resolution for `user` with no navigation side effects.
    pub fn anti_recommendations(
        &self,
        key: &RecordKey,
        user: &UserId,
    ) -> AntirecResult<Vec<AntiRecommendation>> {
        let seen = self.history.get(user)?;
        let resolved = self.resolver.resolve(key, &seen)?;
        Ok(resolved
            .iter()
            .filter_map(|k| self.catalog.item(k))
            .map(|item| AntiRecommendation::from_item(item, &self.config.url_base))
            .collect())
    }

    /// Walk the relation graph from `seed` (the configured seed by default).
    ///
    /// Proportional to the catalog size; not for request paths.
    pub fn path_graph(&self, seed: Option<&RecordKey>) -> AntirecResult<PathGraph> {
        let seed = seed.or(self.config.resolver.seed.as_ref());
        Ok(PathGraph::build(self.graph.as_ref(), &self.universe, seed)?)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn history(&self) -> &dyn History {
        self.history.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Summary information about the engine state.
    pub fn info(&self) -> EngineInfo {
        EngineInfo {
            records: self.catalog.len(),
            resolver: self.config.resolver.kind,
            relations: match &self.config.relations {
                RelationSource::None => "none",
                RelationSource::Json { .. } => "json",
                RelationSource::Arkg { .. } => "arkg",
            },
            durable_history: matches!(self.config.history, HistoryConfig::Durable { .. }),
        }
    }
}

/// Summary information about the engine state.
#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub records: usize,
    pub resolver: ResolverKind,
    pub relations: &'static str,
    pub durable_history: bool,
}

impl std::fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "antirec engine info")?;
        writeln!(f, "  records:      {}", self.records)?;
        writeln!(f, "  relations:    {}", self.relations)?;
        writeln!(f, "  resolver:     {}", self.resolver)?;
        writeln!(f, "  durable:      {}", self.durable_history)?;
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("records", &self.catalog.len())
            .finish()
    }
}
