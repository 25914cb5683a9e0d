//! Engine configuration, persisted as TOML.
//!
//! ```toml
//! catalog = "data/records.jsonl"
//! url_base = "https://en.wikipedia.org/wiki/"
//!
//! [relations]
//! source = "arkg"
//! path = "data/arkg.ttl"
//! base_iri = "http://example.org/arkg/"
//! format = "turtle"
//!
//! [resolver]
//! kind = "graph"
//!
//! [history]
//! backend = "durable"
//! data_dir = "/var/lib/antirec"
//! ```
//!
//! Every field has a default, so an empty file is a valid (memory-only,
//! edge-less) configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::graph::sparql::ArkgFormat;
use crate::record::RecordKey;
use crate::resolve::ResolverKind;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Catalog file (JSON array or JSON lines). `None` means an empty catalog.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    /// Prefix for anti-recommendation URLs of records without their own URL.
    #[serde(default = "default_url_base")]
    pub url_base: String,
    #[serde(default)]
    pub relations: RelationSource,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Where relation edges come from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum RelationSource {
    /// No edges: every resolution falls back to the global scan.
    #[default]
    None,
    /// JSON file of `{subject, objects}` groups.
    Json { path: PathBuf },
    /// RDF serialization of an Anti-Recommendation Knowledge Graph.
    Arkg {
        path: PathBuf,
        #[serde(default = "default_base_iri")]
        base_iri: String,
        #[serde(default)]
        format: ArkgFormat,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub kind: ResolverKind,
    /// Start of the eager walk for the `path` resolver.
    #[serde(default)]
    pub seed: Option<RecordKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum HistoryConfig {
    #[default]
    Memory,
    /// redb database; `data_dir` defaults to the XDG data directory.
    Durable {
        #[serde(default)]
        data_dir: Option<PathBuf>,
    },
}

fn default_url_base() -> String {
    "https://en.wikipedia.org/wiki/".into()
}

fn default_base_iri() -> String {
    "http://example.org/arkg/".into()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            url_base: default_url_base(),
            relations: RelationSource::default(),
            resolver: ResolverConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::parse(&content, &path.display().to_string())?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Load `path` if it exists, otherwise return defaults.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse and validate TOML text. `origin` is only used in error messages.
    pub fn parse(content: &str, origin: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.url_base.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "`url_base` must not be empty".into(),
            });
        }
        if let RelationSource::Arkg { base_iri, .. } = &self.relations {
            if base_iri.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    message: "`relations.base_iri` must not be empty for an ARKG source".into(),
                });
            }
        }
        Ok(())
    }
}
