//! XDG-compliant path resolution for antirec.

use std::path::PathBuf;

use crate::config::ConfigResult;
use crate::error::ConfigError;

/// Global XDG-compliant directories for antirec.
#[derive(Debug, Clone)]
pub struct AntirecPaths {
    /// `$XDG_CONFIG_HOME/antirec/`
    pub config_dir: PathBuf,
    /// `$XDG_DATA_HOME/antirec/`
    pub data_dir: PathBuf,
}

impl AntirecPaths {
    /// Resolve XDG directories from environment variables with standard fallbacks.
    pub fn resolve() -> ConfigResult<Self> {
        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .map_err(|_| ConfigError::NoHome)?;

        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".config"))
            .join("antirec");

        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home.join(".local/share"))
            .join("antirec");

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// Paths rooted under an explicit directory (tests, portable installs).
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
        }
    }

    /// `config.toml` in the config directory.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Directory of the durable history database.
    pub fn history_dir(&self) -> PathBuf {
        self.data_dir.join("history")
    }
}
