//! Layered configuration for BookLib.
//!
//! Values are resolved in order, later sources winning:
//! 1. Built-in defaults.
//! 2. A TOML file (`booklib.toml` in the platform config directory unless a
//!    path is given). A missing file is not an error.
//! 3. Environment variables prefixed with `BOOKLIB_`, using `__` to reach
//!    nested keys: `BOOKLIB_DATABASE__MAX_CONNECTIONS=8`.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::instrument;

const ENV_PREFIX: &str = "BOOKLIB_";
const CONFIG_FILE: &str = "booklib.toml";
const DATABASE_FILE: &str = "booklib.db";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: DatabaseConfig,
}

/// How to reach the catalogue database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite file; created on first connect. Ignored when `in_memory` is set.
    pub path: PathBuf,
    pub max_connections: u32,
    /// How long a connection waits on a locked database before giving up.
    pub busy_timeout_ms: u64,
    /// Use a throwaway in-memory database instead of `path`.
    pub in_memory: bool,
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: 5,
            busy_timeout_ms: 1500,
            in_memory: false,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "booklib")
}

fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILE))
}

impl Config {
    /// Where the configuration file is looked for when no path is given.
    pub fn default_file() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
    }

    /// Resolve configuration from defaults, the TOML file and the environment.
    #[instrument(skip_all)]
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = file.map(Path::to_path_buf).unwrap_or_else(Self::default_file);
        tracing::debug!(file = %file.display(), "Loading configuration");
        let config: Self = Figment::new()
            .merge(Toml::file(&file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.max_connections == 0 {
            exn::bail!(ErrorKind::Invalid("database.max_connections cannot be 0".to_string()));
        }
        if !self.database.in_memory && self.database.path.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("database.path cannot be empty".to_string()));
        }
        Ok(())
    }
}
