//! Application context.
//!
//! One [`AppContext`] is built at startup and passed by reference to whatever
//! needs it. Nothing in the crate reads configuration from global state.
//!
//! Resolution order for the config file:
//! 1. An explicit `--config` path (must exist)
//! 2. The `REEL_CONFIG` environment variable (must exist)
//! 3. `<config dir>/reel/config.toml` if present
//! 4. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, Result};

pub const CONFIG_ENV: &str = "REEL_CONFIG";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppContext {
    pub name: String,
    #[serde(skip_deserializing)]
    pub version: String,
    /// Main window geometry, e.g. `"900x400+30+30"`.
    pub geometry: Option<String>,
    pub database: PathBuf,
    pub lookup: LookupConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Size of the [`LookupWorker`](crate::lookup::LookupWorker) pool.
    pub workers: usize,
    /// Longest an event-loop turn waits on lookup results.
    pub poll_interval_ms: u64,
}

impl Default for AppContext {
    fn default() -> Self {
        Self {
            name: "reel".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            geometry: None,
            database: PathBuf::from("movies.sqlite3"),
            lookup: LookupConfig::default(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl AppContext {
    /// Resolve and load the context using the process environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::resolve(explicit, from_env.as_deref(), default_config_path().as_deref())
    }

    /// Resolution with every source passed in.
    pub fn resolve(
        explicit: Option<&Path>,
        from_env: Option<&Path>,
        fallback: Option<&Path>,
    ) -> Result<Self> {
        if let Some(path) = explicit.or(from_env) {
            if !path.exists() {
                return Err(ReelError::MissingConfig {
                    path: path.to_path_buf(),
                });
            }
            return Self::from_path(path);
        }
        match fallback {
            Some(path) if path.exists() => Self::from_path(path),
            _ => {
                tracing::debug!(message = "config.defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let context = Self::from_toml_str(&content)?;
        tracing::debug!(message = "config.loaded", path = %path.display());
        Ok(context)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut context: Self = toml::from_str(content)?;
        context.lookup.workers = context.lookup.workers.max(1);
        Ok(context)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.lookup.poll_interval_ms)
    }
}

/// Platform config location, e.g. `~/.config/reel/config.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("reel").join("config.toml"))
}
