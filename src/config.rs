//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. TOML config file (platform config dir, or `--config PATH`)
//! 3. `APOD_CACHE_*` environment variables, one per field
//!    (`APOD_CACHE_CACHE_DIR`, `APOD_CACHE_NAMING`, ...)
//! 4. CLI flags, applied by the caller after loading
//!
//! ```toml
//! cache_dir = "/home/me/Pictures/apod"
//! naming = "fingerprint_suffix"
//! default_extension = "jpg"
//! ```

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cache::naming::{DEFAULT_BASE_NAME, DEFAULT_EXTENSION};
use crate::cache::{CacheConfig, NamingPolicy, PathNamer, DEFAULT_DATABASE_NAME};

/// Prefix of environment variables read by [`Config::load`].
pub const ENV_PREFIX: &str = "APOD_CACHE_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding cached images and the metadata database.
    /// Defaults to the platform data directory.
    pub cache_dir: Option<PathBuf>,

    /// Metadata database file name inside `cache_dir`.
    pub database_name: String,

    /// How cached file names are formed.
    pub naming: NamingPolicy,

    /// Extension used when the source URL has none.
    pub default_extension: String,

    /// Base name used when a title sanitizes to nothing.
    pub fallback_title: String,

    /// Delete a written image when its metadata cannot be recorded.
    pub cleanup_orphans: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: None,
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            naming: NamingPolicy::TitleOnly,
            default_extension: DEFAULT_EXTENSION.to_string(),
            fallback_title: DEFAULT_BASE_NAME.to_string(),
            cleanup_orphans: true,
        }
    }
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    ///
    /// Falls back to defaults if anything goes wrong.
    pub fn load() -> Self {
        match Self::config_path() {
            Ok(path) => Self::load_from_path(&path),
            Err(e) => {
                log::debug!("Failed to locate config file, using defaults: {}", e);
                Self::figment(None).extract().unwrap_or_default()
            }
        }
    }

    /// Load the configuration from `path` plus the environment.
    ///
    /// A missing file is not an error; an unreadable or invalid one is logged
    /// and defaults are used instead.
    pub fn load_from_path(path: &Path) -> Self {
        match Self::try_load_from_path(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    /// Strict variant of [`load_from_path`](Self::load_from_path).
    pub fn try_load_from_path(path: &Path) -> Result<Self> {
        Self::figment(Some(path))
            .extract()
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path.filter(|p| p.exists()) {
            log::debug!("Loading config from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default platform-specific configuration path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// The configured cache directory, or the platform default.
    pub fn resolved_cache_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs()?.data_dir().join("images")),
        }
    }

    /// Translate into the cache's own settings.
    pub fn cache_config(&self) -> Result<CacheConfig> {
        let namer = PathNamer::new(self.naming, &self.default_extension, &self.fallback_title);
        let mut config = CacheConfig::new(self.resolved_cache_dir()?)
            .with_namer(namer)
            .with_cleanup_orphans(self.cleanup_orphans);
        config.database_name = self.database_name.clone();
        Ok(config)
    }

    /// Render as a TOML document that [`load_from_path`](Self::load_from_path) accepts.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "apod-cache", "apod-cache")
        .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))
}
