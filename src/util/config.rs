//! Configuration file support for Stagecraft.
//!
//! Stagecraft supports two configuration file locations:
//! - Global: `~/.stagecraft/config.toml` - User-wide defaults
//! - Project: `.stagecraft/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Stagecraft configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Directory where `stagecraft build` writes `<stage>.json` when no
    /// `--out` is given. Unset means stdout.
    pub out_dir: Option<PathBuf>,

    /// Pretty-print emitted documents
    pub pretty: Option<bool>,
}

impl BuildConfig {
    /// Whether documents are pretty-printed (defaults to true).
    pub fn pretty(&self) -> bool {
        self.pretty.unwrap_or(true)
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.build.out_dir.is_some() {
            self.build.out_dir = other.build.out_dir;
        }
        if other.build.pretty.is_some() {
            self.build.pretty = other.build.pretty;
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.stagecraft/config.toml)
/// 2. Global config (~/.stagecraft/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global stagecraft config directory (~/.stagecraft).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".stagecraft"))
}

/// Get the global config path (~/.stagecraft/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.stagecraft/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".stagecraft").join("config.toml")
}
