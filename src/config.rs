//! @dose
//! purpose: Configuration file parsing for prefab.toml. Supplies the components directory,
//!     manifest output path, record constants and exclusion patterns.
//!
//! when-editing:
//!     - !Config is loaded once per run and passed through the call chain
//!     - CLI flags override these values in cli::CommonOptions
//!
//! invariants:
//!     - Config::load returns default config if prefab.toml doesn't exist
//!     - A file that fails to read or parse is logged and replaced by defaults
//!
//! gotchas:
//!     - components_dir and output are relative to the project root

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const CONFIG_FILE: &str = "prefab.toml";

/// Main configuration structure matching prefab.toml
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one subdirectory per component
    pub components_dir: PathBuf,

    /// Manifest file written by `generate`
    pub output: PathBuf,

    /// `version` stamped on every component record
    pub version: String,

    /// `baseDir` stamped on every component record
    pub base_dir: String,

    /// Exclusion patterns (gitignore-style, relative to components_dir)
    pub exclude: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            components_dir: PathBuf::from("components"),
            output: PathBuf::from("wmprefab.config.json"),
            version: "1.0.0".to_string(),
            base_dir: "./components".to_string(),
            exclude: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from prefab.toml in the given root directory
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&config_path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %config_path.display(), error = %e, "failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %config_path.display(), error = %e, "failed to read config, using defaults");
                Self::default()
            }
        }
    }
}
