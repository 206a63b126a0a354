//! Annotation client configuration.
//!
//! Layering, lowest to highest priority:
//! 1. Built-in defaults (collector device at `/dev/gator/annotate`)
//! 2. A JSON file, when the caller loads one
//! 3. Environment overrides (`STREAMLINE_ANNOTATE_PATH`, `STREAMLINE_ANNOTATE_DISABLE`)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

use crate::constants::{DEFAULT_SINK_PATH, ENV_DISABLE, ENV_SINK_PATH};

/// Configuration for an [`crate::Annotator`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Device or file the collector reads annotations from.
    pub sink_path: PathBuf,
    /// When false no sink is opened and every annotation is dropped.
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sink_path: PathBuf::from(DEFAULT_SINK_PATH),
            enabled: true,
        }
    }
}

impl Config {
    /// Defaults with environment overrides applied.
    #[must_use]
    pub fn load() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Load a JSON config file, then apply environment overrides.
    ///
    /// Missing keys take their default values.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `STREAMLINE_ANNOTATE_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var(ENV_SINK_PATH).filter(|p| !p.is_empty()) {
            self.sink_path = PathBuf::from(path);
        }

        if let Some(disable) = var(ENV_DISABLE) {
            if matches!(disable.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes") {
                self.enabled = false;
            }
        }
    }
}
