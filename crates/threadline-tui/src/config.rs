//! Engine configuration.
//!
//! Loaded from a JSON file; every field is optional and falls back to its
//! default. A missing file is not an error, a malformed one is.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Rendering and interaction settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Theme name, see [`crate::Theme::available`].
    pub theme: String,
    /// Render tool calls as full blocks instead of one-line trailers.
    pub show_tool_details: bool,
    /// Render reasoning parts.
    pub show_thinking: bool,
    /// Animation tick while work is in flight.
    pub tick_interval_ms: u64,
    /// Lines per wheel notch.
    pub scroll_step: usize,
    /// Output lines shown per tool block before truncating.
    pub max_tool_output_lines: usize,
    /// Copy the selection to the clipboard on mouse release.
    pub copy_on_select: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            theme: "threadline".to_string(),
            show_tool_details: false,
            show_thinking: false,
            tick_interval_ms: 100,
            scroll_step: 3,
            max_tool_output_lines: 10,
            copy_on_select: true,
        }
    }
}

impl EngineConfig {
    /// Load from `path`. Missing files yield defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `<config dir>/threadline/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("threadline").join("config.json"))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
