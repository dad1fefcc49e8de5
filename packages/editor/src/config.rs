use crate::{EditorError, EditorResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "guide-editor.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Window within which same-key history pushes are merged
    #[serde(default = "default_coalesce_window_ms")]
    pub coalesce_window_ms: u64,

    /// Maximum number of undo levels (0 = unlimited)
    #[serde(default = "default_history_max_levels")]
    pub history_max_levels: usize,

    /// Offset added to top-level x/y of pasted components
    #[serde(default = "default_paste_offset")]
    pub paste_offset: f64,

    /// Priority of the override installed when freezing a component
    #[serde(default = "default_frozen_priority")]
    pub frozen_priority: i32,
}

fn default_coalesce_window_ms() -> u64 {
    750
}

fn default_history_max_levels() -> usize {
    100
}

fn default_paste_offset() -> f64 {
    5.0
}

fn default_frozen_priority() -> i32 {
    100
}

impl EditorConfig {
    /// Load config from a directory
    pub fn load(dir: impl AsRef<Path>) -> EditorResult<Self> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(EditorConfig::default())
        }
    }

    fn validate(&self) -> EditorResult<()> {
        if !self.paste_offset.is_finite() {
            return Err(EditorError::Config("pasteOffset must be finite".into()));
        }
        Ok(())
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            coalesce_window_ms: default_coalesce_window_ms(),
            history_max_levels: default_history_max_levels(),
            paste_offset: default_paste_offset(),
            frozen_priority: default_frozen_priority(),
        }
    }
}
