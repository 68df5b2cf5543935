//! Grid configuration.
//!
//! [`GridConfig`] collects the settings a host usually keeps in a file. All
//! fields have defaults, so a configuration file only lists what it changes:
//!
//! ```toml
//! selection_mode = "multi"
//! multi_sort = true
//! page_size = 100
//!
//! [editor]
//! buffered = true
//! confirm_cancel = true
//! message = "Discard your changes?"
//! ```

use std::path::Path;

use enhanced_grid_core::{GridError, Result};
use serde::{Deserialize, Serialize};

use crate::model::{EditorConfig, SelectionMode};

/// Default number of rows fetched per page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Settings of an [`EnhancedGrid`](crate::EnhancedGrid).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub selection_mode: SelectionMode,
    /// Whether the selected row can be deselected in single mode.
    pub deselect_allowed: bool,
    /// Whether adding a sort key keeps the existing ones.
    pub multi_sort: bool,
    pub page_size: usize,
    pub editor: EditorConfig,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            selection_mode: SelectionMode::default(),
            deselect_allowed: true,
            multi_sort: false,
            page_size: DEFAULT_PAGE_SIZE,
            editor: EditorConfig::default(),
        }
    }
}

impl GridConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| GridError::config("failed to parse grid configuration", e))?;
        config.validate()
    }

    /// Reads a configuration from a TOML file.
    pub fn load_toml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| GridError::config(format!("failed to read {}", path.display()), e))?;
        Self::from_toml_str(&text)
    }

    /// Serializes the configuration to TOML text.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| GridError::config("failed to serialize grid configuration", e))
    }

    fn validate(self) -> Result<Self> {
        if self.page_size == 0 {
            return Err(GridError::Config {
                message: "page_size must be at least 1".into(),
                source: None,
            });
        }
        Ok(self)
    }
}
