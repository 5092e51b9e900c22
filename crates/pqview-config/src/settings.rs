//! The settings file.

use std::fs;
use std::path::{Path, PathBuf};

use pqview_model::CoercionPolicy;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

const APP_DIR: &str = "pqview";
const FILE_NAME: &str = "settings.json";

/// Location of the settings file: `<config_dir>/pqview/settings.json`.
///
/// Falls back to the working directory when the platform has no config dir.
pub fn settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(FILE_NAME)
}

/// Persisted user preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Viewer colour scheme preference.
    pub dark_mode: bool,
    /// Conversions the validator may apply to edited cells.
    pub coercion: CoercionPolicy,
    /// Maximum undo depth; `None` keeps every command.
    pub history_limit: Option<usize>,
    /// Rows printed by a preview.
    pub preview_rows: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            coercion: CoercionPolicy::default(),
            history_limit: Some(1000),
            preview_rows: 20,
        }
    }
}

impl Settings {
    /// Load from the platform settings path, creating it with defaults if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&settings_path())
    }

    /// Load from `path`, creating it with defaults if absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let settings = Self::default();
            settings.save_to(path)?;
            tracing::info!(path = %path.display(), "Created default settings");
            return Ok(settings);
        }

        let contents = fs::read_to_string(path).map_err(|e| ConfigError::io("read", path, e))?;
        let settings = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Write as pretty JSON, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::io("create directory", parent, e))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|e| ConfigError::io("write", path, e))
    }
}
