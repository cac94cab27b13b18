use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::export::{DEFAULT_COMPRESSION, DEFAULT_FILE_NAME};

/// Overrides `export_dir` when set.
pub const EXPORT_DIR_ENV: &str = "PROFILE_EDITOR_EXPORT_DIR";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
/// Persisted UI/application settings. Edit parameters are never stored.
pub struct AppConfig {
    pub window_width: Option<f32>,
    pub window_height: Option<f32>,
    pub last_open_dir: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub export_file_name: Option<String>,
    pub png_compression: Option<u8>,
    pub dark_mode: Option<bool>,
}

impl AppConfig {
    /// Returns the user config file path, if a config directory is available.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("profile-editor").join("config.toml"))
    }

    /// Loads config from disk, falling back to defaults on any error.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Self {
        toml::from_str(contents).unwrap_or_else(|err| {
            tracing::warn!(%err, "ignoring malformed config");
            Self::default()
        })
    }

    /// Writes config to disk, ignoring filesystem/serialization errors.
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(s) = toml::to_string_pretty(self) {
            let _ = std::fs::write(&path, s);
        }
    }

    /// Download directory: env override, then config, then the user's
    /// download or home directory.
    pub fn resolved_export_dir(&self) -> PathBuf {
        let from_env = std::env::var_os(EXPORT_DIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        from_env
            .or_else(|| self.export_dir.clone())
            .or_else(dirs::download_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn file_name(&self) -> &str {
        self.export_file_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(DEFAULT_FILE_NAME)
    }

    pub fn compression(&self) -> u8 {
        self.png_compression.unwrap_or(DEFAULT_COMPRESSION).min(9)
    }
}
