// Application settings
// Loaded from ~/.config/edm/config.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api/v1";

/// Overrides the whole config directory (config.toml and auth.json).
const CONFIG_DIR_ENV: &str = "EDM_CONFIG_DIR";
const API_BASE_ENV: &str = "EDM_API_BASE";
const REGIONS_ENV: &str = "EDM_REGIONS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backend API root, without trailing slash
    pub api_base: String,

    /// Boundary dataset (GeoJSON or TopoJSON) listing the tinkhundla
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regions: Option<PathBuf>,

    /// Show the public legend (no "No Data" entry) by default
    pub public_legend: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            regions: None,
            public_legend: false,
        }
    }
}

/// Directory holding config.toml and auth.json.
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("edm")
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Load settings from the default path, then apply env overrides.
    /// A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Self::load_from(&Self::config_path())?;
        Ok(settings.with_env(|key| std::env::var(key).ok()))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings: Settings = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.normalize();
        Ok(settings)
    }

    /// Apply `EDM_API_BASE` / `EDM_REGIONS` through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base) = lookup(API_BASE_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base = base;
        }
        if let Some(path) = lookup(REGIONS_ENV).filter(|v| !v.trim().is_empty()) {
            self.regions = Some(PathBuf::from(path));
        }
        self.normalize();
        self
    }

    /// Save current settings to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }

    fn normalize(&mut self) {
        let trimmed = self.api_base.trim().trim_end_matches('/');
        self.api_base = if trimmed.is_empty() {
            DEFAULT_API_BASE.to_string()
        } else {
            trimmed.to_string()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_base = \"https://edm.example.org/api/v1/\"\n").unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.api_base, "https://edm.example.org/api/v1");
        assert!(settings.regions.is_none());
        assert!(!settings.public_legend);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_base = [").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn env_overrides_file() {
        let settings = Settings::default().with_env(|key| match key {
            "EDM_API_BASE" => Some("http://10.0.0.2:8000/api/v1".into()),
            "EDM_REGIONS" => Some("/data/tinkhundla.topojson".into()),
            _ => None,
        });
        assert_eq!(settings.api_base, "http://10.0.0.2:8000/api/v1");
        assert_eq!(settings.regions, Some(PathBuf::from("/data/tinkhundla.topojson")));

        let untouched = Settings::default().with_env(|_| Some("  ".into()));
        assert_eq!(untouched, Settings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let settings = Settings {
            api_base: "https://edm.example.org/api/v1".into(),
            regions: Some(PathBuf::from("/srv/regions.geojson")),
            public_legend: true,
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }
}
