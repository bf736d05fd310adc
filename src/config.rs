//! Runtime configuration.
//!
//! `AppConfig` is read from `area-calc.toml` in the working directory; a
//! missing or malformed file falls back to the defaults below. The problem
//! is handed back to the caller, since logging is configured from this file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::provider::{LatLng, Library, LoaderRequest};

/// File name looked up in the working directory
pub const CONFIG_FILE: &str = "area-calc.toml";

/// Environment variable overriding `api_key`
pub const API_KEY_ENV: &str = "AREA_CALC_API_KEY";

/// San Francisco
pub const DEFAULT_CENTER: LatLng = LatLng::new(37.7749, -122.4194);
pub const DEFAULT_ZOOM: f64 = 10.0;

/// Why the config file could not be used
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no config file at {}", path.display())]
    Missing { path: PathBuf },
    #[error("config file {} is malformed: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Report through `log`; only a malformed file is worth a warning
    pub fn log(&self) {
        match self {
            ConfigError::Missing { .. } => log::info!("{self}, using defaults"),
            ConfigError::Malformed { .. } => log::warn!("{self}, using defaults"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Provider credential; loading fails without one
    pub api_key: String,
    /// Feature modules requested at bootstrap
    pub libraries: Vec<Library>,
    pub center: LatLng,
    /// Web-map zoom level of the initial view
    pub zoom: f64,
    /// Directory of Natural Earth GeoJSON files; built-in outline if unset
    pub basemap_dir: Option<PathBuf>,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: "local".to_string(),
            libraries: vec![Library::Drawing, Library::Geometry],
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            basemap_dir: None,
            log_file: PathBuf::from("area-calc.log"),
        }
    }
}

impl AppConfig {
    /// Load from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::Missing {
            path: path.to_path_buf(),
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from a TOML file, falling back to defaults.
    /// The error, if any, is returned for reporting once logging is up.
    pub fn load_or_default(path: &Path) -> (Self, Option<ConfigError>) {
        match Self::load_from_file(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply environment overrides
    pub fn with_env(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            self.api_key = key;
        }
        self
    }

    pub fn config_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE)
    }

    pub fn loader_request(&self) -> LoaderRequest {
        LoaderRequest {
            api_key: self.api_key.clone(),
            libraries: self.libraries.clone(),
            basemap_dir: self.basemap_dir.clone(),
        }
    }
}
