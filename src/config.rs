//! Dashboard Configuration
//! Optional JSON settings file; every field falls back to a default.

use crate::data::TableSchema;
use crate::stats::{DEFAULT_BINS, DEFAULT_PDF_POINTS, ROLLING_WINDOW};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Settings file looked up in the working directory.
pub const CONFIG_FILE: &str = "ili_dashboard.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub csv_path: PathBuf,
    pub schema: TableSchema,
    pub rolling_window: usize,
    pub histogram_bins: usize,
    pub pdf_points: usize,
    pub smoothing_default: bool,
    pub log_filter: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("ilidata.csv"),
            schema: TableSchema::default(),
            rolling_window: ROLLING_WINDOW,
            histogram_bins: DEFAULT_BINS,
            pdf_points: DEFAULT_PDF_POINTS,
            smoothing_default: true,
            log_filter: "info".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Read and parse a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`DashboardConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
