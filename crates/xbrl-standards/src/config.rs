#![deny(unsafe_code)]

//! TOML configuration.
//!
//! ```toml
//! [pipeline]
//! profile = "fast"
//! nonactionable_mode = "audit"
//!
//! [catalog]
//! lang = "en"
//! roots = ["taxonomy/severity"]
//!
//! [baseline]
//! dir = "baselines"
//! taxonomy_dir = "taxonomy/3.4"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use xbrl_model::PipelineOptions;

use crate::error::StandardsError;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "XBRL_DIAG_CONFIG";

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "xbrl-diag.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub lang: String,
    pub roots: Vec<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            roots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    pub dir: PathBuf,
    pub taxonomy_dir: Option<PathBuf>,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("baselines"),
            taxonomy_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub pipeline: PipelineOptions,
    pub catalog: CatalogConfig,
    pub baseline: BaselineConfig,
}

impl DiagnosticsConfig {
    pub fn load(path: &Path) -> Result<Self, StandardsError> {
        let text = std::fs::read_to_string(path).map_err(|e| StandardsError::io(path, e))?;
        toml::from_str(&text).map_err(|source| StandardsError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the first config found: `explicit`, then the environment
    /// variable, then [`DEFAULT_CONFIG_FILE`]. A named file that does not
    /// exist is an error; a missing default file yields defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), StandardsError> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));
        if let Some(path) = named {
            if !path.is_file() {
                return Err(StandardsError::MissingConfig { path });
            }
            let config = Self::load(&path)?;
            return Ok((config, Some(path)));
        }
        let default = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default.is_file() {
            let config = Self::load(&default)?;
            return Ok((config, Some(default)));
        }
        Ok((Self::default(), None))
    }
}
