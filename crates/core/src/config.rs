use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::host::{AnalysisLevel, HostDialect, HostOption};
use crate::services::SessionSetup;
use crate::signatures::{SignatureCatalog, SignatureError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error(transparent)]
    Signature(#[from] SignatureError),
}

/// Which analysis host to drive and where it lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSettings {
    #[serde(default)]
    pub dialect: HostDialect,
    /// Explicit executable path; falls back to `R2_BIN` / `RIZIN_BIN` and `PATH`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Optional run configuration, read from `.json` or YAML.
///
/// Every field has a default so an empty file is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinpointConfig {
    #[serde(default)]
    pub host: HostSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisLevel>,
    /// Host options to set before analysis. Replaces the dialect defaults when nonempty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<HostOption>,
    /// Signature catalog file. Relative paths are resolved against the config file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
}

impl PinpointConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let body = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let parse_err = |message: String| ConfigError::Parse { path: path.to_path_buf(), message };
        let mut config: PinpointConfig =
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                serde_json::from_str(&body).map_err(|e| parse_err(e.to_string()))?
            } else if body.trim().is_empty() {
                PinpointConfig::default()
            } else {
                serde_yaml::from_str(&body).map_err(|e| parse_err(e.to_string()))?
            };

        if let Some(dir) = path.parent() {
            config.catalog = config
                .catalog
                .take()
                .map(|catalog| if catalog.is_relative() { dir.join(catalog) } else { catalog });
        }
        Ok(config)
    }

    pub fn session_setup(&self) -> SessionSetup {
        let mut setup = SessionSetup::for_dialect(self.host.dialect);
        if !self.options.is_empty() {
            setup.options = self.options.clone();
        }
        if let Some(level) = self.analysis {
            setup.analysis = level;
        }
        setup
    }

    /// Catalog named by the config, or the built-in one.
    pub fn load_catalog(&self) -> Result<SignatureCatalog, ConfigError> {
        match &self.catalog {
            Some(path) => Ok(SignatureCatalog::from_path(path)?),
            None => Ok(SignatureCatalog::builtin()),
        }
    }
}
