use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{FactoryError, FactoryResult};

/// Options for the fixture factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Identity attribute used when a record type tags none.
    pub default_identity_field: String,
    /// Deadline for collecting the instances of one generate call.
    pub generation_timeout_ms: Option<u64>,
    pub logging: LoggingConfig,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            default_identity_field: "id".to_string(),
            generation_timeout_ms: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl FactoryConfig {
    pub fn from_toml_str(content: &str) -> FactoryResult<Self> {
        toml::from_str(content).map_err(|err| FactoryError::Config(err.to_string()))
    }

    /// Read a TOML configuration file.
    pub fn load(path: &Path) -> FactoryResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> FactoryResult<String> {
        toml::to_string_pretty(self).map_err(|err| FactoryError::Config(err.to_string()))
    }

    pub fn generation_timeout(&self) -> Option<Duration> {
        self.generation_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Settings for [`crate::logging::init_logging`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
    /// Append to this file instead of writing to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}
