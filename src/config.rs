//! Command-line tool configuration.
//!
//! Every section is optional; a missing file section takes its defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::features::FeatureFormat;

/// Configuration loading errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The file is not valid configuration TOML.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Feature decoding settings.
    #[serde(default)]
    pub decode: DecodeConfig,
    /// Wire output settings.
    #[serde(default)]
    pub encode: EncodeConfig,
    /// Log filtering.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which feature parser to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatSelection {
    /// Follow the marker pixel.
    #[default]
    Auto,
    /// Always parse as the pixelwise format.
    V0,
    /// Always parse as the bit-packed format.
    V1,
}

impl FormatSelection {
    /// The forced format, if any.
    pub fn forced(self) -> Option<FeatureFormat> {
        match self {
            FormatSelection::Auto => None,
            FormatSelection::V0 => Some(FeatureFormat::V0),
            FormatSelection::V1 => Some(FeatureFormat::V1),
        }
    }
}

/// Decoding configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodeConfig {
    /// Parser selection; `auto` follows the marker pixel.
    #[serde(default)]
    pub format: FormatSelection,
}

/// Encoding configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodeConfig {
    /// Leading byte emitted in front of dumped wire payloads. Decoders skip it.
    #[serde(default)]
    pub format_byte: u8,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}
