//! # Configuration
//!
//! File-backed configuration for the native runtime. Any type implementing
//! [`Config`] can be read from or written to TOML or RON, chosen by file
//! extension.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Semantically invalid value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// # Runtime Configuration
///
/// Where to find the C API library and which plugin and font directories to
/// register with the engine's process-wide registries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Explicit path to the C API shared library. When unset the
    /// `MAPNIK_C_API_LIB` environment variable, then the platform default
    /// names, are tried.
    pub library_path: Option<PathBuf>,
    /// Input plugin directory
    pub plugin_dir: PathBuf,
    /// Font directory
    pub font_dir: PathBuf,
    /// Fail initialization when a registration fails, instead of logging it
    pub strict_registration: bool,
}

impl RuntimeConfig {
    /// Create a configuration with the build-time default directories
    pub fn new() -> Self {
        Self {
            library_path: None,
            plugin_dir: PathBuf::from(mapnik_sys::DEFAULT_PLUGIN_DIR),
            font_dir: PathBuf::from(mapnik_sys::DEFAULT_FONT_DIR),
            strict_registration: true,
        }
    }

    /// Set the C API library path
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    /// Set the input plugin directory
    pub fn with_plugin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plugin_dir = dir.into();
        self
    }

    /// Set the font directory
    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dir = dir.into();
        self
    }

    /// Choose whether registration failures abort initialization
    pub fn with_strict_registration(mut self, strict: bool) -> Self {
        self.strict_registration = strict;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.plugin_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("plugin_dir cannot be empty".to_string()));
        }
        if self.font_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("font_dir cannot be empty".to_string()));
        }
        if let Some(path) = &self.library_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("library_path cannot be empty".to_string()));
            }
        }
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for RuntimeConfig {}
