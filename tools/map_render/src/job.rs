//! Render job description, loadable from TOML or RON

use mapnik::{BoundingBox, Config, ConfigError, RuntimeConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the stylesheet comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stylesheet {
    /// XML file on disk
    File(PathBuf),
    /// XML document held in the job itself
    Inline(String),
}

/// What to produce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Output {
    /// Let the engine write the file; format follows the extension
    File { path: PathBuf },
    /// Render to memory and write the PNG bytes
    Png { path: PathBuf },
    /// UTF-grid JSON for one layer
    UtfGrid {
        path: PathBuf,
        layer: String,
        key: String,
        #[serde(default = "default_resolution")]
        resolution: u32,
    },
}

impl Output {
    pub fn path(&self) -> &Path {
        match self {
            Self::File { path } | Self::Png { path } | Self::UtfGrid { path, .. } => path,
        }
    }
}

const fn default_resolution() -> u32 {
    4
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderJob {
    pub width: u32,
    pub height: u32,
    pub stylesheet: Stylesheet,
    /// Overrides the stylesheet's reference system
    pub srs: Option<String>,
    /// Explicit extent; zooms to all layers when unset
    pub bbox: Option<BoundingBox>,
    pub buffer_size: i32,
    /// Render only this layer
    pub active_layer: Option<String>,
    pub output: Output,
    pub log_level: String,
    pub runtime: RuntimeConfig,
}

impl Default for RenderJob {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            stylesheet: Stylesheet::File(PathBuf::from("map.xml")),
            srs: None,
            bbox: None,
            buffer_size: 0,
            active_layer: None,
            output: Output::Png {
                path: PathBuf::from("map.png"),
            },
            log_level: "info".to_string(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl Config for RenderJob {}

impl RenderJob {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if let Output::UtfGrid { resolution: 0, .. } = self.output {
            return Err(ConfigError::Invalid("grid resolution must be at least 1".to_string()));
        }
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::Invalid(format!("unknown log level {:?}", self.log_level)));
        }
        self.runtime.validate()
    }
}
