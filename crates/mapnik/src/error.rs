//! Error types for the handle façade

use std::path::PathBuf;
use thiserror::Error;

/// What a registration call was registering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    /// Input plugin (datasource) directory
    Datasources,
    /// Font file or directory
    Fonts,
}

impl std::fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Datasources => f.write_str("datasources"),
            Self::Fonts => f.write_str("fonts"),
        }
    }
}

/// Errors surfaced by the Mapnik bindings
#[derive(Error, Debug)]
pub enum MapnikError {
    /// The native engine reported a failure; carries its last-error text
    #[error("mapnik: {0}")]
    Render(String),

    /// No layer with the requested name exists on the map
    #[error("no such layer {0}")]
    NoSuchLayer(String),

    /// A render was requested before any stylesheet was loaded
    #[error("mapnik: map has no stylesheet loaded")]
    NotLoaded,

    /// Registering a plugin or font path failed
    #[error("failed to register {kind} from {path}: {message}")]
    Registration {
        /// What was being registered
        kind: RegistryKind,
        /// Path handed to the engine
        path: String,
        /// Engine-supplied reason
        message: String,
    },

    /// Opening the C API library or resolving a symbol failed
    #[error("failed to load Mapnik C API: {0}")]
    Library(#[from] libloading::Error),

    /// No C API library could be found in any of the default locations
    #[error("Mapnik C API library not found (tried {tried:?})")]
    LibraryNotFound {
        /// Every name or path that was attempted
        tried: Vec<PathBuf>,
    },

    /// A string destined for the engine contained a NUL byte
    #[error("{context} contains an interior NUL byte")]
    InteriorNul {
        /// Which argument was rejected
        context: &'static str,
    },

    /// Datasource parameters did not name a plugin `type`
    #[error("datasource parameters must include a \"type\" key")]
    MissingDatasourceType,

    /// A native constructor returned null
    #[error("native {0} constructor returned null")]
    NullHandle(&'static str),

    /// An argument was rejected before reaching the engine
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for binding operations
pub type Result<T> = std::result::Result<T, MapnikError>;
