//! # Mapnik
//!
//! Safe handles over the Mapnik C API.
//!
//! ## Features
//!
//! - **Runtime loading**: the C API library is opened at run time, so the
//!   crate builds without Mapnik installed
//! - **Owned handles**: maps, layers, datasources and projections release
//!   their native object exactly once, on `free` or on drop
//! - **Error values**: every native failure comes back as a [`MapnikError`]
//!   carrying the engine's own message
//! - **Configuration**: [`RuntimeConfig`] loads from TOML or RON
//!
//! Handles are not `Send`; keep each map on the thread that created it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mapnik::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let runtime = Runtime::init(&RuntimeConfig::default())?;
//!
//!     let mut map = Map::new(&runtime, 800, 600)?;
//!     map.load("world.xml")?;
//!     map.zoom_all()?;
//!     map.render_to_file("world.png")?;
//!
//!     let png = map.render_to_memory_png()?;
//!     println!("{} rendered {} bytes", runtime.version(), png.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::missing_safety_doc)]

pub mod config;
pub mod coord;
pub mod datasource;
pub mod error;
pub mod layer;
pub mod map;
pub mod projection;
pub mod runtime;

mod ffi;


pub use config::{Config, ConfigError, RuntimeConfig};
pub use coord::{BoundingBox, Coord};
pub use datasource::Datasource;
pub use error::{MapnikError, RegistryKind, Result};
pub use layer::Layer;
pub use map::Map;
pub use projection::Projection;
pub use runtime::Runtime;

/// Common imports
pub mod prelude {
    pub use crate::config::{Config, RuntimeConfig};
    pub use crate::coord::{BoundingBox, Coord};
    pub use crate::datasource::Datasource;
    pub use crate::error::{MapnikError, Result};
    pub use crate::layer::Layer;
    pub use crate::map::Map;
    pub use crate::projection::Projection;
    pub use crate::runtime::Runtime;
}
