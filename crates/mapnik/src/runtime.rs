//! # Process runtime
//!
//! The native engine keeps one datasource-plugin registry and one font
//! registry per process. [`Runtime`] is the explicit handle to that state:
//! it owns the loaded C API table and performs the initial registrations.
//! Every map, layer, datasource and projection keeps a reference to the
//! table, so the library stays loaded while any handle is alive.

use std::os::raw::{c_char, c_int};
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::Arc;

use mapnik_sys::MapnikApi;

use crate::config::RuntimeConfig;
use crate::error::{MapnikError, RegistryKind, Result};
use crate::ffi::{self, Allocation};

/// Loaded engine plus its process-wide registries
#[derive(Debug, Clone)]
pub struct Runtime {
    api: Arc<MapnikApi>,
}

impl Runtime {
    /// Load the C API and register the configured plugin and font paths.
    ///
    /// Registration failures abort initialization when
    /// `strict_registration` is set and are logged otherwise.
    pub fn init(config: &RuntimeConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| MapnikError::InvalidArgument(e.to_string()))?;

        let api = load_api(config.library_path.as_deref())?;
        let runtime = Self::with_api(Arc::new(api));

        log::info!("Initialized {}", runtime.version());

        for (kind, path) in [
            (RegistryKind::Datasources, &config.plugin_dir),
            (RegistryKind::Fonts, &config.font_dir),
        ] {
            match runtime.register(kind, path) {
                Ok(()) => {}
                Err(e) if !config.strict_registration => {
                    log::warn!("Ignoring registration failure: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(runtime)
    }

    /// Wrap an existing function table without registering anything
    pub const fn with_api(api: Arc<MapnikApi>) -> Self {
        Self { api }
    }

    pub(crate) fn api(&self) -> &Arc<MapnikApi> {
        &self.api
    }

    /// Engine version, e.g. `"Mapnik 3.1.0"`
    pub fn version(&self) -> String {
        let raw = unsafe { ffi::copy_str((self.api.version_string)()) };
        format!("Mapnik {}", raw.unwrap_or_default())
    }

    /// Register every input plugin found under `path`
    pub fn register_datasources(&self, path: impl AsRef<Path>) -> Result<()> {
        self.register(RegistryKind::Datasources, path.as_ref())
    }

    /// Register every font found under `path`
    pub fn register_fonts(&self, path: impl AsRef<Path>) -> Result<()> {
        self.register(RegistryKind::Fonts, path.as_ref())
    }

    fn register(&self, kind: RegistryKind, path: &Path) -> Result<()> {
        let c_path = ffi::path_to_cstring(path, "registry path")?;
        let call: unsafe extern "C" fn(*const c_char, *mut *mut c_char) -> c_int = match kind {
            RegistryKind::Datasources => self.api.register_datasources,
            RegistryKind::Fonts => self.api.register_fonts,
        };

        let mut err_out: *mut c_char = ptr::null_mut();
        let status = unsafe { call(c_path.as_ptr(), &mut err_out) };
        let message = Allocation::new(err_out, self.api.free).map(|m| m.to_string_lossy());

        if status == 0 {
            log::info!("Registered {} from {}", kind, path.display());
            Ok(())
        } else {
            Err(MapnikError::Registration {
                kind,
                path: path.display().to_string(),
                message: message.unwrap_or_else(|| "unknown error".to_string()),
            })
        }
    }
}

/// Resolve and open the C API library: explicit path, then the
/// environment variable, then the platform default names.
fn load_api(explicit: Option<&Path>) -> Result<MapnikApi> {
    if let Some(path) = explicit {
        log::debug!("Loading Mapnik C API from {}", path.display());
        return Ok(unsafe { MapnikApi::load(path)? });
    }

    if let Some(path) = std::env::var_os(mapnik_sys::LIBRARY_ENV_VAR) {
        log::debug!("Loading Mapnik C API from ${}", mapnik_sys::LIBRARY_ENV_VAR);
        return Ok(unsafe { MapnikApi::load(&path)? });
    }

    let mut tried = Vec::new();
    for name in mapnik_sys::default_library_names() {
        match unsafe { MapnikApi::load(name) } {
            Ok(api) => return Ok(api),
            Err(e) => {
                log::debug!("Could not load {}: {}", name, e);
                tried.push(PathBuf::from(name));
            }
        }
    }
    Err(MapnikError::LibraryNotFound { tried })
}
