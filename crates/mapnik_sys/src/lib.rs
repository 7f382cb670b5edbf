//! # mapnik_sys: raw bindings to the Mapnik C API
//!
//! Low-level, unsafe declarations for the small C API that wraps Mapnik's
//! C++ core (`mapnik_c_api.h`). The shared library is opened at runtime with
//! `libloading`, so building this crate never requires Mapnik headers.
//!
//! **Most users should use the safe `mapnik` crate instead.** Everything here
//! is `unsafe` and follows the C API's contract:
//! - every `mapnik_*` constructor pairs with exactly one `*_free`
//! - strings returned by `mapnik_grid_to_json` and error strings written by
//!   the `register_*` functions are allocated with `malloc`/`strdup` and must
//!   be released with [`Functions::free`]
//! - strings returned by `*_name`, `*_srs`, `*_last_error` and
//!   `mapnik_version_string` are borrowed from the owning object
//! - no object is thread-safe

#![allow(non_camel_case_types)]

use std::ffi::OsStr;
use std::ops::Deref;
use std::os::raw::{c_char, c_int, c_uint, c_void};

use libloading::Library;

/// Plugin directory reported by `mapnik-config --input-plugins` at build time
pub const DEFAULT_PLUGIN_DIR: &str = env!("MAPNIK_SYS_PLUGIN_DIR");

/// Font directory reported by `mapnik-config --fonts` at build time
pub const DEFAULT_FONT_DIR: &str = env!("MAPNIK_SYS_FONT_DIR");

/// Environment variable naming the C API shared library
pub const LIBRARY_ENV_VAR: &str = "MAPNIK_C_API_LIB";

macro_rules! opaque {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[repr(C)]
            pub struct $name {
                _unused: [u8; 0],
            }
        )*
    };
}

opaque! {
    /// Native projection object
    mapnik_projection_t;
    /// Native bounding box
    mapnik_bbox_t;
    /// Native rendered RGBA image
    mapnik_image_t;
    /// Native string-keyed parameter set
    mapnik_parameters_t;
    /// Native datasource (shared pointer on the C++ side)
    mapnik_datasource_t;
    /// Native layer
    mapnik_layer_t;
    /// Native interactivity grid
    mapnik_grid_t;
    /// Native map
    mapnik_map_t;
}

/// 2D point passed by value
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct mapnik_coord_t {
    /// X
    pub x: f64,
    /// Y
    pub y: f64,
}

/// Owned byte buffer
#[repr(C)]
#[derive(Debug)]
pub struct mapnik_blob_t {
    /// Start of the buffer, may be null
    pub ptr: *mut c_char,
    /// Length in bytes
    pub len: c_uint,
}

/// Function table for the C API.
///
/// Field names drop the `mapnik_` prefix; `free` is the C allocator's
/// release function as seen from the loaded library.
#[derive(Clone, Copy)]
#[allow(missing_docs)]
pub struct Functions {
    pub register_datasources: unsafe extern "C" fn(*const c_char, *mut *mut c_char) -> c_int,
    pub register_fonts: unsafe extern "C" fn(*const c_char, *mut *mut c_char) -> c_int,
    pub version_string: unsafe extern "C" fn() -> *const c_char,

    pub projection_free: unsafe extern "C" fn(*mut mapnik_projection_t),
    pub projection_forward:
        unsafe extern "C" fn(*mut mapnik_projection_t, mapnik_coord_t) -> mapnik_coord_t,

    pub bbox: unsafe extern "C" fn(f64, f64, f64, f64) -> *mut mapnik_bbox_t,
    pub bbox_free: unsafe extern "C" fn(*mut mapnik_bbox_t),

    pub blob_free: unsafe extern "C" fn(*mut mapnik_blob_t),

    pub image_free: unsafe extern "C" fn(*mut mapnik_image_t),
    pub image_to_png_blob: unsafe extern "C" fn(*mut mapnik_image_t) -> *mut mapnik_blob_t,

    pub parameters: unsafe extern "C" fn() -> *mut mapnik_parameters_t,
    pub parameters_free: unsafe extern "C" fn(*mut mapnik_parameters_t),
    pub parameters_set:
        unsafe extern "C" fn(*mut mapnik_parameters_t, *const c_char, *const c_char),

    pub datasource: unsafe extern "C" fn(*mut mapnik_parameters_t) -> *mut mapnik_datasource_t,
    pub datasource_free: unsafe extern "C" fn(*mut mapnik_datasource_t),

    pub layer: unsafe extern "C" fn(*const c_char, *const c_char) -> *mut mapnik_layer_t,
    pub layer_free: unsafe extern "C" fn(*mut mapnik_layer_t),
    pub layer_add_style: unsafe extern "C" fn(*mut mapnik_layer_t, *const c_char),
    pub layer_set_datasource: unsafe extern "C" fn(*mut mapnik_layer_t, *mut mapnik_datasource_t),
    pub layer_name: unsafe extern "C" fn(*mut mapnik_layer_t) -> *const c_char,
    pub layer_set_active: unsafe extern "C" fn(*mut mapnik_layer_t, c_int),

    pub grid_free: unsafe extern "C" fn(*mut mapnik_grid_t),
    pub grid_to_json: unsafe extern "C" fn(*mut mapnik_grid_t, c_uint) -> *mut c_char,

    pub map: unsafe extern "C" fn(c_uint, c_uint) -> *mut mapnik_map_t,
    pub map_free: unsafe extern "C" fn(*mut mapnik_map_t),
    pub map_last_error: unsafe extern "C" fn(*mut mapnik_map_t) -> *const c_char,
    pub map_get_srs: unsafe extern "C" fn(*mut mapnik_map_t) -> *const c_char,
    pub map_set_srs: unsafe extern "C" fn(*mut mapnik_map_t, *const c_char) -> c_int,
    pub map_load: unsafe extern "C" fn(*mut mapnik_map_t, *const c_char) -> c_int,
    pub map_load_string: unsafe extern "C" fn(*mut mapnik_map_t, *const c_char) -> c_int,
    pub map_zoom_all: unsafe extern "C" fn(*mut mapnik_map_t) -> c_int,
    pub map_render_to_file: unsafe extern "C" fn(*mut mapnik_map_t, *const c_char) -> c_int,
    pub map_resize: unsafe extern "C" fn(*mut mapnik_map_t, c_uint, c_uint),
    pub map_set_buffer_size: unsafe extern "C" fn(*mut mapnik_map_t, c_int),
    pub map_zoom_to_box: unsafe extern "C" fn(*mut mapnik_map_t, *mut mapnik_bbox_t),
    pub map_projection: unsafe extern "C" fn(*mut mapnik_map_t) -> *mut mapnik_projection_t,
    pub map_render_to_image: unsafe extern "C" fn(*mut mapnik_map_t) -> *mut mapnik_image_t,
    pub map_add_layer: unsafe extern "C" fn(*mut mapnik_map_t, *mut mapnik_layer_t),
    pub map_layer_count: unsafe extern "C" fn(*mut mapnik_map_t) -> usize,
    pub map_get_layer: unsafe extern "C" fn(*mut mapnik_map_t, usize) -> *mut mapnik_layer_t,
    pub map_render_to_grid:
        unsafe extern "C" fn(*mut mapnik_map_t, *mut mapnik_layer_t, *const c_char) -> *mut mapnik_grid_t,

    pub free: unsafe extern "C" fn(*mut c_void),
}

/// Loaded C API: the function table plus the library that backs it.
///
/// The library stays open for as long as this value lives; function
/// pointers copied out of it must not outlive it.
pub struct MapnikApi {
    functions: Functions,
    library: Option<Library>,
}

macro_rules! symbol {
    ($library:expr, $name:literal) => {
        *unsafe { $library.get(concat!($name, "\0").as_bytes()) }?
    };
}

impl MapnikApi {
    /// Open the C API shared library at `path` and resolve every symbol.
    ///
    /// # Safety
    /// Loading a library runs its initialisers; `path` must name a build of
    /// `mapnik_c_api` whose exports match the signatures in [`Functions`].
    pub unsafe fn load(path: impl AsRef<OsStr>) -> Result<Self, libloading::Error> {
        let library = unsafe { Library::new(path)? };

        let functions = Functions {
            register_datasources: symbol!(library, "mapnik_register_datasources"),
            register_fonts: symbol!(library, "mapnik_register_fonts"),
            version_string: symbol!(library, "mapnik_version_string"),
            projection_free: symbol!(library, "mapnik_projection_free"),
            projection_forward: symbol!(library, "mapnik_projection_forward"),
            bbox: symbol!(library, "mapnik_bbox"),
            bbox_free: symbol!(library, "mapnik_bbox_free"),
            blob_free: symbol!(library, "mapnik_blob_free"),
            image_free: symbol!(library, "mapnik_image_free"),
            image_to_png_blob: symbol!(library, "mapnik_image_to_png_blob"),
            parameters: symbol!(library, "mapnik_parameters"),
            parameters_free: symbol!(library, "mapnik_parameters_free"),
            parameters_set: symbol!(library, "mapnik_parameters_set"),
            datasource: symbol!(library, "mapnik_datasource"),
            datasource_free: symbol!(library, "mapnik_datasource_free"),
            layer: symbol!(library, "mapnik_layer"),
            layer_free: symbol!(library, "mapnik_layer_free"),
            layer_add_style: symbol!(library, "mapnik_layer_add_style"),
            layer_set_datasource: symbol!(library, "mapnik_layer_set_datasource"),
            layer_name: symbol!(library, "mapnik_layer_name"),
            layer_set_active: symbol!(library, "mapnik_layer_set_active"),
            grid_free: symbol!(library, "mapnik_grid_free"),
            grid_to_json: symbol!(library, "mapnik_grid_to_json"),
            map: symbol!(library, "mapnik_map"),
            map_free: symbol!(library, "mapnik_map_free"),
            map_last_error: symbol!(library, "mapnik_map_last_error"),
            map_get_srs: symbol!(library, "mapnik_map_get_srs"),
            map_set_srs: symbol!(library, "mapnik_map_set_srs"),
            map_load: symbol!(library, "mapnik_map_load"),
            map_load_string: symbol!(library, "mapnik_map_load_string"),
            map_zoom_all: symbol!(library, "mapnik_map_zoom_all"),
            map_render_to_file: symbol!(library, "mapnik_map_render_to_file"),
            map_resize: symbol!(library, "mapnik_map_resize"),
            map_set_buffer_size: symbol!(library, "mapnik_map_set_buffer_size"),
            map_zoom_to_box: symbol!(library, "mapnik_map_zoom_to_box"),
            map_projection: symbol!(library, "mapnik_map_projection"),
            map_render_to_image: symbol!(library, "mapnik_map_render_to_image"),
            map_add_layer: symbol!(library, "mapnik_map_add_layer"),
            map_layer_count: symbol!(library, "mapnik_map_layer_count"),
            map_get_layer: symbol!(library, "mapnik_map_get_layer"),
            map_render_to_grid: symbol!(library, "mapnik_map_render_to_grid"),
            // Resolved through the library's own dependency chain, so the
            // allocator matches the one that produced the strings.
            free: symbol!(library, "free"),
        };

        Ok(Self {
            functions,
            library: Some(library),
        })
    }

    /// Build a table from function pointers with no library behind it.
    pub const fn from_functions(functions: Functions) -> Self {
        Self {
            functions,
            library: None,
        }
    }

    /// Whether this table is backed by a loaded shared library
    pub const fn is_loaded(&self) -> bool {
        self.library.is_some()
    }
}

impl Deref for MapnikApi {
    type Target = Functions;

    fn deref(&self) -> &Functions {
        &self.functions
    }
}

impl std::fmt::Debug for MapnikApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapnikApi")
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

/// Platform file names tried when no library path is configured
pub fn default_library_names() -> &'static [&'static str] {
    if cfg!(target_os = "windows") {
        &["mapnik_c_api.dll"]
    } else if cfg!(target_os = "macos") {
        &["libmapnik_c_api.dylib"]
    } else {
        &["libmapnik_c_api.so", "libmapnik_c_api.so.0"]
    }
}
