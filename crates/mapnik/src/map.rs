//! # Map handle
//!
//! Top-level render target. A map is sized in pixels, configured from a
//! stylesheet, populated with layers and zoomed to an extent before it can
//! render to a file, to an in-memory PNG, or to a UTF-grid.
//!
//! Every native failure is reported as [`MapnikError::Render`] carrying the
//! engine's last-error text. Call-local native objects (bounding boxes,
//! images, blobs, grids, JSON strings, layer views) are released before the
//! call returns on every path.

use std::os::raw::{c_int, c_uint};
use std::path::Path;
use std::sync::Arc;

use mapnik_sys::{mapnik_layer_t, mapnik_map_t, MapnikApi};

use crate::coord::BoundingBox;
use crate::error::{MapnikError, Result};
use crate::ffi::{self, Allocation, Scoped};
use crate::layer::Layer;
use crate::projection::Projection;
use crate::runtime::Runtime;

/// Map base type
pub struct Map {
    api: Arc<MapnikApi>,
    ptr: *mut mapnik_map_t,
    width: u32,
    height: u32,
    buffer_size: i32,
    loaded: bool,
}

impl Map {
    /// Create a map of the given pixel dimensions
    pub fn new(runtime: &Runtime, width: u32, height: u32) -> Result<Self> {
        let api = runtime.api();
        let ptr = unsafe { (api.map)(width as c_uint, height as c_uint) };
        if ptr.is_null() {
            return Err(MapnikError::NullHandle("map"));
        }

        log::debug!("Created map {}x{} ({:p})", width, height, ptr);
        Ok(Self {
            api: Arc::clone(api),
            ptr,
            width,
            height,
            buffer_size: 0,
            loaded: false,
        })
    }

    /// Width in pixels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Pixel margin rendered around the visible area
    pub const fn buffer_size(&self) -> i32 {
        self.buffer_size
    }

    /// Whether a stylesheet has been loaded successfully
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn last_error(&self) -> MapnikError {
        let message = unsafe { ffi::copy_str((self.api.map_last_error)(self.ptr)) };
        MapnikError::Render(message.unwrap_or_else(|| "unknown error".to_string()))
    }

    fn check(&self, status: c_int) -> Result<()> {
        if status == 0 {
            Ok(())
        } else {
            Err(self.last_error())
        }
    }

    /// Load the stylesheet from a file
    pub fn load(&mut self, stylesheet_file: impl AsRef<Path>) -> Result<()> {
        let path = stylesheet_file.as_ref();
        let c_path = ffi::path_to_cstring(path, "stylesheet path")?;
        self.check(unsafe { (self.api.map_load)(self.ptr, c_path.as_ptr()) })?;
        self.loaded = true;
        log::debug!("Loaded stylesheet {}", path.display());
        Ok(())
    }

    /// Load the stylesheet from an in-memory document
    pub fn load_string(&mut self, stylesheet: &str) -> Result<()> {
        let c_xml = ffi::to_cstring(stylesheet, "stylesheet")?;
        self.check(unsafe { (self.api.map_load_string)(self.ptr, c_xml.as_ptr()) })?;
        self.loaded = true;
        log::debug!("Loaded stylesheet from string ({} bytes)", stylesheet.len());
        Ok(())
    }

    /// Change the render target dimensions
    pub fn resize(&mut self, width: u32, height: u32) {
        unsafe { (self.api.map_resize)(self.ptr, width as c_uint, height as c_uint) };
        self.width = width;
        self.height = height;
    }

    /// Current spatial reference system
    pub fn srs(&self) -> String {
        unsafe { ffi::copy_str((self.api.map_get_srs)(self.ptr)) }.unwrap_or_default()
    }

    /// Replace the spatial reference system
    pub fn set_srs(&mut self, srs: &str) -> Result<()> {
        let c_srs = ffi::to_cstring(srs, "map srs")?;
        self.check(unsafe { (self.api.map_set_srs)(self.ptr, c_srs.as_ptr()) })
    }

    /// Fit the view to the combined extent of all layers
    pub fn zoom_all(&mut self) -> Result<()> {
        self.check(unsafe { (self.api.map_zoom_all)(self.ptr) })
    }

    /// Set the view to an explicit extent; corner ordering is not checked
    pub fn zoom_to_min_max(&mut self, minx: f64, miny: f64, maxx: f64, maxy: f64) {
        let bbox = unsafe { (self.api.bbox)(minx, miny, maxx, maxy) };
        match Scoped::new(bbox, self.api.bbox_free, "bbox") {
            Some(bbox) => unsafe { (self.api.map_zoom_to_box)(self.ptr, bbox.as_ptr()) },
            None => log::warn!("Native bbox allocation failed; view unchanged"),
        }
    }

    /// [`zoom_to_min_max`](Self::zoom_to_min_max) for a [`BoundingBox`]
    pub fn zoom_to_box(&mut self, bbox: &BoundingBox) {
        self.zoom_to_min_max(bbox.minx, bbox.miny, bbox.maxx, bbox.maxy);
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(MapnikError::NotLoaded)
        }
    }

    /// Render to an image file; the engine picks the format from the
    /// extension
    pub fn render_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.ensure_loaded()?;
        let path = path.as_ref();
        let c_path = ffi::path_to_cstring(path, "output path")?;
        self.check(unsafe { (self.api.map_render_to_file)(self.ptr, c_path.as_ptr()) })?;
        log::debug!("Rendered {}x{} to {}", self.width, self.height, path.display());
        Ok(())
    }

    /// Render to PNG bytes owned by the caller
    pub fn render_to_memory_png(&self) -> Result<Vec<u8>> {
        self.ensure_loaded()?;

        let image = unsafe { (self.api.map_render_to_image)(self.ptr) };
        let image = Scoped::new(image, self.api.image_free, "image").ok_or_else(|| self.last_error())?;

        let blob = unsafe { (self.api.image_to_png_blob)(image.as_ptr()) };
        let blob = Scoped::new(blob, self.api.blob_free, "blob")
            .ok_or_else(|| MapnikError::Render("PNG encoding returned no blob".to_string()))?;

        let raw = unsafe { &*blob.as_ptr() };
        if raw.ptr.is_null() || raw.len == 0 {
            return Err(MapnikError::Render("PNG encoding produced no data".to_string()));
        }

        let bytes = unsafe { std::slice::from_raw_parts(raw.ptr.cast::<u8>(), raw.len as usize) }.to_vec();
        log::debug!("Rendered {}x{} to {} PNG bytes", self.width, self.height, bytes.len());
        Ok(bytes)
    }

    /// Render the interactivity grid of one layer and serialize it to
    /// UTF-grid JSON, sampling every `resolution` pixels.
    ///
    /// `key` names the feature attribute used to tell features apart. The
    /// layer is looked up first, so an unknown name is reported as
    /// [`MapnikError::NoSuchLayer`] before any other check.
    ///
    /// The target layer must have a datasource attached; the native engine
    /// dereferences it unchecked and crashes otherwise.
    pub fn render_to_memory_utf_grid(&self, layer_name: &str, key: &str, resolution: u32) -> Result<String> {
        let layer = self
            .layer_views()
            .find(|view| view.name().as_deref() == Some(layer_name))
            .ok_or_else(|| MapnikError::NoSuchLayer(layer_name.to_string()))?;

        if resolution == 0 {
            return Err(MapnikError::InvalidArgument("grid resolution must be at least 1".to_string()));
        }
        self.ensure_loaded()?;

        let c_key = ffi::to_cstring(key, "grid key")?;
        let grid = unsafe { (self.api.map_render_to_grid)(self.ptr, layer.as_ptr(), c_key.as_ptr()) };
        let grid = Scoped::new(grid, self.api.grid_free, "grid").ok_or_else(|| self.last_error())?;

        let json = unsafe { (self.api.grid_to_json)(grid.as_ptr(), resolution as c_uint) };
        let json = Allocation::new(json, self.api.free).ok_or_else(|| self.last_error())?;

        Ok(json.to_string_lossy())
    }

    /// Projection for the map's current reference system, owned by the
    /// caller
    pub fn projection(&self) -> Result<Projection> {
        let ptr = unsafe { (self.api.map_projection)(self.ptr) };
        if ptr.is_null() {
            return Err(MapnikError::NullHandle("projection"));
        }
        Ok(Projection::from_raw(Arc::clone(&self.api), ptr))
    }

    /// Set the pixel margin rendered around the visible area
    pub fn set_buffer_size(&mut self, size: i32) {
        unsafe { (self.api.map_set_buffer_size)(self.ptr, size as c_int) };
        self.buffer_size = size;
    }

    /// Append a copy of `layer` to the map. The caller still owns `layer`.
    pub fn add_layer(&mut self, layer: &Layer) {
        unsafe { (self.api.map_add_layer)(self.ptr, layer.as_ptr()) };
        log::debug!("Added layer {:?} to map {:p}", layer.name(), self.ptr);
    }

    /// Number of layers on the map
    pub fn layer_count(&self) -> usize {
        unsafe { (self.api.map_layer_count)(self.ptr) }
    }

    /// Names of the map's layers in render order
    pub fn layer_names(&self) -> Vec<String> {
        self.layer_views().map(|view| view.name().unwrap_or_default()).collect()
    }

    /// Activate the layer named `name` and deactivate every other one.
    ///
    /// Returns whether any layer matched; with no match every layer ends up
    /// inactive.
    pub fn set_active_layer(&mut self, name: &str) -> bool {
        let mut matched = false;
        for view in self.layer_views() {
            let active = view.name().as_deref() == Some(name);
            matched |= active;
            unsafe { (self.api.layer_set_active)(view.as_ptr(), c_int::from(active)) };
        }
        matched
    }

    /// Borrowed views of every map-owned layer, in order
    fn layer_views(&self) -> impl Iterator<Item = LayerView<'_>> + '_ {
        (0..self.layer_count()).filter_map(move |i| {
            let ptr = unsafe { (self.api.map_get_layer)(self.ptr, i) };
            Allocation::new(ptr, self.api.free).map(|alloc| LayerView { map: self, alloc })
        })
    }

    #[cfg(test)]
    pub(crate) const fn as_ptr(&self) -> *mut mapnik_map_t {
        self.ptr
    }

    /// Release the native map and its layer copies
    pub fn free(self) {
        drop(self);
    }
}

impl Drop for Map {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe { (self.api.map_free)(self.ptr) };
            log::debug!("Freed map {:p}", self.ptr);
            self.ptr = std::ptr::null_mut();
        }
    }
}

impl std::fmt::Debug for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("buffer_size", &self.buffer_size)
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}

/// Non-owning view of a layer stored inside a map. Only the small wrapper
/// the engine allocates for the view is released; the layer stays with the
/// map.
struct LayerView<'a> {
    map: &'a Map,
    alloc: Allocation<mapnik_layer_t>,
}

impl LayerView<'_> {
    fn name(&self) -> Option<String> {
        unsafe { ffi::copy_str((self.map.api.layer_name)(self.alloc.as_ptr())) }
    }

    const fn as_ptr(&self) -> *mut mapnik_layer_t {
        self.alloc.as_ptr()
    }
}
