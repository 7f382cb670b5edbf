//! Layer handle

use std::sync::Arc;

use mapnik_sys::{mapnik_layer_t, MapnikApi};

use crate::datasource::Datasource;
use crate::error::{MapnikError, Result};
use crate::ffi;
use crate::runtime::Runtime;

/// Named map layer.
///
/// [`Map::add_layer`](crate::Map::add_layer) stores a copy of the layer in
/// the map, so the caller keeps ownership of this handle and frees it
/// independently. Changes made to the handle after it was added do not
/// reach the map's copy.
pub struct Layer {
    api: Arc<MapnikApi>,
    ptr: *mut mapnik_layer_t,
    name: String,
    srs: String,
    styles: Vec<String>,
}

impl Layer {
    /// Create a standalone layer
    pub fn new(runtime: &Runtime, name: &str, srs: &str) -> Result<Self> {
        let c_name = ffi::to_cstring(name, "layer name")?;
        let c_srs = ffi::to_cstring(srs, "layer srs")?;

        let api = runtime.api();
        let ptr = unsafe { (api.layer)(c_name.as_ptr(), c_srs.as_ptr()) };
        if ptr.is_null() {
            return Err(MapnikError::NullHandle("layer"));
        }

        log::debug!("Created layer {:?} ({:p})", name, ptr);
        Ok(Self {
            api: Arc::clone(api),
            ptr,
            name: name.to_string(),
            srs: srs.to_string(),
            styles: Vec::new(),
        })
    }

    /// Layer name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spatial reference system the layer's data is in
    pub fn srs(&self) -> &str {
        &self.srs
    }

    /// Style names attached so far, in attachment order
    pub fn styles(&self) -> &[String] {
        &self.styles
    }

    /// Attach a style by name.
    ///
    /// The style is resolved against the map's stylesheet at render time;
    /// nothing checks that it exists.
    pub fn add_style(&mut self, style: &str) -> Result<()> {
        let c_style = ffi::to_cstring(style, "style name")?;
        unsafe { (self.api.layer_add_style)(self.ptr, c_style.as_ptr()) };
        self.styles.push(style.to_string());
        Ok(())
    }

    /// Attach a datasource. Ownership is shared, not transferred.
    pub fn set_datasource(&mut self, datasource: &Datasource) {
        unsafe { (self.api.layer_set_datasource)(self.ptr, datasource.as_ptr()) };
    }

    pub(crate) const fn as_ptr(&self) -> *mut mapnik_layer_t {
        self.ptr
    }

    /// Release the native layer
    pub fn free(self) {
        drop(self);
    }
}

impl Drop for Layer {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe { (self.api.layer_free)(self.ptr) };
            log::debug!("Freed layer {:?} ({:p})", self.name, self.ptr);
            self.ptr = std::ptr::null_mut();
        }
    }
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.name)
            .field("srs", &self.srs)
            .field("styles", &self.styles)
            .finish_non_exhaustive()
    }
}
