//! Datasource handle

use std::sync::Arc;

use mapnik_sys::{mapnik_datasource_t, MapnikApi};

use crate::error::{MapnikError, Result};
use crate::ffi::{self, Scoped};
use crate::runtime::Runtime;

/// Parameter key naming the input plugin
pub const TYPE_KEY: &str = "type";

/// Layer data source built from string parameters.
///
/// Attaching a datasource to a [`Layer`](crate::Layer) shares it; the
/// `Datasource` itself still has to be freed, before or after the layer.
pub struct Datasource {
    api: Arc<MapnikApi>,
    ptr: *mut mapnik_datasource_t,
}

impl Datasource {
    /// Build a datasource from `key -> value` parameters, e.g.
    /// `type=shape, file=world.shp`.
    ///
    /// The parameter set must contain a `type` key; the engine cannot
    /// construct a datasource without one. Iteration order of `params` does
    /// not matter. The temporary native parameter set is released before
    /// this returns.
    pub fn new<I, K, V>(runtime: &Runtime, params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let params = params
            .into_iter()
            .map(|(k, v)| {
                Ok((
                    ffi::to_cstring(k.as_ref(), "datasource parameter key")?,
                    ffi::to_cstring(v.as_ref(), "datasource parameter value")?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        if !params.iter().any(|(k, _)| k.as_bytes() == TYPE_KEY.as_bytes()) {
            return Err(MapnikError::MissingDatasourceType);
        }

        let api = runtime.api();
        let native_params = Scoped::new(unsafe { (api.parameters)() }, api.parameters_free, "parameters")
            .ok_or(MapnikError::NullHandle("parameters"))?;

        for (key, value) in &params {
            unsafe { (api.parameters_set)(native_params.as_ptr(), key.as_ptr(), value.as_ptr()) };
        }

        let ptr = unsafe { (api.datasource)(native_params.as_ptr()) };
        if ptr.is_null() {
            return Err(MapnikError::NullHandle("datasource"));
        }

        log::debug!("Created datasource {:p} with {} parameters", ptr, params.len());
        Ok(Self {
            api: Arc::clone(api),
            ptr,
        })
    }

    pub(crate) const fn as_ptr(&self) -> *mut mapnik_datasource_t {
        self.ptr
    }

    /// Release the native datasource
    pub fn free(self) {
        drop(self);
    }
}

impl Drop for Datasource {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe { (self.api.datasource_free)(self.ptr) };
            log::debug!("Freed datasource {:p}", self.ptr);
            self.ptr = std::ptr::null_mut();
        }
    }
}

impl std::fmt::Debug for Datasource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Datasource").field("ptr", &self.ptr).finish()
    }
}
