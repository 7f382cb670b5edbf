//! Projection handle

use std::sync::Arc;

use mapnik_sys::{mapnik_projection_t, MapnikApi};

use crate::coord::Coord;

/// Projection from geographic coordinates into a map's reference system.
///
/// Obtained from [`Map::projection`](crate::Map::projection); the caller
/// owns it independently of the map.
pub struct Projection {
    api: Arc<MapnikApi>,
    ptr: *mut mapnik_projection_t,
}

impl Projection {
    /// Take ownership of a native projection
    pub(crate) fn from_raw(api: Arc<MapnikApi>, ptr: *mut mapnik_projection_t) -> Self {
        log::debug!("Created projection {:p}", ptr);
        Self { api, ptr }
    }

    /// Apply the forward transform to a point
    pub fn forward(&self, coord: Coord) -> Coord {
        unsafe { (self.api.projection_forward)(self.ptr, coord.into()) }.into()
    }

    /// Release the native projection
    pub fn free(self) {
        drop(self);
    }
}

impl Drop for Projection {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe { (self.api.projection_free)(self.ptr) };
            log::debug!("Freed projection {:p}", self.ptr);
            self.ptr = std::ptr::null_mut();
        }
    }
}

impl std::fmt::Debug for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projection").field("ptr", &self.ptr).finish()
    }
}
