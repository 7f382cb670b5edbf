//! Call-boundary helpers: string marshalling and scoped release of
//! call-local native objects.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};
use std::path::Path;

use crate::error::{MapnikError, Result};

/// Convert a Rust string into a NUL-terminated buffer for one native call
pub(crate) fn to_cstring(value: &str, context: &'static str) -> Result<CString> {
    CString::new(value).map_err(|_| MapnikError::InteriorNul { context })
}

/// Convert a filesystem path for one native call
pub(crate) fn path_to_cstring(path: &Path, context: &'static str) -> Result<CString> {
    let value = path
        .to_str()
        .ok_or_else(|| MapnikError::InvalidArgument(format!("{context} is not valid UTF-8: {}", path.display())))?;
    to_cstring(value, context)
}

/// Copy a borrowed native string, `None` when the pointer is null.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// for the duration of this call.
pub(crate) unsafe fn copy_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }
}

/// Native object owned for the duration of one call
pub(crate) struct Scoped<T> {
    ptr: *mut T,
    release: unsafe extern "C" fn(*mut T),
    what: &'static str,
}

impl<T> Scoped<T> {
    /// Take ownership of `ptr`; `None` when it is null
    pub(crate) fn new(ptr: *mut T, release: unsafe extern "C" fn(*mut T), what: &'static str) -> Option<Self> {
        if ptr.is_null() {
            None
        } else {
            Some(Self { ptr, release, what })
        }
    }

    pub(crate) const fn as_ptr(&self) -> *mut T {
        self.ptr
    }
}

impl<T> Drop for Scoped<T> {
    fn drop(&mut self) {
        unsafe { (self.release)(self.ptr) };
        log::trace!("Released scoped native {}", self.what);
    }
}

/// Engine allocation released with the C allocator's `free`.
///
/// Covers strings the engine hands over (`strdup` error text, grid JSON)
/// and the small layer wrappers returned by `mapnik_map_get_layer`; the
/// layer behind a wrapper belongs to the map and is left alone.
pub(crate) struct Allocation<T> {
    ptr: *mut T,
    free: unsafe extern "C" fn(*mut c_void),
}

impl<T> Allocation<T> {
    pub(crate) fn new(ptr: *mut T, free: unsafe extern "C" fn(*mut c_void)) -> Option<Self> {
        if ptr.is_null() {
            None
        } else {
            Some(Self { ptr, free })
        }
    }

    pub(crate) const fn as_ptr(&self) -> *mut T {
        self.ptr
    }
}

impl Allocation<c_char> {
    /// Copy the string out; the allocation is still released on drop
    pub(crate) fn to_string_lossy(&self) -> String {
        unsafe { CStr::from_ptr(self.ptr) }.to_string_lossy().into_owned()
    }
}

impl<T> Drop for Allocation<T> {
    fn drop(&mut self) {
        unsafe { (self.free)(self.ptr.cast()) };
    }
}
