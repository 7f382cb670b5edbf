//! In-process stand-in for the Mapnik C API.
//!
//! Implements every entry of [`Functions`] over thread-local state so the
//! façade can be exercised without the native library. Each native object
//! kind is counted on creation and release; [`assert_no_leaks`] checks that
//! every object handed out has been given back exactly once.
//!
//! Tests run one per thread, so state never crosses tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_uint, c_void};
use std::sync::Arc;

use mapnik_sys::{
    mapnik_bbox_t, mapnik_blob_t, mapnik_coord_t, mapnik_datasource_t, mapnik_grid_t, mapnik_image_t,
    mapnik_layer_t, mapnik_map_t, mapnik_parameters_t, mapnik_projection_t, Functions, MapnikApi,
};

use crate::{Datasource, Layer, Map, Runtime};

const DEFAULT_SRS: &str = "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs";
const EARTH_RADIUS: f64 = 6_378_137.0;

enum Alloc {
    Text(&'static str),
    LayerView,
}

#[derive(Default)]
struct State {
    created: HashMap<&'static str, usize>,
    live: HashMap<&'static str, isize>,
    allocations: HashMap<usize, Alloc>,
    bad_frees: usize,
    registered_datasources: Vec<String>,
    registered_fonts: Vec<String>,
    fail_next_render: Option<String>,
    last_grid_request: Option<(String, String, u32)>,
}

thread_local! {
    static STATE: RefCell<State> = RefCell::new(State::default());
}

fn with_state<R>(f: impl FnOnce(&mut State) -> R) -> R {
    STATE.with(|s| f(&mut s.borrow_mut()))
}

fn track(kind: &'static str) {
    with_state(|s| {
        *s.created.entry(kind).or_default() += 1;
        *s.live.entry(kind).or_default() += 1;
    });
}

fn untrack(kind: &'static str) {
    with_state(|s| *s.live.entry(kind).or_default() -= 1);
}

fn take_failure() -> Option<String> {
    with_state(|s| s.fail_next_render.take())
}

fn alloc_text(kind: &'static str, text: String) -> *mut c_char {
    let ptr = CString::new(text).unwrap_or_default().into_raw();
    with_state(|s| s.allocations.insert(ptr as usize, Alloc::Text(kind)));
    track(kind);
    ptr
}

unsafe fn str_arg(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }
}

fn encode_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([70, 130, 180, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap_or_default();
    bytes
}

// Native object layouts

#[derive(Clone)]
struct FakeLayer {
    name: CString,
    styles: Vec<String>,
    active: bool,
    datasource: Option<HashMap<String, String>>,
}

enum LayerHandle {
    Owned(FakeLayer),
    View { map: *mut FakeMap, index: usize },
}

struct FakeMap {
    width: u32,
    height: u32,
    srs: CString,
    buffer_size: i32,
    layers: Vec<FakeLayer>,
    err: Option<CString>,
    extent: Option<[f64; 4]>,
}

impl FakeMap {
    fn fail(&mut self, message: impl Into<String>) -> c_int {
        self.err = CString::new(message.into()).ok();
        -1
    }

    fn load_xml(&mut self, xml: &str) -> c_int {
        if !xml.contains("<Map") {
            return self.fail("Unable to parse stylesheet");
        }
        if let Some(start) = xml.find("srs=\"") {
            let rest = &xml[start + 5..];
            if let Some(end) = rest.find('"') {
                self.srs = CString::new(&rest[..end]).unwrap_or_default();
            }
        }
        0
    }
}

struct FakeProjection {
    mercator: bool,
}

struct FakeGrid {
    width: u32,
    height: u32,
    layer: String,
    key: String,
}

struct FakeImage {
    width: u32,
    height: u32,
}

unsafe fn map_mut<'a>(m: *mut mapnik_map_t) -> &'a mut FakeMap {
    unsafe { &mut *m.cast::<FakeMap>() }
}

unsafe fn layer_mut<'a>(l: *mut mapnik_layer_t) -> &'a mut FakeLayer {
    match unsafe { &mut *l.cast::<LayerHandle>() } {
        LayerHandle::Owned(layer) => layer,
        LayerHandle::View { map, index } => unsafe { &mut (&mut (**map).layers)[*index] },
    }
}

// C API

unsafe extern "C" fn mapnik_register_datasources(path: *const c_char, err: *mut *mut c_char) -> c_int {
    unsafe { register(path, err, false) }
}

unsafe extern "C" fn mapnik_register_fonts(path: *const c_char, err: *mut *mut c_char) -> c_int {
    unsafe { register(path, err, true) }
}

unsafe fn register(path: *const c_char, err: *mut *mut c_char, fonts: bool) -> c_int {
    let path = unsafe { str_arg(path) };
    if path.contains("missing") {
        if !err.is_null() {
            unsafe { *err = alloc_text("error_string", format!("no such directory: {path}")) };
        }
        return -1;
    }
    with_state(|s| {
        if fonts {
            s.registered_fonts.push(path);
        } else {
            s.registered_datasources.push(path);
        }
    });
    0
}

unsafe extern "C" fn mapnik_version_string() -> *const c_char {
    b"3.1.0-fake\0".as_ptr().cast()
}

unsafe extern "C" fn mapnik_projection_free(p: *mut mapnik_projection_t) {
    if !p.is_null() {
        drop(unsafe { Box::from_raw(p.cast::<FakeProjection>()) });
        untrack("projection");
    }
}

unsafe extern "C" fn mapnik_projection_forward(p: *mut mapnik_projection_t, c: mapnik_coord_t) -> mapnik_coord_t {
    if p.is_null() || !unsafe { &*p.cast::<FakeProjection>() }.mercator {
        return c;
    }
    let lat = c.y.to_radians();
    mapnik_coord_t {
        x: EARTH_RADIUS * c.x.to_radians(),
        y: EARTH_RADIUS * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln(),
    }
}

unsafe extern "C" fn mapnik_bbox(minx: f64, miny: f64, maxx: f64, maxy: f64) -> *mut mapnik_bbox_t {
    track("bbox");
    Box::into_raw(Box::new([minx, miny, maxx, maxy])).cast()
}

unsafe extern "C" fn mapnik_bbox_free(b: *mut mapnik_bbox_t) {
    if !b.is_null() {
        drop(unsafe { Box::from_raw(b.cast::<[f64; 4]>()) });
        untrack("bbox");
    }
}

unsafe extern "C" fn mapnik_blob_free(b: *mut mapnik_blob_t) {
    if b.is_null() {
        return;
    }
    let blob = unsafe { Box::from_raw(b) };
    if !blob.ptr.is_null() {
        let bytes = std::ptr::slice_from_raw_parts_mut(blob.ptr.cast::<u8>(), blob.len as usize);
        drop(unsafe { Box::from_raw(bytes) });
    }
    untrack("blob");
}

unsafe extern "C" fn mapnik_image_free(i: *mut mapnik_image_t) {
    if !i.is_null() {
        drop(unsafe { Box::from_raw(i.cast::<FakeImage>()) });
        untrack("image");
    }
}

unsafe extern "C" fn mapnik_image_to_png_blob(i: *mut mapnik_image_t) -> *mut mapnik_blob_t {
    let mut blob = mapnik_blob_t {
        ptr: std::ptr::null_mut(),
        len: 0,
    };
    if !i.is_null() {
        let image = unsafe { &*i.cast::<FakeImage>() };
        let bytes = encode_png(image.width, image.height).into_boxed_slice();
        blob.len = bytes.len() as c_uint;
        blob.ptr = Box::into_raw(bytes).cast::<c_char>();
    }
    track("blob");
    Box::into_raw(Box::new(blob))
}

unsafe extern "C" fn mapnik_parameters() -> *mut mapnik_parameters_t {
    track("parameters");
    Box::into_raw(Box::new(HashMap::<String, String>::new())).cast()
}

unsafe extern "C" fn mapnik_parameters_free(p: *mut mapnik_parameters_t) {
    if !p.is_null() {
        drop(unsafe { Box::from_raw(p.cast::<HashMap<String, String>>()) });
        untrack("parameters");
    }
}

unsafe extern "C" fn mapnik_parameters_set(p: *mut mapnik_parameters_t, key: *const c_char, value: *const c_char) {
    if !p.is_null() {
        let params = unsafe { &mut *p.cast::<HashMap<String, String>>() };
        params.insert(unsafe { str_arg(key) }, unsafe { str_arg(value) });
    }
}

unsafe extern "C" fn mapnik_datasource(p: *mut mapnik_parameters_t) -> *mut mapnik_datasource_t {
    if p.is_null() {
        return std::ptr::null_mut();
    }
    let params = unsafe { &*p.cast::<HashMap<String, String>>() }.clone();
    track("datasource");
    Box::into_raw(Box::new(params)).cast()
}

unsafe extern "C" fn mapnik_datasource_free(ds: *mut mapnik_datasource_t) {
    if !ds.is_null() {
        drop(unsafe { Box::from_raw(ds.cast::<HashMap<String, String>>()) });
        untrack("datasource");
    }
}

unsafe extern "C" fn mapnik_layer(name: *const c_char, _srs: *const c_char) -> *mut mapnik_layer_t {
    let layer = FakeLayer {
        name: CString::new(unsafe { str_arg(name) }).unwrap_or_default(),
        styles: Vec::new(),
        active: true,
        datasource: None,
    };
    track("layer");
    Box::into_raw(Box::new(LayerHandle::Owned(layer))).cast()
}

unsafe extern "C" fn mapnik_layer_free(l: *mut mapnik_layer_t) {
    if l.is_null() {
        return;
    }
    match *unsafe { Box::from_raw(l.cast::<LayerHandle>()) } {
        LayerHandle::Owned(_) => untrack("layer"),
        LayerHandle::View { .. } => with_state(|s| s.bad_frees += 1),
    }
}

unsafe extern "C" fn mapnik_layer_add_style(l: *mut mapnik_layer_t, style: *const c_char) {
    let style = unsafe { str_arg(style) };
    unsafe { layer_mut(l) }.styles.push(style);
}

unsafe extern "C" fn mapnik_layer_set_datasource(l: *mut mapnik_layer_t, ds: *mut mapnik_datasource_t) {
    if !l.is_null() && !ds.is_null() {
        let params = unsafe { &*ds.cast::<HashMap<String, String>>() }.clone();
        unsafe { layer_mut(l) }.datasource = Some(params);
    }
}

unsafe extern "C" fn mapnik_layer_name(l: *mut mapnik_layer_t) -> *const c_char {
    if l.is_null() {
        return std::ptr::null();
    }
    unsafe { layer_mut(l) }.name.as_ptr()
}

unsafe extern "C" fn mapnik_layer_set_active(l: *mut mapnik_layer_t, active: c_int) {
    if !l.is_null() {
        unsafe { layer_mut(l) }.active = active != 0;
    }
}

unsafe extern "C" fn mapnik_grid_free(g: *mut mapnik_grid_t) {
    if !g.is_null() {
        drop(unsafe { Box::from_raw(g.cast::<FakeGrid>()) });
        untrack("grid");
    }
}

unsafe extern "C" fn mapnik_grid_to_json(g: *mut mapnik_grid_t, res: c_uint) -> *mut c_char {
    if g.is_null() || res == 0 {
        return std::ptr::null_mut();
    }
    let grid = unsafe { &*g.cast::<FakeGrid>() };
    with_state(|s| s.last_grid_request = Some((grid.layer.clone(), grid.key.clone(), res)));

    let cols = grid.width.div_ceil(res) as usize;
    let rows = grid.height.div_ceil(res) as usize;
    let row = format!("\"{}\"", " ".repeat(cols));
    let json = format!(
        "{{\"keys\":[\"\"],\"data\":{{}},\"grid\":[{}]}}",
        vec![row; rows].join(",")
    );
    alloc_text("json", json)
}

unsafe extern "C" fn mapnik_map(width: c_uint, height: c_uint) -> *mut mapnik_map_t {
    let map = FakeMap {
        width,
        height,
        srs: CString::new(DEFAULT_SRS).unwrap_or_default(),
        buffer_size: 0,
        layers: Vec::new(),
        err: None,
        extent: None,
    };
    track("map");
    Box::into_raw(Box::new(map)).cast()
}

unsafe extern "C" fn mapnik_map_free(m: *mut mapnik_map_t) {
    if !m.is_null() {
        drop(unsafe { Box::from_raw(m.cast::<FakeMap>()) });
        untrack("map");
    }
}

unsafe extern "C" fn mapnik_map_last_error(m: *mut mapnik_map_t) -> *const c_char {
    unsafe { map_mut(m) }.err.as_ref().map_or(std::ptr::null(), |e| e.as_ptr())
}

unsafe extern "C" fn mapnik_map_get_srs(m: *mut mapnik_map_t) -> *const c_char {
    unsafe { map_mut(m) }.srs.as_ptr()
}

unsafe extern "C" fn mapnik_map_set_srs(m: *mut mapnik_map_t, srs: *const c_char) -> c_int {
    unsafe { map_mut(m) }.srs = CString::new(unsafe { str_arg(srs) }).unwrap_or_default();
    0
}

unsafe extern "C" fn mapnik_map_load(m: *mut mapnik_map_t, path: *const c_char) -> c_int {
    let map = unsafe { map_mut(m) };
    map.err = None;
    let path = unsafe { str_arg(path) };
    match std::fs::read_to_string(&path) {
        Ok(xml) => map.load_xml(&xml),
        Err(e) => map.fail(format!("Could not load map file {path}: {e}")),
    }
}

unsafe extern "C" fn mapnik_map_load_string(m: *mut mapnik_map_t, xml: *const c_char) -> c_int {
    let map = unsafe { map_mut(m) };
    map.err = None;
    map.load_xml(&unsafe { str_arg(xml) })
}

unsafe extern "C" fn mapnik_map_zoom_all(m: *mut mapnik_map_t) -> c_int {
    let map = unsafe { map_mut(m) };
    map.err = None;
    if map.layers.is_empty() {
        return map.fail("Could not zoom to combined layer extents: map has no layers");
    }
    map.extent = Some([-180.0, -90.0, 180.0, 90.0]);
    0
}

unsafe extern "C" fn mapnik_map_render_to_file(m: *mut mapnik_map_t, path: *const c_char) -> c_int {
    let map = unsafe { map_mut(m) };
    map.err = None;
    if let Some(message) = take_failure() {
        return map.fail(message);
    }
    let path = unsafe { str_arg(path) };
    match std::fs::write(&path, encode_png(map.width, map.height)) {
        Ok(()) => 0,
        Err(e) => map.fail(format!("Failed to write {path}: {e}")),
    }
}

unsafe extern "C" fn mapnik_map_resize(m: *mut mapnik_map_t, width: c_uint, height: c_uint) {
    let map = unsafe { map_mut(m) };
    map.width = width;
    map.height = height;
}

unsafe extern "C" fn mapnik_map_set_buffer_size(m: *mut mapnik_map_t, size: c_int) {
    unsafe { map_mut(m) }.buffer_size = size;
}

unsafe extern "C" fn mapnik_map_zoom_to_box(m: *mut mapnik_map_t, b: *mut mapnik_bbox_t) {
    if !m.is_null() && !b.is_null() {
        unsafe { map_mut(m) }.extent = Some(unsafe { *b.cast::<[f64; 4]>() });
    }
}

unsafe extern "C" fn mapnik_map_projection(m: *mut mapnik_map_t) -> *mut mapnik_projection_t {
    let srs = unsafe { map_mut(m) }.srs.to_string_lossy().into_owned();
    track("projection");
    Box::into_raw(Box::new(FakeProjection {
        mercator: srs.contains("+proj=merc"),
    }))
    .cast()
}

unsafe extern "C" fn mapnik_map_render_to_image(m: *mut mapnik_map_t) -> *mut mapnik_image_t {
    let map = unsafe { map_mut(m) };
    map.err = None;
    if let Some(message) = take_failure() {
        map.fail(message);
        return std::ptr::null_mut();
    }
    track("image");
    Box::into_raw(Box::new(FakeImage {
        width: map.width,
        height: map.height,
    }))
    .cast()
}

unsafe extern "C" fn mapnik_map_add_layer(m: *mut mapnik_map_t, l: *mut mapnik_layer_t) {
    if !m.is_null() && !l.is_null() {
        let copy = unsafe { layer_mut(l) }.clone();
        unsafe { map_mut(m) }.layers.push(copy);
    }
}

unsafe extern "C" fn mapnik_map_layer_count(m: *mut mapnik_map_t) -> usize {
    unsafe { map_mut(m) }.layers.len()
}

unsafe extern "C" fn mapnik_map_get_layer(m: *mut mapnik_map_t, i: usize) -> *mut mapnik_layer_t {
    if m.is_null() || i >= unsafe { map_mut(m) }.layers.len() {
        return std::ptr::null_mut();
    }
    let view = Box::into_raw(Box::new(LayerHandle::View {
        map: m.cast(),
        index: i,
    }));
    with_state(|s| s.allocations.insert(view as usize, Alloc::LayerView));
    track("layer_view");
    view.cast()
}

unsafe extern "C" fn mapnik_map_render_to_grid(
    m: *mut mapnik_map_t,
    l: *mut mapnik_layer_t,
    key: *const c_char,
) -> *mut mapnik_grid_t {
    let (layer, has_datasource) = {
        let layer = unsafe { layer_mut(l) };
        (layer.name.to_string_lossy().into_owned(), layer.datasource.is_some())
    };
    let map = unsafe { map_mut(m) };
    map.err = None;
    if let Some(message) = take_failure() {
        map.fail(message);
        return std::ptr::null_mut();
    }
    if !has_datasource {
        map.fail(format!("layer {layer} has no datasource"));
        return std::ptr::null_mut();
    }
    track("grid");
    Box::into_raw(Box::new(FakeGrid {
        width: map.width,
        height: map.height,
        layer,
        key: unsafe { str_arg(key) },
    }))
    .cast()
}

unsafe extern "C" fn free(p: *mut c_void) {
    if p.is_null() {
        return;
    }
    match with_state(|s| s.allocations.remove(&(p as usize))) {
        Some(Alloc::Text(kind)) => {
            drop(unsafe { CString::from_raw(p.cast::<c_char>()) });
            untrack(kind);
        }
        Some(Alloc::LayerView) => {
            drop(unsafe { Box::from_raw(p.cast::<LayerHandle>()) });
            untrack("layer_view");
        }
        None => with_state(|s| s.bad_frees += 1),
    }
}

const FUNCTIONS: Functions = Functions {
    register_datasources: mapnik_register_datasources,
    register_fonts: mapnik_register_fonts,
    version_string: mapnik_version_string,
    projection_free: mapnik_projection_free,
    projection_forward: mapnik_projection_forward,
    bbox: mapnik_bbox,
    bbox_free: mapnik_bbox_free,
    blob_free: mapnik_blob_free,
    image_free: mapnik_image_free,
    image_to_png_blob: mapnik_image_to_png_blob,
    parameters: mapnik_parameters,
    parameters_free: mapnik_parameters_free,
    parameters_set: mapnik_parameters_set,
    datasource: mapnik_datasource,
    datasource_free: mapnik_datasource_free,
    layer: mapnik_layer,
    layer_free: mapnik_layer_free,
    layer_add_style: mapnik_layer_add_style,
    layer_set_datasource: mapnik_layer_set_datasource,
    layer_name: mapnik_layer_name,
    layer_set_active: mapnik_layer_set_active,
    grid_free: mapnik_grid_free,
    grid_to_json: mapnik_grid_to_json,
    map: mapnik_map,
    map_free: mapnik_map_free,
    map_last_error: mapnik_map_last_error,
    map_get_srs: mapnik_map_get_srs,
    map_set_srs: mapnik_map_set_srs,
    map_load: mapnik_map_load,
    map_load_string: mapnik_map_load_string,
    map_zoom_all: mapnik_map_zoom_all,
    map_render_to_file: mapnik_map_render_to_file,
    map_resize: mapnik_map_resize,
    map_set_buffer_size: mapnik_map_set_buffer_size,
    map_zoom_to_box: mapnik_map_zoom_to_box,
    map_projection: mapnik_map_projection,
    map_render_to_image: mapnik_map_render_to_image,
    map_add_layer: mapnik_map_add_layer,
    map_layer_count: mapnik_map_layer_count,
    map_get_layer: mapnik_map_get_layer,
    map_render_to_grid: mapnik_map_render_to_grid,
    free,
};

// Test-facing helpers

/// Fresh fake engine for the current thread
pub(crate) fn runtime() -> Runtime {
    let _ = env_logger::builder().is_test(true).try_init();
    with_state(|s| *s = State::default());
    Runtime::with_api(Arc::new(MapnikApi::from_functions(FUNCTIONS)))
}

/// Objects of `kind` currently alive
pub(crate) fn live(kind: &str) -> isize {
    with_state(|s| s.live.get(kind).copied().unwrap_or(0))
}

/// Objects of `kind` ever created
pub(crate) fn created(kind: &str) -> usize {
    with_state(|s| s.created.get(kind).copied().unwrap_or(0))
}

/// Panic unless every native object has been released exactly once
pub(crate) fn assert_no_leaks() {
    with_state(|s| {
        let leaked: Vec<_> = s.live.iter().filter(|(_, n)| **n != 0).collect();
        assert!(leaked.is_empty(), "unbalanced native objects: {leaked:?}");
        assert_eq!(s.bad_frees, 0, "free() called on pointers the engine never handed out");
    });
}

pub(crate) fn registered_datasources() -> Vec<String> {
    with_state(|s| s.registered_datasources.clone())
}

pub(crate) fn registered_fonts() -> Vec<String> {
    with_state(|s| s.registered_fonts.clone())
}

/// Make the next render call fail with `message`
pub(crate) fn fail_next_render(message: &str) {
    with_state(|s| s.fail_next_render = Some(message.to_string()));
}

/// `(layer, key, resolution)` of the last serialized grid
pub(crate) fn last_grid_request() -> Option<(String, String, u32)> {
    with_state(|s| s.last_grid_request.clone())
}

pub(crate) fn datasource_params(ds: &Datasource) -> HashMap<String, String> {
    unsafe { &*ds.as_ptr().cast::<HashMap<String, String>>() }.clone()
}

pub(crate) fn layer_name(layer: &Layer) -> String {
    unsafe { layer_mut(layer.as_ptr()) }.name.to_string_lossy().into_owned()
}

pub(crate) fn layer_styles(layer: &Layer) -> Vec<String> {
    unsafe { layer_mut(layer.as_ptr()) }.styles.clone()
}

pub(crate) fn layer_has_datasource(layer: &Layer) -> bool {
    unsafe { layer_mut(layer.as_ptr()) }.datasource.is_some()
}

pub(crate) fn map_size(map: &Map) -> (u32, u32) {
    let m = unsafe { map_mut(map.as_ptr()) };
    (m.width, m.height)
}

pub(crate) fn map_extent(map: &Map) -> Option<[f64; 4]> {
    unsafe { map_mut(map.as_ptr()) }.extent
}

pub(crate) fn map_buffer_size(map: &Map) -> i32 {
    unsafe { map_mut(map.as_ptr()) }.buffer_size
}

pub(crate) fn map_active_flags(map: &Map) -> Vec<bool> {
    unsafe { map_mut(map.as_ptr()) }.layers.iter().map(|l| l.active).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_balances_every_engine_allocation() {
        let runtime = runtime();

        assert!(runtime.register_datasources("/missing/input").is_err());
        assert_eq!(created("error_string"), 1);

        let mut map = Map::new(&runtime, 8, 8).unwrap();
        map.load_string("<Map></Map>").unwrap();
        let mut layer = Layer::new(&runtime, "points", "").unwrap();
        let ds = Datasource::new(&runtime, [("type", "memory")]).unwrap();
        layer.set_datasource(&ds);
        map.add_layer(&layer);

        map.render_to_memory_utf_grid("points", "id", 2).unwrap();
        assert!(map.set_active_layer("points"));

        assert_eq!(created("json"), 1);
        assert!(created("layer_view") >= 2);
        assert_eq!(live("error_string"), 0);
        assert_eq!(live("json"), 0);
        assert_eq!(live("layer_view"), 0);

        map.free();
        layer.free();
        ds.free();
        assert_no_leaks();
    }

    #[test]
    #[should_panic(expected = "free() called on pointers")]
    fn test_free_of_foreign_pointer_is_reported() {
        let runtime = runtime();
        let mut byte = 0u8;
        unsafe { (runtime.api().free)(std::ptr::addr_of_mut!(byte).cast()) };
        assert_no_leaks();
    }

    #[test]
    fn test_view_resolves_to_map_owned_layer() {
        let runtime = runtime();
        let mut map = Map::new(&runtime, 8, 8).unwrap();
        let layer = Layer::new(&runtime, "roads", "").unwrap();
        map.add_layer(&layer);
        layer.free();

        assert!(!map.set_active_layer("rivers"));
        assert_eq!(map_active_flags(&map), vec![false]);
        assert_eq!(map.layer_names(), vec!["roads".to_string()]);
    }
}
