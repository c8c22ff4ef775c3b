//! Bindings to the buffer management library `libgbm.so`
//!
//! The created handle is named `gbm_handle()`.

#![cfg_attr(rustfmt, rustfmt_skip)]

#[cfg(feature = "dlopen")]
use once_cell::sync::Lazy;
use std::os::raw::{c_char, c_int, c_void};

pub enum gbm_device {}
pub enum gbm_bo {}
pub enum gbm_surface {}

/// Driver-specific handle of a buffer object, as returned by `gbm_bo_get_handle`.
#[repr(C)]
#[derive(Copy, Clone)]
pub union gbm_bo_handle {
    pub ptr: *mut c_void,
    pub s32: i32,
    pub u32_: u32,
    pub s64: i64,
    pub u64_: u64,
}

external_library!(Gbm, "gbm",
    functions:
    // device
        fn gbm_create_device(c_int) -> *mut gbm_device,
        fn gbm_device_destroy(*mut gbm_device) -> (),
        fn gbm_device_get_fd(*mut gbm_device) -> c_int,
        fn gbm_device_get_backend_name(*mut gbm_device) -> *const c_char,
        fn gbm_device_is_format_supported(*mut gbm_device, u32, u32) -> c_int,
        fn gbm_device_get_format_modifier_plane_count(*mut gbm_device, u32, u64) -> c_int,

    // buffer objects
        fn gbm_bo_create(*mut gbm_device, u32, u32, u32, u32) -> *mut gbm_bo,
        fn gbm_bo_create_with_modifiers(*mut gbm_device, u32, u32, u32, *const u64, u32) -> *mut gbm_bo,
        fn gbm_bo_get_width(*mut gbm_bo) -> u32,
        fn gbm_bo_get_height(*mut gbm_bo) -> u32,
        fn gbm_bo_get_stride(*mut gbm_bo) -> u32,
        fn gbm_bo_get_format(*mut gbm_bo) -> u32,
        fn gbm_bo_get_bpp(*mut gbm_bo) -> u32,
        fn gbm_bo_get_modifier(*mut gbm_bo) -> u64,
        fn gbm_bo_get_plane_count(*mut gbm_bo) -> c_int,
        fn gbm_bo_get_handle(*mut gbm_bo) -> gbm_bo_handle,
        fn gbm_bo_get_fd(*mut gbm_bo) -> c_int,
        fn gbm_bo_destroy(*mut gbm_bo) -> (),

    // surfaces
        fn gbm_surface_create(*mut gbm_device, u32, u32, u32, u32) -> *mut gbm_surface,
        fn gbm_surface_create_with_modifiers(*mut gbm_device, u32, u32, u32, *const u64, u32) -> *mut gbm_surface,
        fn gbm_surface_lock_front_buffer(*mut gbm_surface) -> *mut gbm_bo,
        fn gbm_surface_release_buffer(*mut gbm_surface, *mut gbm_bo) -> (),
        fn gbm_surface_has_free_buffers(*mut gbm_surface) -> c_int,
        fn gbm_surface_destroy(*mut gbm_surface) -> (),
);

#[cfg(feature = "dlopen")]
pub fn gbm_option() -> Option<&'static Gbm> {
    static GBM_OPTION: Lazy<Option<Gbm>> = Lazy::new(|| {
        let versions = ["libgbm.so.1", "libgbm.so"];

        for ver in &versions {
            match unsafe { Gbm::open(ver) } {
                Ok(h) => return Some(h),
                Err(::dlib::DlError::CantOpen(_)) => continue,
                Err(::dlib::DlError::MissingSymbol(s)) => {
                    log::error!("Found library {ver} cannot be used: symbol {s} is missing.");
                    return None;
                }
            }
        }
        None
    });

    GBM_OPTION.as_ref()
}

#[cfg(feature = "dlopen")]
pub fn gbm_handle() -> &'static Gbm {
    static GBM_HANDLE: Lazy<&'static Gbm> =
        Lazy::new(|| gbm_option().expect("Library libgbm.so could not be loaded."));

    &GBM_HANDLE
}

#[cfg(not(feature = "dlopen"))]
pub fn is_lib_available() -> bool {
    true
}
#[cfg(feature = "dlopen")]
pub fn is_lib_available() -> bool {
    gbm_option().is_some()
}
