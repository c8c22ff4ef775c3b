//! The native function table the safe types are driven by.

use std::os::raw::{c_char, c_int};
use std::os::unix::io::RawFd;

use gbm_sys::ffi_dispatch;
use gbm_sys::gbm::*;

use crate::Error;

/// Flat function table of a native buffer allocator
///
/// This mirrors the subset of `gbm.h` that [`Device`][crate::Device],
/// [`Surface`][crate::Surface] and [`BufferObject`][crate::BufferObject] need.
/// Creation functions return a null pointer on failure, the safe layer turns
/// those into [`Error::Allocation`].
///
/// [`SystemAllocator`] forwards to the system libgbm. Other implementations can
/// be used with [`Device::open_with()`][crate::Device::open_with()], for
/// example to run against a fake driver in tests.
///
/// # Safety
///
/// Every handle passed to a method of this trait was previously returned by a
/// creation method of the same allocator and has not been destroyed yet. The
/// safe layer never calls a method on a destroyed handle, never destroys a
/// handle twice, and never calls `bo_destroy` on a buffer lent by
/// `surface_lock_front_buffer`.
pub trait NativeAllocator {
    /// `gbm_create_device`
    ///
    /// # Safety
    ///
    /// `fd` must be an open DRM device file descriptor.
    unsafe fn create_device(&self, fd: RawFd) -> *mut gbm_device;
    /// `gbm_device_destroy`
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn device_destroy(&self, device: *mut gbm_device);
    /// `gbm_device_get_backend_name`
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn device_get_backend_name(&self, device: *mut gbm_device) -> *const c_char;
    /// `gbm_device_is_format_supported`
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn device_is_format_supported(
        &self,
        device: *mut gbm_device,
        format: u32,
        usage: u32,
    ) -> bool;
    /// `gbm_device_get_format_modifier_plane_count`, negative if unsupported
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn device_get_format_modifier_plane_count(
        &self,
        device: *mut gbm_device,
        format: u32,
        modifier: u64,
    ) -> c_int;

    /// `gbm_bo_create`
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn bo_create(
        &self,
        device: *mut gbm_device,
        width: u32,
        height: u32,
        format: u32,
        usage: u32,
    ) -> *mut gbm_bo;
    /// `gbm_bo_create_with_modifiers`
    ///
    /// # Safety
    ///
    /// `modifiers` points to `count` values, or is null if `count` is 0.
    unsafe fn bo_create_with_modifiers(
        &self,
        device: *mut gbm_device,
        width: u32,
        height: u32,
        format: u32,
        modifiers: *const u64,
        count: u32,
    ) -> *mut gbm_bo;
    /// `gbm_bo_get_width`
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn bo_get_width(&self, bo: *mut gbm_bo) -> u32;
    /// `gbm_bo_get_height`
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn bo_get_height(&self, bo: *mut gbm_bo) -> u32;
    /// `gbm_bo_get_stride`
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn bo_get_stride(&self, bo: *mut gbm_bo) -> u32;
    /// `gbm_bo_get_format`
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn bo_get_format(&self, bo: *mut gbm_bo) -> u32;
    /// `gbm_bo_get_bpp`
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn bo_get_bpp(&self, bo: *mut gbm_bo) -> u32;
    /// `gbm_bo_get_modifier`
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn bo_get_modifier(&self, bo: *mut gbm_bo) -> u64;
    /// `gbm_bo_get_plane_count`
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn bo_get_plane_count(&self, bo: *mut gbm_bo) -> c_int;
    /// The `u32` member of `gbm_bo_get_handle`
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn bo_get_handle(&self, bo: *mut gbm_bo) -> u32;
    /// `gbm_bo_get_fd`, a new descriptor owned by the caller, negative on failure
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn bo_get_fd(&self, bo: *mut gbm_bo) -> c_int;
    /// `gbm_bo_destroy`
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn bo_destroy(&self, bo: *mut gbm_bo);

    /// `gbm_surface_create`
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn surface_create(
        &self,
        device: *mut gbm_device,
        width: u32,
        height: u32,
        format: u32,
        usage: u32,
    ) -> *mut gbm_surface;
    /// `gbm_surface_create_with_modifiers`
    ///
    /// # Safety
    ///
    /// `modifiers` points to `count` values, or is null if `count` is 0.
    unsafe fn surface_create_with_modifiers(
        &self,
        device: *mut gbm_device,
        width: u32,
        height: u32,
        format: u32,
        modifiers: *const u64,
        count: u32,
    ) -> *mut gbm_surface;
    /// `gbm_surface_lock_front_buffer`
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn surface_lock_front_buffer(&self, surface: *mut gbm_surface) -> *mut gbm_bo;
    /// `gbm_surface_release_buffer`
    ///
    /// # Safety
    ///
    /// `bo` was locked from `surface` and not released since.
    unsafe fn surface_release_buffer(&self, surface: *mut gbm_surface, bo: *mut gbm_bo);
    /// `gbm_surface_has_free_buffers`
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn surface_has_free_buffers(&self, surface: *mut gbm_surface) -> bool;
    /// `gbm_surface_destroy`
    ///
    /// # Safety
    ///
    /// See the trait documentation.
    unsafe fn surface_destroy(&self, surface: *mut gbm_surface);
}

/// The system libgbm
///
/// With the `dlopen` cargo feature the library is loaded on first use, and
/// [`SystemAllocator::new()`] fails if it cannot be found.
#[derive(Debug, Clone, Copy)]
pub struct SystemAllocator {
    _private: (),
}

impl SystemAllocator {
    /// Access the system libgbm
    pub fn new() -> Result<Self, Error> {
        if is_lib_available() {
            Ok(SystemAllocator { _private: () })
        } else {
            Err(Error::Unavailable)
        }
    }
}

impl NativeAllocator for SystemAllocator {
    unsafe fn create_device(&self, fd: RawFd) -> *mut gbm_device {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_create_device, fd) }
    }

    unsafe fn device_destroy(&self, device: *mut gbm_device) {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_device_destroy, device) }
    }

    unsafe fn device_get_backend_name(&self, device: *mut gbm_device) -> *const c_char {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_device_get_backend_name, device) }
    }

    unsafe fn device_is_format_supported(
        &self,
        device: *mut gbm_device,
        format: u32,
        usage: u32,
    ) -> bool {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_device_is_format_supported, device, format, usage) != 0 }
    }

    unsafe fn device_get_format_modifier_plane_count(
        &self,
        device: *mut gbm_device,
        format: u32,
        modifier: u64,
    ) -> c_int {
        unsafe {
            ffi_dispatch!(
                gbm_handle(),
                gbm_device_get_format_modifier_plane_count,
                device,
                format,
                modifier
            )
        }
    }

    unsafe fn bo_create(
        &self,
        device: *mut gbm_device,
        width: u32,
        height: u32,
        format: u32,
        usage: u32,
    ) -> *mut gbm_bo {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_bo_create, device, width, height, format, usage) }
    }

    unsafe fn bo_create_with_modifiers(
        &self,
        device: *mut gbm_device,
        width: u32,
        height: u32,
        format: u32,
        modifiers: *const u64,
        count: u32,
    ) -> *mut gbm_bo {
        unsafe {
            ffi_dispatch!(
                gbm_handle(),
                gbm_bo_create_with_modifiers,
                device,
                width,
                height,
                format,
                modifiers,
                count
            )
        }
    }

    unsafe fn bo_get_width(&self, bo: *mut gbm_bo) -> u32 {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_bo_get_width, bo) }
    }

    unsafe fn bo_get_height(&self, bo: *mut gbm_bo) -> u32 {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_bo_get_height, bo) }
    }

    unsafe fn bo_get_stride(&self, bo: *mut gbm_bo) -> u32 {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_bo_get_stride, bo) }
    }

    unsafe fn bo_get_format(&self, bo: *mut gbm_bo) -> u32 {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_bo_get_format, bo) }
    }

    unsafe fn bo_get_bpp(&self, bo: *mut gbm_bo) -> u32 {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_bo_get_bpp, bo) }
    }

    unsafe fn bo_get_modifier(&self, bo: *mut gbm_bo) -> u64 {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_bo_get_modifier, bo) }
    }

    unsafe fn bo_get_plane_count(&self, bo: *mut gbm_bo) -> c_int {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_bo_get_plane_count, bo) }
    }

    unsafe fn bo_get_handle(&self, bo: *mut gbm_bo) -> u32 {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_bo_get_handle, bo).u32_ }
    }

    unsafe fn bo_get_fd(&self, bo: *mut gbm_bo) -> c_int {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_bo_get_fd, bo) }
    }

    unsafe fn bo_destroy(&self, bo: *mut gbm_bo) {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_bo_destroy, bo) }
    }

    unsafe fn surface_create(
        &self,
        device: *mut gbm_device,
        width: u32,
        height: u32,
        format: u32,
        usage: u32,
    ) -> *mut gbm_surface {
        unsafe {
            ffi_dispatch!(gbm_handle(), gbm_surface_create, device, width, height, format, usage)
        }
    }

    unsafe fn surface_create_with_modifiers(
        &self,
        device: *mut gbm_device,
        width: u32,
        height: u32,
        format: u32,
        modifiers: *const u64,
        count: u32,
    ) -> *mut gbm_surface {
        unsafe {
            ffi_dispatch!(
                gbm_handle(),
                gbm_surface_create_with_modifiers,
                device,
                width,
                height,
                format,
                modifiers,
                count
            )
        }
    }

    unsafe fn surface_lock_front_buffer(&self, surface: *mut gbm_surface) -> *mut gbm_bo {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_surface_lock_front_buffer, surface) }
    }

    unsafe fn surface_release_buffer(&self, surface: *mut gbm_surface, bo: *mut gbm_bo) {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_surface_release_buffer, surface, bo) }
    }

    unsafe fn surface_has_free_buffers(&self, surface: *mut gbm_surface) -> bool {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_surface_has_free_buffers, surface) != 0 }
    }

    unsafe fn surface_destroy(&self, surface: *mut gbm_surface) {
        unsafe { ffi_dispatch!(gbm_handle(), gbm_surface_destroy, surface) }
    }
}
