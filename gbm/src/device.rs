use std::ffi::CStr;
use std::fmt;
use std::os::unix::io::{AsRawFd, BorrowedFd, RawFd};
use std::ptr;
use std::rc::Rc;

use gbm_sys::gbm::gbm_device;

use crate::buffer_object::{BufferObject, Owner};
use crate::surface::Surface;
use crate::{BufferObjectFlags, Error, Format, NativeAllocator, Object, SystemAllocator};

/// A GBM device
///
/// This is the allocator context bound to a DRM file descriptor. It creates
/// [`Surface`]s and [`BufferObject`]s, which borrow it: the device cannot be
/// closed or dropped while any of them is alive.
///
/// The file descriptor stays owned by the caller. The device never closes it,
/// and the caller must keep it open until the device is closed.
pub struct Device {
    ptr: *mut gbm_device,
    fd: RawFd,
    allocator: Rc<dyn NativeAllocator>,
}

impl Device {
    /// Open a device over a DRM file descriptor, using the system libgbm
    pub fn open(fd: BorrowedFd<'_>) -> Result<Device, Error> {
        Device::open_with(Rc::new(SystemAllocator::new()?), fd)
    }

    /// Open a device over a DRM file descriptor, using the provided allocator
    pub fn open_with(
        allocator: Rc<dyn NativeAllocator>,
        fd: BorrowedFd<'_>,
    ) -> Result<Device, Error> {
        let fd = fd.as_raw_fd();
        let ptr = unsafe { allocator.create_device(fd) };
        if ptr.is_null() {
            return Err(Error::Allocation(Object::Device));
        }
        log::debug!("Created gbm device {:p} on fd {}", ptr, fd);
        Ok(Device { ptr, fd, allocator })
    }

    /// The file descriptor this device was opened over
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Raw pointer to the native device, null once closed
    pub fn as_raw(&self) -> *mut gbm_device {
        self.ptr
    }

    /// Whether [`close()`][Device::close()] was called
    pub fn is_closed(&self) -> bool {
        self.ptr.is_null()
    }

    /// Name of the backend driving this device
    ///
    /// # Panics
    ///
    /// If the device is closed.
    pub fn backend_name(&self) -> String {
        let name = unsafe { self.allocator.device_get_backend_name(self.live_ptr()) };
        if name.is_null() {
            return String::new();
        }
        // SAFETY: the backend name is a nul-terminated static string of the driver
        let name = unsafe { CStr::from_ptr(name) };
        name.to_string_lossy().into_owned()
    }

    /// Check if a format is supported for the given usage
    ///
    /// # Panics
    ///
    /// If the device is closed.
    pub fn is_format_supported(&self, format: Format, usage: BufferObjectFlags) -> bool {
        unsafe {
            self.allocator.device_is_format_supported(self.live_ptr(), format.as_raw(), usage.bits())
        }
    }

    /// Number of planes a buffer of this format and modifier has
    ///
    /// Returns [`None`] if the driver does not support the combination.
    ///
    /// # Panics
    ///
    /// If the device is closed.
    pub fn format_modifier_plane_count(&self, format: Format, modifier: u64) -> Option<u32> {
        let count = unsafe {
            self.allocator.device_get_format_modifier_plane_count(
                self.live_ptr(),
                format.as_raw(),
                modifier,
            )
        };
        u32::try_from(count).ok()
    }

    /// Allocate a buffer object owned by this device
    ///
    /// The buffer is destroyed when closed or dropped.
    pub fn create_buffer_object(
        &self,
        width: u32,
        height: u32,
        format: Format,
        usage: BufferObjectFlags,
    ) -> Result<BufferObject<'_>, Error> {
        let device = self.checked_ptr()?;
        let bo = unsafe {
            self.allocator.bo_create(device, width, height, format.as_raw(), usage.bits())
        };
        BufferObject::new(bo, Owner::Device(self))
    }

    /// Allocate a buffer object laid out with one of the given modifiers
    ///
    /// The driver picks among `modifiers` in the order they are given. An empty
    /// slice is handed to the driver as such, the result is whatever it does
    /// with it.
    pub fn create_buffer_object_with_modifiers(
        &self,
        width: u32,
        height: u32,
        format: Format,
        modifiers: &[u64],
    ) -> Result<BufferObject<'_>, Error> {
        let device = self.checked_ptr()?;
        let (list, count) =
            modifier_list(modifiers).ok_or(Error::Allocation(Object::BufferObject))?;
        let bo = unsafe {
            self.allocator.bo_create_with_modifiers(
                device,
                width,
                height,
                format.as_raw(),
                list,
                count,
            )
        };
        BufferObject::new(bo, Owner::Device(self))
    }

    /// Create a surface to render into
    pub fn create_surface(
        &self,
        width: u32,
        height: u32,
        format: Format,
        usage: BufferObjectFlags,
    ) -> Result<Surface<'_>, Error> {
        let device = self.checked_ptr()?;
        let surface = unsafe {
            self.allocator.surface_create(device, width, height, format.as_raw(), usage.bits())
        };
        Surface::new(surface, self)
    }

    /// Create a surface whose buffers are laid out with one of the given modifiers
    ///
    /// Empty slices are handled as in
    /// [`create_buffer_object_with_modifiers()`][Device::create_buffer_object_with_modifiers()].
    pub fn create_surface_with_modifiers(
        &self,
        width: u32,
        height: u32,
        format: Format,
        modifiers: &[u64],
    ) -> Result<Surface<'_>, Error> {
        let device = self.checked_ptr()?;
        let (list, count) = modifier_list(modifiers).ok_or(Error::Allocation(Object::Surface))?;
        let surface = unsafe {
            self.allocator.surface_create_with_modifiers(
                device,
                width,
                height,
                format.as_raw(),
                list,
                count,
            )
        };
        Surface::new(surface, self)
    }

    /// Destroy the native device
    ///
    /// Calling this more than once does nothing. The file descriptor is not closed.
    pub fn close(&mut self) {
        if self.ptr.is_null() {
            return;
        }
        unsafe { self.allocator.device_destroy(self.ptr) };
        log::debug!("Destroyed gbm device {:p}", self.ptr);
        self.ptr = ptr::null_mut();
    }

    pub(crate) fn allocator(&self) -> &dyn NativeAllocator {
        &*self.allocator
    }

    fn live_ptr(&self) -> *mut gbm_device {
        assert!(!self.ptr.is_null(), "gbm device used after being closed");
        self.ptr
    }

    fn checked_ptr(&self) -> Result<*mut gbm_device, Error> {
        if self.ptr.is_null() {
            Err(Error::Closed(Object::Device))
        } else {
            Ok(self.ptr)
        }
    }
}

// gbm rejects a non-null list with a zero count, so empty lists are passed as null
fn modifier_list(modifiers: &[u64]) -> Option<(*const u64, u32)> {
    let count = u32::try_from(modifiers.len()).ok()?;
    let list = if modifiers.is_empty() { ptr::null() } else { modifiers.as_ptr() };
    Some((list, count))
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Device").field("ptr", &self.ptr).field("fd", &self.fd).finish_non_exhaustive()
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            log::debug!("gbm device {:p} dropped without being closed", self.ptr);
            self.close();
        }
    }
}
