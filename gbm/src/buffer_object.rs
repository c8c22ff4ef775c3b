use std::fmt;
use std::os::unix::io::{AsFd, BorrowedFd, FromRawFd, OwnedFd};
use std::ptr;

use gbm_sys::gbm::gbm_bo;

use crate::{Device, Error, Format, NativeAllocator, Object, Surface};

#[derive(Clone, Copy)]
pub(crate) enum Owner<'a> {
    /// Allocated by the device, destroyed with the buffer
    Device(&'a Device),
    /// Lent by the surface, only the surface may take it back
    Surface(&'a Surface<'a>),
}

impl<'a> Owner<'a> {
    fn allocator(self) -> &'a dyn NativeAllocator {
        match self {
            Owner::Device(device) => device.allocator(),
            Owner::Surface(surface) => surface.device().allocator(),
        }
    }
}

/// A GBM buffer object
///
/// A buffer is either owned by the [`Device`] that allocated it, in which case
/// closing or dropping it destroys it, or lent by a [`Surface`] through
/// [`Surface::lock_front_buffer()`]. A lent buffer must go back to its surface
/// with [`Surface::release_buffer()`]; closing or dropping it only forgets it.
///
/// Querying a property of a closed buffer is a programming error and panics.
pub struct BufferObject<'a> {
    ptr: *mut gbm_bo,
    owner: Owner<'a>,
}

impl<'a> BufferObject<'a> {
    pub(crate) fn new(ptr: *mut gbm_bo, owner: Owner<'a>) -> Result<Self, Error> {
        if ptr.is_null() {
            return Err(Error::Allocation(match owner {
                Owner::Device(_) => Object::BufferObject,
                Owner::Surface(_) => Object::FrontBuffer,
            }));
        }
        log::debug!("Created buffer object {:p}", ptr);
        Ok(BufferObject { ptr, owner })
    }

    pub(crate) fn owner(&self) -> Owner<'a> {
        self.owner
    }

    // Hand the native handle over to the surface that lent it
    pub(crate) fn take_lent(&mut self) -> Result<*mut gbm_bo, Error> {
        if self.ptr.is_null() {
            return Err(Error::Closed(Object::BufferObject));
        }
        Ok(std::mem::replace(&mut self.ptr, ptr::null_mut()))
    }

    /// Whether closing this buffer destroys the native buffer
    ///
    /// This is true for buffers allocated by a [`Device`], and false for buffers
    /// lent by a [`Surface`].
    pub fn destroy_on_close(&self) -> bool {
        matches!(self.owner, Owner::Device(_))
    }

    /// The device the buffer ultimately belongs to
    pub fn device(&self) -> &'a Device {
        match self.owner {
            Owner::Device(device) => device,
            Owner::Surface(surface) => surface.device(),
        }
    }

    /// Raw pointer to the native buffer, null once closed
    pub fn as_raw(&self) -> *mut gbm_bo {
        self.ptr
    }

    /// Whether the buffer was closed or released
    pub fn is_closed(&self) -> bool {
        self.ptr.is_null()
    }

    /// Width in pixels
    ///
    /// # Panics
    ///
    /// If the buffer is closed. This holds for every property getter.
    pub fn width(&self) -> u32 {
        unsafe { self.allocator().bo_get_width(self.live_ptr()) }
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        unsafe { self.allocator().bo_get_height(self.live_ptr()) }
    }

    /// Bytes per row
    pub fn stride(&self) -> u32 {
        unsafe { self.allocator().bo_get_stride(self.live_ptr()) }
    }

    /// Pixel format, [`None`] if the driver reports a code unknown to [`Format`]
    pub fn format(&self) -> Option<Format> {
        Format::try_from(self.raw_format()).ok()
    }

    /// Fourcc code of the pixel format
    pub fn raw_format(&self) -> u32 {
        unsafe { self.allocator().bo_get_format(self.live_ptr()) }
    }

    /// Bits per pixel
    pub fn bpp(&self) -> u32 {
        unsafe { self.allocator().bo_get_bpp(self.live_ptr()) }
    }

    /// Format modifier of the memory layout
    pub fn modifier(&self) -> u64 {
        unsafe { self.allocator().bo_get_modifier(self.live_ptr()) }
    }

    /// Number of memory planes
    pub fn plane_count(&self) -> u32 {
        let count = unsafe { self.allocator().bo_get_plane_count(self.live_ptr()) };
        count.max(0) as u32
    }

    /// Driver handle of the buffer, for submission to KMS
    pub fn handle(&self) -> u32 {
        unsafe { self.allocator().bo_get_handle(self.live_ptr()) }
    }

    /// Export the buffer as a new dma-buf file descriptor
    ///
    /// The descriptor can be shared with other processes or imported into
    /// another graphics API. It is closed when the returned [`OwnedFd`] drops.
    pub fn get_fd(&self) -> Result<OwnedFd, Error> {
        if self.ptr.is_null() {
            return Err(Error::Closed(Object::BufferObject));
        }
        let fd = unsafe { self.allocator().bo_get_fd(self.ptr) };
        if fd < 0 {
            return Err(Error::Export);
        }
        // SAFETY: gbm_bo_get_fd returns a fresh descriptor owned by the caller
        Ok(unsafe { OwnedFd::from_raw_fd(fd) })
    }

    /// Run `f` with a freshly exported file descriptor of the buffer
    ///
    /// The descriptor is closed once `f` returns, or if it panics.
    pub fn with_fd<F, R>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(BorrowedFd<'_>) -> R,
    {
        let fd = self.get_fd()?;
        Ok(f(fd.as_fd()))
    }

    /// Close the buffer
    ///
    /// Buffers owned by a device are destroyed. Buffers lent by a surface are
    /// only forgotten, they should have gone through
    /// [`Surface::release_buffer()`] instead.
    ///
    /// Calling this more than once does nothing.
    pub fn close(&mut self) {
        if self.ptr.is_null() {
            return;
        }
        match self.owner {
            Owner::Device(device) => {
                unsafe { device.allocator().bo_destroy(self.ptr) };
                log::debug!("Destroyed buffer object {:p}", self.ptr);
            }
            Owner::Surface(surface) => {
                log::warn!(
                    "Buffer object {:p} closed without being released to gbm surface {:p}",
                    self.ptr,
                    surface.as_raw()
                );
            }
        }
        self.ptr = ptr::null_mut();
    }

    fn allocator(&self) -> &'a dyn NativeAllocator {
        self.owner.allocator()
    }

    fn live_ptr(&self) -> *mut gbm_bo {
        assert!(!self.ptr.is_null(), "gbm buffer object used after being closed");
        self.ptr
    }
}

impl fmt::Debug for BufferObject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BufferObject")
            .field("ptr", &self.ptr)
            .field("destroy_on_close", &self.destroy_on_close())
            .finish_non_exhaustive()
    }
}

impl Drop for BufferObject<'_> {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            log::debug!("Buffer object {:p} dropped without being closed", self.ptr);
            self.close();
        }
    }
}
