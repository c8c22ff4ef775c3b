use std::cell::Cell;
use std::fmt;
use std::ptr::{self, NonNull};

use gbm_sys::gbm::{gbm_bo, gbm_surface};

use crate::buffer_object::{BufferObject, Owner};
use crate::{Device, Error, Object};

/// A GBM surface
///
/// A swap chain of buffers created by a [`Device`], typically rendered into
/// through EGL. Once a frame is rendered, its buffer is obtained with
/// [`lock_front_buffer()`][Surface::lock_front_buffer()] and must be handed
/// back with [`release_buffer()`][Surface::release_buffer()] once it is no
/// longer scanned out.
///
/// The surface keeps track of the buffer it lent most recently.
pub struct Surface<'dev> {
    ptr: *mut gbm_surface,
    device: &'dev Device,
    current: Cell<*mut gbm_bo>,
}

impl<'dev> Surface<'dev> {
    pub(crate) fn new(ptr: *mut gbm_surface, device: &'dev Device) -> Result<Self, Error> {
        if ptr.is_null() {
            return Err(Error::Allocation(Object::Surface));
        }
        log::debug!("Created gbm surface {:p}", ptr);
        Ok(Surface { ptr, device, current: Cell::new(ptr::null_mut()) })
    }

    /// The device this surface was created by
    pub fn device(&self) -> &'dev Device {
        self.device
    }

    /// Raw pointer to the native surface, null once closed
    pub fn as_raw(&self) -> *mut gbm_surface {
        self.ptr
    }

    /// Whether [`close()`][Surface::close()] was called
    pub fn is_closed(&self) -> bool {
        self.ptr.is_null()
    }

    /// Lock the buffer that was last rendered into
    ///
    /// Fails if nothing was rendered since the last lock, or if every buffer of
    /// the swap chain is already locked. Locking again without releasing the
    /// previous buffer is left to the driver to accept or refuse; on success
    /// the new buffer becomes the tracked one.
    pub fn lock_front_buffer(&self) -> Result<BufferObject<'_>, Error> {
        if self.ptr.is_null() {
            return Err(Error::Closed(Object::Surface));
        }
        let bo = unsafe { self.allocator().surface_lock_front_buffer(self.ptr) };
        let buffer = BufferObject::new(bo, Owner::Surface(self))?;
        self.current.set(bo);
        Ok(buffer)
    }

    /// Hand a locked buffer back to the swap chain
    ///
    /// This is the only way to dispose of a buffer lent by a surface. The
    /// buffer is closed afterwards.
    ///
    /// Fails with [`Error::Ownership`] if the buffer was not lent by this
    /// surface, and with [`Error::Closed`] if it was already released or
    /// closed. In both cases nothing changes.
    pub fn release_buffer(&self, bo: &mut BufferObject<'_>) -> Result<(), Error> {
        match bo.owner() {
            Owner::Surface(owner) if ptr::eq(owner, self) => {}
            _ => return Err(Error::Ownership),
        }
        let raw = bo.take_lent()?;
        // the buffer borrows this surface, so it cannot have been closed
        debug_assert!(!self.ptr.is_null());
        unsafe { self.allocator().surface_release_buffer(self.ptr, raw) };
        if self.current.get() == raw {
            self.current.set(ptr::null_mut());
        }
        log::debug!("Released buffer object {:p} to gbm surface {:p}", raw, self.ptr);
        Ok(())
    }

    /// Whether the swap chain has a buffer available for rendering
    ///
    /// # Panics
    ///
    /// If the surface is closed.
    pub fn has_free_buffers(&self) -> bool {
        assert!(!self.ptr.is_null(), "gbm surface used after being closed");
        unsafe { self.allocator().surface_has_free_buffers(self.ptr) }
    }

    /// The buffer most recently locked and not released yet, if any
    pub fn current_buffer(&self) -> Option<NonNull<gbm_bo>> {
        NonNull::new(self.current.get())
    }

    /// Destroy the native surface
    ///
    /// Calling this more than once does nothing.
    pub fn close(&mut self) {
        if self.ptr.is_null() {
            return;
        }
        unsafe { self.allocator().surface_destroy(self.ptr) };
        log::debug!("Destroyed gbm surface {:p}", self.ptr);
        self.ptr = ptr::null_mut();
        self.current.set(ptr::null_mut());
    }

    fn allocator(&self) -> &'dev dyn crate::NativeAllocator {
        self.device.allocator()
    }
}

impl fmt::Debug for Surface<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Surface")
            .field("ptr", &self.ptr)
            .field("device", &self.device.as_raw())
            .field("current", &self.current.get())
            .finish()
    }
}

impl Drop for Surface<'_> {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            log::debug!("gbm surface {:p} dropped without being closed", self.ptr);
            self.close();
        }
    }
}
