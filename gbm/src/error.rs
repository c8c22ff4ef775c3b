use std::fmt;

/// Kind of native object an [`Error`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Object {
    /// A [`Device`][crate::Device] allocator context.
    Device,
    /// A [`Surface`][crate::Surface] swap chain.
    Surface,
    /// A [`BufferObject`][crate::BufferObject].
    BufferObject,
    /// The front buffer of a surface, as locked by
    /// [`Surface::lock_front_buffer()`][crate::Surface::lock_front_buffer()].
    FrontBuffer,
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Object::Device => write!(f, "gbm device"),
            Object::Surface => write!(f, "gbm surface"),
            Object::BufferObject => write!(f, "gbm buffer object"),
            Object::FrontBuffer => write!(f, "front buffer"),
        }
    }
}

/// Errors of the native allocator calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A native creation call returned a null handle.
    #[error("failed to allocate {0}")]
    Allocation(Object),
    /// The buffer object was released through a surface that did not lend it.
    #[error("buffer object does not belong to this surface")]
    Ownership,
    /// The buffer object could not be exported as a file descriptor.
    #[error("failed to export buffer object as a file descriptor")]
    Export,
    /// The object was already closed, or the buffer already released.
    #[error("{0} is already closed")]
    Closed(Object),
    /// The system libgbm could not be loaded.
    #[error("libgbm could not be loaded")]
    Unavailable,
}
