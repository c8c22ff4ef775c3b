#![warn(missing_docs, missing_debug_implementations)]
#![forbid(improper_ctypes, unsafe_op_in_unsafe_fn)]
// Doc feature labels can be tested locally by running RUSTDOCFLAGS="--cfg=docsrs" cargo +nightly doc -p <crate>
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! GBM utilities
//!
//! This crate contains safe bindings to the `libgbm.so` library, the generic
//! buffer manager used to allocate scanout and rendering buffers on DRM/KMS
//! devices.
//!
//! Three kinds of native objects are managed, forming a strict hierarchy:
//!
//! - a [`Device`] wraps an allocator context opened over a DRM file descriptor
//!   that stays owned by the caller,
//! - a [`Surface`] is a swap chain created by a device, lending out its front
//!   buffers through [`Surface::lock_front_buffer()`],
//! - a [`BufferObject`] is either owned by the device that created it, or lent
//!   by a surface and handed back with [`Surface::release_buffer()`].
//!
//! Children borrow their parent, so the borrow checker makes sure a device
//! outlives its surfaces and buffers, and a surface outlives the buffers it
//! lent. Every object can be closed explicitly (idempotently), and is closed
//! on drop otherwise.
//!
//! All native calls go through a [`NativeAllocator`] function table. The
//! default one, [`SystemAllocator`], uses the system `libgbm`. With the `dlopen`
//! cargo feature (enabled by default) the library is loaded at runtime, see
//! [`is_available()`].
//!
//! ```no_run
//! use std::fs::OpenOptions;
//! use std::os::fd::AsFd;
//!
//! use gbm::{BufferObjectFlags, Device, Format};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let card = OpenOptions::new().read(true).write(true).open("/dev/dri/card0")?;
//! let device = Device::open(card.as_fd())?;
//!
//! let surface =
//!     device.create_surface(1920, 1080, Format::Xrgb8888, BufferObjectFlags::SCANOUT)?;
//! // ... render a frame with EGL ...
//! let mut front = surface.lock_front_buffer()?;
//! println!("front buffer {}x{}, handle {}", front.width(), front.height(), front.handle());
//! surface.release_buffer(&mut front)?;
//! # Ok(())
//! # }
//! ```

mod allocator;
mod buffer_object;
mod device;
mod error;
mod format;
mod surface;

pub use allocator::{NativeAllocator, SystemAllocator};
pub use buffer_object::BufferObject;
pub use device::Device;
pub use error::{Error, Object};
pub use format::{BufferObjectFlags, Format, UnknownFormat};
pub use surface::Surface;

/// Reexport of the raw bindings, including the native handle types and `gbm.h` constants.
pub use gbm_sys as ffi;

/// Checks if the system libgbm is available and can be used
///
/// Trying to [`open`][Device::open()] a device while this function returns
/// [`false`] will fail with [`Error::Unavailable`].
pub fn is_available() -> bool {
    gbm_sys::gbm::is_lib_available()
}
