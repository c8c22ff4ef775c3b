use std::fmt;

use gbm_sys as ffi;

/// Pixel formats of buffer objects and surfaces
///
/// Each variant is the fourcc code defined by `gbm.h`, see
/// [`fourcc_code()`][ffi::fourcc_code()].
#[allow(missing_docs)]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    R8 = ffi::GBM_FORMAT_R8,
    Gr88 = ffi::GBM_FORMAT_GR88,

    Rgb565 = ffi::GBM_FORMAT_RGB565,
    Bgr565 = ffi::GBM_FORMAT_BGR565,

    Xrgb8888 = ffi::GBM_FORMAT_XRGB8888,
    Xbgr8888 = ffi::GBM_FORMAT_XBGR8888,
    Rgbx8888 = ffi::GBM_FORMAT_RGBX8888,
    Bgrx8888 = ffi::GBM_FORMAT_BGRX8888,

    Argb8888 = ffi::GBM_FORMAT_ARGB8888,
    Abgr8888 = ffi::GBM_FORMAT_ABGR8888,
    Rgba8888 = ffi::GBM_FORMAT_RGBA8888,
    Bgra8888 = ffi::GBM_FORMAT_BGRA8888,

    Xrgb2101010 = ffi::GBM_FORMAT_XRGB2101010,
    Xbgr2101010 = ffi::GBM_FORMAT_XBGR2101010,
    Argb2101010 = ffi::GBM_FORMAT_ARGB2101010,
    Abgr2101010 = ffi::GBM_FORMAT_ABGR2101010,

    Yuyv = ffi::GBM_FORMAT_YUYV,
    Nv12 = ffi::GBM_FORMAT_NV12,
}

impl Format {
    /// The fourcc code of this format
    pub fn as_raw(self) -> u32 {
        self as u32
    }
}

/// A raw format code that does not match any [`Format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownFormat(pub u32);

impl fmt::Display for UnknownFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [a, b, c, d] = self.0.to_le_bytes();
        if [a, b, c, d].iter().all(u8::is_ascii_graphic) {
            write!(f, "unknown format {}{}{}{}", a as char, b as char, c as char, d as char)
        } else {
            write!(f, "unknown format {:#010x}", self.0)
        }
    }
}

impl std::error::Error for UnknownFormat {}

impl TryFrom<u32> for Format {
    type Error = UnknownFormat;

    fn try_from(raw: u32) -> Result<Self, UnknownFormat> {
        use Format::*;

        Ok(match raw {
            ffi::GBM_FORMAT_R8 => R8,
            ffi::GBM_FORMAT_GR88 => Gr88,

            ffi::GBM_FORMAT_RGB565 => Rgb565,
            ffi::GBM_FORMAT_BGR565 => Bgr565,

            ffi::GBM_FORMAT_XRGB8888 => Xrgb8888,
            ffi::GBM_FORMAT_XBGR8888 => Xbgr8888,
            ffi::GBM_FORMAT_RGBX8888 => Rgbx8888,
            ffi::GBM_FORMAT_BGRX8888 => Bgrx8888,

            ffi::GBM_FORMAT_ARGB8888 => Argb8888,
            ffi::GBM_FORMAT_ABGR8888 => Abgr8888,
            ffi::GBM_FORMAT_RGBA8888 => Rgba8888,
            ffi::GBM_FORMAT_BGRA8888 => Bgra8888,

            ffi::GBM_FORMAT_XRGB2101010 => Xrgb2101010,
            ffi::GBM_FORMAT_XBGR2101010 => Xbgr2101010,
            ffi::GBM_FORMAT_ARGB2101010 => Argb2101010,
            ffi::GBM_FORMAT_ABGR2101010 => Abgr2101010,

            ffi::GBM_FORMAT_YUYV => Yuyv,
            ffi::GBM_FORMAT_NV12 => Nv12,

            _ => return Err(UnknownFormat(raw)),
        })
    }
}

bitflags::bitflags! {
    /// Intended usage of a buffer object or surface
    ///
    /// These flags can be combined, but not every combination is supported by
    /// every driver, see [`Device::is_format_supported()`][crate::Device::is_format_supported()].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferObjectFlags: u32 {
        /// Buffer is going to be presented to the screen using an API such as KMS
        const SCANOUT = ffi::GBM_BO_USE_SCANOUT;
        /// Buffer is going to be used as a cursor
        const CURSOR = ffi::GBM_BO_USE_CURSOR;
        /// Buffer is to be used for rendering, for example it is going to be used
        /// as the storage for a color buffer
        const RENDERING = ffi::GBM_BO_USE_RENDERING;
        /// Buffer can be written to from the CPU
        const WRITE = ffi::GBM_BO_USE_WRITE;
        /// Buffer is guaranteed to be laid out linearly in memory
        const LINEAR = ffi::GBM_BO_USE_LINEAR;
        /// Buffer holds protected content, it cannot be read by the CPU
        const PROTECTED = ffi::GBM_BO_USE_PROTECTED;
        /// Buffer will be rendered to while it is being scanned out
        const FRONT_RENDERING = ffi::GBM_BO_USE_FRONT_RENDERING;
    }
}
