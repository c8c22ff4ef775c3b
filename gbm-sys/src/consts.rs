//! Constants of `gbm.h` and `drm_fourcc.h`.

/// Pack four ASCII bytes into a little-endian fourcc format code.
pub const fn fourcc_code(a: u8, b: u8, c: u8, d: u8) -> u32 {
    (a as u32) | ((b as u32) << 8) | ((c as u32) << 16) | ((d as u32) << 24)
}

// legacy gbm_bo_format values, accepted by gbm_bo_create in place of a fourcc
pub const GBM_BO_FORMAT_XRGB8888: u32 = 0;
pub const GBM_BO_FORMAT_ARGB8888: u32 = 1;

pub const GBM_FORMAT_BIG_ENDIAN: u32 = 1 << 31;

pub const GBM_FORMAT_R8: u32 = fourcc_code(b'R', b'8', b' ', b' ');
pub const GBM_FORMAT_GR88: u32 = fourcc_code(b'G', b'R', b'8', b'8');

pub const GBM_FORMAT_RGB565: u32 = fourcc_code(b'R', b'G', b'1', b'6');
pub const GBM_FORMAT_BGR565: u32 = fourcc_code(b'B', b'G', b'1', b'6');

pub const GBM_FORMAT_XRGB8888: u32 = fourcc_code(b'X', b'R', b'2', b'4');
pub const GBM_FORMAT_XBGR8888: u32 = fourcc_code(b'X', b'B', b'2', b'4');
pub const GBM_FORMAT_RGBX8888: u32 = fourcc_code(b'R', b'X', b'2', b'4');
pub const GBM_FORMAT_BGRX8888: u32 = fourcc_code(b'B', b'X', b'2', b'4');

pub const GBM_FORMAT_ARGB8888: u32 = fourcc_code(b'A', b'R', b'2', b'4');
pub const GBM_FORMAT_ABGR8888: u32 = fourcc_code(b'A', b'B', b'2', b'4');
pub const GBM_FORMAT_RGBA8888: u32 = fourcc_code(b'R', b'A', b'2', b'4');
pub const GBM_FORMAT_BGRA8888: u32 = fourcc_code(b'B', b'A', b'2', b'4');

pub const GBM_FORMAT_XRGB2101010: u32 = fourcc_code(b'X', b'R', b'3', b'0');
pub const GBM_FORMAT_XBGR2101010: u32 = fourcc_code(b'X', b'B', b'3', b'0');
pub const GBM_FORMAT_ARGB2101010: u32 = fourcc_code(b'A', b'R', b'3', b'0');
pub const GBM_FORMAT_ABGR2101010: u32 = fourcc_code(b'A', b'B', b'3', b'0');

pub const GBM_FORMAT_YUYV: u32 = fourcc_code(b'Y', b'U', b'Y', b'V');
pub const GBM_FORMAT_NV12: u32 = fourcc_code(b'N', b'V', b'1', b'2');

pub const GBM_BO_USE_SCANOUT: u32 = 1 << 0;
pub const GBM_BO_USE_CURSOR: u32 = 1 << 1;
/// Deprecated alias of `GBM_BO_USE_CURSOR`.
pub const GBM_BO_USE_CURSOR_64X64: u32 = GBM_BO_USE_CURSOR;
pub const GBM_BO_USE_RENDERING: u32 = 1 << 2;
pub const GBM_BO_USE_WRITE: u32 = 1 << 3;
pub const GBM_BO_USE_LINEAR: u32 = 1 << 4;
pub const GBM_BO_USE_PROTECTED: u32 = 1 << 5;
pub const GBM_BO_USE_FRONT_RENDERING: u32 = 1 << 6;

pub const DRM_FORMAT_MOD_LINEAR: u64 = 0;
pub const DRM_FORMAT_MOD_INVALID: u64 = 0x00ff_ffff_ffff_ffff;
