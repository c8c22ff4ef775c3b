//! FFI bindings to the generic buffer management library `libgbm.so`.
//!
//! The names exported by this crate should *not* be used directly, but though
//! the `ffi_dispatch` macro like this:
//!
//! ```ignore
//! ffi_dispatch!(gbm_handle(), func_name, arg1, arg2, arg3);
//! ```
//!
//! Where `gbm_handle()` returns the handle generated if the cargo feature
//! `dlopen` is on.
//!
//! For this to work, you must ensure every needed symbol is in scope (aka the static handle
//! if `dlopen` is on, the extern function if not). The easiest way to do this is to glob import
//! the `gbm` module. For example:
//!
//! ```ignore
//! use gbm_sys::{ffi_dispatch, gbm::*};
//!
//! let device = unsafe { ffi_dispatch!(gbm_handle(), gbm_create_device, fd) };
//! ```
//!
//! The `gbm` module defines a function named `is_lib_available()` which returns a boolean
//! depending on whether the lib could be loaded. It always returns true if the feature
//! `dlopen` is absent, as the lib is then directly linked.
//!
//! The constants of `gbm.h` are reexported at the root of this crate.

#![allow(non_camel_case_types)]

#[macro_use]
extern crate dlib;

pub mod gbm;

mod consts;
pub use consts::*;

#[cfg(feature = "dlopen")]
#[macro_export]
macro_rules! ffi_dispatch(
    ($handle: expr, $func: ident, $($arg: expr),*) => (
        ($handle.$func)($($arg),*)
    )
);

#[cfg(not(feature = "dlopen"))]
#[macro_export]
macro_rules! ffi_dispatch(
    ($handle: expr, $func: ident, $($arg: expr),*) => (
        $func($($arg),*)
    )
);
