// This module contains helpers functions and types that
// are not test in themselves, but are used by several tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::os::raw::{c_char, c_int};
use std::os::unix::io::{BorrowedFd, IntoRawFd, OwnedFd, RawFd};
use std::rc::Rc;

use gbm::ffi::gbm::{gbm_bo, gbm_device, gbm_surface};
use gbm::ffi::{DRM_FORMAT_MOD_INVALID, DRM_FORMAT_MOD_LINEAR};
use gbm::{Device, Format, NativeAllocator};

use rustix::io::Errno;
use rustix::pipe::{pipe_with, PipeFlags};

/// Modifier the fake driver accepts besides linear, laid out like I915_FORMAT_MOD_X_TILED
pub const X_TILED: u64 = 0x0100_0000_0000_0001;

/// Number of buffers in the swap chain of a fake surface
pub const SWAP_CHAIN_LEN: usize = 2;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A device opened over fd 3 on the given fake driver
pub fn open_device(mock: &Rc<MockAllocator>) -> Device {
    init_logger();
    // the fake driver never touches the descriptor
    let fd = unsafe { BorrowedFd::borrow_raw(3) };
    Device::open_with(mock.clone(), fd).expect("Failed to open mock device.")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    DeviceDestroy(usize),
    BoDestroy(usize),
    SurfaceLock { surface: usize, bo: usize },
    SurfaceRelease { surface: usize, bo: usize },
    SurfaceDestroy(usize),
}

/// What `bo_create_with_modifiers` received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifierRequest {
    pub null_list: bool,
    pub count: u32,
    pub modifiers: Vec<u64>,
}

#[derive(Debug, Clone)]
struct FakeBo {
    width: u32,
    height: u32,
    format: u32,
    modifier: u64,
    lent_by: Option<usize>,
}

#[derive(Debug, Default)]
struct FakeSurface {
    width: u32,
    height: u32,
    format: u32,
    rendered: usize,
    locked: Vec<usize>,
    free: Vec<usize>,
}

#[derive(Debug, Default)]
struct State {
    next_handle: usize,
    devices: HashMap<usize, RawFd>,
    bos: HashMap<usize, FakeBo>,
    surfaces: HashMap<usize, FakeSurface>,
    calls: Vec<Call>,
    misuse: Vec<String>,
    modifier_requests: Vec<ModifierRequest>,
    exported: Vec<OwnedFd>,
    fail_device: bool,
    fail_export: bool,
}

impl State {
    fn handle(&mut self) -> usize {
        self.next_handle += 0x10;
        0x1000 + self.next_handle
    }

    fn new_bo(&mut self, bo: FakeBo) -> usize {
        let handle = self.handle();
        self.bos.insert(handle, bo);
        handle
    }
}

/// A fake GBM driver
///
/// Handles are plain integers that are never dereferenced. Every call on a
/// handle the driver does not know, and every call the real libgbm does not
/// allow, is recorded as misuse instead of crashing.
#[derive(Debug, Default)]
pub struct MockAllocator {
    state: RefCell<State>,
}

impl MockAllocator {
    pub fn new() -> Rc<MockAllocator> {
        Rc::new(MockAllocator::default())
    }

    pub fn fail_device_creation(&self) {
        self.state.borrow_mut().fail_device = true;
    }

    pub fn fail_export(&self) {
        self.state.borrow_mut().fail_export = true;
    }

    /// Simulate EGL finishing a frame on the surface
    pub fn render_frame(&self, surface: *mut gbm_surface) {
        let mut state = self.state.borrow_mut();
        match state.surfaces.get_mut(&(surface as usize)) {
            Some(s) => s.rendered += 1,
            None => panic!("render_frame on unknown surface {:p}", surface),
        }
    }

    pub fn live_devices(&self) -> usize {
        self.state.borrow().devices.len()
    }

    pub fn live_surfaces(&self) -> usize {
        self.state.borrow().surfaces.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().bos.len()
    }

    pub fn device_fd(&self, device: *mut gbm_device) -> Option<RawFd> {
        self.state.borrow().devices.get(&(device as usize)).copied()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn count_calls(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn misuse(&self) -> Vec<String> {
        self.state.borrow().misuse.clone()
    }

    pub fn modifier_requests(&self) -> Vec<ModifierRequest> {
        self.state.borrow().modifier_requests.clone()
    }

    pub fn exported_count(&self) -> usize {
        self.state.borrow().exported.len()
    }

    /// Whether every copy of the `index`-th exported descriptor was closed,
    /// draining what was written to it
    pub fn exported_fd_closed(&self, index: usize) -> (bool, Vec<u8>) {
        let state = self.state.borrow();
        let reader = &state.exported[index];
        let mut data = Vec::new();
        let mut buf = [0u8; 64];
        loop {
            match rustix::io::read(reader, &mut buf[..]) {
                Ok(0) => return (true, data),
                Ok(n) => data.extend_from_slice(&buf[..n]),
                Err(Errno::AGAIN) => return (false, data),
                Err(e) => panic!("read on exported pipe failed: {e}"),
            }
        }
    }

    fn misused(&self, what: String) {
        self.state.borrow_mut().misuse.push(what);
    }

    fn with_bo<T: Default>(&self, bo: *mut gbm_bo, f: impl FnOnce(&FakeBo) -> T) -> T {
        let value = self.state.borrow().bos.get(&(bo as usize)).map(f);
        match value {
            Some(value) => value,
            None => {
                self.misused(format!("query on unknown buffer object {:p}", bo));
                T::default()
            }
        }
    }
}

fn supported(format: u32) -> bool {
    format == Format::Xrgb8888.as_raw() || format == Format::Argb8888.as_raw()
}

impl NativeAllocator for MockAllocator {
    unsafe fn create_device(&self, fd: RawFd) -> *mut gbm_device {
        let mut state = self.state.borrow_mut();
        if state.fail_device {
            return std::ptr::null_mut();
        }
        let handle = state.handle();
        state.devices.insert(handle, fd);
        handle as *mut gbm_device
    }

    unsafe fn device_destroy(&self, device: *mut gbm_device) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::DeviceDestroy(device as usize));
        if state.devices.remove(&(device as usize)).is_none() {
            state.misuse.push(format!("destroy of unknown device {:p}", device));
        }
    }

    unsafe fn device_get_backend_name(&self, _device: *mut gbm_device) -> *const c_char {
        c"mock".as_ptr()
    }

    unsafe fn device_is_format_supported(
        &self,
        _device: *mut gbm_device,
        format: u32,
        usage: u32,
    ) -> bool {
        supported(format) && usage & gbm::ffi::GBM_BO_USE_PROTECTED == 0
    }

    unsafe fn device_get_format_modifier_plane_count(
        &self,
        _device: *mut gbm_device,
        format: u32,
        modifier: u64,
    ) -> c_int {
        match modifier {
            _ if !supported(format) => -1,
            DRM_FORMAT_MOD_LINEAR => 1,
            X_TILED => 2,
            _ => -1,
        }
    }

    unsafe fn bo_create(
        &self,
        _device: *mut gbm_device,
        width: u32,
        height: u32,
        format: u32,
        _usage: u32,
    ) -> *mut gbm_bo {
        if width == 0 || height == 0 || !supported(format) {
            return std::ptr::null_mut();
        }
        let bo = FakeBo { width, height, format, modifier: DRM_FORMAT_MOD_LINEAR, lent_by: None };
        self.state.borrow_mut().new_bo(bo) as *mut gbm_bo
    }

    unsafe fn bo_create_with_modifiers(
        &self,
        _device: *mut gbm_device,
        width: u32,
        height: u32,
        format: u32,
        modifiers: *const u64,
        count: u32,
    ) -> *mut gbm_bo {
        let list = if modifiers.is_null() {
            Vec::new()
        } else {
            let list = unsafe { std::slice::from_raw_parts(modifiers, count as usize) };
            list.to_vec()
        };
        let mut state = self.state.borrow_mut();
        state.modifier_requests.push(ModifierRequest {
            null_list: modifiers.is_null(),
            count,
            modifiers: list.clone(),
        });
        // like libgbm: a list and its count must agree, and one of them must be usable
        if modifiers.is_null() != (count == 0) {
            state.misuse.push("modifier list and count disagree".into());
            return std::ptr::null_mut();
        }
        if width == 0 || height == 0 || !supported(format) {
            return std::ptr::null_mut();
        }
        match list.into_iter().find(|m| *m == DRM_FORMAT_MOD_LINEAR || *m == X_TILED) {
            Some(modifier) => {
                let bo = FakeBo { width, height, format, modifier, lent_by: None };
                state.new_bo(bo) as *mut gbm_bo
            }
            None => std::ptr::null_mut(),
        }
    }

    unsafe fn bo_get_width(&self, bo: *mut gbm_bo) -> u32 {
        self.with_bo(bo, |b| b.width)
    }

    unsafe fn bo_get_height(&self, bo: *mut gbm_bo) -> u32 {
        self.with_bo(bo, |b| b.height)
    }

    unsafe fn bo_get_stride(&self, bo: *mut gbm_bo) -> u32 {
        self.with_bo(bo, |b| b.width * 4)
    }

    unsafe fn bo_get_format(&self, bo: *mut gbm_bo) -> u32 {
        self.with_bo(bo, |b| b.format)
    }

    unsafe fn bo_get_bpp(&self, bo: *mut gbm_bo) -> u32 {
        self.with_bo(bo, |_| 32)
    }

    unsafe fn bo_get_modifier(&self, bo: *mut gbm_bo) -> u64 {
        self.with_bo(bo, |b| b.modifier)
    }

    unsafe fn bo_get_plane_count(&self, bo: *mut gbm_bo) -> c_int {
        self.with_bo(bo, |b| if b.modifier == X_TILED { 2 } else { 1 })
    }

    unsafe fn bo_get_handle(&self, bo: *mut gbm_bo) -> u32 {
        self.with_bo(bo, |_| ((bo as usize) >> 4) as u32)
    }

    unsafe fn bo_get_fd(&self, bo: *mut gbm_bo) -> c_int {
        if !self.state.borrow().bos.contains_key(&(bo as usize)) {
            self.misused(format!("export of unknown buffer object {:p}", bo));
            return -1;
        }
        if self.state.borrow().fail_export {
            return -1;
        }
        let (reader, writer) = match pipe_with(PipeFlags::CLOEXEC | PipeFlags::NONBLOCK) {
            Ok(pair) => pair,
            Err(_) => return -1,
        };
        self.state.borrow_mut().exported.push(reader);
        writer.into_raw_fd()
    }

    unsafe fn bo_destroy(&self, bo: *mut gbm_bo) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::BoDestroy(bo as usize));
        match state.bos.get(&(bo as usize)).map(|b| b.lent_by) {
            None => state.misuse.push(format!("destroy of unknown buffer object {:p}", bo)),
            Some(Some(_)) => {
                state.misuse.push(format!("destroy of surface buffer object {:p}", bo))
            }
            Some(None) => {
                state.bos.remove(&(bo as usize));
            }
        }
    }

    unsafe fn surface_create(
        &self,
        _device: *mut gbm_device,
        width: u32,
        height: u32,
        format: u32,
        _usage: u32,
    ) -> *mut gbm_surface {
        if width == 0 || height == 0 || !supported(format) {
            return std::ptr::null_mut();
        }
        let mut state = self.state.borrow_mut();
        let handle = state.handle();
        state.surfaces.insert(handle, FakeSurface { width, height, format, ..Default::default() });
        handle as *mut gbm_surface
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
        if count == 0 {
            return std::ptr::null_mut();
        }
        let list = unsafe { std::slice::from_raw_parts(modifiers, count as usize) };
        if list.iter().all(|m| *m == DRM_FORMAT_MOD_INVALID) {
            return std::ptr::null_mut();
        }
        unsafe { self.surface_create(device, width, height, format, 0) }
    }

    unsafe fn surface_lock_front_buffer(&self, surface: *mut gbm_surface) -> *mut gbm_bo {
        let mut state = self.state.borrow_mut();
        let key = surface as usize;
        let (width, height, format, reuse) = match state.surfaces.get_mut(&key) {
            Some(s) if s.rendered > 0 && s.locked.len() < SWAP_CHAIN_LEN => {
                s.rendered -= 1;
                (s.width, s.height, s.format, s.free.pop())
            }
            Some(_) => return std::ptr::null_mut(),
            None => {
                state.misuse.push(format!("lock on unknown surface {:p}", surface));
                return std::ptr::null_mut();
            }
        };
        let bo = match reuse {
            Some(bo) => bo,
            None => state.new_bo(FakeBo {
                width,
                height,
                format,
                modifier: DRM_FORMAT_MOD_LINEAR,
                lent_by: Some(key),
            }),
        };
        if let Some(s) = state.surfaces.get_mut(&key) {
            s.locked.push(bo);
        }
        state.calls.push(Call::SurfaceLock { surface: key, bo });
        bo as *mut gbm_bo
    }

    unsafe fn surface_release_buffer(&self, surface: *mut gbm_surface, bo: *mut gbm_bo) {
        let mut state = self.state.borrow_mut();
        let (key, bo) = (surface as usize, bo as usize);
        state.calls.push(Call::SurfaceRelease { surface: key, bo });
        let released = match state.surfaces.get_mut(&key) {
            Some(s) => match s.locked.iter().position(|b| *b == bo) {
                Some(i) => {
                    s.locked.remove(i);
                    s.free.push(bo);
                    true
                }
                None => false,
            },
            None => false,
        };
        if !released {
            state.misuse.push(format!("release of {:#x} not locked from {:#x}", bo, key));
        }
    }

    unsafe fn surface_has_free_buffers(&self, surface: *mut gbm_surface) -> bool {
        match self.state.borrow().surfaces.get(&(surface as usize)) {
            Some(s) => s.locked.len() < SWAP_CHAIN_LEN,
            None => false,
        }
    }

    unsafe fn surface_destroy(&self, surface: *mut gbm_surface) {
        let mut state = self.state.borrow_mut();
        let key = surface as usize;
        state.calls.push(Call::SurfaceDestroy(key));
        match state.surfaces.remove(&key) {
            Some(s) => {
                if !s.locked.is_empty() {
                    state.misuse.push(format!("surface {:#x} destroyed with locked buffers", key));
                }
                state.bos.retain(|_, b| b.lent_by != Some(key));
            }
            None => state.misuse.push(format!("destroy of unknown surface {:#x}", key)),
        }
    }
}
