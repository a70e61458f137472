//! # Simulated Driver
//!
//! A host-RAM backed [`Driver`] that tracks every native resource it hands
//! out. Device allocations, pinned host buffers and arrays carry real byte
//! storage so copies can be read back; every primitive is recorded in an
//! ordered call log and any primitive can be made to fail once.

use std::thread::{self, ThreadId};

use basalt_core::{
    ArrayHandle, DeviceId, DevicePtr, HostPtr, NativeError, NativeResult, SurfaceHandle,
};
use hashbrown::HashMap;
use spin::Mutex;

use crate::driver::{ArrayDescriptor, Driver, Memcpy2D, Memcpy3D, ResourceDesc, Stream};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Simulated driver configuration
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    /// Number of device ordinals
    pub device_count: u32,
    /// Device allocation granularity in bytes
    pub granularity: usize,
    /// First device address handed out
    pub device_base: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            device_count: 1,
            granularity: 256,
            device_base: 0x0000_7f00_0000_0000,
        }
    }
}

// =============================================================================
// CALL LOG
// =============================================================================

/// Native primitive, as recorded in the call log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum DriverOp {
    SetDevice,
    Malloc,
    Free,
    HostMalloc,
    FreeHost,
    HostRegister,
    HostUnregister,
    HostGetDevicePointer,
    MemGetAddressRange,
    MemcpyHtoD,
    StreamSynchronize,
    ArrayCreate,
    ArrayDestroy,
    ArrayGetDescriptor,
    MemcpyHtoA,
    Memcpy2D,
    Memcpy3D,
    SurfaceCreate,
    SurfaceDestroy,
}

/// Live native resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimStats {
    /// Device allocations
    pub device_allocations: usize,
    /// Pinned host allocations
    pub pinned_allocations: usize,
    /// Registered host ranges
    pub registered_ranges: usize,
    /// Pixel arrays
    pub arrays: usize,
    /// Surface objects
    pub surfaces: usize,
}

impl SimStats {
    /// Check if nothing is live
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Host bytes the device can address
struct Pinned {
    storage: Box<[u8]>,
    device: DevicePtr,
}

/// Caller-owned host range mapped for the device
struct Registered {
    size: usize,
    device: DevicePtr,
}

struct SimArray {
    desc: ArrayDescriptor,
    storage: Vec<u8>,
}

/// Where a device address resolves to
enum Target {
    Device { base: u64, offset: usize },
    Pinned { host: usize, offset: usize },
    Registered { host: usize, offset: usize },
}

struct SimState {
    next_device: u64,
    next_handle: u64,
    allocations: HashMap<u64, Vec<u8>>,
    pinned: HashMap<usize, Pinned>,
    registered: HashMap<usize, Registered>,
    arrays: HashMap<u64, SimArray>,
    surfaces: HashMap<u64, ArrayHandle>,
    current: HashMap<ThreadId, DeviceId>,
    calls: Vec<DriverOp>,
    failures: HashMap<DriverOp, NativeError>,
}

impl SimState {
    fn reserve_device(&mut self, size: usize, granularity: usize) -> DevicePtr {
        let base = self.next_device;
        let span = size.div_ceil(granularity).max(1) * granularity;
        // one granule gap keeps neighbours from looking contiguous
        self.next_device += (span + granularity) as u64;
        DevicePtr::new(base)
    }

    fn next_handle(&mut self) -> u64 {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }

    fn resolve(&self, ptr: DevicePtr) -> Option<(Target, usize)> {
        let p = ptr.raw();
        for (base, storage) in &self.allocations {
            let len = storage.len() as u64;
            if p >= *base && p < base + len {
                let offset = (p - base) as usize;
                return Some((Target::Device { base: *base, offset }, storage.len()));
            }
        }
        for (host, pinned) in &self.pinned {
            let base = pinned.device.raw();
            let len = pinned.storage.len();
            if p >= base && p < base + len as u64 {
                let offset = (p - base) as usize;
                return Some((Target::Pinned { host: *host, offset }, len));
            }
        }
        for (host, reg) in &self.registered {
            let base = reg.device.raw();
            if p >= base && p < base + reg.size as u64 {
                let offset = (p - base) as usize;
                return Some((Target::Registered { host: *host, offset }, reg.size));
            }
        }
        None
    }

    fn stats(&self) -> SimStats {
        SimStats {
            device_allocations: self.allocations.len(),
            pinned_allocations: self.pinned.len(),
            registered_ranges: self.registered.len(),
            arrays: self.arrays.len(),
            surfaces: self.surfaces.len(),
        }
    }
}

// =============================================================================
// SIM DRIVER
// =============================================================================

/// Simulated native driver
pub struct SimDriver {
    config: SimConfig,
    state: Mutex<SimState>,
}

impl SimDriver {
    /// Create a new simulated driver
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            state: Mutex::new(SimState {
                next_device: config.device_base,
                next_handle: 1,
                allocations: HashMap::new(),
                pinned: HashMap::new(),
                registered: HashMap::new(),
                arrays: HashMap::new(),
                surfaces: HashMap::new(),
                current: HashMap::new(),
                calls: Vec::new(),
                failures: HashMap::new(),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Make the next call of `op` fail with `error`
    pub fn fail_next(&self, op: DriverOp, error: NativeError) {
        self.state.lock().failures.insert(op, error);
    }

    /// Every recorded call, oldest first
    pub fn calls(&self) -> Vec<DriverOp> {
        self.state.lock().calls.clone()
    }

    /// Number of recorded calls of `op`
    pub fn count(&self, op: DriverOp) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == op).count()
    }

    /// Forget the call log
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Live native resources
    pub fn stats(&self) -> SimStats {
        self.state.lock().stats()
    }

    /// Read back bytes through a device address
    pub fn read_device(&self, ptr: DevicePtr, len: usize) -> Option<Vec<u8>> {
        let state = self.state.lock();
        let (target, total) = state.resolve(ptr)?;
        match target {
            Target::Device { base, offset } => {
                let storage = state.allocations.get(&base)?;
                storage.get(offset..offset.checked_add(len)?).map(<[u8]>::to_vec)
            }
            Target::Pinned { host, offset } => {
                let pinned = state.pinned.get(&host)?;
                pinned.storage.get(offset..offset.checked_add(len)?).map(<[u8]>::to_vec)
            }
            Target::Registered { host, offset } => {
                if offset.checked_add(len)? > total {
                    return None;
                }
                let mut out = vec![0u8; len];
                // SAFETY: the range was registered as valid for `total` bytes
                unsafe {
                    core::ptr::copy_nonoverlapping(
                        (host + offset) as *const u8,
                        out.as_mut_ptr(),
                        len,
                    );
                }
                Some(out)
            }
        }
    }

    /// Read back the full contents of an array
    pub fn read_array(&self, array: ArrayHandle) -> Option<Vec<u8>> {
        self.state
            .lock()
            .arrays
            .get(&array.raw())
            .map(|a| a.storage.clone())
    }

    /// Record `op` and consume any injected failure
    fn enter(&self, state: &mut SimState, op: DriverOp) -> NativeResult<()> {
        log::trace!("sim: {:?}", op);
        state.calls.push(op);
        match state.failures.remove(&op) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn check_shape(desc: &ArrayDescriptor) -> NativeResult<()> {
        let shape_ok = match (desc.height, desc.depth) {
            (_, 0) => true,
            (h, _) => h != 0,
        };
        if desc.width == 0 || !shape_ok || !matches!(desc.num_channels, 1 | 2 | 4) {
            return Err(NativeError::InvalidValue);
        }
        Ok(())
    }
}

impl core::fmt::Debug for SimDriver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimDriver")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Copy `rows` strided rows from host memory into `dst`
///
/// # Safety
/// `src` must be valid for reads of `(rows - 1) * pitch + row_bytes` bytes.
unsafe fn copy_rows(dst: &mut [u8], src: HostPtr, pitch: usize, row_bytes: usize, rows: usize) {
    for row in 0..rows {
        let from = src.offset(row * pitch).as_ptr();
        let to = &mut dst[row * row_bytes..(row + 1) * row_bytes];
        // SAFETY: guaranteed by the caller
        unsafe { core::ptr::copy_nonoverlapping(from, to.as_mut_ptr(), row_bytes) };
    }
}

impl Driver for SimDriver {
    fn current_device(&self) -> NativeResult<DeviceId> {
        let state = self.state.lock();
        Ok(state
            .current
            .get(&thread::current().id())
            .copied()
            .unwrap_or_default())
    }

    fn set_device(&self, device: DeviceId) -> NativeResult<()> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::SetDevice)?;
        if device.0 >= self.config.device_count {
            return Err(NativeError::InvalidDevice);
        }
        state.current.insert(thread::current().id(), device);
        Ok(())
    }

    fn malloc(&self, size: usize) -> NativeResult<DevicePtr> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::Malloc)?;
        if size == 0 {
            return Err(NativeError::InvalidValue);
        }
        let rounded = size.div_ceil(self.config.granularity) * self.config.granularity;
        let ptr = state.reserve_device(rounded, self.config.granularity);
        state.allocations.insert(ptr.raw(), vec![0u8; rounded]);
        Ok(ptr)
    }

    fn free(&self, ptr: DevicePtr) -> NativeResult<()> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::Free)?;
        state
            .allocations
            .remove(&ptr.raw())
            .map(drop)
            .ok_or(NativeError::InvalidDevicePointer)
    }

    fn host_malloc(&self, size: usize) -> NativeResult<HostPtr> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::HostMalloc)?;
        if size == 0 {
            return Err(NativeError::InvalidValue);
        }
        let storage = vec![0u8; size].into_boxed_slice();
        let host = HostPtr::from_slice(&storage);
        let device = state.reserve_device(size, self.config.granularity);
        state.pinned.insert(host.addr(), Pinned { storage, device });
        Ok(host)
    }

    fn free_host(&self, ptr: HostPtr) -> NativeResult<()> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::FreeHost)?;
        state
            .pinned
            .remove(&ptr.addr())
            .map(drop)
            .ok_or(NativeError::InvalidValue)
    }

    unsafe fn host_register(&self, ptr: HostPtr, size: usize) -> NativeResult<()> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::HostRegister)?;
        if size == 0 {
            return Err(NativeError::InvalidValue);
        }
        if state.registered.contains_key(&ptr.addr()) {
            return Err(NativeError::HostMemoryAlreadyRegistered);
        }
        let device = state.reserve_device(size, self.config.granularity);
        state.registered.insert(ptr.addr(), Registered { size, device });
        Ok(())
    }

    fn host_unregister(&self, ptr: HostPtr) -> NativeResult<()> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::HostUnregister)?;
        state
            .registered
            .remove(&ptr.addr())
            .map(drop)
            .ok_or(NativeError::HostMemoryNotRegistered)
    }

    fn host_get_device_pointer(&self, ptr: HostPtr) -> NativeResult<DevicePtr> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::HostGetDevicePointer)?;
        if let Some(p) = state.pinned.get(&ptr.addr()) {
            return Ok(p.device);
        }
        state
            .registered
            .get(&ptr.addr())
            .map(|r| r.device)
            .ok_or(NativeError::InvalidValue)
    }

    fn mem_get_address_range(&self, ptr: DevicePtr) -> NativeResult<(DevicePtr, usize)> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::MemGetAddressRange)?;
        let (target, size) = state.resolve(ptr).ok_or(NativeError::InvalidDevicePointer)?;
        let offset = match target {
            Target::Device { offset, .. }
            | Target::Pinned { offset, .. }
            | Target::Registered { offset, .. } => offset,
        };
        Ok((DevicePtr::new(ptr.raw() - offset as u64), size))
    }

    unsafe fn memcpy_htod(&self, dst: DevicePtr, src: HostPtr, size: usize) -> NativeResult<()> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::MemcpyHtoD)?;
        let (target, total) = state.resolve(dst).ok_or(NativeError::InvalidDevicePointer)?;
        let to: *mut u8 = match target {
            Target::Device { base, offset } => {
                let storage = state
                    .allocations
                    .get_mut(&base)
                    .ok_or(NativeError::InvalidDevicePointer)?;
                if offset + size > total {
                    return Err(NativeError::InvalidValue);
                }
                storage[offset..].as_mut_ptr()
            }
            Target::Pinned { host, offset } => {
                let pinned = state
                    .pinned
                    .get_mut(&host)
                    .ok_or(NativeError::InvalidDevicePointer)?;
                if offset + size > total {
                    return Err(NativeError::InvalidValue);
                }
                pinned.storage[offset..].as_mut_ptr()
            }
            Target::Registered { host, offset } => {
                if offset + size > total {
                    return Err(NativeError::InvalidValue);
                }
                (host + offset) as *mut u8
            }
        };
        // SAFETY: `src` is valid for `size` bytes per the caller; `to` was
        // bounds-checked against its mapping above
        unsafe { core::ptr::copy(src.as_ptr(), to, size) };
        Ok(())
    }

    fn stream_synchronize(&self, _stream: Stream) -> NativeResult<()> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::StreamSynchronize)
    }

    fn array_create(&self, desc: &ArrayDescriptor) -> NativeResult<ArrayHandle> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::ArrayCreate)?;
        Self::check_shape(desc)?;
        let id = state.next_handle();
        state.arrays.insert(
            id,
            SimArray {
                desc: *desc,
                storage: vec![0u8; desc.byte_size()],
            },
        );
        Ok(ArrayHandle::from_raw(id))
    }

    fn array_destroy(&self, array: ArrayHandle) -> NativeResult<()> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::ArrayDestroy)?;
        if state.surfaces.values().any(|a| *a == array) {
            // a bound surface must go first
            return Err(NativeError::InvalidValue);
        }
        state
            .arrays
            .remove(&array.raw())
            .map(drop)
            .ok_or(NativeError::InvalidHandle)
    }

    fn array_get_descriptor(&self, array: ArrayHandle) -> NativeResult<ArrayDescriptor> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::ArrayGetDescriptor)?;
        state
            .arrays
            .get(&array.raw())
            .map(|a| a.desc)
            .ok_or(NativeError::InvalidHandle)
    }

    unsafe fn memcpy_htoa(
        &self,
        dst: ArrayHandle,
        dst_offset: usize,
        src: HostPtr,
        size: usize,
    ) -> NativeResult<()> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::MemcpyHtoA)?;
        let array = state
            .arrays
            .get_mut(&dst.raw())
            .ok_or(NativeError::InvalidHandle)?;
        let end = dst_offset.checked_add(size).ok_or(NativeError::InvalidValue)?;
        let to = array
            .storage
            .get_mut(dst_offset..end)
            .ok_or(NativeError::InvalidValue)?;
        // SAFETY: `src` is valid for `size` bytes per the caller
        unsafe { core::ptr::copy_nonoverlapping(src.as_ptr(), to.as_mut_ptr(), size) };
        Ok(())
    }

    unsafe fn memcpy_2d(&self, copy: &Memcpy2D) -> NativeResult<()> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::Memcpy2D)?;
        let array = state
            .arrays
            .get_mut(&copy.dst_array.raw())
            .ok_or(NativeError::InvalidHandle)?;
        let row_bytes = array.desc.pixel_size() * array.desc.width;
        if copy.width_in_bytes > row_bytes || copy.height > array.desc.height.max(1) {
            return Err(NativeError::InvalidValue);
        }
        let pitch = if copy.src_pitch == 0 {
            copy.width_in_bytes
        } else {
            copy.src_pitch
        };
        let mut staged = vec![0u8; copy.width_in_bytes * copy.height];
        // SAFETY: the caller vouches for every source row
        unsafe { copy_rows(&mut staged, copy.src_host, pitch, copy.width_in_bytes, copy.height) };
        for (row, bytes) in staged.chunks(copy.width_in_bytes.max(1)).enumerate() {
            let at = row * row_bytes;
            array.storage[at..at + bytes.len()].copy_from_slice(bytes);
        }
        Ok(())
    }

    unsafe fn memcpy_3d(&self, copy: &Memcpy3D) -> NativeResult<()> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::Memcpy3D)?;
        let array = state
            .arrays
            .get_mut(&copy.dst_array.raw())
            .ok_or(NativeError::InvalidHandle)?;
        let row_bytes = array.desc.pixel_size() * array.desc.width;
        let rows = array.desc.height.max(1);
        if copy.width_in_bytes > row_bytes
            || copy.height > rows
            || copy.depth > array.desc.depth.max(1)
        {
            return Err(NativeError::InvalidValue);
        }
        let pitch = if copy.src_pitch == 0 {
            copy.width_in_bytes
        } else {
            copy.src_pitch
        };
        let src_height = if copy.src_height == 0 {
            copy.height
        } else {
            copy.src_height
        };
        let slice_len = copy.width_in_bytes * copy.height;
        let mut staged = vec![0u8; slice_len];
        for slice in 0..copy.depth {
            let src = copy.src_host.offset(slice * pitch * src_height);
            // SAFETY: the caller vouches for every source row
            unsafe { copy_rows(&mut staged, src, pitch, copy.width_in_bytes, copy.height) };
            for (row, bytes) in staged.chunks(copy.width_in_bytes.max(1)).enumerate() {
                let at = (slice * rows + row) * row_bytes;
                array.storage[at..at + bytes.len()].copy_from_slice(bytes);
            }
        }
        Ok(())
    }

    fn surface_create(&self, resource: &ResourceDesc) -> NativeResult<SurfaceHandle> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::SurfaceCreate)?;
        let ResourceDesc::Array(array) = *resource;
        if !state.arrays.contains_key(&array.raw()) {
            return Err(NativeError::InvalidHandle);
        }
        let id = state.next_handle();
        state.surfaces.insert(id, array);
        Ok(SurfaceHandle::from_raw(id))
    }

    fn surface_destroy(&self, surface: SurfaceHandle) -> NativeResult<()> {
        let mut state = self.state.lock();
        self.enter(&mut state, DriverOp::SurfaceDestroy)?;
        state
            .surfaces
            .remove(&surface.raw())
            .map(drop)
            .ok_or(NativeError::InvalidHandle)
    }
}

static_assertions::assert_impl_all!(SimDriver: Send, Sync);
