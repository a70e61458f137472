//! # Buffer Creation
//!
//! Picks an allocation mode from the creation flags, acquires the native
//! backing and optionally fills it from caller memory.
//!
//! | Flags                                  | Mode           | Native action                  |
//! |----------------------------------------|----------------|--------------------------------|
//! | `USE_HOST_POINTER` + `host-register`   | `UseHostPtr`   | register, map to device        |
//! | `ALLOC_HOST_POINTER`                   | `AllocHostPtr` | pinned host alloc, map         |
//! | `ALLOC_COPY_HOST_POINTER`              | `CopyIn`       | device alloc                   |
//! | otherwise                              | `Classic`      | device alloc                   |

use std::sync::Arc;

use basalt_core::{
    DevicePtr, Error, HostPtr, MemFlags, ReleaseGuard, Result, StructureType,
};
use basalt_hal::{Context, Driver, Stream};

use crate::lifecycle::unwind;
use crate::object::{AllocMode, BufferMem, MemHandle, MemKind};

/// Whether `USE_HOST_POINTER` registers caller memory with the driver
///
/// When off, the flag is served by a device allocation filled from the
/// caller's memory at creation.
pub const HOST_REGISTER: bool = cfg!(feature = "host-register");

/// Host memory bundle for buffer creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferProperties {
    /// Structure tag
    pub stype: StructureType,
    /// Caller host memory
    pub host: Option<HostPtr>,
}

impl BufferProperties {
    /// Properties carrying a host pointer
    pub const fn with_host(host: HostPtr) -> Self {
        Self {
            stype: StructureType::BufferProperties,
            host: Some(host),
        }
    }
}

impl Default for BufferProperties {
    fn default() -> Self {
        Self {
            stype: StructureType::BufferProperties,
            host: None,
        }
    }
}

/// Create a buffer of `size` bytes
///
/// # Safety
/// When `flags` carry a host-pointer policy, the host pointer in
/// `properties` must be valid for reads of `size` bytes. With host
/// registration it must stay valid until the buffer is released.
pub unsafe fn create_buffer(
    context: &Arc<Context>,
    flags: MemFlags,
    size: usize,
    properties: Option<&BufferProperties>,
) -> Result<MemHandle> {
    let flags = flags.validate()?;
    let host = properties.and_then(|p| p.host);
    if flags.intersects(MemFlags::HOST_POINTER_REQUIRED) && host.is_none() {
        return Err(Error::InvalidHostPtr);
    }
    if size == 0 {
        return Err(Error::InvalidBufferSize);
    }

    let initial_copy = flags.contains(MemFlags::ALLOC_COPY_HOST_POINTER)
        || (flags.contains(MemFlags::USE_HOST_POINTER) && !HOST_REGISTER);

    let _active = context.activate()?;
    let driver = context.driver();

    // SAFETY: forwarded from the caller
    let buffer = unsafe { acquire(driver, flags, size, host)? };
    let dst = buffer.ptr();
    let mem = MemHandle::new(context.clone(), None, flags, MemKind::Buffer(buffer));

    if let (true, Some(src)) = (initial_copy, host) {
        // SAFETY: forwarded from the caller
        if let Err(e) = unsafe { fill(driver, dst, src, size) } {
            mem.discard();
            return Err(e);
        }
    }

    Ok(mem)
}

/// Acquire the native backing for `flags`
///
/// # Safety
/// See [`create_buffer`].
unsafe fn acquire(
    driver: &dyn Driver,
    flags: MemFlags,
    size: usize,
    host: Option<HostPtr>,
) -> Result<BufferMem> {
    if flags.contains(MemFlags::USE_HOST_POINTER) && HOST_REGISTER {
        let host = host.ok_or(Error::InvalidHostPtr)?;
        // SAFETY: forwarded from the caller
        unsafe { driver.host_register(host, size)? };
        let registered = ReleaseGuard::new(|| unwind("host_unregister", driver.host_unregister(host)));
        let ptr = driver.host_get_device_pointer(host)?;
        registered.dismiss();
        return Ok(BufferMem::new(ptr, Some(host), size, AllocMode::UseHostPtr));
    }

    if flags.contains(MemFlags::ALLOC_HOST_POINTER) {
        let pinned = driver.host_malloc(size)?;
        let allocated = ReleaseGuard::new(|| unwind("free_host", driver.free_host(pinned)));
        let ptr = driver.host_get_device_pointer(pinned)?;
        allocated.dismiss();
        return Ok(BufferMem::new(ptr, Some(pinned), size, AllocMode::AllocHostPtr));
    }

    let ptr = driver.malloc(size)?;
    let mode = if flags.contains(MemFlags::ALLOC_COPY_HOST_POINTER) {
        AllocMode::CopyIn
    } else {
        AllocMode::Classic
    };
    // emulated USE_HOST_POINTER keeps the caller's memory as a non-owning view
    let view = host.filter(|_| flags.contains(MemFlags::USE_HOST_POINTER));
    Ok(BufferMem::new(ptr, view, size, mode))
}

/// Copy `size` host bytes into `dst` and wait for the copy to land
///
/// # Safety
/// `src` must be valid for reads of `size` bytes.
unsafe fn fill(driver: &dyn Driver, dst: DevicePtr, src: HostPtr, size: usize) -> Result<()> {
    // SAFETY: forwarded from the caller
    unsafe { driver.memcpy_htod(dst, src, size)? };
    driver.stream_synchronize(Stream::DEFAULT)?;
    Ok(())
}
