//! # Memory Objects
//!
//! The reference-counted handle behind every runtime buffer and image.

use core::fmt;
use core::ops::Deref;
use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use basalt_core::{ArrayHandle, DevicePtr, Error, HostPtr, MemFlags, MemType, Result, SurfaceHandle};
use basalt_hal::Context;

// =============================================================================
// ALLOCATION MODE
// =============================================================================

/// How a buffer's native backing was obtained, and so how it is released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllocMode {
    /// Plain device allocation
    Classic,
    /// Device allocation initialized from caller host memory
    CopyIn,
    /// Caller host memory registered with the driver
    UseHostPtr,
    /// Pinned host memory allocated by the driver
    AllocHostPtr,
}

impl AllocMode {
    /// Check if the mode holds a host-side native resource
    pub const fn owns_host(self) -> bool {
        matches!(self, Self::UseHostPtr | Self::AllocHostPtr)
    }
}

// =============================================================================
// VARIANTS
// =============================================================================

/// Linear buffer backing
#[derive(Debug, Clone, Copy)]
pub struct BufferMem {
    ptr: DevicePtr,
    host_ptr: Option<HostPtr>,
    size: usize,
    alloc_mode: AllocMode,
}

impl BufferMem {
    pub(crate) fn new(
        ptr: DevicePtr,
        host_ptr: Option<HostPtr>,
        size: usize,
        alloc_mode: AllocMode,
    ) -> Self {
        debug_assert!(!alloc_mode.owns_host() || host_ptr.is_some());
        Self {
            ptr,
            host_ptr,
            size,
            alloc_mode,
        }
    }

    /// Get device pointer
    pub fn ptr(&self) -> DevicePtr {
        self.ptr
    }

    /// Get device pointer advanced by `offset` bytes
    pub fn with_offset(&self, offset: usize) -> DevicePtr {
        self.ptr.offset(offset)
    }

    /// Get paired host pointer
    pub fn host_ptr(&self) -> Option<HostPtr> {
        self.host_ptr
    }

    /// Get requested size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get allocation mode
    pub fn alloc_mode(&self) -> AllocMode {
        self.alloc_mode
    }
}

/// Image backing: a pixel array and the surface bound over it
#[derive(Debug, Clone, Copy)]
pub struct SurfaceMem {
    array: ArrayHandle,
    surface: SurfaceHandle,
    image_type: MemType,
}

impl SurfaceMem {
    pub(crate) fn new(array: ArrayHandle, surface: SurfaceHandle, image_type: MemType) -> Self {
        Self {
            array,
            surface,
            image_type,
        }
    }

    /// Get native array
    pub fn array(&self) -> ArrayHandle {
        self.array
    }

    /// Get native surface
    pub fn surface(&self) -> SurfaceHandle {
        self.surface
    }

    /// Get image dimensionality
    pub fn image_type(&self) -> MemType {
        self.image_type
    }
}

/// Native backing of a memory object
#[derive(Debug, Clone, Copy)]
pub enum MemKind {
    /// Linear buffer
    Buffer(BufferMem),
    /// Image surface
    Surface(SurfaceMem),
}

// =============================================================================
// MEMORY OBJECT
// =============================================================================

/// A runtime memory object
///
/// The runtime reference count starts at 1 and is independent of how many
/// [`MemHandle`] clones exist. Native resources are released exactly once,
/// when the runtime count reaches 0.
pub struct MemObject {
    pub(crate) context: Arc<Context>,
    pub(crate) parent: Option<MemHandle>,
    pub(crate) flags: MemFlags,
    pub(crate) refcount: AtomicU32,
    pub(crate) kind: MemKind,
}

impl MemObject {
    /// Get owning context
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// Get creation flags
    pub fn flags(&self) -> MemFlags {
        self.flags
    }

    /// Get native backing
    pub fn kind(&self) -> &MemKind {
        &self.kind
    }

    /// Get the parent of a sub-buffer
    pub fn parent(&self) -> Option<&MemHandle> {
        self.parent.as_ref()
    }

    /// Get runtime reference count
    pub fn ref_count(&self) -> u32 {
        self.refcount.load(Ordering::Acquire)
    }

    /// Check if the object has not been released yet
    pub fn is_alive(&self) -> bool {
        self.ref_count() > 0
    }

    /// Check if buffer
    pub fn is_buffer(&self) -> bool {
        matches!(self.kind, MemKind::Buffer(_))
    }

    /// Check if image
    pub fn is_image(&self) -> bool {
        matches!(self.kind, MemKind::Surface(_))
    }

    /// Check if the object is a view over another buffer
    pub fn is_sub_buffer(&self) -> bool {
        self.parent.is_some()
    }

    /// Get buffer backing
    pub fn as_buffer(&self) -> Option<&BufferMem> {
        match &self.kind {
            MemKind::Buffer(b) => Some(b),
            MemKind::Surface(_) => None,
        }
    }

    /// Get image backing
    pub fn as_surface(&self) -> Option<&SurfaceMem> {
        match &self.kind {
            MemKind::Surface(s) => Some(s),
            MemKind::Buffer(_) => None,
        }
    }

    /// Fail if the object was already released
    pub(crate) fn ensure_alive(&self) -> Result<()> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(Error::InvalidMemObject)
        }
    }
}

impl fmt::Debug for MemObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemObject")
            .field("context", &self.context.handle())
            .field("flags", &self.flags)
            .field("refcount", &self.ref_count())
            .field("sub_buffer", &self.is_sub_buffer())
            .field("kind", &self.kind)
            .finish()
    }
}

impl Drop for MemObject {
    fn drop(&mut self) {
        let count = *self.refcount.get_mut();
        if count > 0 {
            log::warn!(
                "Leaking memory object {:?} with {} outstanding reference(s)",
                self.kind,
                count
            );
        }
    }
}

// =============================================================================
// HANDLE
// =============================================================================

/// Shared handle to a [`MemObject`]
#[derive(Clone)]
pub struct MemHandle(Arc<MemObject>);

impl MemHandle {
    pub(crate) fn new(
        context: Arc<Context>,
        parent: Option<MemHandle>,
        flags: MemFlags,
        kind: MemKind,
    ) -> Self {
        let obj = MemObject {
            context,
            parent,
            flags,
            refcount: AtomicU32::new(1),
            kind,
        };
        log::debug!("Created {:?}", obj);
        Self(Arc::new(obj))
    }
}

impl Deref for MemHandle {
    type Target = MemObject;

    fn deref(&self) -> &MemObject {
        &self.0
    }
}

impl PartialEq for MemHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for MemHandle {}

impl fmt::Debug for MemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

static_assertions::assert_impl_all!(MemHandle: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sim_context;

    #[test]
    fn test_variant_accessors() {
        let (_drv, ctx) = sim_context();
        let buf = BufferMem::new(DevicePtr::new(0x1000), None, 64, AllocMode::Classic);
        let mem = MemHandle::new(ctx, None, MemFlags::READ_WRITE, MemKind::Buffer(buf));

        assert!(mem.is_buffer());
        assert!(!mem.is_image());
        assert!(!mem.is_sub_buffer());
        assert!(mem.as_surface().is_none());
        assert_eq!(mem.as_buffer().map(BufferMem::size), Some(64));
        assert_eq!(mem.ref_count(), 1);
        assert_eq!(mem.clone(), mem);

        // no native resource behind it; silence the leak warning
        mem.refcount.store(0, Ordering::Release);
    }

    #[test]
    fn test_alloc_mode_host_ownership() {
        assert!(!AllocMode::Classic.owns_host());
        assert!(!AllocMode::CopyIn.owns_host());
        assert!(AllocMode::UseHostPtr.owns_host());
        assert!(AllocMode::AllocHostPtr.owns_host());
    }
}
