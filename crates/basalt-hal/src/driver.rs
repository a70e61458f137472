//! # Native Driver Interface
//!
//! The primitives the adapter consumes from the accelerator driver, and the
//! native descriptor types they exchange.

use core::fmt;

use basalt_core::{ArrayHandle, DeviceId, DevicePtr, HostPtr, NativeResult, SurfaceHandle};

// =============================================================================
// ARRAY FORMAT
// =============================================================================

/// Native array element format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ArrayFormat {
    /// Unsigned 8-bit integer
    UnsignedInt8 = 0x01,
    /// Unsigned 16-bit integer
    UnsignedInt16 = 0x02,
    /// Unsigned 32-bit integer
    UnsignedInt32 = 0x03,
    /// Signed 8-bit integer
    SignedInt8 = 0x08,
    /// Signed 16-bit integer
    SignedInt16 = 0x09,
    /// Signed 32-bit integer
    SignedInt32 = 0x0a,
    /// 16-bit float
    Half = 0x10,
    /// 32-bit float
    Float = 0x20,
}

impl ArrayFormat {
    /// Bytes per channel element
    pub const fn element_size(self) -> usize {
        match self {
            Self::UnsignedInt8 | Self::SignedInt8 => 1,
            Self::UnsignedInt16 | Self::SignedInt16 | Self::Half => 2,
            Self::UnsignedInt32 | Self::SignedInt32 | Self::Float => 4,
        }
    }
}

// =============================================================================
// DESCRIPTORS
// =============================================================================

/// Native 3D array descriptor
///
/// Unused dimensions are 0: a 1D array has `height == depth == 0`, a 2D
/// array has `depth == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayDescriptor {
    /// Width in elements
    pub width: usize,
    /// Height in elements, 0 if unused
    pub height: usize,
    /// Depth in elements, 0 if unused
    pub depth: usize,
    /// Element format
    pub format: ArrayFormat,
    /// Channels per element
    pub num_channels: u32,
    /// Creation flags
    pub flags: u32,
}

impl ArrayDescriptor {
    /// Bytes per pixel
    pub const fn pixel_size(&self) -> usize {
        self.format.element_size() * self.num_channels as usize
    }

    /// Total bytes, with unused dimensions counting as 1
    pub fn byte_size(&self) -> usize {
        self.pixel_size() * self.width.max(1) * self.height.max(1) * self.depth.max(1)
    }
}

/// Host-to-array 2D strided copy
#[derive(Debug, Clone, Copy)]
pub struct Memcpy2D {
    /// Source host address
    pub src_host: HostPtr,
    /// Source row pitch in bytes, 0 for tightly packed
    pub src_pitch: usize,
    /// Destination array
    pub dst_array: ArrayHandle,
    /// Bytes per row
    pub width_in_bytes: usize,
    /// Rows
    pub height: usize,
}

/// Host-to-array 3D strided copy
#[derive(Debug, Clone, Copy)]
pub struct Memcpy3D {
    /// Source host address
    pub src_host: HostPtr,
    /// Source row pitch in bytes, 0 for tightly packed
    pub src_pitch: usize,
    /// Source rows per slice, 0 for tightly packed
    pub src_height: usize,
    /// Destination array
    pub dst_array: ArrayHandle,
    /// Bytes per row
    pub width_in_bytes: usize,
    /// Rows per slice
    pub height: usize,
    /// Slices
    pub depth: usize,
}

/// Resource a surface binds to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceDesc {
    /// A native pixel array
    Array(ArrayHandle),
}

/// Native stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Stream(pub u64);

impl Stream {
    /// The default stream used by synchronous copies
    pub const DEFAULT: Self = Self(0);
}

// =============================================================================
// DRIVER TRAIT
// =============================================================================

/// Native accelerator driver
///
/// Every primitive reports failure as a [`basalt_core::NativeError`]; the
/// adapter decides whether that becomes a typed error or is fatal.
///
/// Primitives that read or register host memory are `unsafe`: the caller
/// vouches that the host range is valid for the stated size.
pub trait Driver: fmt::Debug + Send + Sync {
    // =========================================================================
    // Device binding
    // =========================================================================

    /// Device bound to the calling thread
    fn current_device(&self) -> NativeResult<DeviceId>;

    /// Bind `device` to the calling thread
    fn set_device(&self, device: DeviceId) -> NativeResult<()>;

    // =========================================================================
    // Linear memory
    // =========================================================================

    /// Allocate device memory
    fn malloc(&self, size: usize) -> NativeResult<DevicePtr>;

    /// Free device memory
    fn free(&self, ptr: DevicePtr) -> NativeResult<()>;

    /// Allocate pinned, device-mapped host memory
    fn host_malloc(&self, size: usize) -> NativeResult<HostPtr>;

    /// Free pinned host memory
    fn free_host(&self, ptr: HostPtr) -> NativeResult<()>;

    /// Pin and map caller-owned host memory
    ///
    /// # Safety
    /// `ptr` must be valid for `size` bytes until unregistered.
    unsafe fn host_register(&self, ptr: HostPtr, size: usize) -> NativeResult<()>;

    /// Unpin caller-owned host memory; does not free it
    fn host_unregister(&self, ptr: HostPtr) -> NativeResult<()>;

    /// Device-visible address of pinned or registered host memory
    fn host_get_device_pointer(&self, ptr: HostPtr) -> NativeResult<DevicePtr>;

    /// Base and size of the allocation containing `ptr`
    fn mem_get_address_range(&self, ptr: DevicePtr) -> NativeResult<(DevicePtr, usize)>;

    /// Copy host bytes to device memory on the default stream
    ///
    /// # Safety
    /// `src` must be valid for reads of `size` bytes.
    unsafe fn memcpy_htod(&self, dst: DevicePtr, src: HostPtr, size: usize) -> NativeResult<()>;

    /// Wait for all work queued on `stream`
    fn stream_synchronize(&self, stream: Stream) -> NativeResult<()>;

    // =========================================================================
    // Arrays and surfaces
    // =========================================================================

    /// Create a pixel array
    fn array_create(&self, desc: &ArrayDescriptor) -> NativeResult<ArrayHandle>;

    /// Destroy a pixel array
    fn array_destroy(&self, array: ArrayHandle) -> NativeResult<()>;

    /// Read back an array's descriptor
    fn array_get_descriptor(&self, array: ArrayHandle) -> NativeResult<ArrayDescriptor>;

    /// Linear host-to-array copy
    ///
    /// # Safety
    /// `src` must be valid for reads of `size` bytes.
    unsafe fn memcpy_htoa(
        &self,
        dst: ArrayHandle,
        dst_offset: usize,
        src: HostPtr,
        size: usize,
    ) -> NativeResult<()>;

    /// Strided 2D host-to-array copy
    ///
    /// # Safety
    /// `copy.src_host` must be valid for reads of every row the copy touches.
    unsafe fn memcpy_2d(&self, copy: &Memcpy2D) -> NativeResult<()>;

    /// Strided 3D host-to-array copy
    ///
    /// # Safety
    /// `copy.src_host` must be valid for reads of every row the copy touches.
    unsafe fn memcpy_3d(&self, copy: &Memcpy3D) -> NativeResult<()>;

    /// Create a surface object over a resource
    fn surface_create(&self, resource: &ResourceDesc) -> NativeResult<SurfaceHandle>;

    /// Destroy a surface object
    fn surface_destroy(&self, surface: SurfaceHandle) -> NativeResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_sizes() {
        let d = ArrayDescriptor {
            width: 4,
            height: 0,
            depth: 0,
            format: ArrayFormat::Half,
            num_channels: 4,
            flags: 0,
        };
        assert_eq!(d.pixel_size(), 8);
        assert_eq!(d.byte_size(), 32);

        let d3 = ArrayDescriptor {
            height: 2,
            depth: 3,
            format: ArrayFormat::Float,
            ..d
        };
        assert_eq!(d3.byte_size(), 16 * 4 * 2 * 3);
    }
}
