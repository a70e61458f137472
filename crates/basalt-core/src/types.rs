//! # BASALT Core Types
//!
//! Address and handle newtypes shared by the adapter and the driver layer.
//!
//! These types provide:
//! - Strong typing for addresses (device vs host)
//! - Opaque identifiers for native arrays and surfaces
//! - The runtime-visible native handle width

use core::fmt;

// =============================================================================
// DEVICE POINTER
// =============================================================================

/// Device address returned by the native allocator
///
/// This is NOT a CPU pointer and cannot be dereferenced directly.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct DevicePtr(u64);

impl DevicePtr {
    /// Create a new device pointer
    #[inline]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Create a null device pointer
    #[inline]
    pub const fn null() -> Self {
        Self(0)
    }

    /// Get the raw u64 value
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Check if null
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Offset by bytes
    #[inline]
    pub const fn offset(self, bytes: usize) -> Self {
        Self(self.0.wrapping_add(bytes as u64))
    }
}

impl fmt::Debug for DevicePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DevicePtr(0x{:016x})", self.0)
    }
}

impl fmt::Display for DevicePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

// =============================================================================
// HOST POINTER
// =============================================================================

/// Host-visible address
///
/// Holding a `HostPtr` is always safe; reading through it is only done by
/// native copy primitives whose callers vouch for the range.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct HostPtr(usize);

impl HostPtr {
    /// Create from a raw pointer, `None` if null
    #[inline]
    pub fn from_ptr<T>(ptr: *const T) -> Option<Self> {
        if ptr.is_null() {
            None
        } else {
            Some(Self(ptr as usize))
        }
    }

    /// Create from a byte slice
    #[inline]
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(bytes.as_ptr() as usize)
    }

    /// Get the raw address
    #[inline]
    pub const fn addr(self) -> usize {
        self.0
    }

    /// Get as a const byte pointer
    #[inline]
    pub const fn as_ptr(self) -> *const u8 {
        self.0 as *const u8
    }

    /// Get as a mutable byte pointer
    #[inline]
    pub const fn as_mut_ptr(self) -> *mut u8 {
        self.0 as *mut u8
    }

    /// Offset by bytes
    #[inline]
    pub const fn offset(self, bytes: usize) -> Self {
        Self(self.0.wrapping_add(bytes))
    }
}

impl fmt::Debug for HostPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostPtr(0x{:x})", self.0)
    }
}

// =============================================================================
// NATIVE OBJECT HANDLES
// =============================================================================

/// Native pixel array
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ArrayHandle(u64);

/// Native surface binding over a pixel array
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct SurfaceHandle(u64);

macro_rules! native_handle {
    ($ty:ident, $label:literal) => {
        impl $ty {
            /// Create from a raw native id
            #[inline]
            pub const fn from_raw(id: u64) -> Self {
                Self(id)
            }

            /// Get the raw native id
            #[inline]
            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "(0x{:x})"), self.0)
            }
        }
    };
}

native_handle!(ArrayHandle, "ArrayHandle");
native_handle!(SurfaceHandle, "SurfaceHandle");

/// Device ordinal as understood by the native driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct DeviceId(pub u32);

/// Runtime-visible native handle
///
/// Pointer-width; narrower than [`DevicePtr`] on 32-bit hosts.
pub type NativeHandle = usize;

// =============================================================================
// STATIC ASSERTIONS
// =============================================================================

static_assertions::assert_impl_all!(DevicePtr: Send, Sync, Copy);
static_assertions::assert_impl_all!(HostPtr: Send, Sync, Copy);
static_assertions::assert_impl_all!(ArrayHandle: Send, Sync, Copy);
static_assertions::assert_impl_all!(SurfaceHandle: Send, Sync, Copy);
static_assertions::assert_eq_size!(DevicePtr, u64);
