//! # Memory Flags
//!
//! Creation-time flags for buffers, sub-buffers and images.

use crate::error::{Error, Result};

bitflags::bitflags! {
    /// Access class and host-pointer policy of a memory object
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemFlags: u32 {
        /// Device may read and write
        const READ_WRITE = 1 << 0;
        /// Device may only write
        const WRITE_ONLY = 1 << 1;
        /// Device may only read
        const READ_ONLY = 1 << 2;
        /// Back the object with caller-owned host memory
        const USE_HOST_POINTER = 1 << 3;
        /// Back the object with adapter-allocated pinned host memory
        const ALLOC_HOST_POINTER = 1 << 4;
        /// Initialize the object from caller host memory
        const ALLOC_COPY_HOST_POINTER = 1 << 5;
    }
}

impl MemFlags {
    /// Flags that need a caller host pointer at creation
    pub const HOST_POINTER_REQUIRED: Self =
        Self::USE_HOST_POINTER.union(Self::ALLOC_COPY_HOST_POINTER);

    /// Flags tied to a host allocation policy
    pub const HOST_POINTER_POLICY: Self = Self::USE_HOST_POINTER
        .union(Self::ALLOC_HOST_POINTER)
        .union(Self::ALLOC_COPY_HOST_POINTER);

    /// Reject bits outside the known set
    pub fn validate(self) -> Result<Self> {
        if self.bits() & !Self::all().bits() != 0 {
            return Err(Error::InvalidEnumeration);
        }
        Ok(self)
    }

    /// Check if the device may read through this object
    pub const fn is_readable(self) -> bool {
        self.intersects(Self::READ_WRITE.union(Self::READ_ONLY))
    }

    /// Check if the device may write through this object
    pub const fn is_writable(self) -> bool {
        self.intersects(Self::READ_WRITE.union(Self::WRITE_ONLY))
    }

    /// Check if a view with `child` flags may be carved out of this object
    ///
    /// A write-only parent forbids readable children; a read-only parent
    /// forbids writable children.
    pub const fn admits_child(self, child: Self) -> bool {
        if self.contains(Self::WRITE_ONLY) && child.is_readable() {
            return false;
        }
        if self.contains(Self::READ_ONLY) && child.is_writable() {
            return false;
        }
        true
    }
}
