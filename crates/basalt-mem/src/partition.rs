//! # Sub-Buffers
//!
//! A sub-buffer is an offset view into its parent's allocation. It owns no
//! native memory and keeps its parent alive with one runtime reference.

use basalt_core::{Error, MemFlags, ReleaseGuard, Result, StructureType};

use crate::object::{AllocMode, BufferMem, MemHandle, MemKind};

/// How a sub-buffer is carved out of its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BufferCreateType {
    /// A byte range of the parent
    Region = 0,
}

impl TryFrom<u32> for BufferCreateType {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self> {
        match raw {
            0 => Ok(Self::Region),
            _ => Err(Error::InvalidEnumeration),
        }
    }
}

/// Byte range of a sub-buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferRegion {
    /// Structure tag
    pub stype: StructureType,
    /// Offset into the parent in bytes
    pub origin: usize,
    /// Length in bytes
    pub size: usize,
}

impl BufferRegion {
    /// Create a new region
    pub const fn new(origin: usize, size: usize) -> Self {
        Self {
            stype: StructureType::BufferRegion,
            origin,
            size,
        }
    }
}

impl MemHandle {
    /// Create a sub-buffer over `region` of this buffer
    ///
    /// Empty `flags` mean `READ_WRITE`.
    pub fn partition(
        &self,
        flags: MemFlags,
        create_type: BufferCreateType,
        region: &BufferRegion,
    ) -> Result<MemHandle> {
        let flags = flags.validate()?;
        self.ensure_alive()?;
        let parent = *self.as_buffer().ok_or(Error::InvalidMemObject)?;
        if self.is_sub_buffer() {
            return Err(Error::InvalidMemObject);
        }

        let flags = if flags.is_empty() {
            MemFlags::READ_WRITE
        } else {
            flags
        };
        if flags.intersects(MemFlags::HOST_POINTER_POLICY) || !self.flags().admits_child(flags) {
            return Err(Error::InvalidValue);
        }

        match create_type {
            BufferCreateType::Region => {}
        }

        if region.size == 0 {
            return Err(Error::InvalidBufferSize);
        }
        let end = region
            .origin
            .checked_add(region.size)
            .ok_or(Error::InvalidBufferSize)?;
        if end > parent.size() {
            return Err(Error::InvalidBufferSize);
        }
        if parent.ptr().is_null() {
            return Err(Error::InvalidMemObject);
        }

        let view = BufferMem::new(
            parent.with_offset(region.origin),
            parent.host_ptr().map(|h| h.offset(region.origin)),
            region.size,
            AllocMode::Classic,
        );

        self.retain()?;
        let retained = ReleaseGuard::new(|| {
            if let Err(e) = self.release() {
                log::warn!("Failed to drop parent reference: {}", e);
            }
        });

        let _active = self.context().activate()?;
        let child = MemHandle::new(
            self.context().clone(),
            Some(self.clone()),
            flags,
            MemKind::Buffer(view),
        );

        retained.dismiss();
        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use basalt_core::{HostPtr, NativeError};
    use basalt_hal::sim::DriverOp;

    use super::*;
    use crate::testing::sim_context;
    use crate::{create_buffer, BufferProperties};

    const S: usize = 1024;

    fn parent(flags: MemFlags) -> (std::sync::Arc<basalt_hal::sim::SimDriver>, MemHandle) {
        let (drv, ctx) = sim_context();
        let mem = unsafe { create_buffer(&ctx, flags, S, None) }.unwrap();
        (drv, mem)
    }

    #[test]
    fn test_full_region() {
        let (drv, buf) = parent(MemFlags::READ_WRITE);
        let sub = buf
            .partition(MemFlags::empty(), BufferCreateType::Region, &BufferRegion::new(0, S))
            .unwrap();

        assert!(sub.is_sub_buffer());
        assert_eq!(sub.flags(), MemFlags::READ_WRITE);
        assert_eq!(sub.parent(), Some(&buf));
        assert_eq!(buf.ref_count(), 2);
        let view = sub.as_buffer().unwrap();
        assert_eq!(view.ptr(), buf.as_buffer().unwrap().ptr());
        assert_eq!(view.alloc_mode(), AllocMode::Classic);

        // parent outlives its own release while the view is alive
        buf.release().unwrap();
        assert_eq!(drv.count(DriverOp::Free), 0);
        sub.release().unwrap();
        assert_eq!(drv.count(DriverOp::Free), 1);
        assert!(!buf.is_alive());
    }

    #[test]
    fn test_region_bounds() {
        let (_drv, buf) = parent(MemFlags::READ_WRITE);
        let rw = MemFlags::READ_WRITE;
        let region = BufferCreateType::Region;

        assert_eq!(
            buf.partition(rw, region, &BufferRegion::new(S - 1, 2)).err(),
            Some(Error::InvalidBufferSize)
        );
        assert_eq!(
            buf.partition(rw, region, &BufferRegion::new(0, 0)).err(),
            Some(Error::InvalidBufferSize)
        );
        assert_eq!(
            buf.partition(rw, region, &BufferRegion::new(usize::MAX, 2)).err(),
            Some(Error::InvalidBufferSize)
        );
        assert_eq!(buf.ref_count(), 1);

        let sub = buf.partition(rw, region, &BufferRegion::new(S - 1, 1)).unwrap();
        assert_eq!(
            sub.as_buffer().unwrap().ptr(),
            buf.as_buffer().unwrap().with_offset(S - 1)
        );
        sub.release().unwrap();
        buf.release().unwrap();
    }

    #[test]
    fn test_no_chained_partition() {
        let (_drv, buf) = parent(MemFlags::READ_WRITE);
        let sub = buf
            .partition(MemFlags::READ_WRITE, BufferCreateType::Region, &BufferRegion::new(0, 64))
            .unwrap();
        assert_eq!(
            sub.partition(MemFlags::READ_WRITE, BufferCreateType::Region, &BufferRegion::new(0, 8))
                .err(),
            Some(Error::InvalidMemObject)
        );
        sub.release().unwrap();
        buf.release().unwrap();
    }

    #[test]
    fn test_access_class_and_host_flags() {
        let region = BufferRegion::new(0, 16);
        let create = BufferCreateType::Region;

        let (_d, wo) = parent(MemFlags::WRITE_ONLY);
        assert_eq!(
            wo.partition(MemFlags::READ_ONLY, create, &region).err(),
            Some(Error::InvalidValue)
        );
        // empty flags default to READ_WRITE, which a write-only parent forbids
        assert_eq!(
            wo.partition(MemFlags::empty(), create, &region).err(),
            Some(Error::InvalidValue)
        );
        let ok = wo.partition(MemFlags::WRITE_ONLY, create, &region).unwrap();
        ok.release().unwrap();

        let (_d, ro) = parent(MemFlags::READ_ONLY);
        assert_eq!(
            ro.partition(MemFlags::WRITE_ONLY, create, &region).err(),
            Some(Error::InvalidValue)
        );

        let (_d, rw) = parent(MemFlags::READ_WRITE);
        assert_eq!(
            rw.partition(MemFlags::ALLOC_HOST_POINTER, create, &region).err(),
            Some(Error::InvalidValue)
        );
        assert_eq!(
            rw.partition(MemFlags::from_bits_retain(1 << 20), create, &region).err(),
            Some(Error::InvalidEnumeration)
        );
        assert_eq!(BufferCreateType::try_from(3), Err(Error::InvalidEnumeration));

        for mem in [wo, ro, rw] {
            mem.release().unwrap();
        }
    }

    #[test]
    fn test_image_parent_rejected() {
        let (_drv, ctx) = sim_context();
        let img = crate::testing::rgba8_image(&ctx, 2, 2);
        assert_eq!(
            img.partition(MemFlags::READ_WRITE, BufferCreateType::Region, &BufferRegion::new(0, 4))
                .err(),
            Some(Error::InvalidMemObject)
        );
        img.release().unwrap();
    }

    #[test]
    fn test_host_view_is_offset() {
        let (_drv, ctx) = sim_context();
        let buf = unsafe { create_buffer(&ctx, MemFlags::ALLOC_HOST_POINTER, 256, None) }.unwrap();
        let host = buf.as_buffer().unwrap().host_ptr().unwrap();
        let sub = buf
            .partition(MemFlags::READ_WRITE, BufferCreateType::Region, &BufferRegion::new(32, 64))
            .unwrap();
        assert_eq!(sub.as_buffer().unwrap().host_ptr(), Some(host.offset(32)));
        sub.release().unwrap();
        buf.release().unwrap();
    }

    #[test]
    fn test_failed_activation_undoes_retain() {
        let (drv, ctx) = crate::testing::sim_context_on(1);
        let buf = unsafe {
            create_buffer(
                &ctx,
                MemFlags::ALLOC_COPY_HOST_POINTER,
                8,
                Some(&BufferProperties::with_host(HostPtr::from_slice(&[0u8; 8]))),
            )
        }
        .unwrap();
        drv.fail_next(DriverOp::SetDevice, NativeError::DeviceLost);

        let r = buf.partition(MemFlags::READ_WRITE, BufferCreateType::Region, &BufferRegion::new(0, 8));
        assert_eq!(r.err(), Some(Error::DeviceLost));
        assert_eq!(buf.ref_count(), 1);
        buf.release().unwrap();
    }
}
