//! # Native Handles
//!
//! Export of the raw device pointer behind a buffer. Importing native
//! handles is not supported.

use std::sync::Arc;

use basalt_core::{DevicePtr, Error, ImageDesc, ImageFormat, NativeHandle, Result, StructureType};
use basalt_hal::Context;

use crate::object::MemHandle;

/// Properties for wrapping an existing native allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemNativeProperties {
    /// Structure tag
    pub stype: StructureType,
    /// Whether the runtime takes ownership of the native allocation
    pub own_native_handle: bool,
}

impl Default for MemNativeProperties {
    fn default() -> Self {
        Self {
            stype: StructureType::MemNativeProperties,
            own_native_handle: false,
        }
    }
}

impl MemHandle {
    /// Raw device pointer of a buffer
    pub fn native_handle(&self) -> Result<NativeHandle> {
        self.ensure_alive()?;
        let buffer = self.as_buffer().ok_or(Error::InvalidMemObject)?;
        export(buffer.ptr(), NativeHandle::BITS)
    }
}

/// Narrow a device pointer to a `bits`-wide handle
fn export(ptr: DevicePtr, bits: u32) -> Result<NativeHandle> {
    let upper = ptr.raw().checked_shr(bits).unwrap_or(0);
    if upper != 0 {
        return Err(Error::InvalidMemObject);
    }
    NativeHandle::try_from(ptr.raw()).map_err(|_| Error::InvalidMemObject)
}

/// Wrap a native allocation as a buffer; not supported
pub fn buffer_create_with_native_handle(
    _handle: NativeHandle,
    _context: &Arc<Context>,
    _properties: Option<&MemNativeProperties>,
) -> Result<MemHandle> {
    Err(Error::UnsupportedFeature)
}

/// Wrap a native array as an image; not supported
pub fn image_create_with_native_handle(
    _handle: NativeHandle,
    _context: &Arc<Context>,
    _format: &ImageFormat,
    _desc: &ImageDesc,
    _properties: Option<&MemNativeProperties>,
) -> Result<MemHandle> {
    Err(Error::UnsupportedFeature)
}

#[cfg(test)]
mod tests {
    use basalt_core::MemFlags;
    use basalt_hal::sim::DriverOp;

    use super::*;
    use crate::create_buffer;
    use crate::testing::{rgba8_image, sim_context};

    #[test]
    fn test_export_buffer_pointer() {
        let (_drv, ctx) = sim_context();
        let mem = unsafe { create_buffer(&ctx, MemFlags::READ_WRITE, 64, None) }.unwrap();
        let ptr = mem.as_buffer().unwrap().ptr();
        assert_eq!(mem.native_handle(), Ok(ptr.raw() as NativeHandle));
        mem.release().unwrap();
        assert_eq!(mem.native_handle(), Err(Error::InvalidMemObject));
    }

    #[test]
    fn test_upper_bits_rejected() {
        assert_eq!(export(DevicePtr::new(0xffff_fff0), 32), Ok(0xffff_fff0));
        assert_eq!(
            export(DevicePtr::new(0x1_0000_0000), 32),
            Err(Error::InvalidMemObject)
        );
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_full_width_passes() {
        assert_eq!(export(DevicePtr::new(u64::MAX), 64), Ok(usize::MAX));
    }

    #[test]
    fn test_image_has_no_pointer() {
        let (_drv, ctx) = sim_context();
        let img = rgba8_image(&ctx, 2, 2);
        assert_eq!(img.native_handle(), Err(Error::InvalidMemObject));
        img.release().unwrap();
    }

    #[test]
    fn test_import_unsupported() {
        let (drv, ctx) = sim_context();
        let props = MemNativeProperties::default();
        assert_eq!(
            buffer_create_with_native_handle(0x1000, &ctx, Some(&props)).err(),
            Some(Error::UnsupportedFeature)
        );
        assert_eq!(
            image_create_with_native_handle(
                0x1000,
                &ctx,
                &ImageFormat::new(
                    basalt_core::ImageChannelOrder::RGBA,
                    basalt_core::ImageChannelType::Float
                ),
                &ImageDesc::new_2d(4, 4),
                None,
            )
            .err(),
            Some(Error::UnsupportedFeature)
        );
        assert!(drv.calls().is_empty());
        assert_eq!(drv.count(DriverOp::Malloc), 0);
    }
}
