//! # Property Queries
//!
//! Size and context queries on any memory object, and image queries read
//! back from the native array descriptor.

use basalt_core::{Error, ImageFormat, ImageInfo, MemInfo, PropertyWriter, Result};
use basalt_hal::ArrayDescriptor;

use crate::format;
use crate::object::{MemHandle, MemKind};

impl MemHandle {
    /// Size in bytes as reported by the driver
    ///
    /// For a buffer this is the size of the native allocation containing it,
    /// which may exceed the requested size. For an image it is computed from
    /// the native array descriptor.
    pub fn size(&self) -> Result<usize> {
        self.ensure_alive()?;
        let _active = self.context().activate()?;
        let driver = self.context().driver();

        match self.kind() {
            MemKind::Buffer(buffer) => {
                let (_base, size) = driver.mem_get_address_range(buffer.ptr())?;
                Ok(size)
            }
            MemKind::Surface(surface) => {
                let desc = driver.array_get_descriptor(surface.array())?;
                Ok(desc.byte_size())
            }
        }
    }

    /// Raw handle of the owning context
    pub fn context_handle(&self) -> Result<u64> {
        self.ensure_alive()?;
        Ok(self.context().handle())
    }

    /// Answer a memory object query into `out`
    pub fn get_info(&self, info: MemInfo, out: PropertyWriter<'_>) -> Result<()> {
        match info {
            MemInfo::Size => out.write(self.size()?),
            MemInfo::Context => out.write(self.context_handle()?),
        }
    }

    /// Answer an image query into `out`
    pub fn image_info(&self, info: ImageInfo, out: PropertyWriter<'_>) -> Result<()> {
        self.ensure_image()?;
        match info {
            ImageInfo::RowPitch | ImageInfo::SlicePitch => Err(Error::UnsupportedEnumeration),
            ImageInfo::Format => out.write(self.image_format()?.to_raw()),
            ImageInfo::ElementSize => out.write(self.image_element_size()?),
            ImageInfo::Width => out.write(self.image_width()?),
            ImageInfo::Height => out.write(self.image_height()?),
            ImageInfo::Depth => out.write(self.image_depth()?),
        }
    }

    /// Image format, always RGBA
    pub fn image_format(&self) -> Result<ImageFormat> {
        Ok(format::image_format(self.image_descriptor()?.format))
    }

    /// Bytes per channel element
    pub fn image_element_size(&self) -> Result<usize> {
        Ok(self.image_descriptor()?.format.element_size())
    }

    /// Native width
    pub fn image_width(&self) -> Result<usize> {
        Ok(self.image_descriptor()?.width)
    }

    /// Native height, 0 for 1D images
    pub fn image_height(&self) -> Result<usize> {
        Ok(self.image_descriptor()?.height)
    }

    /// Native depth, 0 for 1D and 2D images
    pub fn image_depth(&self) -> Result<usize> {
        Ok(self.image_descriptor()?.depth)
    }

    fn ensure_image(&self) -> Result<()> {
        self.ensure_alive()?;
        if self.is_image() {
            Ok(())
        } else {
            Err(Error::InvalidMemObject)
        }
    }

    fn image_descriptor(&self) -> Result<ArrayDescriptor> {
        self.ensure_image()?;
        let surface = self.as_surface().ok_or(Error::InvalidMemObject)?;
        let _active = self.context().activate()?;
        Ok(self.context().driver().array_get_descriptor(surface.array())?)
    }
}

#[cfg(test)]
mod tests {
    use basalt_core::{ImageChannelOrder, ImageChannelType, MemFlags, RawImageFormat};
    use basalt_hal::sim::DriverOp;

    use super::*;
    use crate::create_buffer;
    use crate::testing::{rgba8_image, sim_context};

    fn query<T: bytemuck::Pod>(f: impl FnOnce(PropertyWriter<'_>) -> Result<()>) -> Result<T> {
        let mut value = T::zeroed();
        let mut size = 0usize;
        f(PropertyWriter::new(Some(bytemuck::bytes_of_mut(&mut value)), Some(&mut size))?)?;
        assert_eq!(size, core::mem::size_of::<T>());
        Ok(value)
    }

    #[test]
    fn test_buffer_size_is_stable() {
        let (_drv, ctx) = sim_context();
        let mem = unsafe { create_buffer(&ctx, MemFlags::READ_WRITE, 1000, None) }.unwrap();

        let first: usize = query(|out| mem.get_info(MemInfo::Size, out)).unwrap();
        let second: usize = query(|out| mem.get_info(MemInfo::Size, out)).unwrap();
        assert!(first >= 1000);
        assert_eq!(first, second);
        mem.release().unwrap();
    }

    #[test]
    fn test_context_query() {
        let (_drv, ctx) = sim_context();
        let mem = unsafe { create_buffer(&ctx, MemFlags::READ_WRITE, 8, None) }.unwrap();
        let handle: u64 = query(|out| mem.get_info(MemInfo::Context, out)).unwrap();
        assert_eq!(handle, ctx.handle());
        mem.release().unwrap();
    }

    #[test]
    fn test_output_too_small() {
        let (_drv, ctx) = sim_context();
        let mem = unsafe { create_buffer(&ctx, MemFlags::READ_WRITE, 8, None) }.unwrap();
        let mut small = [0u8; 2];
        let out = PropertyWriter::new(Some(&mut small[..]), None).unwrap();
        assert_eq!(mem.get_info(MemInfo::Size, out), Err(Error::InvalidSize));
        mem.release().unwrap();
    }

    #[test]
    fn test_image_queries() {
        let (drv, ctx) = sim_context();
        let img = rgba8_image(&ctx, 4, 2);

        let fmt: RawImageFormat = query(|out| img.image_info(ImageInfo::Format, out)).unwrap();
        assert_eq!(
            fmt,
            ImageFormat::new(ImageChannelOrder::RGBA, ImageChannelType::UnsignedInt8).to_raw()
        );
        let elem: usize = query(|out| img.image_info(ImageInfo::ElementSize, out)).unwrap();
        assert_eq!(elem, 1);
        let w: usize = query(|out| img.image_info(ImageInfo::Width, out)).unwrap();
        let h: usize = query(|out| img.image_info(ImageInfo::Height, out)).unwrap();
        let d: usize = query(|out| img.image_info(ImageInfo::Depth, out)).unwrap();
        assert_eq!((w, h, d), (4, 2, 0));
        assert_eq!(img.size(), Ok(4 * 4 * 2));

        drv.clear_calls();
        for pitch in [ImageInfo::RowPitch, ImageInfo::SlicePitch] {
            assert_eq!(
                query::<usize>(|out| img.image_info(pitch, out)),
                Err(Error::UnsupportedEnumeration)
            );
        }
        assert!(drv.calls().is_empty());
        img.release().unwrap();
    }

    #[test]
    fn test_image_query_on_buffer() {
        let (drv, ctx) = sim_context();
        let mem = unsafe { create_buffer(&ctx, MemFlags::READ_WRITE, 8, None) }.unwrap();
        assert_eq!(mem.image_width(), Err(Error::InvalidMemObject));
        assert_eq!(
            query::<usize>(|out| mem.image_info(ImageInfo::RowPitch, out)),
            Err(Error::InvalidMemObject)
        );
        assert_eq!(drv.count(DriverOp::ArrayGetDescriptor), 0);
        mem.release().unwrap();
    }

    #[test]
    fn test_sub_buffer_reports_allocation_size() {
        let (_drv, ctx) = sim_context();
        let mem = unsafe { create_buffer(&ctx, MemFlags::READ_WRITE, 512, None) }.unwrap();
        let sub = mem
            .partition(
                MemFlags::READ_WRITE,
                crate::BufferCreateType::Region,
                &crate::BufferRegion::new(128, 64),
            )
            .unwrap();
        assert_eq!(sub.size(), mem.size());
        sub.release().unwrap();
        mem.release().unwrap();
    }
}
