//! # Image Creation
//!
//! Builds a native pixel array, fills it from caller memory when asked and
//! binds a surface over it.

use std::sync::Arc;

use basalt_core::{
    ArrayHandle, Error, HostPtr, ImageChannelOrder, ImageDesc, ImageFormat, MemFlags, MemType,
    ReleaseGuard, Result, StructureType,
};
use basalt_hal::{Context, Driver, Memcpy2D, Memcpy3D, ResourceDesc};

use crate::format;
use crate::lifecycle::unwind;
use crate::object::{MemHandle, MemKind, SurfaceMem};

/// Create an RGBA image
///
/// # Safety
/// With a host pointer and a host-pointer flag, `host` must be valid for
/// reads of the whole image as laid out by `desc` (tightly packed unless
/// `row_pitch`/`slice_pitch` say otherwise).
pub unsafe fn create_image(
    context: &Arc<Context>,
    flags: MemFlags,
    image_format: &ImageFormat,
    desc: &ImageDesc,
    host: Option<HostPtr>,
) -> Result<MemHandle> {
    let flags = flags.validate()?;
    let initial_copy = flags.intersects(MemFlags::HOST_POINTER_REQUIRED);
    if initial_copy && host.is_none() {
        return Err(Error::InvalidHostPtr);
    }

    validate_desc(desc, host.is_some())?;
    if image_format.channel_order != ImageChannelOrder::RGBA {
        return Err(Error::UnsupportedEnumeration);
    }
    let array_format = format::to_native(image_format.channel_type)?;
    let array_desc = format::array_descriptor(desc, array_format);

    let _active = context.activate()?;
    let driver = context.driver();

    let array = driver.array_create(&array_desc)?;
    let created = ReleaseGuard::new(|| unwind("array_destroy", driver.array_destroy(array)));

    if let (true, Some(src)) = (initial_copy, host) {
        let pixel_size = format::pixel_size(array_format);
        // SAFETY: forwarded from the caller
        unsafe { upload(driver, array, desc, pixel_size, src)? };
    }

    let surface = driver.surface_create(&ResourceDesc::Array(array))?;
    created.dismiss();

    Ok(MemHandle::new(
        context.clone(),
        None,
        flags,
        MemKind::Surface(SurfaceMem::new(array, surface, desc.mem_type)),
    ))
}

fn validate_desc(desc: &ImageDesc, has_host: bool) -> Result<()> {
    if desc.stype != StructureType::ImageDesc || desc.mem_type.dimensions().is_none() {
        return Err(Error::InvalidImageFormatDescriptor);
    }
    if desc.num_mip_level != 0 || desc.num_samples != 0 {
        return Err(Error::InvalidImageFormatDescriptor);
    }
    if !has_host && (desc.row_pitch != 0 || desc.slice_pitch != 0) {
        return Err(Error::InvalidImageFormatDescriptor);
    }
    Ok(())
}

/// Copy the initial image contents with the routine for its dimensionality
///
/// # Safety
/// See [`create_image`].
unsafe fn upload(
    driver: &dyn Driver,
    array: ArrayHandle,
    desc: &ImageDesc,
    pixel_size: usize,
    src: HostPtr,
) -> Result<()> {
    let width_in_bytes = pixel_size * desc.width;
    let row_pitch = if desc.row_pitch == 0 {
        width_in_bytes
    } else {
        desc.row_pitch
    };

    match desc.mem_type {
        MemType::Image1D => {
            // SAFETY: forwarded from the caller
            unsafe { driver.memcpy_htoa(array, 0, src, width_in_bytes)? };
        }
        MemType::Image2D => {
            let copy = Memcpy2D {
                src_host: src,
                src_pitch: desc.row_pitch,
                dst_array: array,
                width_in_bytes,
                height: desc.height,
            };
            // SAFETY: forwarded from the caller
            unsafe { driver.memcpy_2d(&copy)? };
        }
        MemType::Image3D => {
            let copy = Memcpy3D {
                src_host: src,
                src_pitch: desc.row_pitch,
                src_height: desc.slice_pitch / row_pitch.max(1),
                dst_array: array,
                width_in_bytes,
                height: desc.height,
                depth: desc.depth,
            };
            // SAFETY: forwarded from the caller
            unsafe { driver.memcpy_3d(&copy)? };
        }
        _ => return Err(Error::InvalidImageFormatDescriptor),
    }
    Ok(())
}
