//! # BASALT Memory Objects
//!
//! Runtime buffers, sub-buffers and image surfaces over a native driver.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        basalt-mem                               │
//! │                                                                 │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌────────────────┐   │
//! │  │ create_buffer   │  │   partition     │  │  create_image  │   │
//! │  │ (alloc modes)   │  │ (offset views)  │  │ (array+surface)│   │
//! │  └────────┬────────┘  └────────┬────────┘  └───────┬────────┘   │
//! │           └────────────────────┼───────────────────┘            │
//! │                       ┌────────┴────────┐                       │
//! │                       │    MemHandle    │──▶ size / info /      │
//! │                       │ retain/release  │    native handle      │
//! │                       └────────┬────────┘                       │
//! │                                │                                │
//! │  ┌─────────────────────────────┴─────────────────────────────┐  │
//! │  │              basalt_hal::Driver (native primitives)       │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifetime
//!
//! Every object starts with one runtime reference. [`MemHandle::retain`]
//! and [`MemHandle::release`] move the count; the release that reaches 0
//! frees the native backing. A native failure at that point aborts the
//! process.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod format;
pub mod image;
pub mod info;
mod lifecycle;
pub mod native;
pub mod object;
pub mod partition;

// Re-exports
pub use buffer::{create_buffer, BufferProperties, HOST_REGISTER};
pub use image::create_image;
pub use native::{
    buffer_create_with_native_handle, image_create_with_native_handle, MemNativeProperties,
};
pub use object::{AllocMode, BufferMem, MemHandle, MemKind, MemObject, SurfaceMem};
pub use partition::{BufferCreateType, BufferRegion};

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use basalt_core::{DeviceId, ImageChannelOrder, ImageChannelType, ImageDesc, ImageFormat, MemFlags};
    use basalt_hal::sim::{SimConfig, SimDriver};
    use basalt_hal::{Context, Device};

    use crate::MemHandle;

    /// Context on device 0 of a fresh simulated driver
    pub fn sim_context() -> (Arc<SimDriver>, Arc<Context>) {
        sim_context_on(0)
    }

    /// Context on `device` of a fresh two-device simulated driver
    pub fn sim_context_on(device: u32) -> (Arc<SimDriver>, Arc<Context>) {
        let driver = Arc::new(SimDriver::new(SimConfig {
            device_count: 2,
            ..SimConfig::default()
        }));
        let ctx = Context::new(Device::new(DeviceId(device), driver.clone()));
        (driver, ctx)
    }

    /// Uninitialized 8-bit RGBA 2D image
    pub fn rgba8_image(ctx: &Arc<Context>, width: usize, height: usize) -> MemHandle {
        let fmt = ImageFormat::new(ImageChannelOrder::RGBA, ImageChannelType::UnsignedInt8);
        unsafe {
            crate::create_image(ctx, MemFlags::READ_WRITE, &fmt, &ImageDesc::new_2d(width, height), None)
        }
        .unwrap()
    }
}
