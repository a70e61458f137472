//! # Devices and Contexts
//!
//! The owning logical context of every memory object, and the scoped
//! activation that binds its device before any native call.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use basalt_core::{DeviceId, NativeResult};

use crate::driver::Driver;

/// Source of context handle values
static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

// =============================================================================
// DEVICE
// =============================================================================

/// A device as seen through one native driver
pub struct Device {
    id: DeviceId,
    driver: Arc<dyn Driver>,
}

impl Device {
    /// Create a new device
    pub fn new(id: DeviceId, driver: Arc<dyn Driver>) -> Arc<Self> {
        Arc::new(Self { id, driver })
    }

    /// Get device ordinal
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Get the native driver
    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device").field("id", &self.id).finish()
    }
}

// =============================================================================
// CONTEXT
// =============================================================================

/// Logical device context shared by every object created in it
#[derive(Debug)]
pub struct Context {
    handle: u64,
    device: Arc<Device>,
}

impl Context {
    /// Create a new context over `device`
    pub fn new(device: Arc<Device>) -> Arc<Self> {
        let handle = NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed);
        log::debug!("Creating context {} on {:?}", handle, device.id());
        Arc::new(Self { handle, device })
    }

    /// Get the context handle value
    pub fn handle(&self) -> u64 {
        self.handle
    }

    /// Get the device
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    /// Get the native driver
    pub fn driver(&self) -> &dyn Driver {
        self.device.driver()
    }

    /// Bind this context's device for the current scope
    pub fn activate(&self) -> NativeResult<ScopedContext<'_>> {
        ScopedContext::new(&self.device)
    }
}

// =============================================================================
// SCOPED ACTIVATION
// =============================================================================

/// Binds a device to the calling thread until dropped
///
/// Activating the device that is already current is a no-op, so scopes
/// nest freely. The previous binding is restored on drop, on every exit
/// path.
#[must_use = "the device is unbound as soon as the guard is dropped"]
pub struct ScopedContext<'a> {
    device: &'a Device,
    previous: Option<DeviceId>,
}

impl<'a> ScopedContext<'a> {
    /// Activate `device`
    pub fn new(device: &'a Device) -> NativeResult<Self> {
        let driver = device.driver();
        let current = driver.current_device()?;

        if current == device.id() {
            return Ok(Self {
                device,
                previous: None,
            });
        }

        log::trace!("Activating {:?} (was {:?})", device.id(), current);
        driver.set_device(device.id())?;

        Ok(Self {
            device,
            previous: Some(current),
        })
    }

    /// Get the active device
    pub fn device(&self) -> &'a Device {
        self.device
    }
}

impl Drop for ScopedContext<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            if let Err(e) = self.device.driver().set_device(previous) {
                log::warn!("Failed to restore {:?}: {}", previous, e);
            }
        }
    }
}

impl fmt::Debug for ScopedContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedContext")
            .field("device", &self.device.id())
            .field("previous", &self.previous)
            .finish()
    }
}

static_assertions::assert_impl_all!(Context: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{DriverOp, SimConfig, SimDriver};

    fn two_devices() -> (Arc<SimDriver>, Arc<Device>, Arc<Device>) {
        let driver = Arc::new(SimDriver::new(SimConfig {
            device_count: 2,
            ..SimConfig::default()
        }));
        let d0 = Device::new(DeviceId(0), driver.clone());
        let d1 = Device::new(DeviceId(1), driver.clone());
        (driver, d0, d1)
    }

    #[test]
    fn test_activation_restores_previous() {
        let (driver, _d0, d1) = two_devices();
        assert_eq!(driver.current_device(), Ok(DeviceId(0)));
        {
            let _active = ScopedContext::new(&d1).unwrap();
            assert_eq!(driver.current_device(), Ok(DeviceId(1)));
        }
        assert_eq!(driver.current_device(), Ok(DeviceId(0)));
    }

    #[test]
    fn test_nested_activation_is_reentrant() {
        let (driver, _d0, d1) = two_devices();
        let outer = ScopedContext::new(&d1).unwrap();
        {
            let _inner = ScopedContext::new(&d1).unwrap();
        }
        assert_eq!(driver.current_device(), Ok(DeviceId(1)));
        drop(outer);
        assert_eq!(driver.current_device(), Ok(DeviceId(0)));
        // enter + restore only; the nested scope made no native call
        assert_eq!(driver.count(DriverOp::SetDevice), 2);
    }

    #[test]
    fn test_context_handles_are_distinct() {
        let (_driver, d0, _d1) = two_devices();
        let a = Context::new(d0.clone());
        let b = Context::new(d0);
        assert_ne!(a.handle(), b.handle());
    }
}
