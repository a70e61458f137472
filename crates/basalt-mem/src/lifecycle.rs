//! # Lifecycle
//!
//! Runtime retain/release and the single teardown of native resources.
//!
//! A failed native free during teardown is not an error the caller can act
//! on: the process is aborted through [`basalt_core::die`].

use core::sync::atomic::Ordering;

use basalt_core::{die, Error, NativeError, NativeResult, Result, Unrecoverable};
use basalt_hal::Driver;

use crate::object::{AllocMode, BufferMem, MemHandle, MemKind, SurfaceMem};

/// Outcome of dropping one runtime reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Released {
    /// References remain
    Alive(u32),
    /// This call dropped the last reference and owns teardown
    Destroyed,
}

impl MemHandle {
    /// Add a runtime reference
    pub fn retain(&self) -> Result<()> {
        self.refcount
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                if count == 0 {
                    None
                } else {
                    count.checked_add(1)
                }
            })
            .map(drop)
            .map_err(|_| Error::InvalidMemObject)
    }

    /// Drop a runtime reference, destroying the object on the last one
    pub fn release(&self) -> Result<()> {
        if self.decrement()? == Released::Destroyed {
            if let Err(reason) = self.teardown() {
                die(&reason);
            }
        }
        Ok(())
    }

    /// Tear down an object that was built but never handed out
    pub(crate) fn discard(&self) {
        if let Err(e) = self.release() {
            log::warn!("Discarding {:?}: {}", self, e);
        }
    }

    pub(crate) fn decrement(&self) -> Result<Released> {
        let previous = self
            .refcount
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            })
            .map_err(|_| Error::InvalidMemObject)?;

        Ok(match previous {
            1 => Released::Destroyed,
            n => Released::Alive(n - 1),
        })
    }

    /// Release native resources
    ///
    /// Runs once, on the thread that observed the 1 → 0 transition.
    pub(crate) fn teardown(&self) -> core::result::Result<(), Unrecoverable> {
        log::debug!("Destroying {:?}", self);

        if let Some(parent) = self.parent() {
            // a view owns nothing; it only holds its parent alive
            return match parent.decrement() {
                Ok(Released::Destroyed) => parent.teardown(),
                Ok(Released::Alive(_)) => Ok(()),
                Err(_) => {
                    log::warn!("Parent of {:?} was already released", self);
                    Ok(())
                }
            };
        }

        let _active = self
            .context()
            .activate()
            .map_err(|e| Unrecoverable::new("set_device", e))?;
        let driver = self.context().driver();

        match self.kind() {
            MemKind::Buffer(buffer) => free_buffer(driver, buffer),
            MemKind::Surface(surface) => free_surface(driver, surface),
        }
    }
}

fn free_buffer(driver: &dyn Driver, buffer: &BufferMem) -> core::result::Result<(), Unrecoverable> {
    match buffer.alloc_mode() {
        AllocMode::Classic | AllocMode::CopyIn => driver
            .free(buffer.ptr())
            .map_err(|e| Unrecoverable::new("free", e)),
        AllocMode::UseHostPtr => {
            let host = buffer
                .host_ptr()
                .ok_or(Unrecoverable::new("host_unregister", NativeError::InvalidValue))?;
            driver
                .host_unregister(host)
                .map_err(|e| Unrecoverable::new("host_unregister", e))
        }
        AllocMode::AllocHostPtr => {
            let host = buffer
                .host_ptr()
                .ok_or(Unrecoverable::new("free_host", NativeError::InvalidValue))?;
            driver
                .free_host(host)
                .map_err(|e| Unrecoverable::new("free_host", e))
        }
    }
}

fn free_surface(driver: &dyn Driver, surface: &SurfaceMem) -> core::result::Result<(), Unrecoverable> {
    driver
        .surface_destroy(surface.surface())
        .map_err(|e| Unrecoverable::new("surface_destroy", e))?;
    driver
        .array_destroy(surface.array())
        .map_err(|e| Unrecoverable::new("array_destroy", e))
}

/// Undo a partial acquisition while a construction is failing
pub(crate) fn unwind(operation: &str, r: NativeResult<()>) {
    if let Err(e) = r {
        log::warn!("{} failed while unwinding a failed construction: {}", operation, e);
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use basalt_core::{HostPtr, MemFlags};
    use basalt_hal::sim::DriverOp;

    use super::*;
    use crate::testing::sim_context;
    use crate::{create_buffer, BufferProperties};

    #[test]
    fn test_retain_release_balanced() {
        let (drv, ctx) = sim_context();
        let mem = unsafe { create_buffer(&ctx, MemFlags::READ_WRITE, 128, None) }.unwrap();

        for _ in 0..3 {
            mem.retain().unwrap();
        }
        for _ in 0..3 {
            mem.release().unwrap();
            assert!(mem.is_alive());
            assert_eq!(drv.count(DriverOp::Free), 0);
        }
        mem.release().unwrap();
        assert!(!mem.is_alive());
        assert_eq!(drv.count(DriverOp::Free), 1);
    }

    #[test]
    fn test_dead_handle_rejects_everything() {
        let (drv, ctx) = sim_context();
        let mem = unsafe { create_buffer(&ctx, MemFlags::READ_WRITE, 16, None) }.unwrap();
        mem.release().unwrap();

        assert_eq!(mem.retain(), Err(Error::InvalidMemObject));
        assert_eq!(mem.release(), Err(Error::InvalidMemObject));
        assert_eq!(mem.size(), Err(Error::InvalidMemObject));
        assert_eq!(mem.ref_count(), 0);
        assert_eq!(drv.count(DriverOp::Free), 1);
    }

    #[test]
    fn test_each_mode_frees_what_it_acquired() {
        let host = vec![7u8; 512];
        let props = BufferProperties::with_host(HostPtr::from_slice(&host));
        let cases = [
            (MemFlags::READ_WRITE, DriverOp::Free),
            (MemFlags::ALLOC_COPY_HOST_POINTER, DriverOp::Free),
            (MemFlags::ALLOC_HOST_POINTER, DriverOp::FreeHost),
            (
                MemFlags::ALLOC_HOST_POINTER | MemFlags::ALLOC_COPY_HOST_POINTER,
                DriverOp::FreeHost,
            ),
            (MemFlags::USE_HOST_POINTER, expected_use_host_release()),
        ];

        for (flags, release_op) in cases {
            let (drv, ctx) = sim_context();
            let mem = unsafe { create_buffer(&ctx, flags, 512, Some(&props)) }.unwrap();
            assert!(!drv.stats().is_empty());
            drv.clear_calls();

            mem.release().unwrap();
            assert_eq!(drv.calls(), [release_op], "flags {:?}", flags);
            assert!(drv.stats().is_empty(), "flags {:?}", flags);
        }
    }

    fn expected_use_host_release() -> DriverOp {
        if crate::HOST_REGISTER {
            DriverOp::HostUnregister
        } else {
            DriverOp::Free
        }
    }

    #[test]
    fn test_failed_free_is_unrecoverable() {
        let (drv, ctx) = sim_context();
        let mem = unsafe { create_buffer(&ctx, MemFlags::READ_WRITE, 64, None) }.unwrap();
        drv.fail_next(DriverOp::Free, NativeError::InvalidDevicePointer);

        assert_eq!(mem.decrement(), Ok(Released::Destroyed));
        assert_eq!(
            mem.teardown(),
            Err(Unrecoverable::new("free", NativeError::InvalidDevicePointer))
        );
    }

    #[test]
    fn test_surface_destroyed_before_array() {
        let (drv, ctx) = sim_context();
        let mem = crate::testing::rgba8_image(&ctx, 2, 2);
        drv.clear_calls();

        mem.release().unwrap();
        assert_eq!(drv.calls(), [DriverOp::SurfaceDestroy, DriverOp::ArrayDestroy]);
    }

    #[test]
    fn test_concurrent_retain_release() {
        let (drv, ctx) = sim_context();
        let mem = unsafe { create_buffer(&ctx, MemFlags::READ_WRITE, 256, None) }.unwrap();
        let threads = 8;
        let rounds = 1000;

        for _ in 0..threads {
            mem.retain().unwrap();
        }
        let workers: Vec<_> = (0..threads)
            .map(|_| {
                let mem = mem.clone();
                thread::spawn(move || {
                    for _ in 0..rounds {
                        mem.retain().unwrap();
                        mem.release().unwrap();
                    }
                    mem.release().unwrap();
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }

        assert_eq!(mem.ref_count(), 1);
        assert_eq!(drv.count(DriverOp::Free), 0);
        mem.release().unwrap();
        assert_eq!(drv.count(DriverOp::Free), 1);
    }
}
