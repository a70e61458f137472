//! # BASALT Core
//!
//! Foundational types shared by the BASALT memory adapter.
//!
//! The adapter sits between a vendor-neutral runtime memory API and a native
//! accelerator driver. This crate holds everything both sides agree on:
//!
//! - Typed errors, the native status space and the unrecoverable signal
//! - Runtime status codes for C-style boundaries
//! - Memory flags and address/handle newtypes
//! - Portable image format and descriptor types
//! - Typed property return into caller buffers
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      basalt-core                            │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │   Error     │  │   Types     │  │   Image / Flags     │  │
//! │  │ (Error,     │  │ (DevicePtr, │  │  (ImageFormat,      │  │
//! │  │  UrResult)  │  │  HostPtr)   │  │   MemFlags)         │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

// =============================================================================
// MODULE EXPORTS
// =============================================================================

pub mod error;
pub mod flags;
pub mod guard;
pub mod image;
pub mod property;
pub mod result;
pub mod types;

// Re-exports for convenience
pub use error::{die, Error, NativeError, NativeResult, Result, Unrecoverable};
pub use flags::MemFlags;
pub use guard::ReleaseGuard;
pub use image::*;
pub use property::PropertyWriter;
pub use result::{status, UrResult};
pub use types::*;
