//! # BASALT Hardware Abstraction Layer
//!
//! The native driver boundary of the memory adapter.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         basalt-hal                              │
//! │                                                                 │
//! │  ┌──────────────────────┐        ┌───────────────────────────┐  │
//! │  │  Device / Context    │───────▶│     ScopedContext         │  │
//! │  │  (owning context)    │        │  (scoped device binding)  │  │
//! │  └──────────────────────┘        └───────────────────────────┘  │
//! │              │                                                  │
//! │  ┌───────────┴──────────────────────────────────────────────┐   │
//! │  │                    Driver trait                          │   │
//! │  │  malloc/free, pinned host, host register, arrays,        │   │
//! │  │  surfaces, linear/2D/3D copies, queries, stream sync     │   │
//! │  └──────────────────────────────────────────────────────────┘   │
//! │              │                                                  │
//! │  ┌───────────┴───────────┐                                      │
//! │  │  SimDriver (feature   │   host-RAM backed, allocation        │
//! │  │  "sim")               │   tracking, failure injection        │
//! │  └───────────────────────┘                                      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod driver;
#[cfg(any(test, feature = "sim"))]
pub mod sim;

// Re-exports
pub use context::{Context, Device, ScopedContext};
pub use driver::{
    ArrayDescriptor, ArrayFormat, Driver, Memcpy2D, Memcpy3D, ResourceDesc, Stream,
};
