//! # BASALT Error Handling
//!
//! Error types for the memory adapter.
//!
//! Three separate signals exist and are never mixed:
//! - [`Error`]: recoverable, returned to the runtime caller
//! - [`NativeError`]: a status reported by the native driver
//! - [`Unrecoverable`]: a native failure during destructive teardown,
//!   handled only by [`die`]

use core::fmt;

// =============================================================================
// RESULT TYPES
// =============================================================================

/// BASALT Result type alias
pub type Result<T> = core::result::Result<T, Error>;

/// Result of a native driver primitive
pub type NativeResult<T> = core::result::Result<T, NativeError>;

// =============================================================================
// ERROR ENUM
// =============================================================================

/// BASALT unified error type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Invalid Argument
    // =========================================================================
    /// Enumeration value or flag bits not recognized
    InvalidEnumeration,
    /// Buffer size is zero or a region exceeds its parent
    InvalidBufferSize,
    /// Host pointer missing where the flags require one
    InvalidHostPtr,
    /// Image format or descriptor rejected
    InvalidImageFormatDescriptor,
    /// Argument value contradicts another argument
    InvalidValue,
    /// Caller-provided output buffer too small
    InvalidSize,
    /// Memory object is dead or of the wrong kind
    InvalidMemObject,
    /// Required output pointer missing
    InvalidNullPointer,

    // =========================================================================
    // Unsupported
    // =========================================================================
    /// Enumeration value recognized but not supported by this adapter
    UnsupportedEnumeration,
    /// Entry point not supported by this adapter
    UnsupportedFeature,

    // =========================================================================
    // Resource Exhaustion
    // =========================================================================
    /// Out of host memory
    OutOfHostMemory,
    /// Out of device memory
    OutOfDeviceMemory,
    /// Out of driver resources
    OutOfResources,

    // =========================================================================
    // Device
    // =========================================================================
    /// Device ordinal not known to the driver
    InvalidDevice,
    /// Device stopped responding
    DeviceLost,

    // =========================================================================
    // Catch-all
    // =========================================================================
    /// Native failure without a specific mapping
    Unknown,
}

impl Error {
    /// Check if the error was detected before any native call
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidEnumeration
                | Self::InvalidBufferSize
                | Self::InvalidHostPtr
                | Self::InvalidImageFormatDescriptor
                | Self::InvalidValue
                | Self::InvalidSize
                | Self::InvalidMemObject
                | Self::InvalidNullPointer
        )
    }

    /// Check if the error reports resource exhaustion
    pub const fn is_out_of_resources(&self) -> bool {
        matches!(
            self,
            Self::OutOfHostMemory | Self::OutOfDeviceMemory | Self::OutOfResources
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Invalid argument
            Self::InvalidEnumeration => write!(f, "invalid enumeration"),
            Self::InvalidBufferSize => write!(f, "invalid buffer size"),
            Self::InvalidHostPtr => write!(f, "invalid host pointer"),
            Self::InvalidImageFormatDescriptor => write!(f, "invalid image format descriptor"),
            Self::InvalidValue => write!(f, "invalid value"),
            Self::InvalidSize => write!(f, "invalid size"),
            Self::InvalidMemObject => write!(f, "invalid memory object"),
            Self::InvalidNullPointer => write!(f, "invalid null pointer"),

            // Unsupported
            Self::UnsupportedEnumeration => write!(f, "unsupported enumeration"),
            Self::UnsupportedFeature => write!(f, "unsupported feature"),

            // Resources
            Self::OutOfHostMemory => write!(f, "out of host memory"),
            Self::OutOfDeviceMemory => write!(f, "out of device memory"),
            Self::OutOfResources => write!(f, "out of resources"),

            // Device
            Self::InvalidDevice => write!(f, "invalid device"),
            Self::DeviceLost => write!(f, "device lost"),

            Self::Unknown => write!(f, "unknown error"),
        }
    }
}

impl std::error::Error for Error {}

// =============================================================================
// NATIVE STATUS
// =============================================================================

/// Status reported by a failing native driver primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeError {
    /// Driver could not satisfy an allocation
    OutOfMemory,
    /// Driver rejected an argument
    InvalidValue,
    /// Pointer does not belong to any device allocation
    InvalidDevicePointer,
    /// Handle does not name a live native object
    InvalidHandle,
    /// Device ordinal out of range
    InvalidDevice,
    /// Host range is already registered
    HostMemoryAlreadyRegistered,
    /// Host range was never registered
    HostMemoryNotRegistered,
    /// Primitive not available on this platform
    NotSupported,
    /// Device stopped responding
    DeviceLost,
    /// Any other driver status code
    Other(i32),
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "native out of memory"),
            Self::InvalidValue => write!(f, "native invalid value"),
            Self::InvalidDevicePointer => write!(f, "invalid device pointer"),
            Self::InvalidHandle => write!(f, "invalid native handle"),
            Self::InvalidDevice => write!(f, "invalid device ordinal"),
            Self::HostMemoryAlreadyRegistered => write!(f, "host memory already registered"),
            Self::HostMemoryNotRegistered => write!(f, "host memory not registered"),
            Self::NotSupported => write!(f, "native operation not supported"),
            Self::DeviceLost => write!(f, "device lost"),
            Self::Other(code) => write!(f, "native status {}", code),
        }
    }
}

impl From<NativeError> for Error {
    fn from(e: NativeError) -> Self {
        match e {
            NativeError::OutOfMemory => Error::OutOfDeviceMemory,
            NativeError::InvalidValue => Error::InvalidValue,
            NativeError::InvalidDevicePointer | NativeError::InvalidHandle => {
                Error::InvalidMemObject
            }
            NativeError::InvalidDevice => Error::InvalidDevice,
            NativeError::HostMemoryAlreadyRegistered | NativeError::HostMemoryNotRegistered => {
                Error::InvalidHostPtr
            }
            NativeError::NotSupported => Error::UnsupportedFeature,
            NativeError::DeviceLost => Error::DeviceLost,
            NativeError::Other(_) => Error::Unknown,
        }
    }
}

// =============================================================================
// UNRECOVERABLE
// =============================================================================

/// Native failure during destructive teardown
///
/// A failed deallocation leaves device state ambiguous, so this is never
/// turned into an [`Error`]. The only consumer is [`die`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unrecoverable {
    /// Native primitive that failed
    pub operation: &'static str,
    /// Status it reported
    pub cause: NativeError,
}

impl Unrecoverable {
    /// Create a new unrecoverable signal
    pub const fn new(operation: &'static str, cause: NativeError) -> Self {
        Self { operation, cause }
    }
}

impl fmt::Display for Unrecoverable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed during teardown: {}", self.operation, self.cause)
    }
}

/// Abort the process from an unrecoverable state
pub fn die(reason: &Unrecoverable) -> ! {
    log::error!("Unrecoverable program state reached: {}", reason);
    std::process::abort()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_mapping() {
        assert_eq!(Error::from(NativeError::OutOfMemory), Error::OutOfDeviceMemory);
        assert_eq!(Error::from(NativeError::InvalidHandle), Error::InvalidMemObject);
        assert_eq!(Error::from(NativeError::NotSupported), Error::UnsupportedFeature);
        assert_eq!(Error::from(NativeError::Other(-7)), Error::Unknown);
    }

    #[test]
    fn test_categories() {
        assert!(Error::InvalidBufferSize.is_invalid_argument());
        assert!(!Error::UnsupportedFeature.is_invalid_argument());
        assert!(Error::OutOfDeviceMemory.is_out_of_resources());
        assert!(!Error::Unknown.is_out_of_resources());
    }

    #[test]
    fn test_unrecoverable_display() {
        let u = Unrecoverable::new("free", NativeError::InvalidDevicePointer);
        assert_eq!(
            format!("{}", u),
            "free failed during teardown: invalid device pointer"
        );
    }
}
