//! # Runtime Status Codes
//!
//! Integer status codes for C-style boundaries, and their mapping from
//! [`Error`].

use core::fmt;

use crate::error::Error;

// =============================================================================
// UR RESULT
// =============================================================================

/// Runtime status code
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UrResult {
    /// Operation completed
    Success = 0,
    /// Out of resources
    ErrorOutOfResources = 3,
    /// Device lost
    ErrorDeviceLost = 4,
    /// Invalid value
    ErrorInvalidValue = 7,
    /// Invalid size
    ErrorInvalidSize = 13,
    /// Invalid memory object
    ErrorInvalidMemObject = 28,
    /// Invalid host pointer
    ErrorInvalidHostPtr = 36,
    /// Invalid image format descriptor
    ErrorInvalidImageFormatDescriptor = 38,
    /// Invalid buffer size
    ErrorInvalidBufferSize = 40,
    /// Out of host memory
    ErrorOutOfHostMemory = 45,
    /// Out of device memory
    ErrorOutOfDeviceMemory = 46,
    /// Invalid device
    ErrorInvalidDevice = 52,
    /// Unsupported feature
    ErrorUnsupportedFeature = 58,
    /// Unsupported enumeration
    ErrorUnsupportedEnumeration = 63,
    /// Invalid null pointer
    ErrorInvalidNullPointer = 0x7ffe_fffd,
    /// Invalid enumeration
    ErrorInvalidEnumeration = 0x7ffe_fffe,
    /// Unknown error
    ErrorUnknown = 0x7fff_fffe,
}

impl UrResult {
    /// Check if result is a success code
    pub fn is_success(&self) -> bool {
        *self == Self::Success
    }

    /// Convert to raw i32
    pub fn as_raw(&self) -> i32 {
        *self as i32
    }

    /// Create from raw i32
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => Self::Success,
            3 => Self::ErrorOutOfResources,
            4 => Self::ErrorDeviceLost,
            7 => Self::ErrorInvalidValue,
            13 => Self::ErrorInvalidSize,
            28 => Self::ErrorInvalidMemObject,
            36 => Self::ErrorInvalidHostPtr,
            38 => Self::ErrorInvalidImageFormatDescriptor,
            40 => Self::ErrorInvalidBufferSize,
            45 => Self::ErrorOutOfHostMemory,
            46 => Self::ErrorOutOfDeviceMemory,
            52 => Self::ErrorInvalidDevice,
            58 => Self::ErrorUnsupportedFeature,
            63 => Self::ErrorUnsupportedEnumeration,
            0x7ffe_fffd => Self::ErrorInvalidNullPointer,
            0x7ffe_fffe => Self::ErrorInvalidEnumeration,
            _ => Self::ErrorUnknown,
        }
    }
}

impl fmt::Display for UrResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "UR_RESULT_SUCCESS"),
            Self::ErrorOutOfResources => write!(f, "UR_RESULT_ERROR_OUT_OF_RESOURCES"),
            Self::ErrorDeviceLost => write!(f, "UR_RESULT_ERROR_DEVICE_LOST"),
            Self::ErrorInvalidValue => write!(f, "UR_RESULT_ERROR_INVALID_VALUE"),
            Self::ErrorInvalidSize => write!(f, "UR_RESULT_ERROR_INVALID_SIZE"),
            Self::ErrorInvalidMemObject => write!(f, "UR_RESULT_ERROR_INVALID_MEM_OBJECT"),
            Self::ErrorInvalidHostPtr => write!(f, "UR_RESULT_ERROR_INVALID_HOST_PTR"),
            Self::ErrorInvalidImageFormatDescriptor => {
                write!(f, "UR_RESULT_ERROR_INVALID_IMAGE_FORMAT_DESCRIPTOR")
            }
            Self::ErrorInvalidBufferSize => write!(f, "UR_RESULT_ERROR_INVALID_BUFFER_SIZE"),
            Self::ErrorOutOfHostMemory => write!(f, "UR_RESULT_ERROR_OUT_OF_HOST_MEMORY"),
            Self::ErrorOutOfDeviceMemory => write!(f, "UR_RESULT_ERROR_OUT_OF_DEVICE_MEMORY"),
            Self::ErrorInvalidDevice => write!(f, "UR_RESULT_ERROR_INVALID_DEVICE"),
            Self::ErrorUnsupportedFeature => write!(f, "UR_RESULT_ERROR_UNSUPPORTED_FEATURE"),
            Self::ErrorUnsupportedEnumeration => {
                write!(f, "UR_RESULT_ERROR_UNSUPPORTED_ENUMERATION")
            }
            Self::ErrorInvalidNullPointer => write!(f, "UR_RESULT_ERROR_INVALID_NULL_POINTER"),
            Self::ErrorInvalidEnumeration => write!(f, "UR_RESULT_ERROR_INVALID_ENUMERATION"),
            Self::ErrorUnknown => write!(f, "UR_RESULT_ERROR_UNKNOWN"),
        }
    }
}

impl From<Error> for UrResult {
    fn from(e: Error) -> Self {
        match e {
            Error::InvalidEnumeration => UrResult::ErrorInvalidEnumeration,
            Error::InvalidBufferSize => UrResult::ErrorInvalidBufferSize,
            Error::InvalidHostPtr => UrResult::ErrorInvalidHostPtr,
            Error::InvalidImageFormatDescriptor => UrResult::ErrorInvalidImageFormatDescriptor,
            Error::InvalidValue => UrResult::ErrorInvalidValue,
            Error::InvalidSize => UrResult::ErrorInvalidSize,
            Error::InvalidMemObject => UrResult::ErrorInvalidMemObject,
            Error::InvalidNullPointer => UrResult::ErrorInvalidNullPointer,
            Error::UnsupportedEnumeration => UrResult::ErrorUnsupportedEnumeration,
            Error::UnsupportedFeature => UrResult::ErrorUnsupportedFeature,
            Error::OutOfHostMemory => UrResult::ErrorOutOfHostMemory,
            Error::OutOfDeviceMemory => UrResult::ErrorOutOfDeviceMemory,
            Error::OutOfResources => UrResult::ErrorOutOfResources,
            Error::InvalidDevice => UrResult::ErrorInvalidDevice,
            Error::DeviceLost => UrResult::ErrorDeviceLost,
            Error::Unknown => UrResult::ErrorUnknown,
        }
    }
}

/// Collapse an operation result into a status code
pub fn status<T>(r: Result<T, Error>) -> UrResult {
    match r {
        Ok(_) => UrResult::Success,
        Err(e) => e.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_roundtrip_known_codes() {
        for code in [
            UrResult::Success,
            UrResult::ErrorInvalidBufferSize,
            UrResult::ErrorUnsupportedEnumeration,
            UrResult::ErrorInvalidEnumeration,
        ] {
            assert_eq!(UrResult::from_raw(code.as_raw()), code);
        }
        assert_eq!(UrResult::from_raw(-12345), UrResult::ErrorUnknown);
    }

    #[test]
    fn test_status() {
        assert_eq!(status(Ok::<u32, Error>(3)), UrResult::Success);
        assert_eq!(
            status::<()>(Err(Error::InvalidHostPtr)),
            UrResult::ErrorInvalidHostPtr
        );
        assert_eq!(
            UrResult::from(Error::UnsupportedFeature).to_string(),
            "UR_RESULT_ERROR_UNSUPPORTED_FEATURE"
        );
    }
}
