//! # Format Translation
//!
//! Maps portable channel types onto native array formats and back, and
//! builds native array descriptors from portable image descriptors.

use basalt_core::{Error, ImageChannelOrder, ImageChannelType, ImageDesc, ImageFormat, MemType, Result};
use basalt_hal::{ArrayDescriptor, ArrayFormat};

/// Channels per pixel; only RGBA images are built
pub const CHANNELS: u32 = 4;

/// Native format for a portable channel type
pub fn to_native(channel_type: ImageChannelType) -> Result<ArrayFormat> {
    use ImageChannelType as T;

    match channel_type {
        T::UnormInt8 | T::UnsignedInt8 => Ok(ArrayFormat::UnsignedInt8),
        T::SignedInt8 => Ok(ArrayFormat::SignedInt8),
        T::UnormInt16 | T::UnsignedInt16 => Ok(ArrayFormat::UnsignedInt16),
        T::SignedInt16 => Ok(ArrayFormat::SignedInt16),
        T::HalfFloat => Ok(ArrayFormat::Half),
        T::UnsignedInt32 => Ok(ArrayFormat::UnsignedInt32),
        T::SignedInt32 => Ok(ArrayFormat::SignedInt32),
        T::Float => Ok(ArrayFormat::Float),
        _ => Err(Error::InvalidImageFormatDescriptor),
    }
}

/// Portable channel type for a native format
///
/// Normalized types collapse onto their integer formats on the way in, so
/// the reverse mapping reports the integer type.
pub const fn from_native(format: ArrayFormat) -> ImageChannelType {
    match format {
        ArrayFormat::UnsignedInt8 => ImageChannelType::UnsignedInt8,
        ArrayFormat::UnsignedInt16 => ImageChannelType::UnsignedInt16,
        ArrayFormat::UnsignedInt32 => ImageChannelType::UnsignedInt32,
        ArrayFormat::SignedInt8 => ImageChannelType::SignedInt8,
        ArrayFormat::SignedInt16 => ImageChannelType::SignedInt16,
        ArrayFormat::SignedInt32 => ImageChannelType::SignedInt32,
        ArrayFormat::Half => ImageChannelType::HalfFloat,
        ArrayFormat::Float => ImageChannelType::Float,
    }
}

/// Portable RGBA format for a native format
pub const fn image_format(format: ArrayFormat) -> ImageFormat {
    ImageFormat::new(ImageChannelOrder::RGBA, from_native(format))
}

/// Bytes per RGBA pixel
pub const fn pixel_size(format: ArrayFormat) -> usize {
    format.element_size() * CHANNELS as usize
}

/// Native array descriptor for a portable image descriptor
///
/// Portable descriptors use 1 for unused dimensions; native ones use 0.
pub fn array_descriptor(desc: &ImageDesc, format: ArrayFormat) -> ArrayDescriptor {
    let (height, depth) = match desc.mem_type {
        MemType::Image1D => (0, 0),
        MemType::Image2D => (desc.height, 0),
        _ => (desc.height, desc.depth),
    };

    ArrayDescriptor {
        width: desc.width,
        height,
        depth,
        format,
        num_channels: CHANNELS,
        flags: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_types_round_trip() {
        let exact = [
            ImageChannelType::UnsignedInt8,
            ImageChannelType::UnsignedInt16,
            ImageChannelType::UnsignedInt32,
            ImageChannelType::SignedInt8,
            ImageChannelType::SignedInt16,
            ImageChannelType::SignedInt32,
            ImageChannelType::HalfFloat,
            ImageChannelType::Float,
        ];
        for ty in exact {
            assert_eq!(from_native(to_native(ty).unwrap()), ty);
        }
    }

    #[test]
    fn test_normalized_collapse() {
        assert_eq!(
            to_native(ImageChannelType::UnormInt8),
            Ok(ArrayFormat::UnsignedInt8)
        );
        assert_eq!(
            from_native(to_native(ImageChannelType::UnormInt16).unwrap()),
            ImageChannelType::UnsignedInt16
        );
    }

    #[test]
    fn test_unmapped_types() {
        for ty in [
            ImageChannelType::SnormInt8,
            ImageChannelType::SnormInt16,
            ImageChannelType::UnormShort565,
            ImageChannelType::UnormShort555,
            ImageChannelType::Int101010,
        ] {
            assert_eq!(to_native(ty), Err(Error::InvalidImageFormatDescriptor));
        }
    }

    #[test]
    fn test_descriptor_zeroes_unused_dimensions() {
        let d1 = array_descriptor(&ImageDesc::new_1d(8), ArrayFormat::Float);
        assert_eq!((d1.width, d1.height, d1.depth), (8, 0, 0));

        let d2 = array_descriptor(&ImageDesc::new_2d(8, 4), ArrayFormat::Float);
        assert_eq!((d2.width, d2.height, d2.depth), (8, 4, 0));

        let d3 = array_descriptor(&ImageDesc::new_3d(8, 4, 2), ArrayFormat::Half);
        assert_eq!((d3.width, d3.height, d3.depth), (8, 4, 2));
        assert_eq!(d3.num_channels, 4);
        assert_eq!(pixel_size(ArrayFormat::Half), 8);
    }
}
