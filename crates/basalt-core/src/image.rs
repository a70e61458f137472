//! # Portable Image Descriptors
//!
//! Runtime-side image format and descriptor types. Nothing here knows the
//! native pixel formats; translation lives with the memory objects.

use crate::error::Error;

// =============================================================================
// STRUCTURE TAGS
// =============================================================================

/// Tag carried by runtime descriptor structs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum StructureType {
    /// Host pointer bundle for buffer creation
    BufferProperties = 0x16,
    /// Sub-buffer region
    BufferRegion = 0x17,
    /// Image descriptor
    ImageDesc = 0x14,
    /// Native-handle import properties
    MemNativeProperties = 0x18,
}

// =============================================================================
// MEMORY TYPE
// =============================================================================

/// Kind of memory object, in portable enumeration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum MemType {
    /// Linear buffer
    Buffer = 0,
    /// 2D image
    Image2D = 1,
    /// 3D image
    Image3D = 2,
    /// Array of 2D images
    Image2DArray = 3,
    /// 1D image
    Image1D = 4,
    /// Array of 1D images
    Image1DArray = 5,
    /// 1D image backed by a buffer
    Image1DBuffer = 6,
}

impl MemType {
    /// Number of used dimensions for the image types this adapter builds
    pub const fn dimensions(self) -> Option<u32> {
        match self {
            Self::Image1D => Some(1),
            Self::Image2D => Some(2),
            Self::Image3D => Some(3),
            _ => None,
        }
    }
}

// =============================================================================
// CHANNEL ORDER / TYPE
// =============================================================================

/// Portable channel order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
#[allow(missing_docs)]
pub enum ImageChannelOrder {
    A = 0,
    R = 1,
    RG = 2,
    RA = 3,
    RGB = 4,
    RGBA = 5,
    BGRA = 6,
    ARGB = 7,
    ABGR = 8,
    Intensity = 9,
    Luminance = 10,
    RX = 11,
    RGX = 12,
    RGBX = 13,
    SRGBA = 14,
}

/// Portable per-channel data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ImageChannelType {
    /// Normalized signed 8-bit
    SnormInt8 = 0,
    /// Normalized signed 16-bit
    SnormInt16 = 1,
    /// Normalized unsigned 8-bit
    UnormInt8 = 2,
    /// Normalized unsigned 16-bit
    UnormInt16 = 3,
    /// Packed 5-6-5
    UnormShort565 = 4,
    /// Packed 5-5-5
    UnormShort555 = 5,
    /// Packed 10-10-10
    Int101010 = 6,
    /// Signed 8-bit integer
    SignedInt8 = 7,
    /// Signed 16-bit integer
    SignedInt16 = 8,
    /// Signed 32-bit integer
    SignedInt32 = 9,
    /// Unsigned 8-bit integer
    UnsignedInt8 = 10,
    /// Unsigned 16-bit integer
    UnsignedInt16 = 11,
    /// Unsigned 32-bit integer
    UnsignedInt32 = 12,
    /// 16-bit float
    HalfFloat = 13,
    /// 32-bit float
    Float = 14,
}

/// Portable image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageFormat {
    /// Channel order
    pub channel_order: ImageChannelOrder,
    /// Channel data type
    pub channel_type: ImageChannelType,
}

impl ImageFormat {
    /// Create a new image format
    pub const fn new(channel_order: ImageChannelOrder, channel_type: ImageChannelType) -> Self {
        Self {
            channel_order,
            channel_type,
        }
    }

    /// Raw form for property return
    pub const fn to_raw(self) -> RawImageFormat {
        RawImageFormat {
            channel_order: self.channel_order as u32,
            channel_type: self.channel_type as u32,
        }
    }
}

/// Plain-data image format as written into caller buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct RawImageFormat {
    /// [`ImageChannelOrder`] discriminant
    pub channel_order: u32,
    /// [`ImageChannelType`] discriminant
    pub channel_type: u32,
}

// =============================================================================
// IMAGE DESCRIPTOR
// =============================================================================

/// Portable image descriptor
///
/// Unused dimensions are 1 on this side of the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDesc {
    /// Structure tag, must be [`StructureType::ImageDesc`]
    pub stype: StructureType,
    /// Image dimensionality
    pub mem_type: MemType,
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Depth in pixels
    pub depth: usize,
    /// Layers for array types
    pub array_size: usize,
    /// Row pitch of the host data in bytes
    pub row_pitch: usize,
    /// Slice pitch of the host data in bytes
    pub slice_pitch: usize,
    /// Mip level count
    pub num_mip_level: u32,
    /// Sample count
    pub num_samples: u32,
}

impl ImageDesc {
    /// Descriptor for a 1D image
    pub const fn new_1d(width: usize) -> Self {
        Self::new(MemType::Image1D, width, 1, 1)
    }

    /// Descriptor for a 2D image
    pub const fn new_2d(width: usize, height: usize) -> Self {
        Self::new(MemType::Image2D, width, height, 1)
    }

    /// Descriptor for a 3D image
    pub const fn new_3d(width: usize, height: usize, depth: usize) -> Self {
        Self::new(MemType::Image3D, width, height, depth)
    }

    const fn new(mem_type: MemType, width: usize, height: usize, depth: usize) -> Self {
        Self {
            stype: StructureType::ImageDesc,
            mem_type,
            width,
            height,
            depth,
            array_size: 1,
            row_pitch: 0,
            slice_pitch: 0,
            num_mip_level: 0,
            num_samples: 0,
        }
    }
}

// =============================================================================
// INFO QUERIES
// =============================================================================

/// Memory object property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MemInfo {
    /// Allocation size in bytes (`usize`)
    Size = 0,
    /// Owning context handle (`u64`)
    Context = 1,
}

impl TryFrom<u32> for MemInfo {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self, Error> {
        match raw {
            0 => Ok(Self::Size),
            1 => Ok(Self::Context),
            _ => Err(Error::InvalidEnumeration),
        }
    }
}

/// Image property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ImageInfo {
    /// Image format ([`RawImageFormat`])
    Format = 0,
    /// Bytes per channel element (`usize`)
    ElementSize = 1,
    /// Row pitch (unsupported)
    RowPitch = 2,
    /// Slice pitch (unsupported)
    SlicePitch = 3,
    /// Width (`usize`)
    Width = 4,
    /// Height (`usize`)
    Height = 5,
    /// Depth (`usize`)
    Depth = 6,
}

impl TryFrom<u32> for ImageInfo {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self, Error> {
        match raw {
            0 => Ok(Self::Format),
            1 => Ok(Self::ElementSize),
            2 => Ok(Self::RowPitch),
            3 => Ok(Self::SlicePitch),
            4 => Ok(Self::Width),
            5 => Ok(Self::Height),
            6 => Ok(Self::Depth),
            _ => Err(Error::InvalidEnumeration),
        }
    }
}
