//! # Typed Property Return
//!
//! Writes a typed query result into a caller-provided byte buffer.

use crate::error::{Error, Result};

/// Destination of an info query
///
/// Either slot may be absent, but not both. The value slot must hold at
/// least `size_of::<T>()` bytes; the size slot always receives
/// `size_of::<T>()`.
#[derive(Debug)]
pub struct PropertyWriter<'a> {
    value: Option<&'a mut [u8]>,
    size_ret: Option<&'a mut usize>,
}

impl<'a> PropertyWriter<'a> {
    /// Create a writer over the caller's slots
    pub fn new(value: Option<&'a mut [u8]>, size_ret: Option<&'a mut usize>) -> Result<Self> {
        if value.is_none() && size_ret.is_none() {
            return Err(Error::InvalidNullPointer);
        }
        Ok(Self { value, size_ret })
    }

    /// Write `v` into the caller's slots
    pub fn write<T: bytemuck::Pod>(self, v: T) -> Result<()> {
        let bytes = bytemuck::bytes_of(&v);

        if let Some(out) = self.value {
            if out.len() < bytes.len() {
                return Err(Error::InvalidSize);
            }
            out[..bytes.len()].copy_from_slice(bytes);
        }

        if let Some(size) = self.size_ret {
            *size = bytes.len();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_value_and_size() {
        let mut buf = [0u8; 8];
        let mut size = 0usize;
        PropertyWriter::new(Some(&mut buf[..]), Some(&mut size))
            .unwrap()
            .write(0x1234_5678u32)
            .unwrap();
        assert_eq!(size, 4);
        assert_eq!(u32::from_ne_bytes([buf[0], buf[1], buf[2], buf[3]]), 0x1234_5678);
    }

    #[test]
    fn test_size_only() {
        let mut size = 0usize;
        PropertyWriter::new(None, Some(&mut size))
            .unwrap()
            .write(7u64)
            .unwrap();
        assert_eq!(size, 8);
    }

    #[test]
    fn test_too_small() {
        let mut buf = [0u8; 2];
        let r = PropertyWriter::new(Some(&mut buf[..]), None).unwrap().write(1u64);
        assert_eq!(r, Err(Error::InvalidSize));
        assert_eq!(buf, [0, 0]);
    }

    #[test]
    fn test_no_slots() {
        assert_eq!(PropertyWriter::new(None, None).err(), Some(Error::InvalidNullPointer));
    }
}
