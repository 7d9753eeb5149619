//! Little-endian primitive reads over byte slices.
//!
//! Every structure in a WinMD image is stored little-endian. The helpers in this module perform
//! bounds-checked reads at an offset and are used by every parser in the crate, from the PE
//! locator down to single table fields.
//!
//! # Key Components
//!
//! - [`MetadataIO`] - Trait implemented by all primitive integers that can be read from metadata
//! - [`read_le`] / [`read_le_at`] - Fixed-width reads, the latter advancing an offset
//! - [`read_le_sized`] - 1, 2 or 4 byte unsigned read used for table fields

use crate::Result;

/// Trait for primitive types that can be decoded from little-endian metadata bytes.
pub trait MetadataIO: Sized {
    /// Fixed-size byte array matching the in-memory size of the type
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Decode the value from its little-endian byte representation
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_metadata_io {
    ($($ty:ty),* $(,)?) => {
        $(
            impl MetadataIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_metadata_io!(u8, u16, u32, u64);

/// Read a `T` from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::BadImageFormat`] if `data` is shorter than `T`.
pub fn read_le<T: MetadataIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Read a `T` at `offset` and advance `offset` past it.
///
/// # Errors
/// Returns [`crate::Error::BadImageFormat`] if the read would cross the end of `data`.
pub fn read_le_at<T: MetadataIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(bad_image_format!("Read offset overflow at {}", offset));
    };

    if end > data.len() {
        return Err(bad_image_format!(
            "Read of {} bytes at offset {} exceeds buffer of {} bytes",
            type_len,
            offset,
            data.len()
        ));
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(bad_image_format!("Failed to read {} bytes at {}", type_len, offset));
    };

    *offset = end;
    Ok(T::from_le_bytes(read))
}

/// Read an unsigned value of `width` bytes at `offset`.
///
/// Table columns are always 1, 2 or 4 bytes wide. Any other width can only come from a broken
/// static schema and is treated as an invariant violation.
///
/// # Errors
/// Returns [`crate::Error::BadImageFormat`] if the read would cross the end of `data`.
///
/// # Panics
/// Panics if `width` is not 1, 2 or 4.
pub fn read_le_sized(data: &[u8], offset: usize, width: u8) -> Result<u32> {
    let mut offset = offset;
    match width {
        1 => Ok(u32::from(read_le_at::<u8>(data, &mut offset)?)),
        2 => Ok(u32::from(read_le_at::<u16>(data, &mut offset)?)),
        4 => read_le_at::<u32>(data, &mut offset),
        _ => unreachable!("column width {width} is outside of {{1, 2, 4}}"),
    }
}
