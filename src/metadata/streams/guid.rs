//! GUID Heap (`#GUID`)
//!
//! A sequence of 16-byte GUIDs, addressed by a 1-based index. WinMD files use it for the module
//! version id (`Module.Mvid`).
//!
//! # Reference
//! - [ECMA-335 II.24.2.5](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{Error, Result};

/// Size of a single record in the `#GUID` heap
const GUID_SIZE: usize = 16;

/// '#GUID' is a heap, which contains a sequence of 128-bit GUIDs
///
/// # Examples
///
/// ```rust
/// use winmd::metadata::streams::GuidHeap;
///
/// let mut data = [0u8; 32];
/// data[16] = 0xAA;
/// let guids = GuidHeap::from(&data)?;
///
/// assert_eq!(guids.len(), 2);
/// assert_eq!(guids.get(2)?.to_bytes()[0], 0xAA);
/// assert!(guids.get(0).is_err());
/// # Ok::<(), winmd::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GuidHeap<'a> {
    data: &'a [u8],
}

impl<'a> GuidHeap<'a> {
    /// Create a `GuidHeap` from a sequence of bytes
    ///
    /// # Arguments
    /// * 'data' - The bytes of the stream
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the heap size is not a multiple of 16
    pub fn from(data: &'a [u8]) -> Result<GuidHeap<'a>> {
        if data.len() % GUID_SIZE != 0 {
            return Err(bad_image_format!(
                "#GUID heap size {} is not a multiple of {}",
                data.len(),
                GUID_SIZE
            ));
        }

        Ok(GuidHeap { data })
    }

    /// Returns the GUID at the specified 1-based index
    ///
    /// ## Arguments
    /// * 'index' - The index of the GUID, as stored in a GUID-heap column
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidIndex`] for index 0 and for indices past the heap
    pub fn get(&self, index: usize) -> Result<uguid::Guid> {
        if index == 0 {
            return Err(Error::InvalidIndex(
                "#GUID index 0 does not name a GUID".to_string(),
            ));
        }

        let range = (index - 1)
            .checked_mul(GUID_SIZE)
            .and_then(|start| Some(start..start.checked_add(GUID_SIZE)?));
        let Some(bytes) = range.and_then(|range| self.data.get(range)) else {
            return Err(Error::InvalidIndex(format!(
                "#GUID index {} outside of heap with {} entries",
                index,
                self.len()
            )));
        };

        let mut buffer = [0u8; GUID_SIZE];
        buffer.copy_from_slice(bytes);

        Ok(uguid::Guid::from_bytes(buffer))
    }

    /// Number of GUIDs in the heap.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / GUID_SIZE
    }

    /// Returns `true` if the heap holds no GUIDs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
