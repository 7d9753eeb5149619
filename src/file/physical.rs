//! Physical file backend for memory-mapped I/O.
//!
//! [`Physical`] implements [`crate::file::Backend`] by mapping a file from disk into the address
//! space of the process. The mapping is established once when the database is opened; all
//! subsequent decoding happens on the mapped bytes without further I/O.

use super::Backend;
use crate::Result;

use memmap2::Mmap;
use std::{fs, path::Path};

/// Input file backed by a read-only memory map
#[derive(Debug)]
pub struct Physical {
    data: Mmap,
}

impl Physical {
    /// Map the file at `path` into memory.
    ///
    /// ## Arguments
    /// * 'path' - The file to map
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = fs::File::open(path)?;

        // SAFETY: the map is read-only and lives exactly as long as the backend
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file) }?;

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(bad_image_format!("Range {}+{} overflows", offset, len));
        };

        if offset_end > self.data.len() {
            return Err(bad_image_format!(
                "Range {}..{} exceeds file of {} bytes",
                offset,
                offset_end,
                self.data.len()
            ));
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}
