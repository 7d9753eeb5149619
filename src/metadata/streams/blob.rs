//! Blob Heap (`#Blob`)
//!
//! Provides access to the `#Blob` heap, which stores length-prefixed binary data such as
//! signatures, constant values, custom attribute arguments and public keys. The bytes are handed
//! out raw; interpreting a signature is left to the caller.
//!
//! # Reference
//! - [ECMA-335 II.24.2.4](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{file::parser::Parser, Error, Result};

/// '#Blob' points to runs of bytes. Each entry referenced from a table starts with its length,
/// encoded in the first one, two or four bytes:
///
/// * If the first byte is `0bbbbbbb`, the blob holds `bbbbbbb` bytes of data.
/// * If the first two bytes are `10bbbbbb` and `x`, the blob holds `(bbbbbb << 8) + x` bytes.
/// * If the first four bytes are `110bbbbb`, `x`, `y` and `z`, the blob holds
///   `(bbbbb << 24) + (x << 16) + (y << 8) + z` bytes.
///
/// Any other prefix is a format error.
///
/// # Examples
///
/// ```rust
/// use winmd::metadata::streams::BlobsHeap;
///
/// let data = &[0u8, 0x03, 0x41, 0x42, 0x43];
/// let blobs = BlobsHeap::from(data)?;
/// assert_eq!(blobs.get(1)?, &[0x41, 0x42, 0x43]);
/// # Ok::<(), winmd::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BlobsHeap<'a> {
    data: &'a [u8],
}

impl<'a> BlobsHeap<'a> {
    /// Create a `BlobsHeap` from a sequence of bytes
    ///
    /// # Arguments
    /// * 'data' - The bytes of the stream
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the data is empty or doesn't start with the
    /// empty blob
    pub fn from(data: &'a [u8]) -> Result<BlobsHeap<'a>> {
        if data.first() != Some(&0) {
            return Err(bad_image_format!("#Blob heap must start with the empty blob"));
        }

        Ok(BlobsHeap { data })
    }

    /// Get the bytes of the blob starting at `offset`, without its length prefix.
    ///
    /// ## Arguments
    /// * 'offset' - The offset within the heap, as stored in a blob-heap column
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidIndex`] if the offset lies outside the heap, and
    /// [`crate::Error::BadImageFormat`] if the length prefix is invalid or the blob runs past the
    /// end of the heap.
    pub fn get(&self, offset: usize) -> Result<&'a [u8]> {
        if offset >= self.data.len() {
            return Err(Error::InvalidIndex(format!(
                "#Blob offset {} outside of heap with {} bytes",
                offset,
                self.data.len()
            )));
        }

        read_entry(self.data, offset).map(|(blob, _)| blob)
    }

    /// Iterate all blobs in heap order, yielding each blob's offset and bytes.
    ///
    /// The empty blob at offset 0 is skipped. Iteration stops after the first error.
    #[must_use]
    pub fn iter(&self) -> BlobIterator<'a> {
        BlobIterator {
            data: self.data,
            position: 1,
        }
    }

    /// Size of the heap in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the heap holds no bytes. Never the case for a successfully created heap.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Decode the entry at `offset`, returning its bytes and the offset of the following entry
fn read_entry(data: &[u8], offset: usize) -> Result<(&[u8], usize)> {
    let mut parser = Parser::new(data);
    parser.seek(offset)?;

    let len = parser.read_compressed_uint()? as usize;
    let blob = parser.read_bytes(len)?;
    Ok((blob, parser.pos()))
}

/// Iterator over the entries of a [`BlobsHeap`], see [`BlobsHeap::iter`].
pub struct BlobIterator<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Iterator for BlobIterator<'a> {
    type Item = Result<(usize, &'a [u8])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.data.len() {
            return None;
        }

        let start = self.position;
        match read_entry(self.data, start) {
            Ok((blob, next)) => {
                self.position = next;
                Some(Ok((start, blob)))
            }
            Err(error) => {
                self.position = self.data.len();
                Some(Err(error))
            }
        }
    }
}
