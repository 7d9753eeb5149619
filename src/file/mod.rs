//! Byte access and PE image location.
//!
//! This module owns the raw input of the decoder. A WinMD file is obtained exactly once, either
//! by memory-mapping it from disk or by taking ownership of an in-memory buffer, and is then
//! shared through cheap [`ByteView`] handles. No other part of the crate performs I/O.
//!
//! # Key Components
//!
//! - [`Backend`] - Trait abstracting over the source of the bytes
//! - [`ByteView`] - Shareable, offset-addressable window into a backend
//! - [`image::Image`] - DOS/PE header validation and RVA translation
//! - [`parser::Parser`] - Sequential cursor used by the header parsers
//! - [`io`] - Little-endian primitive reads
//!
//! # Examples
//!
//! ```rust
//! use winmd::ByteView;
//!
//! let view = ByteView::from_mem(vec![0x05, b'h', b'e', b'l', b'l', b'o', 0x34, 0x12]);
//! let (len, header) = view.read_compressed_len(0)?;
//! assert_eq!((len, header), (5, 1));
//!
//! let tail = view.subview(6, 2)?;
//! assert_eq!(tail.read_le::<u16>(0)?, 0x1234);
//! # Ok::<(), winmd::Error>(())
//! ```

pub mod image;
pub mod io;
pub mod parser;

mod memory;
mod physical;

use std::{fmt, path::Path, sync::Arc};

use crate::{
    file::{io::MetadataIO, parser::Parser},
    Result,
};
use memory::Memory;
use physical::Physical;

/// Backend trait for file data sources.
///
/// This trait abstracts over the source of the input bytes, allowing for both in-memory and
/// on-disk representations. All implementations must be thread-safe so that a decoded database
/// can be shared across threads.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Arguments
    ///
    /// * `offset` - The starting offset within the data.
    /// * `len` - The length of the slice in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::BadImageFormat`] if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;
}

/// A shareable, bounds-checked window into an immutable byte buffer.
///
/// Cloning a `ByteView` or taking a [`ByteView::subview`] never copies the underlying bytes;
/// all views derived from one input share the same [`Backend`].
#[derive(Clone)]
pub struct ByteView {
    backend: Arc<dyn Backend>,
    offset: usize,
    len: usize,
}

impl ByteView {
    /// Create a view over an owned in-memory buffer.
    #[must_use]
    pub fn from_mem(data: Vec<u8>) -> ByteView {
        ByteView::new(Memory::new(data))
    }

    /// Create a view over a memory-mapped file.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<ByteView> {
        Ok(ByteView::new(Physical::new(path)?))
    }

    fn new<T: Backend + 'static>(backend: T) -> ByteView {
        let len = backend.len();
        ByteView {
            backend: Arc::new(backend),
            offset: 0,
            len,
        }
    }

    /// Length of this view in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the view covers no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute offset of this view within the underlying buffer.
    #[must_use]
    pub fn base_offset(&self) -> usize {
        self.offset
    }

    /// The bytes covered by this view.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        // offset and len were bounds-checked when the view was created
        &self.backend.data()[self.offset..self.offset + self.len]
    }

    /// Borrow `len` bytes starting at `offset`, relative to this view.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the range is not inside the view.
    pub fn slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(end) = offset.checked_add(len) else {
            return Err(bad_image_format!("Range {}+{} overflows", offset, len));
        };

        if end > self.len {
            return Err(bad_image_format!(
                "Range {}..{} exceeds view of {} bytes",
                offset,
                end,
                self.len
            ));
        }

        self.backend.data_slice(self.offset + offset, len)
    }

    /// Create a new view over `len` bytes starting at `offset`, relative to this view.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the range is not inside the view.
    pub fn subview(&self, offset: usize, len: usize) -> Result<ByteView> {
        self.slice(offset, len)?;

        Ok(ByteView {
            backend: Arc::clone(&self.backend),
            offset: self.offset + offset,
            len,
        })
    }

    /// Read a little-endian `T` at `offset`, relative to this view.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the read crosses the end of the view.
    pub fn read_le<T: MetadataIO>(&self, offset: usize) -> Result<T> {
        let mut offset = offset;
        io::read_le_at::<T>(self.data(), &mut offset)
    }

    /// Decode the compressed length prefix used by the `#Blob` heap at `offset`.
    ///
    /// Returns the decoded length and the number of header bytes (1, 2 or 4) it occupied.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the prefix is invalid or truncated.
    pub fn read_compressed_len(&self, offset: usize) -> Result<(u32, usize)> {
        let mut parser = Parser::new(self.data());
        parser.seek(offset)?;

        let len = parser.read_compressed_uint()?;
        Ok((len, parser.pos() - offset))
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteView")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}
