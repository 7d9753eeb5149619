//! Sequential cursor over metadata bytes.
//!
//! [`Parser`] wraps a byte slice together with a position and offers the reads needed by the
//! header parsers: fixed-width little-endian integers, ECMA-335 compressed unsigned integers
//! (II.23.2) and nul-terminated strings.

use crate::{
    file::io::{read_le_at, MetadataIO},
    Result,
};

/// A cursor over a borrowed byte slice.
///
/// # Examples
///
/// ```rust
/// use winmd::Parser;
///
/// let data = [0x05, 0x34, 0x12, b'#', b'~', 0x00];
/// let mut parser = Parser::new(&data);
///
/// assert_eq!(parser.read_compressed_uint()?, 5);
/// assert_eq!(parser.read_le::<u16>()?, 0x1234);
/// assert_eq!(parser.read_string_utf8()?, "#~");
/// # Ok::<(), winmd::Error>(())
/// ```
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Total length of the underlying data.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the underlying data is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there are bytes left to read.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the cursor to an absolute position.
    ///
    /// Seeking to exactly the end is allowed, any further is not.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if `pos` is past the end of the data.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(bad_image_format!(
                "Seek to {} past end of data ({} bytes)",
                pos,
                self.data.len()
            ));
        }

        self.position = pos;
        Ok(())
    }

    /// Move the cursor forward by `step` bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the step would move past the end of the data.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        match self.position.checked_add(step) {
            Some(end) if end <= self.data.len() => {
                self.position = end;
                Ok(())
            }
            _ => Err(bad_image_format!(
                "Advancing {} bytes from {} exceeds data ({} bytes)",
                step,
                self.position,
                self.data.len()
            )),
        }
    }

    /// Current position of the cursor.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// The complete underlying data, independent of the cursor.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Peek at the next byte without consuming it.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] at the end of the data.
    pub fn peek_byte(&self) -> Result<u8> {
        match self.data.get(self.position) {
            Some(byte) => Ok(*byte),
            None => Err(bad_image_format!("Peek past end of data at {}", self.position)),
        }
    }

    /// Read a little-endian `T` and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if not enough data is left.
    pub fn read_le<T: MetadataIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read `len` raw bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if not enough data is left.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let start = self.position;
        self.advance_by(len)?;
        Ok(&self.data[start..self.position])
    }

    /// Read an ECMA-335 compressed unsigned integer (II.23.2).
    ///
    /// - `0xxxxxxx` - 1 byte, 7-bit value
    /// - `10xxxxxx xxxxxxxx` - 2 bytes, 14-bit value
    /// - `110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx` - 4 bytes, 29-bit value
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] for an invalid leading byte or truncated data.
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let first_byte = self.read_le::<u8>()?;

        // 1-byte encoding: 0xxxxxxx
        if (first_byte & 0x80) == 0 {
            return Ok(u32::from(first_byte));
        }

        // 2-byte encoding: 10xxxxxx xxxxxxxx
        if (first_byte & 0xC0) == 0x80 {
            let second_byte = self.read_le::<u8>()?;
            let value = ((u32::from(first_byte) & 0x3F) << 8) | u32::from(second_byte);
            return Ok(value);
        }

        // 4-byte encoding: 110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx
        if (first_byte & 0xE0) == 0xC0 {
            let b1 = u32::from(self.read_le::<u8>()?);
            let b2 = u32::from(self.read_le::<u8>()?);
            let b3 = u32::from(self.read_le::<u8>()?);
            let value = ((u32::from(first_byte) & 0x1F) << 24) | (b1 << 16) | (b2 << 8) | b3;
            return Ok(value);
        }

        Err(bad_image_format!(
            "Invalid compressed uint - 0x{:02X}",
            first_byte
        ))
    }

    /// Read a nul-terminated UTF-8 string, borrowing it from the data.
    ///
    /// The cursor is left directly behind the terminator.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if no terminator is found or the bytes are not
    /// valid UTF-8.
    pub fn read_string_utf8(&mut self) -> Result<&'a str> {
        let start = self.position;
        let Some(terminator) = self.data[start..].iter().position(|byte| *byte == 0) else {
            return Err(bad_image_format!(
                "Unterminated string at offset {}",
                start
            ));
        };

        let end = start + terminator;
        self.position = end + 1;

        std::str::from_utf8(&self.data[start..end]).map_err(|e| {
            bad_image_format!(
                "Invalid UTF-8 string at offset {}-{}: {}",
                start,
                end,
                e
            )
        })
    }
}
