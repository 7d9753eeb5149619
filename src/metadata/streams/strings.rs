//! String Heap (`#Strings`)
//!
//! The `#Strings` heap stores the identifiers referenced by metadata tables (type names,
//! namespaces, member names) as nul-terminated UTF-8. Tables refer to an entry by its byte offset.
//!
//! # Reference
//! - [ECMA-335 II.24.2.3](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{file::parser::Parser, Error, Result};

/// '#Strings' holds identifiers which are referenced from the metadata tables, e.g. the names of
/// types, methods and fields.
///
/// Lookups borrow from the heap, no string is copied.
///
/// # Examples
///
/// ```rust
/// use winmd::metadata::streams::StringsHeap;
///
/// let data = &[0u8, b'H', b'e', b'l', b'l', b'o', 0u8];
/// let strings = StringsHeap::from(data)?;
/// assert_eq!(strings.get(1)?, "Hello");
/// assert_eq!(strings.get(0)?, "");
/// # Ok::<(), winmd::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StringsHeap<'a> {
    data: &'a [u8],
}

impl<'a> StringsHeap<'a> {
    /// Create a `StringsHeap` from a sequence of bytes
    ///
    /// # Arguments
    /// * 'data' - The bytes of the stream
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the heap is empty or does not start with the
    /// empty string.
    pub fn from(data: &'a [u8]) -> Result<StringsHeap<'a>> {
        if data.first() != Some(&0) {
            return Err(bad_image_format!(
                "#Strings heap must start with the empty string"
            ));
        }

        Ok(StringsHeap { data })
    }

    /// Get the string starting at `offset`.
    ///
    /// ## Arguments
    /// * 'offset' - The offset within the heap, as stored in a string-heap column
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidIndex`] if the offset lies outside the heap, and
    /// [`crate::Error::BadImageFormat`] if the string is unterminated or not valid UTF-8.
    pub fn get(&self, offset: usize) -> Result<&'a str> {
        if offset >= self.data.len() {
            return Err(Error::InvalidIndex(format!(
                "#Strings offset {} outside of heap with {} bytes",
                offset,
                self.data.len()
            )));
        }

        let mut parser = Parser::new(self.data);
        parser.seek(offset)?;
        parser.read_string_utf8()
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
