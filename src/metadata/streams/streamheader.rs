use crate::{file::io::read_le, Result};

/// Longest stream name allowed, without the terminator
const MAX_STREAM_NAME_LEN: usize = 32;

/// An entry of the metadata root's stream directory.
///
/// Offsets are relative to the start of the metadata root. On disk the name is a nul-terminated
/// ASCII string padded with further nul bytes to the next 4-byte boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    /// Offset of the stream, relative to the metadata root
    pub offset: u32,
    /// Size of the stream in bytes
    pub size: u32,
    /// Name of the stream, e.g. `#~` or `#Strings`
    pub name: String,
}

impl StreamHeader {
    /// Create a `StreamHeader` from a sequence of bytes
    ///
    /// ## Arguments
    /// * 'data' - The byte slice starting at the header
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the header is truncated, its name is not
    /// terminated within 32 characters, or the name is not ASCII.
    pub fn from(data: &[u8]) -> Result<StreamHeader> {
        if data.len() < 9 {
            return Err(bad_image_format!(
                "Stream header truncated - {} bytes available",
                data.len()
            ));
        }

        let name_bytes = &data[8..];
        let Some(name_len) = name_bytes
            .iter()
            .take(MAX_STREAM_NAME_LEN + 1)
            .position(|byte| *byte == 0)
        else {
            return Err(bad_image_format!(
                "Stream header name is not terminated within {} characters",
                MAX_STREAM_NAME_LEN
            ));
        };

        let name = &name_bytes[..name_len];
        if !name.is_ascii() {
            return Err(bad_image_format!(
                "Stream header name is not ASCII - {:?}",
                name
            ));
        }

        Ok(StreamHeader {
            offset: read_le::<u32>(data)?,
            size: read_le::<u32>(&data[4..])?,
            name: String::from_utf8_lossy(name).into_owned(),
        })
    }

    /// Number of bytes this header occupies on disk, including the padded name.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        8 + ((self.name.len() + 1 + 3) & !3)
    }
}
