//! Metadata root parsing.
//!
//! The metadata root (ECMA-335 II.24.2.1) is the entry point of the CLI metadata. It starts with
//! the `BSJB` signature, carries the runtime version string and is followed by the stream
//! directory, which lists the `#~`, `#Strings`, `#Blob`, `#GUID` and `#US` streams.
//!
//! # Layout
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 4 | Signature (`0x424A5342`) |
//! | 4 | 2 | MajorVersion |
//! | 6 | 2 | MinorVersion |
//! | 8 | 4 | Reserved |
//! | 12 | 4 | Length of the version string |
//! | 16 | Length | Version string, nul padded |
//! | 16 + Length | 2 | Flags |
//! | 18 + Length | 2 | Number of streams |
//! | 20 + Length | ... | Stream headers |

use std::collections::HashSet;

use log::debug;

use crate::{
    file::io::{read_le, read_le_at},
    metadata::streams::StreamHeader,
    Error, Result,
};

/// The magic signature of the metadata root, `BSJB` when read as bytes
pub const CIL_HEADER_MAGIC: u32 = 0x424A_5342;

/// The decoded metadata root and its stream directory.
#[derive(Debug, Clone)]
pub struct MetadataRoot {
    /// Magic signature, always [`CIL_HEADER_MAGIC`]
    pub signature: u32,
    /// Major version, 1 for current files
    pub major_version: u16,
    /// Minor version, 1 for current files
    pub minor_version: u16,
    /// Reserved, always 0
    pub reserved: u32,
    /// Declared length of the version string including its padding
    pub length: u32,
    /// The version string, e.g. `WindowsRuntime 1.4`
    pub version: String,
    /// Reserved, always 0
    pub flags: u16,
    /// The stream directory, in on-disk order
    pub stream_headers: Vec<StreamHeader>,
}

impl MetadataRoot {
    /// Create a `MetadataRoot` from a sequence of bytes
    ///
    /// ## Arguments
    /// * 'data' - The bytes of the metadata, starting at the signature
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the signature does not match, a field is
    /// truncated, or a stream lies outside of the metadata.
    pub fn read(data: &[u8]) -> Result<MetadataRoot> {
        if data.len() < 20 {
            return Err(bad_image_format!(
                "Metadata root truncated - {} bytes available",
                data.len()
            ));
        }

        let signature = read_le::<u32>(data)?;
        if signature != CIL_HEADER_MAGIC {
            return Err(bad_image_format!(
                "Metadata signature does not match - 0x{:08X}",
                signature
            ));
        }

        let length = read_le_at::<u32>(data, &mut 12)?;
        let Some(version_end) = (length as usize).checked_add(16) else {
            return Err(bad_image_format!(
                "Version string length causing integer overflow - {}",
                length
            ));
        };

        let Some(version_bytes) = data.get(16..version_end) else {
            return Err(bad_image_format!(
                "Version string of {} bytes exceeds metadata",
                length
            ));
        };

        let version_len = version_bytes
            .iter()
            .position(|byte| *byte == 0)
            .unwrap_or(version_bytes.len());
        let version = String::from_utf8_lossy(&version_bytes[..version_len]).into_owned();

        let mut offset = version_end;
        let flags = read_le_at::<u16>(data, &mut offset)?;
        let stream_count = read_le_at::<u16>(data, &mut offset)?;

        let mut stream_headers = Vec::with_capacity(usize::from(stream_count));
        for _ in 0..stream_count {
            let Some(header_data) = data.get(offset..) else {
                return Err(bad_image_format!(
                    "Stream header at {} exceeds metadata",
                    offset
                ));
            };

            let stream = StreamHeader::from(header_data)?;
            match stream.offset.checked_add(stream.size) {
                Some(end) if end as usize <= data.len() => {}
                _ => {
                    return Err(bad_image_format!(
                        "Stream '{}' at {}+{} exceeds metadata of {} bytes",
                        stream.name,
                        stream.offset,
                        stream.size,
                        data.len()
                    ))
                }
            }

            debug!(
                "Stream '{}' at offset 0x{:X}, {} bytes",
                stream.name, stream.offset, stream.size
            );

            offset += stream.encoded_len();
            stream_headers.push(stream);
        }

        Ok(MetadataRoot {
            signature,
            major_version: read_le::<u16>(&data[4..])?,
            minor_version: read_le::<u16>(&data[6..])?,
            reserved: read_le::<u32>(&data[8..])?,
            length,
            version,
            flags,
            stream_headers,
        })
    }

    /// Look up a stream by name.
    ///
    /// If several streams share the name, the first one in directory order is returned; use
    /// [`MetadataRoot::duplicate_streams`] to detect that situation.
    ///
    /// # Errors
    /// Returns [`crate::Error::MetadataStreamNotFound`] if no stream has the given name.
    pub fn stream(&self, name: &str) -> Result<&StreamHeader> {
        self.stream_headers
            .iter()
            .find(|stream| stream.name == name)
            .ok_or_else(|| Error::MetadataStreamNotFound(name.to_string()))
    }

    /// Names that appear more than once in the stream directory, in order of first repetition.
    #[must_use]
    pub fn duplicate_streams(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();

        for stream in &self.stream_headers {
            let name = stream.name.as_str();
            if !seen.insert(name) && !duplicates.contains(&name) {
                duplicates.push(name);
            }
        }

        duplicates
    }
}
