//! PE/COFF image location of the CLI metadata.
//!
//! A WinMD file is a regular PE image whose only interesting payload is the CLI metadata. This
//! module validates just enough of the PE structure to find it:
//!
//! 1. DOS header (`MZ`), `e_lfanew` and the `PE\0\0` signature
//! 2. The optional header magic, selecting the PE32 or PE32+ layout
//! 3. Data directory #14, the COM descriptor
//! 4. The section table, used to translate RVAs into file offsets
//! 5. The COM (CLR 2.0) header and its metadata data directory
//!
//! The DOS, COFF and optional headers are decoded with [`goblin`]. RVA translation insists on
//! exactly one section containing the address: an address that falls into no section, or into
//! several overlapping ones, is rejected instead of guessed.
//!
//! # Examples
//!
//! ```rust,no_run
//! use winmd::file::image::Image;
//!
//! let data = std::fs::read("Windows.Foundation.winmd")?;
//! let image = Image::parse(&data)?;
//! let location = image.locate_metadata(&data)?;
//! println!("metadata at 0x{:X}, {} bytes", location.offset, location.size);
//! # Ok::<(), winmd::Error>(())
//! ```

use goblin::pe::header::Header;
use log::debug;

use crate::{metadata::cor20header::Cor20Header, Result};

const PE32_MAGIC: u16 = 0x010B;
const PE32_PLUS_MAGIC: u16 = 0x020B;

/// Size of the `PE\0\0` signature followed by the COFF file header
const PE_SIGNATURE_AND_COFF_SIZE: usize = 4 + 20;

/// The layout variant of the optional header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeFormat {
    /// 32-bit optional header (magic `0x10B`)
    Pe32,
    /// 64-bit optional header (magic `0x20B`)
    Pe32Plus,
}

/// One entry of the PE section table, reduced to what RVA translation needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    /// Section name, e.g. `.text`
    pub name: String,
    /// RVA of the first byte of the section once loaded
    pub virtual_address: u32,
    /// Size of the section once loaded
    pub virtual_size: u32,
    /// File offset of the section's raw data
    pub pointer_to_raw_data: u32,
    /// Size of the section's raw data in the file
    pub size_of_raw_data: u32,
}

impl Section {
    /// Returns `true` if `rva` lies within `[virtual_address, virtual_address + virtual_size)`.
    #[must_use]
    pub fn contains(&self, rva: u32) -> bool {
        let end = u64::from(self.virtual_address) + u64::from(self.virtual_size);
        rva >= self.virtual_address && u64::from(rva) < end
    }
}

/// An RVA and size pair, as stored in PE and CLI data directories.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DataDirectory {
    /// Relative virtual address of the referenced data
    pub virtual_address: u32,
    /// Size of the referenced data in bytes
    pub size: u32,
}

/// Where the metadata root lives in the file.
#[derive(Debug)]
pub struct MetadataLocation {
    /// The decoded COM descriptor
    pub cor20: Cor20Header,
    /// File offset of the metadata root (`BSJB`)
    pub offset: usize,
    /// Size of the metadata in bytes
    pub size: usize,
}

/// The validated PE headers of a WinMD image.
#[derive(Debug)]
pub struct Image {
    format: PeFormat,
    sections: Vec<Section>,
    com_descriptor: DataDirectory,
}

impl Image {
    /// Validate the DOS and PE headers of `data` and collect its section table.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if any header is malformed or truncated, the
    /// optional header magic is unknown, or the COM descriptor directory is missing.
    pub fn parse(data: &[u8]) -> Result<Image> {
        if data.len() < 2 || &data[..2] != b"MZ" {
            return Err(bad_image_format!("Missing MS-DOS signature"));
        }

        let header = Header::parse(data)?;

        let Some(optional_header) = header.optional_header else {
            return Err(bad_image_format!("Image does not have an optional header"));
        };

        let format = match optional_header.standard_fields.magic {
            PE32_MAGIC => PeFormat::Pe32,
            PE32_PLUS_MAGIC => PeFormat::Pe32Plus,
            magic => {
                return Err(bad_image_format!(
                    "Unknown optional header magic - 0x{:04X}",
                    magic
                ))
            }
        };

        let com_descriptor = match optional_header.data_directories.get_clr_runtime_header() {
            Some(directory) if directory.virtual_address != 0 => DataDirectory {
                virtual_address: directory.virtual_address,
                size: directory.size,
            },
            _ => return Err(bad_image_format!("Image does not have a COM descriptor")),
        };

        let mut section_offset = header.dos_header.pe_pointer as usize
            + PE_SIGNATURE_AND_COFF_SIZE
            + usize::from(header.coff_header.size_of_optional_header);
        let sections = header
            .coff_header
            .sections(data, &mut section_offset)?
            .iter()
            .map(|section| Section {
                name: String::from_utf8_lossy(&section.name)
                    .trim_end_matches('\0')
                    .to_string(),
                virtual_address: section.virtual_address,
                virtual_size: section.virtual_size,
                pointer_to_raw_data: section.pointer_to_raw_data,
                size_of_raw_data: section.size_of_raw_data,
            })
            .collect::<Vec<_>>();

        debug!(
            "{:?} image with {} sections, COM descriptor at RVA 0x{:X}",
            format,
            sections.len(),
            com_descriptor.virtual_address
        );

        Ok(Image {
            format,
            sections,
            com_descriptor,
        })
    }

    /// The optional header layout of this image.
    #[must_use]
    pub fn format(&self) -> PeFormat {
        self.format
    }

    /// The section table of this image.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Data directory #14, pointing at the COM (CLR) header.
    #[must_use]
    pub fn com_descriptor(&self) -> DataDirectory {
        self.com_descriptor
    }

    /// Find the one section that contains `rva`.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if no section, or more than one section,
    /// contains `rva`.
    pub fn section_for_rva(&self, rva: u32) -> Result<&Section> {
        let mut matches = self.sections.iter().filter(|section| section.contains(rva));

        match (matches.next(), matches.next()) {
            (Some(section), None) => Ok(section),
            (None, _) => Err(bad_image_format!(
                "RVA 0x{:X} is not contained in any section",
                rva
            )),
            (Some(first), Some(second)) => Err(bad_image_format!(
                "RVA 0x{:X} is ambiguous between sections '{}' and '{}'",
                rva,
                first.name,
                second.name
            )),
        }
    }

    /// Translate an RVA into a file offset via its unique containing section.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the section lookup fails.
    pub fn rva_to_offset(&self, rva: u32) -> Result<usize> {
        let section = self.section_for_rva(rva)?;
        Ok((rva - section.virtual_address) as usize + section.pointer_to_raw_data as usize)
    }

    /// Read and validate the COM header referenced by data directory #14.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the header cannot be mapped, is truncated, or
    /// declares a size other than 72 bytes.
    pub fn cor20_header(&self, data: &[u8]) -> Result<Cor20Header> {
        let offset = self.rva_to_offset(self.com_descriptor.virtual_address)?;

        match data.get(offset..) {
            Some(header) => Cor20Header::read(header),
            None => Err(bad_image_format!(
                "COM header offset 0x{:X} is past the end of the file",
                offset
            )),
        }
    }

    /// Locate the metadata root through the COM header's metadata directory.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the COM header is invalid or the metadata
    /// range cannot be mapped to bytes inside the file.
    pub fn locate_metadata(&self, data: &[u8]) -> Result<MetadataLocation> {
        let cor20 = self.cor20_header(data)?;

        let offset = self.rva_to_offset(cor20.meta_data_rva)?;
        let size = cor20.meta_data_size as usize;

        match offset.checked_add(size) {
            Some(end) if end <= data.len() => {}
            _ => {
                return Err(bad_image_format!(
                    "Metadata range 0x{:X}+0x{:X} exceeds file of {} bytes",
                    offset,
                    size,
                    data.len()
                ))
            }
        }

        debug!("Metadata root at file offset 0x{:X} ({} bytes)", offset, size);

        Ok(MetadataLocation {
            cor20,
            offset,
            size,
        })
    }
}

/// Validate the PE headers of `data` and return the location of its metadata root.
///
/// # Errors
/// Returns [`crate::Error::BadImageFormat`] on any structural violation.
pub fn locate_metadata(data: &[u8]) -> Result<MetadataLocation> {
    Image::parse(data)?.locate_metadata(data)
}
