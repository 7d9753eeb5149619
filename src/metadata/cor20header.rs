//! CLR 2.0 (Cor20) header parsing.
//!
//! This module defines the [`Cor20Header`] struct, the fixed 72-byte structure referenced by the
//! IMAGE_DIRECTORY_ENTRY_COM_DESCRIPTOR data directory of a PE file. For WinMD files the only
//! field that matters for decoding is the metadata directory; the remaining fields are decoded
//! for diagnostics.
//!
//! # Reference
//! - [ECMA-335 II.25.3.3](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{file::parser::Parser, Result};

/// Declared and expected size of the COM header
pub const COR20_HEADER_SIZE: u32 = 72;

/// The CLR 2.0 header, also known as the COM descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cor20Header {
    /// Size of the header in bytes, always 72
    pub cb: u32,
    /// Minimum major version of the runtime required
    pub major_runtime_version: u16,
    /// Minor version of the runtime
    pub minor_runtime_version: u16,
    /// RVA of the metadata root
    pub meta_data_rva: u32,
    /// Size of the metadata in bytes
    pub meta_data_size: u32,
    /// Runtime flags (`COMIMAGE_FLAGS_*`)
    pub flags: u32,
    /// Token of the entry point method, or of the native entry point file
    pub entry_point_token: u32,
    /// RVA of the managed resources
    pub resource_rva: u32,
    /// Size of the managed resources
    pub resource_size: u32,
    /// RVA of the strong name signature
    pub strong_name_signature_rva: u32,
    /// Size of the strong name signature
    pub strong_name_signature_size: u32,
    /// Reserved, always 0
    pub code_manager_table_rva: u32,
    /// Reserved, always 0
    pub code_manager_table_size: u32,
    /// RVA of the VTable fixups
    pub vtable_fixups_rva: u32,
    /// Size of the VTable fixups
    pub vtable_fixups_size: u32,
    /// Reserved, always 0
    pub export_address_table_jmp_rva: u32,
    /// Reserved, always 0
    pub export_address_table_jmp_size: u32,
    /// Reserved, always 0
    pub managed_native_header_rva: u32,
    /// Reserved, always 0
    pub managed_native_header_size: u32,
}

impl Cor20Header {
    /// Create a `Cor20Header` from a sequence of bytes
    ///
    /// ## Arguments
    /// * 'data' - The byte slice from which this object shall be created
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if fewer than 72 bytes are available, the declared
    /// size is not 72, or the metadata directory is empty.
    pub fn read(data: &[u8]) -> Result<Cor20Header> {
        if data.len() < COR20_HEADER_SIZE as usize {
            return Err(bad_image_format!(
                "COM header truncated - {} of {} bytes available",
                data.len(),
                COR20_HEADER_SIZE
            ));
        }

        let mut parser = Parser::new(data);

        let cb = parser.read_le::<u32>()?;
        if cb != COR20_HEADER_SIZE {
            return Err(bad_image_format!(
                "Invalid COM header size: expected {}, got {}",
                COR20_HEADER_SIZE,
                cb
            ));
        }

        let major_runtime_version = parser.read_le::<u16>()?;
        let minor_runtime_version = parser.read_le::<u16>()?;

        let meta_data_rva = parser.read_le::<u32>()?;
        if meta_data_rva == 0 {
            return Err(bad_image_format!("Metadata RVA cannot be zero"));
        }

        let meta_data_size = parser.read_le::<u32>()?;
        if meta_data_size == 0 {
            return Err(bad_image_format!("Metadata size cannot be zero"));
        }

        Ok(Cor20Header {
            cb,
            major_runtime_version,
            minor_runtime_version,
            meta_data_rva,
            meta_data_size,
            flags: parser.read_le::<u32>()?,
            entry_point_token: parser.read_le::<u32>()?,
            resource_rva: parser.read_le::<u32>()?,
            resource_size: parser.read_le::<u32>()?,
            strong_name_signature_rva: parser.read_le::<u32>()?,
            strong_name_signature_size: parser.read_le::<u32>()?,
            code_manager_table_rva: parser.read_le::<u32>()?,
            code_manager_table_size: parser.read_le::<u32>()?,
            vtable_fixups_rva: parser.read_le::<u32>()?,
            vtable_fixups_size: parser.read_le::<u32>()?,
            export_address_table_jmp_rva: parser.read_le::<u32>()?,
            export_address_table_jmp_size: parser.read_le::<u32>()?,
            managed_native_header_rva: parser.read_le::<u32>()?,
            managed_native_header_size: parser.read_le::<u32>()?,
        })
    }
}
