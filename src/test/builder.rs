//! Synthetic WinMD images for unit tests
//!
//! [`WinmdBuilder`] assembles a complete PE image with a single `.text` section holding the COM
//! header followed by the metadata. Table rows are given as raw column values; their widths are
//! laid out with the same schema rules the decoder applies.

use std::collections::BTreeMap;

use uguid::{guid, Guid};

use crate::metadata::{
    config::DecoderConfig,
    streams::TablesStreamHeader,
    tables::{DatabaseSchema, TableKind},
};

const PE_OFFSET: usize = 0x80;
const HEADERS_SIZE: usize = 0x200;
const FILE_ALIGNMENT: usize = 0x200;
const SECTION_ALIGNMENT: u32 = 0x2000;
const TEXT_RVA: u32 = 0x2000;
const COR20_SIZE: usize = 72;

fn align4(len: usize) -> usize {
    (len + 3) & !3
}

fn pad4(mut data: Vec<u8>) -> Vec<u8> {
    data.resize(align4(data.len()), 0);
    data
}

/// Builder for synthetic WinMD images
pub struct WinmdBuilder {
    pe32_plus: bool,
    cor20_size: u32,
    version: String,
    heap_sizes: u8,
    layout: DecoderConfig,
    extra_valid: u64,
    sorted: u64,
    trim_tables: usize,
    omitted: Vec<String>,
    extra_streams: Vec<(String, Vec<u8>)>,
    strings: Vec<u8>,
    blobs: Vec<u8>,
    guids: Vec<u8>,
    tables: BTreeMap<TableKind, Vec<Vec<u32>>>,
}

impl Default for WinmdBuilder {
    fn default() -> Self {
        Self {
            pe32_plus: false,
            cor20_size: COR20_SIZE as u32,
            version: "WindowsRuntime 1.4".to_string(),
            heap_sizes: 0,
            layout: DecoderConfig::default(),
            extra_valid: 0,
            sorted: 0,
            trim_tables: 0,
            omitted: Vec::new(),
            extra_streams: Vec::new(),
            strings: vec![0],
            blobs: vec![0],
            guids: WinmdBuilder::MVID.to_bytes().to_vec(),
            tables: BTreeMap::new(),
        }
    }
}

impl WinmdBuilder {
    /// The module version id, always stored at `#GUID` index 1
    pub const MVID: Guid = guid!("a5e1f0c2-6b3d-4e8f-9a7b-1c2d3e4f5a6b");

    /// An image without tables and with empty heaps
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a PE32+ optional header instead of PE32
    pub fn pe32_plus(mut self) -> Self {
        self.pe32_plus = true;
        self
    }

    /// Override the `cb` field of the COM header
    pub fn cor20_size(mut self, size: u32) -> Self {
        self.cor20_size = size;
        self
    }

    /// Set the metadata version string
    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Set the `HeapSizes` flags; values of large heaps are written with 4 bytes
    pub fn heap_sizes(mut self, heap_sizes: u8) -> Self {
        self.heap_sizes = heap_sizes;
        self
    }

    /// Lay out index columns as a decoder with `config` expects them
    pub fn layout(mut self, config: DecoderConfig) -> Self {
        self.layout = config;
        self
    }

    /// Set additional bits in `Valid` without adding row counts
    pub fn raw_valid_bits(mut self, bits: u64) -> Self {
        self.extra_valid |= bits;
        self
    }

    /// Flag a table as sorted
    pub fn sorted(mut self, kind: TableKind) -> Self {
        self.sorted |= kind.mask();
        self
    }

    /// Cut `bytes` from the end of the `#~` stream
    pub fn trim_tables_stream(mut self, bytes: usize) -> Self {
        self.trim_tables = bytes;
        self
    }

    /// Leave a standard stream out of the directory
    pub fn without_stream(mut self, name: &str) -> Self {
        self.omitted.push(name.to_string());
        self
    }

    /// Append another stream behind the standard ones
    pub fn stream(mut self, name: &str, data: Vec<u8>) -> Self {
        self.extra_streams.push((name.to_string(), data));
        self
    }

    /// Add a string to `#Strings`, returns its offset. The empty string is offset 0.
    pub fn string(&mut self, value: &str) -> u32 {
        if value.is_empty() {
            return 0;
        }

        let offset = self.strings.len() as u32;
        self.strings.extend_from_slice(value.as_bytes());
        self.strings.push(0);
        offset
    }

    /// Add a blob to `#Blob`, returns its offset
    pub fn blob(&mut self, data: &[u8]) -> u32 {
        let offset = self.blobs.len() as u32;
        let len = data.len() as u32;

        if len < 0x80 {
            self.blobs.push(len as u8);
        } else if len < 0x4000 {
            self.blobs.extend_from_slice(&(0x8000 | len as u16).to_be_bytes());
        } else {
            self.blobs.extend_from_slice(&(0xC000_0000 | len).to_be_bytes());
        }

        self.blobs.extend_from_slice(data);
        offset
    }

    /// Add a GUID to `#GUID`, returns its 1-based index
    pub fn guid(&mut self, guid: Guid) -> u32 {
        self.guids.extend_from_slice(&guid.to_bytes());
        (self.guids.len() / 16) as u32
    }

    /// Number of rows added to `kind` so far
    pub fn rows(&self, kind: TableKind) -> u32 {
        self.tables.get(&kind).map_or(0, |rows| rows.len() as u32)
    }

    /// Add a row of raw column values, returns its RID
    pub fn row(&mut self, kind: TableKind, values: &[u32]) -> u32 {
        assert_eq!(values.len(), kind.columns().len(), "column count of {kind}");

        let rows = self.tables.entry(kind).or_default();
        rows.push(values.to_vec());
        rows.len() as u32
    }

    /// Add the `Module` row
    pub fn module(&mut self, name: &str) -> u32 {
        let name = self.string(name);
        self.row(TableKind::Module, &[0, name, 1, 0, 0])
    }

    /// Add a `TypeDef` row owning all fields and methods added after it
    pub fn type_def(&mut self, flags: u32, name: &str, namespace: &str) -> u32 {
        let name = self.string(name);
        let namespace = self.string(namespace);
        let fields = self.rows(TableKind::Field) + 1;
        let methods = self.rows(TableKind::MethodDef) + 1;
        self.row(
            TableKind::TypeDef,
            &[flags, name, namespace, 0, fields, methods],
        )
    }

    /// Add a `TypeRef` row
    pub fn type_ref(&mut self, scope: u32, name: &str, namespace: &str) -> u32 {
        let name = self.string(name);
        let namespace = self.string(namespace);
        self.row(TableKind::TypeRef, &[scope, name, namespace])
    }

    /// Add a `Field` row
    pub fn field(&mut self, flags: u16, name: &str, signature: &[u8]) -> u32 {
        let name = self.string(name);
        let signature = self.blob(signature);
        self.row(TableKind::Field, &[u32::from(flags), name, signature])
    }

    /// Add a `MethodDef` row owning all params added after it
    pub fn method_def(&mut self, flags: u16, name: &str, signature: &[u8]) -> u32 {
        let name = self.string(name);
        let signature = self.blob(signature);
        let params = self.rows(TableKind::Param) + 1;
        self.row(
            TableKind::MethodDef,
            &[0, 0x0003, u32::from(flags), name, signature, params],
        )
    }

    /// Add a `Param` row
    pub fn param(&mut self, flags: u16, sequence: u16, name: &str) -> u32 {
        let name = self.string(name);
        self.row(
            TableKind::Param,
            &[u32::from(flags), u32::from(sequence), name],
        )
    }

    /// Add the `Assembly` row
    pub fn assembly(&mut self, name: &str, version: [u16; 4]) -> u32 {
        let name = self.string(name);
        let [major, minor, build, revision] = version.map(u32::from);
        self.row(
            TableKind::Assembly,
            &[0x8004, major, minor, build, revision, 0x0200, 0, name, 0],
        )
    }

    /// Add an `AssemblyRef` row
    pub fn assembly_ref(&mut self, name: &str, version: [u16; 4]) -> u32 {
        let name = self.string(name);
        let [major, minor, build, revision] = version.map(u32::from);
        self.row(
            TableKind::AssemblyRef,
            &[major, minor, build, revision, 0, 0, name, 0, 0],
        )
    }

    /// Assemble the `#~` stream
    pub fn tables_stream(&self) -> Vec<u8> {
        let row_counts: Vec<(TableKind, u32)> = self
            .tables
            .iter()
            .map(|(kind, rows)| (*kind, rows.len() as u32))
            .collect();
        let header = TablesStreamHeader::from_parts(self.heap_sizes, &row_counts);
        let schema = DatabaseSchema::new(&header, &self.layout);

        let mut stream = Vec::new();
        stream.extend_from_slice(&0_u32.to_le_bytes());
        stream.extend_from_slice(&[2, 0, self.heap_sizes, 1]);
        stream.extend_from_slice(&(header.valid | self.extra_valid).to_le_bytes());
        stream.extend_from_slice(&self.sorted.to_le_bytes());
        for (_, rows) in &row_counts {
            stream.extend_from_slice(&rows.to_le_bytes());
        }

        for (kind, rows) in &self.tables {
            let layout = schema.layout(*kind);
            for row in rows {
                for (column, value) in row.iter().enumerate() {
                    let width = usize::from(layout.width(column).unwrap());
                    stream.extend_from_slice(&value.to_le_bytes()[..width]);
                }
            }
        }

        let mut stream = pad4(stream);
        stream.truncate(stream.len() - self.trim_tables);
        stream
    }

    /// Assemble the metadata root with all streams
    pub fn metadata(&self) -> Vec<u8> {
        let mut streams = vec![
            ("#~".to_string(), self.tables_stream()),
            ("#Strings".to_string(), pad4(self.strings.clone())),
            ("#US".to_string(), vec![0; 4]),
            ("#GUID".to_string(), self.guids.clone()),
            ("#Blob".to_string(), pad4(self.blobs.clone())),
        ];
        streams.retain(|(name, _)| !self.omitted.contains(name));
        streams.extend(self.extra_streams.iter().cloned());

        let mut version = self.version.as_bytes().to_vec();
        version.push(0);
        let version = pad4(version);

        let directory_len: usize = streams
            .iter()
            .map(|(name, _)| 8 + align4(name.len() + 1))
            .sum();

        let mut metadata = Vec::new();
        metadata.extend_from_slice(b"BSJB");
        metadata.extend_from_slice(&1_u16.to_le_bytes());
        metadata.extend_from_slice(&1_u16.to_le_bytes());
        metadata.extend_from_slice(&0_u32.to_le_bytes());
        metadata.extend_from_slice(&(version.len() as u32).to_le_bytes());
        metadata.extend_from_slice(&version);
        metadata.extend_from_slice(&0_u16.to_le_bytes());
        metadata.extend_from_slice(&(streams.len() as u16).to_le_bytes());

        let mut offset = metadata.len() + directory_len;
        for (name, data) in &streams {
            metadata.extend_from_slice(&(offset as u32).to_le_bytes());
            metadata.extend_from_slice(&(data.len() as u32).to_le_bytes());
            let mut name = name.as_bytes().to_vec();
            name.push(0);
            metadata.extend_from_slice(&pad4(name));
            offset += data.len();
        }

        for (_, data) in &streams {
            metadata.extend_from_slice(data);
        }

        metadata
    }

    /// Assemble the complete PE image
    pub fn build(&self) -> Vec<u8> {
        let metadata = self.metadata();

        let mut text = Vec::new();
        text.extend_from_slice(&self.cor20_size.to_le_bytes());
        text.extend_from_slice(&2_u16.to_le_bytes());
        text.extend_from_slice(&5_u16.to_le_bytes());
        text.extend_from_slice(&(TEXT_RVA + COR20_SIZE as u32).to_le_bytes());
        text.extend_from_slice(&(metadata.len() as u32).to_le_bytes());
        text.extend_from_slice(&1_u32.to_le_bytes());
        text.resize(COR20_SIZE, 0);
        text.extend_from_slice(&metadata);

        let raw_size = text.len().div_ceil(FILE_ALIGNMENT) * FILE_ALIGNMENT;
        let virtual_size = text.len() as u32;

        let mut image = self.headers(virtual_size, raw_size as u32);
        image.extend_from_slice(&text);
        image.resize(HEADERS_SIZE + raw_size, 0);
        image
    }

    fn headers(&self, virtual_size: u32, raw_size: u32) -> Vec<u8> {
        let mut headers = vec![0_u8; PE_OFFSET];
        headers[..2].copy_from_slice(b"MZ");
        headers[0x3C..0x40].copy_from_slice(&(PE_OFFSET as u32).to_le_bytes());

        let optional_size: u16 = if self.pe32_plus { 240 } else { 224 };
        let (machine, characteristics): (u16, u16) = if self.pe32_plus {
            (0x8664, 0x2022)
        } else {
            (0x014C, 0x2102)
        };

        // PE signature and COFF header
        headers.extend_from_slice(b"PE\0\0");
        headers.extend_from_slice(&machine.to_le_bytes());
        headers.extend_from_slice(&1_u16.to_le_bytes());
        headers.extend_from_slice(&[0; 12]);
        headers.extend_from_slice(&optional_size.to_le_bytes());
        headers.extend_from_slice(&characteristics.to_le_bytes());

        // Standard fields
        let magic: u16 = if self.pe32_plus { 0x20B } else { 0x10B };
        headers.extend_from_slice(&magic.to_le_bytes());
        headers.extend_from_slice(&[0x30, 0x00]);
        headers.extend_from_slice(&raw_size.to_le_bytes());
        headers.extend_from_slice(&[0; 8]);
        headers.extend_from_slice(&0_u32.to_le_bytes());
        headers.extend_from_slice(&TEXT_RVA.to_le_bytes());

        // Windows fields
        let size_of_image = TEXT_RVA + virtual_size.div_ceil(SECTION_ALIGNMENT) * SECTION_ALIGNMENT;
        if self.pe32_plus {
            headers.extend_from_slice(&0x1_8000_0000_u64.to_le_bytes());
        } else {
            headers.extend_from_slice(&0_u32.to_le_bytes());
            headers.extend_from_slice(&0x1000_0000_u32.to_le_bytes());
        }
        headers.extend_from_slice(&SECTION_ALIGNMENT.to_le_bytes());
        headers.extend_from_slice(&(FILE_ALIGNMENT as u32).to_le_bytes());
        for version in [6_u16, 0, 0, 0, 6, 0] {
            headers.extend_from_slice(&version.to_le_bytes());
        }
        headers.extend_from_slice(&0_u32.to_le_bytes());
        headers.extend_from_slice(&size_of_image.to_le_bytes());
        headers.extend_from_slice(&(HEADERS_SIZE as u32).to_le_bytes());
        headers.extend_from_slice(&0_u32.to_le_bytes());
        headers.extend_from_slice(&3_u16.to_le_bytes());
        headers.extend_from_slice(&0x8540_u16.to_le_bytes());
        for size in [0x10_0000_u64, 0x1000, 0x10_0000, 0x1000] {
            if self.pe32_plus {
                headers.extend_from_slice(&size.to_le_bytes());
            } else {
                headers.extend_from_slice(&(size as u32).to_le_bytes());
            }
        }
        headers.extend_from_slice(&0_u32.to_le_bytes());
        headers.extend_from_slice(&16_u32.to_le_bytes());

        // Data directories, only the COM descriptor is set
        for index in 0..16 {
            if index == 14 {
                headers.extend_from_slice(&TEXT_RVA.to_le_bytes());
                headers.extend_from_slice(&self.cor20_size.to_le_bytes());
            } else {
                headers.extend_from_slice(&[0; 8]);
            }
        }

        // Section table
        headers.extend_from_slice(b".text\0\0\0");
        headers.extend_from_slice(&virtual_size.to_le_bytes());
        headers.extend_from_slice(&TEXT_RVA.to_le_bytes());
        headers.extend_from_slice(&raw_size.to_le_bytes());
        headers.extend_from_slice(&(HEADERS_SIZE as u32).to_le_bytes());
        headers.extend_from_slice(&[0; 12]);
        headers.extend_from_slice(&0x6000_0020_u32.to_le_bytes());

        headers.resize(HEADERS_SIZE, 0);
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_sizes() {
        let pe32 = WinmdBuilder::new().build();
        let pe32_plus = WinmdBuilder::new().pe32_plus().build();

        // Section table directly behind the optional header
        assert_eq!(&pe32[0x178..0x17D], b".text");
        assert_eq!(&pe32_plus[0x188..0x18D], b".text");
        assert_eq!(pe32.len() % FILE_ALIGNMENT, 0);
        assert_eq!(&pe32[HEADERS_SIZE + COR20_SIZE..HEADERS_SIZE + COR20_SIZE + 4], b"BSJB");
    }

    #[test]
    fn blob_prefixes() {
        let mut builder = WinmdBuilder::new();
        assert_eq!(builder.blob(&[1, 2, 3]), 1);
        assert_eq!(builder.blob(&[0; 0x80]), 5);
        assert_eq!(&builder.blobs[5..7], &[0x80, 0x80]);
        assert_eq!(builder.blob(&[0; 0x4000]), 5 + 2 + 0x80);
        assert_eq!(&builder.blobs[0x87..0x8B], &[0xC0, 0x00, 0x40, 0x00]);
    }
}
