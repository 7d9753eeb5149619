//! Header of the `#~` stream.
//!
//! The compressed tables stream opens with a fixed 24-byte header followed by one row count per
//! present table. The table data itself starts directly behind the row counts.
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 4 | Reserved, 0 |
//! | 4 | 1 | MajorVersion |
//! | 5 | 1 | MinorVersion |
//! | 6 | 1 | HeapSizes |
//! | 7 | 1 | Reserved, 1 |
//! | 8 | 8 | Valid |
//! | 16 | 8 | Sorted |
//! | 24 | 4 * n | Rows |
//!
//! # Reference
//! - [ECMA-335 II.24.2.6](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use log::{debug, warn};
use strum::IntoEnumIterator;

use crate::{
    file::io::{read_le, read_le_at},
    metadata::tables::{HeapKind, TableKind},
    Error, Result,
};

/// Size of the fixed part of the header
pub const TABLES_HEADER_SIZE: usize = 24;

/// Heap size flags understood by the decoder
const KNOWN_HEAP_SIZES: u8 = 0x07;

/// The decoded header of the `#~` stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablesStreamHeader {
    /// Reserved, always 0
    pub reserved: u32,
    /// Major version of the table schema, 2 for current files
    pub major_version: u8,
    /// Minor version of the table schema, 0 for current files
    pub minor_version: u8,
    /// Bit flags selecting 4-byte indices into `#Strings` (0x01), `#GUID` (0x02) and
    /// `#Blob` (0x04)
    pub heap_sizes: u8,
    /// Reserved, always 1
    pub reserved2: u8,
    /// Bit mask of present tables, bit n standing for table number n
    pub valid: u64,
    /// Bit mask of tables sorted by their primary key
    pub sorted: u64,
    rows: [u32; 64],
}

impl TablesStreamHeader {
    /// Create a `TablesStreamHeader` from the bytes of the `#~` stream
    ///
    /// ## Arguments
    /// * 'data' - The stream, starting at the header
    ///
    /// # Errors
    /// Returns [`crate::Error::BadImageFormat`] if the header or the row counts are truncated,
    /// and [`crate::Error::UnsupportedSchema`] if `Valid` names a table outside the supported set.
    pub fn read(data: &[u8]) -> Result<TablesStreamHeader> {
        if data.len() < TABLES_HEADER_SIZE {
            return Err(bad_image_format!(
                "Tables stream header truncated - {} bytes available",
                data.len()
            ));
        }

        let valid = read_le::<u64>(&data[8..])?;
        let supported = TableKind::iter().fold(0_u64, |mask, kind| mask | kind.mask());
        let unsupported = valid & !supported;
        if unsupported != 0 {
            let numbers: Vec<String> = (0..64_u32)
                .filter(|bit| unsupported & (1 << bit) != 0)
                .map(|bit| format!("0x{bit:02X}"))
                .collect();
            return Err(Error::UnsupportedSchema(format!(
                "Tables stream declares unsupported tables {}",
                numbers.join(", ")
            )));
        }

        let mut header = TablesStreamHeader {
            reserved: read_le::<u32>(data)?,
            major_version: read_le::<u8>(&data[4..])?,
            minor_version: read_le::<u8>(&data[5..])?,
            heap_sizes: read_le::<u8>(&data[6..])?,
            reserved2: read_le::<u8>(&data[7..])?,
            valid,
            sorted: read_le::<u64>(&data[16..])?,
            rows: [0; 64],
        };

        if header.reserved != 0 {
            warn!(
                "Reserved field of the tables stream header is 0x{:X}",
                header.reserved
            );
        }
        if header.heap_sizes & !KNOWN_HEAP_SIZES != 0 {
            warn!(
                "Ignoring unknown heap size flags 0x{:02X}",
                header.heap_sizes & !KNOWN_HEAP_SIZES
            );
        }

        let mut offset = TABLES_HEADER_SIZE;
        for kind in TableKind::iter().filter(|kind| valid & kind.mask() != 0) {
            header.rows[kind.number() as usize] = read_le_at::<u32>(data, &mut offset)?;
        }

        debug!(
            "Tables stream v{}.{}: {} tables, heap sizes 0x{:02X}",
            header.major_version,
            header.minor_version,
            header.table_count(),
            header.heap_sizes
        );

        Ok(header)
    }

    /// Number of present tables
    #[must_use]
    pub fn table_count(&self) -> u32 {
        self.valid.count_ones()
    }

    /// Offset of the first table's data, relative to the start of the stream
    #[must_use]
    pub fn tables_offset(&self) -> usize {
        TABLES_HEADER_SIZE + 4 * self.table_count() as usize
    }

    /// Check if a specific table is present
    #[must_use]
    pub fn has_table(&self, kind: TableKind) -> bool {
        self.valid & kind.mask() != 0
    }

    /// Check if a table is flagged as sorted. The flag is informational, rows are never reordered.
    #[must_use]
    pub fn is_sorted(&self, kind: TableKind) -> bool {
        self.sorted & kind.mask() != 0
    }

    /// Row count of a table, 0 if the table is absent
    #[must_use]
    pub fn row_count(&self, kind: TableKind) -> u32 {
        self.rows[kind.number() as usize]
    }

    /// Returns `true` if indices into `heap` are 4 bytes wide
    #[must_use]
    pub fn is_large_heap(&self, heap: HeapKind) -> bool {
        self.heap_sizes & heap.size_flag() != 0
    }

    /// Iterate the present tables in ascending table-number order
    pub fn present_tables(&self) -> impl Iterator<Item = TableKind> + '_ {
        TableKind::iter().filter(|kind| self.has_table(*kind))
    }

    /// Build a header from its parts, as if read from a stream
    #[must_use]
    pub fn from_parts(heap_sizes: u8, tables: &[(TableKind, u32)]) -> TablesStreamHeader {
        let mut header = TablesStreamHeader {
            reserved: 0,
            major_version: 2,
            minor_version: 0,
            heap_sizes,
            reserved2: 1,
            valid: 0,
            sorted: 0,
            rows: [0; 64],
        };

        for (kind, rows) in tables {
            header.valid |= kind.mask();
            header.rows[kind.number() as usize] = *rows;
        }

        header
    }
}
