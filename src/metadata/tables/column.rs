use std::fmt;

use crate::metadata::tables::{CodedIndexKind, TableKind};

/// The three heaps a table column can index into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeapKind {
    /// `#Strings`, nul-terminated UTF-8 identifiers
    Strings,
    /// `#GUID`, 16-byte records addressed by a 1-based index
    Guid,
    /// `#Blob`, length-prefixed byte runs
    Blob,
}

impl HeapKind {
    /// Bit of the `HeapSizes` field that makes indices into this heap 4 bytes wide
    #[must_use]
    pub fn size_flag(self) -> u8 {
        match self {
            HeapKind::Strings => 0x01,
            HeapKind::Guid => 0x02,
            HeapKind::Blob => 0x04,
        }
    }

    /// Name of the stream that holds this heap
    #[must_use]
    pub fn stream_name(self) -> &'static str {
        match self {
            HeapKind::Strings => "#Strings",
            HeapKind::Guid => "#GUID",
            HeapKind::Blob => "#Blob",
        }
    }
}

/// What the value stored in a column means, and therefore how wide it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// A fixed-width integer of 1, 2 or 4 bytes
    Constant(u8),
    /// An offset or index into a heap
    Heap(HeapKind),
    /// A 1-based row index into a single table
    Table(TableKind),
    /// A tagged row index into one of several tables
    Coded(CodedIndexKind),
}

/// A column of a metadata table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Name of the column as used by ECMA-335, e.g. `TypeNamespace`
    pub name: &'static str,
    /// What the stored value refers to
    pub ty: ColumnType,
    /// The column starts a run of rows in the target table which ends where the next row's
    /// run starts (`TypeDef.FieldList` and friends)
    pub is_list: bool,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
