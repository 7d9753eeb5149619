//! Index widths and table layouts.
//!
//! The byte width of every index column depends on the row counts declared in the tables stream
//! header, and the stride of every table depends on those widths. [`DatabaseSchema`] derives all
//! of it in one pass over the header:
//!
//! 1. Heap indices are 4 bytes if their `HeapSizes` flag is set, else 2.
//! 2. A simple index into table T is 2 bytes if T has fewer than 2^16 rows, else 4.
//! 3. A coded index is 2 bytes only if every candidate table has fewer than
//!    2^(16 - tag bits) rows, else 4.
//! 4. A table's stride is the sum of its column widths.
//!
//! Tables absent from the stream have no row count. Whether they count as empty or as large is
//! decided by [`DecoderConfig::assume_large_absent_tables`].

use log::debug;
use strum::{EnumCount, IntoEnumIterator};

use crate::metadata::{
    config::DecoderConfig,
    streams::TablesStreamHeader,
    tables::{CodedIndexKind, ColumnType, HeapKind, TableKind, MAX_COLUMNS},
};

/// Byte offsets and widths of the columns of one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableLayout {
    offsets: [u8; MAX_COLUMNS],
    widths: [u8; MAX_COLUMNS],
    count: u8,
    stride: u8,
}

impl TableLayout {
    /// Offset of `column` within a row, `None` if the table has no such column
    #[must_use]
    pub fn offset(&self, column: usize) -> Option<usize> {
        (column < self.column_count()).then(|| usize::from(self.offsets[column]))
    }

    /// Width of `column` in bytes (1, 2 or 4), `None` if the table has no such column
    #[must_use]
    pub fn width(&self, column: usize) -> Option<u8> {
        (column < self.column_count()).then(|| self.widths[column])
    }

    /// Number of columns
    #[must_use]
    pub fn column_count(&self) -> usize {
        usize::from(self.count)
    }

    /// Size of one row in bytes
    #[must_use]
    pub fn stride(&self) -> usize {
        usize::from(self.stride)
    }
}

/// Widths of every index kind and the layout of every table, derived from a tables stream
/// header.
#[derive(Debug, Clone)]
pub struct DatabaseSchema {
    rows: [u32; 64],
    present: u64,
    heap_widths: [u8; 3],
    table_widths: [u8; 64],
    coded_widths: [u8; CodedIndexKind::COUNT],
    layouts: [TableLayout; 64],
}

impl DatabaseSchema {
    /// Compute the schema for the tables declared in `header`.
    #[must_use]
    pub fn new(header: &TablesStreamHeader, config: &DecoderConfig) -> DatabaseSchema {
        let mut schema = DatabaseSchema {
            rows: [0; 64],
            present: header.valid,
            heap_widths: [2; 3],
            table_widths: [2; 64],
            coded_widths: [2; CodedIndexKind::COUNT],
            layouts: [TableLayout::default(); 64],
        };

        for heap in [HeapKind::Strings, HeapKind::Guid, HeapKind::Blob] {
            if header.is_large_heap(heap) {
                schema.heap_widths[heap as usize] = 4;
            }
        }

        // A table is 'small' if a row number fits into `bits` bits
        let fits = |kind: TableKind, bits: u32| {
            if header.has_table(kind) {
                u64::from(header.row_count(kind)) < (1_u64 << bits)
            } else {
                !config.assume_large_absent_tables
            }
        };

        for kind in TableKind::iter() {
            schema.rows[kind.number() as usize] = header.row_count(kind);
            if !fits(kind, 16) {
                schema.table_widths[kind.number() as usize] = 4;
            }
        }

        for coded in CodedIndexKind::iter() {
            let row_bits = 16 - coded.tag_bits();
            let narrow = coded
                .candidates()
                .iter()
                .flatten()
                .all(|kind| fits(*kind, row_bits));

            if !narrow {
                schema.coded_widths[coded as usize] = 4;
            }
        }

        for kind in TableKind::iter() {
            let mut layout = TableLayout::default();
            for (index, column) in kind.columns().iter().enumerate() {
                let width = schema.column_width(column.ty);
                layout.offsets[index] = layout.stride;
                layout.widths[index] = width;
                layout.stride += width;
            }
            layout.count = kind.columns().len() as u8;

            schema.layouts[kind.number() as usize] = layout;
        }

        debug!(
            "Schema: heap widths {:?}, {} wide table indices, {} wide coded indices",
            schema.heap_widths,
            TableKind::iter()
                .filter(|kind| schema.table_index_width(*kind) == 4)
                .count(),
            CodedIndexKind::iter()
                .filter(|kind| schema.coded_index_width(*kind) == 4)
                .count()
        );

        schema
    }

    /// Width of an index into `heap`
    #[must_use]
    pub fn heap_width(&self, heap: HeapKind) -> u8 {
        self.heap_widths[heap as usize]
    }

    /// Width of a simple index into `kind`
    #[must_use]
    pub fn table_index_width(&self, kind: TableKind) -> u8 {
        self.table_widths[kind.number() as usize]
    }

    /// Width of a coded index of `kind`
    #[must_use]
    pub fn coded_index_width(&self, kind: CodedIndexKind) -> u8 {
        self.coded_widths[kind as usize]
    }

    /// Width of a column of type `ty`
    #[must_use]
    pub fn column_width(&self, ty: ColumnType) -> u8 {
        match ty {
            ColumnType::Constant(width) => width,
            ColumnType::Heap(heap) => self.heap_width(heap),
            ColumnType::Table(kind) => self.table_index_width(kind),
            ColumnType::Coded(kind) => self.coded_index_width(kind),
        }
    }

    /// Layout of the rows of `kind`
    #[must_use]
    pub fn layout(&self, kind: TableKind) -> &TableLayout {
        &self.layouts[kind.number() as usize]
    }

    /// Row count of `kind`, 0 for absent tables
    #[must_use]
    pub fn rows(&self, kind: TableKind) -> u32 {
        self.rows[kind.number() as usize]
    }

    /// Returns `true` if `kind` is present in the tables stream
    #[must_use]
    pub fn is_present(&self, kind: TableKind) -> bool {
        self.present & kind.mask() != 0
    }

    /// Number of bytes `kind` occupies in the tables stream, `None` on overflow
    #[must_use]
    pub fn table_size(&self, kind: TableKind) -> Option<usize> {
        (self.rows(kind) as usize).checked_mul(self.layout(kind).stride())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::columns;

    fn schema(heap_sizes: u8, tables: &[(TableKind, u32)], config: DecoderConfig) -> DatabaseSchema {
        DatabaseSchema::new(&TablesStreamHeader::from_parts(heap_sizes, tables), &config)
    }

    #[test]
    fn heap_widths() {
        let test_cases = vec![
            (0x00, [2, 2, 2]),
            (0x01, [4, 2, 2]),
            (0x02, [2, 4, 2]),
            (0x04, [2, 2, 4]),
            (0x07, [4, 4, 4]),
        ];

        for (flags, expected) in test_cases {
            let schema = schema(flags, &[], DecoderConfig::default());
            assert_eq!(
                [
                    schema.heap_width(HeapKind::Strings),
                    schema.heap_width(HeapKind::Guid),
                    schema.heap_width(HeapKind::Blob)
                ],
                expected,
                "flags 0x{flags:02X}"
            );
        }
    }

    #[test]
    fn simple_index_widths() {
        let tables = [(TableKind::Field, 0xFFFF), (TableKind::MethodDef, 0x10000)];

        let conservative = schema(0, &tables, DecoderConfig::conservative());
        assert_eq!(conservative.table_index_width(TableKind::Field), 2);
        assert_eq!(conservative.table_index_width(TableKind::MethodDef), 4);
        assert_eq!(conservative.table_index_width(TableKind::Param), 4);

        let ecma = schema(0, &tables, DecoderConfig::ecma());
        assert_eq!(ecma.table_index_width(TableKind::Field), 2);
        assert_eq!(ecma.table_index_width(TableKind::MethodDef), 4);
        assert_eq!(ecma.table_index_width(TableKind::Param), 2);
    }

    #[test]
    fn coded_index_widths() {
        let full = [
            (TableKind::TypeDef, 0x3FFF),
            (TableKind::TypeRef, 10),
            (TableKind::TypeSpec, 5),
        ];
        let schema_full = schema(0, &full, DecoderConfig::conservative());
        assert_eq!(schema_full.coded_index_width(CodedIndexKind::TypeDefOrRef), 2);

        let overflow = [
            (TableKind::TypeDef, 0x4000),
            (TableKind::TypeRef, 10),
            (TableKind::TypeSpec, 5),
        ];
        let schema_overflow = schema(0, &overflow, DecoderConfig::conservative());
        assert_eq!(schema_overflow.coded_index_width(CodedIndexKind::TypeDefOrRef), 4);

        let absent = [(TableKind::TypeDef, 3), (TableKind::TypeRef, 10)];
        assert_eq!(
            schema(0, &absent, DecoderConfig::conservative())
                .coded_index_width(CodedIndexKind::TypeDefOrRef),
            4
        );
        assert_eq!(
            schema(0, &absent, DecoderConfig::ecma()).coded_index_width(CodedIndexKind::TypeDefOrRef),
            2
        );
    }

    #[test]
    fn reserved_candidates_do_not_widen() {
        let fitting = [(TableKind::MethodDef, 0x1FFF), (TableKind::MemberRef, 2)];
        assert_eq!(
            schema(0, &fitting, DecoderConfig::conservative())
                .coded_index_width(CodedIndexKind::CustomAttributeType),
            2
        );

        let overflowing = [(TableKind::MethodDef, 0x2000), (TableKind::MemberRef, 2)];
        assert_eq!(
            schema(0, &overflowing, DecoderConfig::conservative())
                .coded_index_width(CodedIndexKind::CustomAttributeType),
            4
        );
    }

    #[test]
    fn has_custom_attribute_width() {
        let all: Vec<(TableKind, u32)> = CodedIndexKind::HasCustomAttribute
            .candidates()
            .iter()
            .flatten()
            .map(|kind| (*kind, 0x7FF))
            .collect();
        let narrow = schema(0, &all, DecoderConfig::conservative());
        assert_eq!(narrow.coded_index_width(CodedIndexKind::HasCustomAttribute), 2);

        let mut wide_tables = all.clone();
        wide_tables[21].1 = 0x800;
        let wide = schema(0, &wide_tables, DecoderConfig::conservative());
        assert_eq!(wide.coded_index_width(CodedIndexKind::HasCustomAttribute), 4);
    }

    #[test]
    fn layouts() {
        let everything_small: Vec<(TableKind, u32)> = TableKind::iter().map(|kind| (kind, 1)).collect();

        let small = schema(0, &everything_small, DecoderConfig::conservative());
        let type_def = small.layout(TableKind::TypeDef);
        assert_eq!(type_def.column_count(), 6);
        assert_eq!(type_def.stride(), 14);
        assert_eq!(type_def.offset(columns::type_def::TYPE_NAMESPACE), Some(6));
        assert_eq!(type_def.width(columns::type_def::FLAGS), Some(4));
        assert_eq!(type_def.offset(6), None);
        assert_eq!(type_def.width(6), None);
        assert_eq!(small.layout(TableKind::Module).stride(), 10);
        assert_eq!(small.layout(TableKind::Assembly).stride(), 22);
        assert_eq!(small.table_size(TableKind::TypeDef), Some(14));

        let large_strings = schema(0x01, &everything_small, DecoderConfig::conservative());
        assert_eq!(large_strings.layout(TableKind::TypeDef).stride(), 18);
        assert_eq!(
            large_strings
                .layout(TableKind::TypeDef)
                .offset(columns::type_def::EXTENDS),
            Some(12)
        );
    }

    #[test]
    fn absent_targets_widen_layouts() {
        let tables = [(TableKind::Module, 1), (TableKind::TypeDef, 0)];

        let conservative = schema(0, &tables, DecoderConfig::conservative());
        assert!(conservative.is_present(TableKind::TypeDef));
        assert!(!conservative.is_present(TableKind::Field));
        assert_eq!(conservative.rows(TableKind::Module), 1);
        assert_eq!(conservative.layout(TableKind::Module).stride(), 10);
        assert_eq!(conservative.layout(TableKind::TypeDef).stride(), 20);
        assert_eq!(conservative.table_size(TableKind::TypeDef), Some(0));

        let ecma = schema(0, &tables, DecoderConfig::ecma());
        assert_eq!(ecma.layout(TableKind::TypeDef).stride(), 14);
    }
}
