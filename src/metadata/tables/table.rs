//! Runtime view of a metadata table and its rows.
//!
//! A [`Table`] is the byte segment of one table inside the `#~` stream together with the layout
//! computed by [`crate::metadata::tables::DatabaseSchema`]. Rows are never materialized: a
//! [`Row`] is a (table, index) pair and every field is decoded when it is asked for.
//!
//! Row indices are 0-based, metadata row identifiers (RIDs) are 1-based. [`Row::rid`] and
//! [`Table::row_by_rid`] convert between the two.

use std::{fmt, ops::Range};

use crate::{
    file::io::read_le_sized,
    metadata::{
        database::Database,
        tables::{
            Attributes, CodedIndex, Column, ColumnType, HeapKind, TableKind, TableLayout,
        },
        token::Token,
    },
    Error, Result,
};

/// One table of a [`Database`]
#[derive(Clone, Copy)]
pub struct Table<'a> {
    db: &'a Database,
    kind: TableKind,
    rows: u32,
    layout: &'a TableLayout,
    data: &'a [u8],
}

impl<'a> Table<'a> {
    pub(crate) fn new(db: &'a Database, kind: TableKind) -> Table<'a> {
        Table {
            db,
            kind,
            rows: db.schema().rows(kind),
            layout: db.schema().layout(kind),
            data: db.table_data(kind),
        }
    }

    /// Which table this is
    #[must_use]
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Number of rows
    #[must_use]
    pub fn row_count(&self) -> u32 {
        self.rows
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows as usize
    }

    /// Returns `true` if the table has no rows, which includes absent tables
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Size of one row in bytes
    #[must_use]
    pub fn stride(&self) -> usize {
        self.layout.stride()
    }

    /// Column offsets and widths
    #[must_use]
    pub fn layout(&self) -> &'a TableLayout {
        self.layout
    }

    /// The raw bytes of the table, exactly `rows * stride` long
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns `true` if the `Sorted` mask flags this table. Rows are returned in on-disk order
    /// either way.
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.db.tables_header().is_sorted(self.kind)
    }

    /// The row at the 0-based `index`
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidIndex`] if `index` is not below the row count
    pub fn row(&self, index: u32) -> Result<Row<'a>> {
        if index >= self.rows {
            return Err(Error::InvalidIndex(format!(
                "Row {} of {} is out of range, the table has {} rows",
                index, self.kind, self.rows
            )));
        }

        Ok(Row { table: *self, index })
    }

    /// The row with the 1-based identifier `rid`
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidIndex`] for RID 0 or a RID past the last row
    pub fn row_by_rid(&self, rid: u32) -> Result<Row<'a>> {
        match rid.checked_sub(1) {
            Some(index) => self.row(index),
            None => Err(Error::InvalidIndex(format!(
                "RID 0 of {} is a null reference",
                self.kind
            ))),
        }
    }

    /// Iterate all rows in on-disk order
    #[must_use]
    pub fn rows(&self) -> RowIter<'a> {
        RowIter {
            table: *self,
            next: 0,
        }
    }
}

impl<'a> IntoIterator for Table<'a> {
    type Item = Row<'a>;
    type IntoIter = RowIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows()
    }
}

impl fmt::Debug for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("kind", &self.kind)
            .field("rows", &self.rows)
            .field("stride", &self.stride())
            .finish()
    }
}

/// Forward iterator over the rows of a [`Table`]
#[derive(Debug, Clone)]
pub struct RowIter<'a> {
    table: Table<'a>,
    next: u32,
}

impl<'a> Iterator for RowIter<'a> {
    type Item = Row<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.table.rows {
            return None;
        }

        let row = Row {
            table: self.table,
            index: self.next,
        };
        self.next += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.table.rows - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RowIter<'_> {}

/// A single row. Fields are decoded on demand.
#[derive(Clone, Copy)]
pub struct Row<'a> {
    table: Table<'a>,
    index: u32,
}

impl<'a> Row<'a> {
    /// The table this row belongs to
    #[must_use]
    pub fn table(&self) -> Table<'a> {
        self.table
    }

    /// The table kind this row belongs to
    #[must_use]
    pub fn kind(&self) -> TableKind {
        self.table.kind
    }

    /// 0-based position of the row in its table
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// 1-based row identifier
    #[must_use]
    pub fn rid(&self) -> u32 {
        self.index + 1
    }

    /// The metadata token naming this row
    #[must_use]
    pub fn token(&self) -> Token {
        Token::from_parts(self.table.kind, self.rid())
    }

    /// Read the raw value of `column`.
    ///
    /// The value is the little-endian unsigned integer stored in the column, zero-extended.
    /// Use the constants in [`crate::metadata::tables::columns`] to name columns.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidIndex`] if the table has no such column
    pub fn get(&self, column: usize) -> Result<u32> {
        let layout = self.table.layout;
        let (Some(offset), Some(width)) = (layout.offset(column), layout.width(column)) else {
            return Err(self.no_column(column));
        };

        let row_offset = self.index as usize * layout.stride();
        read_le_sized(self.table.data, row_offset + offset, width)
    }

    /// Read the raw value of the column called `name`, e.g. `TypeNamespace`
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidIndex`] if the table has no such column
    pub fn field(&self, name: &str) -> Result<u32> {
        match self.table.kind.column_index(name) {
            Some(column) => self.get(column),
            None => Err(Error::InvalidIndex(format!(
                "{} has no column '{}'",
                self.table.kind, name
            ))),
        }
    }

    /// Resolve a `#Strings` column
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidIndex`] if the column does not index `#Strings`, plus any
    /// error of the heap lookup
    pub fn string(&self, column: usize) -> Result<&'a str> {
        let offset = self.typed(column, ColumnType::Heap(HeapKind::Strings))?;
        self.table.db.strings()?.get(offset as usize)
    }

    /// Resolve a `#Blob` column
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidIndex`] if the column does not index `#Blob`, plus any
    /// error of the heap lookup
    pub fn blob(&self, column: usize) -> Result<&'a [u8]> {
        let offset = self.typed(column, ColumnType::Heap(HeapKind::Blob))?;
        self.table.db.blobs()?.get(offset as usize)
    }

    /// Resolve a `#GUID` column
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidIndex`] if the column does not index `#GUID` or holds the
    /// null index 0, plus any error of the heap lookup
    pub fn guid(&self, column: usize) -> Result<uguid::Guid> {
        let index = self.typed(column, ColumnType::Heap(HeapKind::Guid))?;
        self.table.db.guids()?.get(index as usize)
    }

    /// Resolve a coded index column
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidIndex`] if the column is not a coded index or its tag
    /// selects no table
    pub fn coded(&self, column: usize) -> Result<CodedIndex> {
        match self.column(column)?.ty {
            ColumnType::Coded(kind) => kind.resolve(self.get(column)?),
            _ => Err(self.wrong_type(column, "a coded index")),
        }
    }

    /// The run of rows a list column owns, as a half-open range of RIDs in the target table.
    ///
    /// The run ends where the next row's run starts. The run of the last row ends behind the
    /// last row of the target table.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidIndex`] if the column is not a list column, and
    /// [`crate::Error::BadImageFormat`] if the run would end before it starts
    pub fn list(&self, column: usize) -> Result<Range<u32>> {
        let definition = self.column(column)?;
        let ColumnType::Table(target) = definition.ty else {
            return Err(self.wrong_type(column, "a list"));
        };
        if !definition.is_list {
            return Err(self.wrong_type(column, "a list"));
        }

        let start = self.get(column)?;
        let end = if self.index + 1 < self.table.rows {
            self.table.row(self.index + 1)?.get(column)?
        } else {
            self.table.db.schema().rows(target).saturating_add(1)
        };

        if end < start {
            return Err(bad_image_format!(
                "{}[{}].{} runs backwards from {} to {}",
                self.table.kind,
                self.index,
                definition.name,
                start,
                end
            ));
        }

        Ok(start..end)
    }

    /// The attribute flags stored in `column`
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidIndex`] if the column does not hold attribute flags
    pub fn attributes(&self, column: usize) -> Result<Attributes> {
        let value = self.get(column)?;
        Attributes::from_column(self.table.kind, column, value)
            .ok_or_else(|| self.wrong_type(column, "an attribute column"))
    }

    fn column(&self, column: usize) -> Result<&'static Column> {
        self.table
            .kind
            .columns()
            .get(column)
            .ok_or_else(|| self.no_column(column))
    }

    fn typed(&self, column: usize, expected: ColumnType) -> Result<u32> {
        if self.column(column)?.ty != expected {
            return Err(self.wrong_type(column, &format!("{expected:?}")));
        }

        self.get(column)
    }

    fn no_column(&self, column: usize) -> Error {
        Error::InvalidIndex(format!(
            "{} has no column {}, it has {}",
            self.table.kind,
            column,
            self.table.kind.columns().len()
        ))
    }

    fn wrong_type(&self, column: usize, expected: &str) -> Error {
        Error::InvalidIndex(format!(
            "{}.{} is not {}",
            self.table.kind,
            self.table.kind.columns()[column].name,
            expected
        ))
    }

    fn fmt_value(&self, f: &mut fmt::Formatter<'_>, column: usize, value: u32) -> fmt::Result {
        let definition = &self.table.kind.columns()[column];

        match definition.ty {
            ColumnType::Constant(width) => {
                let digits = usize::from(width) * 2;
                write!(f, "0x{value:0digits$X}")?;
                if let Some(attributes) = Attributes::from_column(self.table.kind, column, value) {
                    write!(f, " ({attributes})")?;
                }
                Ok(())
            }
            ColumnType::Heap(HeapKind::Strings) => {
                match self.table.db.strings().and_then(|heap| heap.get(value as usize)) {
                    Ok(text) => write!(f, "{text:?}"),
                    Err(_) => write!(f, "0x{value:X}"),
                }
            }
            ColumnType::Heap(HeapKind::Guid) => write!(f, "#{value}"),
            ColumnType::Heap(HeapKind::Blob) => write!(f, "Blob[0x{value:X}]"),
            ColumnType::Table(target) => write!(f, "{target}[{value}]"),
            ColumnType::Coded(kind) => match kind.resolve(value) {
                Ok(index) => write!(f, "{index}"),
                Err(_) => write!(f, "0x{value:X}"),
            },
        }
    }
}

impl fmt::Display for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] {{ ", self.table.kind, self.index)?;

        for (column, definition) in self.table.kind.columns().iter().enumerate() {
            if column > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: ", definition.name)?;

            match self.get(column) {
                Ok(value) => self.fmt_value(f, column, value)?,
                Err(_) => f.write_str("?")?,
            }
        }

        f.write_str(" }")
    }
}

impl fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("kind", &self.table.kind)
            .field("index", &self.index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::tables::{columns, TypeAttributes},
        test::WinmdBuilder,
    };

    /// A module with an assembly reference, a type reference and three types, the second of
    /// which owns two fields and two methods
    fn widgets() -> WinmdBuilder {
        let mut builder = WinmdBuilder::new().sorted(TableKind::Param);
        builder.module("Demo.winmd");
        builder.assembly_ref("mscorlib", [4, 0, 0, 0]);
        builder.type_ref(6, "Object", "System");

        builder.type_def(0, "<Module>", "");
        let name = builder.string("Widget");
        let namespace = builder.string("Demo");
        builder.row(TableKind::TypeDef, &[0x0010_0001, name, namespace, 5, 1, 1]);
        builder.field(0x0001, "count", &[0x06, 0x08]);
        builder.field(0x0001, "name", &[0x06, 0x0E]);
        builder.method_def(0x0086, "Reset", &[0x20, 0x00, 0x01]);
        builder.method_def(0x0086, "Set", &[0x20, 0x01, 0x01, 0x08]);
        builder.param(0x0001, 1, "value");
        builder.type_def(0x0000_4101, "Empty", "Demo");

        builder
    }

    fn database(builder: &WinmdBuilder) -> Database {
        Database::from_mem(builder.build()).unwrap()
    }

    #[test]
    fn raw_fields() {
        let db = database(&widgets());
        let types = db.table(TableKind::TypeDef);
        assert_eq!(types.row_count(), 3);
        assert_eq!(types.len(), 3);
        // Extends is 4 bytes wide, TypeSpec is absent
        assert_eq!(types.stride(), 16);
        assert_eq!(types.data().len(), 48);

        let widget = types.row(1).unwrap();
        assert_eq!(widget.index(), 1);
        assert_eq!(widget.rid(), 2);
        assert_eq!(widget.kind(), TableKind::TypeDef);
        assert_eq!(widget.token(), Token(0x0200_0002));
        assert_eq!(widget.get(columns::type_def::FLAGS).unwrap(), 0x0010_0001);
        assert_eq!(widget.get(columns::type_def::EXTENDS).unwrap(), 5);
        assert_eq!(
            widget.field("TypeName").unwrap(),
            widget.get(columns::type_def::TYPE_NAME).unwrap()
        );

        assert!(matches!(widget.get(6), Err(Error::InvalidIndex(_))));
        assert!(matches!(widget.field("Bogus"), Err(Error::InvalidIndex(_))));
    }

    #[test]
    fn typed_fields() {
        let db = database(&widgets());
        let widget = db.table(TableKind::TypeDef).row_by_rid(2).unwrap();

        assert_eq!(widget.string(columns::type_def::TYPE_NAME).unwrap(), "Widget");
        assert_eq!(widget.string(columns::type_def::TYPE_NAMESPACE).unwrap(), "Demo");

        let extends = widget.coded(columns::type_def::EXTENDS).unwrap();
        assert_eq!(extends.table, TableKind::TypeRef);
        assert_eq!(extends.row, 1);
        assert_eq!(extends.token(), Token(0x0100_0001));

        let object = db.table(TableKind::TypeRef).row(0).unwrap();
        let scope = object.coded(columns::type_ref::RESOLUTION_SCOPE).unwrap();
        assert_eq!(scope.to_string(), "AssemblyRef Row 1");

        let count = db.table(TableKind::Field).row(0).unwrap();
        assert_eq!(count.blob(columns::field::SIGNATURE).unwrap(), &[0x06, 0x08]);

        match widget.attributes(columns::type_def::FLAGS).unwrap() {
            Attributes::Type(flags) => {
                assert_eq!(flags.visibility(), "PUBLIC");
                assert!(flags.contains(TypeAttributes::BEFORE_FIELD_INIT));
            }
            other => panic!("Expected type attributes, got {other:?}"),
        }

        // Typed accessors check the column type
        assert!(matches!(
            widget.string(columns::type_def::FLAGS),
            Err(Error::InvalidIndex(_))
        ));
        assert!(matches!(
            widget.coded(columns::type_def::TYPE_NAME),
            Err(Error::InvalidIndex(_))
        ));
        assert!(matches!(
            count.guid(columns::field::NAME),
            Err(Error::InvalidIndex(_))
        ));
        assert!(matches!(
            widget.attributes(columns::type_def::TYPE_NAME),
            Err(Error::InvalidIndex(_))
        ));
    }

    #[test]
    fn list_ranges() {
        let db = database(&widgets());
        let types = db.table(TableKind::TypeDef);

        let ranges: Vec<(Range<u32>, Range<u32>)> = types
            .rows()
            .map(|row| {
                (
                    row.list(columns::type_def::FIELD_LIST).unwrap(),
                    row.list(columns::type_def::METHOD_LIST).unwrap(),
                )
            })
            .collect();
        assert_eq!(ranges, vec![(1..1, 1..1), (1..3, 1..3), (3..3, 3..3)]);

        let methods = db.table(TableKind::MethodDef);
        let params: Vec<Range<u32>> = methods
            .rows()
            .map(|row| row.list(columns::method_def::PARAM_LIST).unwrap())
            .collect();
        assert_eq!(params, vec![1..1, 1..2]);

        assert!(matches!(
            types.row(0).unwrap().list(columns::type_def::EXTENDS),
            Err(Error::InvalidIndex(_))
        ));
        assert!(matches!(
            methods.row(0).unwrap().list(columns::method_def::RVA),
            Err(Error::InvalidIndex(_))
        ));
    }

    #[test]
    fn descending_list() {
        let mut builder = WinmdBuilder::new();
        builder.module("Backwards.winmd");
        builder.row(TableKind::TypeDef, &[0, 0, 0, 0, 3, 1]);
        builder.row(TableKind::TypeDef, &[0, 0, 0, 0, 2, 1]);
        builder.field(0, "a", &[0x06, 0x08]);
        builder.field(0, "b", &[0x06, 0x08]);

        let db = database(&builder);
        let types = db.table(TableKind::TypeDef);
        assert!(types
            .row(0)
            .unwrap()
            .list(columns::type_def::FIELD_LIST)
            .unwrap_err()
            .is_bad_image_format());
        assert_eq!(
            types.row(1).unwrap().list(columns::type_def::FIELD_LIST).unwrap(),
            2..3
        );
    }

    #[test]
    fn row_lookup() {
        let db = database(&widgets());
        let types = db.table(TableKind::TypeDef);

        assert!(matches!(types.row(3), Err(Error::InvalidIndex(_))));
        assert!(matches!(types.row_by_rid(0), Err(Error::InvalidIndex(_))));
        assert!(matches!(types.row_by_rid(4), Err(Error::InvalidIndex(_))));
        assert_eq!(types.row_by_rid(3).unwrap().index(), 2);

        let absent = db.table(TableKind::Event);
        assert!(absent.is_empty());
        assert_eq!(absent.rows().count(), 0);
        assert!(matches!(absent.row(0), Err(Error::InvalidIndex(_))));
    }

    #[test]
    fn iteration_restarts() {
        let db = database(&widgets());
        let types = db.table(TableKind::TypeDef);

        let names = |table: Table<'_>| -> Vec<String> {
            table
                .into_iter()
                .map(|row| row.string(columns::type_def::TYPE_NAME).unwrap().to_string())
                .collect()
        };

        assert_eq!(types.rows().len(), 3);
        assert_eq!(names(types), vec!["<Module>", "Widget", "Empty"]);
        assert_eq!(names(types), names(types));

        let mut rows = types.rows();
        rows.next();
        assert_eq!(rows.size_hint(), (2, Some(2)));
    }

    #[test]
    fn sorted_flag() {
        let db = database(&widgets());
        assert!(db.table(TableKind::Param).is_sorted());
        assert!(!db.table(TableKind::TypeDef).is_sorted());
    }

    #[test]
    fn display() {
        let db = database(&widgets());

        let module = db.table(TableKind::Module).row(0).unwrap();
        assert_eq!(
            module.to_string(),
            "Module[0] { Generation: 0x0000, Name: \"Demo.winmd\", Mvid: #1, EncId: #0, EncBaseId: #0 }"
        );

        let widget = db.table(TableKind::TypeDef).row(1).unwrap();
        assert_eq!(
            widget.to_string(),
            "TypeDef[1] { Flags: 0x00100001 (PUBLIC | AUTO_LAYOUT | ANSI_CLASS | BEFORE_FIELD_INIT), \
             TypeName: \"Widget\", TypeNamespace: \"Demo\", Extends: TypeRef Row 1, \
             FieldList: Field[1], MethodList: MethodDef[1] }"
        );

        let count = db.table(TableKind::Field).row(0).unwrap();
        assert_eq!(
            count.to_string(),
            "Field[0] { Flags: 0x0001 (PRIVATE), Name: \"count\", Signature: Blob[0x1] }"
        );

        let param = db.table(TableKind::Param).row(0).unwrap();
        assert_eq!(
            param.to_string(),
            "Param[0] { Flags: 0x0001 (IN), Sequence: 0x0001, Name: \"value\" }"
        );
    }

    #[test]
    fn large_heaps() {
        let mut builder = WinmdBuilder::new().heap_sizes(0x07);
        builder.module("Large.winmd");
        builder.type_def(0x0000_4101, "Widget", "Demo");
        let extra = builder.guid(uguid::guid!("00000000-0000-0000-0000-000000000001"));

        let db = database(&builder);
        assert_eq!(db.table(TableKind::Module).stride(), 2 + 4 * 4);

        let module = db.table(TableKind::Module).row(0).unwrap();
        assert_eq!(module.string(columns::module::NAME).unwrap(), "Large.winmd");
        assert_eq!(module.guid(columns::module::MVID).unwrap(), WinmdBuilder::MVID);
        assert_eq!(extra, 2);
        assert_eq!(db.namespaces().unwrap().into_iter().collect::<Vec<_>>(), vec!["Demo"]);
    }

    #[test]
    fn unresolvable_strings_render_raw() {
        let mut builder = WinmdBuilder::new();
        builder.row(TableKind::Module, &[0, 0x7F, 1, 0, 0]);

        let db = database(&builder);
        let module = db.table(TableKind::Module).row(0).unwrap();
        assert!(module.string(columns::module::NAME).is_err());
        assert!(module.to_string().contains("Name: 0x7F,"));
    }
}
