//! Metadata tables.
//!
//! The `#~` stream stores 38 relational tables back to back. Their column schemas are fixed
//! ([`TableKind::columns`]), but the width of every index column depends on row counts and heap
//! sizes declared in the stream header. [`DatabaseSchema`] resolves those widths once, after
//! which every row of every table can be addressed directly.
//!
//! # Key Components
//!
//! - [`TableKind`] - The supported tables and their column schemas
//! - [`CodedIndexKind`] / [`CodedIndex`] - Tagged references into one of several tables
//! - [`DatabaseSchema`] / [`TableLayout`] - Index widths, column offsets and strides
//! - [`Table`] / [`Row`] - Lazily decoded rows
//! - [`TypeAttributes`] and friends - Typed views of attribute columns
//!
//! # Examples
//!
//! ```rust,no_run
//! use winmd::{metadata::tables::{columns::type_def, TableKind}, Database};
//!
//! let db = Database::from_file("Windows.Foundation.winmd")?;
//! for row in db.table(TableKind::TypeDef).rows() {
//!     println!("{}.{}", row.string(type_def::TYPE_NAMESPACE)?, row.string(type_def::TYPE_NAME)?);
//! }
//! # Ok::<(), winmd::Error>(())
//! ```

mod codedindex;
mod column;
mod flags;
mod schema;
mod table;
mod tablekind;

pub use codedindex::{CodedIndex, CodedIndexKind};
pub use column::{Column, ColumnType, HeapKind};
pub use flags::{
    AssemblyFlags, Attributes, EventAttributes, FieldAttributes, MethodAttributes,
    MethodImplAttributes, MethodSemanticsAttributes, ParamAttributes, PropertyAttributes,
    TypeAttributes,
};
pub use schema::{DatabaseSchema, TableLayout};
pub use table::{Row, RowIter, Table};
pub use tablekind::{columns, TableKind, MAX_COLUMNS};
