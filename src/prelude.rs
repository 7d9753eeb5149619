//! # winmd Prelude
//!
//! The types needed to open a WinMD file and walk its tables, for glob imports.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all winmd operations
pub use crate::Error;

/// The result type used throughout winmd
pub use crate::Result;

/// Options controlling how ambiguous inputs are decoded
pub use crate::DecoderConfig;

// ================================================================================================
// Entry Points
// ================================================================================================

/// The decoded metadata of one WinMD file
pub use crate::Database;

/// Byte access to the input
pub use crate::{ByteView, Parser};

// ================================================================================================
// Metadata Structures
// ================================================================================================

/// Metadata root and stream directory
pub use crate::metadata::root::{MetadataRoot, CIL_HEADER_MAGIC};

/// Metadata streams and heaps
pub use crate::metadata::streams::{
    BlobsHeap, GuidHeap, StreamHeader, StringsHeap, TablesStreamHeader,
};

/// Metadata tokens
pub use crate::metadata::token::Token;

/// Assembly version numbers
pub use crate::metadata::version::AssemblyVersion;

// ================================================================================================
// Tables
// ================================================================================================

/// Table access and column constants
pub use crate::metadata::tables::{
    columns, CodedIndex, CodedIndexKind, Row, Table, TableKind,
};

/// Attribute flags
pub use crate::metadata::tables::{
    AssemblyFlags, Attributes, EventAttributes, FieldAttributes, MethodAttributes,
    MethodImplAttributes, MethodSemanticsAttributes, ParamAttributes, PropertyAttributes,
    TypeAttributes,
};
