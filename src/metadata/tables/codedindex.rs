//! Coded indices.
//!
//! A coded index stores a reference to a row in one of several tables in a single integer. The
//! low bits (the tag) select the table from a fixed candidate list, the remaining bits hold the
//! 1-based row number. The number of tag bits is the number of bits needed to represent the
//! highest tag, so a column with three candidates spends 2 bits on the tag.
//!
//! The candidate lists and their order are part of the file format.
//!
//! # Reference
//! - [ECMA-335 II.24.2.6](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::fmt;

use strum::{EnumCount, EnumIter, IntoStaticStr};

use crate::{
    metadata::{tables::TableKind, token::Token},
    Error, Result,
};

/// All kinds of coded index used by the supported tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount, IntoStaticStr)]
pub enum CodedIndexKind {
    /// `TypeDef`, `TypeRef` or `TypeSpec`
    TypeDefOrRef,
    /// Owner of a `Constant`: `Field`, `Param` or `Property`
    HasConstant,
    /// Owner of a `CustomAttribute`, any of 22 tables
    HasCustomAttribute,
    /// Owner of a `FieldMarshal`: `Field` or `Param`
    HasFieldMarshal,
    /// Owner of a `DeclSecurity`: `TypeDef`, `MethodDef` or `Assembly`
    HasDeclSecurity,
    /// Parent of a `MemberRef`
    MemberRefParent,
    /// Association of a `MethodSemantics`: `Event` or `Property`
    HasSemantics,
    /// `MethodDef` or `MemberRef`
    MethodDefOrRef,
    /// Member forwarded by an `ImplMap`: `Field` or `MethodDef`
    MemberForwarded,
    /// Where an exported type or resource lives: `File`, `AssemblyRef` or `ExportedType`
    Implementation,
    /// Constructor of a `CustomAttribute`: `MethodDef` or `MemberRef`
    CustomAttributeType,
    /// Scope a `TypeRef` is resolved in
    ResolutionScope,
    /// Owner of a `GenericParam`: `TypeDef` or `MethodDef`
    TypeOrMethodDef,
}

impl CodedIndexKind {
    /// The candidate tables, in tag order. `None` marks a tag value that is reserved.
    #[must_use]
    pub fn candidates(self) -> &'static [Option<TableKind>] {
        use TableKind as T;

        match self {
            CodedIndexKind::TypeDefOrRef => {
                &[Some(T::TypeDef), Some(T::TypeRef), Some(T::TypeSpec)]
            }
            CodedIndexKind::HasConstant => &[Some(T::Field), Some(T::Param), Some(T::Property)],
            CodedIndexKind::HasCustomAttribute => &[
                Some(T::MethodDef),
                Some(T::Field),
                Some(T::TypeRef),
                Some(T::TypeDef),
                Some(T::Param),
                Some(T::InterfaceImpl),
                Some(T::MemberRef),
                Some(T::Module),
                // Listed as 'Permission' in ECMA-335, which is the DeclSecurity table
                Some(T::DeclSecurity),
                Some(T::Property),
                Some(T::Event),
                Some(T::StandAloneSig),
                Some(T::ModuleRef),
                Some(T::TypeSpec),
                Some(T::Assembly),
                Some(T::AssemblyRef),
                Some(T::File),
                Some(T::ExportedType),
                Some(T::ManifestResource),
                Some(T::GenericParam),
                Some(T::GenericParamConstraint),
                Some(T::MethodSpec),
            ],
            CodedIndexKind::HasFieldMarshal => &[Some(T::Field), Some(T::Param)],
            CodedIndexKind::HasDeclSecurity => {
                &[Some(T::TypeDef), Some(T::MethodDef), Some(T::Assembly)]
            }
            CodedIndexKind::MemberRefParent => &[
                Some(T::TypeDef),
                Some(T::TypeRef),
                Some(T::ModuleRef),
                Some(T::MethodDef),
                Some(T::TypeSpec),
            ],
            CodedIndexKind::HasSemantics => &[Some(T::Event), Some(T::Property)],
            CodedIndexKind::MethodDefOrRef => &[Some(T::MethodDef), Some(T::MemberRef)],
            CodedIndexKind::MemberForwarded => &[Some(T::Field), Some(T::MethodDef)],
            CodedIndexKind::Implementation => {
                &[Some(T::File), Some(T::AssemblyRef), Some(T::ExportedType)]
            }
            CodedIndexKind::CustomAttributeType => {
                &[None, None, Some(T::MethodDef), Some(T::MemberRef), None]
            }
            CodedIndexKind::ResolutionScope => &[
                Some(T::Module),
                Some(T::ModuleRef),
                Some(T::AssemblyRef),
                Some(T::TypeRef),
            ],
            CodedIndexKind::TypeOrMethodDef => &[Some(T::TypeDef), Some(T::MethodDef)],
        }
    }

    /// Number of low bits holding the tag
    #[must_use]
    pub fn tag_bits(self) -> u32 {
        let highest_tag = self.candidates().len() - 1;
        usize::BITS - highest_tag.leading_zeros()
    }

    /// The kind's name, e.g. `TypeDefOrRef`
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Split a raw coded index into the referenced table and row.
    ///
    /// ## Arguments
    /// * 'raw' - The value as stored in the column
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidIndex`] if the tag is out of range or names a reserved slot
    pub fn resolve(self, raw: u32) -> Result<CodedIndex> {
        let tag_bits = self.tag_bits();
        let tag = raw & ((1 << tag_bits) - 1);
        let row = raw >> tag_bits;

        match self.candidates().get(tag as usize) {
            Some(Some(table)) => Ok(CodedIndex {
                kind: self,
                table: *table,
                row,
            }),
            _ => Err(Error::InvalidIndex(format!(
                "Tag {} of {} coded index 0x{:X} selects no table",
                tag,
                self.name(),
                raw
            ))),
        }
    }

    /// Build the raw value referring to `row` of `table`.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidIndex`] if `table` is not a candidate of this kind, or the
    /// row does not fit beside the tag.
    pub fn encode(self, table: TableKind, row: u32) -> Result<u32> {
        let Some(tag) = self
            .candidates()
            .iter()
            .position(|candidate| *candidate == Some(table))
        else {
            return Err(Error::InvalidIndex(format!(
                "{} is not a candidate of {}",
                table,
                self.name()
            )));
        };

        let tag_bits = self.tag_bits();
        if row > (u32::MAX >> tag_bits) {
            return Err(Error::InvalidIndex(format!(
                "Row {} does not fit a {} coded index",
                row,
                self.name()
            )));
        }

        Ok((row << tag_bits) | tag as u32)
    }
}

/// A resolved coded index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodedIndex {
    /// The kind of coded index this value was resolved as
    pub kind: CodedIndexKind,
    /// The referenced table
    pub table: TableKind,
    /// The 1-based row in `table`; 0 is a null reference
    pub row: u32,
}

impl CodedIndex {
    /// Returns `true` for the null reference (row 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.row == 0
    }

    /// The metadata token of the referenced row
    #[must_use]
    pub fn token(&self) -> Token {
        Token::from_parts(self.table, self.row)
    }
}

impl fmt::Display for CodedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Row {}", self.table, self.row)
    }
}
