//! The closed set of supported metadata tables and their column schemas.
//!
//! Every table is declared exactly once in the [`define_tables!`] invocation below. The
//! declaration produces the [`TableKind`] enum, the ordered column list of each table (consumed
//! by layout computation, row decoding and row rendering) and one module of column index
//! constants per table under [`columns`].
//!
//! Column types are written in a compact notation:
//!
//! | Notation | Meaning |
//! |---|---|
//! | `u8`, `u16`, `u32` | Fixed-width constant |
//! | `string`, `guid`, `blob` | Heap index |
//! | `[Table]` | Simple index into `Table` |
//! | `[Table..]` | Simple index starting a run of rows in `Table` |
//! | `(Kind)` | Coded index of kind `Kind` |
//!
//! # Reference
//! - [ECMA-335 II.22](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use strum::{Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

use crate::metadata::tables::{CodedIndexKind, Column, ColumnType, HeapKind};

macro_rules! column_type {
    (u8) => {
        ColumnType::Constant(1)
    };
    (u16) => {
        ColumnType::Constant(2)
    };
    (u32) => {
        ColumnType::Constant(4)
    };
    (string) => {
        ColumnType::Heap(HeapKind::Strings)
    };
    (guid) => {
        ColumnType::Heap(HeapKind::Guid)
    };
    (blob) => {
        ColumnType::Heap(HeapKind::Blob)
    };
    ([$table:ident]) => {
        ColumnType::Table(TableKind::$table)
    };
    ([$table:ident ..]) => {
        ColumnType::Table(TableKind::$table)
    };
    (($coded:ident)) => {
        ColumnType::Coded(CodedIndexKind::$coded)
    };
}

macro_rules! column_is_list {
    ([$table:ident ..]) => {
        true
    };
    ($other:tt) => {
        false
    };
}

macro_rules! column_indices {
    ($index:expr;) => {};
    ($index:expr; $constant:ident $column:ident $(, $rest_constant:ident $rest_column:ident)*) => {
        #[doc = concat!("Index of the `", stringify!($column), "` column")]
        pub const $constant: usize = $index;
        column_indices!($index + 1; $($rest_constant $rest_column),*);
    };
}

macro_rules! define_tables {
    ($(
        $(#[$doc:meta])*
        $kind:ident = $number:literal, $module:ident {
            $($constant:ident: $column:ident $ty:tt),* $(,)?
        }
    ),* $(,)?) => {
        /// The metadata tables that can appear in a `#~` stream.
        ///
        /// The discriminant is the table number, which is also the bit of the table in the
        /// `Valid` and `Sorted` masks and the high byte of a metadata token.
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            EnumIter,
            EnumCount,
            EnumString,
            IntoStaticStr,
            Display,
        )]
        #[strum(ascii_case_insensitive)]
        #[repr(u8)]
        pub enum TableKind {
            $(
                $(#[$doc])*
                $kind = $number,
            )*
        }

        impl TableKind {
            /// Look up a table by its number, `None` for numbers outside the supported set
            #[must_use]
            pub fn from_number(number: u8) -> Option<TableKind> {
                match number {
                    $($number => Some(TableKind::$kind),)*
                    _ => None,
                }
            }

            /// The columns of this table, in on-disk order
            #[must_use]
            pub fn columns(self) -> &'static [Column] {
                match self {
                    $(
                        TableKind::$kind => &[
                            $(Column {
                                name: stringify!($column),
                                ty: column_type!($ty),
                                is_list: column_is_list!($ty),
                            },)*
                        ],
                    )*
                }
            }
        }

        /// Column index constants, one module per table.
        ///
        /// ```rust
        /// use winmd::metadata::tables::columns::type_def;
        ///
        /// assert_eq!(type_def::TYPE_NAME, 1);
        /// assert_eq!(type_def::TYPE_NAMESPACE, 2);
        /// ```
        pub mod columns {
            $(
                #[doc = concat!("Columns of the `", stringify!($kind), "` table")]
                pub mod $module {
                    column_indices!(0; $($constant $column),*);
                }
            )*
        }
    };
}

define_tables! {
    /// The current module, exactly one row
    Module = 0x00, module {
        GENERATION: Generation u16,
        NAME: Name string,
        MVID: Mvid guid,
        ENC_ID: EncId guid,
        ENC_BASE_ID: EncBaseId guid,
    },
    /// References to types defined in other modules or assemblies
    TypeRef = 0x01, type_ref {
        RESOLUTION_SCOPE: ResolutionScope (ResolutionScope),
        TYPE_NAME: TypeName string,
        TYPE_NAMESPACE: TypeNamespace string,
    },
    /// Types defined in this module
    TypeDef = 0x02, type_def {
        FLAGS: Flags u32,
        TYPE_NAME: TypeName string,
        TYPE_NAMESPACE: TypeNamespace string,
        EXTENDS: Extends (TypeDefOrRef),
        FIELD_LIST: FieldList [Field..],
        METHOD_LIST: MethodList [MethodDef..],
    },
    /// Field definitions, owned by `TypeDef` runs
    Field = 0x04, field {
        FLAGS: Flags u16,
        NAME: Name string,
        SIGNATURE: Signature blob,
    },
    /// Method definitions, owned by `TypeDef` runs
    MethodDef = 0x06, method_def {
        RVA: RVA u32,
        IMPL_FLAGS: ImplFlags u16,
        FLAGS: Flags u16,
        NAME: Name string,
        SIGNATURE: Signature blob,
        PARAM_LIST: ParamList [Param..],
    },
    /// Method parameters, owned by `MethodDef` runs
    Param = 0x08, param {
        FLAGS: Flags u16,
        SEQUENCE: Sequence u16,
        NAME: Name string,
    },
    /// Interfaces implemented by a type
    InterfaceImpl = 0x09, interface_impl {
        CLASS: Class [TypeDef],
        INTERFACE: Interface (TypeDefOrRef),
    },
    /// References to members of other types
    MemberRef = 0x0A, member_ref {
        CLASS: Class (MemberRefParent),
        NAME: Name string,
        SIGNATURE: Signature blob,
    },
    /// Compile-time constant values of fields, parameters and properties
    Constant = 0x0B, constant {
        TYPE: Type u8,
        PADDING: Padding u8,
        PARENT: Parent (HasConstant),
        VALUE: Value blob,
    },
    /// Custom attributes attached to metadata rows
    CustomAttribute = 0x0C, custom_attribute {
        PARENT: Parent (HasCustomAttribute),
        TYPE: Type (CustomAttributeType),
        VALUE: Value blob,
    },
    /// Marshalling descriptors of fields and parameters
    FieldMarshal = 0x0D, field_marshal {
        PARENT: Parent (HasFieldMarshal),
        NATIVE_TYPE: NativeType blob,
    },
    /// Declarative security attached to types, methods and assemblies
    DeclSecurity = 0x0E, decl_security {
        ACTION: Action u16,
        PARENT: Parent (HasDeclSecurity),
        PERMISSION_SET: PermissionSet blob,
    },
    /// Explicit layout information of a type
    ClassLayout = 0x0F, class_layout {
        PACKING_SIZE: PackingSize u16,
        CLASS_SIZE: ClassSize u32,
        PARENT: Parent [TypeDef],
    },
    /// Explicit field offsets
    FieldLayout = 0x10, field_layout {
        OFFSET: Offset u32,
        FIELD: Field [Field],
    },
    /// Stand-alone signatures
    StandAloneSig = 0x11, stand_alone_sig {
        SIGNATURE: Signature blob,
    },
    /// Maps a type to its run of events
    EventMap = 0x12, event_map {
        PARENT: Parent [TypeDef],
        EVENT_LIST: EventList [Event..],
    },
    /// Event definitions
    Event = 0x14, event {
        EVENT_FLAGS: EventFlags u16,
        NAME: Name string,
        EVENT_TYPE: EventType (TypeDefOrRef),
    },
    /// Maps a type to its run of properties
    PropertyMap = 0x15, property_map {
        PARENT: Parent [TypeDef],
        PROPERTY_LIST: PropertyList [Property..],
    },
    /// Property definitions
    Property = 0x17, property {
        FLAGS: Flags u16,
        NAME: Name string,
        TYPE: Type blob,
    },
    /// Associates accessor methods with events and properties
    MethodSemantics = 0x18, method_semantics {
        SEMANTICS: Semantics u16,
        METHOD: Method [MethodDef],
        ASSOCIATION: Association (HasSemantics),
    },
    /// Explicit method overrides
    MethodImpl = 0x19, method_impl {
        CLASS: Class [TypeDef],
        METHOD_BODY: MethodBody (MethodDefOrRef),
        METHOD_DECLARATION: MethodDeclaration (MethodDefOrRef),
    },
    /// References to other modules
    ModuleRef = 0x1A, module_ref {
        NAME: Name string,
    },
    /// Type specifications, e.g. generic instantiations
    TypeSpec = 0x1B, type_spec {
        SIGNATURE: Signature blob,
    },
    /// Platform invoke mappings
    ImplMap = 0x1C, impl_map {
        MAPPING_FLAGS: MappingFlags u16,
        MEMBER_FORWARDED: MemberForwarded (MemberForwarded),
        IMPORT_NAME: ImportName string,
        IMPORT_SCOPE: ImportScope [ModuleRef],
    },
    /// Initial values of fields stored in the image
    FieldRVA = 0x1D, field_rva {
        RVA: RVA u32,
        FIELD: Field [Field],
    },
    /// The assembly manifest, at most one row
    Assembly = 0x20, assembly {
        HASH_ALG_ID: HashAlgId u32,
        MAJOR_VERSION: MajorVersion u16,
        MINOR_VERSION: MinorVersion u16,
        BUILD_NUMBER: BuildNumber u16,
        REVISION_NUMBER: RevisionNumber u16,
        FLAGS: Flags u32,
        PUBLIC_KEY: PublicKey blob,
        NAME: Name string,
        CULTURE: Culture string,
    },
    /// Unused, processors the assembly targets
    AssemblyProcessor = 0x21, assembly_processor {
        PROCESSOR: Processor u32,
    },
    /// Unused, operating systems the assembly targets
    AssemblyOS = 0x22, assembly_os {
        OS_PLATFORM_ID: OSPlatformID u32,
        OS_MAJOR_VERSION: OSMajorVersion u32,
        OS_MINOR_VERSION: OSMinorVersion u32,
    },
    /// References to other assemblies
    AssemblyRef = 0x23, assembly_ref {
        MAJOR_VERSION: MajorVersion u16,
        MINOR_VERSION: MinorVersion u16,
        BUILD_NUMBER: BuildNumber u16,
        REVISION_NUMBER: RevisionNumber u16,
        FLAGS: Flags u32,
        PUBLIC_KEY_OR_TOKEN: PublicKeyOrToken blob,
        NAME: Name string,
        CULTURE: Culture string,
        HASH_VALUE: HashValue blob,
    },
    /// Unused, processors a referenced assembly targets
    AssemblyRefProcessor = 0x24, assembly_ref_processor {
        PROCESSOR: Processor u32,
        ASSEMBLY_REF: AssemblyRef [AssemblyRef],
    },
    /// Unused, operating systems a referenced assembly targets
    AssemblyRefOS = 0x25, assembly_ref_os {
        OS_PLATFORM_ID: OSPlatformId u32,
        OS_MAJOR_VERSION: OSMajorVersion u32,
        OS_MINOR_VERSION: OSMinorVersion u32,
        ASSEMBLY_REF: AssemblyRef [AssemblyRef],
    },
    /// Files of a multi-file assembly
    File = 0x26, file {
        FLAGS: Flags u32,
        NAME: Name string,
        HASH_VALUE: HashValue blob,
    },
    /// Types exported from other modules of the assembly, or forwarded
    ExportedType = 0x27, exported_type {
        FLAGS: Flags u32,
        TYPE_DEF_ID: TypeDefId u32,
        TYPE_NAME: TypeName string,
        TYPE_NAMESPACE: TypeNamespace string,
        IMPLEMENTATION: Implementation (Implementation),
    },
    /// Resources of the assembly
    ManifestResource = 0x28, manifest_resource {
        OFFSET: Offset u32,
        FLAGS: Flags u32,
        NAME: Name string,
        IMPLEMENTATION: Implementation (Implementation),
    },
    /// Nesting relationships between types
    NestedClass = 0x29, nested_class {
        NESTED_CLASS: NestedClass [TypeDef],
        ENCLOSING_CLASS: EnclosingClass [TypeDef],
    },
    /// Generic parameters of types and methods
    GenericParam = 0x2A, generic_param {
        NUMBER: Number u16,
        FLAGS: Flags u16,
        OWNER: Owner (TypeOrMethodDef),
        NAME: Name string,
    },
    /// Generic method instantiations
    MethodSpec = 0x2B, method_spec {
        METHOD: Method (MethodDefOrRef),
        INSTANTIATION: Instantiation blob,
    },
    /// Constraints on generic parameters
    GenericParamConstraint = 0x2C, generic_param_constraint {
        OWNER: Owner [GenericParam],
        CONSTRAINT: Constraint (TypeDefOrRef),
    },
}

/// Most columns any supported table has
pub const MAX_COLUMNS: usize = 9;

impl TableKind {
    /// The table number, 0 to 44
    #[must_use]
    pub fn number(self) -> u8 {
        self as u8
    }

    /// The bit of this table in the `Valid` and `Sorted` masks
    #[must_use]
    pub fn mask(self) -> u64 {
        1 << self.number()
    }

    /// The table's name, e.g. `TypeDef`
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Find a column by its name
    #[must_use]
    pub fn column_index(self, name: &str) -> Option<usize> {
        self.columns().iter().position(|column| column.name == name)
    }
}
