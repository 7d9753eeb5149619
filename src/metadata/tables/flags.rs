//! Attribute flags stored in table columns.
//!
//! Each flags type holds the independent bits of one attribute column. Sub-fields that are
//! enumerations rather than bit sets (type visibility, member access, layout, code type) are
//! isolated with the `*_MASK` constants and named by helper methods.
//!
//! [`Attributes`] picks the right type for a (table, column) pair and is what row rendering
//! prints.
//!
//! # Reference
//! - [ECMA-335 II.23.1](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::fmt;

use bitflags::{bitflags, parser::to_writer};

use crate::metadata::tables::{columns, TableKind};

bitflags! {
    /// `TypeDef.Flags` and `ExportedType.Flags`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeAttributes: u32 {
        /// Type is an interface
        const INTERFACE = 0x0000_0020;
        /// Type cannot be instantiated
        const ABSTRACT = 0x0000_0080;
        /// Type cannot be derived from
        const SEALED = 0x0000_0100;
        /// Name is special
        const SPECIAL_NAME = 0x0000_0400;
        /// Type is imported
        const IMPORT = 0x0000_1000;
        /// Type is serializable
        const SERIALIZABLE = 0x0000_2000;
        /// Type is a Windows Runtime type
        const WINDOWS_RUNTIME = 0x0000_4000;
        /// Runtime checks the name encoding
        const RT_SPECIAL_NAME = 0x0000_0800;
        /// Type has security information attached
        const HAS_SECURITY = 0x0004_0000;
        /// Static initializer may run lazily
        const BEFORE_FIELD_INIT = 0x0010_0000;
        /// `ExportedType` is a type forwarder
        const FORWARDER = 0x0020_0000;
    }
}

impl TypeAttributes {
    /// Bits holding the visibility
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    /// Bits holding the field layout
    pub const LAYOUT_MASK: u32 = 0x0000_0018;
    /// Bits holding the string format used for interop
    pub const STRING_FORMAT_MASK: u32 = 0x0003_0000;

    /// Name of the visibility, e.g. `PUBLIC` or `NESTED_PRIVATE`
    #[must_use]
    pub fn visibility(self) -> &'static str {
        match self.bits() & Self::VISIBILITY_MASK {
            0 => "NOT_PUBLIC",
            1 => "PUBLIC",
            2 => "NESTED_PUBLIC",
            3 => "NESTED_PRIVATE",
            4 => "NESTED_FAMILY",
            5 => "NESTED_ASSEMBLY",
            6 => "NESTED_FAM_AND_ASSEM",
            _ => "NESTED_FAM_OR_ASSEM",
        }
    }

    /// Returns `true` for nested types
    #[must_use]
    pub fn is_nested(self) -> bool {
        (self.bits() & Self::VISIBILITY_MASK) >= 2
    }

    /// Name of the field layout
    #[must_use]
    pub fn layout(self) -> &'static str {
        match self.bits() & Self::LAYOUT_MASK {
            0x00 => "AUTO_LAYOUT",
            0x08 => "SEQUENTIAL_LAYOUT",
            0x10 => "EXPLICIT_LAYOUT",
            _ => "INVALID_LAYOUT",
        }
    }

    /// Name of the interop string format
    #[must_use]
    pub fn string_format(self) -> &'static str {
        match self.bits() & Self::STRING_FORMAT_MASK {
            0x0000_0000 => "ANSI_CLASS",
            0x0001_0000 => "UNICODE_CLASS",
            0x0002_0000 => "AUTO_CLASS",
            _ => "CUSTOM_FORMAT_CLASS",
        }
    }
}

bitflags! {
    /// `Field.Flags`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FieldAttributes: u16 {
        /// Field belongs to the type rather than an instance
        const STATIC = 0x0010;
        /// Field can only be set during initialization
        const INIT_ONLY = 0x0020;
        /// Value is a compile-time constant
        const LITERAL = 0x0040;
        /// Field is not serialized
        const NOT_SERIALIZED = 0x0080;
        /// Field has an RVA
        const HAS_FIELD_RVA = 0x0100;
        /// Name is special
        const SPECIAL_NAME = 0x0200;
        /// Runtime checks the name encoding
        const RT_SPECIAL_NAME = 0x0400;
        /// Field has marshalling information
        const HAS_FIELD_MARSHAL = 0x1000;
        /// Implementation is forwarded through platform invoke
        const PINVOKE_IMPL = 0x2000;
        /// Field has a default value
        const HAS_DEFAULT = 0x8000;
    }
}

impl FieldAttributes {
    /// Bits holding the member access
    pub const FIELD_ACCESS_MASK: u16 = 0x0007;

    /// Name of the member access, e.g. `PUBLIC`
    #[must_use]
    pub fn access(self) -> &'static str {
        member_access(self.bits() & Self::FIELD_ACCESS_MASK)
    }
}

bitflags! {
    /// `MethodDef.Flags`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MethodAttributes: u16 {
        /// Method is exported to unmanaged code
        const UNMANAGED_EXPORT = 0x0008;
        /// Method belongs to the type rather than an instance
        const STATIC = 0x0010;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method hides by name and signature
        const HIDE_BY_SIG = 0x0080;
        /// Method always gets a new vtable slot
        const NEW_SLOT = 0x0100;
        /// Method can only be overridden if also accessible
        const STRICT = 0x0200;
        /// Method has no implementation
        const ABSTRACT = 0x0400;
        /// Name is special
        const SPECIAL_NAME = 0x0800;
        /// Runtime checks the name encoding
        const RT_SPECIAL_NAME = 0x1000;
        /// Implementation is forwarded through platform invoke
        const PINVOKE_IMPL = 0x2000;
        /// Method has security information attached
        const HAS_SECURITY = 0x4000;
        /// Method calls another method containing security code
        const REQUIRE_SEC_OBJECT = 0x8000;
    }
}

impl MethodAttributes {
    /// Bits holding the member access
    pub const MEMBER_ACCESS_MASK: u16 = 0x0007;

    /// Name of the member access, e.g. `PUBLIC`
    #[must_use]
    pub fn access(self) -> &'static str {
        member_access(self.bits() & Self::MEMBER_ACCESS_MASK)
    }
}

bitflags! {
    /// `MethodDef.ImplFlags`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MethodImplAttributes: u16 {
        /// Method is unmanaged
        const UNMANAGED = 0x0004;
        /// Method must not be inlined
        const NO_INLINING = 0x0008;
        /// Method is defined elsewhere
        const FORWARD_REF = 0x0010;
        /// Method is single-threaded through the body
        const SYNCHRONIZED = 0x0020;
        /// Method must not be optimized
        const NO_OPTIMIZATION = 0x0040;
        /// Signature is exported exactly as declared
        const PRESERVE_SIG = 0x0080;
        /// Method should be inlined where possible
        const AGGRESSIVE_INLINING = 0x0100;
        /// Implementation is provided by the runtime
        const INTERNAL_CALL = 0x1000;
    }
}

impl MethodImplAttributes {
    /// Bits holding the code type
    pub const CODE_TYPE_MASK: u16 = 0x0003;

    /// Name of the code type, e.g. `IL` or `RUNTIME`
    #[must_use]
    pub fn code_type(self) -> &'static str {
        match self.bits() & Self::CODE_TYPE_MASK {
            0 => "IL",
            1 => "NATIVE",
            2 => "OPTIL",
            _ => "RUNTIME",
        }
    }
}

bitflags! {
    /// `Param.Flags`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ParamAttributes: u16 {
        /// Input parameter
        const IN = 0x0001;
        /// Output parameter
        const OUT = 0x0002;
        /// Optional parameter
        const OPTIONAL = 0x0010;
        /// Parameter has a default value
        const HAS_DEFAULT = 0x1000;
        /// Parameter has marshalling information
        const HAS_FIELD_MARSHAL = 0x2000;
    }
}

bitflags! {
    /// `Event.EventFlags`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventAttributes: u16 {
        /// Name is special
        const SPECIAL_NAME = 0x0200;
        /// Runtime checks the name encoding
        const RT_SPECIAL_NAME = 0x0400;
    }
}

bitflags! {
    /// `Property.Flags`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyAttributes: u16 {
        /// Name is special
        const SPECIAL_NAME = 0x0200;
        /// Runtime checks the name encoding
        const RT_SPECIAL_NAME = 0x0400;
        /// Property has a default value
        const HAS_DEFAULT = 0x1000;
    }
}

bitflags! {
    /// `MethodSemantics.Semantics`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MethodSemanticsAttributes: u16 {
        /// Property setter
        const SETTER = 0x0001;
        /// Property getter
        const GETTER = 0x0002;
        /// Other accessor of a property or event
        const OTHER = 0x0004;
        /// Event subscription
        const ADD_ON = 0x0008;
        /// Event unsubscription
        const REMOVE_ON = 0x0010;
        /// Event raise
        const FIRE = 0x0020;
    }
}

bitflags! {
    /// `Assembly.Flags` and `AssemblyRef.Flags`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AssemblyFlags: u32 {
        /// The public key column holds the full key rather than its token
        const PUBLIC_KEY = 0x0001;
        /// The referenced assembly may be retargeted at runtime
        const RETARGETABLE = 0x0100;
        /// The assembly holds Windows Runtime content
        const WINDOWS_RUNTIME = 0x0200;
        /// JIT optimizations are disabled
        const DISABLE_JIT_COMPILE_OPTIMIZER = 0x4000;
        /// JIT tracking is enabled
        const ENABLE_JIT_COMPILE_TRACKING = 0x8000;
    }
}

fn member_access(access: u16) -> &'static str {
    match access {
        0 => "COMPILER_CONTROLLED",
        1 => "PRIVATE",
        2 => "FAM_AND_ASSEM",
        3 => "ASSEMBLY",
        4 => "FAMILY",
        5 => "FAM_OR_ASSEM",
        6 => "PUBLIC",
        _ => "INVALID_ACCESS",
    }
}

/// Write the enumerated sub-fields followed by the remaining bits, `|`-separated
fn write_flags<B>(f: &mut fmt::Formatter<'_>, fields: &[&str], rest: &B) -> fmt::Result
where
    B: bitflags::Flags,
    B::Bits: bitflags::parser::WriteHex,
{
    f.write_str(&fields.join(" | "))?;

    if !rest.is_empty() {
        if !fields.is_empty() {
            f.write_str(" | ")?;
        }
        to_writer(rest, &mut *f)?;
    }

    Ok(())
}

impl fmt::Display for TypeAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rest = Self::from_bits_retain(
            self.bits() & !(Self::VISIBILITY_MASK | Self::LAYOUT_MASK | Self::STRING_FORMAT_MASK),
        );
        write_flags(
            f,
            &[self.visibility(), self.layout(), self.string_format()],
            &rest,
        )
    }
}

impl fmt::Display for FieldAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rest = Self::from_bits_retain(self.bits() & !Self::FIELD_ACCESS_MASK);
        write_flags(f, &[self.access()], &rest)
    }
}

impl fmt::Display for MethodAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rest = Self::from_bits_retain(self.bits() & !Self::MEMBER_ACCESS_MASK);
        write_flags(f, &[self.access()], &rest)
    }
}

impl fmt::Display for MethodImplAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rest = Self::from_bits_retain(self.bits() & !Self::CODE_TYPE_MASK);
        write_flags(f, &[self.code_type()], &rest)
    }
}

macro_rules! impl_plain_display {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write_flags(f, &[], self)
                }
            }
        )*
    };
}

impl_plain_display!(
    ParamAttributes,
    EventAttributes,
    PropertyAttributes,
    MethodSemanticsAttributes,
    AssemblyFlags
);

/// The decoded value of an attribute column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attributes {
    /// See [`TypeAttributes`]
    Type(TypeAttributes),
    /// See [`FieldAttributes`]
    Field(FieldAttributes),
    /// See [`MethodAttributes`]
    Method(MethodAttributes),
    /// See [`MethodImplAttributes`]
    MethodImpl(MethodImplAttributes),
    /// See [`ParamAttributes`]
    Param(ParamAttributes),
    /// See [`EventAttributes`]
    Event(EventAttributes),
    /// See [`PropertyAttributes`]
    Property(PropertyAttributes),
    /// See [`MethodSemanticsAttributes`]
    MethodSemantics(MethodSemanticsAttributes),
    /// See [`AssemblyFlags`]
    Assembly(AssemblyFlags),
}

impl Attributes {
    /// Interpret `value` as the attribute flags stored in `column` of `kind`.
    ///
    /// Returns `None` if the column is not an attribute column.
    #[must_use]
    pub fn from_column(kind: TableKind, column: usize, value: u32) -> Option<Attributes> {
        // Attribute columns of 2 bytes never hold more than 16 bits
        let short = value as u16;

        match (kind, column) {
            (TableKind::TypeDef, columns::type_def::FLAGS)
            | (TableKind::ExportedType, columns::exported_type::FLAGS) => {
                Some(Attributes::Type(TypeAttributes::from_bits_retain(value)))
            }
            (TableKind::Field, columns::field::FLAGS) => {
                Some(Attributes::Field(FieldAttributes::from_bits_retain(short)))
            }
            (TableKind::MethodDef, columns::method_def::FLAGS) => {
                Some(Attributes::Method(MethodAttributes::from_bits_retain(short)))
            }
            (TableKind::MethodDef, columns::method_def::IMPL_FLAGS) => Some(
                Attributes::MethodImpl(MethodImplAttributes::from_bits_retain(short)),
            ),
            (TableKind::Param, columns::param::FLAGS) => {
                Some(Attributes::Param(ParamAttributes::from_bits_retain(short)))
            }
            (TableKind::Event, columns::event::EVENT_FLAGS) => {
                Some(Attributes::Event(EventAttributes::from_bits_retain(short)))
            }
            (TableKind::Property, columns::property::FLAGS) => {
                Some(Attributes::Property(PropertyAttributes::from_bits_retain(short)))
            }
            (TableKind::MethodSemantics, columns::method_semantics::SEMANTICS) => Some(
                Attributes::MethodSemantics(MethodSemanticsAttributes::from_bits_retain(short)),
            ),
            (TableKind::Assembly, columns::assembly::FLAGS)
            | (TableKind::AssemblyRef, columns::assembly_ref::FLAGS) => {
                Some(Attributes::Assembly(AssemblyFlags::from_bits_retain(value)))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attributes::Type(flags) => fmt::Display::fmt(flags, f),
            Attributes::Field(flags) => fmt::Display::fmt(flags, f),
            Attributes::Method(flags) => fmt::Display::fmt(flags, f),
            Attributes::MethodImpl(flags) => fmt::Display::fmt(flags, f),
            Attributes::Param(flags) => fmt::Display::fmt(flags, f),
            Attributes::Event(flags) => fmt::Display::fmt(flags, f),
            Attributes::Property(flags) => fmt::Display::fmt(flags, f),
            Attributes::MethodSemantics(flags) => fmt::Display::fmt(flags, f),
            Attributes::Assembly(flags) => fmt::Display::fmt(flags, f),
        }
    }
}
