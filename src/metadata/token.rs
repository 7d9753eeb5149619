use std::fmt;

use crate::metadata::tables::TableKind;

/// A metadata token, naming a row of a metadata table.
///
/// Tokens consist of a 32-bit value where:
/// - The high byte (bits 24-31) holds the table number
/// - The low 24 bits (bits 0-23) hold the 1-based row (RID)
///
/// ```rust
/// use winmd::{metadata::tables::TableKind, Token};
///
/// let token = Token::from_parts(TableKind::TypeDef, 1);
/// assert_eq!(token.to_string(), "0x02000001");
/// assert_eq!(token.table_kind(), Some(TableKind::TypeDef));
/// assert_eq!(token.row(), 1);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

impl Token {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates the token of row `rid` in `table`. Bits of `rid` above 24 are dropped.
    #[must_use]
    pub fn from_parts(table: TableKind, rid: u32) -> Self {
        Token((u32::from(table.number()) << 24) | (rid & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// The table number (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The table, if the number names a supported table
    #[must_use]
    pub fn table_kind(&self) -> Option<TableKind> {
        TableKind::from_number(self.table())
    }

    /// The 1-based row (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true for a token without a row
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.row() == 0
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn parts() {
        let token = Token(0x0600_0001);
        assert_eq!(token.value(), 0x0600_0001);
        assert_eq!(token.table(), 0x06);
        assert_eq!(token.table_kind(), Some(TableKind::MethodDef));
        assert_eq!(token.row(), 1);
        assert!(!token.is_null());

        assert_eq!(
            Token::from_parts(TableKind::GenericParamConstraint, 0x0123_4567),
            Token(0x2C23_4567)
        );
        assert_eq!(Token::from_parts(TableKind::Module, 1), Token(0x0000_0001));
    }

    #[test]
    fn null_and_unsupported() {
        assert!(Token(0x0000_0000).is_null());
        assert!(Token(0x0200_0000).is_null());
        assert_eq!(Token(0x0300_0001).table_kind(), None);
        assert_eq!(Token(0xFF00_0001).table_kind(), None);
    }

    #[test]
    fn boundary_values() {
        let max_token = Token(0xFFFF_FFFF);
        assert_eq!(max_token.table(), 0xFF);
        assert_eq!(max_token.row(), 0x00FF_FFFF);

        let table_boundary = Token(0x0100_0000);
        assert_eq!(table_boundary.table(), 0x01);
        assert_eq!(table_boundary.row(), 0);
    }

    #[test]
    fn conversions() {
        let token: Token = 0x0A00_0010_u32.into();
        assert_eq!(token, Token::new(0x0A00_0010));

        let raw: u32 = token.into();
        assert_eq!(raw, 0x0A00_0010);
    }

    #[test]
    fn formatting() {
        assert_eq!(Token(0x0600_0001).to_string(), "0x06000001");
        assert_eq!(Token(0).to_string(), "0x00000000");

        let debug_str = format!("{:?}", Token(0x0600_0001));
        assert!(debug_str.contains("Token(0x06000001"));
        assert!(debug_str.contains("table: 0x06"));
        assert!(debug_str.contains("row: 1"));
    }

    #[test]
    fn ordering_and_hashing() {
        assert!(Token(0x0600_0001) < Token(0x0600_0002));
        assert!(Token(0x0600_0002) < Token(0x0700_0001));

        let mut map = HashMap::new();
        map.insert(Token(0x0600_0001), "Method1");
        map.insert(Token(0x0600_0002), "Method2");
        assert_eq!(map.get(&Token(0x0600_0001)), Some(&"Method1"));
    }
}
