use std::fmt;

use crate::{
    metadata::tables::{columns, Row, TableKind},
    Error, Result,
};

/// The four-part version of an assembly or assembly reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AssemblyVersion {
    /// Major version
    pub major: u16,
    /// Minor version
    pub minor: u16,
    /// Build number
    pub build: u16,
    /// Revision number
    pub revision: u16,
}

impl AssemblyVersion {
    /// Create a version from its parts
    #[must_use]
    pub fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        AssemblyVersion {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Read the version columns of an `Assembly` or `AssemblyRef` row.
    ///
    /// ```rust,no_run
    /// use winmd::{metadata::{tables::TableKind, version::AssemblyVersion}, Database};
    ///
    /// let db = Database::from_file("Windows.winmd")?;
    /// for row in db.table(TableKind::AssemblyRef).rows() {
    ///     println!("{}", AssemblyVersion::from_row(&row)?);
    /// }
    /// # Ok::<(), winmd::Error>(())
    /// ```
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidIndex`] for rows of any other table
    pub fn from_row(row: &Row<'_>) -> Result<Self> {
        let first = match row.kind() {
            TableKind::Assembly => columns::assembly::MAJOR_VERSION,
            TableKind::AssemblyRef => columns::assembly_ref::MAJOR_VERSION,
            other => {
                return Err(Error::InvalidIndex(format!(
                    "{other} rows do not carry an assembly version"
                )))
            }
        };

        // Major, minor, build and revision are adjacent 2-byte columns in both tables
        Ok(AssemblyVersion {
            major: row.get(first)? as u16,
            minor: row.get(first + 1)? as u16,
            build: row.get(first + 2)? as u16,
            revision: row.get(first + 3)? as u16,
        })
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test::WinmdBuilder, Database};

    #[test]
    fn display() {
        assert_eq!(AssemblyVersion::new(255, 255, 255, 255).to_string(), "255.255.255.255");
        assert_eq!(AssemblyVersion::default().to_string(), "0.0.0.0");
    }

    #[test]
    fn ordering() {
        assert!(AssemblyVersion::new(1, 0, 0, 0) < AssemblyVersion::new(1, 0, 0, 1));
        assert!(AssemblyVersion::new(1, 2, 0, 0) > AssemblyVersion::new(1, 1, 9, 9));
    }

    #[test]
    fn from_rows() {
        let mut builder = WinmdBuilder::new();
        builder.module("Contoso.winmd");
        builder.assembly("Contoso", [1, 2, 3, 4]);
        builder.assembly_ref("mscorlib", [255, 255, 255, 255]);
        let db = Database::from_mem(builder.build()).unwrap();

        let assembly = db.table(TableKind::Assembly).row(0).unwrap();
        assert_eq!(
            AssemblyVersion::from_row(&assembly).unwrap(),
            AssemblyVersion::new(1, 2, 3, 4)
        );

        let reference = db.table(TableKind::AssemblyRef).row(0).unwrap();
        assert_eq!(
            AssemblyVersion::from_row(&reference).unwrap().to_string(),
            "255.255.255.255"
        );

        let module = db.table(TableKind::Module).row(0).unwrap();
        assert!(matches!(
            AssemblyVersion::from_row(&module),
            Err(Error::InvalidIndex(_))
        ));
    }
}
