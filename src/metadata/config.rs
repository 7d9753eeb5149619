//! Decoder configuration
//!
//! The few places where real-world files and the letter of ECMA-335 disagree are exposed as
//! switches on [`DecoderConfig`]. Everything else about decoding is fixed by the file format.

/// Configuration for decoding a metadata database
///
/// The default is [`DecoderConfig::conservative`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Treat tables that are absent from the tables stream as large when computing index widths
    ///
    /// When `true`, a simple or coded index referring to an absent table is 4 bytes wide.
    /// When `false`, absent tables count as having zero rows, which is the ECMA-335 reading.
    pub assume_large_absent_tables: bool,

    /// Reject metadata whose stream directory names the same stream twice
    ///
    /// When `false`, the first stream with a given name wins and a warning is logged.
    pub reject_duplicate_streams: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::conservative()
    }
}

impl DecoderConfig {
    /// Widths that assume absent tables are large, first duplicate stream wins
    #[must_use]
    pub fn conservative() -> Self {
        Self {
            assume_large_absent_tables: true,
            reject_duplicate_streams: false,
        }
    }

    /// Index widths computed exactly as written in ECMA-335 II.24.2.6
    ///
    /// Absent tables count as empty, so an index into them is narrow whenever the other
    /// candidates allow it. Duplicate streams resolve to the first match.
    #[must_use]
    pub fn ecma() -> Self {
        Self {
            assume_large_absent_tables: false,
            reject_duplicate_streams: false,
        }
    }

    /// Conservative widths, and an error for any duplicate stream name
    #[must_use]
    pub fn strict() -> Self {
        Self {
            assume_large_absent_tables: true,
            reject_duplicate_streams: true,
        }
    }
}
