use thiserror::Error;

macro_rules! bad_image_format {
    // Single string version
    ($msg:expr) => {
        crate::Error::BadImageFormat {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::BadImageFormat {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Decoding never recovers on its own: every failure is surfaced to the caller, which decides
/// whether to skip the offending entry, retry with a different [`crate::DecoderConfig`], or abort.
///
/// # Error Categories
///
/// - [`Error::BadImageFormat`] - Structural violation of the PE or CLI headers, bad magic values,
///   size mismatches, ambiguous section mappings and truncated or malformed structures
/// - [`Error::MetadataStreamNotFound`] - A named metadata stream is not present
/// - [`Error::InvalidIndex`] - An index (coded-index tag, heap offset, GUID index, row or column)
///   points outside of what it indexes
/// - [`Error::UnsupportedSchema`] - The tables stream references a table outside of the known set
/// - [`Error::FileError`] - The input could not be read from disk
#[derive(Error, Debug)]
pub enum Error {
    /// The input is not a well-formed WinMD image.
    ///
    /// The error carries the source location that detected the problem, which is invaluable when
    /// tracking down what part of a damaged file tripped the decoder.
    ///
    /// # Fields
    ///
    /// * `message` - Description of the violated structure
    /// * `file` - Source file where the error was raised
    /// * `line` - Source line where the error was raised
    #[error("Bad image format - {file}:{line}: {message}")]
    BadImageFormat {
        /// The message to be printed for the error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A metadata stream that was requested by name is not present in the stream directory.
    #[error("Metadata stream not found - {0}")]
    MetadataStreamNotFound(String),

    /// An index is out of range for the structure it indexes.
    ///
    /// Raised for coded-index tags that select no candidate table, GUID heap index 0, heap
    /// offsets past the end of their heap and row or column indices outside a table.
    #[error("Invalid index - {0}")]
    InvalidIndex(String),

    /// The tables stream declares a table that is not part of the supported schema.
    #[error("Unsupported schema - {0}")]
    UnsupportedSchema(String),

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if this error signals a structurally damaged image.
    #[must_use]
    pub fn is_bad_image_format(&self) -> bool {
        matches!(self, Error::BadImageFormat { .. })
    }
}

impl From<goblin::error::Error> for Error {
    fn from(error: goblin::error::Error) -> Self {
        bad_image_format!("Invalid PE headers - {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_image_format_records_location() {
        let error = bad_image_format!("missing {} header", "COM");
        match &error {
            Error::BadImageFormat {
                message,
                file,
                line,
            } => {
                assert_eq!(message, "missing COM header");
                assert!(file.ends_with("error.rs"));
                assert!(*line > 0);
            }
            _ => panic!("Expected BadImageFormat"),
        }
        assert!(error.is_bad_image_format());
        assert!(error.to_string().contains("missing COM header"));
    }

    #[test]
    fn goblin_errors_become_bad_image_format() {
        let error: Error = goblin::error::Error::Malformed("broken".to_string()).into();
        assert!(error.is_bad_image_format());
    }

    #[test]
    fn display() {
        assert_eq!(
            Error::MetadataStreamNotFound("#Blob".to_string()).to_string(),
            "Metadata stream not found - #Blob"
        );
        assert_eq!(
            Error::InvalidIndex("GUID index 0".to_string()).to_string(),
            "Invalid index - GUID index 0"
        );
    }
}
