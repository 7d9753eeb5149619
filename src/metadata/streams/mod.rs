//! Metadata streams.
//!
//! The metadata root lists a number of named streams. A WinMD decoder needs four of them:
//!
//! - **`#~`** - The compressed metadata tables, see [`TablesStreamHeader`]
//! - **`#Strings`** - UTF-8 identifiers, see [`StringsHeap`]
//! - **`#Blob`** - Length-prefixed binary data such as signatures, see [`BlobsHeap`]
//! - **`#GUID`** - 16-byte GUIDs, see [`GuidHeap`]
//!
//! The heap wrappers borrow the stream bytes and decode entries on demand.
//!
//! # Examples
//!
//! ```rust
//! use winmd::metadata::streams::{BlobsHeap, StringsHeap};
//!
//! let strings = StringsHeap::from(&[0x00, b'W', b'i', b'n', 0x00])?;
//! assert_eq!(strings.get(1)?, "Win");
//!
//! let blobs = BlobsHeap::from(&[0x00, 0x02, 0x20, 0x00])?;
//! assert_eq!(blobs.get(1)?, &[0x20, 0x00]);
//! # Ok::<(), winmd::Error>(())
//! ```
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 24.2.2 - Stream Headers

mod blob;
mod guid;
mod streamheader;
mod strings;
mod tablesheader;

pub use blob::{BlobIterator, BlobsHeap};
pub use guid::GuidHeap;
pub use streamheader::StreamHeader;
pub use strings::StringsHeap;
pub use tablesheader::{TablesStreamHeader, TABLES_HEADER_SIZE};

/// Name of the compressed tables stream
pub const TABLES_STREAM: &str = "#~";
