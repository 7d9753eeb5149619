// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # winmd
//!
//! A decoder for Windows Metadata (`.winmd`) files. A WinMD file is a PE image whose CLI header
//! points at ECMA-335 metadata; this crate locates that metadata and exposes its tables and heaps
//! without any dependency on Windows or the .NET runtime.
//!
//! Decoding is lazy. Opening a file validates the PE headers, the metadata root, the stream
//! directory and the layout of the tables stream, after which rows are located by arithmetic and
//! their columns are decoded only when they are read.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use winmd::prelude::*;
//!
//! let db = Database::from_file("Windows.Foundation.winmd")?;
//! for row in db.table(TableKind::TypeDef).rows() {
//!     let namespace = row.string(columns::type_def::TYPE_NAMESPACE)?;
//!     let name = row.string(columns::type_def::TYPE_NAME)?;
//!     println!("{namespace}.{name}");
//! }
//! # Ok::<(), winmd::Error>(())
//! ```
//!
//! ### Decoder Configuration
//!
//! Implementations disagree on how wide an index into an absent table is. The default
//! [`DecoderConfig`] matches the tools that produce WinMD files; [`DecoderConfig::ecma`] follows
//! the letter of ECMA-335:
//!
//! ```rust,no_run
//! use winmd::{Database, DecoderConfig};
//!
//! let db = Database::from_file_with_config("Custom.winmd", DecoderConfig::ecma())?;
//! println!("{} tables", db.tables().count());
//! # Ok::<(), winmd::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`file`] - Byte access (memory-mapped or owned) and PE image parsing
//! - [`metadata`] - The metadata root, streams, tables and the [`Database`]
//! - [`prelude`] - Re-exports for glob imports
//! - [`Error`] and [`Result`] - Error handling
//!
//! Logging goes through the [`log`] facade. The decoder emits `debug!` records for every stream
//! and table it lays out and `warn!` records for tolerated anomalies such as unknown stream names.

#[macro_use]
pub(crate) mod error;

/// Byte access to the input and PE image parsing
pub mod file;

/// Metadata root, streams, tables and the database built from them
pub mod metadata;

/// Convenient re-exports of the most commonly used types
///
/// ```rust,no_run
/// use winmd::prelude::*;
///
/// let db = Database::from_file("Windows.Foundation.winmd")?;
/// println!("{}", db.root().version);
/// # Ok::<(), winmd::Error>(())
/// ```
pub mod prelude;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// `winmd` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `winmd` Error type
///
/// ```rust,no_run
/// use winmd::{Database, Error};
///
/// match Database::from_file("Broken.winmd") {
///     Ok(db) => println!("{} types", db.table(winmd::TableKind::TypeDef).len()),
///     Err(Error::BadImageFormat { message, .. }) => println!("Not a WinMD file: {message}"),
///     Err(error) => println!("Error: {error}"),
/// }
/// ```
pub use error::Error;

/// The decoded metadata of one WinMD file, see [`metadata::database::Database`]
pub use metadata::database::Database;

/// Decoder options, see [`metadata::config::DecoderConfig`]
pub use metadata::config::DecoderConfig;

/// Identifies one of the metadata tables
pub use metadata::tables::TableKind;

/// Metadata token
pub use metadata::token::Token;

/// Byte access to the input
pub use file::{parser::Parser, ByteView};
