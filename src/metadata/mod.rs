//! ECMA-335 metadata as found in WinMD files.
//!
//! Decoding walks from the PE image to the COM descriptor ([`cor20header`]), from there to the
//! metadata root and its stream directory ([`root`]), and finally into the streams
//! ([`streams`]). The `#~` stream is split into [`tables`] whose rows decode on demand.
//! [`database::Database`] ties all of this together and is the type most callers want.
//!
//! # Key Components
//!
//! - [`database::Database`] - An opened WinMD file, owning its bytes
//! - [`config::DecoderConfig`] - Behaviour for ambiguous inputs
//! - [`tables::Table`] / [`tables::Row`] - Table access
//! - [`token::Token`] - Row references as used by signatures and attributes
//! - [`version::AssemblyVersion`] - Four-part assembly versions
//!
//! # Examples
//!
//! ```rust,no_run
//! use winmd::{metadata::tables::{columns::module, TableKind}, Database};
//!
//! let db = Database::from_file("Windows.Foundation.winmd")?;
//! let module = db.table(TableKind::Module).row(0)?;
//! println!("{} {}", module.string(module::NAME)?, module.guid(module::MVID)?);
//! # Ok::<(), winmd::Error>(())
//! ```

/// Decoder options
pub mod config;
/// The CLI header (`IMAGE_COR20_HEADER`)
pub mod cor20header;
/// The decoded database, entry point of the crate
pub mod database;
/// The metadata root and stream directory
pub mod root;
/// Metadata streams and heaps
pub mod streams;
/// Metadata tables, their schemas and rows
pub mod tables;
/// Metadata tokens
pub mod token;
/// Assembly version numbers
pub mod version;
