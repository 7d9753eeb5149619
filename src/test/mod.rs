//! Shared helpers for unit tests

mod builder;

pub use builder::WinmdBuilder;
