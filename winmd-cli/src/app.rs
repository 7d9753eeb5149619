use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// winmd - inspect Windows Metadata files
#[derive(Debug, Parser)]
#[command(name = "winmd", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Treat absent tables as empty when sizing index columns (ECMA-335 reading).
    #[arg(long, global = true)]
    pub ecma_widths: bool,

    /// Reject metadata with duplicate stream names.
    #[arg(long, global = true)]
    pub strict_streams: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print every present table with its rows.
    Dump {
        /// Path to the .winmd file.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Dump only one table (e.g., TypeDef, MethodDef).
        #[arg(short, long)]
        table: Option<String>,
    },

    /// List the namespaces defined by the file.
    Namespaces {
        /// Path to the .winmd file.
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}
