use std::path::Path;

use anyhow::{bail, Context};
use winmd::{Database, DecoderConfig};

use crate::app::GlobalOptions;

/// The decoder configuration selected by the global flags.
pub fn config(opts: &GlobalOptions) -> DecoderConfig {
    let mut config = if opts.ecma_widths {
        DecoderConfig::ecma()
    } else {
        DecoderConfig::conservative()
    };
    config.reject_duplicate_streams = opts.strict_streams;
    config
}

/// Open the database at `path` with the configuration selected by the global flags.
pub fn load_database(path: &Path, opts: &GlobalOptions) -> anyhow::Result<Database> {
    if !path.is_file() {
        bail!("database must be an existing file: {}", path.display());
    }

    Database::from_file_with_config(path, config(opts))
        .with_context(|| format!("failed to decode {}", path.display()))
}
