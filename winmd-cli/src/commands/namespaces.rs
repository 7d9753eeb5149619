use std::path::Path;

use crate::{app::GlobalOptions, commands::common::load_database};

pub fn run(path: &Path, opts: &GlobalOptions) -> anyhow::Result<()> {
    let db = load_database(path, opts)?;

    for namespace in db.namespaces()? {
        println!("{namespace}");
    }
    Ok(())
}
