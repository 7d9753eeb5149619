use std::path::Path;

use anyhow::Context;
use winmd::{metadata::tables::Table, Database, TableKind};

use crate::{
    app::GlobalOptions,
    commands::common::load_database,
    output::{Align, TabWriter},
};

pub fn run(path: &Path, table_filter: Option<&str>, opts: &GlobalOptions) -> anyhow::Result<()> {
    let kind = table_filter
        .map(|name| {
            name.parse::<TableKind>()
                .ok()
                .with_context(|| format!("unknown table '{name}'"))
        })
        .transpose()?;

    let db = load_database(path, opts)?;

    let tables: Vec<Table<'_>> = match kind {
        Some(kind) => vec![db.table(kind)],
        None => db.tables().collect(),
    };

    print_header(path, &db);
    println!();

    let mut summary = TabWriter::new(&[
        ("Table", Align::Left),
        ("Rows", Align::Right),
        ("Stride", Align::Right),
    ]);
    for table in &tables {
        summary.row(vec![
            table.kind().to_string(),
            table.row_count().to_string(),
            table.stride().to_string(),
        ]);
    }
    summary.print();

    for table in &tables {
        if table.is_empty() {
            continue;
        }

        println!();
        for row in table.rows() {
            println!("{row}");
        }
    }

    Ok(())
}

fn print_header(path: &Path, db: &Database) {
    let header = db.tables_header();
    println!(
        "{}: {}, tables stream v{}.{}, {} tables, heap sizes 0x{:02X}",
        path.display(),
        db.root().version,
        header.major_version,
        header.minor_version,
        header.table_count(),
        header.heap_sizes
    );
}
