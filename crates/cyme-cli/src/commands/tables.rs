use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use cyme_io::importers::table_name;
use cyme_io::{TableStore, REQUIRED_TABLES};
use tabwriter::TabWriter;

pub fn handle(data: Option<&Path>) -> Result<()> {
    let Some(dir) = data else {
        for table in REQUIRED_TABLES {
            println!("{table}");
        }
        return Ok(());
    };

    let store = TableStore::load(dir)?;
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "TABLE\tSTATUS")?;
    for table in REQUIRED_TABLES {
        let status = if store.has_table(&table_name(table)) {
            "present"
        } else {
            "missing"
        };
        writeln!(writer, "{table}\t{status}")?;
    }
    writer.flush()?;
    Ok(())
}
