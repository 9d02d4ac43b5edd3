//! Spreadsheet mirror: the same final table, written clear-then-write to
//! a CSV file. Best-effort by contract; the caller logs failures and
//! moves on.

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use munibid_core::{BidRecord, CANONICAL_COLUMNS};

pub fn write_mirror(path: &Path, records: &[BidRecord]) -> anyhow::Result<()> {
    // File::create truncates, which is the "full clear" half of the
    // contract; the header and rows are the rewrite.
    let file = File::create(path)
        .with_context(|| format!("creating mirror file {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(CANONICAL_COLUMNS)
        .context("writing mirror header")?;
    for record in records {
        let values = record.column_values();
        writer
            .write_record(values.iter().map(|value| value.as_deref().unwrap_or("")))
            .with_context(|| format!("writing mirror row `{}`", record.title))?;
    }
    writer.flush().context("flushing mirror file")?;
    Ok(())
}
