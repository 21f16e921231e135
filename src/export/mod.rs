use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::finance::DateRange;
use crate::models::SpendingEntry;

const HEADER: [&str; 4] = ["Date", "Category", "Amount", "Memo"];

/// Write `entries` as CSV with a header row. Returns the number of entries.
pub(crate) fn write_spending<W: Write>(out: W, entries: &[&SpendingEntry]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(HEADER)?;
    for entry in entries {
        wtr.write_record(entry.to_cells())?;
    }
    wtr.flush()?;
    Ok(entries.len())
}

pub(crate) fn export_spending(path: &Path, entries: &[&SpendingEntry]) -> Result<usize> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let count = write_spending(file, entries)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), count, "exported spending");
    Ok(count)
}

/// `~/stewardtui-spending-<from>-<to>.csv`, with `all` for open bounds.
pub(crate) fn default_export_path(range: &DateRange) -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    let bound = |d: Option<chrono::NaiveDate>| {
        d.map_or_else(|| "all".to_string(), |d| d.format("%Y%m%d").to_string())
    };
    PathBuf::from(home).join(format!(
        "stewardtui-spending-{}-{}.csv",
        bound(range.start),
        bound(range.end)
    ))
}

/// Expand a leading `~/` to `$HOME`.
pub(crate) fn shellexpand(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(rest)
        }
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests;
