pub mod file;
pub mod stdin;

use market_lens_core::{MarketLensError, Table};

/// Table from `--input`, or a JSON or CSV table piped on stdin.
pub fn load_table(path: Option<&str>) -> Result<Table, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_table(path)
    } else if let Some(table) = stdin::read_stdin_table()? {
        Ok(table)
    } else {
        Err("--input is required (or pipe a JSON or CSV table on stdin)".into())
    }
}

/// Fail with `MissingColumn` for the first name absent from `table`.
pub fn require_columns(table: &Table, names: &[&str]) -> Result<(), Box<dyn std::error::Error>> {
    match names.iter().find(|n| !table.has_column(n)) {
        Some(name) => Err(MarketLensError::MissingColumn(format!("'{name}'")).into()),
        None => Ok(()),
    }
}
