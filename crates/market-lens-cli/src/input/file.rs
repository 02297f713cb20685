use market_lens_core::config::AnalysisConfig;
use market_lens_core::{CellValue, Table};
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Read a table from a `.csv` file (header row required) or a JSON file
/// shaped as `{"columns": [...], "rows": [[...], ...]}`.
pub fn read_table(path: &str) -> Result<Table, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let table = if has_extension(&canonical, &["csv"]) {
        read_csv_table(&canonical)?
    } else {
        read_json(path)?
    };
    log::debug!(
        "loaded {} rows x {} columns from '{}'",
        table.len(),
        table.columns().len(),
        canonical.display()
    );
    Ok(table)
}

/// Read an analysis configuration from YAML (`.yaml`/`.yml`) or JSON.
pub fn read_config(path: &str) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    if !has_extension(&canonical, &["yaml", "yml"]) {
        return read_json(path);
    }
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let config: AnalysisConfig = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(config)
}

fn read_csv_table(path: &Path) -> Result<Table, Box<dyn std::error::Error>> {
    let file = fs::File::open(path)
        .map_err(|e| format!("Failed to open '{}': {}", path.display(), e))?;
    csv_table(file, &path.display().to_string())
}

/// Parse CSV text with a header row into a table. `source` names the origin
/// in error messages.
pub fn csv_table<R: io::Read>(data: R, source: &str) -> Result<Table, Box<dyn std::error::Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            // Spreadsheet exports often carry a UTF-8 byte order mark
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| format!("Bad CSV record {} in {}: {}", line + 1, source, e))?;
        rows.push(record.iter().map(CellValue::parse).collect());
    }
    Ok(Table::new(columns, rows)?)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Resolve and validate the path.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
