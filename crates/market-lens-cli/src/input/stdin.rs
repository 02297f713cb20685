use market_lens_core::Table;
use serde::de::DeserializeOwned;
use std::io::{self, Read};

use super::file::csv_table;

/// Piped stdin text, trimmed. `None` when stdin is a TTY or carries nothing.
fn read_piped() -> Result<Option<String>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(trimmed.to_string()))
}

/// Deserialize piped JSON into `T`.
pub fn read_stdin_json<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    let Some(text) = read_piped()? else {
        return Ok(None);
    };
    let value: T = serde_json::from_str(&text)
        .map_err(|e| format!("Failed to parse JSON from stdin: {e}"))?;
    Ok(Some(value))
}

/// A table piped on stdin: a JSON `{"columns", "rows"}` document when the
/// text opens with `{`, CSV with a header row otherwise.
pub fn read_stdin_table() -> Result<Option<Table>, Box<dyn std::error::Error>> {
    let Some(text) = read_piped()? else {
        return Ok(None);
    };
    let table: Table = if text.starts_with('{') {
        serde_json::from_str(&text)
            .map_err(|e| format!("Failed to parse JSON table from stdin: {e}"))?
    } else {
        csv_table(text.as_bytes(), "stdin")?
    };
    log::debug!("read {} rows from stdin", table.len());
    Ok(Some(table))
}
