//! Row-oriented table handed over by the normalized table provider.
//!
//! Columns are addressed strictly by name. Cells are loosely typed: the
//! analytical modules coerce them on read (`as_number`, `as_identifier`) and
//! never write back, so one `Table` can be shared by every stage.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use crate::error::MarketLensError;
use crate::MarketLensResult;

/// Identifier spellings that mean "no value" in spreadsheet exports.
pub const NULL_TOKENS: [&str; 5] = ["nan", "none", "null", "na", "n/a"];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];

/// True when `value` is one of the null-like tokens (case-insensitive, trimmed).
pub fn is_null_token(value: &str) -> bool {
    let lowered = value.trim().to_lowercase();
    NULL_TOKENS.iter().any(|t| *t == lowered)
}

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(Decimal),
    Text(String),
}

impl CellValue {
    /// Parse a raw CSV field. Blank fields become `Null`, numeric fields `Number`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        match parse_decimal(trimmed) {
            Some(d) => CellValue::Number(d),
            None => CellValue::Text(trimmed.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric coercion: numbers pass through, numeric text is parsed,
    /// everything else is `None`.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            CellValue::Number(d) => Some(*d),
            CellValue::Text(s) => parse_decimal(s.trim()),
            CellValue::Null | CellValue::Bool(_) => None,
        }
    }

    /// Text rendering of the cell, trimmed. `None` for null cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Number(d) => Some(d.normalize().to_string()),
            CellValue::Text(s) => Some(s.trim().to_string()),
        }
    }

    /// Calendar date, from a date or date-time text (time of day dropped).
    pub fn as_date(&self) -> Option<NaiveDate> {
        let text = self.as_text()?;
        DATE_FORMATS
            .iter()
            .find_map(|f| NaiveDate::parse_from_str(&text, f).ok())
            .or_else(|| {
                DATETIME_FORMATS
                    .iter()
                    .find_map(|f| NaiveDateTime::parse_from_str(&text, f).ok())
                    .map(|dt| dt.date())
            })
    }

    /// Entity identifier: trimmed text that is neither blank nor null-like.
    pub fn as_identifier(&self) -> Option<String> {
        let text = self.as_text()?;
        if text.is_empty() || is_null_token(&text) {
            return None;
        }
        Some(text)
    }
}

impl From<Decimal> for CellValue {
    fn from(d: Decimal) -> Self {
        CellValue::Number(d)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CellValue::Null)
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

static NULL_CELL: CellValue = CellValue::Null;

/// Wire shape of a table before validation.
#[derive(Debug, Deserialize)]
struct RawTable {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<CellValue>>,
}

/// Immutable snapshot of a named-column table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl TryFrom<RawTable> for Table {
    type Error = MarketLensError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        Table::new(raw.columns, raw.rows)
    }
}

impl Table {
    /// Build a table, rejecting duplicate column names and rows whose width
    /// differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> MarketLensResult<Self> {
        let mut seen = HashSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(MarketLensError::InvalidInput {
                    field: "columns".into(),
                    reason: format!("Duplicate column name '{name}'"),
                });
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(MarketLensError::InvalidInput {
                    field: format!("rows[{i}]"),
                    reason: format!(
                        "Row has {} cells but the table has {} columns",
                        row.len(),
                        columns.len()
                    ),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Table with a header and no rows.
    pub fn with_columns<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; its width must match the header.
    pub fn push_row(&mut self, row: Vec<CellValue>) -> MarketLensResult<()> {
        if row.len() != self.columns.len() {
            return Err(MarketLensError::InvalidInput {
                field: format!("rows[{}]", self.rows.len()),
                reason: format!(
                    "Row has {} cells but the table has {} columns",
                    row.len(),
                    self.columns.len()
                ),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell at (`row`, `col`), `Null` when out of range.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&NULL_CELL)
    }

    /// Iterate one column by name. `None` when the column is absent.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &CellValue> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| r.get(idx).unwrap_or(&NULL_CELL)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_cells() {
        assert_eq!(CellValue::parse("  "), CellValue::Null);
        assert_eq!(CellValue::parse("12.50"), CellValue::Number(dec!(12.50)));
        assert_eq!(CellValue::parse("1e3"), CellValue::Number(dec!(1000)));
        assert_eq!(CellValue::parse(" Suzhou "), CellValue::Text("Suzhou".into()));
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(CellValue::Text(" 42 ".into()).as_number(), Some(dec!(42)));
        assert_eq!(CellValue::Text("n/a".into()).as_number(), None);
        assert_eq!(CellValue::Bool(true).as_number(), None);
        assert_eq!(CellValue::Null.as_number(), None);
    }

    #[test]
    fn test_identifier_rejects_null_tokens() {
        for token in ["NaN", "None", " null ", "NA", "n/A", "", "   "] {
            assert_eq!(CellValue::Text(token.into()).as_identifier(), None, "{token}");
        }
        assert_eq!(
            CellValue::Text(" Brand A ".into()).as_identifier(),
            Some("Brand A".into())
        );
        assert_eq!(CellValue::Number(dec!(7.0)).as_identifier(), Some("7".into()));
    }

    #[test]
    fn test_date_coercion() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 5);
        assert_eq!(CellValue::Text("2024-03-05".into()).as_date(), day);
        assert_eq!(CellValue::Text("2024/03/05 14:30:00".into()).as_date(), day);
        assert_eq!(CellValue::Text("March".into()).as_date(), None);
        assert_eq!(CellValue::Null.as_date(), None);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec![CellValue::Null]],
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        assert!(Table::new(vec!["a".into(), "a".into()], vec![]).is_err());
    }

    #[test]
    fn test_json_round_trip_shape() {
        let json = r#"{"columns": ["city", "volume", "flag"],
                       "rows": [["A", 10, true], ["B", "2.5", null]]}"#;
        let table: Table = serde_json::from_str(json).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 1).as_number(), Some(dec!(10)));
        assert_eq!(table.cell(1, 1).as_number(), Some(dec!(2.5)));
        assert!(table.cell(1, 2).is_null());
        assert!(table.cell(9, 9).is_null());
    }

    #[test]
    fn test_json_ragged_table_fails() {
        let json = r#"{"columns": ["city", "volume"], "rows": [["A"]]}"#;
        assert!(serde_json::from_str::<Table>(json).is_err());
    }

    #[test]
    fn test_column_iteration() {
        let table = Table::new(
            vec!["city".into()],
            vec![vec!["A".into()], vec!["B".into()]],
        )
        .unwrap();
        let names: Vec<String> = table
            .column("city")
            .unwrap()
            .filter_map(|c| c.as_text())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(table.column("missing").is_none());
    }
}
