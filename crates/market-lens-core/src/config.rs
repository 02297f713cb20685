//! Column-role configuration.
//!
//! Callers describe which column plays which role; `ResolvedColumns::resolve`
//! validates the choice against a table once, filling the entity and metric
//! roles from the table's shape when they are left unset. The analytical
//! modules only ever see the resolved, concrete column names.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::MarketLensError;
use crate::table::{CellValue, Table};
use crate::MarketLensResult;

/// Columns whose distinct/row ratio reaches this are treated as row identifiers.
const NEAR_UNIQUE_RATIO: f64 = 0.9;

fn default_top_n() -> i64 {
    20
}

fn default_name_list_limit() -> usize {
    5
}

/// Optional column roles recognised by the analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnRoles {
    /// Entity dimension (brand, manufacturer, customer...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    /// Numeric volume column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    /// Pre-computed target volume (pre-aggregated tables only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_volume: Option<String>,
    /// Pre-computed target share in percent (pre-aggregated tables only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Product structure / category column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
}

/// A grouping dimension (city, institution, category) to scan for white space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingSpec {
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Priority list length; `<= 0` keeps every grouping.
    #[serde(default = "default_top_n")]
    pub top_n: i64,
}

impl GroupingSpec {
    pub fn new(column: impl Into<String>, top_n: i64) -> Self {
        Self {
            column: column.into(),
            label: None,
            top_n,
        }
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.column)
    }
}

/// Full analysis configuration, loadable from JSON or YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub columns: ColumnRoles,
    /// Entity whose position is benchmarked in white-space analysis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_entity: Option<String>,
    #[serde(default)]
    pub groupings: Vec<GroupingSpec>,
    /// Human label for the entity dimension used in narrative text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_label: Option<String>,
    /// Maximum names kept in head/tail lists.
    #[serde(default = "default_name_list_limit")]
    pub name_list_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            columns: ColumnRoles::default(),
            target_entity: None,
            groupings: Vec::new(),
            dimension_label: None,
            metric_label: None,
            name_list_limit: default_name_list_limit(),
        }
    }
}

/// Which optional analyses (time trend, price-volume, structure) produced a
/// usable result; shapes the narrative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalFlags {
    pub has_time: bool,
    pub has_price: bool,
    pub has_structure: bool,
}

/// Concrete column names after validation against a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedColumns {
    pub entity: String,
    pub metric: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_volume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
    pub groupings: Vec<GroupingSpec>,
}

impl ResolvedColumns {
    /// Resolve every role against `table`.
    ///
    /// Explicitly named columns must exist. An unset entity role falls back
    /// to the text column with the most distinct values that is not
    /// near-unique; an unset metric role falls back to the first all-numeric
    /// column.
    pub fn resolve(config: &AnalysisConfig, table: &Table) -> MarketLensResult<Self> {
        let roles = &config.columns;
        let time = require_optional(table, "time", roles.time.as_deref())?;
        let price = require_optional(table, "price", roles.price.as_deref())?;
        let structure = require_optional(table, "structure", roles.structure.as_deref())?;
        let target_volume =
            require_optional(table, "target_volume", roles.target_volume.as_deref())?;
        let share = require_optional(table, "share", roles.share.as_deref())?;

        let mut reserved: HashSet<&str> = HashSet::new();
        reserved.extend(time.as_deref());
        reserved.extend(price.as_deref());
        reserved.extend(roles.metric.as_deref());

        let entity = match roles.entity.as_deref() {
            Some(name) => require_column(table, "entity", name)?,
            None => detect_entity_column(table, &reserved).ok_or_else(|| {
                MarketLensError::InsufficientData(
                    "No categorical column suitable as entity dimension".into(),
                )
            })?,
        };

        reserved.insert(entity.as_str());
        let metric = match roles.metric.as_deref() {
            Some(name) => require_column(table, "metric", name)?,
            None => detect_metric_column(table, &reserved).ok_or_else(|| {
                MarketLensError::InsufficientData("No numeric column suitable as metric".into())
            })?,
        };

        let mut groupings = Vec::with_capacity(config.groupings.len());
        for spec in &config.groupings {
            require_column(table, "groupings", &spec.column)?;
            groupings.push(spec.clone());
        }

        log::debug!("resolved columns: entity='{entity}', metric='{metric}'");

        Ok(Self {
            entity,
            metric,
            target_volume,
            share,
            time,
            price,
            structure,
            groupings,
        })
    }
}

fn require_column(table: &Table, role: &str, name: &str) -> MarketLensResult<String> {
    if table.has_column(name) {
        Ok(name.to_string())
    } else {
        Err(MarketLensError::MissingColumn(format!(
            "'{name}' (configured as {role})"
        )))
    }
}

fn require_optional(
    table: &Table,
    role: &str,
    name: Option<&str>,
) -> MarketLensResult<Option<String>> {
    name.map(|n| require_column(table, role, n)).transpose()
}

fn is_numeric_cell(cell: &CellValue) -> bool {
    cell.as_number().is_some()
}

fn detect_entity_column(table: &Table, reserved: &HashSet<&str>) -> Option<String> {
    let rows = table.len();
    let mut best: Option<(&str, usize)> = None;
    for name in table.columns() {
        if reserved.contains(name.as_str()) {
            continue;
        }
        let Some(cells) = table.column(name) else {
            continue;
        };
        let mut is_text = false;
        let mut distinct = HashSet::new();
        for cell in cells {
            if cell.is_null() {
                continue;
            }
            if !is_numeric_cell(cell) {
                is_text = true;
            }
            if let Some(id) = cell.as_identifier() {
                distinct.insert(id);
            }
        }
        if !is_text || distinct.is_empty() {
            continue;
        }
        let ratio = distinct.len() as f64 / rows.max(1) as f64;
        if ratio >= NEAR_UNIQUE_RATIO {
            continue;
        }
        if best.map_or(true, |(_, n)| distinct.len() > n) {
            best = Some((name.as_str(), distinct.len()));
        }
    }
    best.map(|(name, _)| name.to_string())
}

fn detect_metric_column(table: &Table, reserved: &HashSet<&str>) -> Option<String> {
    table
        .columns()
        .iter()
        .filter(|name| !reserved.contains(name.as_str()))
        .find(|name| {
            let Some(cells) = table.column(name) else {
                return false;
            };
            let mut seen = 0usize;
            for cell in cells {
                if cell.is_null() {
                    continue;
                }
                if !is_numeric_cell(cell) {
                    return false;
                }
                seen += 1;
            }
            seen > 0
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Table {
        let rows: Vec<Vec<CellValue>> = vec![
            vec!["R1".into(), "Brand A".into(), "Suzhou".into(), dec!(100).into(), "2024-01-05".into()],
            vec!["R2".into(), "Brand B".into(), "Suzhou".into(), dec!(80).into(), "2024-02-05".into()],
            vec!["R3".into(), "Brand A".into(), "Wuxi".into(), dec!(60).into(), "2024/03/05".into()],
            vec!["R4".into(), "Brand C".into(), "Wuxi".into(), dec!(20).into(), "not a date".into()],
            vec!["R5".into(), "Brand B".into(), "Nanjing".into(), dec!(40).into(), CellValue::Null],
        ];
        Table::new(
            vec![
                "row_id".into(),
                "brand".into(),
                "city".into(),
                "volume".into(),
                "date".into(),
            ],
            rows,
        )
        .unwrap()
    }

    #[test]
    fn test_fallback_detection() {
        let mut config = AnalysisConfig::default();
        config.columns.time = Some("date".into());
        let resolved = ResolvedColumns::resolve(&config, &sample()).unwrap();
        // row_id is near-unique, brand and city both have 3 distinct values; brand comes first
        assert_eq!(resolved.entity, "brand");
        assert_eq!(resolved.metric, "volume");
    }

    #[test]
    fn test_explicit_missing_column_errors() {
        let mut config = AnalysisConfig::default();
        config.columns.entity = Some("manufacturer".into());
        let err = ResolvedColumns::resolve(&config, &sample()).unwrap_err();
        assert!(matches!(err, MarketLensError::MissingColumn(_)));
    }

    #[test]
    fn test_missing_grouping_errors() {
        let mut config = AnalysisConfig::default();
        config.groupings.push(GroupingSpec::new("hospital", 30));
        assert!(ResolvedColumns::resolve(&config, &sample()).is_err());
    }

    #[test]
    fn test_config_from_json_defaults() {
        let json = r#"{"columns": {"entity": "brand"}, "groupings": [{"column": "city"}]}"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.groupings[0].top_n, 20);
        assert_eq!(config.name_list_limit, 5);
        assert_eq!(config.groupings[0].display_label(), "city");
    }
}
