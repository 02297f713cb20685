//! Product-structure mix: how volume splits across the values of the
//! structure column (category, pack size, product type).

use serde::{Deserialize, Serialize};

use crate::concentration::{aggregate_entities, EntityAggregate};
use crate::table::Table;
use crate::types::Percent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureOverview {
    pub structure_column: String,
    pub main_category: String,
    pub main_share: Percent,
    /// Remaining categories, largest first.
    pub others: Vec<EntityAggregate>,
}

/// Split `metric_column` by `structure_column`.
///
/// Uses the entity distribution rules (null-like categories and negative
/// rows skipped). `None` when no category has positive volume.
pub fn analyze_structure(
    table: &Table,
    structure_column: &str,
    metric_column: &str,
) -> Option<StructureOverview> {
    let mut categories = aggregate_entities(table, structure_column, metric_column).into_iter();
    let main = categories.next()?;
    Some(StructureOverview {
        structure_column: structure_column.to_string(),
        main_category: main.entity_id,
        main_share: main.share,
        others: categories.collect(),
    })
}
