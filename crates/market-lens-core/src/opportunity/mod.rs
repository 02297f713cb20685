pub mod priority;
pub mod rationale;
pub mod scoring;

pub use priority::{build_opportunity_priority, opportunity_table, OpportunityRecord};
pub use scoring::{composite_score, normalize_scores, PriorityLabel};
