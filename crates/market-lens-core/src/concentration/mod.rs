pub mod distribution;
pub mod leaders;
pub mod report;

pub use distribution::{
    aggregate_entities, entity_totals, head_and_tail, EntityAggregate, HeadTail,
};
pub use leaders::{grouping_leaders, GroupingLeader, GroupingLeaders};
pub use report::{analyze_concentration, ConcentrationReport};
