//! Query document construction

mod aggregation;
mod builder;
mod types;

pub use aggregation::{GroupedAggregation, Metric};
pub use builder::{Group, QueryBuilder, TextQuery};
pub use types::{
    Aggregation, BoolQuery, Collapse, FilterClause, RangeParams, SearchBody, SortOrder,
};
