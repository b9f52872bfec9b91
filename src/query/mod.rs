//! Aggregation queries
//!
//! Skeleton pipelines and the placeholder engine that fills them in.

pub mod pipelines;
pub mod template;

pub use pipelines::NamedQuery;
pub use template::{define_time_period, define_time_range, Placeholder, QueryContext, Template};
