pub mod aggregate;

pub use aggregate::{CohortStat, EmptyCohortAggregation, aggregate};
