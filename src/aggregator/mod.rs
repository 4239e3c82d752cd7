//! Grade aggregation.
//!
//! Partitions raw grade records by period and subject, drops the ones that
//! do not count towards averages, and computes subject, period and overall
//! averages together with the grade needed to reach a passing average.

pub mod aggregate;
pub mod types;
pub mod utility;

pub use aggregate::{aggregate, aggregate_json, aggregate_payload, is_retained, PASSING_AVERAGE};
pub use types::{
    AggregateResult, GradeDetail, GradeRecord, PeriodKey, PeriodSummary,
    SubjectSummary,
};
