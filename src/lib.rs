pub mod aggregator;
pub mod config;
pub mod error;
pub mod fetch;
pub mod infra;
pub mod output;
pub mod proxy;
pub mod services;
pub mod session;

pub use aggregator::{AggregateResult, aggregate, aggregate_json, aggregate_payload};
pub use error::GradeError;
