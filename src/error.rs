//! Error types for grade aggregation.

use thiserror::Error;

/// Errors raised while interpreting a grades payload.
#[derive(Error, Debug)]
pub enum GradeError {
    /// The payload has no grade sequence or a record could not be interpreted.
    #[error("Malformed grades payload: {0}")]
    MalformedInput(String),
}
