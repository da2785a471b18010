//! Error types shared by the preprocessing pipeline.

use thiserror::Error;

use crate::data::types::{Entity, Relation, Side};

/// Failures raised by statistics, sampling and dataset construction.
#[derive(Error, Debug)]
pub enum PrepError {
    /// Empty, malformed or inconsistent input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A query referenced a relation the statistics never observed.
    #[error("relation {0} is not present in the data statistics")]
    UnknownRelation(Relation),

    /// A relation ended up with no observed heads or tails.
    #[error("relation {0} has no observed heads or tails")]
    EmptyStatistics(Relation),

    /// Not enough eligible entities remain to satisfy a corruption request.
    #[error(
        "cannot draw {requested} {side} corruptions for ({anchor}, relation {relation}): \
         only {available} eligible entities after {attempts} attempts"
    )]
    SamplingExhausted {
        /// The endpoint kept fixed while the other side is corrupted.
        anchor: Entity,
        relation: Relation,
        side: Side,
        requested: usize,
        available: usize,
        attempts: usize,
    },

    /// A structural value outside of its encodable range.
    #[error("{value} is not a valid value for {field} (molecule {entity})")]
    UnsupportedValue {
        entity: String,
        field: &'static str,
        value: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PrepError>;
