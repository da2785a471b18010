//! Data ingestion, identifiers and tabular storage.

pub mod dataset;
pub mod fingerprint;
pub mod pairs;
pub mod types;
