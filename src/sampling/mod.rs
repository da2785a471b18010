//! Relation statistics, negative sampling and annotated dataset assembly.

pub mod builder;
pub mod sampler;
pub mod statistics;

pub use builder::TripletDatasetBuilder;
pub use sampler::{CorruptionPolicy, NegativeSampler, DEFAULT_MAX_RETRIES};
pub use statistics::{RelationStatistics, StatisticsSnapshot};
