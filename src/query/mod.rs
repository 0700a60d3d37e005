pub mod composer;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod safety;
pub mod translator;

#[cfg(test)]
pub(crate) mod testing;

pub use error::QueryError;
pub use models::{HealthReport, NaturalLanguageQuery, QueryOutcome};
pub use pipeline::QueryPipeline;
