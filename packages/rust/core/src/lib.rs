//! Scan pipeline: pathway scanning, relation ranking, drug enrichment.

pub mod aggregate;
pub mod enrich;
pub mod pipeline;
pub mod scanner;

pub use aggregate::aggregate;
pub use enrich::{DrugEnricher, EnrichedGene};
pub use pipeline::{Pipeline, ProgressReporter, SilentProgress};
pub use scanner::PathwayScanner;
