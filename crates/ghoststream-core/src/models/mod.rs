//! Data models for the ingestion pipeline
//!
//! Values here are produced by one stage and consumed by the next. None of them
//! are mutated after construction.

mod catalog;
mod ingestion;
mod plan;
mod probe;
mod stage;
mod tag;

pub use catalog::CatalogRecord;
pub use ingestion::{IngestSummary, IngestionResult};
pub use plan::IngestionPlan;
pub use probe::ProbeResult;
pub use stage::Stage;
pub use tag::{TagIndexEntry, TagToken};
