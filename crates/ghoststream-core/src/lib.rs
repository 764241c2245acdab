//! GhostStream Core Library
//!
//! Domain models, error types, configuration and the metadata protection
//! primitives (title envelope, tag blind index) shared by every GhostStream crate.

pub mod blind_index;
pub mod config;
pub mod constants;
pub mod encryption;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use blind_index::TagIndexer;
pub use config::{DatabaseConfig, IngestConfig, SecretKey, SecretString, StorageConfig};
pub use encryption::{EncryptedTitleEnvelope, TitleEncryptor};
pub use error::{Dimension, IngestError, IngestResult};
pub use models::{
    CatalogRecord, IngestSummary, IngestionPlan, IngestionResult, ProbeResult, Stage,
    TagIndexEntry, TagToken,
};
pub use storage_types::StorageBackend;
