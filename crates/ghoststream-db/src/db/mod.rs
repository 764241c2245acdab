//! Database repositories for data access layer
//
// Catalog repository (videos and tag index rows)
pub mod catalog;
//
// Pool setup and migrations
pub mod pool;

pub use catalog::{CatalogError, CatalogResult, CatalogStore, PgCatalogRepository};
pub use pool::{connect, run_migrations};
