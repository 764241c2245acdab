//! GhostStream Database Library
//!
//! Catalog persistence for ingested videos: the `videos` table and the
//! `video_tag_tokens` blind index, plus pool setup and migrations.

pub mod db;

pub use db::{
    connect, run_migrations, CatalogError, CatalogResult, CatalogStore, PgCatalogRepository,
};
