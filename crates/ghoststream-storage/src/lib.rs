//! GhostStream Storage Library
//!
//! Object storage for finished ingestion artifacts. Provides the [`Storage`] trait
//! with an S3-compatible implementation (Cloudflare R2, AWS S3, MinIO) and a local
//! filesystem implementation for development.
//!
//! # Object key format
//!
//! `{prefix}/{id}.mp4` for the video and `{prefix}/{id}.jpg` for its thumbnail,
//! where both share one freshly generated UUID. Trailing slashes on the prefix are
//! stripped. Key generation lives in the `keys` module.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use ghoststream_core::StorageBackend;
pub use keys::ObjectKeys;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
