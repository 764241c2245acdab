use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Local filesystem storage implementation
///
/// Objects land at `{base_path}/{bucket}/{key}`.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/ghoststream/objects")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    /// Convert bucket and key to a filesystem path with traversal validation
    fn object_path(&self, bucket: &str, key: &str) -> StorageResult<PathBuf> {
        for part in [bucket, key] {
            if part.is_empty() || part.starts_with('/') {
                return Err(StorageError::InvalidKey(format!(
                    "Storage key must be relative and non-empty: {}",
                    part
                )));
            }
            let escapes = Path::new(part)
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
            if escapes {
                return Err(StorageError::InvalidKey(format!(
                    "Storage key contains invalid components: {}",
                    part
                )));
            }
        }

        Ok(self.base_path.join(bucket).join(key))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    #[tracing::instrument(skip(self), fields(storage.backend = "local"))]
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        local_file: &Path,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = self.object_path(bucket, key)?;
        let start = std::time::Instant::now();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let size = fs::copy(local_file, &path).await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                path = %path.display(),
                "Local storage upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn source_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, data).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_local_storage_put() {
        let objects = tempdir().unwrap();
        let work = tempdir().unwrap();
        let storage = LocalStorage::new(objects.path()).await.unwrap();
        let src = source_file(work.path(), "out.mp4", b"video bytes").await;

        storage
            .put("ghoststream", "videos/abc.mp4", &src, "video/mp4")
            .await
            .unwrap();

        let stored = fs::read(objects.path().join("ghoststream/videos/abc.mp4"))
            .await
            .unwrap();
        assert_eq!(stored, b"video bytes");
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_object() {
        let objects = tempdir().unwrap();
        let work = tempdir().unwrap();
        let storage = LocalStorage::new(objects.path()).await.unwrap();

        let first = source_file(work.path(), "a.jpg", b"first").await;
        let second = source_file(work.path(), "b.jpg", b"second").await;
        storage.put("b", "thumbs/x.jpg", &first, "image/jpeg").await.unwrap();
        storage.put("b", "thumbs/x.jpg", &second, "image/jpeg").await.unwrap();

        let stored = fs::read(objects.path().join("b/thumbs/x.jpg")).await.unwrap();
        assert_eq!(stored, b"second");
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let objects = tempdir().unwrap();
        let work = tempdir().unwrap();
        let storage = LocalStorage::new(objects.path()).await.unwrap();
        let src = source_file(work.path(), "out.mp4", b"x").await;

        let result = storage.put("b", "../../../etc/passwd", &src, "video/mp4").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.put("b", "/etc/passwd", &src, "video/mp4").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.put("..", "videos/x.mp4", &src, "video/mp4").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_missing_source_file_fails() {
        let objects = tempdir().unwrap();
        let storage = LocalStorage::new(objects.path()).await.unwrap();

        let result = storage
            .put("b", "videos/x.mp4", Path::new("/nonexistent/out.mp4"), "video/mp4")
            .await;
        assert!(matches!(result, Err(StorageError::UploadFailed(_))));
    }
}
