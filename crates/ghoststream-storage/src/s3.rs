use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::{
    Attribute, Attributes, ObjectStore, PutOptions, PutPayload, Result as ObjectResult,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// S3-compatible storage implementation (Cloudflare R2, AWS S3, MinIO)
///
/// Clients are built lazily per bucket from one template builder, so a single
/// instance can serve any bucket the credentials allow.
pub struct S3Storage {
    builder: AmazonS3Builder,
    stores: Mutex<HashMap<String, AmazonS3>>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `region` - Region identifier (`auto` for R2)
    /// * `endpoint_url` - Custom endpoint for S3-compatible providers
    ///   (e.g. "https://<account>.r2.cloudflarestorage.com", "http://localhost:9000" for MinIO)
    /// * `credentials` - Access key id and secret; when absent the usual `AWS_*`
    ///   environment variables apply
    pub fn new(
        region: String,
        endpoint_url: Option<String>,
        credentials: Option<(String, String)>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env().with_region(region);

        if let Some(endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder.with_endpoint(endpoint).with_allow_http(allow_http);
        }

        if let Some((access_key_id, secret_access_key)) = credentials {
            builder = builder
                .with_access_key_id(access_key_id)
                .with_secret_access_key(secret_access_key);
        }

        Ok(S3Storage {
            builder,
            stores: Mutex::new(HashMap::new()),
        })
    }

    fn store_for(&self, bucket: &str) -> StorageResult<AmazonS3> {
        let mut stores = self
            .stores
            .lock()
            .map_err(|_| StorageError::ConfigError("S3 client cache poisoned".to_string()))?;

        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }

        let store = self
            .builder
            .clone()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        stores.insert(bucket.to_string(), store.clone());
        Ok(store)
    }
}

#[async_trait]
impl Storage for S3Storage {
    #[tracing::instrument(skip(self), fields(storage.backend = "s3"))]
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        local_file: &Path,
        content_type: &str,
    ) -> StorageResult<()> {
        let store = self.store_for(bucket)?;
        let data = tokio::fs::read(local_file).await?;
        let size = data.len() as u64;
        let location = ObjectPath::from(key.to_string());

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let start = std::time::Instant::now();

        let result: ObjectResult<_> = store
            .put_opts(&location, PutPayload::from(Bytes::from(data)), options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
