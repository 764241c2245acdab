use async_trait::async_trait;
use ghoststream_core::{CatalogRecord, TagIndexEntry};
use sqlx::{PgPool, Postgres};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Unexpected insert response on {table}: expected {expected} row(s), got {actual}")]
    UnexpectedRowCount {
        table: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog writes performed at the end of an ingestion.
///
/// Callers insert the video row first and only then its tag rows; the ordering is
/// the only guarantee, there is no enclosing transaction.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert one video row and return its server-assigned id.
    ///
    /// Fails unless exactly one row was inserted.
    async fn insert_video(&self, record: &CatalogRecord) -> CatalogResult<Uuid>;

    /// Insert one tag row per entry, duplicates included.
    async fn insert_tag_entries(&self, video_id: Uuid, entries: &[TagIndexEntry])
        -> CatalogResult<()>;
}

/// Repository for the `videos` and `video_tag_tokens` tables
#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogRepository {
    #[tracing::instrument(
        skip(self, record),
        fields(db.table = "videos", db.operation = "insert", bucket = %record.r2_bucket, key = %record.r2_video_key)
    )]
    async fn insert_video(&self, record: &CatalogRecord) -> CatalogResult<Uuid> {
        let ids = sqlx::query_scalar::<Postgres, Uuid>(
            r#"
            INSERT INTO videos (
                title_enc, duration_seconds, width, height,
                r2_bucket, r2_video_key, r2_thumb_key, published
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&record.title_enc)
        .bind(record.duration_seconds)
        .bind(record.width)
        .bind(record.height)
        .bind(&record.r2_bucket)
        .bind(&record.r2_video_key)
        .bind(&record.r2_thumb_key)
        .bind(record.published)
        .fetch_all(&self.pool)
        .await?;

        match ids.as_slice() {
            [id] => {
                tracing::info!(video_id = %id, "Video row inserted");
                Ok(*id)
            }
            _ => Err(CatalogError::UnexpectedRowCount {
                table: "videos",
                expected: 1,
                actual: ids.len(),
            }),
        }
    }

    #[tracing::instrument(
        skip(self, entries),
        fields(db.table = "video_tag_tokens", db.operation = "insert", db.record_id = %video_id, count = entries.len())
    )]
    async fn insert_tag_entries(
        &self,
        video_id: Uuid,
        entries: &[TagIndexEntry],
    ) -> CatalogResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let digests: Vec<String> = entries.iter().map(|e| e.as_str().to_string()).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO video_tag_tokens (video_id, tag_hmac)
            SELECT $1, UNNEST($2::text[])
            "#,
        )
        .bind(video_id)
        .bind(&digests)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() as usize;
        if inserted != digests.len() {
            return Err(CatalogError::UnexpectedRowCount {
                table: "video_tag_tokens",
                expected: digests.len(),
                actual: inserted,
            });
        }

        tracing::info!(count = inserted, "Tag index rows inserted");
        Ok(())
    }
}
