//! Ingestion orchestration: probe → plan → transcode → validate → thumbnail →
//! protect → upload → commit.
//!
//! Each stage consumes the artifact of the previous one, so the order is enforced by
//! types: uploading needs [`ValidatedMedia`], committing needs the receipt that only
//! the upload stage (or its dry-run stand-in) can produce. Any error ends the run;
//! nothing is retried here.
//!
//! The scratch workspace is created after planning and removed when the run ends,
//! whatever the outcome.

use ghoststream_core::constants::{
    DEFAULT_THUMB_PREFIX, DEFAULT_VIDEO_PREFIX, THUMBNAIL_CONTENT_TYPE, VIDEO_CONTENT_TYPE,
    WORKSPACE_PREFIX,
};
use ghoststream_core::{
    CatalogRecord, IngestError, IngestResult, IngestSummary, IngestionPlan, IngestionResult,
    ProbeResult, Stage, TagIndexEntry, TagIndexer, TitleEncryptor,
};
use ghoststream_db::CatalogStore;
use ghoststream_storage::{ObjectKeys, Storage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::command::CommandRunner;
use crate::policy;
use crate::prober::MediaProber;
use crate::progress::{ProgressEvent, ProgressListener};
use crate::thumbnail::{Thumbnail, ThumbnailGenerator};
use crate::transcode::TranscodeEngine;
use crate::validator::{InvariantValidator, ValidatedMedia};

/// Shared, read-only settings for every ingestion run by one pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub bucket: String,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

/// Per-ingestion switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// Remux instead of re-encoding when the input is already compliant.
    pub skip_compress: bool,
    /// Run every stage but simulate upload and catalog commit.
    pub dry_run: bool,
    pub video_prefix: String,
    pub thumb_prefix: String,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            skip_compress: false,
            dry_run: false,
            video_prefix: DEFAULT_VIDEO_PREFIX.to_string(),
            thumb_prefix: DEFAULT_THUMB_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest {
    pub source: PathBuf,
    /// Plaintext title; only its encrypted envelope leaves the process.
    pub title: String,
    /// Comma-separated raw tags.
    pub tags: String,
    pub options: IngestOptions,
}

struct ProtectedMetadata {
    title_enc: String,
    tags: Vec<TagIndexEntry>,
}

/// Proof that both artifacts are in object storage, or that a dry run pretended so.
struct StoredArtifacts {
    bucket: String,
    keys: ObjectKeys,
    simulated: bool,
}

struct Transitions<'a> {
    source: &'a Path,
    listener: &'a dyn ProgressListener,
}

impl Transitions<'_> {
    fn enter(&self, stage: Stage) {
        tracing::debug!(stage = %stage, percent = stage.percent(), "Entering stage");
        self.listener
            .on_event(&ProgressEvent::new(self.source.to_path_buf(), stage));
    }

    fn fail(&self, error: &IngestError) {
        self.listener.on_event(&ProgressEvent::failed(
            self.source.to_path_buf(),
            error.to_string(),
        ));
    }
}

pub struct IngestPipeline {
    prober: MediaProber,
    transcoder: TranscodeEngine,
    validator: InvariantValidator,
    thumbnails: ThumbnailGenerator,
    encryptor: TitleEncryptor,
    indexer: TagIndexer,
    storage: Arc<dyn Storage>,
    catalog: Arc<dyn CatalogStore>,
    bucket: String,
}

impl IngestPipeline {
    pub fn new(
        config: PipelineConfig,
        runner: Arc<dyn CommandRunner>,
        encryptor: TitleEncryptor,
        indexer: TagIndexer,
        storage: Arc<dyn Storage>,
        catalog: Arc<dyn CatalogStore>,
    ) -> IngestResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(IngestError::Config("Bucket must not be empty".to_string()));
        }

        let prober = MediaProber::new(runner.clone(), config.ffprobe_path);
        Ok(Self {
            validator: InvariantValidator::new(prober.clone()),
            prober,
            transcoder: TranscodeEngine::new(runner.clone(), config.ffmpeg_path.clone()),
            thumbnails: ThumbnailGenerator::new(runner, config.ffmpeg_path),
            encryptor,
            indexer,
            storage,
            catalog,
            bucket: config.bucket,
        })
    }

    /// Run one ingestion to a terminal result.
    pub async fn ingest(
        &self,
        request: &IngestRequest,
        progress: &dyn ProgressListener,
    ) -> IngestionResult {
        self.try_ingest(request, progress).await.into()
    }

    /// Run one ingestion, emitting `Done` or `Failed` as the last event.
    #[tracing::instrument(skip(self, request, progress), fields(
        source = %request.source.display(),
        dry_run = request.options.dry_run,
        skip_compress = request.options.skip_compress
    ))]
    pub async fn try_ingest(
        &self,
        request: &IngestRequest,
        progress: &dyn ProgressListener,
    ) -> IngestResult<IngestSummary> {
        let transitions = Transitions {
            source: &request.source,
            listener: progress,
        };
        let start = std::time::Instant::now();

        match self.run(request, &transitions).await {
            Ok(summary) => {
                transitions.enter(Stage::Done);
                tracing::info!(
                    video_id = ?summary.video_id,
                    video_key = %summary.video_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Ingestion complete"
                );
                Ok(summary)
            }
            Err(error) => {
                tracing::error!(
                    error = %error,
                    error_code = error.error_code(),
                    stage = %error.stage(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Ingestion failed"
                );
                transitions.fail(&error);
                Err(error)
            }
        }
    }

    async fn run(
        &self,
        request: &IngestRequest,
        transitions: &Transitions<'_>,
    ) -> IngestResult<IngestSummary> {
        let options = &request.options;
        let source = request.source.as_path();

        transitions.enter(Stage::Probing);
        ensure_source(source).await?;
        let probe = self.prober.probe(source).await?;

        transitions.enter(Stage::Planning);
        let plan = policy::plan(&probe, options.skip_compress);
        tracing::info!(
            duration = probe.duration_seconds,
            resolution = %probe.resolution(),
            video_codec = %probe.video_codec,
            audio_codec = ?probe.audio_codec,
            container = %probe.container,
            cap = plan.cap,
            reencode = plan.reencode,
            "Ingestion planned"
        );
        transitions.listener.on_plan(source, &probe, &plan);

        transitions.enter(Stage::Transcoding);
        let workspace = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()
            .map_err(|e| IngestError::Io {
                path: std::env::temp_dir(),
                source: e,
            })?;
        let transcoded = self
            .transcoder
            .transcode(source, &probe, &plan, workspace.path())
            .await?;

        transitions.enter(Stage::Validating);
        let media = self.validator.validate(&probe, transcoded).await?;

        transitions.enter(Stage::Thumbnailing);
        let thumbnail = self.thumbnails.generate(&media, workspace.path()).await?;

        transitions.enter(Stage::Protecting);
        let protected = self.protect(&request.title, &request.tags)?;

        transitions.enter(Stage::Uploading);
        let keys = ObjectKeys::generate(&options.video_prefix, &options.thumb_prefix);
        let stored = if options.dry_run {
            self.simulate_upload(&media, &thumbnail, keys)
        } else {
            self.upload(&media, &thumbnail, keys).await?
        };

        transitions.enter(Stage::Committing);
        let title_enc = protected.title_enc.clone();
        let tag_digests = protected
            .tags
            .iter()
            .map(|entry| entry.as_str().to_string())
            .collect();
        let video_id = self.commit(&media, protected, &stored).await?;

        Ok(IngestSummary {
            video_id,
            bucket: stored.bucket,
            video_key: stored.keys.video_key,
            thumb_key: stored.keys.thumb_key,
            width: media.output().width,
            height: media.output().height,
            duration_seconds: media.rounded_duration(),
            reencoded: media.reencoded(),
            title_enc,
            tag_digests,
            dry_run: stored.simulated,
        })
    }

    fn protect(&self, title: &str, raw_tags: &str) -> IngestResult<ProtectedMetadata> {
        let title_enc = self.encryptor.encrypt(title)?;
        let tags = self.indexer.index_tags(raw_tags)?;
        Ok(ProtectedMetadata { title_enc, tags })
    }

    async fn upload(
        &self,
        media: &ValidatedMedia,
        thumbnail: &Thumbnail,
        keys: ObjectKeys,
    ) -> IngestResult<StoredArtifacts> {
        for (path, key, content_type) in [
            (media.path(), &keys.video_key, VIDEO_CONTENT_TYPE),
            (thumbnail.path.as_path(), &keys.thumb_key, THUMBNAIL_CONTENT_TYPE),
        ] {
            self.storage
                .put(&self.bucket, key, path, content_type)
                .await
                .map_err(|e| IngestError::Storage {
                    key: key.clone(),
                    message: e.to_string(),
                })?;
        }

        Ok(StoredArtifacts {
            bucket: self.bucket.clone(),
            keys,
            simulated: false,
        })
    }

    fn simulate_upload(
        &self,
        media: &ValidatedMedia,
        thumbnail: &Thumbnail,
        keys: ObjectKeys,
    ) -> StoredArtifacts {
        for (path, key, content_type) in [
            (media.path(), &keys.video_key, VIDEO_CONTENT_TYPE),
            (thumbnail.path.as_path(), &keys.thumb_key, THUMBNAIL_CONTENT_TYPE),
        ] {
            tracing::info!(
                dry_run = true,
                path = %path.display(),
                bucket = %self.bucket,
                key = %key,
                content_type,
                "DRY RUN: would upload"
            );
        }

        StoredArtifacts {
            bucket: self.bucket.clone(),
            keys,
            simulated: true,
        }
    }

    async fn commit(
        &self,
        media: &ValidatedMedia,
        protected: ProtectedMetadata,
        stored: &StoredArtifacts,
    ) -> IngestResult<Option<Uuid>> {
        let record = CatalogRecord {
            title_enc: protected.title_enc,
            duration_seconds: media.rounded_duration(),
            width: media.output().width as i32,
            height: media.output().height as i32,
            r2_bucket: stored.bucket.clone(),
            r2_video_key: stored.keys.video_key.clone(),
            r2_thumb_key: stored.keys.thumb_key.clone(),
            published: true,
        };

        if stored.simulated {
            tracing::info!(
                dry_run = true,
                title_enc = %truncate(&record.title_enc, 48),
                duration_seconds = record.duration_seconds,
                width = record.width,
                height = record.height,
                bucket = %record.r2_bucket,
                video_key = %record.r2_video_key,
                thumb_key = %record.r2_thumb_key,
                tag_rows = protected.tags.len(),
                "DRY RUN: would insert catalog rows"
            );
            return Ok(None);
        }

        let video_id = self
            .catalog
            .insert_video(&record)
            .await
            .map_err(|e| IngestError::Catalog(e.to_string()))?;
        self.catalog
            .insert_tag_entries(video_id, &protected.tags)
            .await
            .map_err(|e| IngestError::Catalog(e.to_string()))?;

        Ok(Some(video_id))
    }
}

/// Probe and plan without transcoding or touching any store.
pub async fn inspect(
    prober: &MediaProber,
    source: &Path,
    skip_compress: bool,
) -> IngestResult<(ProbeResult, IngestionPlan)> {
    ensure_source(source).await?;
    let probe = prober.probe(source).await?;
    let plan = policy::plan(&probe, skip_compress);
    Ok((probe, plan))
}

async fn ensure_source(source: &Path) -> IngestResult<()> {
    match tokio::fs::metadata(source).await {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(IngestError::probe(format!(
            "File not found: {}",
            source.display()
        ))),
    }
}

/// Shorten for display, marking the cut with an ellipsis.
pub fn truncate(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &value[..idx]),
        None => value.to_string(),
    }
}
