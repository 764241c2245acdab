//! GhostStream CLI: ingest videos into the private catalog.
//!
//! Reads keys, R2 and database settings from the environment (or `.env`).

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use ghoststream_cli::{init_tracing, key_from_env, load_manifest, render_summary, ConsoleProgress};
use ghoststream_core::constants::{DEFAULT_THUMB_PREFIX, DEFAULT_VIDEO_PREFIX};
use ghoststream_core::{IngestConfig, IngestionResult, TagIndexer, TitleEncryptor};
use ghoststream_db::{connect, run_migrations, PgCatalogRepository};
use ghoststream_processing::{
    Analysis, IngestOptions, IngestPipeline, IngestQueue, IngestRequest, MediaProber,
    PipelineConfig, PlanReport, SystemCommandRunner,
};
use ghoststream_storage::create_storage;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "ghoststream", about = "GhostStream video ingestion")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct RunFlags {
    /// Remux instead of re-encoding when the input is already H.264/AAC in MP4/MOV
    #[arg(long)]
    skip_compress: bool,
    /// Run every stage but skip upload and catalog insert
    #[arg(long)]
    dry_run: bool,
    /// Object key prefix for videos
    #[arg(long, default_value = DEFAULT_VIDEO_PREFIX)]
    video_prefix: String,
    /// Object key prefix for thumbnails
    #[arg(long, default_value = DEFAULT_THUMB_PREFIX)]
    thumb_prefix: String,
}

impl From<RunFlags> for IngestOptions {
    fn from(flags: RunFlags) -> Self {
        IngestOptions {
            skip_compress: flags.skip_compress,
            dry_run: flags.dry_run,
            video_prefix: flags.video_prefix,
            thumb_prefix: flags.thumb_prefix,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest one video file
    Ingest {
        /// Path to the source video
        #[arg(long)]
        file: PathBuf,
        /// Plaintext title (stored encrypted)
        #[arg(long)]
        title: String,
        /// Comma-separated tags (stored as keyed digests)
        #[arg(long)]
        tags: String,
        #[command(flatten)]
        flags: RunFlags,
        /// Print the result as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Probe a file and show the ingestion plan without transcoding
    Inspect {
        /// Path to the source video
        file: PathBuf,
        #[arg(long)]
        skip_compress: bool,
    },
    /// Ingest every entry of a JSON manifest, one after another
    Batch {
        /// JSON array of {"file", "title", "tags"} objects
        #[arg(long)]
        manifest: PathBuf,
        #[command(flatten)]
        flags: RunFlags,
    },
    /// Decrypt a stored title envelope (requires AES_KEY_B64)
    DecryptTitle {
        /// Base64 envelope from videos.title_enc
        envelope: String,
    },
    /// Compute lookup digests for comma-separated tags (requires TAG_HMAC_KEY_B64)
    TagDigest {
        tags: String,
    },
    /// Apply catalog database migrations
    Migrate,
}

async fn build_pipeline(config: &IngestConfig) -> anyhow::Result<IngestPipeline> {
    let storage = create_storage(&config.storage)
        .await
        .context("Failed to initialize object storage")?;
    let pool = connect(&config.database)?;
    let catalog = Arc::new(PgCatalogRepository::new(pool));

    let pipeline = IngestPipeline::new(
        PipelineConfig {
            bucket: config.storage.bucket.clone(),
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
        },
        Arc::new(SystemCommandRunner),
        TitleEncryptor::from_key_bytes(config.aes_key.expose())?,
        TagIndexer::from_key_bytes(config.tag_hmac_key.expose())?,
        storage,
        catalog,
    )?;
    Ok(pipeline)
}

fn report(result: &IngestionResult) {
    match (&result.summary, &result.error) {
        (Some(summary), _) => println!("{}", render_summary(summary)),
        (None, error) => eprintln!(
            "ERROR [{}]: {}",
            result.error_code.as_deref().unwrap_or("UNKNOWN"),
            error.as_deref().unwrap_or("ingestion failed")
        ),
    }
}

async fn ingest(request: IngestRequest, json: bool) -> anyhow::Result<()> {
    let config = IngestConfig::from_env()?;
    let pipeline = build_pipeline(&config).await?;

    let result = pipeline.ingest(&request, &ConsoleProgress).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        report(&result);
    }

    if !result.success {
        anyhow::bail!("Ingestion of {} failed", request.source.display());
    }
    Ok(())
}

async fn inspect(file: PathBuf, skip_compress: bool) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let ffprobe = std::env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string());
    let prober = MediaProber::new(Arc::new(SystemCommandRunner), ffprobe);
    let (probe, plan) = ghoststream_processing::inspect(&prober, &file, skip_compress).await?;

    println!("{}", Analysis::from_probe(&probe));
    println!();
    print!("{}", PlanReport { probe: &probe, plan: &plan });
    Ok(())
}

async fn batch(manifest: PathBuf, flags: RunFlags) -> anyhow::Result<()> {
    let entries = load_manifest(&manifest)?;
    let config = IngestConfig::from_env()?;
    let pipeline = Arc::new(build_pipeline(&config).await?);

    let options: IngestOptions = flags.into();
    let requests = entries
        .into_iter()
        .map(|entry| entry.into_request(options.clone()))
        .collect();

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current ingestion");
            interrupt.cancel();
        }
    });

    let outcome = IngestQueue::run_all(pipeline, requests, Arc::new(ConsoleProgress), cancel)
        .await
        .context("Queue worker panicked")?;

    for job in &outcome.completed {
        println!("== {}", job.source.display());
        report(&job.result);
    }
    for source in &outcome.skipped {
        println!("== {} (not started)", source.display());
    }
    println!(
        "{} succeeded, {} failed, {} not started",
        outcome.succeeded(),
        outcome.failed(),
        outcome.skipped.len()
    );

    if outcome.failed() > 0 || !outcome.skipped.is_empty() {
        anyhow::bail!("Batch did not complete cleanly");
    }
    Ok(())
}

fn decrypt_title(envelope: &str) -> anyhow::Result<()> {
    let key = key_from_env(&["AES_KEY_B64", "GS_AES_KEY_B64"])?;
    let encryptor = TitleEncryptor::from_key_bytes(key.expose())?;
    println!("{}", encryptor.decrypt(envelope.trim())?);
    Ok(())
}

fn tag_digest(tags: &str) -> anyhow::Result<()> {
    let key = key_from_env(&["TAG_HMAC_KEY_B64", "GS_TAG_HMAC_KEY_B64"])?;
    let indexer = TagIndexer::from_key_bytes(key.expose())?;
    let tokens = TagIndexer::normalize_tags(tags)?;
    let entries = indexer.index(&tokens)?;
    for (token, entry) in tokens.iter().zip(&entries) {
        println!("{}\t{}", token.as_str(), entry);
    }
    Ok(())
}

async fn migrate() -> anyhow::Result<()> {
    let config = IngestConfig::from_env()?;
    let pool = connect(&config.database)?;
    run_migrations(&pool).await?;
    println!("Migrations applied");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest {
            file,
            title,
            tags,
            flags,
            json,
        } => {
            let request = IngestRequest {
                source: file,
                title,
                tags,
                options: flags.into(),
            };
            ingest(request, json).await?;
        }
        Commands::Inspect {
            file,
            skip_compress,
        } => inspect(file, skip_compress).await?,
        Commands::Batch { manifest, flags } => batch(manifest, flags).await?,
        Commands::DecryptTitle { envelope } => decrypt_title(&envelope)?,
        Commands::TagDigest { tags } => tag_digest(&tags)?,
        Commands::Migrate => migrate().await?,
    }

    Ok(())
}
