//! Shared pieces of the `ghoststream` binary: tracing setup, batch manifests,
//! console progress and result rendering.

use anyhow::Context;
use ghoststream_core::{IngestSummary, IngestionPlan, ProbeResult, SecretKey, Stage};
use ghoststream_processing::pipeline::truncate;
use ghoststream_processing::{IngestOptions, IngestRequest, PlanReport, ProgressEvent, ProgressListener};
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Read one base64 key, trying each variable name in order.
///
/// Used by the key-holder commands, which do not need storage or database settings.
pub fn key_from_env(names: &[&str]) -> anyhow::Result<SecretKey> {
    dotenvy::dotenv().ok();
    let value = names
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()))
        .ok_or_else(|| anyhow::anyhow!("{} must be set", names.join(" or ")))?;
    Ok(SecretKey::from_base64(
        names.first().copied().unwrap_or_default(),
        &value,
    )?)
}

/// One entry of a batch manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestEntry {
    pub file: PathBuf,
    pub title: String,
    pub tags: String,
}

/// Parse a JSON array of `{file, title, tags}` entries.
///
/// Relative file paths are resolved against the manifest's directory.
pub fn parse_manifest(json: &str, base_dir: &Path) -> anyhow::Result<Vec<ManifestEntry>> {
    let mut entries: Vec<ManifestEntry> =
        serde_json::from_str(json).context("Manifest must be a JSON array of {file, title, tags}")?;
    for entry in &mut entries {
        if entry.file.is_relative() {
            entry.file = base_dir.join(&entry.file);
        }
    }
    Ok(entries)
}

pub fn load_manifest(path: &Path) -> anyhow::Result<Vec<ManifestEntry>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_manifest(&json, base_dir)
}

impl ManifestEntry {
    pub fn into_request(self, options: IngestOptions) -> IngestRequest {
        IngestRequest {
            source: self.file,
            title: self.title,
            tags: self.tags,
            options,
        }
    }
}

/// Prints the plan table and one line per stage transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleProgress;

impl ProgressListener for ConsoleProgress {
    fn on_event(&self, event: &ProgressEvent) {
        println!("{}", render_event(event));
    }

    fn on_plan(&self, _source: &Path, probe: &ProbeResult, plan: &IngestionPlan) {
        println!("{}", PlanReport { probe, plan });
    }
}

pub fn render_event(event: &ProgressEvent) -> String {
    let name = event
        .source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match (&event.stage, &event.message) {
        (Stage::Failed, Some(message)) => format!("[{:>3}%] {} failed: {}", event.percent, name, message),
        (stage, _) => format!("[{:>3}%] {} {}", event.percent, name, stage),
    }
}

/// Summary block printed after a successful ingestion.
pub fn render_summary(summary: &IngestSummary) -> String {
    let mut out = String::new();
    let heading = if summary.dry_run {
        "DRY RUN complete (nothing uploaded or inserted)"
    } else {
        "Ingestion complete"
    };
    let video_id = summary
        .video_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());

    let rows = [
        ("Video id", video_id),
        ("Bucket", summary.bucket.clone()),
        ("Video key", summary.video_key.clone()),
        ("Thumbnail key", summary.thumb_key.clone()),
        ("Resolution", format!("{}x{}", summary.width, summary.height)),
        ("Duration (s)", summary.duration_seconds.to_string()),
        ("Re-encoded", summary.reencoded.to_string()),
        ("title_enc", truncate(&summary.title_enc, 48)),
        ("Tag digests", summary.tag_count().to_string()),
    ];

    let _ = writeln!(out, "{}", heading);
    for (field, value) in rows {
        let _ = writeln!(out, "  {:<22}{}", field, value);
    }
    for digest in &summary.tag_digests {
        let _ = writeln!(out, "    {}", truncate(digest, 16));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(dry_run: bool) -> IngestSummary {
        IngestSummary {
            video_id: None,
            bucket: "media".to_string(),
            video_key: "videos/a.mp4".to_string(),
            thumb_key: "thumbs/a.jpg".to_string(),
            width: 1280,
            height: 720,
            duration_seconds: 300,
            reencoded: true,
            title_enc: "e".repeat(100),
            tag_digests: vec!["ab".repeat(32), "cd".repeat(32)],
            dry_run,
        }
    }

    #[test]
    fn manifest_paths_resolve_against_manifest_dir() {
        let json = r#"[
            {"file": "clips/a.mp4", "title": "A", "tags": "x, y"},
            {"file": "/abs/b.mov", "title": "B", "tags": "z"}
        ]"#;
        let entries = parse_manifest(json, Path::new("/data")).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file, PathBuf::from("/data/clips/a.mp4"));
        assert_eq!(entries[1].file, PathBuf::from("/abs/b.mov"));
        assert_eq!(entries[0].tags, "x, y");
    }

    #[test]
    fn manifest_rejects_missing_fields() {
        let json = r#"[{"file": "a.mp4"}]"#;
        assert!(parse_manifest(json, Path::new(".")).is_err());
    }

    #[test]
    fn load_manifest_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        std::fs::write(&path, r#"[{"file": "a.mp4", "title": "A", "tags": "t"}]"#).unwrap();

        let entries = load_manifest(&path).unwrap();
        assert_eq!(entries[0].file, dir.path().join("a.mp4"));
    }

    #[test]
    fn summary_truncates_envelope_and_digests() {
        let text = render_summary(&summary(false));
        assert!(text.starts_with("Ingestion complete"));
        assert!(text.contains(&format!("{}…", "e".repeat(48))));
        assert!(!text.contains(&"e".repeat(49)));
        assert!(text.contains(&format!("    {}…", "ab".repeat(8))));
        assert!(text.contains("1280x720"));
    }

    #[test]
    fn dry_run_summary_is_labelled() {
        let text = render_summary(&summary(true));
        assert!(text.starts_with("DRY RUN"));
        assert!(text
            .lines()
            .any(|l| l.trim_start().starts_with("Video id") && l.ends_with('-')));
    }

    #[test]
    fn failed_event_shows_message() {
        let event = ProgressEvent::failed(PathBuf::from("/tmp/clip.mp4"), "boom".to_string());
        assert_eq!(render_event(&event), "[100%] clip.mp4 failed: boom");

        let event = ProgressEvent::new(PathBuf::from("/tmp/clip.mp4"), Stage::Transcoding);
        assert_eq!(render_event(&event), "[ 15%] clip.mp4 transcoding");
    }
}
