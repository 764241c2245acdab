//! Scripted stand-ins for ffprobe/ffmpeg, object storage and the catalog.

#![allow(dead_code)]

use async_trait::async_trait;
use ghoststream_core::{CatalogRecord, StorageBackend, TagIndexEntry, TagIndexer, TitleEncryptor};
use ghoststream_db::{CatalogError, CatalogResult, CatalogStore};
use ghoststream_processing::{
    CommandError, CommandOutput, CommandRunner, IngestOptions, IngestPipeline, IngestRequest,
    PipelineConfig,
};
use ghoststream_storage::{Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uuid::Uuid;

pub const AES_KEY: [u8; 32] = [7u8; 32];
pub const TAG_KEY: &[u8] = b"test-tag-hmac-key";
pub const BUCKET: &str = "ghoststream-test";

#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub video_codec: &'static str,
    pub audio_codec: Option<&'static str>,
    pub container: &'static str,
}

impl Media {
    pub fn mp4(duration: f64, width: u32, height: u32) -> Self {
        Media {
            duration,
            width,
            height,
            video_codec: "h264",
            audio_codec: Some("aac"),
            container: "mov,mp4,m4a,3gp,3g2,mj2",
        }
    }
}

#[derive(Debug, Clone)]
enum Script {
    Media(Media),
    Corrupt,
}

/// Answers ffprobe queries from scripted media and simulates ffmpeg by writing
/// the output file and scripting what a later probe of it will report.
#[derive(Default)]
pub struct FakeRunner {
    scripts: Mutex<HashMap<String, Script>>,
    forced_output: Mutex<Option<Media>>,
    failing_ffmpeg: Mutex<Option<String>>,
    failing_thumbnail: Mutex<Option<String>>,
    empty_thumbnail: Mutex<bool>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeRunner {
    pub fn with_media(file_name: &str, media: Media) -> Arc<Self> {
        let runner = FakeRunner::default();
        runner
            .scripts
            .lock()
            .unwrap()
            .insert(file_name.to_string(), Script::Media(media));
        Arc::new(runner)
    }

    pub fn add_media(&self, file_name: &str, media: Media) {
        self.scripts
            .lock()
            .unwrap()
            .insert(file_name.to_string(), Script::Media(media));
    }

    pub fn add_corrupt(&self, file_name: &str) {
        self.scripts
            .lock()
            .unwrap()
            .insert(file_name.to_string(), Script::Corrupt);
    }

    /// Make every transcode report this output regardless of arguments.
    pub fn force_output(&self, media: Media) {
        *self.forced_output.lock().unwrap() = Some(media);
    }

    /// Make ffmpeg exit non-zero with `stderr`.
    pub fn fail_ffmpeg(&self, stderr: &str) {
        *self.failing_ffmpeg.lock().unwrap() = Some(stderr.to_string());
    }

    /// Make only the still-frame capture exit non-zero with `stderr`.
    pub fn fail_thumbnail(&self, stderr: &str) {
        *self.failing_thumbnail.lock().unwrap() = Some(stderr.to_string());
    }

    /// Make the still-frame capture exit 0 without writing a file.
    pub fn skip_thumbnail_write(&self) {
        *self.empty_thumbnail.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ffmpeg_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|(program, _)| program == "ffmpeg")
            .map(|(_, args)| args)
            .collect()
    }

    fn probe_response(&self, args: &[String]) -> CommandOutput {
        let target = args.last().cloned().unwrap_or_default();
        let name = file_name(&target);
        let script = self.scripts.lock().unwrap().get(&name).cloned();

        let media = match script {
            Some(Script::Media(media)) => media,
            Some(Script::Corrupt) | None => {
                return CommandOutput {
                    success: false,
                    code: Some(1),
                    stdout: Vec::new(),
                    stderr: format!("{}: Invalid data found when processing input", target),
                }
            }
        };

        let json = if args.iter().any(|a| a == "v:0") {
            serde_json::json!({
                "programs": [],
                "streams": [{
                    "codec_name": media.video_codec,
                    "width": media.width,
                    "height": media.height
                }]
            })
        } else if args.iter().any(|a| a == "a:0") {
            match media.audio_codec {
                Some(codec) => serde_json::json!({"programs": [], "streams": [{"codec_name": codec}]}),
                None => serde_json::json!({"programs": [], "streams": []}),
            }
        } else {
            serde_json::json!({
                "format": {
                    "format_name": media.container,
                    "duration": format!("{:.6}", media.duration)
                }
            })
        };

        CommandOutput {
            success: true,
            code: Some(0),
            stdout: serde_json::to_vec(&json).unwrap(),
            stderr: String::new(),
        }
    }

    fn ffmpeg_response(&self, args: &[String]) -> CommandOutput {
        if let Some(stderr) = self.failing_ffmpeg.lock().unwrap().clone() {
            return CommandOutput {
                success: false,
                code: Some(1),
                stdout: Vec::new(),
                stderr,
            };
        }

        let output = args.last().cloned().unwrap_or_default();
        if output.ends_with(".jpg") {
            if let Some(stderr) = self.failing_thumbnail.lock().unwrap().clone() {
                return CommandOutput {
                    success: false,
                    code: Some(1),
                    stdout: Vec::new(),
                    stderr,
                };
            }
            if *self.empty_thumbnail.lock().unwrap() {
                return CommandOutput {
                    success: true,
                    code: Some(0),
                    stdout: Vec::new(),
                    stderr: String::new(),
                };
            }
        }
        std::fs::write(&output, b"fake media").unwrap();

        if output.ends_with(".mp4") {
            let input = arg_after(args, "-i").unwrap_or_default();
            let source = match self.scripts.lock().unwrap().get(&file_name(&input)).cloned() {
                Some(Script::Media(media)) => media,
                _ => panic!("transcode of unscripted input {}", input),
            };
            let produced = self
                .forced_output
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| simulate_transcode(&source, args));
            self.add_media(&file_name(&output), produced);
        }

        CommandOutput {
            success: true,
            code: Some(0),
            stdout: Vec::new(),
            stderr: String::new(),
        }
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));

        match program {
            "ffprobe" => Ok(self.probe_response(args)),
            "ffmpeg" => Ok(self.ffmpeg_response(args)),
            other => Err(CommandError::NotFound {
                program: other.to_string(),
            }),
        }
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn arg_after(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1).cloned())
}

/// What ffmpeg would report for the given arguments.
fn simulate_transcode(source: &Media, args: &[String]) -> Media {
    let mut out = source.clone();
    out.container = "mov,mp4,m4a,3gp,3g2,mj2";

    if args.iter().any(|a| a == "copy") {
        return out;
    }

    out.video_codec = "h264";
    out.audio_codec = if args.iter().any(|a| a == "-an") {
        None
    } else {
        Some("aac")
    };

    if let Some(filter) = arg_after(args, "-vf") {
        let cap: u32 = filter
            .trim_start_matches("scale=-2:'min(")
            .trim_end_matches(",ih)'")
            .parse()
            .unwrap();
        let height = cap.min(source.height);
        let width = ((source.width as f64 * height as f64 / source.height as f64) / 2.0).round()
            as u32
            * 2;
        out.height = height;
        out.width = width;
    }
    out
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<Vec<StoredObject>>,
    fail_suffix: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }

    /// Fail uploads whose key ends with `suffix`.
    pub fn fail_keys_ending_with(&self, suffix: &str) {
        *self.fail_suffix.lock().unwrap() = Some(suffix.to_string());
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        local_file: &Path,
        content_type: &str,
    ) -> StorageResult<()> {
        if let Some(suffix) = self.fail_suffix.lock().unwrap().as_deref() {
            if key.ends_with(suffix) {
                return Err(StorageError::UploadFailed("connection reset".to_string()));
            }
        }
        let data = std::fs::read(local_file)?;
        self.objects.lock().unwrap().push(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: content_type.to_string(),
            data,
        });
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[derive(Default)]
pub struct MemoryCatalog {
    videos: Mutex<Vec<(Uuid, CatalogRecord)>>,
    tags: Mutex<Vec<(Uuid, String)>>,
    reject_videos: Mutex<bool>,
}

impl MemoryCatalog {
    pub fn videos(&self) -> Vec<(Uuid, CatalogRecord)> {
        self.videos.lock().unwrap().clone()
    }

    pub fn tags(&self) -> Vec<(Uuid, String)> {
        self.tags.lock().unwrap().clone()
    }

    /// Report zero inserted rows for the next video insert.
    pub fn reject_videos(&self) {
        *self.reject_videos.lock().unwrap() = true;
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn insert_video(&self, record: &CatalogRecord) -> CatalogResult<Uuid> {
        if *self.reject_videos.lock().unwrap() {
            return Err(CatalogError::UnexpectedRowCount {
                table: "videos",
                expected: 1,
                actual: 0,
            });
        }
        let id = Uuid::new_v4();
        self.videos.lock().unwrap().push((id, record.clone()));
        Ok(id)
    }

    async fn insert_tag_entries(
        &self,
        video_id: Uuid,
        entries: &[TagIndexEntry],
    ) -> CatalogResult<()> {
        let mut tags = self.tags.lock().unwrap();
        for entry in entries {
            tags.push((video_id, entry.as_str().to_string()));
        }
        Ok(())
    }
}

pub struct Harness {
    pub runner: Arc<FakeRunner>,
    pub store: Arc<MemoryStore>,
    pub catalog: Arc<MemoryCatalog>,
    pub pipeline: Arc<IngestPipeline>,
    pub dir: TempDir,
}

impl Harness {
    pub fn new(runner: Arc<FakeRunner>) -> Self {
        let store = Arc::new(MemoryStore::default());
        let catalog = Arc::new(MemoryCatalog::default());
        let pipeline = IngestPipeline::new(
            PipelineConfig {
                bucket: BUCKET.to_string(),
                ffmpeg_path: "ffmpeg".to_string(),
                ffprobe_path: "ffprobe".to_string(),
            },
            runner.clone(),
            TitleEncryptor::from_key_bytes(&AES_KEY).unwrap(),
            TagIndexer::from_key_bytes(TAG_KEY).unwrap(),
            store.clone(),
            catalog.clone(),
        )
        .unwrap();

        Harness {
            runner,
            store,
            catalog,
            pipeline: Arc::new(pipeline),
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Create an input file on disk so the pipeline can find it.
    pub fn input(&self, file_name: &str) -> PathBuf {
        let path = self.dir.path().join(file_name);
        std::fs::write(&path, b"source media").unwrap();
        path
    }

    pub fn request(&self, file_name: &str, tags: &str, options: IngestOptions) -> IngestRequest {
        IngestRequest {
            source: self.input(file_name),
            title: "Sunset over the pier".to_string(),
            tags: tags.to_string(),
            options,
        }
    }
}
