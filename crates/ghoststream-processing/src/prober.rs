//! Media prober - container, codec, duration and dimension extraction via ffprobe

use ghoststream_core::{IngestError, IngestResult, ProbeResult};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

use crate::command::{render_command, CommandError, CommandRunner};

#[derive(Debug, Default, Deserialize)]
struct StreamsOutput {
    #[serde(default)]
    streams: Vec<StreamEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamEntry {
    codec_name: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct FormatOutput {
    format: Option<FormatEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct FormatEntry {
    format_name: Option<String>,
    /// ffprobe reports duration as a decimal string.
    duration: Option<serde_json::Value>,
}

/// Runs the three inspection queries and combines them into a [`ProbeResult`].
#[derive(Clone)]
pub struct MediaProber {
    runner: Arc<dyn CommandRunner>,
    ffprobe_path: String,
}

impl MediaProber {
    pub fn new(runner: Arc<dyn CommandRunner>, ffprobe_path: impl Into<String>) -> Self {
        Self {
            runner,
            ffprobe_path: ffprobe_path.into(),
        }
    }

    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    pub async fn probe(&self, path: &Path) -> IngestResult<ProbeResult> {
        let start = std::time::Instant::now();
        let target = path.to_string_lossy().into_owned();

        let video = self
            .query(&[
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=codec_name,width,height",
                "-of",
                "json",
                target.as_str(),
            ])
            .await?;
        let audio = self
            .query(&[
                "-v",
                "error",
                "-select_streams",
                "a:0",
                "-show_entries",
                "stream=codec_name",
                "-of",
                "json",
                target.as_str(),
            ])
            .await?;
        let format = self
            .query(&[
                "-v",
                "error",
                "-show_entries",
                "format=format_name,duration",
                "-of",
                "json",
                target.as_str(),
            ])
            .await?;

        let result = combine(&video, &audio, &format)?;

        tracing::debug!(
            resolution = %result.resolution(),
            duration = result.duration_seconds,
            video_codec = %result.video_codec,
            audio_codec = ?result.audio_codec,
            container = %result.container,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Probe complete"
        );

        Ok(result)
    }

    async fn query(&self, args: &[&str]) -> IngestResult<Vec<u8>> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let command = render_command(&self.ffprobe_path, &args);

        let output = self
            .runner
            .run(&self.ffprobe_path, &args)
            .await
            .map_err(|e| match e {
                CommandError::NotFound { .. } => IngestError::probe(e.to_string()),
                other => IngestError::probe(format!("{} ({})", other, command)),
            })?;

        if !output.success {
            return Err(IngestError::probe(format!(
                "Command failed ({}): {}\n\nSTDERR:\n{}",
                output
                    .code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
                command,
                output.stderr
            )));
        }

        Ok(output.stdout)
    }
}

/// Combine the raw JSON of the three queries.
pub(crate) fn combine(video: &[u8], audio: &[u8], format: &[u8]) -> IngestResult<ProbeResult> {
    let video: StreamsOutput = parse(video, "video stream")?;
    let stream = video
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| IngestError::probe("No video stream found."))?;

    let width = stream.width.unwrap_or(0);
    let height = stream.height.unwrap_or(0);
    // the catalog stores dimensions as INTEGER
    if width <= 0 || height <= 0 || width > i32::MAX as i64 || height > i32::MAX as i64 {
        return Err(IngestError::probe("Invalid video dimensions from ffprobe."));
    }
    let video_codec = stream.codec_name.unwrap_or_default().to_lowercase();

    let audio: StreamsOutput = parse(audio, "audio stream")?;
    let audio_codec = audio
        .streams
        .into_iter()
        .next()
        .map(|s| s.codec_name.unwrap_or_default().to_lowercase());

    let format: FormatOutput = parse(format, "format")?;
    let format = format.format.unwrap_or_default();
    let container = format.format_name.unwrap_or_default().to_lowercase();
    let duration_seconds = match format.duration {
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    };
    if !(duration_seconds.is_finite() && duration_seconds > 0.0) {
        return Err(IngestError::probe("Invalid duration from ffprobe."));
    }

    Ok(ProbeResult {
        duration_seconds,
        width: width as u32,
        height: height as u32,
        video_codec,
        audio_codec,
        container,
    })
}

fn parse<T: serde::de::DeserializeOwned>(raw: &[u8], what: &str) -> IngestResult<T> {
    serde_json::from_slice(raw)
        .map_err(|e| IngestError::probe(format!("Failed to parse ffprobe {} JSON: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIDEO: &[u8] = br#"{"programs":[],"streams":[{"codec_name":"H264","width":1920,"height":1080}]}"#;
    const AUDIO: &[u8] = br#"{"programs":[],"streams":[{"codec_name":"aac"}]}"#;
    const NO_AUDIO: &[u8] = br#"{"programs":[],"streams":[]}"#;
    const FORMAT: &[u8] =
        br#"{"format":{"format_name":"mov,mp4,m4a,3gp,3g2,mj2","duration":"300.040000"}}"#;

    #[test]
    fn combines_three_queries() {
        let probe = combine(VIDEO, AUDIO, FORMAT).unwrap();
        assert_eq!(probe.width, 1920);
        assert_eq!(probe.height, 1080);
        assert_eq!(probe.video_codec, "h264");
        assert_eq!(probe.audio_codec.as_deref(), Some("aac"));
        assert_eq!(probe.container, "mov,mp4,m4a,3gp,3g2,mj2");
        assert!((probe.duration_seconds - 300.04).abs() < 1e-9);
    }

    #[test]
    fn missing_audio_is_not_an_error() {
        let probe = combine(VIDEO, NO_AUDIO, FORMAT).unwrap();
        assert_eq!(probe.audio_codec, None);
    }

    #[test]
    fn missing_video_stream_fails() {
        let err = combine(br#"{"streams":[]}"#, AUDIO, FORMAT).unwrap_err();
        assert_eq!(err.to_string(), "Probe failed: No video stream found.");
    }

    #[test]
    fn zero_dimensions_fail() {
        let video = br#"{"streams":[{"codec_name":"h264","width":0,"height":720}]}"#;
        assert!(combine(video, AUDIO, FORMAT).is_err());
    }

    #[test]
    fn dimensions_beyond_integer_range_fail() {
        let video = br#"{"streams":[{"codec_name":"h264","width":3000000000,"height":720}]}"#;
        let err = combine(video, AUDIO, FORMAT).unwrap_err();
        assert_eq!(err.error_code(), "PROBE_ERROR");

        let video = br#"{"streams":[{"codec_name":"h264","width":1280,"height":2147483648}]}"#;
        assert!(combine(video, AUDIO, FORMAT).is_err());
    }

    #[test]
    fn non_positive_duration_fails() {
        let format = br#"{"format":{"format_name":"mp4","duration":"0.000000"}}"#;
        assert!(combine(VIDEO, AUDIO, format).is_err());
        let format = br#"{"format":{"format_name":"mp4"}}"#;
        assert!(combine(VIDEO, AUDIO, format).is_err());
    }

    #[test]
    fn malformed_json_fails() {
        let err = combine(b"not json", AUDIO, FORMAT).unwrap_err();
        assert_eq!(err.error_code(), "PROBE_ERROR");
    }
}
