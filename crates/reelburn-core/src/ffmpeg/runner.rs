//! FFmpeg Runner Module
//!
//! Executes assembled FFmpeg invocations and probes media files via FFprobe.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use super::{FFmpegError, FFmpegInfo, FFmpegResult};

/// How much of FFmpeg's stderr to keep when an invocation fails.
const STDERR_TAIL_CHARS: usize = 500;

/// Media information extracted by FFprobe
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration_sec: f64,
    /// Video stream info (if present)
    pub video: Option<VideoStreamInfo>,
    /// Audio stream info (if present)
    pub audio: Option<AudioStreamInfo>,
    /// Container format
    pub format: String,
    /// File size in bytes
    pub size_bytes: u64,
}

/// Video stream information
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStreamInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate (frames per second)
    pub fps: f64,
    /// Codec name (e.g., "h264", "vp9")
    pub codec: String,
    /// Pixel format
    pub pixel_format: String,
}

/// Audio stream information
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioStreamInfo {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u8,
    /// Codec name (e.g., "aac", "mp3")
    pub codec: String,
}

/// FFmpeg runner: executes ffmpeg/ffprobe with captured output
#[derive(Clone)]
pub struct FFmpegRunner {
    info: Arc<FFmpegInfo>,
}

impl FFmpegRunner {
    /// Create a runner from a detected FFmpeg installation
    pub fn new(info: FFmpegInfo) -> Self {
        Self {
            info: Arc::new(info),
        }
    }

    /// The detected installation backing this runner
    pub fn info(&self) -> &FFmpegInfo {
        &self.info
    }

    /// Run an assembled ffmpeg invocation to completion.
    ///
    /// On non-zero exit, the tail of stderr is surfaced in the error; the
    /// useful diagnostics from ffmpeg are always in the last lines.
    pub async fn run(&self, args: &[String]) -> FFmpegResult<()> {
        debug!(args = args.join(" "), "running ffmpeg");

        let output = tokio::process::Command::new(&self.info.ffmpeg_path)
            .args(args)
            .output()
            .await
            .map_err(FFmpegError::ProcessError)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FFmpegError::ExecutionFailed(tail(
                &stderr,
                STDERR_TAIL_CHARS,
            )));
        }

        Ok(())
    }

    /// Probe a media file
    pub async fn probe(&self, input: &Path) -> FFmpegResult<MediaInfo> {
        if !input.exists() {
            return Err(FFmpegError::InvalidInput(format!(
                "Input file does not exist: {}",
                input.display()
            )));
        }

        let output = tokio::process::Command::new(&self.info.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                &input.to_string_lossy(),
            ])
            .output()
            .await
            .map_err(FFmpegError::ProcessError)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FFmpegError::ProbeError(format!(
                "FFprobe failed: {stderr}"
            )));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        parse_probe_output(&json_str)
    }
}

/// Last `max_chars` characters of a string
fn tail(s: &str, max_chars: usize) -> String {
    let count = s.chars().count();
    if count <= max_chars {
        s.to_string()
    } else {
        s.chars().skip(count - max_chars).collect()
    }
}

/// Parse FFprobe JSON output
fn parse_probe_output(json_str: &str) -> FFmpegResult<MediaInfo> {
    let json: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| FFmpegError::ParseError(format!("Failed to parse FFprobe output: {e}")))?;

    let format = json
        .get("format")
        .ok_or_else(|| FFmpegError::ParseError("Missing format info".to_string()))?;

    let duration_sec = str_field(format, "duration")
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    let size_bytes = str_field(format, "size")
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let format_name = str_field(format, "format_name")
        .unwrap_or("unknown")
        .to_string();

    let streams = json
        .get("streams")
        .and_then(|s| s.as_array())
        .cloned()
        .unwrap_or_default();

    let mut video = None;
    let mut audio = None;

    for stream in &streams {
        match str_field(stream, "codec_type") {
            Some("video") if video.is_none() => video = Some(parse_video_stream(stream)),
            Some("audio") if audio.is_none() => audio = Some(parse_audio_stream(stream)),
            _ => {}
        }
    }

    Ok(MediaInfo {
        duration_sec,
        video,
        audio,
        format: format_name,
        size_bytes,
    })
}

fn str_field<'a>(value: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(|v| v.as_str())
}

fn parse_video_stream(stream: &serde_json::Value) -> VideoStreamInfo {
    let width = stream.get("width").and_then(|w| w.as_u64()).unwrap_or(0) as u32;
    let height = stream.get("height").and_then(|h| h.as_u64()).unwrap_or(0) as u32;

    VideoStreamInfo {
        width,
        height,
        fps: str_field(stream, "r_frame_rate")
            .and_then(parse_frame_rate)
            .unwrap_or(30.0),
        codec: str_field(stream, "codec_name").unwrap_or("unknown").to_string(),
        pixel_format: str_field(stream, "pix_fmt").unwrap_or("unknown").to_string(),
    }
}

fn parse_audio_stream(stream: &serde_json::Value) -> AudioStreamInfo {
    AudioStreamInfo {
        sample_rate: str_field(stream, "sample_rate")
            .and_then(|s| s.parse().ok())
            .unwrap_or(44100),
        channels: stream.get("channels").and_then(|c| c.as_u64()).unwrap_or(2) as u8,
        codec: str_field(stream, "codec_name").unwrap_or("unknown").to_string(),
    }
}

/// Parse an ffprobe frame rate, either rational ("30000/1001") or plain
fn parse_frame_rate(s: &str) -> Option<f64> {
    match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            (den > 0.0).then(|| num / den)
        }
        None => s.parse().ok(),
    }
}
