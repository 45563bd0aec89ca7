//! Burn Engine
//!
//! Drives FFmpeg for single burns and sequential batches: compiles the
//! filter graph for a request, assembles the full argument list, and runs
//! the encode.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::effects::{ColorCorrection, FilterGraph};
use crate::ffmpeg::{FFmpegError, FFmpegRunner};

/// How much of an item's error text a batch outcome keeps.
const OUTCOME_ERROR_CHARS: usize = 300;

// =============================================================================
// Types
// =============================================================================

/// Encode parameters for burned output.
///
/// Defaults target TikTok upload: H.264 High@4.2 at 30 fps with a 15 Mbps
/// cap, faststart moov placement, and 128k AAC audio.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeSettings {
    /// Video codec (e.g., "libx264")
    pub video_codec: String,
    /// Encoder preset (ultrafast..slow)
    pub preset: String,
    /// CRF value (0-51, lower is better)
    pub crf: u8,
    /// Rate-control ceiling (e.g., "15M")
    pub maxrate: String,
    /// Rate-control buffer size (e.g., "15M")
    pub bufsize: String,
    /// H.264 profile
    pub profile: String,
    /// H.264 level
    pub level: String,
    /// Output frame rate
    pub fps: u32,
    /// Audio codec (e.g., "aac")
    pub audio_codec: String,
    /// Audio bitrate (e.g., "128k")
    pub audio_bitrate: String,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "fast".to_string(),
            crf: 18,
            maxrate: "15M".to_string(),
            bufsize: "15M".to_string(),
            profile: "high".to_string(),
            level: "4.2".to_string(),
            fps: 30,
            audio_codec: "aac".to_string(),
            audio_bitrate: "128k".to_string(),
        }
    }
}

impl EncodeSettings {
    /// Encoder arguments in ffmpeg invocation order
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.video_codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-maxrate".to_string(),
            self.maxrate.clone(),
            "-bufsize".to_string(),
            self.bufsize.clone(),
            "-profile:v".to_string(),
            self.profile.clone(),
            "-level".to_string(),
            self.level.clone(),
            "-r".to_string(),
            self.fps.to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ]
    }
}

/// One burn job: a source video, an optional overlay PNG rendered at output
/// resolution, a grade, and the output path.
#[derive(Clone, Debug)]
pub struct BurnRequest {
    pub video: PathBuf,
    pub overlay: Option<PathBuf>,
    pub grade: ColorCorrection,
    pub output: PathBuf,
}

/// One entry of a batch manifest
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnItem {
    /// Source video path
    pub video: PathBuf,
    /// Overlay PNG path, if any
    #[serde(default)]
    pub overlay: Option<PathBuf>,
    /// Color grade; absent means no correction
    #[serde(default)]
    pub grade: ColorCorrection,
}

/// Per-item result of a batch burn
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnOutcome {
    pub index: usize,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Burn error types
#[derive(Debug, thiserror::Error)]
pub enum BurnError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("FFmpeg error: {0}")]
    FFmpeg(#[from] FFmpegError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BurnResult<T> = Result<T, BurnError>;

// =============================================================================
// Engine
// =============================================================================

/// Burn engine: compiles filter graphs and drives ffmpeg
pub struct BurnEngine {
    ffmpeg: FFmpegRunner,
    encode: EncodeSettings,
}

impl BurnEngine {
    /// Create an engine with the default TikTok encode settings
    pub fn new(ffmpeg: FFmpegRunner) -> Self {
        Self {
            ffmpeg,
            encode: EncodeSettings::default(),
        }
    }

    /// Create an engine with custom encode settings
    pub fn with_encode_settings(ffmpeg: FFmpegRunner, encode: EncodeSettings) -> Self {
        Self { ffmpeg, encode }
    }

    /// Build the full ffmpeg argument list for a request.
    ///
    /// With an overlay the graph goes through `-filter_complex` and both
    /// inputs are declared; without one it is a plain `-vf` chain.
    pub fn build_args(&self, request: &BurnRequest) -> Vec<String> {
        let graph = FilterGraph::compile(&request.grade, request.overlay.is_some());

        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            request.video.to_string_lossy().to_string(),
        ];

        if let Some(overlay) = &request.overlay {
            args.push("-i".to_string());
            args.push(overlay.to_string_lossy().to_string());
            args.push("-filter_complex".to_string());
        } else {
            args.push("-vf".to_string());
        }
        args.push(graph.description().to_string());

        args.extend(self.encode.to_args());
        args.push(request.output.to_string_lossy().to_string());
        args
    }

    /// Burn one video
    pub async fn burn(&self, request: &BurnRequest) -> BurnResult<()> {
        if !request.video.exists() {
            return Err(BurnError::InvalidInput(format!(
                "video does not exist: {}",
                request.video.display()
            )));
        }
        if let Some(overlay) = &request.overlay {
            if !overlay.exists() {
                return Err(BurnError::InvalidInput(format!(
                    "overlay does not exist: {}",
                    overlay.display()
                )));
            }
        }
        if let Some(parent) = request.output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let args = self.build_args(request);
        self.ffmpeg.run(&args).await?;

        info!(output = %request.output.display(), "burn complete");
        Ok(())
    }

    /// Burn a manifest sequentially into `out_dir`.
    ///
    /// Failures are recorded per item and do not stop the batch; error text
    /// is truncated so outcome payloads stay small.
    pub async fn burn_batch(&self, items: &[BurnItem], out_dir: &Path) -> BurnResult<Vec<BurnOutcome>> {
        std::fs::create_dir_all(out_dir)?;

        let mut outcomes = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let file_name = format!("burned_{index:03}.mp4");
            let request = BurnRequest {
                video: item.video.clone(),
                overlay: item.overlay.clone(),
                grade: item.grade.clone(),
                output: out_dir.join(&file_name),
            };

            match self.burn(&request).await {
                Ok(()) => outcomes.push(BurnOutcome {
                    index,
                    ok: true,
                    file: Some(file_name),
                    error: None,
                }),
                Err(e) => {
                    warn!(index, error = %e, "burn failed");
                    outcomes.push(BurnOutcome {
                        index,
                        ok: false,
                        file: None,
                        error: Some(truncate(&e.to_string(), OUTCOME_ERROR_CHARS)),
                    });
                }
            }
        }

        Ok(outcomes)
    }
}

/// First `max_chars` characters of a string
fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
