//! FFmpeg Integration Module
//!
//! Locates system FFmpeg/FFprobe binaries, probes media files, and executes
//! assembled encode invocations for the burn engine. The actual pixel
//! processing always happens in the external `ffmpeg` process; this module
//! only hands it arguments and interprets its exit status.

mod detection;
mod runner;

pub use detection::{detect_system_ffmpeg, validate_ffmpeg, FFmpegInfo};
pub use runner::{AudioStreamInfo, FFmpegRunner, MediaInfo, VideoStreamInfo};

/// FFmpeg-related error types
#[derive(Debug, thiserror::Error)]
pub enum FFmpegError {
    #[error("FFmpeg not found. Install FFmpeg or add it to PATH.")]
    NotFound,

    #[error("FFmpeg execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Invalid input file: {0}")]
    InvalidInput(String),

    #[error("Output path error: {0}")]
    OutputError(String),

    #[error("FFprobe error: {0}")]
    ProbeError(String),

    #[error("Process error: {0}")]
    ProcessError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),
}

pub type FFmpegResult<T> = Result<T, FFmpegError>;
