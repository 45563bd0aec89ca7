//! ReelBurn CLI
//!
//! Headless driver for the burn engine: compile filter graphs, probe media,
//! and burn single videos or whole batches.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use reelburn_core::burn::{BurnEngine, BurnItem, BurnRequest};
use reelburn_core::effects::{ColorCorrection, FilterGraph};
use reelburn_core::ffmpeg::{detect_system_ffmpeg, FFmpegRunner};

#[derive(Parser)]
#[command(name = "reelburn", version, about = "Caption burn engine for short-form video")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the compiled FFmpeg filter graph for a grade
    Filter {
        #[command(flatten)]
        grade: GradeArgs,
        /// Compile the dual-input variant that composites an overlay
        #[arg(long)]
        overlay: bool,
    },
    /// Probe a media file and print stream information as JSON
    Probe {
        /// Input media file
        input: PathBuf,
    },
    /// Burn a single video
    Burn {
        /// Source video
        #[arg(long)]
        input: PathBuf,
        /// Output file
        #[arg(long)]
        output: PathBuf,
        /// Overlay PNG rendered at output resolution
        #[arg(long)]
        overlay: Option<PathBuf>,
        #[command(flatten)]
        grade: GradeArgs,
    },
    /// Burn a batch manifest sequentially
    Batch {
        /// JSON manifest: array of {video, overlay?, grade?}
        manifest: PathBuf,
        /// Output directory for burned files
        #[arg(long, default_value = "burned")]
        out_dir: PathBuf,
    },
}

/// Grade sliders, from a JSON file, inline flags, or both.
/// Inline flags override the file's values field by field.
#[derive(Args)]
struct GradeArgs {
    /// Grade JSON file (camelCase slider fields)
    #[arg(long)]
    grade: Option<PathBuf>,
    #[arg(long)]
    brightness: Option<f64>,
    #[arg(long)]
    contrast: Option<f64>,
    #[arg(long)]
    saturation: Option<f64>,
    #[arg(long)]
    sharpness: Option<f64>,
    #[arg(long)]
    shadow: Option<f64>,
    #[arg(long)]
    temperature: Option<f64>,
    #[arg(long)]
    tint: Option<f64>,
    #[arg(long)]
    fade: Option<f64>,
}

impl GradeArgs {
    fn resolve(&self) -> Result<ColorCorrection> {
        let mut grade = match &self.grade {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading grade file {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing grade file {}", path.display()))?
            }
            None => ColorCorrection::default(),
        };

        if let Some(v) = self.brightness {
            grade.brightness = v;
        }
        if let Some(v) = self.contrast {
            grade.contrast = v;
        }
        if let Some(v) = self.saturation {
            grade.saturation = v;
        }
        if let Some(v) = self.sharpness {
            grade.sharpness = v;
        }
        if let Some(v) = self.shadow {
            grade.shadow = v;
        }
        if let Some(v) = self.temperature {
            grade.temperature = v;
        }
        if let Some(v) = self.tint {
            grade.tint = v;
        }
        if let Some(v) = self.fade {
            grade.fade = v;
        }

        Ok(grade)
    }
}

fn engine() -> Result<BurnEngine> {
    let ffmpeg = detect_system_ffmpeg().context("FFmpeg not found on this system")?;
    Ok(BurnEngine::new(FFmpegRunner::new(ffmpeg)))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Filter { grade, overlay } => {
            let grade = grade.resolve()?;
            let graph = FilterGraph::compile(&grade, overlay);
            println!("{}", graph.description());
        }
        Command::Probe { input } => {
            let ffmpeg = detect_system_ffmpeg().context("FFmpeg not found on this system")?;
            let runner = FFmpegRunner::new(ffmpeg);
            let media = runner.probe(&input).await?;
            println!("{}", serde_json::to_string_pretty(&media)?);
        }
        Command::Burn {
            input,
            output,
            overlay,
            grade,
        } => {
            let grade = grade.resolve()?;
            let request = BurnRequest {
                video: input,
                overlay,
                grade,
                output: output.clone(),
            };
            engine()?.burn(&request).await?;
            println!("{}", output.display());
        }
        Command::Batch { manifest, out_dir } => {
            let text = std::fs::read_to_string(&manifest)
                .with_context(|| format!("reading manifest {}", manifest.display()))?;
            let items: Vec<BurnItem> = serde_json::from_str(&text)
                .with_context(|| format!("parsing manifest {}", manifest.display()))?;
            if items.is_empty() {
                bail!("manifest is empty");
            }

            let outcomes = engine()?.burn_batch(&items, &out_dir).await?;
            let success_count = outcomes.iter().filter(|o| o.ok).count();
            info!(success_count, total = outcomes.len(), "batch complete");

            let summary = serde_json::json!({
                "outcomes": outcomes,
                "successCount": success_count,
                "total": outcomes.len(),
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
