//! ReelBurn Core Engine
//!
//! Compiles color-grade slider values into FFmpeg filter graphs and burns
//! caption overlays onto short-form video.
//!
//! The center of the crate is the filter-graph compiler in [`effects`]: all
//! active color transforms are pre-multiplied into a single 3x3 matrix +
//! offset so the frame is quantized once regardless of how many sliders are
//! engaged. The [`burn`] module wraps the compiled graph in a TikTok-ready
//! FFmpeg invocation; [`ffmpeg`] locates and drives the external binaries.

pub mod burn;
pub mod effects;
pub mod ffmpeg;

pub use burn::{BurnEngine, BurnItem, BurnOutcome, BurnRequest, EncodeSettings};
pub use effects::{ColorCorrection, ColorMatrix, EffectParams, FilterGraph};
