//! Caption Burn Module
//!
//! Assembles and executes the FFmpeg invocation that composites a rendered
//! overlay onto a video with the compiled color grade applied.

mod engine;

pub use engine::{
    BurnEngine, BurnError, BurnItem, BurnOutcome, BurnRequest, BurnResult, EncodeSettings,
};
