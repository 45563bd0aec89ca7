//! FFmpeg Filter Graph Builder
//!
//! Compiles a [`ColorCorrection`] into the FFmpeg filter pipeline consumed
//! by the burn encoder. The whole grade collapses into one
//! `colorchannelmixer` invocation between a `format=rgb24` stage and the
//! fixed output scale; neutral grades short-circuit to a passthrough graph.
//!
//! # Example
//!
//! ```rust,ignore
//! let graph = FilterGraph::compile(&grade, true);
//! // "[0:v]format=rgb24,colorchannelmixer=...[graded];[graded][1:v]overlay=0:0,scale=..."
//! ```

use super::grading::{ColorCorrection, EffectParams};
use super::matrix::{self, ColorMatrix};

/// Canonical output stage: TikTok portrait 1080x1920, Lanczos scaling,
/// square pixels.
const OUTPUT_SCALE: &str = "scale=1080:1920:flags=lanczos,setsar=1";

/// Base video input label.
const VIDEO_IN: &str = "0:v";

/// Overlay image input label.
const OVERLAY_IN: &str = "1:v";

/// A compiled filter pipeline plus the calling convention it expects.
///
/// With an overlay the description references two inputs and belongs in
/// `-filter_complex`; without one it is a plain `-vf` chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterGraph {
    description: String,
    has_overlay: bool,
}

impl FilterGraph {
    /// Compiles a grade into a filter pipeline.
    pub fn compile(grade: &ColorCorrection, has_overlay: bool) -> Self {
        let params = EffectParams::from_grade(grade);

        if params.is_neutral() {
            let description = if has_overlay {
                format!("[{VIDEO_IN}][{OVERLAY_IN}]overlay=0:0,{OUTPUT_SCALE}")
            } else {
                OUTPUT_SCALE.to_string()
            };
            return Self {
                description,
                has_overlay,
            };
        }

        let composed = matrix::compose(&params);

        let mut stages = vec!["format=rgb24".to_string(), mixer_stage(&composed)];
        if params.has_sharpen() {
            stages.push(format!(
                "unsharp=5:5:{amt:.2}:5:5:{amt:.2}",
                amt = params.sharpen
            ));
        }
        let chain = stages.join(",");

        let description = if has_overlay {
            format!("[{VIDEO_IN}]{chain}[graded];[graded][{OVERLAY_IN}]overlay=0:0,{OUTPUT_SCALE}")
        } else {
            format!("{chain},{OUTPUT_SCALE}")
        };

        Self {
            description,
            has_overlay,
        }
    }

    /// The filter description string.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// True when the pipeline references the second (overlay) input.
    pub fn has_overlay(&self) -> bool {
        self.has_overlay
    }
}

/// Serializes the composed transform as one `colorchannelmixer` invocation:
/// nine matrix coefficients plus the three offsets on the alpha slots, six
/// fractional digits each.
fn mixer_stage(t: &ColorMatrix) -> String {
    format!(
        "colorchannelmixer=\
         rr={:.6}:rg={:.6}:rb={:.6}:ra={:.6}:\
         gr={:.6}:gg={:.6}:gb={:.6}:ga={:.6}:\
         br={:.6}:bg={:.6}:bb={:.6}:ba={:.6}",
        t.m[0][0],
        t.m[0][1],
        t.m[0][2],
        t.off[0],
        t.m[1][0],
        t.m[1][1],
        t.m[1][2],
        t.off[1],
        t.m[2][0],
        t.m[2][1],
        t.m[2][2],
        t.off[2],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(f: impl FnOnce(&mut ColorCorrection)) -> ColorCorrection {
        let mut g = ColorCorrection::default();
        f(&mut g);
        g
    }

    #[test]
    fn test_neutral_grade_without_overlay_is_scale_only() {
        let graph = FilterGraph::compile(&ColorCorrection::default(), false);
        assert_eq!(graph.description(), "scale=1080:1920:flags=lanczos,setsar=1");
        assert!(!graph.has_overlay());
    }

    #[test]
    fn test_neutral_grade_with_overlay_is_composite_and_scale() {
        let graph = FilterGraph::compile(&ColorCorrection::default(), true);
        assert_eq!(
            graph.description(),
            "[0:v][1:v]overlay=0:0,scale=1080:1920:flags=lanczos,setsar=1"
        );
        assert!(graph.has_overlay());
        assert!(!graph.description().contains("colorchannelmixer"));
    }

    #[test]
    fn test_threshold_boundary_selects_branch() {
        // brightness=1 maps to factor 1.01, just past the 0.005 band.
        let graph = FilterGraph::compile(&grade(|g| g.brightness = 1.0), false);
        assert!(graph.description().contains("colorchannelmixer"));
        assert!(graph.description().starts_with("format=rgb24,"));

        // Sliders at the hue tolerance stay on the passthrough branch.
        let graph = FilterGraph::compile(&grade(|g| g.temperature = 1.0), false);
        assert!(!graph.description().contains("colorchannelmixer"));
    }

    #[test]
    fn test_brightness_coefficients() {
        let graph = FilterGraph::compile(&grade(|g| g.brightness = 50.0), false);
        let desc = graph.description();
        assert!(desc.contains("rr=1.500000"));
        assert!(desc.contains("gg=1.500000"));
        assert!(desc.contains("bb=1.500000"));
        assert!(desc.contains("rg=0.000000"));
        assert!(desc.contains("ra=0.000000"));
        assert!(desc.ends_with(",scale=1080:1920:flags=lanczos,setsar=1"));
    }

    #[test]
    fn test_contrast_offset_lands_on_alpha_slots() {
        // contrast=-40 -> c=0.6, bias = 0.5 * 0.4 = 0.2.
        let graph = FilterGraph::compile(&grade(|g| g.contrast = -40.0), false);
        let desc = graph.description();
        assert!(desc.contains("rr=0.600000"));
        assert!(desc.contains("ra=0.200000"));
        assert!(desc.contains("ga=0.200000"));
        assert!(desc.contains("ba=0.200000"));
    }

    #[test]
    fn test_warm_temperature_emits_sepia_coefficients() {
        // temperature=100 -> amt=0.5: rr = 1 - 0.5 + 0.5*0.393 = 0.6965.
        let graph = FilterGraph::compile(&grade(|g| g.temperature = 100.0), false);
        let desc = graph.description();
        assert!(desc.starts_with("format=rgb24,colorchannelmixer="));
        assert!(desc.contains("rr=0.696500"));
        assert!(desc.contains("rg=0.384500"));
        assert!(desc.contains("rb=0.094500"));
        assert!(desc.contains("gr=0.174500"));
        assert!(desc.contains("bg=0.267000"));
        assert!(!desc.contains("unsharp"));
        assert!(desc.ends_with(",scale=1080:1920:flags=lanczos,setsar=1"));
    }

    #[test]
    fn test_sharpen_appends_unsharp_stage() {
        let graph = FilterGraph::compile(&grade(|g| g.sharpness = 50.0), false);
        assert!(graph
            .description()
            .contains("unsharp=5:5:1.00:5:5:1.00"));

        // Sharpness alone engages the full chain; the mixer stays identity.
        assert!(graph.description().contains("rr=1.000000"));
    }

    #[test]
    fn test_overlay_variant_wraps_chain_with_labels() {
        let graph = FilterGraph::compile(&grade(|g| g.saturation = 30.0), true);
        let desc = graph.description();
        assert!(desc.starts_with("[0:v]format=rgb24,colorchannelmixer="));
        assert!(desc.contains("[graded];[graded][1:v]overlay=0:0,"));
        assert!(desc.ends_with("scale=1080:1920:flags=lanczos,setsar=1"));
    }

    #[test]
    fn test_overlay_flag_changes_only_graph_shape() {
        let g = grade(|g| {
            g.brightness = 15.0;
            g.temperature = -30.0;
            g.sharpness = 25.0;
        });
        let with = FilterGraph::compile(&g, true);
        let without = FilterGraph::compile(&g, false);

        let mixer_of = |desc: &str| {
            let start = desc.find("colorchannelmixer=").unwrap();
            let end = desc[start..].find(',').unwrap() + start;
            desc[start..end].to_string()
        };
        assert_eq!(mixer_of(with.description()), mixer_of(without.description()));
        assert!(with.description().contains("overlay=0:0"));
        assert!(!without.description().contains("overlay"));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let g = grade(|g| {
            g.brightness = 7.0;
            g.contrast = -3.0;
            g.tint = 12.0;
            g.fade = 30.0;
        });
        let a = FilterGraph::compile(&g, true);
        let b = FilterGraph::compile(&g, true);
        assert_eq!(a, b);
        assert_eq!(a.description(), b.description());
    }

    #[test]
    fn test_negative_coefficients_format_cleanly() {
        // Deep desaturation drives the diagonal entries negative.
        let graph = FilterGraph::compile(&grade(|g| g.saturation = -300.0), false);
        assert!(graph.description().contains("rr=-"));
    }
}
