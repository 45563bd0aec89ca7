//! Color Grade Model
//!
//! Defines the raw slider grade supplied by the caller and its normalization
//! into CSS-filter-equivalent effect parameters. The browser preview applies
//! the same CSS filters, so the mapping here must reproduce that arithmetic
//! exactly, including the order of the fade and shadow adjustments.

use serde::{Deserialize, Serialize};

/// Tolerance below which a multiplicative factor counts as neutral.
pub(crate) const FACTOR_EPSILON: f64 = 0.005;

/// Tolerance below which the unsharp amount counts as disabled.
pub(crate) const SHARPEN_EPSILON: f64 = 0.001;

/// Raw-slider tolerance for temperature and tint.
pub(crate) const HUE_EPSILON: f64 = 1.0;

/// Raw color-correction sliders as supplied by the front-end.
///
/// Absent fields deserialize to 0. Values are not range-validated; the UI
/// owns clamping, and any finite input produces a finite result.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorCorrection {
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
    pub sharpness: f64,
    pub shadow: f64,
    pub temperature: f64,
    pub tint: f64,
    pub fade: f64,
}

/// CSS-filter-equivalent parameters derived from raw sliders.
///
/// `brightness`, `contrast` and `saturation` are multiplicative factors
/// centered at 1.0. Temperature and tint stay raw; their matrices are
/// angle/amount-based and derived during composition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectParams {
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
    /// Unsharp-mask amount, 0 = disabled.
    pub sharpen: f64,
    pub temperature: f64,
    pub tint: f64,
}

impl EffectParams {
    /// Maps raw sliders to effect parameters.
    ///
    /// The fade adjustment operates on the already-mapped factors, and the
    /// shadow lift rides on the post-fade brightness. This sequencing is
    /// observable in the output coefficients and must not be commuted.
    pub fn from_grade(grade: &ColorCorrection) -> Self {
        let mut brightness = 1.0 + grade.brightness / 100.0;
        let mut contrast = 1.0 + grade.contrast / 100.0;
        let mut saturation = 1.0 + grade.saturation / 100.0;

        // Fade lifts blacks while flattening contrast and saturation.
        if grade.fade > 0.0 {
            let fade = grade.fade / 100.0;
            brightness = (brightness + fade * 0.4).min(2.0);
            contrast = (contrast - fade * 0.3).max(0.2);
            saturation = (saturation - fade * 0.4).max(0.2);
        }

        if grade.shadow != 0.0 {
            brightness += grade.shadow / 400.0;
        }

        Self {
            brightness,
            contrast,
            saturation,
            sharpen: grade.sharpness / 50.0,
            temperature: grade.temperature,
            tint: grade.tint,
        }
    }

    /// True when every effect sits inside its neutral tolerance band, in
    /// which case the grade compiles to a passthrough graph.
    pub fn is_neutral(&self) -> bool {
        (self.brightness - 1.0).abs() < FACTOR_EPSILON
            && (self.contrast - 1.0).abs() < FACTOR_EPSILON
            && (self.saturation - 1.0).abs() < FACTOR_EPSILON
            && self.temperature.abs() <= HUE_EPSILON
            && self.tint.abs() <= HUE_EPSILON
            && self.sharpen < SHARPEN_EPSILON
    }

    /// True when the pipeline needs an unsharp stage.
    pub fn has_sharpen(&self) -> bool {
        self.sharpen >= SHARPEN_EPSILON
    }
}

impl From<&ColorCorrection> for EffectParams {
    fn from(grade: &ColorCorrection) -> Self {
        Self::from_grade(grade)
    }
}
