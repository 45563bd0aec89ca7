//! Color Matrix Composer
//!
//! Builds the single 3x3 matrix + offset representing the whole grade chain.
//! Each constructor matches one CSS filter primitive; composing them into one
//! affine transform means the frame goes through one quantization step no
//! matter how many effects are active.

use super::grading::{EffectParams, FACTOR_EPSILON, HUE_EPSILON};

/// Affine per-pixel color transform: `out = m * in + off`, applied in a
/// linear RGB-like space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorMatrix {
    pub m: [[f64; 3]; 3],
    pub off: [f64; 3],
}

impl ColorMatrix {
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        off: [0.0; 3],
    };

    /// CSS `brightness(b)`: out = in * b.
    pub fn brightness(b: f64) -> Self {
        Self {
            m: [[b, 0.0, 0.0], [0.0, b, 0.0], [0.0, 0.0, b]],
            off: [0.0; 3],
        }
    }

    /// CSS `contrast(c)`: out = (in - 0.5) * c + 0.5.
    pub fn contrast(c: f64) -> Self {
        let bias = 0.5 * (1.0 - c);
        Self {
            m: [[c, 0.0, 0.0], [0.0, c, 0.0], [0.0, 0.0, c]],
            off: [bias; 3],
        }
    }

    /// CSS `saturate(s)`, BT.709 luma weights.
    pub fn saturation(s: f64) -> Self {
        let (wr, wg, wb) = (0.2126, 0.7152, 0.0722);
        Self {
            m: [
                [wr + (1.0 - wr) * s, wg - wg * s, wb - wb * s],
                [wr - wr * s, wg + (1.0 - wg) * s, wb - wb * s],
                [wr - wr * s, wg - wg * s, wb + (1.0 - wb) * s],
            ],
            off: [0.0; 3],
        }
    }

    /// CSS `sepia(a)`: the full sepia matrix blended with identity by `a`.
    pub fn sepia(a: f64) -> Self {
        Self {
            m: [
                [1.0 - a + a * 0.393, a * 0.769, a * 0.189],
                [a * 0.349, 1.0 - a + a * 0.686, a * 0.168],
                [a * 0.272, a * 0.534, 1.0 - a + a * 0.131],
            ],
            off: [0.0; 3],
        }
    }

    /// CSS `hue-rotate(deg)`: luma-preserving hue rotation, BT.601 weights.
    pub fn hue_rotate(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            m: [
                [
                    0.213 + 0.787 * cos - 0.213 * sin,
                    0.715 - 0.715 * cos - 0.715 * sin,
                    0.072 - 0.072 * cos + 0.928 * sin,
                ],
                [
                    0.213 - 0.213 * cos + 0.143 * sin,
                    0.715 + 0.285 * cos + 0.140 * sin,
                    0.072 - 0.072 * cos - 0.283 * sin,
                ],
                [
                    0.213 - 0.213 * cos - 0.787 * sin,
                    0.715 - 0.715 * cos + 0.715 * sin,
                    0.072 + 0.928 * cos + 0.072 * sin,
                ],
            ],
            off: [0.0; 3],
        }
    }

    /// Applies `next` after `self`. The returned transform computes
    /// `next.m * (self.m * in + self.off) + next.off`.
    pub fn then(&self, next: &Self) -> Self {
        Self {
            m: mat_mul(&next.m, &self.m),
            off: add(mat_vec(&next.m, &self.off), next.off),
        }
    }
}

/// Composes the active effects into one transform, in the fixed temporal
/// order brightness, contrast, saturation, temperature, tint. Effects inside
/// their neutral tolerance leave the accumulator untouched.
pub(crate) fn compose(params: &EffectParams) -> ColorMatrix {
    let stages = [
        ((params.brightness - 1.0).abs() >= FACTOR_EPSILON)
            .then(|| ColorMatrix::brightness(params.brightness)),
        ((params.contrast - 1.0).abs() >= FACTOR_EPSILON)
            .then(|| ColorMatrix::contrast(params.contrast)),
        ((params.saturation - 1.0).abs() >= FACTOR_EPSILON)
            .then(|| ColorMatrix::saturation(params.saturation)),
        (params.temperature.abs() > HUE_EPSILON).then(|| temperature_matrix(params.temperature)),
        (params.tint.abs() > HUE_EPSILON).then(|| ColorMatrix::hue_rotate(params.tint / 3.0)),
    ];

    stages
        .into_iter()
        .flatten()
        .fold(ColorMatrix::IDENTITY, |acc, stage| acc.then(&stage))
}

/// Warm values blend toward sepia; cool values rotate hue. Two distinct
/// primitives, matching the two CSS filters the preview uses.
fn temperature_matrix(raw: f64) -> ColorMatrix {
    if raw > 0.0 {
        ColorMatrix::sepia((raw / 200.0).min(1.0))
    } else {
        ColorMatrix::hue_rotate(raw / 5.0)
    }
}

fn mat_mul(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

fn mat_vec(m: &[[f64; 3]; 3], v: &[f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (i, cell) in out.iter_mut().enumerate() {
        *cell = (0..3).map(|j| m[i][j] * v[j]).sum();
    }
    out
}

fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[cfg(test)]
mod tests {
    use super::super::grading::ColorCorrection;
    use super::*;

    const EPS: f64 = 1e-12;

    fn assert_matrix_eq(a: &ColorMatrix, b: &ColorMatrix) {
        for i in 0..3 {
            for j in 0..3 {
                assert!(
                    (a.m[i][j] - b.m[i][j]).abs() < EPS,
                    "m[{i}][{j}]: {} != {}",
                    a.m[i][j],
                    b.m[i][j]
                );
            }
            assert!(
                (a.off[i] - b.off[i]).abs() < EPS,
                "off[{i}]: {} != {}",
                a.off[i],
                b.off[i]
            );
        }
    }

    #[test]
    fn test_neutral_params_compose_to_identity() {
        let params = EffectParams::from_grade(&ColorCorrection::default());
        assert_matrix_eq(&compose(&params), &ColorMatrix::IDENTITY);
    }

    #[test]
    fn test_sub_threshold_effects_are_skipped() {
        // brightness factor 1.004 is inside the 0.005 band; saturation is not.
        let params = EffectParams {
            brightness: 1.004,
            contrast: 1.0,
            saturation: 1.5,
            sharpen: 0.0,
            temperature: 0.0,
            tint: 0.0,
        };
        assert_matrix_eq(&compose(&params), &ColorMatrix::saturation(1.5));
    }

    #[test]
    fn test_brightness_then_contrast_composition_rule() {
        let composed = ColorMatrix::brightness(1.2).then(&ColorMatrix::contrast(0.8));
        // m = 0.8 * 1.2 * I, off = 0.5 * (1 - 0.8).
        for i in 0..3 {
            assert!((composed.m[i][i] - 0.96).abs() < EPS);
            assert!((composed.off[i] - 0.1).abs() < EPS);
        }
        assert!((composed.m[0][1]).abs() < EPS);
    }

    #[test]
    fn test_compose_matches_explicit_product() {
        // brightness=20, contrast=10, saturation=-10 active together must
        // equal Sat * Contrast * Brightness applied to identity.
        let grade = ColorCorrection {
            brightness: 20.0,
            contrast: 10.0,
            saturation: -10.0,
            ..Default::default()
        };
        let composed = compose(&EffectParams::from_grade(&grade));

        let bright = ColorMatrix::brightness(1.2);
        let cont = ColorMatrix::contrast(1.1);
        let sat = ColorMatrix::saturation(0.9);

        let expected_m = mat_mul(&sat.m, &mat_mul(&cont.m, &bright.m));
        // Brightness carries no offset, so the composed offset is the
        // contrast bias pushed through the saturation matrix.
        let expected_off = mat_vec(&sat.m, &cont.off);

        let expected = ColorMatrix {
            m: expected_m,
            off: expected_off,
        };
        assert_matrix_eq(&composed, &expected);
    }

    #[test]
    fn test_hue_rotate_zero_is_identity() {
        // At zero degrees the cos/sin terms collapse back to identity rows.
        assert_matrix_eq(&ColorMatrix::hue_rotate(0.0), &ColorMatrix::IDENTITY);
    }

    #[test]
    fn test_sepia_zero_is_identity() {
        assert_matrix_eq(&ColorMatrix::sepia(0.0), &ColorMatrix::IDENTITY);
    }

    #[test]
    fn test_saturation_zero_is_luma_projection() {
        let gray = ColorMatrix::saturation(0.0);
        for row in gray.m {
            assert!((row[0] - 0.2126).abs() < EPS);
            assert!((row[1] - 0.7152).abs() < EPS);
            assert!((row[2] - 0.0722).abs() < EPS);
        }
    }

    #[test]
    fn test_warm_temperature_uses_sepia() {
        let params = EffectParams {
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            sharpen: 0.0,
            temperature: 50.0,
            tint: 0.0,
        };
        assert_matrix_eq(&compose(&params), &ColorMatrix::sepia(0.25));
    }

    #[test]
    fn test_cool_temperature_uses_hue_rotation() {
        let params = EffectParams {
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            sharpen: 0.0,
            temperature: -50.0,
            tint: 0.0,
        };
        let cool = compose(&params);
        assert_matrix_eq(&cool, &ColorMatrix::hue_rotate(-10.0));

        // The warm branch at the same magnitude is a different formula.
        let warm = ColorMatrix::sepia(0.25);
        assert!((cool.m[0][0] - warm.m[0][0]).abs() > 1e-4);
    }

    #[test]
    fn test_warm_temperature_amount_caps_at_one() {
        let params = EffectParams {
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            sharpen: 0.0,
            temperature: 500.0,
            tint: 0.0,
        };
        assert_matrix_eq(&compose(&params), &ColorMatrix::sepia(1.0));
    }

    #[test]
    fn test_tint_is_hue_rotation_for_both_signs() {
        let positive = compose(&EffectParams {
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            sharpen: 0.0,
            temperature: 0.0,
            tint: 30.0,
        });
        assert_matrix_eq(&positive, &ColorMatrix::hue_rotate(10.0));

        let negative = compose(&EffectParams {
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            sharpen: 0.0,
            temperature: 0.0,
            tint: -30.0,
        });
        assert_matrix_eq(&negative, &ColorMatrix::hue_rotate(-10.0));
    }

    #[test]
    fn test_extreme_inputs_stay_finite() {
        let grade = ColorCorrection {
            brightness: 1e6,
            contrast: -1e6,
            saturation: -1e6,
            temperature: -1e6,
            tint: 1e6,
            ..Default::default()
        };
        let composed = compose(&EffectParams::from_grade(&grade));
        for row in composed.m {
            for v in row {
                assert!(v.is_finite());
            }
        }
        for v in composed.off {
            assert!(v.is_finite());
        }
    }
}
