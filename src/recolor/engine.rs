//! Recolor engine
//!
//! Stateless per call: takes the original buffer, the compiled mask, a target
//! color and the parameters, and returns a brand new buffer. The input is
//! never mutated, so repeated calls with the same arguments are
//! pixel-identical no matter what was computed before.
//!
//! Mask coverage is a soft weight: `out = original * (1 - w) + recolored * w`
//! with `w = alpha / 255`. Pixels with zero coverage are copied untouched.

use image::RgbaImage;
use rayon::prelude::*;
use tracing::{debug, warn};

use super::raster::{self, AlphaMask};
use crate::color::{hsl_to_rgb_f32, rgb_to_hsl, Hsl, Rgb};
use crate::scene::path::CompoundPath;
use crate::state::edit::{Algorithm, ColorizeParams, DualBlendParams, RecolorParams};

/// Recolor the masked region of `original`
///
/// Returns `None` (a no-op, not an error) when there is no original buffer,
/// no mask, or the mask covers nothing rasterizable.
pub fn recolor(
    original: Option<&RgbaImage>,
    mask: Option<&CompoundPath>,
    target: Rgb,
    params: &RecolorParams,
) -> Option<RgbaImage> {
    let original = original?;
    let mask = mask.filter(|m| !m.is_empty())?;

    let alpha = raster::rasterize(mask, original.width(), original.height())?;
    debug!(
        covered = alpha.covered(),
        algorithm = ?params.algorithm,
        target = %target,
        "recoloring"
    );
    Some(recolor_with_mask(original, &alpha, target, params))
}

/// Recolor using an already rasterized alpha mask
pub fn recolor_with_mask(original: &RgbaImage, mask: &AlphaMask, target: Rgb, params: &RecolorParams) -> RgbaImage {
    let mut out = original.clone();

    if mask.width() != original.width() || mask.height() != original.height() {
        warn!(
            mask_w = mask.width(),
            mask_h = mask.height(),
            image_w = original.width(),
            image_h = original.height(),
            "mask size does not match image, leaving image unchanged"
        );
        return out;
    }

    let row_len = original.width() as usize * 4;
    if row_len == 0 {
        return out;
    }

    let target_hsl = target.to_hsl();
    let target_rgb = [target.r as f32, target.g as f32, target.b as f32];
    let buffer: &mut [u8] = &mut out;

    buffer.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
        let coverage = mask.row(y as u32);
        for (px, &alpha) in row.chunks_exact_mut(4).zip(coverage) {
            if alpha == 0 {
                continue;
            }
            let weight = alpha as f32 / 255.0;
            let src = [px[0], px[1], px[2]];

            let recolored = match params.algorithm {
                Algorithm::HslColorize => colorize_pixel(src, target_hsl, &params.colorize),
                Algorithm::DualBlend => dual_blend_pixel(src, target_rgb, &params.dual_blend),
            };

            for c in 0..3 {
                let v = src[c] as f32 * (1.0 - weight) + recolored[c] * weight;
                px[c] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    });

    out
}

/// Lightness after clamping and gamma compression
pub fn corrected_lightness(l: f32, params: &ColorizeParams) -> f32 {
    l.clamp(params.lightness_min, params.lightness_max)
        .powf(params.lightness_gamma)
}

/// Target hue and saturation at the pixel's corrected lightness, 0..=255
fn colorize_pixel(src: [u8; 3], target: Hsl, params: &ColorizeParams) -> [f32; 3] {
    let own = rgb_to_hsl(src[0], src[1], src[2]);
    let l = corrected_lightness(own.l, params);
    let (r, g, b) = hsl_to_rgb_f32(target.h, target.s, l);
    [r * 255.0, g * 255.0, b * 255.0]
}

fn dual_blend_pixel(src: [u8; 3], target: [f32; 3], params: &DualBlendParams) -> [f32; 3] {
    [
        dual_blend_channel(src[0] as f32, target[0], params),
        dual_blend_channel(src[1] as f32, target[1], params),
        dual_blend_channel(src[2] as f32, target[2], params),
    ]
}

/// Multiply/overlay mix plus high-pass highlight recovery for one channel
fn dual_blend_channel(value: f32, target: f32, params: &DualBlendParams) -> f32 {
    let multiply = value * target / 255.0;
    let overlay = if value < params.overlay_threshold {
        2.0 * value * target / 255.0
    } else {
        255.0 - 2.0 * (255.0 - value) * (255.0 - target) / 255.0
    };
    let combined = params.multiply_weight * multiply + params.overlay_weight * overlay;

    let highpass = (value - value * params.highpass_cut).max(0.0) + 128.0;
    (combined + params.highpass_strength * (highpass - 128.0)).clamp(0.0, 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::path::PathCommand;
    use image::Rgba;

    fn textured(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let v = (60 + (x * 3 + y * 5) % 140) as u8;
            Rgba([v, v.saturating_add(10), v.saturating_sub(15), 255])
        })
    }

    fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> CompoundPath {
        let mut p = CompoundPath::new();
        p.push(PathCommand::MoveTo { x: x0, y: y0 });
        p.push(PathCommand::LineTo { x: x1, y: y0 });
        p.push(PathCommand::LineTo { x: x1, y: y1 });
        p.push(PathCommand::LineTo { x: x0, y: y1 });
        p.push(PathCommand::Close);
        p
    }

    fn evergreen() -> Rgb {
        Rgb::from_hex("#2F5A3A").unwrap()
    }

    #[test]
    fn test_missing_inputs_are_noops() {
        let img = textured(10, 10);
        let params = RecolorParams::default();
        assert!(recolor(None, Some(&rect(0.0, 0.0, 5.0, 5.0)), evergreen(), &params).is_none());
        assert!(recolor(Some(&img), None, evergreen(), &params).is_none());
        assert!(recolor(Some(&img), Some(&CompoundPath::new()), evergreen(), &params).is_none());
    }

    #[test]
    fn test_evergreen_rectangle_scenario() {
        let original = textured(200, 200);
        let mask = rect(50.0, 50.0, 150.0, 150.0);
        let target = evergreen();
        let params = RecolorParams::default();

        let out = recolor(Some(&original), Some(&mask), target, &params).unwrap();

        assert_eq!(out.get_pixel(10, 10), original.get_pixel(10, 10));

        let src = original.get_pixel(100, 100);
        let dst = out.get_pixel(100, 100);
        let got = rgb_to_hsl(dst[0], dst[1], dst[2]);
        let want = target.to_hsl();
        assert!((got.h - want.h).abs() < 2.0, "hue {} vs {}", got.h, want.h);
        assert!((got.s - want.s).abs() < 0.03, "saturation {} vs {}", got.s, want.s);

        let own_l = rgb_to_hsl(src[0], src[1], src[2]).l;
        let expected_l = corrected_lightness(own_l, &params.colorize);
        assert!((got.l - expected_l).abs() < 0.01, "lightness {} vs {}", got.l, expected_l);
        assert_eq!(dst[3], 255);
    }

    #[test]
    fn test_outside_mask_is_untouched_for_both_algorithms() {
        let original = textured(64, 48);
        let mask = rect(10.3, 7.7, 40.6, 30.2);
        for algorithm in [Algorithm::HslColorize, Algorithm::DualBlend] {
            let params = RecolorParams::default().with_algorithm(algorithm);
            let alpha = raster::rasterize(&mask, 64, 48).unwrap();
            let out = recolor(Some(&original), Some(&mask), evergreen(), &params).unwrap();
            for (x, y, px) in out.enumerate_pixels() {
                if alpha.get(x, y) == 0 {
                    assert_eq!(px, original.get_pixel(x, y), "{:?} changed at {},{}", algorithm, x, y);
                }
            }
        }
    }

    #[test]
    fn test_same_inputs_same_output() {
        let original = textured(80, 80);
        let mask = rect(5.0, 5.0, 70.0, 60.0);
        let params = RecolorParams::default();
        let first = recolor(Some(&original), Some(&mask), evergreen(), &params).unwrap();
        let other = recolor(Some(&original), Some(&mask), Rgb::new(200, 30, 30), &params).unwrap();
        let again = recolor(Some(&original), Some(&mask), evergreen(), &params).unwrap();
        assert_ne!(first, other);
        assert_eq!(first, again);
        // The input buffer is never written
        assert_eq!(original, textured(80, 80));
    }

    #[test]
    fn test_partial_coverage_blends_between() {
        let original = RgbaImage::from_pixel(1, 1, Rgba([120, 120, 120, 255]));
        let params = RecolorParams::default();

        for algorithm in [Algorithm::HslColorize, Algorithm::DualBlend] {
            let params = params.with_algorithm(algorithm);
            let full = recolor_with_mask(&original, &AlphaMask::filled(1, 1, 255), evergreen(), &params);
            let half = recolor_with_mask(&original, &AlphaMask::filled(1, 1, 128), evergreen(), &params);

            let o = original.get_pixel(0, 0);
            let f = full.get_pixel(0, 0);
            let h = half.get_pixel(0, 0);
            let mut differing = 0;
            for c in 0..3 {
                if (o[c] as i16 - f[c] as i16).abs() >= 2 {
                    differing += 1;
                    let (lo, hi) = (o[c].min(f[c]), o[c].max(f[c]));
                    assert!(h[c] > lo && h[c] < hi, "{:?} channel {}: {} not in ({}, {})", algorithm, c, h[c], lo, hi);
                }
            }
            assert!(differing > 0);
        }
    }

    #[test]
    fn test_dual_blend_reference_values() {
        let params = DualBlendParams::default();
        assert_eq!(dual_blend_channel(100.0, 200.0, &params).round(), 120.0);
        assert_eq!(dual_blend_channel(200.0, 50.0, &params).round(), 113.0);
        assert_eq!(dual_blend_channel(255.0, 255.0, &params), 255.0);

        let no_highpass = DualBlendParams {
            highpass_strength: 0.0,
            ..params
        };
        assert_eq!(dual_blend_channel(100.0, 200.0, &no_highpass).round(), 102.0);
    }

    #[test]
    fn test_dual_blend_full_mask() {
        let original = RgbaImage::from_pixel(2, 1, Rgba([100, 100, 100, 77]));
        let params = RecolorParams::default().with_algorithm(Algorithm::DualBlend);
        let out = recolor_with_mask(&original, &AlphaMask::filled(2, 1, 255), Rgb::new(200, 200, 200), &params);
        assert_eq!(out.get_pixel(1, 0), &Rgba([120, 120, 120, 77]));
    }

    #[test]
    fn test_lightness_correction_bounds() {
        let params = ColorizeParams::default();
        assert!((corrected_lightness(0.0, &params) - 0.15f32.powf(0.92)).abs() < 1e-6);
        assert!((corrected_lightness(1.0, &params) - 0.92f32.powf(0.92)).abs() < 1e-6);
        let mid = corrected_lightness(0.5, &params);
        assert!(mid > 0.5 && mid < 0.55);
    }

    #[test]
    fn test_mismatched_mask_leaves_image() {
        let original = textured(4, 4);
        let out = recolor_with_mask(&original, &AlphaMask::filled(3, 4, 255), evergreen(), &RecolorParams::default());
        assert_eq!(out, original);
    }
}
