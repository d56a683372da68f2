//! Color space conversion utilities
//!
//! This module handles conversion between the color spaces the recolor
//! engine works in:
//! - sRGB as 8-bit channels (pixel buffers, hex catalog values)
//! - HSL (hue in degrees, saturation and lightness in 0..=1)
//!
//! All functions are pure and allocation-free.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing a hex color string
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("hex color must be 6 digits (optionally prefixed with '#'), got {0:?}")]
    BadLength(String),
    #[error("invalid hex digit in color {0:?}")]
    BadDigit(String),
}

/// An opaque 8-bit sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or `RRGGBB` (case-insensitive)
    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ColorError::BadLength(hex.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| ColorError::BadDigit(hex.to_string()))
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Format as uppercase `#RRGGBB`
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn to_hsl(&self) -> Hsl {
        rgb_to_hsl(self.r, self.g, self.b)
    }

    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// A color in HSL space
///
/// * `h` - hue in degrees, `[0, 360)`
/// * `s` - saturation, `[0, 1]`
/// * `l` - lightness, `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

/// Convert a hex color string to HSL
pub fn hex_to_hsl(hex: &str) -> Result<Hsl, ColorError> {
    Ok(Rgb::from_hex(hex)?.to_hsl())
}

/// Convert 8-bit RGB channels to HSL
///
/// Achromatic input (all channels equal) reports `s = 0` and `h = 0`
/// without dividing by the zero chroma.
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> Hsl {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let d = max - min;

    if d <= f32::EPSILON {
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };

    let h = if max == r {
        let h = (g - b) / d;
        if h < 0.0 { h + 6.0 } else { h }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    // h is in sextants; 6.0 can only appear through rounding
    let h = (h * 60.0) % 360.0;

    Hsl { h, s: s.clamp(0.0, 1.0), l }
}

/// Convert HSL to 8-bit RGB channels (rounded, clamped to 0..=255)
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    let (r, g, b) = hsl_to_rgb_f32(h, s, l);
    (to_channel(r), to_channel(g), to_channel(b))
}

/// Convert HSL to RGB channels in the 0.0..=1.0 range, unrounded
///
/// The recolor engine blends in floating point and only rounds once at the
/// end, so it uses this variant directly.
pub fn hsl_to_rgb_f32(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s <= f32::EPSILON {
        return (l, l, l);
    }

    let h = h.rem_euclid(360.0) / 360.0;
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    (
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

fn to_channel(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: (u8, u8, u8), b: Rgb) {
        let d = |x: u8, y: u8| (x as i16 - y as i16).abs();
        assert!(
            d(a.0, b.r) <= 1 && d(a.1, b.g) <= 1 && d(a.2, b.b) <= 1,
            "{:?} vs {}",
            a,
            b
        );
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgb::from_hex("#2F5A3A").unwrap(), Rgb::new(0x2F, 0x5A, 0x3A));
        assert_eq!(Rgb::from_hex("2f5a3a").unwrap(), Rgb::new(0x2F, 0x5A, 0x3A));
        assert!(matches!(Rgb::from_hex("#FFF"), Err(ColorError::BadLength(_))));
        assert!(matches!(Rgb::from_hex("#GG0000"), Err(ColorError::BadDigit(_))));
        assert_eq!(Rgb::new(1, 171, 255).to_hex(), "#01ABFF");
    }

    #[test]
    fn test_primary_hues() {
        let red = hex_to_hsl("#FF0000").unwrap();
        assert!(red.h.abs() < 0.01 && (red.s - 1.0).abs() < 0.01 && (red.l - 0.5).abs() < 0.01);

        let green = hex_to_hsl("#00FF00").unwrap();
        assert!((green.h - 120.0).abs() < 0.01);

        let blue = hex_to_hsl("#0000FF").unwrap();
        assert!((blue.h - 240.0).abs() < 0.01);
    }

    #[test]
    fn test_desaturated_is_stable() {
        for v in [0u8, 1, 77, 128, 254, 255] {
            let hsl = rgb_to_hsl(v, v, v);
            assert_eq!(hsl.h, 0.0);
            assert_eq!(hsl.s, 0.0);
            assert!(hsl.l.is_finite());
            assert_eq!(hsl_to_rgb(hsl.h, hsl.s, hsl.l), (v, v, v));
        }
    }

    #[test]
    fn test_round_trip_within_one() {
        // Coarse grid over the cube plus the channel extremes
        let steps: Vec<u8> = (0..=255u16).step_by(17).map(|v| v as u8).collect();
        for &r in &steps {
            for &g in &steps {
                for &b in &steps {
                    let rgb = Rgb::new(r, g, b);
                    let hsl = hex_to_hsl(&rgb.to_hex()).unwrap();
                    assert!(hsl.h >= 0.0 && hsl.h < 360.0);
                    assert!((0.0..=1.0).contains(&hsl.s));
                    assert!((0.0..=1.0).contains(&hsl.l));
                    assert_close(hsl_to_rgb(hsl.h, hsl.s, hsl.l), rgb);
                }
            }
        }
    }

    #[test]
    fn test_round_trip_catalog_style_colors() {
        for hex in ["#2F5A3A", "#8B1E1E", "#1F3A5F", "#C2B280", "#36454F"] {
            let rgb = Rgb::from_hex(hex).unwrap();
            let hsl = rgb.to_hsl();
            assert_close(hsl_to_rgb(hsl.h, hsl.s, hsl.l), rgb);
        }
    }
}
