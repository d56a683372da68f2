//! Recolor parameters
//!
//! This struct stores the algorithm choice and every tuning constant the
//! two blend algorithms use. It is serialized to JSON (for the `[recolor]`
//! config table and for logging) and defaults to the values the finishes
//! were tuned with.

use serde::{Deserialize, Serialize};

/// Which pixel-blend algorithm to run
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Replace hue/saturation, keep (compressed) lightness
    #[default]
    HslColorize,
    /// Multiply + overlay mix with a highlight-recovery pass
    DualBlend,
}

impl Algorithm {
    pub fn label(&self) -> &'static str {
        match self {
            Algorithm::HslColorize => "HSL colorize",
            Algorithm::DualBlend => "Dual blend",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Algorithm::HslColorize => Algorithm::DualBlend,
            Algorithm::DualBlend => Algorithm::HslColorize,
        }
    }
}

/// HSL colorize tuning
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ColorizeParams {
    /// Lower lightness clamp; keeps near-black shading from crushing
    pub lightness_min: f32,
    /// Upper lightness clamp; keeps highlights from blowing out
    pub lightness_max: f32,
    /// Exponent applied to the clamped lightness
    pub lightness_gamma: f32,
}

impl Default for ColorizeParams {
    fn default() -> Self {
        Self {
            lightness_min: 0.15,
            lightness_max: 0.92,
            lightness_gamma: 0.92,
        }
    }
}

/// Dual blend tuning
///
/// These constants are empirical. They are kept configurable with the
/// defaults that match the shipped look.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct DualBlendParams {
    /// Weight of the multiply blend in the mix
    pub multiply_weight: f32,
    /// Weight of the overlay blend in the mix
    pub overlay_weight: f32,
    /// Channel value where overlay switches from multiply to screen
    pub overlay_threshold: f32,
    /// Fraction of the channel removed by the high-pass approximation
    pub highpass_cut: f32,
    /// How much of the high-pass signal is added back
    pub highpass_strength: f32,
}

impl Default for DualBlendParams {
    fn default() -> Self {
        Self {
            multiply_weight: 0.7,
            overlay_weight: 0.3,
            overlay_threshold: 128.0,
            highpass_cut: 0.7,
            highpass_strength: 0.6,
        }
    }
}

/// All recolor settings
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct RecolorParams {
    pub algorithm: Algorithm,
    pub colorize: ColorizeParams,
    pub dual_blend: DualBlendParams,
}

impl RecolorParams {
    /// Create new default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Same constants, different algorithm
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if every constant is at its default
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = RecolorParams::default();
        assert!(params.is_default());
        assert_eq!(params.algorithm, Algorithm::HslColorize);
        assert_eq!(params.dual_blend.multiply_weight, 0.7);
        assert_eq!(params.dual_blend.overlay_weight, 0.3);
        assert_eq!(params.dual_blend.overlay_threshold, 128.0);
        assert_eq!(params.dual_blend.highpass_strength, 0.6);
        assert_eq!(params.colorize.lightness_min, 0.15);
    }

    #[test]
    fn test_serialization() {
        let mut params = RecolorParams::default().with_algorithm(Algorithm::DualBlend);
        params.dual_blend.highpass_strength = 0.4;

        let json = params.to_json().unwrap();
        assert!(json.contains("\"dual_blend\""));

        let restored = RecolorParams::from_json(&json).unwrap();
        assert_eq!(params, restored);
        assert!(!restored.is_default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let params = RecolorParams::from_json(r#"{"algorithm":"dual_blend","dual_blend":{"overlay_weight":0.5}}"#).unwrap();
        assert_eq!(params.algorithm, Algorithm::DualBlend);
        assert_eq!(params.dual_blend.overlay_weight, 0.5);
        assert_eq!(params.dual_blend.multiply_weight, 0.7);
        assert_eq!(params.colorize, ColorizeParams::default());
    }

    #[test]
    fn test_toggle() {
        assert_eq!(Algorithm::HslColorize.toggled(), Algorithm::DualBlend);
        assert_eq!(Algorithm::DualBlend.toggled(), Algorithm::HslColorize);
    }
}
