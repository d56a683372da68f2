//! Editor configuration (`config.toml`)
//!
//! # Example
//!
//! ```toml
//! surface_width = 1024.0
//! surface_height = 768.0
//! brush_width = 12.0
//! log_level = "debug"
//!
//! [recolor]
//! algorithm = "dual_blend"
//!
//! [recolor.dual_blend]
//! highpass_strength = 0.4
//! ```
//!
//! Every key is optional. A missing file means defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::photo::MAX_UPLOAD_BYTES;
use crate::scene::surface::SurfaceSettings;
use crate::state::blobs::BlobStore;
use crate::state::edit::RecolorParams;
use crate::state::library::Library;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    /// Drawing surface size in logical pixels
    pub surface_width: f32,
    pub surface_height: f32,
    /// Upload limit in bytes
    pub max_upload_bytes: u64,
    pub brush_width: f32,
    /// Default rectangle size placed by the rectangle tool
    pub rectangle_size: (f32, f32),
    pub circle_radius: f32,
    /// Clicking this close to the first vertex closes a polygon
    pub polygon_close_radius: f32,
    /// Undo steps kept
    pub history_limit: usize,
    /// Default filter when `RUST_LOG` is not set
    pub log_level: String,
    pub database_path: Option<PathBuf>,
    pub blob_dir: Option<PathBuf>,
    pub recolor: RecolorParams,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let surface = SurfaceSettings::default();
        Self {
            surface_width: 800.0,
            surface_height: 600.0,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            brush_width: surface.brush_width,
            rectangle_size: surface.rectangle_size,
            circle_radius: surface.circle_radius,
            polygon_close_radius: surface.polygon_close_radius,
            history_limit: 100,
            log_level: "info".to_string(),
            database_path: None,
            blob_dir: None,
            recolor: RecolorParams::default(),
        }
    }
}

impl EditorConfig {
    /// `<config dir>/roof-recolor/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("roof-recolor");
            p.push("config.toml");
            p
        })
    }

    /// Load from the default location, falling back to defaults
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |key: &'static str, v: f32| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    key,
                    reason: format!("must be a positive number, got {v}"),
                })
            }
        };
        positive("surface_width", self.surface_width)?;
        positive("surface_height", self.surface_height)?;
        positive("brush_width", self.brush_width)?;
        positive("rectangle_size", self.rectangle_size.0)?;
        positive("rectangle_size", self.rectangle_size.1)?;
        positive("circle_radius", self.circle_radius)?;
        positive("polygon_close_radius", self.polygon_close_radius)?;

        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid {
                key: "max_upload_bytes",
                reason: "must be greater than zero".to_string(),
            });
        }
        self.validate_recolor()
    }

    fn validate_recolor(&self) -> Result<(), ConfigError> {
        let within = |key: &'static str, v: f32, min: f32, max: f32| {
            if v.is_finite() && (min..=max).contains(&v) {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    key,
                    reason: format!("must be between {min} and {max}, got {v}"),
                })
            }
        };

        let colorize = &self.recolor.colorize;
        within("recolor.colorize.lightness_min", colorize.lightness_min, 0.0, 1.0)?;
        within("recolor.colorize.lightness_max", colorize.lightness_max, 0.0, 1.0)?;
        if colorize.lightness_min > colorize.lightness_max {
            return Err(ConfigError::Invalid {
                key: "recolor.colorize",
                reason: "lightness_min is above lightness_max".to_string(),
            });
        }
        if !(colorize.lightness_gamma.is_finite() && colorize.lightness_gamma > 0.0) {
            return Err(ConfigError::Invalid {
                key: "recolor.colorize.lightness_gamma",
                reason: format!("must be a positive number, got {}", colorize.lightness_gamma),
            });
        }

        let dual = &self.recolor.dual_blend;
        within("recolor.dual_blend.multiply_weight", dual.multiply_weight, 0.0, 1.0)?;
        within("recolor.dual_blend.overlay_weight", dual.overlay_weight, 0.0, 1.0)?;
        within("recolor.dual_blend.overlay_threshold", dual.overlay_threshold, 0.0, 255.0)?;
        within("recolor.dual_blend.highpass_cut", dual.highpass_cut, 0.0, 1.0)?;
        within("recolor.dual_blend.highpass_strength", dual.highpass_strength, 0.0, 1.0)?;
        Ok(())
    }

    pub fn surface_settings(&self) -> SurfaceSettings {
        SurfaceSettings {
            brush_width: self.brush_width,
            rectangle_size: self.rectangle_size,
            circle_radius: self.circle_radius,
            polygon_close_radius: self.polygon_close_radius,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(Library::default_db_path)
    }

    pub fn blob_dir(&self) -> PathBuf {
        self.blob_dir.clone().unwrap_or_else(BlobStore::default_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::edit::Algorithm;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.max_upload_bytes, 12 * 1024 * 1024);
        assert_eq!(config.history_limit, 100);
    }

    #[test]
    fn test_partial_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
brush_width = 12.0
rectangle_size = [200.0, 80.0]

[recolor]
algorithm = "dual_blend"

[recolor.dual_blend]
highpass_strength = 0.4
"#,
        )
        .unwrap();

        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.brush_width, 12.0);
        assert_eq!(config.rectangle_size, (200.0, 80.0));
        assert_eq!(config.surface_width, 800.0);
        assert_eq!(config.recolor.algorithm, Algorithm::DualBlend);
        assert_eq!(config.recolor.dual_blend.highpass_strength, 0.4);
        assert_eq!(config.recolor.dual_blend.multiply_weight, 0.7);
    }

    #[test]
    fn test_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "brush_width = \"thick\"").unwrap();
        assert!(matches!(EditorConfig::load(&path), Err(ConfigError::Parse { .. })));

        std::fs::write(&path, "circle_radius = -3.0").unwrap();
        assert!(matches!(
            EditorConfig::load(&path),
            Err(ConfigError::Invalid { key: "circle_radius", .. })
        ));
    }

    #[test]
    fn test_recolor_constants_are_checked() {
        let mut config = EditorConfig::default();
        config.recolor.colorize.lightness_min = 0.0;
        config.recolor.colorize.lightness_gamma = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "recolor.colorize.lightness_gamma", .. })
        ));

        let mut config = EditorConfig::default();
        config.recolor.colorize.lightness_max = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "recolor.colorize.lightness_max", .. })
        ));

        let mut config = EditorConfig::default();
        config.recolor.dual_blend.overlay_weight = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "recolor.dual_blend.overlay_weight", .. })
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[recolor.dual_blend]\noverlay_threshold = 300.0\n").unwrap();
        assert!(matches!(
            EditorConfig::load(&path),
            Err(ConfigError::Invalid { key: "recolor.dual_blend.overlay_threshold", .. })
        ));

        assert!(EditorConfig::default().validate().is_ok());
    }
}
