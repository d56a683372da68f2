//! Error taxonomy
//!
//! - input validation: [`crate::photo::UploadError`]
//! - I/O: [`StoreError`]
//! - geometry: [`crate::scene::surface::GeometryError`]
//! - configuration: [`crate::config::ConfigError`]
//!
//! Expected transient states (recolor with no mask, nothing to save) are
//! `None`/`false` returns, never errors.

use thiserror::Error;

use crate::config::ConfigError;
use crate::photo::UploadError;
use crate::scene::surface::GeometryError;

/// Persistence failures (database or blob storage)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode preview: {0}")]
    Encode(#[from] image::ImageError),
    #[error("unknown storage reference {0:?}")]
    UnknownReference(String),
    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: i64 },
    #[error("stored mask has invalid kind {0:?}")]
    BadMaskKind(String),
}

/// Anything an editor action can fail with
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_error_keeps_source_message() {
        let config = ConfigError::Invalid {
            key: "brush_width",
            reason: "must be a positive number, got 0".to_string(),
        };
        let e = EditorError::from(config);
        assert!(matches!(e, EditorError::Config(_)));
        assert_eq!(
            e.to_string(),
            "invalid config value for brush_width: must be a positive number, got 0"
        );

        let e: EditorError = StoreError::NotFound { what: "project", id: 7 }.into();
        assert_eq!(e.to_string(), "project 7 not found");
    }
}
