//! Shared data structures for the application state
//!
//! These structs represent the data model that flows between
//! the database layer and the editor.

use serde::{Deserialize, Serialize};

use crate::scene::path::{CompoundPath, PathParseError};

/// A recoloring session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    /// Unique database ID
    pub id: i64,
    pub title: Option<String>,
    /// Owner identity when signed in
    pub owner: Option<String>,
    /// Anonymous session token when not signed in
    pub session_token: Option<String>,
    /// Unix seconds
    pub created_at: i64,
    pub updated_at: i64,
}

/// One uploaded photograph (immutable once created)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Image {
    pub id: i64,
    pub project_id: i64,
    /// Opaque blob locator; only the blob store interprets it
    pub storage_ref: String,
    pub width: u32,
    pub height: u32,
    pub created_at: i64,
}

/// How a mask region is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MaskKind {
    #[default]
    Include,
    /// Reserved; not produced by the editor yet
    Exclude,
}

impl MaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaskKind::Include => "include",
            MaskKind::Exclude => "exclude",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "include" => Some(MaskKind::Include),
            "exclude" => Some(MaskKind::Exclude),
            _ => None,
        }
    }
}

/// A stored mask; the path is in the image's pixel space
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mask {
    pub id: i64,
    pub image_id: i64,
    pub name: String,
    pub kind: MaskKind,
    pub svg_path: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Mask {
    pub fn path(&self) -> Result<CompoundPath, PathParseError> {
        CompoundPath::parse_svg(&self.svg_path)
    }
}

/// "This image, recolored to this catalog color" (append-only)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variant {
    pub id: i64,
    pub image_id: i64,
    pub color_key: String,
    pub hex: String,
    pub preview_ref: Option<String>,
    pub created_at: i64,
}

/// Payload sent when saving a mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskPayload {
    pub image_id: i64,
    pub name: String,
    pub kind: MaskKind,
    pub svg_path: String,
}

/// Payload sent when saving a variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantPayload {
    pub image_id: i64,
    pub color_key: String,
    pub hex: String,
}

/// A project with everything hanging off it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectBundle {
    pub project: Project,
    pub images: Vec<Image>,
    pub masks: Vec<Mask>,
    pub variants: Vec<Variant>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_payload_wire_format() {
        let payload = MaskPayload {
            image_id: 7,
            name: "Roof".to_string(),
            kind: MaskKind::Include,
            svg_path: "M 0 0 L 1 0 L 1 1 Z".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "include");
        assert_eq!(json["svg_path"], "M 0 0 L 1 0 L 1 1 Z");
        assert_eq!(json["image_id"], 7);
    }

    #[test]
    fn test_mask_kind_strings() {
        for kind in [MaskKind::Include, MaskKind::Exclude] {
            assert_eq!(MaskKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MaskKind::parse("both"), None);
    }
}
