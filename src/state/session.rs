//! Edit session for one loaded photo
//!
//! The original buffer is captured once and shared read-only. Every recolor
//! reads from it, never from what is currently displayed, so switching
//! colors back and forth always lands on the same pixels. Results are
//! accepted only for the most recently issued request.

use std::sync::Arc;

use image::RgbaImage;
use tracing::debug;

use crate::color::Rgb;
use crate::render::FitTransform;

/// Handed out per recolor request
#[derive(Debug, Clone)]
pub struct RecolorTicket {
    pub token: u64,
    pub original: Arc<RgbaImage>,
}

/// The color currently shown on screen
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedColor {
    pub key: String,
    pub color: Rgb,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    /// Database row of the uploaded image, once persisted
    image_id: Option<i64>,
    original: Arc<RgbaImage>,
    displayed: Arc<RgbaImage>,
    fit: FitTransform,
    latest_token: u64,
    applied: Option<AppliedColor>,
}

impl EditSession {
    pub fn new(original: RgbaImage, fit: FitTransform) -> Self {
        let original = Arc::new(original);
        Self {
            image_id: None,
            displayed: Arc::clone(&original),
            original,
            fit,
            latest_token: 0,
            applied: None,
        }
    }

    pub fn image_id(&self) -> Option<i64> {
        self.image_id
    }

    pub fn set_image_id(&mut self, id: i64) {
        self.image_id = Some(id);
    }

    pub fn original(&self) -> &Arc<RgbaImage> {
        &self.original
    }

    pub fn displayed(&self) -> &Arc<RgbaImage> {
        &self.displayed
    }

    pub fn fit(&self) -> FitTransform {
        self.fit
    }

    pub fn applied(&self) -> Option<&AppliedColor> {
        self.applied.as_ref()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.original.dimensions()
    }

    /// Start a new request; older tickets become stale
    pub fn begin_recolor(&mut self) -> RecolorTicket {
        self.latest_token += 1;
        RecolorTicket {
            token: self.latest_token,
            original: Arc::clone(&self.original),
        }
    }

    /// Whether `token` belongs to the newest request
    pub fn is_current(&self, token: u64) -> bool {
        token == self.latest_token
    }

    /// Show a finished recolor; returns `false` when it is stale
    pub fn commit(&mut self, token: u64, image: Arc<RgbaImage>, applied: AppliedColor) -> bool {
        if !self.is_current(token) {
            debug!(token, latest = self.latest_token, "discarding stale recolor");
            return false;
        }
        if image.dimensions() != self.original.dimensions() {
            debug!(token, "discarding recolor with wrong dimensions");
            return false;
        }
        self.displayed = image;
        self.applied = Some(applied);
        true
    }

    /// Back to the untouched photo; in-flight requests become stale
    pub fn reset(&mut self) {
        self.latest_token += 1;
        self.displayed = Arc::clone(&self.original);
        self.applied = None;
    }

    pub fn is_modified(&self) -> bool {
        !Arc::ptr_eq(&self.displayed, &self.original)
    }
}
