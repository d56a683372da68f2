//! Fit transform between photo pixel space and surface display space
//!
//! The photo is scaled uniformly and centered inside the drawing surface.
//! The filled axis is chosen by comparing aspect ratios: content that is
//! relatively wider than the surface fills the width, everything else fills
//! the height. Persisted masks live in photo pixel space and are mapped
//! through this exact transform, so the branch rule must not change.

use cgmath::Point2;

/// Which surface axis the content touches edge to edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitAxis {
    Width,
    Height,
}

/// Uniform scale plus centering offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub axis: FitAxis,
}

impl FitTransform {
    /// Compute the transform for `content` pixels inside a `container`
    ///
    /// Returns `None` when any dimension is zero or not finite.
    pub fn fit(container_w: f32, container_h: f32, content_w: f32, content_h: f32) -> Option<Self> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !(valid(container_w) && valid(container_h) && valid(content_w) && valid(content_h)) {
            return None;
        }

        let container_aspect = container_w / container_h;
        let content_aspect = content_w / content_h;

        let transform = if content_aspect > container_aspect {
            let scale = container_w / content_w;
            Self {
                scale,
                offset_x: 0.0,
                offset_y: (container_h - content_h * scale) / 2.0,
                axis: FitAxis::Width,
            }
        } else {
            let scale = container_h / content_h;
            Self {
                scale,
                offset_x: (container_w - content_w * scale) / 2.0,
                offset_y: 0.0,
                axis: FitAxis::Height,
            }
        };

        Some(transform)
    }

    /// No scaling, no offset
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            axis: FitAxis::Width,
        }
    }

    /// Photo pixel coordinates to surface coordinates
    pub fn to_display(&self, p: Point2<f32>) -> Point2<f32> {
        Point2::new(p.x * self.scale + self.offset_x, p.y * self.scale + self.offset_y)
    }

    /// Surface coordinates to photo pixel coordinates
    pub fn to_image(&self, p: Point2<f32>) -> Point2<f32> {
        Point2::new((p.x - self.offset_x) / self.scale, (p.y - self.offset_y) / self.scale)
    }

    /// A surface-space length expressed in photo pixels
    pub fn length_to_image(&self, len: f32) -> f32 {
        len / self.scale
    }

    /// Size the content occupies on the surface
    pub fn scaled_size(&self, content_w: f32, content_h: f32) -> (f32, f32) {
        (content_w * self.scale, content_h * self.scale)
    }
}
