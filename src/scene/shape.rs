//! Shapes authored on the scene surface
//!
//! Every shape carries an explicit [`Role`] so the mask compiler can pick
//! real mask contributions by pattern matching instead of inspecting loose
//! string tags. All coordinates here are surface (display) coordinates.

use cgmath::{Point2, Vector2};

pub type ShapeId = u64;

/// What a shape is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Compiled into the mask
    MaskContribution,
    /// UI-only helper (polygon vertex dots), removed on tool switch
    Transient,
    /// Visible paint (freehand/eraser strokes), never compiled
    Overlay,
}

/// The drawable primitive
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Vertices relative to the shape origin, in insertion order
    Polygon { points: Vec<Point2<f32>> },
    /// Unscaled size; origin is the top-left corner
    Rectangle { width: f32, height: f32 },
    /// Unscaled radius; origin is the top-left of the bounding box
    Circle { radius: f32 },
    /// Marker for an in-progress polygon vertex; origin is the vertex
    VertexMarker { radius: f32 },
    /// Brush path relative to the origin
    Stroke {
        points: Vec<Point2<f32>>,
        width: f32,
        erase: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub id: ShapeId,
    pub role: Role,
    pub origin: Point2<f32>,
    /// Non-uniform scale applied around the origin
    pub scale: Vector2<f32>,
    pub geometry: Geometry,
}

impl Shape {
    pub fn polygon(id: ShapeId, absolute: &[Point2<f32>]) -> Self {
        let (min, _) = bounds_of(absolute);
        let points = absolute.iter().map(|p| Point2::new(p.x - min.x, p.y - min.y)).collect();
        Self {
            id,
            role: Role::MaskContribution,
            origin: min,
            scale: Vector2::new(1.0, 1.0),
            geometry: Geometry::Polygon { points },
        }
    }

    /// Rectangle of the given size centered on `center`
    pub fn rectangle(id: ShapeId, center: Point2<f32>, width: f32, height: f32) -> Self {
        Self {
            id,
            role: Role::MaskContribution,
            origin: Point2::new(center.x - width / 2.0, center.y - height / 2.0),
            scale: Vector2::new(1.0, 1.0),
            geometry: Geometry::Rectangle { width, height },
        }
    }

    /// Circle of the given radius centered on `center`
    pub fn circle(id: ShapeId, center: Point2<f32>, radius: f32) -> Self {
        Self {
            id,
            role: Role::MaskContribution,
            origin: Point2::new(center.x - radius, center.y - radius),
            scale: Vector2::new(1.0, 1.0),
            geometry: Geometry::Circle { radius },
        }
    }

    pub fn vertex_marker(id: ShapeId, at: Point2<f32>, radius: f32) -> Self {
        Self {
            id,
            role: Role::Transient,
            origin: at,
            scale: Vector2::new(1.0, 1.0),
            geometry: Geometry::VertexMarker { radius },
        }
    }

    pub fn stroke(id: ShapeId, absolute: &[Point2<f32>], width: f32, erase: bool) -> Self {
        let (min, _) = bounds_of(absolute);
        let points = absolute.iter().map(|p| Point2::new(p.x - min.x, p.y - min.y)).collect();
        Self {
            id,
            role: Role::Overlay,
            origin: min,
            scale: Vector2::new(1.0, 1.0),
            geometry: Geometry::Stroke { points, width, erase },
        }
    }

    /// Map a local point to absolute surface coordinates
    pub fn to_absolute(&self, local: Point2<f32>) -> Point2<f32> {
        Point2::new(
            self.origin.x + local.x * self.scale.x,
            self.origin.y + local.y * self.scale.y,
        )
    }

    /// Polygon vertices in absolute coordinates (empty for other kinds)
    pub fn absolute_points(&self) -> Vec<Point2<f32>> {
        match &self.geometry {
            Geometry::Polygon { points } | Geometry::Stroke { points, .. } => {
                points.iter().map(|p| self.to_absolute(*p)).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Circle radius after scale, averaging non-uniform scale
    pub fn effective_radius(&self) -> Option<f32> {
        match self.geometry {
            Geometry::Circle { radius } => Some(radius * (self.scale.x + self.scale.y) / 2.0),
            Geometry::VertexMarker { radius } => Some(radius),
            _ => None,
        }
    }

    /// Axis-aligned bounds as (min, max)
    pub fn bounds(&self) -> (Point2<f32>, Point2<f32>) {
        match &self.geometry {
            Geometry::Polygon { .. } => bounds_of(&self.absolute_points()),
            Geometry::Stroke { width, .. } => {
                let (min, max) = bounds_of(&self.absolute_points());
                let pad = width / 2.0;
                (Point2::new(min.x - pad, min.y - pad), Point2::new(max.x + pad, max.y + pad))
            }
            Geometry::Rectangle { width, height } => (
                self.origin,
                Point2::new(self.origin.x + width * self.scale.x, self.origin.y + height * self.scale.y),
            ),
            Geometry::Circle { radius } => (
                self.origin,
                Point2::new(
                    self.origin.x + 2.0 * radius * self.scale.x,
                    self.origin.y + 2.0 * radius * self.scale.y,
                ),
            ),
            Geometry::VertexMarker { radius } => (
                Point2::new(self.origin.x - radius, self.origin.y - radius),
                Point2::new(self.origin.x + radius, self.origin.y + radius),
            ),
        }
    }

    pub fn center(&self) -> Point2<f32> {
        let (min, max) = self.bounds();
        Point2::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0)
    }

    /// Hit test in surface coordinates
    pub fn contains(&self, p: Point2<f32>) -> bool {
        match &self.geometry {
            Geometry::Polygon { .. } => point_in_polygon(&self.absolute_points(), p),
            Geometry::Circle { .. } => {
                let c = self.center();
                let r = self.effective_radius().unwrap_or(0.0);
                (p.x - c.x).powi(2) + (p.y - c.y).powi(2) <= r * r
            }
            Geometry::VertexMarker { radius } => {
                (p.x - self.origin.x).powi(2) + (p.y - self.origin.y).powi(2) <= radius * radius
            }
            Geometry::Rectangle { .. } | Geometry::Stroke { .. } => {
                let (min, max) = self.bounds();
                p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
            }
        }
    }

    pub fn translate(&mut self, delta: Vector2<f32>) {
        self.origin += delta;
    }

    /// Multiply the current scale, keeping the shape's center in place
    pub fn rescale(&mut self, sx: f32, sy: f32) {
        let before = self.center();
        self.scale.x *= sx;
        self.scale.y *= sy;
        let after = self.center();
        self.origin += before - after;
    }

    pub fn is_mask(&self) -> bool {
        self.role == Role::MaskContribution
    }
}

fn bounds_of(points: &[Point2<f32>]) -> (Point2<f32>, Point2<f32>) {
    if points.is_empty() {
        return (Point2::new(0.0, 0.0), Point2::new(0.0, 0.0));
    }
    let mut min = Point2::new(f32::INFINITY, f32::INFINITY);
    let mut max = Point2::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    (min, max)
}

/// Ray casting point-in-polygon
fn point_in_polygon(vertices: &[Point2<f32>], p: Point2<f32>) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let vi = vertices[i];
        let vj = vertices[j];
        if ((vi.y > p.y) != (vj.y > p.y)) && (p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f32, y: f32) -> Point2<f32> {
        Point2::new(x, y)
    }

    #[test]
    fn test_polygon_is_stored_relative_to_origin() {
        let shape = Shape::polygon(1, &[pt(10.0, 20.0), pt(50.0, 20.0), pt(30.0, 60.0)]);
        assert_eq!(shape.origin, pt(10.0, 20.0));
        assert_eq!(shape.absolute_points(), vec![pt(10.0, 20.0), pt(50.0, 20.0), pt(30.0, 60.0)]);
        assert!(shape.contains(pt(30.0, 30.0)));
        assert!(!shape.contains(pt(5.0, 5.0)));
    }

    #[test]
    fn test_translate_moves_every_vertex() {
        let mut shape = Shape::polygon(1, &[pt(0.0, 0.0), pt(10.0, 0.0), pt(0.0, 10.0)]);
        shape.translate(Vector2::new(5.0, 7.0));
        assert_eq!(shape.absolute_points()[1], pt(15.0, 7.0));
    }

    #[test]
    fn test_rectangle_centered_on_click() {
        let rect = Shape::rectangle(2, pt(100.0, 100.0), 40.0, 20.0);
        assert_eq!(rect.bounds(), (pt(80.0, 90.0), pt(120.0, 110.0)));
        assert!(rect.contains(pt(100.0, 100.0)));
        assert!(!rect.contains(pt(121.0, 100.0)));
    }

    #[test]
    fn test_rescale_keeps_center() {
        let mut rect = Shape::rectangle(2, pt(100.0, 100.0), 40.0, 20.0);
        rect.rescale(2.0, 0.5);
        assert_eq!(rect.center(), pt(100.0, 100.0));
        assert_eq!(rect.bounds(), (pt(60.0, 95.0), pt(140.0, 105.0)));
    }

    #[test]
    fn test_circle_effective_radius_averages_scale() {
        let mut circle = Shape::circle(3, pt(50.0, 50.0), 10.0);
        circle.rescale(2.0, 1.0);
        assert_eq!(circle.effective_radius(), Some(15.0));
        assert_eq!(circle.center(), pt(50.0, 50.0));
    }

    #[test]
    fn test_roles() {
        assert!(Shape::circle(1, pt(0.0, 0.0), 1.0).is_mask());
        assert_eq!(Shape::vertex_marker(2, pt(0.0, 0.0), 3.0).role, Role::Transient);
        assert_eq!(Shape::stroke(3, &[pt(0.0, 0.0), pt(4.0, 4.0)], 2.0, false).role, Role::Overlay);
    }
}
