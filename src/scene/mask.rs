//! Mask compiler
//!
//! Turns the mask-contributing shapes on the surface into a single compound
//! path in photo pixel space. Each shape becomes one closed sub-path:
//! - polygons emit their vertices in insertion order
//! - rectangles emit their four (scaled) corners
//! - circles emit two opposing half-arcs using the averaged radius
//!
//! An empty shape set compiles to `None`. That is a no-op for callers, not
//! an error: a previously saved mask stays as it is.

use cgmath::Point2;
use tracing::debug;

use super::path::{CompoundPath, PathCommand};
use super::shape::{Geometry, Shape};
use crate::render::FitTransform;

/// Compile every mask-contributing shape through `fit` into photo space
pub fn compile<'a, I>(shapes: I, fit: &FitTransform) -> Option<CompoundPath>
where
    I: IntoIterator<Item = &'a Shape>,
{
    let mut path = CompoundPath::new();

    for shape in shapes.into_iter().filter(|s| s.is_mask()) {
        match &shape.geometry {
            Geometry::Polygon { points } => {
                if points.len() < 3 {
                    continue;
                }
                let absolute: Vec<Point2<f32>> = points.iter().map(|p| shape.to_absolute(*p)).collect();
                emit_closed(&mut path, fit, &absolute);
            }
            Geometry::Rectangle { width, height } => {
                let w = width * shape.scale.x;
                let h = height * shape.scale.y;
                let o = shape.origin;
                let corners = [
                    o,
                    Point2::new(o.x + w, o.y),
                    Point2::new(o.x + w, o.y + h),
                    Point2::new(o.x, o.y + h),
                ];
                emit_closed(&mut path, fit, &corners);
            }
            Geometry::Circle { .. } => {
                let Some(radius) = shape.effective_radius() else {
                    continue;
                };
                let center = fit.to_image(shape.center());
                let r = fit.length_to_image(radius);
                path.push(PathCommand::MoveTo { x: center.x - r, y: center.y });
                path.push(PathCommand::Arc {
                    radius: r,
                    large_arc: true,
                    sweep: false,
                    x: center.x + r,
                    y: center.y,
                });
                path.push(PathCommand::Arc {
                    radius: r,
                    large_arc: true,
                    sweep: false,
                    x: center.x - r,
                    y: center.y,
                });
                path.push(PathCommand::Close);
            }
            // Mask-tagged helpers and strokes have no area to contribute
            Geometry::VertexMarker { .. } | Geometry::Stroke { .. } => {}
        }
    }

    if path.is_empty() {
        debug!("mask compile: no mask shapes, leaving mask untouched");
        return None;
    }

    debug!(subpaths = path.subpath_count(), "mask compiled");
    Some(path)
}

fn emit_closed(path: &mut CompoundPath, fit: &FitTransform, points: &[Point2<f32>]) {
    let mut iter = points.iter().map(|p| fit.to_image(*p));
    let Some(first) = iter.next() else {
        return;
    };
    path.push(PathCommand::MoveTo { x: first.x, y: first.y });
    for p in iter {
        path.push(PathCommand::LineTo { x: p.x, y: p.y });
    }
    path.push(PathCommand::Close);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::shape::Role;

    fn pt(x: f32, y: f32) -> Point2<f32> {
        Point2::new(x, y)
    }

    #[test]
    fn test_empty_set_is_noop() {
        let fit = FitTransform::identity();
        let none: [Shape; 0] = [];
        assert!(compile(&none, &fit).is_none());

        let marker = Shape::vertex_marker(1, pt(1.0, 1.0), 4.0);
        let stroke = Shape::stroke(2, &[pt(0.0, 0.0), pt(10.0, 10.0)], 5.0, false);
        assert!(compile(&[marker, stroke], &fit).is_none());
    }

    #[test]
    fn test_rectangle_corners_with_scale() {
        let fit = FitTransform::identity();
        let mut rect = Shape::rectangle(1, pt(100.0, 100.0), 100.0, 100.0);
        assert_eq!(
            compile(&[rect.clone()], &fit).unwrap().to_svg(),
            "M 50 50 L 150 50 L 150 150 L 50 150 Z"
        );

        rect.scale.x = 2.0;
        assert_eq!(
            compile(&[rect], &fit).unwrap().to_svg(),
            "M 50 50 L 250 50 L 250 150 L 50 150 Z"
        );
    }

    #[test]
    fn test_polygon_in_insertion_order_through_fit() {
        // Surface shows the photo at 2x with a 10px left margin
        let fit = FitTransform::fit(820.0, 600.0, 400.0, 300.0).unwrap();
        assert_eq!(fit.scale, 2.0);
        assert_eq!(fit.offset_x, 10.0);

        let mut poly = Shape::polygon(1, &[pt(110.0, 100.0), pt(210.0, 100.0), pt(160.0, 200.0)]);
        poly.translate(cgmath::Vector2::new(20.0, 0.0));
        let path = compile(&[poly], &fit).unwrap();
        assert_eq!(path.to_svg(), "M 60 50 L 110 50 L 85 100 Z");
    }

    #[test]
    fn test_circle_as_two_half_arcs() {
        let fit = FitTransform::identity();
        let mut circle = Shape::circle(1, pt(100.0, 80.0), 20.0);
        circle.rescale(1.5, 0.5);
        let path = compile(&[circle], &fit).unwrap();
        // Averaged scale of 1.0 keeps the radius at 20
        assert_eq!(path.to_svg(), "M 80 80 A 20 20 0 1 0 120 80 A 20 20 0 1 0 80 80 Z");
    }

    #[test]
    fn test_one_subpath_per_mask_shape() {
        let fit = FitTransform::identity();
        let mut overlay = Shape::rectangle(9, pt(0.0, 0.0), 5.0, 5.0);
        overlay.role = Role::Overlay;
        let shapes = vec![
            Shape::rectangle(1, pt(10.0, 10.0), 4.0, 4.0),
            overlay,
            Shape::circle(2, pt(50.0, 50.0), 5.0),
            Shape::polygon(3, &[pt(0.0, 0.0), pt(5.0, 0.0), pt(0.0, 5.0)]),
        ];
        assert_eq!(compile(&shapes, &fit).unwrap().subpath_count(), 3);
    }
}
