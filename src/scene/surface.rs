//! Scene surface: tool modes and pointer-driven authoring
//!
//! The surface owns the authored shapes (in display coordinates) and turns
//! pointer input into shape creation, movement and removal. It knows nothing
//! about pixels; the editor controller listens to the returned
//! [`SurfaceEvent`]s and recompiles the mask when the visible scene changes.

use cgmath::{MetricSpace, Point2, Vector2};
use thiserror::Error;
use tracing::debug;

use super::shape::{Role, Shape, ShapeId};

/// Radius of the dot drawn for each pending polygon vertex
const VERTEX_MARKER_RADIUS: f32 = 4.0;

/// The active authoring tool (exactly one at a time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Select,
    Freehand,
    Polygon,
    Rectangle,
    Circle,
    Eraser,
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::Select,
        Tool::Freehand,
        Tool::Polygon,
        Tool::Rectangle,
        Tool::Circle,
        Tool::Eraser,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Tool::Select => "Select",
            Tool::Freehand => "Freehand",
            Tool::Polygon => "Polygon",
            Tool::Rectangle => "Rectangle",
            Tool::Circle => "Circle",
            Tool::Eraser => "Eraser",
        }
    }
}

/// Pointer input in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point2<f32>),
    Move(Point2<f32>),
    Up(Point2<f32>),
}

/// What changed on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// A mask-contributing shape was created
    ShapeAdded(ShapeId),
    /// A shape was resized or removed, or dragged while listening
    ShapesModified,
    /// A polygon vertex was appended; carries the pending count
    VertexAdded(usize),
    /// A freehand or eraser stroke was committed
    StrokeFinished(ShapeId),
}

impl SurfaceEvent {
    /// Whether the compiled mask may be stale after this event
    pub fn affects_mask(&self) -> bool {
        matches!(self, SurfaceEvent::ShapeAdded(_) | SurfaceEvent::ShapesModified)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("a polygon needs at least {required} points, got {got}; keep clicking to add corners")]
    TooFewPoints { required: usize, got: usize },
    #[error("cannot fit a {width}x{height} image into the editing surface")]
    EmptyImage { width: u32, height: u32 },
}

/// Sizes used when placing shapes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSettings {
    pub brush_width: f32,
    pub rectangle_size: (f32, f32),
    pub circle_radius: f32,
    pub polygon_close_radius: f32,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            brush_width: 20.0,
            rectangle_size: (160.0, 100.0),
            circle_radius: 60.0,
            polygon_close_radius: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    shape: ShapeId,
    last: Point2<f32>,
    moved: bool,
}

#[derive(Debug, Clone)]
struct ActiveStroke {
    points: Vec<Point2<f32>>,
    erase: bool,
}

#[derive(Debug, Clone)]
pub struct SceneSurface {
    width: f32,
    height: f32,
    settings: SurfaceSettings,
    tool: Tool,
    shapes: Vec<Shape>,
    next_id: ShapeId,
    pending_vertices: Vec<Point2<f32>>,
    selected: Option<ShapeId>,
    drag: Option<Drag>,
    stroke: Option<ActiveStroke>,
    listening: bool,
}

impl SceneSurface {
    pub fn new(width: f32, height: f32, settings: SurfaceSettings) -> Self {
        Self {
            width,
            height,
            settings,
            tool: Tool::Select,
            shapes: Vec::new(),
            next_id: 1,
            pending_vertices: Vec::new(),
            selected: None,
            drag: None,
            stroke: None,
            listening: true,
        }
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn settings(&self) -> &SurfaceSettings {
        &self.settings
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn mask_shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(|s| s.role == Role::MaskContribution)
    }

    pub fn selected(&self) -> Option<ShapeId> {
        self.selected
    }

    pub fn pending_vertices(&self) -> &[Point2<f32>] {
        &self.pending_vertices
    }

    /// Whether shape modifications currently trigger mask recompilation
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Switch tools
    ///
    /// Drops any in-progress polygon and its vertex markers. Entering select
    /// mode from another tool starts listening for shape modifications.
    pub fn set_tool(&mut self, tool: Tool) {
        if tool == self.tool {
            return;
        }
        let previous = self.tool;
        self.clear_pending_polygon();
        self.drag = None;
        self.stroke = None;
        self.tool = tool;
        self.listening = tool == Tool::Select;
        if tool != Tool::Select {
            self.selected = None;
        }
        debug!(?previous, ?tool, listening = self.listening, "tool switched");
    }

    /// Feed one pointer event
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<SurfaceEvent> {
        match self.tool {
            Tool::Select => self.handle_select(event),
            Tool::Polygon => match event {
                PointerEvent::Down(p) => self.polygon_click(p),
                _ => None,
            },
            Tool::Rectangle | Tool::Circle => self.handle_place(event),
            Tool::Freehand | Tool::Eraser => self.handle_brush(event),
        }
    }

    /// Append a vertex to the in-progress polygon
    ///
    /// Clicking close to the first vertex once three exist closes the shape.
    pub fn polygon_click(&mut self, p: Point2<f32>) -> Option<SurfaceEvent> {
        if self.pending_vertices.len() >= 3 {
            let first = self.pending_vertices[0];
            if first.distance(p) <= self.settings.polygon_close_radius {
                return self.finalize_polygon().ok().map(SurfaceEvent::ShapeAdded);
            }
        }

        self.pending_vertices.push(p);
        let id = self.allocate_id();
        self.shapes.push(Shape::vertex_marker(id, p, VERTEX_MARKER_RADIUS));
        Some(SurfaceEvent::VertexAdded(self.pending_vertices.len()))
    }

    /// Close the in-progress polygon into a mask shape
    ///
    /// With fewer than three vertices nothing changes: the markers stay so
    /// the user can keep adding corners.
    pub fn finalize_polygon(&mut self) -> Result<ShapeId, GeometryError> {
        if self.pending_vertices.len() < 3 {
            return Err(GeometryError::TooFewPoints {
                required: 3,
                got: self.pending_vertices.len(),
            });
        }

        let vertices = std::mem::take(&mut self.pending_vertices);
        self.remove_transient();

        let id = self.allocate_id();
        self.shapes.push(Shape::polygon(id, &vertices));
        debug!(id, vertices = vertices.len(), "polygon finalized");
        Ok(id)
    }

    /// Scale the selected shape around its center
    ///
    /// Works in any tool mode; a freshly placed shape stays selected.
    pub fn resize_selected(&mut self, sx: f32, sy: f32) -> Option<SurfaceEvent> {
        if !(sx.is_finite() && sy.is_finite() && sx > 0.0 && sy > 0.0) {
            return None;
        }
        let id = self.selected?;
        let shape = self.shapes.iter_mut().find(|s| s.id == id)?;
        shape.rescale(sx, sy);
        debug!(id, sx, sy, "shape resized");
        Some(SurfaceEvent::ShapesModified)
    }

    /// Delete the selected shape
    pub fn remove_selected(&mut self) -> Option<SurfaceEvent> {
        let id = self.selected.take()?;
        let before = self.shapes.len();
        self.shapes.retain(|s| s.id != id);
        if self.shapes.len() == before {
            return None;
        }
        debug!(id, "shape removed");
        Some(SurfaceEvent::ShapesModified)
    }

    /// Replace every persistent shape, e.g. when stepping through history
    pub fn restore_shapes(&mut self, shapes: Vec<Shape>) {
        self.clear_pending_polygon();
        self.drag = None;
        self.stroke = None;
        self.selected = None;
        self.next_id = self.next_id.max(shapes.iter().map(|s| s.id + 1).max().unwrap_or(1));
        self.shapes = shapes;
    }

    /// Persistent shapes only (no vertex markers)
    pub fn snapshot(&self) -> Vec<Shape> {
        self.shapes
            .iter()
            .filter(|s| s.role != Role::Transient)
            .cloned()
            .collect()
    }

    /// Remove everything, e.g. when a new photo is loaded
    pub fn clear(&mut self) {
        self.restore_shapes(Vec::new());
    }

    /// Brush points of the stroke being drawn, if any
    pub fn active_stroke(&self) -> Option<(&[Point2<f32>], bool)> {
        self.stroke.as_ref().map(|s| (s.points.as_slice(), s.erase))
    }

    fn handle_select(&mut self, event: PointerEvent) -> Option<SurfaceEvent> {
        match event {
            PointerEvent::Down(p) => {
                self.selected = self.hit_test(p);
                self.drag = self.selected.map(|shape| Drag { shape, last: p, moved: false });
                None
            }
            PointerEvent::Move(p) => {
                self.drag_to(p);
                None
            }
            PointerEvent::Up(p) => {
                self.drag_to(p);
                match self.drag.take() {
                    Some(drag) if drag.moved && self.listening => Some(SurfaceEvent::ShapesModified),
                    _ => None,
                }
            }
        }
    }

    fn handle_place(&mut self, event: PointerEvent) -> Option<SurfaceEvent> {
        match event {
            PointerEvent::Down(p) => {
                let id = self.allocate_id();
                let shape = if self.tool == Tool::Circle {
                    Shape::circle(id, p, self.settings.circle_radius)
                } else {
                    let (w, h) = self.settings.rectangle_size;
                    Shape::rectangle(id, p, w, h)
                };
                self.shapes.push(shape);
                // The new shape can be dragged right away
                self.selected = Some(id);
                self.drag = Some(Drag { shape: id, last: p, moved: false });
                debug!(id, tool = ?self.tool, "shape placed");
                Some(SurfaceEvent::ShapeAdded(id))
            }
            PointerEvent::Move(p) => {
                self.drag_to(p);
                None
            }
            PointerEvent::Up(p) => {
                self.drag_to(p);
                match self.drag.take() {
                    // The placement already reported ShapeAdded; report the move too
                    Some(drag) if drag.moved => Some(SurfaceEvent::ShapesModified),
                    _ => None,
                }
            }
        }
    }

    fn handle_brush(&mut self, event: PointerEvent) -> Option<SurfaceEvent> {
        match event {
            PointerEvent::Down(p) => {
                self.stroke = Some(ActiveStroke {
                    points: vec![p],
                    erase: self.tool == Tool::Eraser,
                });
                None
            }
            PointerEvent::Move(p) => {
                if let Some(stroke) = self.stroke.as_mut() {
                    stroke.points.push(p);
                }
                None
            }
            PointerEvent::Up(p) => {
                let mut stroke = self.stroke.take()?;
                stroke.points.push(p);
                let id = self.allocate_id();
                self.shapes
                    .push(Shape::stroke(id, &stroke.points, self.settings.brush_width, stroke.erase));
                Some(SurfaceEvent::StrokeFinished(id))
            }
        }
    }

    fn drag_to(&mut self, p: Point2<f32>) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let delta: Vector2<f32> = p - drag.last;
        if delta.x == 0.0 && delta.y == 0.0 {
            return;
        }
        drag.last = p;
        drag.moved = true;
        let id = drag.shape;
        if let Some(shape) = self.shapes.iter_mut().find(|s| s.id == id) {
            shape.translate(delta);
        }
    }

    /// Topmost selectable shape under `p`
    fn hit_test(&self, p: Point2<f32>) -> Option<ShapeId> {
        self.shapes
            .iter()
            .rev()
            .filter(|s| s.role != Role::Transient)
            .find(|s| s.contains(p))
            .map(|s| s.id)
    }

    fn clear_pending_polygon(&mut self) {
        self.pending_vertices.clear();
        self.remove_transient();
    }

    fn remove_transient(&mut self) {
        self.shapes.retain(|s| s.role != Role::Transient);
    }

    fn allocate_id(&mut self) -> ShapeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::shape::Geometry;

    fn pt(x: f32, y: f32) -> Point2<f32> {
        Point2::new(x, y)
    }

    fn surface() -> SceneSurface {
        SceneSurface::new(800.0, 600.0, SurfaceSettings::default())
    }

    fn click(s: &mut SceneSurface, p: Point2<f32>) -> Option<SurfaceEvent> {
        let down = s.handle_pointer(PointerEvent::Down(p));
        s.handle_pointer(PointerEvent::Up(p)).or(down)
    }

    #[test]
    fn test_polygon_with_two_points_is_rejected() {
        let mut s = surface();
        s.set_tool(Tool::Polygon);
        click(&mut s, pt(10.0, 10.0));
        click(&mut s, pt(100.0, 10.0));

        let err = s.finalize_polygon().unwrap_err();
        assert_eq!(err, GeometryError::TooFewPoints { required: 3, got: 2 });
        assert_eq!(s.mask_shapes().count(), 0);
        // Markers stay for further editing
        assert_eq!(s.shapes().iter().filter(|sh| sh.role == Role::Transient).count(), 2);
        assert_eq!(s.pending_vertices().len(), 2);

        click(&mut s, pt(50.0, 80.0));
        assert!(s.finalize_polygon().is_ok());
        assert_eq!(s.mask_shapes().count(), 1);
        assert!(s.shapes().iter().all(|sh| sh.role != Role::Transient));
    }

    #[test]
    fn test_click_near_first_vertex_closes_polygon() {
        let mut s = surface();
        s.set_tool(Tool::Polygon);
        assert_eq!(click(&mut s, pt(10.0, 10.0)), Some(SurfaceEvent::VertexAdded(1)));
        click(&mut s, pt(100.0, 10.0));
        click(&mut s, pt(100.0, 100.0));
        let event = click(&mut s, pt(13.0, 12.0));
        assert!(matches!(event, Some(SurfaceEvent::ShapeAdded(_))));

        let poly = s.mask_shapes().next().unwrap();
        match &poly.geometry {
            Geometry::Polygon { points } => assert_eq!(points.len(), 3),
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_tool_switch_clears_pending_polygon() {
        let mut s = surface();
        s.set_tool(Tool::Polygon);
        click(&mut s, pt(10.0, 10.0));
        click(&mut s, pt(20.0, 10.0));
        s.set_tool(Tool::Rectangle);
        assert!(s.pending_vertices().is_empty());
        assert!(s.shapes().is_empty());
    }

    #[test]
    fn test_rectangle_and_circle_centered_on_click() {
        let mut s = surface();
        s.set_tool(Tool::Rectangle);
        let event = click(&mut s, pt(200.0, 150.0));
        assert!(matches!(event, Some(SurfaceEvent::ShapeAdded(_))));
        assert_eq!(s.shapes()[0].center(), pt(200.0, 150.0));

        s.set_tool(Tool::Circle);
        click(&mut s, pt(400.0, 300.0));
        assert_eq!(s.shapes()[1].center(), pt(400.0, 300.0));
        assert_eq!(s.shapes()[1].effective_radius(), Some(60.0));
    }

    #[test]
    fn test_placed_shape_is_draggable_immediately() {
        let mut s = surface();
        s.set_tool(Tool::Rectangle);
        s.handle_pointer(PointerEvent::Down(pt(200.0, 150.0)));
        s.handle_pointer(PointerEvent::Move(pt(210.0, 150.0)));
        let up = s.handle_pointer(PointerEvent::Up(pt(220.0, 160.0)));
        assert_eq!(up, Some(SurfaceEvent::ShapesModified));
        assert_eq!(s.shapes()[0].center(), pt(220.0, 160.0));
    }

    #[test]
    fn test_select_mode_reports_moves() {
        let mut s = surface();
        s.set_tool(Tool::Rectangle);
        click(&mut s, pt(200.0, 150.0));
        s.set_tool(Tool::Select);
        assert!(s.is_listening());

        s.handle_pointer(PointerEvent::Down(pt(200.0, 150.0)));
        s.handle_pointer(PointerEvent::Move(pt(250.0, 150.0)));
        let event = s.handle_pointer(PointerEvent::Up(pt(250.0, 150.0)));
        assert_eq!(event, Some(SurfaceEvent::ShapesModified));
        assert_eq!(s.shapes()[0].center(), pt(250.0, 150.0));

        // Clicking without dragging is not a modification
        assert_eq!(click(&mut s, pt(250.0, 150.0)), None);
        // Clicking empty space clears the selection
        click(&mut s, pt(5.0, 5.0));
        assert_eq!(s.selected(), None);
    }

    #[test]
    fn test_resize_and_remove_selected() {
        let mut s = surface();
        s.set_tool(Tool::Circle);
        click(&mut s, pt(100.0, 100.0));
        s.set_tool(Tool::Select);
        click(&mut s, pt(100.0, 100.0));
        assert_eq!(s.resize_selected(2.0, 2.0), Some(SurfaceEvent::ShapesModified));
        assert_eq!(s.shapes()[0].effective_radius(), Some(120.0));
        assert_eq!(s.resize_selected(0.0, 1.0), None);

        assert_eq!(s.remove_selected(), Some(SurfaceEvent::ShapesModified));
        assert!(s.shapes().is_empty());
        assert_eq!(s.remove_selected(), None);
    }

    #[test]
    fn test_placed_shape_can_be_edited_without_select_mode() {
        let mut s = surface();
        s.set_tool(Tool::Circle);
        click(&mut s, pt(100.0, 100.0));
        assert!(!s.is_listening());
        assert_eq!(s.resize_selected(2.0, 2.0), Some(SurfaceEvent::ShapesModified));
        assert_eq!(s.shapes()[0].effective_radius(), Some(120.0));

        s.set_tool(Tool::Rectangle);
        click(&mut s, pt(300.0, 300.0));
        assert_eq!(s.remove_selected(), Some(SurfaceEvent::ShapesModified));
        assert_eq!(s.shapes().len(), 1);
    }

    #[test]
    fn test_brush_strokes_are_overlays() {
        let mut s = surface();
        s.set_tool(Tool::Freehand);
        s.handle_pointer(PointerEvent::Down(pt(10.0, 10.0)));
        s.handle_pointer(PointerEvent::Move(pt(20.0, 15.0)));
        assert_eq!(s.active_stroke().map(|(p, _)| p.len()), Some(2));
        let event = s.handle_pointer(PointerEvent::Up(pt(30.0, 20.0)));
        assert!(matches!(event, Some(SurfaceEvent::StrokeFinished(_))));
        assert!(!event.unwrap().affects_mask());

        s.set_tool(Tool::Eraser);
        click(&mut s, pt(50.0, 50.0));
        assert_eq!(s.shapes().len(), 2);
        assert!(s.shapes().iter().all(|sh| sh.role == Role::Overlay));
        assert!(matches!(s.shapes()[1].geometry, Geometry::Stroke { erase: true, .. }));
        assert_eq!(s.mask_shapes().count(), 0);
    }

    #[test]
    fn test_restore_keeps_ids_unique() {
        let mut s = surface();
        s.set_tool(Tool::Rectangle);
        click(&mut s, pt(100.0, 100.0));
        let snapshot = s.snapshot();
        s.clear();
        s.restore_shapes(snapshot);
        click(&mut s, pt(300.0, 300.0));
        assert_ne!(s.shapes()[0].id, s.shapes()[1].id);
    }
}
