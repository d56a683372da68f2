use cgmath::Point2;
use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Frame, Path, Program, Stroke};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use roof_recolor::scene::shape::{Geometry, Role, Shape};
use roof_recolor::scene::surface::{PointerEvent, SceneSurface};

use crate::Message;

/// Drawing surface background, also the eraser paint
pub const SURFACE_BACKGROUND: Color = Color::from_rgb(0.12, 0.12, 0.13);

const MASK_FILL: Color = Color::from_rgba(0.25, 0.6, 1.0, 0.22);
const MASK_EDGE: Color = Color::from_rgb(0.25, 0.6, 1.0);
const SELECTED_EDGE: Color = Color::from_rgb(1.0, 0.8, 0.2);
const VERTEX: Color = Color::from_rgb(1.0, 0.35, 0.35);
const BRUSH: Color = Color::from_rgba(1.0, 1.0, 1.0, 0.6);

/// Vector overlay drawn on top of the photo
///
/// Draws every shape on the surface and turns left-button input into
/// [`PointerEvent`]s in surface coordinates.
pub struct SceneCanvas<'a> {
    pub surface: &'a SceneSurface,
}

impl Program<Message> for SceneCanvas<'_> {
    type State = DragState;

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        // Local coordinates even when a drag leaves the canvas
        let local = cursor
            .position()
            .map(|p| Point2::new(p.x - bounds.x, p.y - bounds.y));

        match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let (Some(p), true) = (local, cursor.is_over(bounds)) {
                    state.is_dragging = true;
                    return (canvas::event::Status::Captured, Some(Message::Pointer(PointerEvent::Down(p))));
                }
            }
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) if state.is_dragging => {
                if let Some(p) = local {
                    return (canvas::event::Status::Captured, Some(Message::Pointer(PointerEvent::Move(p))));
                }
            }
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) if state.is_dragging => {
                state.is_dragging = false;
                if let Some(p) = local {
                    return (canvas::event::Status::Captured, Some(Message::Pointer(PointerEvent::Up(p))));
                }
            }
            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let selected = self.surface.selected();

        for shape in self.surface.shapes() {
            draw_shape(&mut frame, shape, selected == Some(shape.id));
        }

        // In-progress polygon outline
        let pending = self.surface.pending_vertices();
        if pending.len() >= 2 {
            let outline = Path::new(|b| {
                b.move_to(point(pending[0]));
                for p in &pending[1..] {
                    b.line_to(point(*p));
                }
            });
            frame.stroke(&outline, Stroke::default().with_color(VERTEX).with_width(1.5));
        }

        if let Some((points, erase)) = self.surface.active_stroke() {
            let color = if erase { SURFACE_BACKGROUND } else { BRUSH };
            stroke_polyline(&mut frame, points, self.surface.settings().brush_width, color);
        }

        vec![frame.into_geometry()]
    }
}

fn draw_shape(frame: &mut Frame, shape: &Shape, selected: bool) {
    let edge = Stroke::default()
        .with_color(if selected { SELECTED_EDGE } else { MASK_EDGE })
        .with_width(if selected { 2.5 } else { 1.5 });

    match &shape.geometry {
        Geometry::Polygon { .. } => {
            let points = shape.absolute_points();
            let Some((first, rest)) = points.split_first() else {
                return;
            };
            let path = Path::new(|b| {
                b.move_to(point(*first));
                for p in rest {
                    b.line_to(point(*p));
                }
                b.close();
            });
            frame.fill(&path, MASK_FILL);
            frame.stroke(&path, edge);
        }
        Geometry::Rectangle { .. } => {
            let (min, max) = shape.bounds();
            let path = Path::rectangle(point(min), Size::new(max.x - min.x, max.y - min.y));
            frame.fill(&path, MASK_FILL);
            frame.stroke(&path, edge);
        }
        Geometry::Circle { .. } => {
            let radius = shape.effective_radius().unwrap_or(0.0);
            let path = Path::circle(point(shape.center()), radius);
            frame.fill(&path, MASK_FILL);
            frame.stroke(&path, edge);
        }
        Geometry::VertexMarker { radius } => {
            frame.fill(&Path::circle(point(shape.origin), *radius), VERTEX);
        }
        Geometry::Stroke { width, erase, .. } => {
            let color = if *erase { SURFACE_BACKGROUND } else { BRUSH };
            stroke_polyline(frame, &shape.absolute_points(), *width, color);
        }
    }

    if selected && shape.role == Role::Overlay {
        let (min, max) = shape.bounds();
        let outline = Path::rectangle(point(min), Size::new(max.x - min.x, max.y - min.y));
        frame.stroke(&outline, Stroke::default().with_color(SELECTED_EDGE).with_width(1.0));
    }
}

fn stroke_polyline(frame: &mut Frame, points: &[Point2<f32>], width: f32, color: Color) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    if rest.is_empty() {
        frame.fill(&Path::circle(point(*first), width / 2.0), color);
        return;
    }
    let path = Path::new(|b| {
        b.move_to(point(*first));
        for p in rest {
            b.line_to(point(*p));
        }
    });
    frame.stroke(
        &path,
        Stroke::default()
            .with_color(color)
            .with_width(width)
            .with_line_cap(canvas::LineCap::Round)
            .with_line_join(canvas::LineJoin::Round),
    );
}

fn point(p: Point2<f32>) -> Point {
    Point::new(p.x, p.y)
}

/// State for drag interactions
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pub is_dragging: bool,
}
