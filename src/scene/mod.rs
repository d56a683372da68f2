//! Scene authoring: shapes, the interactive surface and the mask compiler

pub mod mask;
pub mod path;
pub mod shape;
pub mod surface;

pub use path::{CompoundPath, PathCommand};
pub use shape::{Role, Shape, ShapeId};
pub use surface::{GeometryError, PointerEvent, SceneSurface, SurfaceEvent, SurfaceSettings, Tool};
