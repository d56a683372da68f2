//! Roof recoloring editor
//!
//! Outline a roof on a photo with vector shapes, compile the shapes into a
//! mask in photo pixel space and repaint the masked region with a catalog
//! color. The original photo is kept for reset, and masks and chosen colors
//! are stored per project.

pub mod catalog;
pub mod color;
pub mod config;
pub mod error;
pub mod photo;
pub mod recolor;
pub mod render;
pub mod scene;
pub mod state;

pub use config::EditorConfig;
pub use error::{EditorError, StoreError};
pub use state::editor::Editor;
