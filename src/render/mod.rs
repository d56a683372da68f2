//! Compositing helpers
//!
//! - `fit.rs` - scale/offset placing a photo inside the drawing surface

pub mod fit;

pub use fit::{FitAxis, FitTransform};
