/// User interface widgets
///
/// - canvas.rs: vector overlay for authoring shapes
/// - palette.rs: catalog color swatches

pub mod canvas;
pub mod palette;
