//! Recoloring: mask rasterization, the pixel engine and background offload

pub mod engine;
pub mod raster;
pub mod worker;

pub use engine::recolor;
pub use raster::AlphaMask;
pub use worker::{RecolorJob, RecolorOutcome};
