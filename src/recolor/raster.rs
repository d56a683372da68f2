//! Rasterize a compound path into an 8-bit alpha mask
//!
//! Each sub-path is filled separately at full opacity with anti-aliasing, so
//! overlapping shapes union instead of cancelling by winding direction.
//! Partial coverage at the edges produces fractional alpha, which the
//! recolor engine uses as a soft blend weight.

use std::f32::consts::{FRAC_PI_2, PI};

use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};
use tracing::warn;

use crate::scene::path::{CompoundPath, PathCommand};

/// Per-pixel coverage, row-major, same size as the photo
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl AlphaMask {
    /// A mask with every pixel at the same coverage
    pub fn filled(width: u32, height: u32, alpha: u8) -> Self {
        Self {
            width,
            height,
            data: vec![alpha; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let w = self.width as usize;
        let start = y as usize * w;
        &self.data[start..start + w]
    }

    /// Number of pixels with any coverage
    pub fn covered(&self) -> usize {
        self.data.iter().filter(|&&a| a > 0).count()
    }
}

/// Fill `path` into a `width` x `height` alpha mask
///
/// Returns `None` for zero-sized targets.
pub fn rasterize(path: &CompoundPath, width: u32, height: u32) -> Option<AlphaMask> {
    let mut pixmap = Pixmap::new(width, height)?;

    let mut paint = Paint::default();
    paint.set_color_rgba8(255, 255, 255, 255);
    paint.anti_alias = true;

    for subpath in path.subpaths() {
        match build_subpath(subpath) {
            Some(p) => pixmap.fill_path(&p, &paint, FillRule::Winding, Transform::identity(), None),
            None => warn!("skipping degenerate mask sub-path"),
        }
    }

    // Pixmap data is premultiplied RGBA; alpha is coverage
    let data = pixmap.data().chunks_exact(4).map(|px| px[3]).collect();
    Some(AlphaMask { width, height, data })
}

fn build_subpath(commands: &[PathCommand]) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    let mut current = (0.0f32, 0.0f32);

    for command in commands {
        match *command {
            PathCommand::MoveTo { x, y } => {
                builder.move_to(x, y);
                current = (x, y);
            }
            PathCommand::LineTo { x, y } => {
                builder.line_to(x, y);
                current = (x, y);
            }
            PathCommand::Arc { radius, large_arc, sweep, x, y } => {
                arc_to(&mut builder, current, (x, y), radius, large_arc, sweep);
                current = (x, y);
            }
            PathCommand::Close => builder.close(),
        }
    }

    builder.finish()
}

/// Append a circular SVG-style arc as cubic Béziers
///
/// Endpoint-to-center conversion for `rx == ry` with no rotation; the
/// radius is grown when it cannot span the endpoints.
fn arc_to(builder: &mut PathBuilder, from: (f32, f32), to: (f32, f32), radius: f32, large_arc: bool, sweep: bool) {
    let (x0, y0) = from;
    let (x1, y1) = to;

    if radius <= 0.0 || (x0 == x1 && y0 == y1) {
        builder.line_to(x1, y1);
        return;
    }

    let hx = (x0 - x1) / 2.0;
    let hy = (y0 - y1) / 2.0;
    let half_sq = hx * hx + hy * hy;
    let r = radius.max(half_sq.sqrt());
    let r_sq = r * r;

    let sign = if large_arc == sweep { -1.0 } else { 1.0 };
    let coef = sign * ((r_sq - half_sq) / half_sq).max(0.0).sqrt();
    let cx = coef * hy + (x0 + x1) / 2.0;
    let cy = -coef * hx + (y0 + y1) / 2.0;

    let start = (y0 - cy).atan2(x0 - cx);
    let end = (y1 - cy).atan2(x1 - cx);
    let mut delta = end - start;
    if sweep && delta < 0.0 {
        delta += 2.0 * PI;
    } else if !sweep && delta > 0.0 {
        delta -= 2.0 * PI;
    }

    let segments = (delta.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
    let step = delta / segments as f32;
    let k = 4.0 / 3.0 * (step / 4.0).tan();

    let mut angle = start;
    for i in 0..segments {
        let next = angle + step;
        let (sin_a, cos_a) = angle.sin_cos();
        let (sin_b, cos_b) = next.sin_cos();

        let p0 = (cx + r * cos_a, cy + r * sin_a);
        // Land exactly on the requested endpoint
        let p3 = if i + 1 == segments { (x1, y1) } else { (cx + r * cos_b, cy + r * sin_b) };
        let c1 = (p0.0 - k * r * sin_a, p0.1 + k * r * cos_a);
        let c2 = (p3.0 + k * r * sin_b, p3.1 - k * r * cos_b);

        builder.cubic_to(c1.0, c1.1, c2.0, c2.1, p3.0, p3.1);
        angle = next;
    }
}
