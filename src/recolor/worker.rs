//! Background recolor jobs
//!
//! The pixel loop is CPU-bound, so it runs on the blocking pool and the UI
//! receives a [`RecolorOutcome`] carrying the request token. The edit session
//! decides whether the outcome is still current.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;
use tokio::task;
use tracing::{error, info};

use crate::color::Rgb;
use crate::scene::path::CompoundPath;
use crate::state::edit::RecolorParams;

/// Everything one recolor needs, detached from the editor
#[derive(Debug, Clone)]
pub struct RecolorJob {
    /// Monotonic request token issued by the edit session
    pub token: u64,
    pub original: Arc<RgbaImage>,
    pub mask: CompoundPath,
    /// Catalog key of the chosen finish
    pub color_key: String,
    pub color: Rgb,
    pub params: RecolorParams,
}

/// Result of a job, successful or not
#[derive(Debug, Clone)]
pub struct RecolorOutcome {
    pub token: u64,
    pub color_key: String,
    pub color: Rgb,
    /// `None` when the mask rasterized to nothing or the task failed
    pub image: Option<Arc<RgbaImage>>,
    pub elapsed: Duration,
}

/// Run `job` on the blocking pool
pub async fn run(job: RecolorJob) -> RecolorOutcome {
    let token = job.token;
    let color_key = job.color_key.clone();
    let color = job.color;

    match task::spawn_blocking(move || run_blocking(job)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(token, error = %e, "recolor task failed");
            RecolorOutcome {
                token,
                color_key,
                color,
                image: None,
                elapsed: Duration::ZERO,
            }
        }
    }
}

/// Same as [`run`] on the calling thread
pub fn run_blocking(job: RecolorJob) -> RecolorOutcome {
    let started = Instant::now();
    let image = super::engine::recolor(Some(&job.original), Some(&job.mask), job.color, &job.params).map(Arc::new);
    let elapsed = started.elapsed();

    info!(
        token = job.token,
        color = %job.color_key,
        ms = elapsed.as_millis() as u64,
        applied = image.is_some(),
        "recolor finished"
    );

    RecolorOutcome {
        token: job.token,
        color_key: job.color_key,
        color: job.color,
        image,
        elapsed,
    }
}
