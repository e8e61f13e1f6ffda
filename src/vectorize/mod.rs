//! Raster-to-vector pipeline entry points
//!
//! [`vectorize`] runs the whole pipeline on the calling thread under a
//! cooperative deadline. [`vectorize_with_timeout`] is the async form: the
//! work moves to tokio's blocking pool and is abandoned (with its cancel
//! flag raised) when the timeout fires first.

pub mod budget;
pub mod deadline;

pub use budget::{vectorize_within_budget, BudgetReport, BudgetSettings, Degradation};
pub use deadline::Deadline;

use crate::core::errors::{GlyphError, GlyphResult};
use crate::core::settings::DEFAULT_CONVERSION_TIMEOUT;
use crate::path::GlyphPath;
use crate::raster::{PixelGrid, Threshold};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizeOptions {
    pub threshold: Threshold,
    pub budget: BudgetSettings,
    pub timeout: Duration,
}

impl Default for VectorizeOptions {
    fn default() -> Self {
        Self {
            threshold: Threshold::Auto,
            budget: BudgetSettings::default(),
            timeout: DEFAULT_CONVERSION_TIMEOUT,
        }
    }
}

/// A finished glyph outline and how it was obtained
#[derive(Debug, Clone)]
pub struct VectorizeOutcome {
    pub path: GlyphPath,
    /// Empty for a faithful trace within budget
    pub degradations: Vec<Degradation>,
    pub report: BudgetReport,
}

impl VectorizeOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }

    pub fn to_svg(&self) -> String {
        self.path.to_svg()
    }
}

/// Vectorize `grid` on the current thread, giving up after `options.timeout`
pub fn vectorize(grid: &PixelGrid, options: &VectorizeOptions) -> GlyphResult<VectorizeOutcome> {
    let deadline = Deadline::after(options.timeout);
    let outcome = vectorize_within_budget(grid, options.threshold, &options.budget, &deadline)?;
    log_outcome(grid, &outcome);
    Ok(outcome)
}

/// Vectorize on the blocking pool, racing the work against `options.timeout`
pub async fn vectorize_with_timeout(
    grid: PixelGrid,
    options: VectorizeOptions,
) -> GlyphResult<VectorizeOutcome> {
    let limit = options.timeout;
    let cancel = Arc::new(AtomicBool::new(false));
    let deadline = Deadline::after(limit).with_cancel_flag(cancel.clone());

    let task = tokio::task::spawn_blocking(move || -> GlyphResult<VectorizeOutcome> {
        let outcome =
            vectorize_within_budget(&grid, options.threshold, &options.budget, &deadline)?;
        log_outcome(&grid, &outcome);
        Ok(outcome)
    });

    match tokio::time::timeout(limit, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) if join_error.is_panic() => {
            std::panic::resume_unwind(join_error.into_panic())
        }
        Ok(Err(_)) => Err(GlyphError::ConversionTimeout(limit)),
        Err(_) => {
            cancel.store(true, Ordering::Relaxed);
            warn!("Conversion timed out after {:?}", limit);
            Err(GlyphError::ConversionTimeout(limit))
        }
    }
}

fn log_outcome(grid: &PixelGrid, outcome: &VectorizeOutcome) {
    info!(
        "Vectorized {}x{} image: {} subpaths, {} bytes in {} rounds",
        grid.width(),
        grid.height(),
        outcome.path.subpaths().len(),
        outcome.report.serialized_len,
        outcome.report.rounds
    );
    for degradation in &outcome.degradations {
        warn!("Degraded glyph: {:?}", degradation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_grid() -> PixelGrid {
        let mut data = Vec::new();
        for y in 0..12u32 {
            for x in 0..12u32 {
                let ink = (3..9).contains(&x) && (3..9).contains(&y);
                let rgba: [u8; 4] = if ink { [0, 0, 0, 255] } else { [255; 4] };
                data.extend_from_slice(&rgba);
            }
        }
        PixelGrid::from_rgba(12, 12, data).unwrap()
    }

    #[test]
    fn test_vectorize_block() {
        let outcome = vectorize(&block_grid(), &VectorizeOptions::default()).unwrap();
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.path.subpaths().len(), 1);
        assert!(outcome.to_svg().contains("currentColor"));
    }

    #[test]
    fn test_zero_timeout_sync() {
        let options = VectorizeOptions {
            timeout: Duration::ZERO,
            ..VectorizeOptions::default()
        };
        assert_eq!(
            vectorize(&block_grid(), &options).unwrap_err(),
            GlyphError::ConversionTimeout(Duration::ZERO)
        );
    }

    #[tokio::test]
    async fn test_async_matches_sync() {
        let options = VectorizeOptions::default();
        let sync = vectorize(&block_grid(), &options).unwrap();
        let threaded = vectorize_with_timeout(block_grid(), options).await.unwrap();
        assert_eq!(sync.path, threaded.path);
        assert_eq!(sync.report, threaded.report);
    }

    #[tokio::test]
    async fn test_async_zero_timeout() {
        let options = VectorizeOptions {
            timeout: Duration::ZERO,
            ..VectorizeOptions::default()
        };
        let result = vectorize_with_timeout(block_grid(), options).await;
        assert_eq!(
            result.unwrap_err(),
            GlyphError::ConversionTimeout(Duration::ZERO)
        );
    }
}
