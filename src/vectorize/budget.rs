//! Size budgeting: simplify harder, then downscale, then trim
//!
//! Each round simplifies every traced contour at the current ε and
//! measures the serialized SVG. Rounds escalate ε geometrically; once
//! `downscale_round` rounds have failed the working image is also shrunk
//! and re-traced. When the rounds run out, leading subpaths are dropped
//! as a last resort.

use super::{Deadline, VectorizeOutcome};
use crate::core::errors::{GlyphError, GlyphResult};
use crate::core::settings::{DEFAULT_BUDGET_BYTES, DEFAULT_INITIAL_EPSILON, DEFAULT_MAX_WORKING_SIDE};
use crate::outline::{simplify, trace_contours_with_deadline, Contour};
use crate::path::GlyphPath;
use crate::raster::{binarize, PixelGrid, Threshold};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Tunables for the budget loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetSettings {
    /// Upper bound on the serialized SVG, in bytes
    pub max_bytes: usize,
    pub initial_epsilon: f64,
    /// ε multiplier applied after every failed round
    pub growth: f64,
    pub max_rounds: u32,
    /// Number of failed rounds after which the image is downscaled
    pub downscale_round: u32,
    pub downscale_factor: f64,
    pub min_downscale_side: u32,
    pub trim_divisor: usize,
    /// Inputs larger than this on either side are shrunk before tracing
    pub max_working_side: u32,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_BUDGET_BYTES,
            initial_epsilon: DEFAULT_INITIAL_EPSILON,
            growth: 1.8,
            max_rounds: 5,
            downscale_round: 3,
            downscale_factor: 0.75,
            min_downscale_side: 16,
            trim_divisor: 3,
            max_working_side: DEFAULT_MAX_WORKING_SIDE,
        }
    }
}

/// A way in which the returned glyph falls short of a faithful trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// Nothing traceable; a placeholder square was substituted
    NoUsableContours,
    /// Leading subpaths were dropped to approach the budget
    Trimmed { removed: usize },
    /// Still over budget after trimming
    OutputTooLarge { size: usize, budget: usize },
}

impl Degradation {
    /// The error kind this degradation stands in for, if any
    pub fn as_error(&self) -> Option<GlyphError> {
        match *self {
            Degradation::NoUsableContours => Some(GlyphError::NoUsableContours),
            Degradation::OutputTooLarge { size, budget } => {
                Some(GlyphError::OutputTooLarge { size, budget })
            }
            Degradation::Trimmed { .. } => None,
        }
    }
}

/// How the budget loop arrived at its result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetReport {
    pub rounds: u32,
    /// ε used for the returned path
    pub epsilon: f64,
    pub downscaled: bool,
    pub working_width: u32,
    pub working_height: u32,
    pub contour_count: usize,
    pub serialized_len: usize,
    pub budget: usize,
}

/// Working raster plus its traced contours
struct Traced {
    grid: PixelGrid,
    contours: Vec<Contour>,
}

impl Traced {
    fn new(grid: PixelGrid, threshold: Threshold, deadline: &Deadline) -> GlyphResult<Self> {
        let mask = binarize(&grid, threshold);
        let contours = trace_contours_with_deadline(&mask, deadline)?;
        Ok(Self { grid, contours })
    }

    fn path_at(&self, epsilon: f64) -> GlyphPath {
        let simplified: Vec<Contour> = self
            .contours
            .iter()
            .map(|c| simplify(c, epsilon))
            .collect();
        GlyphPath::from_contours(&simplified, self.grid.width(), self.grid.height())
    }
}

/// Vectorize `grid` within `settings.max_bytes`.
///
/// Only [`GlyphError::ConversionTimeout`] (and nothing else) is returned as
/// an error; shortfalls are reported as [`Degradation`]s.
pub fn vectorize_within_budget(
    grid: &PixelGrid,
    threshold: Threshold,
    settings: &BudgetSettings,
    deadline: &Deadline,
) -> GlyphResult<VectorizeOutcome> {
    deadline.check()?;
    let working = grid.fit_within(settings.max_working_side);
    let mut traced = Traced::new(working, threshold, deadline)?;
    let mut epsilon = settings.initial_epsilon;
    let mut downscaled = false;
    let mut round = 1;

    let report = |traced: &Traced, round: u32, epsilon: f64, downscaled: bool, len: usize| {
        BudgetReport {
            rounds: round,
            epsilon,
            downscaled,
            working_width: traced.grid.width(),
            working_height: traced.grid.height(),
            contour_count: traced.contours.len(),
            serialized_len: len,
            budget: settings.max_bytes,
        }
    };

    loop {
        deadline.check()?;

        if traced.contours.is_empty() {
            let path = GlyphPath::placeholder(traced.grid.width(), traced.grid.height());
            let len = path.serialized_len();
            warn!("No usable contours, substituting placeholder glyph");
            return Ok(VectorizeOutcome {
                path,
                degradations: vec![Degradation::NoUsableContours],
                report: report(&traced, round, epsilon, downscaled, len),
            });
        }

        let path = traced.path_at(epsilon);
        let len = path.serialized_len();
        debug!(
            "Budget round {}: epsilon {:.2}, {} contours, {} of {} bytes",
            round,
            epsilon,
            traced.contours.len(),
            len,
            settings.max_bytes
        );

        if len <= settings.max_bytes {
            return Ok(VectorizeOutcome {
                path,
                degradations: Vec::new(),
                report: report(&traced, round, epsilon, downscaled, len),
            });
        }

        if round >= settings.max_rounds {
            let (trimmed, removed) = path.trim(settings.trim_divisor);
            let size = trimmed.serialized_len();
            let mut degradations = Vec::new();
            if removed > 0 {
                degradations.push(Degradation::Trimmed { removed });
            }
            if size > settings.max_bytes {
                degradations.push(Degradation::OutputTooLarge {
                    size,
                    budget: settings.max_bytes,
                });
            }
            warn!(
                "Budget exhausted after {} rounds, trimmed {} subpaths to {} bytes",
                round, removed, size
            );
            return Ok(VectorizeOutcome {
                path: trimmed,
                degradations,
                report: report(&traced, round, epsilon, downscaled, size),
            });
        }

        // `round` failed rounds so far
        if round == settings.downscale_round {
            let smaller = traced
                .grid
                .downscale(settings.downscale_factor, settings.min_downscale_side);
            if (smaller.width(), smaller.height()) != (traced.grid.width(), traced.grid.height()) {
                debug!(
                    "Downscaling working image to {}x{}",
                    smaller.width(),
                    smaller.height()
                );
                traced = Traced::new(smaller, threshold, deadline)?;
                downscaled = true;
            }
        }
        epsilon *= settings.growth;
        round += 1;
    }
}
