//! Binarization: pixel grid → foreground/background mask
//!
//! Dark, opaque pixels become foreground. Transparent pixels (alpha below
//! 50 %) are always background regardless of colour.

use super::pixel_grid::{PixelGrid, OPAQUE_ALPHA};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the luminance cut-off is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Threshold {
    /// Otsu's method over the opaque pixels
    #[default]
    Auto,
    /// Pixels darker than this value are foreground
    Fixed(u8),
}

impl Threshold {
    /// Parse `auto` or a number in `0..=255`
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("auto") {
            return Some(Threshold::Auto);
        }
        value.parse::<u8>().ok().map(Threshold::Fixed)
    }
}

/// Row-major foreground mask with the same dimensions as its source grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl BinaryMask {
    /// Parse an ASCII picture where `#` marks foreground
    pub fn from_ascii(rows: &[&str]) -> Self {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut bits = vec![false; width as usize * height as usize];
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                bits[y * width as usize + x] = ch == '#';
            }
        }
        Self {
            width,
            height,
            bits,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Foreground test; anything outside the grid is background
    pub fn is_foreground(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        self.bits[y as usize * self.width as usize + x as usize]
    }

    pub fn foreground_count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }
}

/// Rec. 601 luma of an RGB sample
pub fn luminance([r, g, b, _]: [u8; 4]) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}

/// Luminance histogram over opaque pixels only
pub fn opaque_histogram(grid: &PixelGrid) -> [u32; 256] {
    let mut histogram = [0u32; 256];
    for px in grid.pixels().filter(|px| px[3] >= OPAQUE_ALPHA) {
        histogram[luminance(px) as usize] += 1;
    }
    histogram
}

/// Otsu's threshold: the level `t` that maximises between-class variance
/// when splitting the histogram into `[0, t]` and `(t, 255]`.
///
/// Returns `None` when no level separates two non-empty classes, i.e. the
/// histogram is empty or holds a single luminance.
pub fn otsu_threshold(histogram: &[u32; 256]) -> Option<u8> {
    let total: f64 = histogram.iter().map(|&c| c as f64).sum();
    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &c)| level as f64 * c as f64)
        .sum();

    let mut weight_bg = 0.0;
    let mut sum_bg = 0.0;
    let mut best: Option<u8> = None;
    let mut best_variance = 0.0;

    for (level, &count) in histogram.iter().enumerate() {
        weight_bg += count as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0.0 {
            break;
        }
        sum_bg += level as f64 * count as f64;

        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (weighted_total - sum_bg) / weight_fg;
        let variance = weight_bg * weight_fg * (mean_bg - mean_fg).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best = Some(level as u8);
        }
    }

    best
}

/// Cut-off used when the opaque pixels share one luminance but sit on a
/// transparent background: only dark ink counts
const FALLBACK_CUTOFF: u16 = 128;

fn has_transparency(grid: &PixelGrid) -> bool {
    grid.pixels().any(|px| px[3] < OPAQUE_ALPHA)
}

/// Classify every pixel of `grid` as foreground or background
pub fn binarize(grid: &PixelGrid, threshold: Threshold) -> BinaryMask {
    // Foreground is luma strictly below the cut-off
    let cutoff: Option<u16> = match threshold {
        Threshold::Fixed(t) => Some(t as u16),
        Threshold::Auto => otsu_threshold(&opaque_histogram(grid))
            .map(|t| t as u16 + 1)
            .or_else(|| has_transparency(grid).then_some(FALLBACK_CUTOFF)),
    };

    let bits: Vec<bool> = match cutoff {
        Some(cutoff) => grid
            .pixels()
            .map(|px| px[3] >= OPAQUE_ALPHA && (luminance(px) as u16) < cutoff)
            .collect(),
        None => vec![false; grid.width() as usize * grid.height() as usize],
    };

    debug!(
        "Binarized {}x{} grid with {:?} (cut-off {:?})",
        grid.width(),
        grid.height(),
        threshold,
        cutoff
    );

    BinaryMask {
        width: grid.width(),
        height: grid.height(),
        bits,
    }
}
