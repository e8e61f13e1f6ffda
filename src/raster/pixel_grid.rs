//! Decoded RGBA pixel data
//!
//! The pipeline never decodes image files itself. Callers hand over
//! already-decoded samples and get an immutable [`PixelGrid`] back.

use crate::core::errors::{GlyphError, GlyphResult};

const CHANNELS: usize = 4;

/// Alpha at or above this is treated as opaque (50 %)
pub const OPAQUE_ALPHA: u8 = 128;

/// Width × height RGBA samples, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelGrid {
    /// Build a grid from raw RGBA bytes.
    ///
    /// Fails with [`GlyphError::InvalidImage`] for zero dimensions or a
    /// buffer that does not hold exactly `width * height` pixels.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> GlyphResult<Self> {
        if width == 0 || height == 0 {
            return Err(GlyphError::InvalidImage(format!(
                "image has zero size ({width}x{height})"
            )));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or_else(|| {
                GlyphError::InvalidImage(format!("image dimensions {width}x{height} overflow"))
            })?;
        if data.len() != expected {
            return Err(GlyphError::InvalidImage(format!(
                "expected {expected} RGBA bytes for {width}x{height}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A grid filled with one colour
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> GlyphResult<Self> {
        let count = width as usize * height as usize;
        Self::from_rgba(width, height, rgba.repeat(count))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA sample at `(x, y)`; caller guarantees bounds
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Iterate over all pixels in row-major order
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.data
            .chunks_exact(CHANNELS)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }

    /// Nearest-neighbour resample to an exact size
    pub fn resample(&self, new_width: u32, new_height: u32) -> PixelGrid {
        let new_width = new_width.max(1);
        let new_height = new_height.max(1);
        if new_width == self.width && new_height == self.height {
            return self.clone();
        }

        let mut data = Vec::with_capacity(new_width as usize * new_height as usize * CHANNELS);
        for y in 0..new_height {
            let sy = (y as u64 * self.height as u64 / new_height as u64) as u32;
            for x in 0..new_width {
                let sx = (x as u64 * self.width as u64 / new_width as u64) as u32;
                data.extend_from_slice(&self.pixel(sx, sy));
            }
        }

        PixelGrid {
            width: new_width,
            height: new_height,
            data,
        }
    }

    /// Shrink (keeping aspect ratio) so neither side exceeds `max_side`.
    /// Grids that already fit are returned unchanged.
    pub fn fit_within(&self, max_side: u32) -> PixelGrid {
        let max_side = max_side.max(1);
        if self.width <= max_side && self.height <= max_side {
            return self.clone();
        }
        let scale = f64::min(
            max_side as f64 / self.width as f64,
            max_side as f64 / self.height as f64,
        );
        let new_width = ((self.width as f64 * scale).floor() as u32).max(1);
        let new_height = ((self.height as f64 * scale).floor() as u32).max(1);
        self.resample(new_width, new_height)
    }

    /// Scale both sides by `factor`, never going below `min_side`
    /// (or growing past the current size).
    pub fn downscale(&self, factor: f64, min_side: u32) -> PixelGrid {
        let shrink = |side: u32| -> u32 {
            let scaled = (side as f64 * factor).floor() as u32;
            scaled.max(min_side).min(side)
        };
        self.resample(shrink(self.width), shrink(self.height))
    }
}
