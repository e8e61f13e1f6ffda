//! Raster input: decoded pixel grids and their binary masks

pub mod binarize;
pub mod pixel_grid;

pub use binarize::{binarize, otsu_threshold, BinaryMask, Threshold};
pub use pixel_grid::PixelGrid;
