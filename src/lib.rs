//! glyphwright
pub mod core;
pub mod data;
pub mod font_source;
pub mod geometry;
pub mod logging;
pub mod outline;
pub mod path;
pub mod raster;
pub mod vectorize;
