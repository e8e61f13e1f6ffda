//! Font sources: code points, metrics and compiled fonts
//!
//! Glyph outlines come in from [`crate::vectorize`] or
//! [`crate::path::import_svg`]; this module gives them code points,
//! places them in the em and writes the font binary.

pub mod assembler;
pub mod codepoint;
pub mod library;
pub mod metrics;
pub mod sfnt;

pub use assembler::{FontArtifact, FontAssembler, Glyph, NOTDEF_NAME};
pub use codepoint::{Codepoint, CodepointAllocator, UsedCodepoints, PUA_END, PUA_START};
pub use library::{FontId, FontLibrary};
pub use metrics::FontMetrics;
