//! Vector glyph outlines: serialization, trimming and SVG import

pub mod glyph_path;
pub mod sanitize;

pub use glyph_path::{format_number, GlyphPath, PAINT, SVG_NAMESPACE};
pub use sanitize::{import_svg, sanitize_svg};
