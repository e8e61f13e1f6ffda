//! Error types for the vectorization and font assembly pipeline
//!
//! Library code returns [`GlyphResult`]; the binary wraps these in
//! `anyhow` at the command boundary.

use crate::font_source::Codepoint;
use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong between raw pixels and a compiled font.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GlyphError {
    /// The pixel grid could not be constructed.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Vectorization ran past its allotted time.
    #[error("conversion timed out after {0:?}")]
    ConversionTimeout(Duration),

    /// The mask held no traceable boundary. Recovered with a placeholder
    /// shape; only surfaced through [`crate::vectorize::Degradation`].
    #[error("image produced no usable contours")]
    NoUsableContours,

    /// The budget was still exceeded after the last-resort trim. The
    /// trimmed glyph is still returned.
    #[error("serialized glyph is {size} bytes, over the {budget} byte budget")]
    OutputTooLarge { size: usize, budget: usize },

    /// Vector input still referenced raster or foreign content after cleaning.
    #[error("vector input contains embedded raster content: {0}")]
    EmbeddedRasterRejected(String),

    #[error("code point {0} is already used in this font")]
    DuplicateCodepoint(Codepoint),

    #[error("no available private-use code points remain")]
    CodepointRangeExhausted,

    #[error("invalid code point '{0}'")]
    InvalidCodepoint(String),

    #[error("invalid vector input: {0}")]
    InvalidVector(String),

    #[error("{0} glyphs do not fit in a TrueType font")]
    TooManyGlyphs(usize),

    /// A single outline exceeds the 16-bit point or contour counts of `glyf`.
    #[error("glyph outline with {points} points in {contours} contours does not fit in a TrueType font")]
    OutlineTooComplex { points: usize, contours: usize },

    #[error("unknown font '{0}'")]
    UnknownFont(String),

    #[error("no glyph is mapped to code point {0}")]
    UnknownGlyph(Codepoint),
}

impl GlyphError {
    /// Whether the error aborts the current operation.
    ///
    /// `NoUsableContours` and `OutputTooLarge` are recovered locally by
    /// substituting a degraded glyph, everything else reaches the caller.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            GlyphError::NoUsableContours | GlyphError::OutputTooLarge { .. }
        )
    }
}

pub type GlyphResult<T> = Result<T, GlyphError>;
