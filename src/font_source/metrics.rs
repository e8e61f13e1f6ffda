//! Vertical metrics and advance width shared by every glyph in a font

use crate::core::settings::{
    DEFAULT_ADVANCE_WIDTH, DEFAULT_ASCENDER, DEFAULT_DESCENDER, DEFAULT_UNITS_PER_EM,
};
use serde::{Deserialize, Serialize};

/// Font-wide metrics, in font units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontMetrics {
    pub units_per_em: u16,
    pub ascender: i16,
    /// Negative: distance below the baseline
    pub descender: i16,
    /// Every glyph gets this advance; glyphs are monospaced
    pub advance_width: u16,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            units_per_em: DEFAULT_UNITS_PER_EM,
            ascender: DEFAULT_ASCENDER,
            descender: DEFAULT_DESCENDER,
            advance_width: DEFAULT_ADVANCE_WIDTH,
        }
    }
}

impl FontMetrics {
    pub fn with_advance_width(mut self, advance_width: u16) -> Self {
        self.advance_width = advance_width;
        self
    }

    /// Ascender to descender, the band outlines are scaled into
    pub fn line_height(&self) -> f64 {
        (self.ascender as i32 - self.descender as i32) as f64
    }

    /// Convert to norad FontInfo
    pub fn to_norad_font_info(&self, family_name: &str, style_name: &str) -> norad::FontInfo {
        let mut info = norad::FontInfo::default();

        if !family_name.is_empty() {
            info.family_name = Some(family_name.to_string());
        }
        if !style_name.is_empty() {
            info.style_name = Some(style_name.to_string());
        }

        if let Some(units_per_em) =
            norad::fontinfo::NonNegativeIntegerOrFloat::new(self.units_per_em as f64)
        {
            info.units_per_em = Some(units_per_em);
        }
        info.ascender = Some(self.ascender as f64);
        info.descender = Some(self.descender as f64);
        info
    }
}
