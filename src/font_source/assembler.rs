//! Assembling traced or imported glyphs into a font
//!
//! The assembler is pure: given the complete glyph set of a font it
//! produces a [`FontArtifact`], which can then be serialized as TrueType
//! or exported as a UFO source. Keeping a font's glyph set consistent
//! while glyphs are being added is the caller's job; run the whole
//! "read used code points, pick a code point, persist the glyph,
//! reassemble" sequence under a per-font lock, as
//! [`crate::font_source::FontLibrary`] does.

use super::codepoint::Codepoint;
use super::metrics::FontMetrics;
use super::sfnt::{GlyphRecord, OutlinePoint, SimpleGlyph, TrueTypeWriter, MAX_GLYPHS};
use crate::core::errors::{GlyphError, GlyphResult};
use crate::core::settings::{DEFAULT_FAMILY_NAME, DEFAULT_STYLE_NAME};
use crate::geometry::{point_in_polygon, signed_area};
use crate::path::GlyphPath;
use chrono::{DateTime, Utc};
use kurbo::{Affine, CubicBez, PathEl, Point, Rect};
use std::collections::BTreeMap;
use tracing::info;

pub const NOTDEF_NAME: &str = ".notdef";

/// Cubic to quadratic conversion accuracy, in font units
const QUAD_ACCURACY: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub name: String,
    pub codepoint: Option<Codepoint>,
    pub path: GlyphPath,
    pub advance_width: u16,
}

impl Glyph {
    /// The empty glyph shown for unmapped characters
    pub fn notdef(advance_width: u16) -> Self {
        Self {
            name: NOTDEF_NAME.to_string(),
            codepoint: None,
            path: GlyphPath::new(Vec::new(), Rect::ZERO),
            advance_width,
        }
    }

    /// `uniXXXX` inside the BMP, `uXXXXX` beyond it
    pub fn name_for(codepoint: Codepoint) -> String {
        if codepoint.is_bmp() {
            format!("uni{:04X}", codepoint.value())
        } else {
            format!("u{:05X}", codepoint.value())
        }
    }
}

/// A complete, ordered glyph set: `.notdef` first, then ascending code point
#[derive(Debug, Clone, PartialEq)]
pub struct FontArtifact {
    pub family_name: String,
    pub style_name: String,
    pub metrics: FontMetrics,
    pub glyphs: Vec<Glyph>,
    pub created: DateTime<Utc>,
}

impl FontArtifact {
    /// Including `.notdef`
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn codepoints(&self) -> impl Iterator<Item = Codepoint> + '_ {
        self.glyphs.iter().filter_map(|g| g.codepoint)
    }

    pub fn glyph(&self, codepoint: Codepoint) -> Option<&Glyph> {
        self.glyphs.iter().find(|g| g.codepoint == Some(codepoint))
    }

    /// The glyph's outline placed in font units
    pub fn outline(&self, glyph: &Glyph) -> SimpleGlyph {
        font_outline(&glyph.path, &self.metrics, glyph.advance_width)
    }

    /// Compile to a TrueType binary
    pub fn to_ttf(&self) -> GlyphResult<Vec<u8>> {
        let records: Vec<GlyphRecord> = self
            .glyphs
            .iter()
            .map(|glyph| GlyphRecord {
                codepoint: glyph.codepoint.map(Codepoint::value),
                advance_width: glyph.advance_width,
                outline: self.outline(glyph),
            })
            .collect();

        let writer = TrueTypeWriter {
            family_name: &self.family_name,
            style_name: &self.style_name,
            metrics: self.metrics,
            created: self.created.timestamp(),
        };
        let binary = writer.write(&records)?;
        info!(
            "Compiled '{}' with {} glyphs ({} bytes)",
            self.family_name,
            self.glyph_count(),
            binary.len()
        );
        Ok(binary)
    }
}

/// Builds [`FontArtifact`]s with fixed names and metrics
#[derive(Debug, Clone)]
pub struct FontAssembler {
    family_name: String,
    style_name: String,
    metrics: FontMetrics,
}

impl Default for FontAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_FAMILY_NAME)
    }
}

impl FontAssembler {
    pub fn new(family_name: impl Into<String>) -> Self {
        let family_name = family_name.into();
        let family_name = if family_name.trim().is_empty() {
            DEFAULT_FAMILY_NAME.to_string()
        } else {
            family_name
        };
        Self {
            family_name,
            style_name: DEFAULT_STYLE_NAME.to_string(),
            metrics: FontMetrics::default(),
        }
    }

    pub fn with_style(mut self, style_name: impl Into<String>) -> Self {
        self.style_name = style_name.into();
        self
    }

    pub fn with_metrics(mut self, metrics: FontMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    /// Order `glyphs` by code point behind a `.notdef` glyph.
    ///
    /// Fails on a repeated code point or more glyphs than TrueType can hold.
    pub fn assemble<I>(&self, glyphs: I) -> GlyphResult<FontArtifact>
    where
        I: IntoIterator<Item = (Codepoint, GlyphPath)>,
    {
        let mut by_codepoint = BTreeMap::new();
        for (codepoint, path) in glyphs {
            if by_codepoint.insert(codepoint, path).is_some() {
                return Err(GlyphError::DuplicateCodepoint(codepoint));
            }
        }
        if by_codepoint.len() >= MAX_GLYPHS {
            return Err(GlyphError::TooManyGlyphs(by_codepoint.len()));
        }

        let advance = self.metrics.advance_width;
        let mut ordered = Vec::with_capacity(by_codepoint.len() + 1);
        ordered.push(Glyph::notdef(advance));
        ordered.extend(by_codepoint.into_iter().map(|(codepoint, path)| Glyph {
            name: Glyph::name_for(codepoint),
            codepoint: Some(codepoint),
            path,
            advance_width: advance,
        }));

        Ok(FontArtifact {
            family_name: self.family_name.clone(),
            style_name: self.style_name.clone(),
            metrics: self.metrics,
            glyphs: ordered,
            created: Utc::now(),
        })
    }
}

/// Map a view box into the em: its height spans ascender to descender
/// (smaller if the width would overflow the advance), centred in the
/// advance and the line, y flipped to point up.
pub fn placement(view_box: Rect, metrics: &FontMetrics, advance_width: u16) -> Affine {
    let (w, h) = (view_box.width(), view_box.height());
    let band = metrics.line_height();
    let advance = advance_width as f64;
    if w <= 0.0 || h <= 0.0 || band <= 0.0 {
        return Affine::IDENTITY;
    }

    let mut scale = band / h;
    if w * scale > advance {
        scale = advance / w;
    }
    let x_pad = (advance - w * scale) / 2.0;
    let y_pad = (band - h * scale) / 2.0;
    Affine::new([
        scale,
        0.0,
        0.0,
        -scale,
        x_pad - view_box.x0 * scale,
        metrics.ascender as f64 - y_pad + view_box.y0 * scale,
    ])
}

/// TrueType outline of `path`, in font units with normalised winding
pub fn font_outline(path: &GlyphPath, metrics: &FontMetrics, advance_width: u16) -> SimpleGlyph {
    let view_box = if path.view_box().area() > 0.0 {
        Some(path.view_box())
    } else {
        path.bounds().filter(|b| b.area() > 0.0)
    };
    let Some(view_box) = view_box else {
        return SimpleGlyph::default();
    };
    let transform = placement(view_box, metrics, advance_width);

    let mut contours = Vec::new();
    for subpath in path.subpaths() {
        collect_contours(&(transform * subpath.clone()), &mut contours);
    }
    normalize_winding(&mut contours);
    SimpleGlyph::new(contours)
}

/// Split a transformed path into closed on/off-curve point loops
fn collect_contours(path: &kurbo::BezPath, out: &mut Vec<Vec<OutlinePoint>>) {
    let mut current: Vec<OutlinePoint> = Vec::new();
    let mut last = Point::ZERO;
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                finish_contour(&mut current, out);
                current.push(on_point(p));
                last = p;
            }
            PathEl::LineTo(p) => {
                current.push(on_point(p));
                last = p;
            }
            PathEl::QuadTo(c, p) => {
                current.push(off_point(c));
                current.push(on_point(p));
                last = p;
            }
            PathEl::CurveTo(c1, c2, p) => {
                for (_, _, quad) in CubicBez::new(last, c1, c2, p).to_quads(QUAD_ACCURACY) {
                    current.push(off_point(quad.p1));
                    current.push(on_point(quad.p2));
                }
                last = p;
            }
            PathEl::ClosePath => finish_contour(&mut current, out),
        }
    }
    finish_contour(&mut current, out);
}

/// Drop repeated on-curve points (including the closing one) and keep
/// the loop only if it can enclose area
fn finish_contour(current: &mut Vec<OutlinePoint>, out: &mut Vec<Vec<OutlinePoint>>) {
    let mut points = std::mem::take(current);
    points.dedup_by(|b, a| a.on_curve && b.on_curve && a.x == b.x && a.y == b.y);
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    if points.len() >= 3 {
        out.push(points);
    }
}

fn on_point(p: Point) -> OutlinePoint {
    OutlinePoint::on(to_font_unit(p.x), to_font_unit(p.y))
}

fn off_point(p: Point) -> OutlinePoint {
    OutlinePoint::off(to_font_unit(p.x), to_font_unit(p.y))
}

fn to_font_unit(v: f64) -> i16 {
    v.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// Outer contours (even nesting depth) clockwise, holes anticlockwise,
/// so that non-zero filling matches the traced even-odd regions
fn normalize_winding(contours: &mut [Vec<OutlinePoint>]) {
    let polygons: Vec<Vec<Point>> = contours
        .iter()
        .map(|c| c.iter().map(|p| Point::new(p.x as f64, p.y as f64)).collect())
        .collect();

    for (i, contour) in contours.iter_mut().enumerate() {
        let sample = polygons[i][0];
        let depth = polygons
            .iter()
            .enumerate()
            .filter(|&(j, other)| j != i && point_in_polygon(sample, other))
            .count();
        let area = signed_area(&polygons[i]);
        let want_clockwise = depth % 2 == 0;
        // Positive area is anticlockwise with y up
        if (want_clockwise && area > 0.0) || (!want_clockwise && area < 0.0) {
            contour.reverse();
            if let Some(start) = contour.iter().position(|p| p.on_curve) {
                contour.rotate_left(start);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GridPoint;
    use crate::outline::Contour;

    fn cp(value: u32) -> Codepoint {
        Codepoint::new(value).unwrap()
    }

    fn rect_contour(x0: i32, y0: i32, x1: i32, y1: i32) -> Contour {
        Contour::new(vec![
            GridPoint::new(x0, y0),
            GridPoint::new(x1, y0),
            GridPoint::new(x1, y1),
            GridPoint::new(x0, y1),
        ])
    }

    fn square_path() -> GlyphPath {
        GlyphPath::from_contours(&[rect_contour(0, 0, 10, 10)], 10, 10)
    }

    fn contour_area(contour: &[OutlinePoint]) -> f64 {
        let points: Vec<Point> = contour
            .iter()
            .map(|p| Point::new(p.x as f64, p.y as f64))
            .collect();
        signed_area(&points)
    }

    #[test]
    fn test_glyph_names() {
        assert_eq!(Glyph::name_for(cp(0x41)), "uni0041");
        assert_eq!(Glyph::name_for(cp(0xE000)), "uniE000");
        assert_eq!(Glyph::name_for(cp(0x1F600)), "u1F600");
    }

    #[test]
    fn test_assemble_orders_by_codepoint() {
        let font = FontAssembler::new("Test")
            .assemble([
                (cp(0xE001), square_path()),
                (cp(0x41), square_path()),
                (cp(0xE000), square_path()),
            ])
            .unwrap();
        let names: Vec<&str> = font.glyphs.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, [".notdef", "uni0041", "uniE000", "uniE001"]);
        assert_eq!(font.glyph_count(), 4);
        assert!(font.glyphs[0].codepoint.is_none());
        assert!(font.glyphs.iter().all(|g| g.advance_width == 600));
    }

    #[test]
    fn test_assemble_rejects_duplicates() {
        let result = FontAssembler::new("Test")
            .assemble([(cp(0x41), square_path()), (cp(0x41), square_path())]);
        assert_eq!(result.unwrap_err(), GlyphError::DuplicateCodepoint(cp(0x41)));
    }

    #[test]
    fn test_blank_family_falls_back() {
        assert_eq!(FontAssembler::new("  ").family_name(), DEFAULT_FAMILY_NAME);
    }

    #[test]
    fn test_square_fills_line_height() {
        let outline = font_outline(&square_path(), &FontMetrics::default(), 600);
        let bounds = outline.bounds().unwrap();
        // 10x10 view box: height capped by the 600 advance, centred vertically
        assert_eq!(
            (bounds.x_min, bounds.y_min, bounds.x_max, bounds.y_max),
            (0, 0, 600, 600)
        );
    }

    #[test]
    fn test_tall_view_box_spans_ascender_to_descender() {
        let path = GlyphPath::from_contours(&[rect_contour(0, 0, 5, 10)], 5, 10);
        let bounds = font_outline(&path, &FontMetrics::default(), 600)
            .bounds()
            .unwrap();
        assert_eq!(
            (bounds.x_min, bounds.y_min, bounds.x_max, bounds.y_max),
            (50, -200, 550, 800)
        );
    }

    #[test]
    fn test_winding_outer_clockwise_hole_anticlockwise() {
        let path = GlyphPath::from_contours(
            &[rect_contour(0, 0, 10, 10), rect_contour(3, 3, 7, 7)],
            10,
            10,
        );
        let outline = font_outline(&path, &FontMetrics::default(), 600);
        assert_eq!(outline.contours().len(), 2);
        assert!(contour_area(&outline.contours()[0]) < 0.0);
        assert!(contour_area(&outline.contours()[1]) > 0.0);
    }

    #[test]
    fn test_cubics_become_quadratics() {
        let mut bez = kurbo::BezPath::new();
        bez.move_to((0.0, 0.0));
        bez.curve_to((0.0, 10.0), (10.0, 10.0), (10.0, 0.0));
        bez.close_path();
        let path = GlyphPath::new(vec![bez], Rect::new(0.0, 0.0, 10.0, 10.0));
        let outline = font_outline(&path, &FontMetrics::default(), 600);
        let contour = &outline.contours()[0];
        assert!(contour.iter().any(|p| !p.on_curve));
        assert!(contour[0].on_curve);
    }

    #[test]
    fn test_degenerate_contours_are_dropped() {
        let sliver = Contour::new(vec![GridPoint::new(1, 1), GridPoint::new(1, 2)]);
        let path = GlyphPath::from_contours(&[sliver], 10, 10);
        assert!(font_outline(&path, &FontMetrics::default(), 600).is_empty());
    }

    #[test]
    fn test_to_ttf_reads_back() {
        let font = FontAssembler::new("Readback")
            .assemble([(cp(0x41), square_path()), (cp(0xE123), square_path())])
            .unwrap();
        let binary = font.to_ttf().unwrap();
        let face = ttf_parser::Face::parse(&binary, 0).unwrap();
        assert_eq!(face.number_of_glyphs(), 3);
        assert_eq!(face.glyph_index('A'), Some(ttf_parser::GlyphId(1)));
        assert_eq!(face.glyph_index('\u{E123}'), Some(ttf_parser::GlyphId(2)));
    }
}
