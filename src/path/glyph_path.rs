//! Single-colour glyph outlines and their SVG serialization

use crate::geometry::union_bounds;
use crate::outline::Contour;
use kurbo::{BezPath, PathEl, Point, Rect, Shape};
use std::fmt::Write;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// The only paint a glyph carries; renderers substitute the text colour
pub const PAINT: &str = "currentColor";

/// Placeholder square side as a fraction of the shorter view box side
const PLACEHOLDER_RATIO: f64 = 0.6;

/// One or more closed subpaths inside a view box.
///
/// Holds no raster data. Subpaths keep the order they were traced or
/// imported in, which is the order trimming removes them.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphPath {
    subpaths: Vec<BezPath>,
    view_box: Rect,
}

impl GlyphPath {
    pub fn new(subpaths: Vec<BezPath>, view_box: Rect) -> Self {
        Self { subpaths, view_box }
    }

    /// One closed straight-line subpath per contour, view box `0 0 w h`
    pub fn from_contours(contours: &[Contour], width: u32, height: u32) -> Self {
        let subpaths = contours
            .iter()
            .filter(|c| !c.is_empty())
            .map(|contour| {
                let mut path = BezPath::new();
                let mut points = contour.points().iter().map(|p| p.to_kurbo());
                if let Some(first) = points.next() {
                    path.move_to(first);
                }
                for p in points {
                    path.line_to(p);
                }
                path.close_path();
                path
            })
            .collect();
        Self::new(subpaths, Rect::new(0.0, 0.0, width as f64, height as f64))
    }

    /// A centred square standing in for an image with nothing to trace
    pub fn placeholder(width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        let side = PLACEHOLDER_RATIO * w.min(h);
        let origin = Point::new((w - side) / 2.0, (h - side) / 2.0);
        let square = Rect::from_origin_size(origin, (side, side));

        let mut path = BezPath::new();
        path.move_to((square.x0, square.y0));
        path.line_to((square.x1, square.y0));
        path.line_to((square.x1, square.y1));
        path.line_to((square.x0, square.y1));
        path.close_path();
        Self::new(vec![path], Rect::new(0.0, 0.0, w, h))
    }

    pub fn subpaths(&self) -> &[BezPath] {
        &self.subpaths
    }

    pub fn view_box(&self) -> Rect {
        self.view_box
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    /// Bounding box of all subpaths, `None` for an empty path
    pub fn bounds(&self) -> Option<Rect> {
        self.subpaths
            .iter()
            .filter(|p| !p.elements().is_empty())
            .map(|p| p.bounding_box())
            .fold(None, union_bounds)
    }

    /// Path data for a single subpath
    pub fn subpath_data(path: &BezPath) -> String {
        let mut out = String::new();
        for el in path.elements() {
            if !out.is_empty() {
                out.push(' ');
            }
            match el {
                PathEl::MoveTo(p) => write_command(&mut out, 'M', &[*p]),
                PathEl::LineTo(p) => write_command(&mut out, 'L', &[*p]),
                PathEl::QuadTo(c, p) => write_command(&mut out, 'Q', &[*c, *p]),
                PathEl::CurveTo(c1, c2, p) => write_command(&mut out, 'C', &[*c1, *c2, *p]),
                PathEl::ClosePath => out.push('Z'),
            }
        }
        out
    }

    /// Path data for every subpath, space separated
    pub fn to_path_data(&self) -> String {
        self.subpaths
            .iter()
            .map(Self::subpath_data)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Complete SVG document, one `<path>` per subpath
    pub fn to_svg(&self) -> String {
        let vb = self.view_box;
        let mut svg = format!(
            r#"<svg xmlns="{}" viewBox="{} {} {} {}" width="{}" height="{}">"#,
            SVG_NAMESPACE,
            format_number(vb.x0),
            format_number(vb.y0),
            format_number(vb.width()),
            format_number(vb.height()),
            format_number(vb.width()),
            format_number(vb.height()),
        );
        for path in &self.subpaths {
            let _ = write!(
                svg,
                r#"<path d="{}" fill="{}" />"#,
                Self::subpath_data(path),
                PAINT
            );
        }
        svg.push_str("</svg>");
        svg
    }

    /// Size in bytes of [`GlyphPath::to_svg`]
    pub fn serialized_len(&self) -> usize {
        self.to_svg().len()
    }

    /// Drop the first `max(1, n / divisor)` subpaths, never the last one.
    ///
    /// Returns the trimmed path and how many subpaths were removed.
    pub fn trim(&self, divisor: usize) -> (GlyphPath, usize) {
        let n = self.subpaths.len();
        if n <= 1 {
            return (self.clone(), 0);
        }
        let removed = (n / divisor.max(1)).max(1).min(n - 1);
        let trimmed = Self::new(self.subpaths[removed..].to_vec(), self.view_box);
        (trimmed, removed)
    }
}

fn write_command(out: &mut String, command: char, points: &[Point]) {
    out.push(command);
    for p in points {
        let _ = write!(out, " {} {}", format_number(p.x), format_number(p.y));
    }
}

/// At most two decimals, no trailing zeros, no negative zero
pub fn format_number(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 || !rounded.is_finite() {
        return "0".to_string();
    }
    let text = format!("{rounded:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GridPoint;

    fn square(x: i32, y: i32, side: i32) -> Contour {
        Contour::new(vec![
            GridPoint::new(x, y),
            GridPoint::new(x + side, y),
            GridPoint::new(x + side, y + side),
            GridPoint::new(x, y + side),
        ])
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(1.23456), "1.23");
        assert_eq!(format_number(-0.001), "0");
        assert_eq!(format_number(-4.2), "-4.2");
        assert_eq!(format_number(10.0), "10");
    }

    #[test]
    fn test_path_data_from_contour() {
        let path = GlyphPath::from_contours(&[square(1, 2, 3)], 10, 10);
        assert_eq!(path.to_path_data(), "M 1 2 L 4 2 L 4 5 L 1 5 Z");
    }

    #[test]
    fn test_svg_document() {
        let path = GlyphPath::from_contours(&[square(0, 0, 2)], 4, 3);
        let svg = path.to_svg();
        assert_eq!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 4 3" width="4" height="3"><path d="M 0 0 L 2 0 L 2 2 L 0 2 Z" fill="currentColor" /></svg>"#
        );
        assert_eq!(path.serialized_len(), svg.len());
        assert!(!svg.contains("<image"));
    }

    #[test]
    fn test_placeholder_is_centred() {
        let path = GlyphPath::placeholder(100, 50);
        let bounds = path.bounds().unwrap();
        assert_eq!(bounds, Rect::new(35.0, 10.0, 65.0, 40.0));
        assert_eq!(path.subpaths().len(), 1);
    }

    #[test]
    fn test_bounds_cover_all_subpaths() {
        let path = GlyphPath::from_contours(&[square(1, 1, 2), square(6, 4, 3)], 10, 10);
        assert_eq!(path.bounds(), Some(Rect::new(1.0, 1.0, 9.0, 7.0)));
        assert_eq!(GlyphPath::from_contours(&[], 5, 5).bounds(), None);
    }

    #[test]
    fn test_trim_drops_leading_third() {
        let contours: Vec<_> = (0..7).map(|i| square(i, 0, 1)).collect();
        let path = GlyphPath::from_contours(&contours, 10, 10);
        let (trimmed, removed) = path.trim(3);
        assert_eq!(removed, 2);
        assert_eq!(trimmed.subpaths(), &path.subpaths()[2..]);
    }

    #[test]
    fn test_trim_keeps_last_subpath() {
        let two = GlyphPath::from_contours(&[square(0, 0, 1), square(3, 3, 1)], 5, 5);
        let (trimmed, removed) = two.trim(3);
        assert_eq!(removed, 1);
        assert_eq!(trimmed.subpaths().len(), 1);

        let (again, removed) = trimmed.trim(3);
        assert_eq!(removed, 0);
        assert_eq!(again, trimmed);
    }
}
