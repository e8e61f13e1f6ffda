//! UFO format conversion utilities
//!
//! Conversion from assembled fonts to the norad UFO model. Outlines are
//! exported exactly as they are compiled into TrueType: font units, y up,
//! quadratic segments as `qcurve` points.

use crate::font_source::sfnt::OutlinePoint;
use crate::font_source::{FontArtifact, Glyph};
use norad::Font;

impl Glyph {
    /// Convert to a norad glyph with the given font-unit outline
    pub fn to_norad_glyph(&self, contours: &[Vec<OutlinePoint>]) -> norad::Glyph {
        let mut glyph = norad::Glyph::new(&self.name);
        glyph.width = self.advance_width as f64;

        if let Some(codepoint) = self.codepoint {
            glyph.codepoints.insert(codepoint.to_char());
        }

        glyph.contours = contours.iter().map(|c| to_norad_contour(c)).collect();
        glyph
    }
}

/// TrueType-style point loop to a UFO contour.
///
/// An on-curve point is a `qcurve` when off-curve points lead into it
/// (wrapping around the start of the loop), otherwise a `line`.
pub fn to_norad_contour(points: &[OutlinePoint]) -> norad::Contour {
    let count = points.len();
    let norad_points = points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let previous = &points[(i + count - 1) % count];
            let typ = if !point.on_curve {
                norad::PointType::OffCurve
            } else if !previous.on_curve {
                norad::PointType::QCurve
            } else {
                norad::PointType::Line
            };
            to_norad_point(point, typ)
        })
        .collect();

    norad::Contour::new(norad_points, None)
}

fn to_norad_point(point: &OutlinePoint, typ: norad::PointType) -> norad::ContourPoint {
    norad::ContourPoint::new(
        point.x as f64,
        point.y as f64,
        typ,
        false, // smooth
        None,  // name
        None,  // identifier
    )
}

impl FontArtifact {
    /// Convert to a complete norad Font
    pub fn to_norad_font(&self) -> Font {
        let mut font = Font::new();
        font.font_info = self
            .metrics
            .to_norad_font_info(&self.family_name, &self.style_name);

        let layer = font.default_layer_mut();
        for glyph in &self.glyphs {
            let outline = self.outline(glyph);
            layer.insert_glyph(glyph.to_norad_glyph(outline.contours()));
        }

        font
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_source::{Codepoint, FontAssembler};
    use crate::geometry::GridPoint;
    use crate::outline::Contour;
    use crate::path::GlyphPath;

    #[test]
    fn test_point_types() {
        let contour = to_norad_contour(&[
            OutlinePoint::on(0, 0),
            OutlinePoint::off(50, 100),
            OutlinePoint::on(100, 0),
            OutlinePoint::off(50, -100),
        ]);
        let types: Vec<_> = contour.points.iter().map(|p| p.typ.clone()).collect();
        assert_eq!(
            types,
            vec![
                norad::PointType::QCurve,
                norad::PointType::OffCurve,
                norad::PointType::QCurve,
                norad::PointType::OffCurve,
            ]
        );
    }

    #[test]
    fn test_artifact_to_norad_font() {
        let square = Contour::new(vec![
            GridPoint::new(0, 0),
            GridPoint::new(4, 0),
            GridPoint::new(4, 4),
            GridPoint::new(0, 4),
        ]);
        let path = GlyphPath::from_contours(&[square], 4, 4);
        let artifact = FontAssembler::new("Export")
            .assemble([(Codepoint::new(0x41).unwrap(), path)])
            .unwrap();

        let font = artifact.to_norad_font();
        assert_eq!(font.font_info.family_name.as_deref(), Some("Export"));
        let layer = font.default_layer();
        assert_eq!(layer.len(), 2);
        let glyph = layer.get_glyph("uni0041").unwrap();
        assert_eq!(glyph.width, 600.0);
        assert_eq!(glyph.codepoints.iter().collect::<Vec<char>>(), vec!['A']);
        assert_eq!(glyph.contours.len(), 1);
        assert_eq!(glyph.contours[0].points.len(), 4);
        assert!(layer.get_glyph(".notdef").unwrap().contours.is_empty());
    }
}
