//! Cleaning and importing caller-supplied SVG glyphs
//!
//! Vector input is trusted only after it has been reduced to plain,
//! single-colour shapes: raster references and foreign markup are
//! stripped, paints are rewritten to `currentColor`, and anything that
//! still smells of embedded raster content is rejected outright.

use super::glyph_path::{GlyphPath, PAINT, SVG_NAMESPACE};
use crate::core::errors::{GlyphError, GlyphResult};
use crate::geometry::union_bounds;
use kurbo::{BezPath, Circle, Ellipse, Point, Rect, RoundedRect, Shape};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Flattening tolerance for circles and ellipses, in user units
const SHAPE_TOLERANCE: f64 = 0.1;

static IMAGE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<image\b[^>]*>|</image\s*>").expect("valid regex"));
static DATA_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:xlink:)?href\s*=\s*"data:image[^"]*""#).expect("valid regex")
});
static PAINT_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(fill|stroke)\s*=\s*"([^"]*)""#).expect("valid regex")
});
static STYLE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bstyle\s*=\s*"[^"]*""#).expect("valid regex"));
static FOREIGN_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<foreignObject\b[^>]*/>|<foreignObject\b.*?</foreignObject\s*>|<script\b[^>]*/>|<script\b.*?</script\s*>",
    )
    .expect("valid regex")
});
static SVG_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<svg\b").expect("valid regex"));
static FORBIDDEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<image\b|<foreignObject\b|data:image/").expect("valid regex")
});

/// Strip raster and foreign content from `svg` and force `currentColor`.
///
/// Fails with [`GlyphError::EmbeddedRasterRejected`] when raster content
/// survives the cleaning passes.
pub fn sanitize_svg(svg: &str) -> GlyphResult<String> {
    let cleaned = IMAGE_TAG.replace_all(svg, "");
    let cleaned = DATA_HREF.replace_all(&cleaned, "");
    let cleaned = PAINT_ATTR.replace_all(&cleaned, |caps: &Captures| {
        if caps[2].trim().eq_ignore_ascii_case("none") {
            caps[0].to_string()
        } else {
            format!(r#"{}="{}""#, &caps[1], PAINT)
        }
    });
    let cleaned = STYLE_ATTR.replace_all(&cleaned, "");
    let cleaned = FOREIGN_BLOCK.replace_all(&cleaned, "");

    let mut cleaned = cleaned.into_owned();
    if !cleaned.contains(&format!(r#"xmlns="{SVG_NAMESPACE}""#)) {
        cleaned = SVG_OPEN
            .replace(&cleaned, format!(r#"<svg xmlns="{SVG_NAMESPACE}""#).as_str())
            .into_owned();
    }

    if let Some(found) = FORBIDDEN.find(&cleaned) {
        warn!("Rejecting vector input: '{}' survived sanitizing", found.as_str());
        return Err(GlyphError::EmbeddedRasterRejected(found.as_str().to_string()));
    }
    Ok(cleaned)
}

/// Sanitize `svg` and collect its shapes into a [`GlyphPath`].
///
/// A bare fragment such as a lone `<path d="…"/>` is wrapped in an
/// `<svg>` root first. Transforms are not applied.
pub fn import_svg(svg: &str) -> GlyphResult<GlyphPath> {
    let wrapped;
    let source = if SVG_OPEN.is_match(svg) {
        svg
    } else {
        wrapped = format!(r#"<svg xmlns="{SVG_NAMESPACE}">{svg}</svg>"#);
        &wrapped
    };
    let cleaned = sanitize_svg(source)?;

    let doc = roxmltree::Document::parse(&cleaned)
        .map_err(|e| GlyphError::InvalidVector(e.to_string()))?;
    let root = doc.root_element();
    if !root.tag_name().name().eq_ignore_ascii_case("svg") {
        return Err(GlyphError::InvalidVector(format!(
            "expected <svg> root, found <{}>",
            root.tag_name().name()
        )));
    }

    let mut subpaths = Vec::new();
    for node in root.descendants().filter(|n| n.is_element()) {
        if let Some(path) = element_path(&node)? {
            if !path.elements().is_empty() {
                subpaths.push(path);
            }
        }
    }
    if subpaths.is_empty() {
        return Err(GlyphError::InvalidVector("no drawable shapes".to_string()));
    }

    let view_box = parse_view_box(&root)
        .or_else(|| {
            let w = length_attr(&root, "width")?;
            let h = length_attr(&root, "height")?;
            Some(Rect::new(0.0, 0.0, w, h))
        })
        .or_else(|| {
            subpaths
                .iter()
                .map(|p| p.bounding_box())
                .fold(None, union_bounds)
        })
        .unwrap_or(Rect::ZERO);

    debug!("Imported {} subpaths, view box {:?}", subpaths.len(), view_box);
    Ok(GlyphPath::new(subpaths, view_box))
}

/// Outline for a single shape element, `None` for anything that is not a shape
fn element_path(node: &roxmltree::Node) -> GlyphResult<Option<BezPath>> {
    let path = match node.tag_name().name() {
        "path" => {
            let Some(d) = node.attribute("d") else {
                return Ok(None);
            };
            BezPath::from_svg(d).map_err(|e| GlyphError::InvalidVector(format!("path data: {e}")))?
        }
        "rect" => {
            let x = number_attr(node, "x")?.unwrap_or(0.0);
            let y = number_attr(node, "y")?.unwrap_or(0.0);
            let w = number_attr(node, "width")?.unwrap_or(0.0);
            let h = number_attr(node, "height")?.unwrap_or(0.0);
            let rx = number_attr(node, "rx")?;
            let ry = number_attr(node, "ry")?;
            let radius = rx.or(ry).unwrap_or(0.0).min(w / 2.0).min(h / 2.0).max(0.0);
            if w <= 0.0 || h <= 0.0 {
                return Ok(None);
            }
            let rect = Rect::new(x, y, x + w, y + h);
            if radius > 0.0 {
                RoundedRect::from_rect(rect, radius).to_path(SHAPE_TOLERANCE)
            } else {
                rect.to_path(SHAPE_TOLERANCE)
            }
        }
        "circle" => {
            let r = number_attr(node, "r")?.unwrap_or(0.0);
            if r <= 0.0 {
                return Ok(None);
            }
            let center = Point::new(
                number_attr(node, "cx")?.unwrap_or(0.0),
                number_attr(node, "cy")?.unwrap_or(0.0),
            );
            Circle::new(center, r).to_path(SHAPE_TOLERANCE)
        }
        "ellipse" => {
            let rx = number_attr(node, "rx")?.unwrap_or(0.0);
            let ry = number_attr(node, "ry")?.unwrap_or(0.0);
            if rx <= 0.0 || ry <= 0.0 {
                return Ok(None);
            }
            let center = Point::new(
                number_attr(node, "cx")?.unwrap_or(0.0),
                number_attr(node, "cy")?.unwrap_or(0.0),
            );
            Ellipse::new(center, (rx, ry), 0.0).to_path(SHAPE_TOLERANCE)
        }
        tag @ ("polygon" | "polyline") => {
            let points = parse_points(node.attribute("points").unwrap_or(""))?;
            if points.len() < 2 {
                return Ok(None);
            }
            let mut path = BezPath::new();
            path.move_to(points[0]);
            for p in &points[1..] {
                path.line_to(*p);
            }
            // Glyph outlines are filled, so an open polyline closes too
            if tag == "polygon" || points.len() > 2 {
                path.close_path();
            }
            path
        }
        _ => return Ok(None),
    };
    Ok(Some(path))
}

fn number_attr(node: &roxmltree::Node, name: &str) -> GlyphResult<Option<f64>> {
    match node.attribute(name) {
        None => Ok(None),
        Some(raw) => parse_length(raw)
            .map(Some)
            .ok_or_else(|| GlyphError::InvalidVector(format!("{name}=\"{raw}\""))),
    }
}

fn length_attr(node: &roxmltree::Node, name: &str) -> Option<f64> {
    node.attribute(name)
        .and_then(parse_length)
        .filter(|v| *v > 0.0)
}

/// A plain number with an optional `px` suffix
fn parse_length(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed);
    number.trim().parse().ok()
}

fn parse_view_box(root: &roxmltree::Node) -> Option<Rect> {
    let values: Vec<f64> = root
        .attribute("viewBox")?
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match values[..] {
        [x, y, w, h] if w > 0.0 && h > 0.0 => Some(Rect::new(x, y, x + w, y + h)),
        _ => None,
    }
}

fn parse_points(raw: &str) -> GlyphResult<Vec<Point>> {
    let numbers: Vec<f64> = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| GlyphError::InvalidVector(format!("points value '{s}'")))
        })
        .collect::<GlyphResult<_>>()?;
    Ok(numbers
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colours_become_current_color() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0 0L1 0L1 1Z" fill="#ff0000" stroke="blue"/></svg>"##;
        let cleaned = sanitize_svg(svg).unwrap();
        assert!(cleaned.contains(r#"fill="currentColor""#));
        assert!(cleaned.contains(r#"stroke="currentColor""#));
        assert!(!cleaned.contains("#ff0000"));
    }

    #[test]
    fn test_fill_none_is_kept() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="2" height="2" fill="none" stroke="red"/></svg>"#;
        let cleaned = sanitize_svg(svg).unwrap();
        assert!(cleaned.contains(r#"fill="none""#));
        assert!(cleaned.contains(r#"stroke="currentColor""#));
    }

    #[test]
    fn test_raster_content_is_stripped() {
        let svg = r#"<svg viewBox="0 0 10 10"><image href="data:image/png;base64,AAAA" width="10"/><use xlink:href="data:image/png;base64,BBBB"/><path d="M0 0L5 5L0 5Z" style="fill:red"/><foreignObject><div>hi</div></foreignObject><script>alert(1)</script></svg>"#;
        let cleaned = sanitize_svg(svg).unwrap();
        assert!(!cleaned.contains("<image"));
        assert!(!cleaned.contains("data:image"));
        assert!(!cleaned.contains("style="));
        assert!(!cleaned.contains("foreignObject"));
        assert!(!cleaned.contains("script"));
        assert!(cleaned.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox"#));
    }

    #[test]
    fn test_single_quoted_data_uri_is_rejected() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><use href='data:image/png;base64,AAAA'/></svg>"#;
        assert!(matches!(
            sanitize_svg(svg),
            Err(GlyphError::EmbeddedRasterRejected(_))
        ));
    }

    #[test]
    fn test_import_collects_shapes() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
            <path d="M10 10 L90 10 L90 90 Z" fill="black"/>
            <rect x="20" y="20" width="10" height="10"/>
            <circle cx="50" cy="50" r="5"/>
            <polygon points="0,0 10,0 10,10"/>
            <g><ellipse cx="70" cy="70" rx="4" ry="2"/></g>
        </svg>"#;
        let path = import_svg(svg).unwrap();
        assert_eq!(path.subpaths().len(), 5);
        assert_eq!(path.view_box(), Rect::new(0.0, 0.0, 100.0, 100.0));
    }

    #[test]
    fn test_import_wraps_fragment() {
        let path = import_svg(r#"<path d="M0 0 L40 0 L40 20 Z"/>"#).unwrap();
        assert_eq!(path.subpaths().len(), 1);
        assert_eq!(path.view_box(), Rect::new(0.0, 0.0, 40.0, 20.0));
    }

    #[test]
    fn test_import_uses_width_and_height() {
        let svg = r#"<svg width="64px" height="32"><path d="M0 0 L1 1 L0 1 Z"/></svg>"#;
        assert_eq!(
            import_svg(svg).unwrap().view_box(),
            Rect::new(0.0, 0.0, 64.0, 32.0)
        );
    }

    #[test]
    fn test_import_errors() {
        assert!(matches!(
            import_svg("<svg><path d=\"M0 0 L1"),
            Err(GlyphError::InvalidVector(_))
        ));
        assert!(matches!(
            import_svg(r#"<svg><path d="M 0 0 X 3"/></svg>"#),
            Err(GlyphError::InvalidVector(_))
        ));
        assert!(matches!(
            import_svg(r#"<svg><g/></svg>"#),
            Err(GlyphError::InvalidVector(_))
        ));
    }
}
