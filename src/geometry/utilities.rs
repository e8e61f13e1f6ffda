//! Geometry utility functions
//!
//! Shared distance, area and containment helpers used by the simplifier
//! and by outline encoding.

use kurbo::{Point, Rect};

/// Distance from `p` to the segment `a`-`b`.
///
/// The projection parameter is clamped to `[0, 1]`, so points beyond an
/// endpoint measure to that endpoint. A degenerate segment measures to `a`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let len_sq = seg.hypot2();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    p.distance(a + seg * t)
}

/// Signed area of a closed polygon (shoelace).
///
/// Positive for counter-clockwise winding in a y-up coordinate system.
pub fn signed_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        sum += p.x * q.y - q.x * p.y;
    }
    sum * 0.5
}

/// Even-odd containment test of `p` against a closed polygon
pub fn point_in_polygon(p: Point, polygon: &[Point]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Fold step for bounding boxes; `None` means nothing accumulated yet.
pub fn union_bounds(acc: Option<Rect>, next: Rect) -> Option<Rect> {
    Some(match acc {
        Some(rect) => rect.union(next),
        None => next,
    })
}
