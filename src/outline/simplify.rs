//! Douglas–Peucker simplification of traced contours

use super::contour::Contour;
use crate::geometry::{distance_to_segment, GridPoint};

/// Reduce `contour` to the points needed to stay within `epsilon` of it.
///
/// The first and last points are always kept. An `epsilon` of zero (or
/// less) and inputs of two points or fewer come back unchanged.
pub fn simplify(contour: &Contour, epsilon: f64) -> Contour {
    Contour::new(simplify_points(contour.points(), epsilon))
}

pub fn simplify_points(points: &[GridPoint], epsilon: f64) -> Vec<GridPoint> {
    if points.len() <= 2 || epsilon <= 0.0 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;
    mark_spans(points, 0, points.len() - 1, epsilon, &mut keep, MAX_SPLIT_DEPTH);

    points
        .iter()
        .zip(&keep)
        .filter_map(|(p, &k)| k.then_some(*p))
        .collect()
}

/// Splits deeper than this keep their span verbatim
const MAX_SPLIT_DEPTH: usize = 256;

/// Mark the points kept between `first` and `last` (exclusive).
///
/// Spans are processed from an explicit stack. A span found at
/// `max_depth` splits is kept verbatim instead of being split again.
fn mark_spans(
    points: &[GridPoint],
    first: usize,
    last: usize,
    epsilon: f64,
    keep: &mut [bool],
    max_depth: usize,
) {
    let mut spans = vec![(first, last, 0usize)];
    while let Some((first, last, depth)) = spans.pop() {
        if last <= first + 1 {
            continue;
        }
        if depth >= max_depth {
            keep[first + 1..last].iter_mut().for_each(|k| *k = true);
            continue;
        }

        let a = points[first].to_kurbo();
        let b = points[last].to_kurbo();
        let mut max_distance = 0.0;
        let mut split = first;
        for (i, p) in points.iter().enumerate().take(last).skip(first + 1) {
            let d = distance_to_segment(p.to_kurbo(), a, b);
            if d > max_distance {
                max_distance = d;
                split = i;
            }
        }

        if max_distance > epsilon {
            keep[split] = true;
            spans.push((split, last, depth + 1));
            spans.push((first, split, depth + 1));
        }
    }
}
