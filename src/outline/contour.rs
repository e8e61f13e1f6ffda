//! Contour tracing: closed boundary loops from a binary mask
//!
//! A foreground pixel is on the boundary when any of its eight neighbours
//! is background (outside the grid counts as background). Boundary pixels
//! are found in row-major order and each unvisited one starts a
//! Moore-neighbour walk that favours left turns.

use crate::core::errors::GlyphResult;
use crate::geometry::GridPoint;
use crate::raster::BinaryMask;
use crate::vectorize::Deadline;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Contours with fewer points than this are speckle noise
pub const MIN_CONTOUR_LEN: usize = 4;

/// Neighbour steps, clockwise on screen (y grows downwards):
/// E, SE, S, SW, W, NW, N, NE
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Scan offset from the arrival direction: two steps anticlockwise is a
/// left turn
const LEFT_TURN: usize = 6;

/// An ordered, implicitly closed loop of grid points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contour(Vec<GridPoint>);

impl Contour {
    pub fn new(points: Vec<GridPoint>) -> Self {
        Self(points)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn points(&self) -> &[GridPoint] {
        &self.0
    }
}

/// Whether `(x, y)` is foreground with at least one background neighbour
pub fn is_boundary_pixel(mask: &BinaryMask, x: i32, y: i32) -> bool {
    mask.is_foreground(x, y)
        && DIRECTIONS
            .iter()
            .any(|&(dx, dy)| !mask.is_foreground(x + dx, y + dy))
}

/// Trace every boundary loop of `mask` with no time limit
pub fn trace_contours(mask: &BinaryMask) -> Vec<Contour> {
    let mut tracer = ContourTracer::new(mask);
    let mut contours = Vec::new();
    while let Some(contour) = tracer.next_contour() {
        contours.push(contour);
    }
    contours
}

/// Trace every boundary loop, checking `deadline` between walks
pub fn trace_contours_with_deadline(
    mask: &BinaryMask,
    deadline: &Deadline,
) -> GlyphResult<Vec<Contour>> {
    let mut tracer = ContourTracer::new(mask);
    let mut contours = Vec::new();
    loop {
        deadline.check()?;
        match tracer.next_contour() {
            Some(contour) => contours.push(contour),
            None => break,
        }
    }
    debug!(
        "Traced {} contours from {}x{} mask",
        contours.len(),
        mask.width(),
        mask.height()
    );
    Ok(contours)
}

/// Row-major boundary scanner that yields one contour per call
struct ContourTracer<'a> {
    mask: &'a BinaryMask,
    /// Flat visited flags indexed by `y * width + x`
    visited: Vec<bool>,
    /// Next row-major offset to examine
    cursor: usize,
    max_steps: usize,
}

impl<'a> ContourTracer<'a> {
    fn new(mask: &'a BinaryMask) -> Self {
        let area = mask.width() as usize * mask.height() as usize;
        Self {
            mask,
            visited: vec![false; area],
            cursor: 0,
            max_steps: area.max(1),
        }
    }

    fn index(&self, p: GridPoint) -> usize {
        p.y as usize * self.mask.width() as usize + p.x as usize
    }

    fn next_contour(&mut self) -> Option<Contour> {
        let width = self.mask.width() as usize;
        while self.cursor < self.visited.len() {
            let offset = self.cursor;
            self.cursor += 1;
            if self.visited[offset] {
                continue;
            }
            let start = GridPoint::new((offset % width) as i32, (offset / width) as i32);
            if !is_boundary_pixel(self.mask, start.x, start.y) {
                continue;
            }
            let points = self.walk(start);
            if points.len() >= MIN_CONTOUR_LEN {
                return Some(Contour(points));
            }
        }
        None
    }

    /// Follow the boundary from `start` until it closes, dead-ends or hits
    /// the step cap. Every pixel stepped on is marked visited.
    fn walk(&mut self, start: GridPoint) -> Vec<GridPoint> {
        let mut points = vec![start];
        let start_index = self.index(start);
        self.visited[start_index] = true;

        let mut current = start;
        // Row-major discovery means we "arrived" moving east
        let mut arrival = 0usize;

        for _ in 0..self.max_steps {
            let mut next = None;
            for turn in 0..DIRECTIONS.len() {
                let dir = (arrival + LEFT_TURN + turn) % DIRECTIONS.len();
                let candidate = current.step(DIRECTIONS[dir]);
                if candidate == start && points.len() >= 3 {
                    return points;
                }
                if !is_boundary_pixel(self.mask, candidate.x, candidate.y) {
                    continue;
                }
                let index = self.index(candidate);
                if !self.visited[index] {
                    next = Some((candidate, dir, index));
                    break;
                }
            }

            match next {
                Some((candidate, dir, index)) => {
                    self.visited[index] = true;
                    points.push(candidate);
                    current = candidate;
                    arrival = dir;
                }
                None => break,
            }
        }

        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn in_bounds(mask: &BinaryMask, contour: &Contour) -> bool {
        contour.points().iter().all(|p| {
            p.x >= 0 && p.y >= 0 && p.x < mask.width() as i32 && p.y < mask.height() as i32
        })
    }

    #[test]
    fn test_empty_mask_has_no_contours() {
        let mask = BinaryMask::from_ascii(&["....", "....", "...."]);
        assert!(trace_contours(&mask).is_empty());
    }

    #[test]
    fn test_square_traces_outer_ring() {
        let mask = BinaryMask::from_ascii(&[
            "......", //
            ".####.",
            ".####.",
            ".####.",
            ".####.",
            "......",
        ]);
        let contours = trace_contours(&mask);
        assert_eq!(contours.len(), 1);
        // 4x4 block: 12 ring pixels, interior pixels are not boundary
        assert_eq!(contours[0].len(), 12);
        assert_eq!(contours[0].points()[0], GridPoint::new(1, 1));
        assert!(in_bounds(&mask, &contours[0]));
    }

    #[test]
    fn test_two_by_two_block_closes() {
        let mask = BinaryMask::from_ascii(&["##", "##"]);
        let contours = trace_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(
            contours[0].points(),
            &[
                GridPoint::new(0, 0),
                GridPoint::new(1, 0),
                GridPoint::new(1, 1),
                GridPoint::new(0, 1),
            ]
        );
    }

    #[test]
    fn test_speckles_are_discarded() {
        let mask = BinaryMask::from_ascii(&["#....", ".....", "...##"]);
        assert!(trace_contours(&mask).is_empty());
    }

    #[test]
    fn test_ring_yields_outer_and_inner_loops() {
        let mask = BinaryMask::from_ascii(&[
            "#######",
            "#######",
            "##...##",
            "##...##",
            "##...##",
            "#######",
            "#######",
        ]);
        let contours = trace_contours(&mask);
        assert_eq!(contours.len(), 2);
        let first: HashSet<_> = contours[0].points().iter().collect();
        assert!(contours[1].points().iter().all(|p| !first.contains(p)));
        for contour in &contours {
            assert!(contour.len() >= MIN_CONTOUR_LEN);
            assert!(in_bounds(&mask, contour));
        }
    }

    #[test]
    fn test_emission_order_is_row_major() {
        let mask = BinaryMask::from_ascii(&[
            "......##",
            "......##",
            "........",
            "##......",
            "##......",
        ]);
        let contours = trace_contours(&mask);
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].points()[0], GridPoint::new(6, 0));
        assert_eq!(contours[1].points()[0], GridPoint::new(0, 3));
    }

    #[test]
    fn test_expired_deadline_stops_tracing() {
        let mask = BinaryMask::from_ascii(&["##", "##"]);
        let deadline = Deadline::expired();
        assert!(trace_contours_with_deadline(&mask, &deadline).is_err());
    }
}
