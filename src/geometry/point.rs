//! Integer grid points
//!
//! Traced contours live on the pixel grid, so their points are integer
//! coordinates with x to the right and y down.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// A pixel position in a mask or pixel grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset by a direction step
    pub const fn step(self, (dx, dy): (i32, i32)) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn to_kurbo(self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

impl From<GridPoint> for Point {
    fn from(point: GridPoint) -> Self {
        point.to_kurbo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step() {
        let p = GridPoint::new(3, 4);
        assert_eq!(p.step((1, -1)), GridPoint::new(4, 3));
        assert_eq!(p.step((-1, 1)), GridPoint::new(2, 5));
    }

    #[test]
    fn test_kurbo_conversion() {
        let p: Point = GridPoint::new(-2, 7).into();
        assert_eq!(p, Point::new(-2.0, 7.0));
    }
}
