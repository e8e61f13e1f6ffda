//! Geometric Primitives and Operations

pub mod point;
pub mod utilities;

// Re-export commonly used items
pub use point::GridPoint;
pub use utilities::{distance_to_segment, point_in_polygon, signed_area, union_bounds};
