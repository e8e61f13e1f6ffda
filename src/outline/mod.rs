//! Outline extraction: boundary tracing and polyline simplification

pub mod contour;
pub mod simplify;

pub use contour::{trace_contours, trace_contours_with_deadline, Contour, MIN_CONTOUR_LEN};
pub use simplify::simplify;
