//! Built-in defaults
//!
//! These are the values used when neither the CLI nor the user's
//! settings.json say otherwise.

use std::time::Duration;

/// Maximum serialized size of one glyph, in bytes
pub const DEFAULT_BUDGET_BYTES: usize = 250_000;

/// Wall-clock limit for a single image conversion
pub const DEFAULT_CONVERSION_TIMEOUT: Duration = Duration::from_secs(15);

/// Simplification tolerance of the first budget round, in grid units
pub const DEFAULT_INITIAL_EPSILON: f64 = 2.0;

/// Images larger than this on either side are shrunk before tracing
pub const DEFAULT_MAX_WORKING_SIDE: u32 = 128;

pub const DEFAULT_FAMILY_NAME: &str = "Untitled";
pub const DEFAULT_STYLE_NAME: &str = "Regular";
pub const DEFAULT_UNITS_PER_EM: u16 = 1000;
pub const DEFAULT_ASCENDER: i16 = 800;
pub const DEFAULT_DESCENDER: i16 = -200;
pub const DEFAULT_ADVANCE_WIDTH: u16 = 600;

/// Name the application uses for its config and log directories
pub const APP_NAME: &str = "glyphwright";
