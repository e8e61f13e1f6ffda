//! Cooperative time limits for a conversion
//!
//! The pipeline is synchronous, so cancellation is checked at well-defined
//! points (between contour walks and between budget rounds).

use crate::core::errors::{GlyphError, GlyphResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// An optional wall-clock limit plus an optional external cancel flag
#[derive(Debug, Clone, Default)]
pub struct Deadline {
    expires_at: Option<Instant>,
    limit: Duration,
    cancelled: Option<Arc<AtomicBool>>,
}

impl Deadline {
    /// Never expires
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Expires `limit` from now
    pub fn after(limit: Duration) -> Self {
        Self {
            expires_at: Instant::now().checked_add(limit),
            limit,
            cancelled: None,
        }
    }

    /// Already expired; every check fails
    pub fn expired() -> Self {
        Self::after(Duration::ZERO)
    }

    /// Also fail once `flag` is raised
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(flag);
        self
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// `Err(ConversionTimeout)` once the limit has passed or the
    /// cancel flag is set
    pub fn check(&self) -> GlyphResult<()> {
        let timed_out = self
            .expires_at
            .is_some_and(|at| Instant::now() >= at);
        let cancelled = self
            .cancelled
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed));
        if timed_out || cancelled {
            Err(GlyphError::ConversionTimeout(self.limit))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_never_fails() {
        assert!(Deadline::unbounded().check().is_ok());
    }

    #[test]
    fn test_expired_fails() {
        assert_eq!(
            Deadline::expired().check(),
            Err(GlyphError::ConversionTimeout(Duration::ZERO))
        );
    }

    #[test]
    fn test_cancel_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let deadline = Deadline::after(Duration::from_secs(60)).with_cancel_flag(flag.clone());
        assert!(deadline.check().is_ok());
        flag.store(true, Ordering::Relaxed);
        assert_eq!(
            deadline.check(),
            Err(GlyphError::ConversionTimeout(Duration::from_secs(60)))
        );
    }
}
