//! Probed source-media metrics.

use serde::{Deserialize, Serialize};

/// Pixel dimensions and on-canvas duration of a source media item.
///
/// Derived once per job by the prober, immutable afterward. The duration
/// is the composition duration, before the pipeline's start trim.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MediaMetrics {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Composition duration in seconds
    pub duration: f64,
}

impl MediaMetrics {
    /// Construct metrics, rejecting non-positive values.
    pub fn new(width: u32, height: u32, duration: f64) -> Option<Self> {
        if width == 0 || height == 0 || duration <= 0.0 || !duration.is_finite() {
            return None;
        }
        Some(Self {
            width,
            height,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive() {
        assert!(MediaMetrics::new(0, 100, 1.0).is_none());
        assert!(MediaMetrics::new(100, 0, 1.0).is_none());
        assert!(MediaMetrics::new(100, 100, 0.0).is_none());
        assert!(MediaMetrics::new(100, 100, -3.0).is_none());
        assert!(MediaMetrics::new(100, 100, f64::NAN).is_none());
        assert!(MediaMetrics::new(1920, 1080, 12.0).is_some());
    }
}
