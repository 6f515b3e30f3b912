//! A single intensity reading at a window coordinate.

use std::cmp::Ordering;

/// One sample of a window: along-scan and across-scan coordinate plus level
///
/// Levels are in electrons and have not had the background removed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub al: usize,
    pub ac: usize,
    pub level: f64,
}

impl Sample {
    pub fn new(al: usize, ac: usize, level: f64) -> Self {
        Self { al, ac, level }
    }

    /// Brightest first; equal levels fall back to (AL, AC) raster order
    ///
    /// This is the single ordering used everywhere samples are ranked, so a
    /// segmentation run is fully deterministic.
    pub fn by_descending_level(a: &Sample, b: &Sample) -> Ordering {
        b.level
            .total_cmp(&a.level)
            .then_with(|| (a.al, a.ac).cmp(&(b.al, b.ac)))
    }

    /// Level with the background removed
    pub fn flux(&self, background: f64) -> f64 {
        self.level - background
    }
}
