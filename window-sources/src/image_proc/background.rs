//! Local background estimation from the faintest samples of a window.
//!
//! The background is the median of the `n` faintest samples, where `n`
//! depends on the total number of samples in the window (and so, in
//! practice, on the window class). The error is the RMS deviation of the
//! same samples about that median.
//!
//! # Sample counts
//!
//! | Samples | Window | Faintest used |
//! |---------|--------|---------------|
//! | 6       | 1x6, 6x1 | 2 |
//! | 12, 18  | 1D strips | 4 |
//! | 216     | 18x12  | 31 |
//! | 60      | 20x3   | 31 |
//! | 240     | 40x6   | 31 |
//! | 108     | e.g. 18x6 | 11 |
//! | other   |        | 4 |

use ndarray::ArrayView2;
use window_math::{lowest, median, rms_about};

/// Background level and its uncertainty, both in electrons
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundEstimate {
    pub level: f64,
    pub error: f64,
}

impl BackgroundEstimate {
    pub fn new(level: f64, error: f64) -> Self {
        Self { level, error }
    }

    /// `level + sigmas * error`
    pub fn threshold(&self, sigmas: f64) -> f64 {
        self.level + sigmas * self.error
    }
}

/// Number of faintest samples used for the background of a window
pub fn faint_sample_count(total_samples: usize) -> usize {
    match total_samples {
        6 => 2,
        12 | 18 => 4,
        216 | 60 | 240 => 31,
        108 => 11,
        _ => 4,
    }
}

/// Estimate the background from a list of sample levels
///
/// The result does not depend on the order of `levels`. When fewer samples
/// exist than the count table asks for, all of them are used. An empty
/// input gives NaN for both level and error.
pub fn estimate_background(levels: &[f64]) -> BackgroundEstimate {
    let n = faint_sample_count(levels.len());
    let faintest = lowest(levels, n);

    let level = median(&faintest).unwrap_or(f64::NAN);
    let error = rms_about(&faintest, level);

    BackgroundEstimate::new(level, error)
}

/// Estimate the background of a window's sample grid
pub fn estimate_window_background(samples: &ArrayView2<f32>) -> BackgroundEstimate {
    let levels: Vec<f64> = samples.iter().map(|&v| v as f64).collect();
    let estimate = estimate_background(&levels);
    log::trace!(
        "background of {} samples: {:.3} +/- {:.3}",
        levels.len(),
        estimate.level,
        estimate.error
    );
    estimate
}
