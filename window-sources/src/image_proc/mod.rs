//! Image processing on sample windows.
//!
//! # Module Organization
//!
//! - **background**: Local background level and noise from the faintest samples
//! - **neighbourhood**: Sample adjacency for 1D and 2D windows
//! - **detection**: Segmentation, source statistics and the detection facade
//! - **test_patterns**: Synthetic windows (noise, stars, hits, streaks)

pub mod background;
pub mod detection;
pub mod neighbourhood;
pub mod test_patterns;

pub use background::{estimate_background, estimate_window_background, faint_sample_count, BackgroundEstimate};
pub use detection::{SegmentationMethod, SourceDetector, Watershed};
pub use neighbourhood::Neighbourhood;
