//! Source detection in sample windows.
//!
//! Detection runs in three stages: the window is split into disjoint
//! sources by region growing, each source gets its flux and shape
//! statistics, and sources too faint to classify are culled.
//!
//! # Module Organization
//!
//! - **watershed**: Noise-tolerant watershed region growing (default)
//! - **single_pass**: Single descending sweep that drops boundary samples
//! - **statistics**: Flux ratio, dispersion eigenvalues and orientation
//! - **detector**: Facade tying background, segmentation, statistics and culling together
//!
//! # Algorithm Comparison
//!
//! | Algorithm   | Overlapping basins | Upward steps          | Use case |
//! |-------------|--------------------|-----------------------|----------|
//! | Watershed   | Yes, ridges dropped | Joined within k·σ    | Production classification |
//! | Single pass | No                 | Never tested          | Quick look, comparisons |

pub mod detector;
pub mod single_pass;
pub mod statistics;
pub mod watershed;

pub use detector::SourceDetector;
pub use single_pass::segment_single_pass;
pub use statistics::{
    compute_source_statistics, flux_statistics, shape_statistics, FluxStatistics, ShapeStatistics,
};
pub use watershed::Watershed;

use serde::{Deserialize, Serialize};

/// Segmentation algorithm choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentationMethod {
    #[default]
    Watershed,
    SinglePass,
}

impl std::str::FromStr for SegmentationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "watershed" => Ok(SegmentationMethod::Watershed),
            "single-pass" | "single_pass" => Ok(SegmentationMethod::SinglePass),
            _ => Err(format!(
                "Unknown segmentation method: {}. Valid options: watershed, single-pass",
                s
            )),
        }
    }
}
