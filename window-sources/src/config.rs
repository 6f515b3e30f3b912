//! Calibration constants for detection and classification.
//!
//! Every threshold the pipeline uses lives here with its calibrated value as
//! the default. A [`PipelineConfig`] can be written to and read back from a
//! JSON file; fields missing from the file keep their defaults.

use crate::classify::ClassifierKind;
use crate::image_proc::detection::SegmentationMethod;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors loading or saving a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Watershed segmentation and culling parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Region-growing algorithm used to split a window into sources
    pub segmentation: SegmentationMethod,
    /// Detection threshold in units of background error above the background
    pub detection_sigmas: f64,
    /// Largest upward step, in combined Poisson sigmas, still joined to a basin
    pub connectivity_sigmas: f64,
    /// Sources at or below this integrated flux [e-] are dropped
    pub faint_source_flux: f64,
    /// Report NaN shape statistics when an eigenvalue is negative
    pub reject_negative_eigenvalues: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            segmentation: SegmentationMethod::Watershed,
            detection_sigmas: 10.0,
            connectivity_sigmas: 2.0,
            faint_source_flux: 100.0,
            reject_negative_eigenvalues: false,
        }
    }
}

/// Thresholds of the rule-based classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmpiricalClassifierConfig {
    /// Peak flux [e-] above which a sharp source is a cosmic ray
    pub peak_flux_threshold: f64,
    /// Peak-to-neighbour ratio threshold for unbinned and unlisted binnings
    pub flux_ratio_threshold: f64,
    /// Ratio threshold for 1x2 (AL x AC) binning
    pub flux_ratio_threshold_1x2: f64,
    /// Ratio threshold for 2x2 binning
    pub flux_ratio_threshold_2x2: f64,
    /// Ratio threshold for 4x4 binning
    pub flux_ratio_threshold_4x4: f64,
    /// Smallest major eigenvalue [pixels²] of a spike
    pub spike_min_major_eigenvalue: f64,
    /// Smallest major/minor eigenvalue ratio of a spike
    pub spike_min_eigenvalue_ratio: f64,
    /// Angular tolerance [rad] for AL/AC aligned spikes
    pub spike_axis_tolerance: f64,
    /// Windows longer than this along-scan skip the spike test
    pub spike_max_al_window: usize,
    /// Demote cosmic rays whose peak lies on the first read-out line
    pub first_line_cosmic_veto: bool,
}

impl Default for EmpiricalClassifierConfig {
    fn default() -> Self {
        Self {
            peak_flux_threshold: 1500.0,
            flux_ratio_threshold: 10.0,
            flux_ratio_threshold_1x2: 20.0,
            flux_ratio_threshold_2x2: 20.0,
            flux_ratio_threshold_4x4: 55.0,
            spike_min_major_eigenvalue: 15.0,
            spike_min_eigenvalue_ratio: 3.0,
            spike_axis_tolerance: 10f64.to_radians(),
            spike_max_al_window: 18,
            first_line_cosmic_veto: true,
        }
    }
}

impl EmpiricalClassifierConfig {
    /// Peak-to-neighbour flux ratio threshold for a sample binning
    pub fn flux_ratio_threshold_for(&self, al_sample_size: usize, ac_sample_size: usize) -> f64 {
        match (al_sample_size, ac_sample_size) {
            (1, 2) => self.flux_ratio_threshold_1x2,
            (2, 2) => self.flux_ratio_threshold_2x2,
            (4, 4) => self.flux_ratio_threshold_4x4,
            _ => self.flux_ratio_threshold,
        }
    }
}

/// Complete configuration of a processing run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub detection: DetectionConfig,
    pub classifier: ClassifierKind,
    pub empirical: EmpiricalClassifierConfig,
}

impl PipelineConfig {
    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load from JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })
    }
}
