//! Rule-based classification from flux ratio and dispersion shape.
//!
//! Decision sequence:
//!
//! 1. Two-dimensional sources are first tested for diffraction spikes:
//!    large, strongly elongated dispersion, split by orientation into AL, AC
//!    and diagonal spikes.
//! 2. Anything not a spike (and every 1D source) is split into stars and
//!    cosmic rays by peak flux and peak-to-neighbour flux ratio.
//! 3. Cosmic rays peaking on the first read-out line are demoted to unknown,
//!    since charge there can come from outside the window.

use super::SourceClassifier;
use crate::config::EmpiricalClassifierConfig;
use crate::sample::Sample;
use crate::source::{Source, SourceType};
use std::f64::consts::FRAC_PI_2;

/// Threshold-based source classifier
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmpiricalClassifier {
    config: EmpiricalClassifierConfig,
}

impl EmpiricalClassifier {
    pub fn new(config: EmpiricalClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EmpiricalClassifierConfig {
        &self.config
    }

    /// Spike type from the dispersion eigenvalues and orientation, or Unknown
    pub fn spike_classification(&self, source: &Source) -> SourceType {
        let eig = source.eigenvalues;
        if eig.is_nan() || source.orientation.is_nan() {
            return SourceType::Unknown;
        }

        // Long AL windows give too many false positives
        if source.geometry().al_samples > self.config.spike_max_al_window {
            return SourceType::Unknown;
        }

        // Too compact to be a spike
        if eig.major < self.config.spike_min_major_eigenvalue {
            return SourceType::Unknown;
        }

        // Large but round
        if eig.ratio() < self.config.spike_min_eigenvalue_ratio {
            return SourceType::Unknown;
        }

        let tolerance = self.config.spike_axis_tolerance;
        if source.orientation < tolerance {
            SourceType::SpikeAl
        } else if source.orientation > FRAC_PI_2 - tolerance {
            SourceType::SpikeAc
        } else {
            SourceType::SpikeDiagonal
        }
    }

    /// Stellar, cosmic or unknown from the peak flux and flux ratio
    pub fn cosmic_stellar_classification(&self, source: &Source) -> SourceType {
        if source.flux_ratio.is_nan() || source.peak_flux.is_nan() {
            return SourceType::Unknown;
        }

        let geometry = source.geometry();
        let ratio_threshold = self
            .config
            .flux_ratio_threshold_for(geometry.al_sample_size, geometry.ac_sample_size);
        let compact = source.flux_ratio > ratio_threshold;

        match (source.peak_flux > self.config.peak_flux_threshold, compact) {
            (true, true) => SourceType::Cosmic,
            (true, false) => SourceType::Stellar,
            // Faint and compact: most likely noise
            (false, true) => SourceType::Unknown,
            (false, false) => SourceType::Stellar,
        }
    }

    /// True when the brightest sample sits on the first read-out line
    fn peaks_on_first_line(&self, source: &Source) -> bool {
        let brightest = source
            .samples()
            .iter()
            .min_by(|a, b| Sample::by_descending_level(a, b));
        match brightest {
            Some(peak) => peak.al + 1 == source.geometry().al_samples,
            None => false,
        }
    }
}

impl SourceClassifier for EmpiricalClassifier {
    fn classify(&self, source: &Source) -> SourceType {
        let mut classification = SourceType::Unknown;

        if !source.is_1d() {
            classification = self.spike_classification(source);
        }

        if classification == SourceType::Unknown {
            classification = self.cosmic_stellar_classification(source);
        }

        if classification == SourceType::Cosmic
            && self.config.first_line_cosmic_veto
            && self.peaks_on_first_line(source)
        {
            classification = SourceType::Unknown;
        }

        classification
    }
}
