//! Window-level detection facade.
//!
//! Ties together background estimation, segmentation, source statistics and
//! faint-source culling, and optionally hands each surviving source to a
//! classifier. Callers never see which segmentation or classifier is in use.

use super::single_pass::segment_single_pass;
use super::statistics::compute_source_statistics;
use super::watershed::Watershed;
use super::SegmentationMethod;
use crate::classify::SourceClassifier;
use crate::config::DetectionConfig;
use crate::image_proc::background::{estimate_window_background, BackgroundEstimate};
use crate::report::TypeCounts;
use crate::source::Source;
use crate::window::Window;
use ndarray::ArrayView2;
use std::time::Instant;

/// Extracts sources from sample windows
#[derive(Debug, Clone, Default)]
pub struct SourceDetector {
    config: DetectionConfig,
}

impl SourceDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Detect sources in a window using its own local background
    ///
    /// Each returned source carries the window's observation time. Sources
    /// are in segmentation order and are not yet classified.
    pub fn detect(&self, window: &Window) -> Vec<Source> {
        let view = window.samples_view();
        let background = estimate_window_background(&view);
        let mut sources = self.detect_with_background(
            &view,
            window.al_sample_size,
            window.ac_sample_size,
            &background,
        );
        for source in &mut sources {
            source.obs_time = window.obs_time;
        }
        sources
    }

    /// Detect sources in a sample grid with a caller-supplied background
    ///
    /// # Arguments
    /// * `samples` - Sample levels, shape `(al, ac)`
    /// * `al_sample_size`, `ac_sample_size` - Pixels per sample on each axis
    /// * `background` - Background level and error
    ///
    /// # Returns
    /// Sources with integrated flux strictly above the faint-source floor,
    /// with flux and shape statistics attached
    pub fn detect_with_background(
        &self,
        samples: &ArrayView2<f32>,
        al_sample_size: usize,
        ac_sample_size: usize,
        background: &BackgroundEstimate,
    ) -> Vec<Source> {
        let start = Instant::now();

        let mut sources = match self.config.segmentation {
            SegmentationMethod::Watershed => {
                Watershed::new(self.config.detection_sigmas, self.config.connectivity_sigmas)
                    .segment(samples, al_sample_size, ac_sample_size, background)
            }
            SegmentationMethod::SinglePass => segment_single_pass(
                samples,
                al_sample_size,
                ac_sample_size,
                background,
                self.config.detection_sigmas,
            ),
        };

        for source in &mut sources {
            compute_source_statistics(
                source,
                samples,
                background.level,
                self.config.reject_negative_eigenvalues,
            );
        }

        let segmented = sources.len();
        sources.retain(|s| s.flux > self.config.faint_source_flux);

        log::debug!(
            "detected {} sources ({} culled below {:.0} e-) on background {:.2} +/- {:.2} in {:?}",
            sources.len(),
            segmented - sources.len(),
            self.config.faint_source_flux,
            background.level,
            background.error,
            start.elapsed()
        );

        sources
    }

    /// Detect and classify the sources of a window, attaching them to it
    ///
    /// Any sources previously attached to the window are replaced.
    ///
    /// # Returns
    /// Number of sources of each type found in the window
    pub fn detect_and_classify(&self, window: &mut Window, classifier: &dyn SourceClassifier) -> TypeCounts {
        let mut sources = self.detect(window);
        for source in &mut sources {
            source.source_type = classifier.classify(source);
        }
        let counts = TypeCounts::from_sources(&sources);
        window.sources = sources;
        counts
    }
}
