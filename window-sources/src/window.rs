//! Sample windows read out around detected objects.
//!
//! Samples are stored AL-major in an `Array2<f32>` of shape `(al, ac)`, so
//! the across-scan index varies fastest, matching the on-disk layout.

use crate::geometry::WindowGeometry;
use crate::sample::Sample;
use crate::source::Source;
use ndarray::{Array2, ArrayView2};

/// Human-readable names of CCD strips, indexed by strip number
pub const STRIP_NAMES: [&str; 13] = [
    "", "BAM/WFS", "SM1", "SM2", "AF1", "AF2", "AF3", "AF4", "AF5", "AF6", "AF7", "AF8", "AF9",
];

/// Human-readable names of CCD gates, indexed by gate number
pub const GATE_NAMES: [&str; 13] = [
    "NOGATE", "GATE1", "GATE2", "GATE3", "GATE4", "GATE5", "GATE6", "GATE7", "GATE8", "GATE9",
    "GATE10", "GATE11", "GATE12",
];

/// A window of samples plus the instrument metadata it was captured with
#[derive(Debug, Clone)]
pub struct Window {
    /// Field of view (0 or 1)
    pub fov: u8,
    /// CCD row
    pub ccd_row: u8,
    /// CCD strip
    pub ccd_strip: u8,
    /// AC coordinate of the window on the CCD
    pub ac_window_coord: i16,
    /// Active gate number
    pub gate: u8,
    pub transit_id: i64,
    /// On-board mission time of the observation
    pub obs_time: f64,
    /// Integration time [s]
    pub integration_time: f64,
    /// Pixels per sample along-scan
    pub al_sample_size: usize,
    /// Pixels per sample across-scan
    pub ac_sample_size: usize,
    /// Sample levels [e-], shape `(al, ac)`
    pub samples: Array2<f32>,
    /// Sources extracted from this window, empty until processed
    pub sources: Vec<Source>,
}

impl Window {
    /// Create a window with zeroed metadata
    pub fn new(samples: Array2<f32>, al_sample_size: usize, ac_sample_size: usize) -> Self {
        Self {
            fov: 0,
            ccd_row: 0,
            ccd_strip: 0,
            ac_window_coord: 0,
            gate: 0,
            transit_id: 0,
            obs_time: 0.0,
            integration_time: 0.0,
            al_sample_size,
            ac_sample_size,
            samples,
            sources: Vec::new(),
        }
    }

    pub fn geometry(&self) -> WindowGeometry {
        let (al, ac) = self.samples.dim();
        WindowGeometry::new(al, ac, self.al_sample_size, self.ac_sample_size)
    }

    pub fn samples_view(&self) -> ArrayView2<'_, f32> {
        self.samples.view()
    }

    /// Every sample of the window in raster order
    pub fn iter_samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.samples
            .indexed_iter()
            .map(|((al, ac), &level)| Sample::new(al, ac, level as f64))
    }

    pub fn strip_name(&self) -> &'static str {
        STRIP_NAMES.get(self.ccd_strip as usize).copied().unwrap_or("")
    }

    pub fn gate_name(&self) -> &'static str {
        GATE_NAMES.get(self.gate as usize).copied().unwrap_or("")
    }

    /// Device label of the form `FOV1_ROW3_AF2`
    pub fn device_label(&self) -> String {
        format!(
            "FOV{}_ROW{}_{}",
            self.fov as u16 + 1,
            self.ccd_row,
            self.strip_name().replace('/', "-")
        )
    }
}
