//! Window extent and binning.

/// Extent of a window in samples, and the number of CCD pixels binned into
/// each sample along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowGeometry {
    /// Samples along-scan
    pub al_samples: usize,
    /// Samples across-scan
    pub ac_samples: usize,
    /// Pixels per sample along-scan
    pub al_sample_size: usize,
    /// Pixels per sample across-scan
    pub ac_sample_size: usize,
}

impl WindowGeometry {
    pub fn new(al_samples: usize, ac_samples: usize, al_sample_size: usize, ac_sample_size: usize) -> Self {
        Self {
            al_samples,
            ac_samples,
            al_sample_size,
            ac_sample_size,
        }
    }

    /// Total number of samples in the window
    pub fn sample_count(&self) -> usize {
        self.al_samples * self.ac_samples
    }

    /// True when the window is a single row or column of samples
    pub fn is_1d(&self) -> bool {
        self.al_samples == 1 || self.ac_samples == 1
    }

    /// True when the sample binning matches `al x ac` pixels
    pub fn has_binning(&self, al: usize, ac: usize) -> bool {
        self.al_sample_size == al && self.ac_sample_size == ac
    }

    /// Flat index of a cell, AC varying fastest
    pub fn index(&self, al: usize, ac: usize) -> usize {
        al * self.ac_samples + ac
    }

    pub fn contains(&self, al: isize, ac: isize) -> bool {
        al >= 0 && ac >= 0 && (al as usize) < self.al_samples && (ac as usize) < self.ac_samples
    }
}
