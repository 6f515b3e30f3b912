//! Detected sources and their classification labels.
//!
//! A [`Source`] is created empty by segmentation, filled with member samples
//! while its basin grows, given flux and shape statistics afterwards, and
//! finally labelled with a [`SourceType`] by a classifier.

use crate::geometry::WindowGeometry;
use crate::sample::Sample;
use serde::{Deserialize, Serialize};
use std::fmt;
use window_math::EigenPair;

/// Semantic class of a source
///
/// The discriminant is the byte stored in source records, so the variant
/// order is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum SourceType {
    Stellar = 0,
    Cosmic = 1,
    SpikeAl = 2,
    SpikeAc = 3,
    SpikeDiagonal = 4,
    Unknown = 5,
}

impl SourceType {
    /// All types in ordinal order
    pub const ALL: [SourceType; 6] = [
        SourceType::Stellar,
        SourceType::Cosmic,
        SourceType::SpikeAl,
        SourceType::SpikeAc,
        SourceType::SpikeDiagonal,
        SourceType::Unknown,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<SourceType> {
        Self::ALL.get(ordinal as usize).copied()
    }

    pub fn is_spike(self) -> bool {
        matches!(
            self,
            SourceType::SpikeAl | SourceType::SpikeAc | SourceType::SpikeDiagonal
        )
    }

    /// Short human-readable description
    pub fn description(self) -> &'static str {
        match self {
            SourceType::Stellar => "A normal stellar source",
            SourceType::Cosmic => "A cosmic ray",
            SourceType::SpikeAl => "A diffraction spike in the AL direction",
            SourceType::SpikeAc => "A diffraction spike in the AC direction",
            SourceType::SpikeDiagonal => "A diffraction spike in a diagonal direction",
            SourceType::Unknown => "An unknown source type",
        }
    }

    /// Upper-case label used in reports and text dumps
    pub fn label(self) -> &'static str {
        match self {
            SourceType::Stellar => "STELLAR",
            SourceType::Cosmic => "COSMIC",
            SourceType::SpikeAl => "SPIKE_AL",
            SourceType::SpikeAc => "SPIKE_AC",
            SourceType::SpikeDiagonal => "SPIKE_DIAGONAL",
            SourceType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceType::ALL
            .iter()
            .copied()
            .find(|t| t.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown source type: {s}"))
    }
}

/// A connected region of samples believed to be one physical object or artifact
#[derive(Debug, Clone)]
pub struct Source {
    samples: Vec<Sample>,
    geometry: WindowGeometry,

    /// Integrated background-subtracted flux [e-]
    pub flux: f64,
    /// Background-subtracted level of the brightest member [e-]
    pub peak_flux: f64,
    /// Peak flux over the median flux of the samples surrounding the peak
    pub flux_ratio: f64,
    /// Eigenvalues of the flux-weighted dispersion matrix [pixels²]
    pub eigenvalues: EigenPair,
    /// Major axis angle from the AL direction, in [0, π/2] radians
    pub orientation: f64,
    /// Observation time of the parent window
    pub obs_time: f64,
    pub source_type: SourceType,
}

impl Source {
    /// Create an empty source belonging to a window of the given geometry
    pub fn new(geometry: WindowGeometry) -> Self {
        Self {
            samples: Vec::new(),
            geometry,
            flux: 0.0,
            peak_flux: f64::NAN,
            flux_ratio: f64::NAN,
            eigenvalues: EigenPair::NAN,
            orientation: f64::NAN,
            obs_time: 0.0,
            source_type: SourceType::Unknown,
        }
    }

    pub fn geometry(&self) -> &WindowGeometry {
        &self.geometry
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn contains(&self, sample: &Sample) -> bool {
        self.samples.contains(sample)
    }

    pub fn is_1d(&self) -> bool {
        self.geometry.is_1d()
    }

    /// Sort member samples brightest first
    pub fn sort_by_level(&mut self) {
        self.samples.sort_by(Sample::by_descending_level);
    }

    /// The brightest member; on equal levels the earliest member wins
    pub fn brightest(&self) -> Option<&Sample> {
        let mut iter = self.samples.iter();
        let first = iter.next()?;
        Some(iter.fold(first, |best, s| if s.level > best.level { s } else { best }))
    }

    /// Ratio of the largest to the smallest dispersion eigenvalue
    pub fn eigenvalue_ratio(&self) -> f64 {
        self.eigenvalues.ratio()
    }
}

/// Tab-separated statistics line: flux, peak, ratio, eigenvalues, orientation, type
impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.flux,
            self.peak_flux,
            self.flux_ratio,
            self.eigenvalues.major,
            self.eigenvalues.minor,
            self.orientation,
            self.source_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ordinals_are_stable() {
        for (i, t) in SourceType::ALL.iter().enumerate() {
            assert_eq!(t.ordinal() as usize, i);
            assert_eq!(SourceType::from_ordinal(i as u8), Some(*t));
        }
        assert_eq!(SourceType::from_ordinal(6), None);
        assert_eq!(SourceType::SpikeDiagonal.ordinal(), 4);
    }

    #[test]
    fn test_type_labels_round_trip() {
        for t in SourceType::ALL {
            assert_eq!(t.to_string().parse::<SourceType>().unwrap(), t);
            assert!(!t.description().is_empty());
        }
        assert_eq!("spike_ac".parse::<SourceType>().unwrap(), SourceType::SpikeAc);
        assert!("nebula".parse::<SourceType>().is_err());
    }

    #[test]
    fn test_new_source_is_unknown_and_empty() {
        let source = Source::new(WindowGeometry::new(12, 12, 1, 1));
        assert!(source.is_empty());
        assert_eq!(source.source_type, SourceType::Unknown);
        assert!(source.eigenvalues.is_nan());
        assert!(source.brightest().is_none());
    }

    #[test]
    fn test_brightest_prefers_first_on_ties() {
        let mut source = Source::new(WindowGeometry::new(3, 3, 1, 1));
        source.push(Sample::new(0, 0, 4.0));
        source.push(Sample::new(1, 1, 9.0));
        source.push(Sample::new(2, 2, 9.0));
        let peak = source.brightest().unwrap();
        assert_eq!((peak.al, peak.ac), (1, 1));
    }

    #[test]
    fn test_sort_by_level() {
        let mut source = Source::new(WindowGeometry::new(3, 3, 1, 1));
        source.push(Sample::new(0, 0, 1.0));
        source.push(Sample::new(0, 1, 3.0));
        source.push(Sample::new(0, 2, 2.0));
        source.sort_by_level();
        assert_eq!(source.samples()[0].level, 3.0);
        assert_eq!(source.samples()[2].level, 1.0);
    }

    #[test]
    fn test_display_is_tab_separated() {
        let mut source = Source::new(WindowGeometry::new(3, 3, 1, 1));
        source.flux = 120.0;
        source.source_type = SourceType::Cosmic;
        let line = source.to_string();
        assert_eq!(line.split('\t').count(), 7);
        assert!(line.starts_with("120\t"));
        assert!(line.ends_with("COSMIC"));
    }
}
