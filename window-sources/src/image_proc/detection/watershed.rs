//! Watershed region growing.
//!
//! Samples are visited brightest first. Every unlabelled sample above the
//! detection threshold seeds a new basin, which then floods outwards through
//! the neighbourhood, always expanding from its brightest queued sample.
//! A neighbour joins the basin when the level falls (or stays level) going
//! to it, or when the rise is within the Poisson noise of the two samples:
//!
//! ```text
//! Δ = n - s,   σ = sqrt((n - bkg) + (s - bkg)),   join if Δ <= 0 or Δ < k·σ
//! ```
//!
//! Basins may overlap while flooding. A cell reached by more than one basin
//! sits on a ridge between sources and is given to none of them.

use super::SegmentationMethod;
use crate::geometry::WindowGeometry;
use crate::image_proc::background::BackgroundEstimate;
use crate::image_proc::neighbourhood::Neighbourhood;
use crate::sample::Sample;
use crate::source::Source;
use ndarray::ArrayView2;
use std::collections::VecDeque;

/// Watershed segmentation with configurable detection and connectivity levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Watershed {
    /// Detection threshold above background, in units of background error
    pub detection_sigmas: f64,
    /// Tolerated upward step, in units of combined Poisson sigma
    pub connectivity_sigmas: f64,
}

impl Default for Watershed {
    fn default() -> Self {
        Self {
            detection_sigmas: 10.0,
            connectivity_sigmas: 2.0,
        }
    }
}

/// Build the raster-ordered sample list and geometry of a grid
pub(crate) fn grid_samples(
    samples: &ArrayView2<f32>,
    al_sample_size: usize,
    ac_sample_size: usize,
) -> (WindowGeometry, Vec<Sample>) {
    let (al_len, ac_len) = samples.dim();
    let geometry = WindowGeometry::new(al_len, ac_len, al_sample_size, ac_sample_size);
    let grid = samples
        .indexed_iter()
        .map(|((al, ac), &level)| Sample::new(al, ac, level as f64))
        .collect();
    (geometry, grid)
}

impl Watershed {
    pub fn new(detection_sigmas: f64, connectivity_sigmas: f64) -> Self {
        Self {
            detection_sigmas,
            connectivity_sigmas,
        }
    }

    /// Whether `neighbour` belongs to the same basin as `current`
    fn joins(&self, current: &Sample, neighbour: &Sample, background: f64) -> bool {
        let diff = neighbour.level - current.level;
        if diff <= 0.0 {
            return true;
        }
        let one_sigma = (neighbour.flux(background) + current.flux(background)).sqrt();
        diff < self.connectivity_sigmas * one_sigma
    }

    /// Split a sample grid into disjoint sources
    ///
    /// # Arguments
    /// * `samples` - Sample levels, shape `(al, ac)`
    /// * `al_sample_size` - Pixels per sample along-scan
    /// * `ac_sample_size` - Pixels per sample across-scan
    /// * `background` - Background level and error of the grid
    ///
    /// # Returns
    /// One source per basin, in the order the basins were seeded. Basins whose
    /// every cell was contested come back empty.
    pub fn segment(
        &self,
        samples: &ArrayView2<f32>,
        al_sample_size: usize,
        ac_sample_size: usize,
        background: &BackgroundEstimate,
    ) -> Vec<Source> {
        let (geometry, grid) = grid_samples(samples, al_sample_size, ac_sample_size);
        let neighbourhood = Neighbourhood::for_geometry(geometry);
        let threshold = background.threshold(self.detection_sigmas);
        let detectable = |s: &Sample| s.level > threshold;

        let mut order = grid.clone();
        order.sort_by(Sample::by_descending_level);

        // Labels of every basin that has reached each cell
        let mut labels: Vec<Vec<usize>> = vec![Vec::new(); grid.len()];
        let mut basin_count = 0;

        for seed in &order {
            let seed_index = geometry.index(seed.al, seed.ac);
            if !detectable(seed) || !labels[seed_index].is_empty() {
                continue;
            }

            let label = basin_count;
            basin_count += 1;
            labels[seed_index].push(label);

            let mut queue = VecDeque::from([*seed]);
            while let Some(current) = queue.pop_front() {
                let mut candidates: Vec<Sample> = neighbourhood
                    .neighbours(current.al, current.ac)
                    .filter(|&(al, ac)| !labels[geometry.index(al, ac)].contains(&label))
                    .map(|(al, ac)| grid[geometry.index(al, ac)])
                    .collect();
                candidates.sort_by(Sample::by_descending_level);

                for neighbour in candidates {
                    if neighbour.level <= threshold {
                        break;
                    }
                    if self.joins(&current, &neighbour, background.level) {
                        labels[geometry.index(neighbour.al, neighbour.ac)].push(label);
                        queue.push_back(neighbour);
                    }
                }

                queue.make_contiguous().sort_by(Sample::by_descending_level);
            }
        }

        let mut sources: Vec<Source> = (0..basin_count).map(|_| Source::new(geometry)).collect();
        let mut contested = 0;
        for (sample, cell_labels) in grid.iter().zip(labels.iter()) {
            match cell_labels.as_slice() {
                [label] => sources[*label].push(*sample),
                [] => {}
                _ => contested += 1,
            }
        }

        log::debug!(
            "{:?}: {} basins above {:.2} in {}x{} grid, {} contested samples",
            SegmentationMethod::Watershed,
            basin_count,
            threshold,
            geometry.al_samples,
            geometry.ac_samples,
            contested
        );

        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn unit_background() -> BackgroundEstimate {
        BackgroundEstimate::new(0.0, 1.0)
    }

    fn assert_disjoint(sources: &[Source]) {
        for (i, a) in sources.iter().enumerate() {
            for b in sources.iter().skip(i + 1) {
                for s in a.samples() {
                    assert!(!b.contains(s), "sample {s:?} in two sources");
                }
            }
        }
    }

    #[test]
    fn test_flat_window_has_no_sources() {
        let grid = Array2::from_elem((8, 8), 5.0f32);
        let sources = Watershed::default().segment(&grid.view(), 1, 1, &unit_background());
        assert!(sources.is_empty());
    }

    #[test]
    fn test_single_bright_sample() {
        let mut grid = Array2::zeros((8, 8));
        grid[[3, 4]] = 5000.0f32;
        let sources = Watershed::default().segment(&grid.view(), 1, 1, &unit_background());

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].len(), 1);
        assert_eq!(sources[0].samples()[0], Sample::new(3, 4, 5000.0));
    }

    #[test]
    fn test_equal_level_run_is_one_source() {
        // AL extent 3, AC extent 1: three equal samples in a column
        let grid = array![[200.0f32], [200.0], [200.0]];
        let sources = Watershed::default().segment(&grid.view(), 1, 1, &unit_background());

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].len(), 3);
    }

    #[test]
    fn test_separated_blobs_are_two_sources() {
        let mut grid = Array2::zeros((7, 7));
        grid[[1, 1]] = 900.0f32;
        grid[[1, 2]] = 600.0;
        grid[[5, 5]] = 800.0;
        grid[[5, 4]] = 500.0;

        let sources = Watershed::default().segment(&grid.view(), 1, 1, &unit_background());
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].len(), 2);
        assert_eq!(sources[1].len(), 2);
        assert_disjoint(&sources);

        // Brightest basin is seeded first
        assert!(sources[0].contains(&Sample::new(1, 1, 900.0)));
        assert!(sources[1].contains(&Sample::new(5, 5, 800.0)));
    }

    #[test]
    fn test_small_rise_within_noise_is_joined() {
        // From 300 the rise to 310 is inside 2 sigma = 2*sqrt(610)
        let grid = array![[1000.0f32, 300.0, 310.0]];
        let sources = Watershed::default().segment(&grid.view(), 1, 1, &unit_background());
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].len(), 3);
    }

    #[test]
    fn test_contested_ridge_is_dropped() {
        // Two peaks in a 1D strip with a bright saddle; the saddle is reached
        // by both basins and assigned to neither.
        let grid = array![[1000.0f32, 300.0, 900.0]];
        let sources = Watershed::default().segment(&grid.view(), 1, 1, &unit_background());

        assert_eq!(sources.len(), 2);
        assert_disjoint(&sources);
        let assigned: usize = sources.iter().map(|s| s.len()).sum();
        assert_eq!(assigned, 2);
        assert!(sources.iter().all(|s| !s.contains(&Sample::new(0, 1, 300.0))));
    }

    #[test]
    fn test_faint_shoulder_joins_brighter_peak() {
        // The peak floods the shoulder before the shoulder could seed a basin
        let mut grid = Array2::zeros((5, 5));
        grid[[2, 2]] = 10000.0f32;
        grid[[2, 3]] = 50.0;
        let sources = Watershed::default().segment(&grid.view(), 1, 1, &unit_background());
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].len(), 2);
    }

    #[test]
    fn test_assigned_samples_exceed_threshold() {
        let mut grid = Array2::from_elem((6, 6), 10.0f32);
        grid[[2, 2]] = 300.0;
        grid[[2, 3]] = 150.0;
        grid[[3, 3]] = 18.0;
        let bkg = BackgroundEstimate::new(10.0, 1.0);
        let sources = Watershed::default().segment(&grid.view(), 1, 1, &bkg);

        let threshold = bkg.threshold(10.0);
        for source in &sources {
            for s in source.samples() {
                assert!(s.level > threshold);
            }
        }
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].len(), 2);
    }

    #[test]
    fn test_nan_background_detects_nothing() {
        let grid = array![[1000.0f32, 2.0], [3.0, 4.0]];
        let bkg = BackgroundEstimate::new(f64::NAN, f64::NAN);
        assert!(Watershed::default().segment(&grid.view(), 1, 1, &bkg).is_empty());
    }

    #[test]
    fn test_sources_carry_geometry() {
        let mut grid = Array2::zeros((4, 6));
        grid[[1, 1]] = 800.0f32;
        let sources = Watershed::default().segment(&grid.view(), 2, 2, &unit_background());
        let g = sources[0].geometry();
        assert_eq!((g.al_samples, g.ac_samples), (4, 6));
        assert!(g.has_binning(2, 2));
    }
}
