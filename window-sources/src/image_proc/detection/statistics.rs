//! Flux and shape statistics of segmented sources
//!
//! These are the features the classifiers work from:
//!
//! - **Flux**: integrated background-subtracted flux, the peak sample's flux,
//!   and the ratio of the peak to the median flux of the samples around it.
//!   Cosmic rays deposit charge in one or two samples and show a very high
//!   ratio; stars are smoothed by the PSF.
//! - **Shape**: the flux-weighted dispersion matrix of sample positions in
//!   pixel units, its eigenvalues and the angle of its major axis from the AL
//!   direction. Diffraction spikes are long and thin along a fixed direction.
//!
//! Neighbours of the peak are always read from the raw grid, whether or not
//! they were assigned to the source, so a one-sample cosmic still has a
//! meaningful ratio and dispersion.

use crate::image_proc::neighbourhood::Neighbourhood;
use crate::sample::Sample;
use crate::source::Source;
use nalgebra::Matrix2;
use ndarray::ArrayView2;
use window_math::{major_axis_orientation, median, symmetric, symmetric_eigenvalues, EigenPair};

/// Flux statistics of one source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluxStatistics {
    /// Sum of background-subtracted member levels [e-]
    pub flux: f64,
    /// Background-subtracted level of the brightest member [e-]
    pub peak_flux: f64,
    /// Peak flux over the median flux of its grid neighbours
    pub flux_ratio: f64,
}

/// Shape statistics of one source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeStatistics {
    /// Flux-weighted centroid across-scan [pixels]
    pub centroid_ac: f64,
    /// Flux-weighted centroid along-scan [pixels]
    pub centroid_al: f64,
    /// `[[AC-AC, AC-AL], [AC-AL, AL-AL]]` second moments [pixels²]
    pub dispersion: Matrix2<f64>,
    pub eigenvalues: EigenPair,
    /// Major axis angle from the AL direction [rad]
    pub orientation: f64,
}

impl ShapeStatistics {
    fn undefined() -> Self {
        Self {
            centroid_ac: f64::NAN,
            centroid_al: f64::NAN,
            dispersion: Matrix2::from_element(f64::NAN),
            eigenvalues: EigenPair::NAN,
            orientation: f64::NAN,
        }
    }
}

fn grid_level(samples: &ArrayView2<f32>, al: usize, ac: usize) -> f64 {
    samples[[al, ac]] as f64
}

/// Compute the flux statistics of a source
///
/// # Arguments
/// * `source` - Segmented source
/// * `samples` - The full sample grid the source was segmented from
/// * `background` - Background level of the grid
///
/// # Returns
/// Flux 0 with NaN peak and ratio for an empty source. A peak with no grid
/// neighbours (a one-sample window) has a NaN ratio.
pub fn flux_statistics(source: &Source, samples: &ArrayView2<f32>, background: f64) -> FluxStatistics {
    let Some(peak) = source.brightest() else {
        return FluxStatistics {
            flux: 0.0,
            peak_flux: f64::NAN,
            flux_ratio: f64::NAN,
        };
    };

    let flux: f64 = source.samples().iter().map(|s| s.flux(background)).sum();
    let peak_flux = peak.flux(background);

    let neighbourhood = Neighbourhood::for_geometry(*source.geometry());
    let neighbour_fluxes: Vec<f64> = neighbourhood
        .neighbours(peak.al, peak.ac)
        .map(|(al, ac)| grid_level(samples, al, ac) - background)
        .collect();
    let median_neighbour = median(&neighbour_fluxes).unwrap_or(f64::NAN);

    FluxStatistics {
        flux,
        peak_flux,
        flux_ratio: peak_flux / median_neighbour,
    }
}

/// Compute the shape statistics of a source
///
/// The samples used are the peak's grid neighbours followed by every member
/// not already among them.
///
/// # Arguments
/// * `source` - Segmented source
/// * `samples` - The full sample grid the source was segmented from
/// * `background` - Background level of the grid
/// * `reject_negative_eigenvalues` - Report NaN when either eigenvalue is negative
pub fn shape_statistics(
    source: &Source,
    samples: &ArrayView2<f32>,
    background: f64,
    reject_negative_eigenvalues: bool,
) -> ShapeStatistics {
    let Some(peak) = source.brightest() else {
        return ShapeStatistics::undefined();
    };

    let geometry = source.geometry();
    let neighbourhood = Neighbourhood::for_geometry(*geometry);

    let mut working: Vec<Sample> = neighbourhood
        .neighbours(peak.al, peak.ac)
        .map(|(al, ac)| Sample::new(al, ac, grid_level(samples, al, ac)))
        .collect();
    for sample in source.samples() {
        if !working.contains(sample) {
            working.push(*sample);
        }
    }

    let ac_pix = geometry.ac_sample_size as f64;
    let al_pix = geometry.al_sample_size as f64;
    let position = |s: &Sample| (s.ac as f64 * ac_pix, s.al as f64 * al_pix);

    let mut sum_flux = 0.0;
    let mut centroid_ac = 0.0;
    let mut centroid_al = 0.0;
    for s in &working {
        let (x_ac, x_al) = position(s);
        let w = s.flux(background);
        centroid_ac += x_ac * w;
        centroid_al += x_al * w;
        sum_flux += w;
    }
    centroid_ac /= sum_flux;
    centroid_al /= sum_flux;

    let (mut a, mut b, mut c) = (0.0, 0.0, 0.0);
    for s in &working {
        let (x_ac, x_al) = position(s);
        let w = s.flux(background) / sum_flux;
        let d_ac = x_ac - centroid_ac;
        let d_al = x_al - centroid_al;
        a += d_ac * d_ac * w;
        b += d_ac * d_al * w;
        c += d_al * d_al * w;
    }
    let dispersion = symmetric(a, b, c);

    let mut result = ShapeStatistics {
        centroid_ac,
        centroid_al,
        dispersion,
        eigenvalues: EigenPair::NAN,
        orientation: f64::NAN,
    };

    let eigenvalues = match symmetric_eigenvalues(&dispersion) {
        Ok(eig) => eig,
        Err(e) => {
            log::warn!(
                "source with peak at ({}, {}): {}",
                peak.al,
                peak.ac,
                e
            );
            return result;
        }
    };

    if reject_negative_eigenvalues && (eigenvalues.major < 0.0 || eigenvalues.minor < 0.0) {
        log::debug!(
            "rejecting shape of source at ({}, {}): eigenvalues {:.3}, {:.3}",
            peak.al,
            peak.ac,
            eigenvalues.major,
            eigenvalues.minor
        );
        return result;
    }

    result.eigenvalues = eigenvalues;
    result.orientation = major_axis_orientation(&dispersion, eigenvalues.major);
    result
}

/// Attach flux and shape statistics to a source
pub fn compute_source_statistics(
    source: &mut Source,
    samples: &ArrayView2<f32>,
    background: f64,
    reject_negative_eigenvalues: bool,
) {
    let flux = flux_statistics(source, samples, background);
    let shape = shape_statistics(source, samples, background, reject_negative_eigenvalues);

    source.flux = flux.flux;
    source.peak_flux = flux.peak_flux;
    source.flux_ratio = flux.flux_ratio;
    source.eigenvalues = shape.eigenvalues;
    source.orientation = shape.orientation;
}
