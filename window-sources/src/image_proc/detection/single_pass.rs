//! Single-pass descending segmentation.
//!
//! A cheaper alternative to [`super::watershed`]. Samples above threshold
//! are visited once, brightest first. A sample touching no labelled cell
//! starts a new source, a sample touching exactly one source joins it, and a
//! sample touching two or more sources is a boundary and is left out.
//! There is no noise tolerance on upward steps: every sample is judged only
//! by the labels already around it.

use super::watershed::grid_samples;
use crate::image_proc::background::BackgroundEstimate;
use crate::image_proc::neighbourhood::Neighbourhood;
use crate::sample::Sample;
use crate::source::Source;
use ndarray::ArrayView2;

/// Split a sample grid into sources in a single descending sweep
///
/// # Arguments
/// * `samples` - Sample levels, shape `(al, ac)`
/// * `al_sample_size`, `ac_sample_size` - Pixels per sample on each axis
/// * `background` - Background level and error of the grid
/// * `detection_sigmas` - Detection threshold in units of background error
pub fn segment_single_pass(
    samples: &ArrayView2<f32>,
    al_sample_size: usize,
    ac_sample_size: usize,
    background: &BackgroundEstimate,
    detection_sigmas: f64,
) -> Vec<Source> {
    let (geometry, grid) = grid_samples(samples, al_sample_size, ac_sample_size);
    let neighbourhood = Neighbourhood::for_geometry(geometry);
    let threshold = background.threshold(detection_sigmas);

    let mut order = grid;
    order.sort_by(Sample::by_descending_level);

    let mut labels: Vec<Option<usize>> = vec![None; order.len()];
    let mut sources: Vec<Source> = Vec::new();

    for sample in order.iter().filter(|s| s.level > threshold) {
        let mut touching: Vec<usize> = Vec::with_capacity(2);
        for (al, ac) in neighbourhood.neighbours(sample.al, sample.ac) {
            if let Some(label) = labels[geometry.index(al, ac)] {
                if !touching.contains(&label) {
                    touching.push(label);
                }
            }
        }

        let index = geometry.index(sample.al, sample.ac);
        match touching.as_slice() {
            [] => {
                labels[index] = Some(sources.len());
                let mut source = Source::new(geometry);
                source.push(*sample);
                sources.push(source);
            }
            [label] => {
                labels[index] = Some(*label);
                sources[*label].push(*sample);
            }
            _ => {}
        }
    }

    log::debug!(
        "single pass: {} sources above {:.2} in {}x{} grid",
        sources.len(),
        threshold,
        geometry.al_samples,
        geometry.ac_samples
    );

    sources
}
