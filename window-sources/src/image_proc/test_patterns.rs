//! Synthetic sample windows for validating detection and classification.
//!
//! Patterns are built on an `(al, ac)` grid and composed by adding
//! features onto a background.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, NormalError};

/// Gaussian background noise around a constant level
///
/// # Arguments
/// * `shape` - `(al, ac)` samples
/// * `level` - Mean background level [e-]
/// * `sigma` - Noise standard deviation [e-]
/// * `seed` - Random seed for reproducible output
///
/// # Returns
/// `NormalError::BadVariance` when `sigma` is negative or not finite
pub fn noisy_background(shape: (usize, usize), level: f64, sigma: f64, seed: u64) -> Result<Array2<f32>, NormalError> {
    // rand_distr accepts a negative standard deviation and mirrors the samples
    if !(sigma >= 0.0 && sigma.is_finite()) {
        return Err(NormalError::BadVariance);
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(level, sigma)?;
    Ok(Array2::from_shape_fn(shape, |_| normal.sample(&mut rng) as f32))
}

/// Add a circular Gaussian profile
///
/// # Arguments
/// * `samples` - Grid to add into
/// * `centre` - `(al, ac)` centre in sample coordinates, may be fractional
/// * `sigma` - Profile width in samples
/// * `amplitude` - Peak value added at the centre [e-]
pub fn add_gaussian_star(samples: &mut Array2<f32>, centre: (f64, f64), sigma: f64, amplitude: f64) {
    let two_var = 2.0 * sigma * sigma;
    for ((al, ac), level) in samples.indexed_iter_mut() {
        let d_al = al as f64 - centre.0;
        let d_ac = ac as f64 - centre.1;
        *level += (amplitude * (-(d_al * d_al + d_ac * d_ac) / two_var).exp()) as f32;
    }
}

/// Add charge to a single sample, as a cosmic-ray hit would
pub fn add_point_hit(samples: &mut Array2<f32>, al: usize, ac: usize, level: f64) {
    if let Some(s) = samples.get_mut((al, ac)) {
        *s += level as f32;
    }
}

/// Add a straight streak of constant level
///
/// Every sample the segment passes through is raised to at least
/// `background + level`, so crossings are not double counted.
///
/// # Arguments
/// * `start` - `(al, ac)` start of the streak
/// * `angle` - Direction in radians from the AL axis towards AC
/// * `length` - Length in samples
/// * `background` - Level the streak sits on
/// * `level` - Height of the streak above background
pub fn add_line(
    samples: &mut Array2<f32>,
    start: (f64, f64),
    angle: f64,
    length: f64,
    background: f64,
    level: f64,
) {
    let (dir_ac, dir_al) = angle.sin_cos();
    let steps = (length * 4.0).ceil() as usize;
    let target = (background + level) as f32;
    for i in 0..=steps {
        let t = length * i as f64 / steps.max(1) as f64;
        let al = (start.0 + t * dir_al).round();
        let ac = (start.1 + t * dir_ac).round();
        if al < 0.0 || ac < 0.0 {
            continue;
        }
        if let Some(s) = samples.get_mut((al as usize, ac as usize)) {
            *s = s.max(target);
        }
    }
}
