//! Symmetric 2x2 eigen-analysis using nalgebra
//!
//! Dispersion matrices of window sources are laid out as
//!
//! ```text
//! [ a  b ]    a = AC-AC moment
//! [ b  c ]    b = AC-AL moment, c = AL-AL moment
//! ```
//!
//! The eigenvalues come from the closed form `tr/2 ± sqrt(tr²/4 - det)`,
//! which is exact for small integer-like moments and keeps the branch on a
//! negative discriminant explicit.

use nalgebra::Matrix2;
use thiserror::Error;

/// Error when a matrix expected to be symmetric has complex eigenvalues
#[derive(Error, Debug, Clone, PartialEq)]
#[error("complex eigenvalues: discriminant={discriminant:.6e}")]
pub struct ComplexEigenvaluesError {
    /// The (negative) value of tr²/4 - det
    pub discriminant: f64,
}

/// Relative tolerance below which a negative discriminant is rounding noise
const DISCRIMINANT_EPSILON: f64 = 1e-12;

/// Eigenvalues of a symmetric 2x2 matrix, largest first
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenPair {
    pub major: f64,
    pub minor: f64,
}

impl EigenPair {
    /// Both eigenvalues NaN, used when a dispersion is undefined
    pub const NAN: EigenPair = EigenPair {
        major: f64::NAN,
        minor: f64::NAN,
    };

    /// Ratio of the largest to the smallest eigenvalue
    pub fn ratio(&self) -> f64 {
        self.major / self.minor
    }

    pub fn is_nan(&self) -> bool {
        self.major.is_nan() || self.minor.is_nan()
    }
}

/// Build the symmetric matrix `[[a, b], [b, c]]`
pub fn symmetric(a: f64, b: f64, c: f64) -> Matrix2<f64> {
    Matrix2::new(a, b, b, c)
}

/// Compute the eigenvalues of a symmetric 2x2 matrix
///
/// # Arguments
/// * `matrix` - Symmetric matrix; only the trace and determinant are used
///
/// # Returns
/// * `Ok(EigenPair)` - Eigenvalues with `major >= minor`
/// * `Err(ComplexEigenvaluesError)` - If `tr²/4 - det` is negative beyond rounding
pub fn symmetric_eigenvalues(matrix: &Matrix2<f64>) -> Result<EigenPair, ComplexEigenvaluesError> {
    let half_trace = matrix.trace() / 2.0;
    let det = matrix.determinant();
    let mut discriminant = half_trace * half_trace - det;

    if discriminant < 0.0 {
        let scale = (half_trace * half_trace).max(det.abs()).max(f64::MIN_POSITIVE);
        if -discriminant <= DISCRIMINANT_EPSILON * scale {
            discriminant = 0.0;
        } else {
            return Err(ComplexEigenvaluesError { discriminant });
        }
    }

    let root = discriminant.sqrt();
    Ok(EigenPair {
        major: half_trace + root,
        minor: half_trace - root,
    })
}

/// Angle of the major eigenvector measured from the AL axis, in [0, π/2]
///
/// The eigenvector is reflected into the first quadrant, so the sign of the
/// off-diagonal term is discarded. With no off-diagonal term the major axis
/// lies along AC when `a > c` and along AL otherwise.
///
/// # Arguments
/// * `matrix` - Symmetric dispersion matrix
/// * `major` - Largest eigenvalue of `matrix`
pub fn major_axis_orientation(matrix: &Matrix2<f64>, major: f64) -> f64 {
    let a = matrix[(0, 0)];
    let b = matrix[(0, 1)];
    let c = matrix[(1, 1)];

    if major.is_nan() || a.is_nan() || b.is_nan() || c.is_nan() {
        return f64::NAN;
    }

    if b == 0.0 {
        return if a > c { std::f64::consts::FRAC_PI_2 } else { 0.0 };
    }

    // (a - λ) v_ac + b v_al = 0  =>  v = (b, λ - a) in (AC, AL)
    let v_ac = b.abs();
    let v_al = (major - a).abs();
    v_ac.atan2(v_al)
}
