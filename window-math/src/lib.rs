//! window-math - Numerical helpers for window source extraction
//!
//! This crate provides the small numerical kernels used when segmenting and
//! characterising sources in scanning-instrument sample windows:
//!
//! - **Statistics** - NaN-tolerant median, lowest-n selection, RMS about a centre
//! - **Matrix** - Closed-form eigenvalues and major-axis orientation of symmetric 2x2 matrices
//!
//! # Example
//!
//! ```text
//! use window_math::{symmetric, symmetric_eigenvalues, major_axis_orientation};
//!
//! let dispersion = symmetric(1.0, 0.0, 12.0);
//! let eig = symmetric_eigenvalues(&dispersion)?;
//! let orientation = major_axis_orientation(&dispersion, eig.major); // 0.0, along AL
//! ```

pub mod matrix2;
pub mod stats;

pub use matrix2::{
    major_axis_orientation, symmetric, symmetric_eigenvalues, ComplexEigenvaluesError, EigenPair,
};
pub use stats::{lowest, median, rms_about, EmptySampleError};
