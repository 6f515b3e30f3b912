//! Robust statistics for small sample sets
//!
//! Windows are small (a handful to a few hundred samples), so every function
//! here sorts a private copy and works on the full set. NaN inputs are
//! filtered before ranking; infinities are kept.

use thiserror::Error;

/// Error raised when a statistic has no finite-or-infinite input to work on
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot compute {statistic}: {total} values given, 0 valid (all NaN or empty)")]
pub struct EmptySampleError {
    /// Name of the statistic that was requested
    pub statistic: &'static str,
    /// Number of values handed in before NaN filtering
    pub total: usize,
}

fn sorted_valid(values: &[f64]) -> Vec<f64> {
    let mut valid: Vec<f64> = values.iter().filter(|v| !v.is_nan()).copied().collect();
    valid.sort_by(f64::total_cmp);
    valid
}

/// Calculate median of a slice of f64 values
///
/// NaN values are dropped. For even-length data the two middle values are
/// averaged.
///
/// # Arguments
/// * `values` - Values to compute the median from
///
/// # Returns
/// * `Ok(median)` - The median value
/// * `Err(EmptySampleError)` - If no valid values remain after filtering NaN
pub fn median(values: &[f64]) -> Result<f64, EmptySampleError> {
    let valid = sorted_valid(values);

    if valid.is_empty() {
        return Err(EmptySampleError {
            statistic: "median",
            total: values.len(),
        });
    }

    let mid = valid.len() / 2;
    let median_value = if valid.len() % 2 == 0 {
        (valid[mid - 1] + valid[mid]) / 2.0
    } else {
        valid[mid]
    };

    Ok(median_value)
}

/// Root-mean-square of the deviations of `values` about `centre`
///
/// Returns NaN for an empty slice or a NaN centre.
pub fn rms_about(values: &[f64], centre: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - centre).powi(2)).sum();
    (sum_sq / values.len() as f64).sqrt()
}

/// The `n` smallest valid values in ascending order
///
/// Asking for more values than are available returns all of them.
pub fn lowest(values: &[f64], n: usize) -> Vec<f64> {
    let mut valid = sorted_valid(values);
    valid.truncate(n);
    valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_median_odd_and_even() {
        assert_relative_eq!(median(&[3.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_relative_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
    }

    #[test]
    fn test_median_ignores_nan_keeps_infinity() {
        let values = [1.0, f64::NAN, f64::INFINITY, 2.0, f64::NAN];
        assert_relative_eq!(median(&values).unwrap(), 2.0);
    }

    #[test]
    fn test_median_empty() {
        let err = median(&[]).unwrap_err();
        assert_eq!(err.total, 0);

        let err = median(&[f64::NAN, f64::NAN]).unwrap_err();
        assert_eq!(err.total, 2);
        assert!(err.to_string().contains("median"));
    }

    #[test]
    fn test_rms_about() {
        // Deviations of 3 and 4 about zero
        assert_relative_eq!(rms_about(&[3.0, -4.0], 0.0), (12.5f64).sqrt());
        assert_relative_eq!(rms_about(&[5.0, 5.0, 5.0], 5.0), 0.0);
        assert!(rms_about(&[], 1.0).is_nan());
    }

    #[test]
    fn test_lowest() {
        let values = [9.0, 2.0, 7.0, 1.0, 5.0];
        assert_eq!(lowest(&values, 3), vec![1.0, 2.0, 5.0]);
        assert_eq!(lowest(&values, 10).len(), 5);
        assert!(lowest(&values, 0).is_empty());
    }
}
