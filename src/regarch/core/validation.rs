//! core::validation — input checks shared by state and option constructors.
//!
//! Each helper returns `Ok(())` or the first violation found, so
//! constructors can `?` them in sequence.
use crate::regarch::errors::{RegArchError, RegArchResult};
use ndarray::{Array1, Array2};

/// Non-empty and every entry finite.
pub fn validate_series(data: &Array1<f64>) -> RegArchResult<()> {
    if data.is_empty() {
        return Err(RegArchError::EmptySeries);
    }
    validate_finite(data)
}

pub fn validate_finite(data: &Array1<f64>) -> RegArchResult<()> {
    match data.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, &value)) => Err(RegArchError::NonFiniteData { index, value }),
        None => Ok(()),
    }
}

/// Row count equals the sample length and every entry is finite.
pub fn validate_regressors(which: &'static str, x: &Array2<f64>, n: usize) -> RegArchResult<()> {
    if x.nrows() != n {
        return Err(RegArchError::RegressorLengthMismatch { which, expected: n, actual: x.nrows() });
    }
    match x.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, &value)) => Err(RegArchError::NonFiniteData { index, value }),
        None => Ok(()),
    }
}

/// Relative finite-difference step: finite and strictly positive.
pub fn validate_step(step: f64) -> RegArchResult<()> {
    if !step.is_finite() || step <= 0.0 {
        return Err(RegArchError::InvalidNumericStep { value: step });
    }
    Ok(())
}

/// Guard a freshly computed conditional variance.
pub fn check_variance(t: usize, h: f64, cap: f64) -> RegArchResult<f64> {
    if !(h > 0.0) || !h.is_finite() {
        return Err(RegArchError::NonPositiveVariance { t, value: h });
    }
    if h > cap {
        return Err(RegArchError::NonFiniteValue { t, what: "conditional variance", value: h });
    }
    Ok(h)
}

/// Guard a freshly computed conditional mean.
pub fn check_mean(t: usize, m: f64, cap: f64) -> RegArchResult<f64> {
    if !m.is_finite() || m.abs() > cap {
        return Err(RegArchError::NonFiniteValue { t, what: "conditional mean", value: m });
    }
    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Series and regressor validation error variants.
    // - Variance/mean guards and step validation.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Empty and non-finite series are rejected with the right variant.
    //
    // Given
    // -----
    // - An empty array and an array with a NaN at index 1.
    //
    // Expect
    // ------
    // - `EmptySeries` and `NonFiniteData { index: 1, .. }` respectively.
    fn validate_series_rejects_empty_and_nan() {
        // Arrange
        let empty: Array1<f64> = array![];
        let with_nan = array![0.1, f64::NAN, 0.3];

        // Act + Assert
        assert_eq!(validate_series(&empty), Err(RegArchError::EmptySeries));
        assert!(matches!(
            validate_series(&with_nan),
            Err(RegArchError::NonFiniteData { index: 1, .. })
        ));
        assert!(validate_series(&array![0.0, -1.0]).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // Regressor matrices must match the sample length.
    //
    // Given
    // -----
    // - A 2×1 regressor matrix checked against n = 3.
    //
    // Expect
    // ------
    // - `RegressorLengthMismatch` with expected 3, actual 2.
    fn validate_regressors_checks_rows() {
        // Arrange
        let x = array![[1.0], [2.0]];

        // Act
        let res = validate_regressors("mean", &x, 3);

        // Assert
        assert_eq!(
            res,
            Err(RegArchError::RegressorLengthMismatch { which: "mean", expected: 3, actual: 2 })
        );
    }

    #[test]
    // Purpose
    // -------
    // Variance guard rejects zero, negative, NaN and exploding values.
    //
    // Given
    // -----
    // - Candidate variances 0, -1, NaN, 2 and 1e200 with cap 1e100.
    //
    // Expect
    // ------
    // - Only 2 passes.
    fn check_variance_rejects_non_positive_values() {
        // Arrange + Act + Assert
        assert!(matches!(check_variance(3, 0.0, 1e100), Err(RegArchError::NonPositiveVariance { t: 3, .. })));
        assert!(check_variance(0, -1.0, 1e100).is_err());
        assert!(check_variance(0, f64::NAN, 1e100).is_err());
        assert!(matches!(check_variance(0, 1e200, 1e100), Err(RegArchError::NonFiniteValue { .. })));
        assert_eq!(check_variance(0, 2.0, 1e100), Ok(2.0));
        assert!(validate_step(0.0).is_err());
        assert!(validate_step(1e-4).is_ok());
    }
}
