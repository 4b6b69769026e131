//! algorithms::likelihood — per-date log-likelihood and its sum.
//!
//! Purpose
//! -------
//! Evaluate `l_t = log f(ε_t) − ½ ln h_t` for every date of a value state
//! and reduce it to the log-likelihood `Σ_t l_t`.
//!
//! Conventions
//! -----------
//! - Every date `t = 0..N−1` contributes; lag terms reaching before the
//!   sample are read from the pre-sample window or omitted.
//! - The derived arrays of `st` are overwritten by the pass.
use crate::regarch::{
    core::{data::ValueState, options::NumericOpts},
    errors::RegArchResult,
    models::{walk_dates, DerivOrder, RegArchModel},
};
use ndarray::Array1;
use tracing::debug;

/// regarch_lt — vector of per-date contributions `l_t`.
///
/// Errors
/// ------
/// - `MissingRegressors` when the state cannot feed the model.
/// - `NonPositiveVariance` / `NonFiniteValue` / `InvalidDensity` at the
///   first failing date.
pub fn regarch_lt(model: &RegArchModel, st: &mut ValueState) -> RegArchResult<Array1<f64>> {
    debug!(n_obs = st.len(), n_param = model.n_param(), "evaluating per-date log-likelihood");
    let mut lt = Array1::<f64>::zeros(st.len());
    walk_dates(
        model,
        st,
        DerivOrder::Value,
        &NumericOpts::default(),
        &mut lt,
        |entry, acc| {
            acc[entry.t] = entry.lt;
            Ok(())
        },
        |_, _| Ok(()),
    )?;
    Ok(lt)
}

/// regarch_llh — log-likelihood `Σ_t l_t`.
pub fn regarch_llh(model: &RegArchModel, st: &mut ValueState) -> RegArchResult<f64> {
    Ok(regarch_lt(model, st)?.sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regarch::{
        components::{
            aggregator::CondMean,
            mean::{MeanComponent, MeanSpec},
            variance::{VarComponent, VarSpec},
        },
        core::constants::LOG_SQRT_2_PI,
        distributions::Distribution,
        errors::RegArchError,
    };
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The closed form of a constant-mean / constant-variance normal model.
    // - Propagation of a non-positive variance error.
    // -------------------------------------------------------------------------

    fn const_model(c: f64, omega: f64) -> RegArchModel {
        let mean = CondMean::from_components(vec![MeanComponent::new(MeanSpec::Const)
            .unwrap()
            .with_values(&[c])
            .unwrap()])
        .unwrap();
        let var = VarComponent::new(VarSpec::Const).unwrap().with_values(&[omega]).unwrap();
        RegArchModel::new(mean, var, Distribution::normal())
    }

    #[test]
    // Purpose
    // -------
    // With constant mean and variance, `l_t` is the Gaussian log-density of
    // `y_t` and the log-likelihood is their sum.
    //
    // Given
    // -----
    // - c = 1, ω = 4, y = (1, 3).
    //
    // Expect
    // ------
    // - l = (−ln√(2π) − ln 2, −ln√(2π) − ln 2 − 0.5).
    fn constant_model_matches_gaussian_density() {
        // Arrange
        let model = const_model(1.0, 4.0);
        let mut st = ValueState::new(array![1.0, 3.0], None, None).unwrap();

        // Act
        let lt = regarch_lt(&model, &mut st).unwrap();
        let llh = regarch_llh(&model, &mut st).unwrap();

        // Assert
        let base = -LOG_SQRT_2_PI - 2.0_f64.ln();
        assert_abs_diff_eq!(lt[0], base, epsilon = 1e-14);
        assert_abs_diff_eq!(lt[1], base - 0.5, epsilon = 1e-14);
        assert_abs_diff_eq!(llh, 2.0 * base - 0.5, epsilon = 1e-14);
        assert_eq!(st.epst, array![0.0, 1.0]);
    }

    #[test]
    // Purpose
    // -------
    // A non-positive variance aborts the pass.
    //
    // Given
    // -----
    // - ω = 0.
    //
    // Expect
    // ------
    // - `NonPositiveVariance { t: 0, .. }`.
    fn zero_variance_is_an_error() {
        // Arrange
        let model = const_model(0.0, 0.0);
        let mut st = ValueState::new(array![1.0, 3.0], None, None).unwrap();

        // Act
        let err = regarch_llh(&model, &mut st).unwrap_err();

        // Assert
        assert_eq!(err, RegArchError::NonPositiveVariance { t: 0, value: 0.0 });
    }
}
