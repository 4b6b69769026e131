//! core::options — configuration for simulation, numeric derivatives and
//! covariance estimation.
//!
//! Purpose
//! -------
//! Keep every tunable of the top-level algorithms in small option structs
//! with explicit constructors and documented defaults.
//!
//! Conventions
//! -----------
//! - Finite-difference steps are relative: the perturbation of `θ_i` is
//!   `step · max(|θ_i|, 1)`.
use crate::regarch::{
    core::{
        constants::{DEFAULT_GRAD_STEP, DEFAULT_HESS_STEP},
        validation::validate_step,
    },
    errors::RegArchResult,
};

/// Simulation settings.
///
/// - `seed`: `Some(s)` seeds a `StdRng` for reproducible draws; `None`
///   seeds from OS entropy.
/// - `burn_in`: number of leading draws discarded. The returned state keeps
///   the tail of the burn-in as its pre-sample window.
#[derive(Debug, Clone, PartialEq)]
pub struct SimOpts {
    pub seed: Option<u64>,
    pub burn_in: usize,
}

impl SimOpts {
    pub fn new(seed: Option<u64>, burn_in: usize) -> SimOpts {
        SimOpts { seed, burn_in }
    }
}

impl Default for SimOpts {
    fn default() -> Self {
        SimOpts { seed: Some(42), burn_in: 0 }
    }
}

/// Relative finite-difference steps for the numeric derivative fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericOpts {
    pub grad_step: f64,
    pub hess_step: f64,
}

impl NumericOpts {
    /// Errors
    /// ------
    /// - `InvalidNumericStep` if either step is non-finite or ≤ 0.
    pub fn new(grad_step: f64, hess_step: f64) -> RegArchResult<NumericOpts> {
        validate_step(grad_step)?;
        validate_step(hess_step)?;
        Ok(NumericOpts { grad_step, hess_step })
    }
}

impl Default for NumericOpts {
    fn default() -> Self {
        NumericOpts { grad_step: DEFAULT_GRAD_STEP, hess_step: DEFAULT_HESS_STEP }
    }
}

/// Asymptotic covariance estimator.
///
/// - `Hessian`: `J⁻¹ / N` from the average negative Hessian.
/// - `Opg`: `I⁻¹ / N` from the average outer product of gradients.
/// - `Sandwich`: `J⁻¹ I J⁻¹ / N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CovKind {
    #[default]
    Hessian,
    Opg,
    Sandwich,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regarch::errors::RegArchError;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Documented defaults of `SimOpts`, `NumericOpts` and `CovKind`.
    // - Step validation in `NumericOpts::new`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Defaults match the documented values.
    //
    // Given
    // -----
    // - Default-constructed options.
    //
    // Expect
    // ------
    // - Seed 42 without burn-in, steps 1e-5 / 1e-4, Hessian covariance.
    fn defaults_match_documentation() {
        // Arrange + Act
        let sim = SimOpts::default();
        let num = NumericOpts::default();

        // Assert
        assert_eq!(sim, SimOpts::new(Some(42), 0));
        assert_eq!(num.grad_step, 1e-5);
        assert_eq!(num.hess_step, 1e-4);
        assert_eq!(CovKind::default(), CovKind::Hessian);
    }

    #[test]
    // Purpose
    // -------
    // Non-positive or non-finite steps are rejected.
    //
    // Given
    // -----
    // - Steps (0, 1e-4), (1e-5, NaN) and (1e-5, 1e-4).
    //
    // Expect
    // ------
    // - The first two fail with `InvalidNumericStep`; the last succeeds.
    fn numeric_opts_validate_steps() {
        // Arrange + Act + Assert
        assert_eq!(NumericOpts::new(0.0, 1e-4), Err(RegArchError::InvalidNumericStep { value: 0.0 }));
        assert!(NumericOpts::new(1e-5, f64::NAN).is_err());
        assert!(NumericOpts::new(1e-5, 1e-4).is_ok());
    }
}
