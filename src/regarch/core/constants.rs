//! Process-wide numeric constants used by densities, recursions and
//! finite-difference defaults.

pub const PI: f64 = std::f64::consts::PI;

/// `sqrt(2π)`.
pub const SQRT_2_PI: f64 = 2.506_628_274_631_000_2;

/// `ln(sqrt(2π))`.
pub const LOG_SQRT_2_PI: f64 = 0.918_938_533_204_672_7;

/// `sqrt(2/π)`, i.e. `E|ε|` under the standard normal.
pub const SQRT_2_OVER_PI: f64 = 0.797_884_560_802_865_4;

/// Magnitude beyond which a conditional mean is reported as exploding.
pub const MAX_COND_MEAN: f64 = 1e100;

/// Magnitude beyond which a conditional variance is reported as exploding.
pub const MAX_COND_VAR: f64 = 1e100;

/// Truncation lag for fractional (ARFIMA / FIGARCH) expansions.
pub const DEFAULT_TRUNC_LAG: usize = 20;

pub const DEFAULT_GRAD_STEP: f64 = 1e-5;

pub const DEFAULT_HESS_STEP: f64 = 1e-4;
