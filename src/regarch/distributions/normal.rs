//! Normal laws: the standard normal (no shape parameter) and the scaled
//! normal `N(0, σ²)` with σ as its single parameter.
use crate::regarch::core::constants::{LOG_SQRT_2_PI, SQRT_2_OVER_PI};

// ---- Standard normal ----

pub(super) fn std_log_density(x: f64) -> f64 {
    -LOG_SQRT_2_PI - 0.5 * x * x
}

pub(super) fn std_diff_log_density(x: f64) -> f64 {
    -x
}

pub(super) fn std_esp_abs_eps() -> f64 {
    SQRT_2_OVER_PI
}

// ---- Scaled normal ----

/// `log f(x) = −½ ln(2π) − ln σ − x²/(2σ²)`.
pub(super) fn log_density(sigma: f64, x: f64) -> f64 {
    -LOG_SQRT_2_PI - sigma.ln() - x * x / (2.0 * sigma * sigma)
}

pub(super) fn diff_log_density(sigma: f64, x: f64) -> f64 {
    -x / (sigma * sigma)
}

pub(super) fn diff2_log_density(sigma: f64) -> f64 {
    -1.0 / (sigma * sigma)
}

/// `∂/∂σ log f = −1/σ + x²/σ³`.
pub(super) fn grad_sigma(sigma: f64, x: f64) -> f64 {
    -1.0 / sigma + x * x / sigma.powi(3)
}

/// `∂²/∂σ² log f = 1/σ² − 3x²/σ⁴`.
pub(super) fn hess_sigma(sigma: f64, x: f64) -> f64 {
    1.0 / (sigma * sigma) - 3.0 * x * x / sigma.powi(4)
}

/// `∂/∂σ (∂/∂x log f) = 2x/σ³`.
pub(super) fn grad_diff_sigma(sigma: f64, x: f64) -> f64 {
    2.0 * x / sigma.powi(3)
}

pub(super) fn esp_abs_eps(sigma: f64) -> f64 {
    SQRT_2_OVER_PI * sigma
}
