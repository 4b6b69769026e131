//! Standardized Fernández–Steel skew Student-t with `ν > 2` and skewness
//! `ξ > 0` (`ξ = 1` is the unit-variance Student-t).
//!
//! With `z = m + s x`, `w = z/ξ` for `z ≥ 0` and `w = zξ` otherwise:
//! `log f(x) = ln s + ln 2 − ln(ξ + 1/ξ) + ln t_ν(w)`, where `t_ν` is the
//! unit-scale Student-t density and `(m, s)` are the mean and standard
//! deviation of the unstandardized skewed law.
use super::special::ln_gamma;
use crate::regarch::core::constants::PI;
use quadrature::double_exponential;

/// `(m, s)`: mean and standard deviation of the skewed (unstandardized) law.
pub(super) fn moments(nu: f64, xi: f64) -> (f64, f64) {
    let m1 = 2.0 * nu.sqrt() * (ln_gamma(0.5 * (nu + 1.0)) - ln_gamma(0.5 * nu)).exp()
        / (PI.sqrt() * (nu - 1.0));
    let m = m1 * (xi - 1.0 / xi);
    let var = (xi * xi + 1.0 / (xi * xi) - 1.0) * nu / (nu - 2.0) - m * m;
    (m, var.sqrt())
}

/// `(w, dw/dz)` for the branch selected by the sign of `z`.
fn branch(z: f64, xi: f64) -> (f64, f64) {
    if z >= 0.0 { (z / xi, 1.0 / xi) } else { (z * xi, xi) }
}

fn log_t(nu: f64, w: f64) -> f64 {
    ln_gamma(0.5 * (nu + 1.0)) - ln_gamma(0.5 * nu) - 0.5 * (nu * PI).ln()
        - 0.5 * (nu + 1.0) * (w * w / nu).ln_1p()
}

pub(super) fn log_density(nu: f64, xi: f64, x: f64) -> f64 {
    let (m, s) = moments(nu, xi);
    let (w, _) = branch(m + s * x, xi);
    s.ln() + std::f64::consts::LN_2 - (xi + 1.0 / xi).ln() + log_t(nu, w)
}

pub(super) fn diff_log_density(nu: f64, xi: f64, x: f64) -> f64 {
    let (m, s) = moments(nu, xi);
    let (w, k) = branch(m + s * x, xi);
    -s * k * (nu + 1.0) * w / (nu + w * w)
}

pub(super) fn diff2_log_density(nu: f64, xi: f64, x: f64) -> f64 {
    let (m, s) = moments(nu, xi);
    let (w, k) = branch(m + s * x, xi);
    let d = nu + w * w;
    -(s * k) * (s * k) * (nu + 1.0) * (nu - w * w) / (d * d)
}

/// `E|ε|` by double-exponential quadrature, split at the kinks `x = 0`
/// and `z = 0` so every piece is smooth. Half-lines are mapped onto
/// `(0, 1)` with `x = a ± τ/(1 − τ)`.
pub(super) fn esp_abs_eps(nu: f64, xi: f64) -> f64 {
    let (m, s) = moments(nu, xi);
    let kink = -m / s;
    let (lower, upper) = (kink.min(0.0), kink.max(0.0));
    let g = |x: f64| -> f64 {
        let v = x.abs() * log_density(nu, xi, x).exp();
        if v.is_finite() { v } else { 0.0 }
    };
    let half_line = |a: f64, sign: f64| -> f64 {
        let mapped = |tau: f64| -> f64 {
            let one_m = 1.0 - tau;
            if one_m <= 0.0 {
                return 0.0;
            }
            g(a + sign * tau / one_m) / (one_m * one_m)
        };
        double_exponential::integrate(mapped, 0.0, 1.0, QUAD_TOL).integral
    };
    let middle = if upper > lower {
        double_exponential::integrate(g, lower, upper, QUAD_TOL).integral
    } else {
        0.0
    };
    half_line(lower, -1.0) + middle + half_line(upper, 1.0)
}

const QUAD_TOL: f64 = 1e-12;
