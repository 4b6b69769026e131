//! Unit-variance Student-t with `ν > 2` degrees of freedom.
//!
//! `log f(x) = ln Γ((ν+1)/2) − ln Γ(ν/2) − ½ ln(π(ν−2)) − (ν+1)/2 · ln(1 + x²/(ν−2))`.
//! All x- and ν-derivatives and `E|ε|` are closed form.
use super::special::{digamma, ln_gamma, trigamma};
use crate::regarch::core::constants::PI;

pub(super) fn log_density(nu: f64, x: f64) -> f64 {
    ln_gamma(0.5 * (nu + 1.0)) - ln_gamma(0.5 * nu) - 0.5 * (PI * (nu - 2.0)).ln()
        - 0.5 * (nu + 1.0) * (x * x / (nu - 2.0)).ln_1p()
}

pub(super) fn diff_log_density(nu: f64, x: f64) -> f64 {
    -(nu + 1.0) * x / (nu - 2.0 + x * x)
}

pub(super) fn diff2_log_density(nu: f64, x: f64) -> f64 {
    let d = nu - 2.0 + x * x;
    -(nu + 1.0) * (nu - 2.0 - x * x) / (d * d)
}

/// Pieces of `g(ν) = ln(1 + x²/(ν−2))`: `(g, g', g'')`.
fn g_terms(nu: f64, x: f64) -> (f64, f64, f64) {
    let x2 = x * x;
    let a = nu - 2.0;
    let d = a + x2;
    let g = (x2 / a).ln_1p();
    let g1 = -x2 / (a * d);
    let g2 = x2 * (2.0 * a + x2) / (a * a * d * d);
    (g, g1, g2)
}

pub(super) fn grad_nu(nu: f64, x: f64) -> f64 {
    let (g, g1, _) = g_terms(nu, x);
    0.5 * digamma(0.5 * (nu + 1.0)) - 0.5 * digamma(0.5 * nu) - 0.5 / (nu - 2.0) - 0.5 * g
        - 0.5 * (nu + 1.0) * g1
}

pub(super) fn hess_nu(nu: f64, x: f64) -> f64 {
    let (_, g1, g2) = g_terms(nu, x);
    let a = nu - 2.0;
    0.25 * trigamma(0.5 * (nu + 1.0)) - 0.25 * trigamma(0.5 * nu) + 0.5 / (a * a) - g1
        - 0.5 * (nu + 1.0) * g2
}

pub(super) fn grad_diff_nu(nu: f64, x: f64) -> f64 {
    let d = nu - 2.0 + x * x;
    x * (3.0 - x * x) / (d * d)
}

/// `E|ε| = 2 sqrt(ν−2) Γ((ν+1)/2) / (sqrt(π) (ν−1) Γ(ν/2))`.
pub(super) fn esp_abs_eps(nu: f64) -> f64 {
    2.0 * (nu - 2.0).sqrt() * (ln_gamma(0.5 * (nu + 1.0)) - ln_gamma(0.5 * nu)).exp()
        / (PI.sqrt() * (nu - 1.0))
}

fn dlog_esp(nu: f64) -> (f64, f64) {
    let d1 = 0.5 / (nu - 2.0) + 0.5 * digamma(0.5 * (nu + 1.0)) - 1.0 / (nu - 1.0)
        - 0.5 * digamma(0.5 * nu);
    let d2 = -0.5 / ((nu - 2.0) * (nu - 2.0)) + 0.25 * trigamma(0.5 * (nu + 1.0))
        + 1.0 / ((nu - 1.0) * (nu - 1.0))
        - 0.25 * trigamma(0.5 * nu);
    (d1, d2)
}

pub(super) fn grad_esp_abs_eps(nu: f64) -> f64 {
    esp_abs_eps(nu) * dlog_esp(nu).0
}

pub(super) fn hess_esp_abs_eps(nu: f64) -> f64 {
    let (d1, d2) = dlog_esp(nu);
    esp_abs_eps(nu) * (d1 * d1 + d2)
}
