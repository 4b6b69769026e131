//! Unit-variance generalized error distribution with shape `ν > 0`.
//!
//! `log f(x) = ln ν − ½|x/λ|^ν − ln λ − (1 + 1/ν) ln 2 − ln Γ(1/ν)` with
//! `λ² = 2^{−2/ν} Γ(1/ν)/Γ(3/ν)`. `ν = 2` is the standard normal.
use super::special::{digamma, ln_gamma, trigamma};
use std::f64::consts::LN_2;

/// `(ln λ, d ln λ/dν, d² ln λ/dν²)`.
fn log_lambda(nu: f64) -> (f64, f64, f64) {
    let (a, b) = (1.0 / nu, 3.0 / nu);
    let nu2 = nu * nu;
    let nu3 = nu2 * nu;
    let nu4 = nu2 * nu2;
    let l0 = -LN_2 / nu + 0.5 * (ln_gamma(a) - ln_gamma(b));
    let l1 = LN_2 / nu2 - 0.5 * digamma(a) / nu2 + 1.5 * digamma(b) / nu2;
    let l2 = -2.0 * LN_2 / nu3 + digamma(a) / nu3 + 0.5 * trigamma(a) / nu4
        - 3.0 * digamma(b) / nu3
        - 4.5 * trigamma(b) / nu4;
    (l0, l1, l2)
}

pub(super) fn lambda(nu: f64) -> f64 {
    log_lambda(nu).0.exp()
}

/// `A = (|x|/λ)^ν`.
fn a_term(nu: f64, x: f64) -> f64 {
    (x.abs() / lambda(nu)).powf(nu)
}

pub(super) fn log_density(nu: f64, x: f64) -> f64 {
    let (l0, _, _) = log_lambda(nu);
    nu.ln() - 0.5 * a_term(nu, x) - l0 - (1.0 + 1.0 / nu) * LN_2 - ln_gamma(1.0 / nu)
}

pub(super) fn diff_log_density(nu: f64, x: f64) -> f64 {
    if x == 0.0 {
        return 0.0;
    }
    -0.5 * nu * a_term(nu, x) / x
}

/// Infinite at `x = 0` when `ν < 2` (the density has a cusp there); the
/// Hessian driver reports that as `NonFiniteValue`.
pub(super) fn diff2_log_density(nu: f64, x: f64) -> f64 {
    -0.5 * nu * (nu - 1.0) * x.abs().powf(nu - 2.0) / lambda(nu).powf(nu)
}

/// `(A, D, dD/dν)` with `D = ln(|x|/λ) − ν λ'/λ`; `x = 0` yields `A = 0`.
fn shape_terms(nu: f64, x: f64) -> (f64, f64, f64) {
    let (l0, l1, l2) = log_lambda(nu);
    if x == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let log_r = x.abs().ln() - l0;
    let a = (nu * log_r).exp();
    (a, log_r - nu * l1, -2.0 * l1 - nu * l2)
}

pub(super) fn grad_nu(nu: f64, x: f64) -> f64 {
    let (_, l1, _) = log_lambda(nu);
    let (a, d, _) = shape_terms(nu, x);
    1.0 / nu - 0.5 * a * d - l1 + LN_2 / (nu * nu) + digamma(1.0 / nu) / (nu * nu)
}

pub(super) fn hess_nu(nu: f64, x: f64) -> f64 {
    let (_, _, l2) = log_lambda(nu);
    let (a, d, dd) = shape_terms(nu, x);
    let nu2 = nu * nu;
    -1.0 / nu2 - 0.5 * a * (d * d + dd) - l2 - 2.0 * LN_2 / (nu2 * nu)
        - trigamma(1.0 / nu) / (nu2 * nu2)
        - 2.0 * digamma(1.0 / nu) / (nu2 * nu)
}

pub(super) fn grad_diff_nu(nu: f64, x: f64) -> f64 {
    if x == 0.0 {
        return 0.0;
    }
    let (a, d, _) = shape_terms(nu, x);
    -(a / (2.0 * x)) * (1.0 + nu * d)
}

/// `E|ε| = λ 2^{1/ν} Γ(2/ν)/Γ(1/ν)`.
pub(super) fn esp_abs_eps(nu: f64) -> f64 {
    let (l0, _, _) = log_lambda(nu);
    (l0 + LN_2 / nu + ln_gamma(2.0 / nu) - ln_gamma(1.0 / nu)).exp()
}

fn dlog_esp(nu: f64) -> (f64, f64) {
    let (_, l1, l2) = log_lambda(nu);
    let nu2 = nu * nu;
    let nu3 = nu2 * nu;
    let nu4 = nu2 * nu2;
    let (a, b) = (1.0 / nu, 2.0 / nu);
    let d1 = l1 - LN_2 / nu2 - 2.0 * digamma(b) / nu2 + digamma(a) / nu2;
    let d2 = l2 + 2.0 * LN_2 / nu3 + 4.0 * trigamma(b) / nu4 + 4.0 * digamma(b) / nu3
        - trigamma(a) / nu4
        - 2.0 * digamma(a) / nu3;
    (d1, d2)
}

pub(super) fn grad_esp_abs_eps(nu: f64) -> f64 {
    esp_abs_eps(nu) * dlog_esp(nu).0
}

pub(super) fn hess_esp_abs_eps(nu: f64) -> f64 {
    let (d1, d2) = dlog_esp(nu);
    esp_abs_eps(nu) * (d1 * d1 + d2)
}
