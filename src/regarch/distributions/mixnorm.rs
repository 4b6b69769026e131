//! Two-component zero-mean normal mixture
//! `f(x) = p φ(x; σ₁) + (1 − p) φ(x; σ₂)` with parameters `(p, σ₁, σ₂)`.
//!
//! Everything is evaluated in log space. `log f` is a log-sum-exp of the
//! weighted component log-densities, and derivatives are written through
//! the posterior weights `w₁ = p φ₁ / f`, `w₂ = (1 − p) φ₂ / f` and the
//! component ratios `φ'/φ`, so tails far beyond either σ stay finite.
use crate::regarch::core::constants::{LOG_SQRT_2_PI, SQRT_2_OVER_PI};
use ndarray::{Array1, Array2};

/// Log-density of one component and its derivatives divided by the density.
struct Comp {
    log_a: f64,
    r_x: f64,
    r_xx: f64,
    r_s: f64,
    r_ss: f64,
    r_xs: f64,
}

fn comp(x: f64, s: f64) -> Comp {
    let s2 = s * s;
    let x2 = x * x;
    let r = (x2 - s2) / (s2 * s);
    Comp {
        log_a: -x2 / (2.0 * s2) - s.ln() - LOG_SQRT_2_PI,
        r_x: -x / s2,
        r_xx: x2 / (s2 * s2) - 1.0 / s2,
        r_s: r,
        r_ss: r * r + 1.0 / s2 - 3.0 * x2 / (s2 * s2),
        r_xs: -x * (r / s2 - 2.0 / (s2 * s)),
    }
}

/// Mixture terms at `x`: `log f`, posterior weights and both components.
struct Terms {
    log_f: f64,
    w1: f64,
    w2: f64,
    c1: Comp,
    c2: Comp,
}

fn terms(p: f64, s1: f64, s2: f64, x: f64) -> Terms {
    let c1 = comp(x, s1);
    let c2 = comp(x, s2);
    let l1 = p.ln() + c1.log_a;
    let l2 = (1.0 - p).ln() + c2.log_a;
    let top = l1.max(l2);
    let log_f = top + ((l1 - top).exp() + (l2 - top).exp()).ln();
    Terms { log_f, w1: (l1 - log_f).exp(), w2: (l2 - log_f).exp(), c1, c2 }
}

/// `(f_x / f, f_xx / f)`.
fn x_ratios(t: &Terms) -> (f64, f64) {
    (t.w1 * t.c1.r_x + t.w2 * t.c2.r_x, t.w1 * t.c1.r_xx + t.w2 * t.c2.r_xx)
}

/// `∇_β f / f`.
fn grad_ratio(p: f64, t: &Terms) -> Array1<f64> {
    Array1::from(vec![t.w1 / p - t.w2 / (1.0 - p), t.w1 * t.c1.r_s, t.w2 * t.c2.r_s])
}

pub(super) fn log_density(p: f64, s1: f64, s2: f64, x: f64) -> f64 {
    terms(p, s1, s2, x).log_f
}

pub(super) fn diff_log_density(p: f64, s1: f64, s2: f64, x: f64) -> f64 {
    x_ratios(&terms(p, s1, s2, x)).0
}

pub(super) fn diff2_log_density(p: f64, s1: f64, s2: f64, x: f64) -> f64 {
    let (fx, fxx) = x_ratios(&terms(p, s1, s2, x));
    fxx - fx * fx
}

pub(super) fn grad_log_density(p: f64, s1: f64, s2: f64, x: f64) -> Array1<f64> {
    grad_ratio(p, &terms(p, s1, s2, x))
}

pub(super) fn hess_log_density(p: f64, s1: f64, s2: f64, x: f64) -> Array2<f64> {
    let t = terms(p, s1, s2, x);
    let g = grad_ratio(p, &t);
    let (a1, a2) = (t.w1 / p, t.w2 / (1.0 - p));
    let mut h = Array2::<f64>::zeros((3, 3));
    h[[0, 1]] = a1 * t.c1.r_s;
    h[[1, 0]] = h[[0, 1]];
    h[[0, 2]] = -a2 * t.c2.r_s;
    h[[2, 0]] = h[[0, 2]];
    h[[1, 1]] = t.w1 * t.c1.r_ss;
    h[[2, 2]] = t.w2 * t.c2.r_ss;
    for i in 0..3 {
        for j in 0..3 {
            h[[i, j]] -= g[i] * g[j];
        }
    }
    h
}

pub(super) fn grad_diff_log_density(p: f64, s1: f64, s2: f64, x: f64) -> Array1<f64> {
    let t = terms(p, s1, s2, x);
    let (fx, _) = x_ratios(&t);
    let g = grad_ratio(p, &t);
    let gx = Array1::from(vec![
        t.w1 / p * t.c1.r_x - t.w2 / (1.0 - p) * t.c2.r_x,
        t.w1 * t.c1.r_xs,
        t.w2 * t.c2.r_xs,
    ]);
    gx - g * fx
}

pub(super) fn esp_abs_eps(p: f64, s1: f64, s2: f64) -> f64 {
    SQRT_2_OVER_PI * (p * s1 + (1.0 - p) * s2)
}

pub(super) fn grad_esp_abs_eps(p: f64, s1: f64, s2: f64) -> Array1<f64> {
    Array1::from(vec![SQRT_2_OVER_PI * (s1 - s2), SQRT_2_OVER_PI * p, SQRT_2_OVER_PI * (1.0 - p)])
}

pub(super) fn hess_esp_abs_eps() -> Array2<f64> {
    let mut h = Array2::<f64>::zeros((3, 3));
    h[[0, 1]] = SQRT_2_OVER_PI;
    h[[1, 0]] = SQRT_2_OVER_PI;
    h[[0, 2]] = -SQRT_2_OVER_PI;
    h[[2, 0]] = -SQRT_2_OVER_PI;
    h
}
