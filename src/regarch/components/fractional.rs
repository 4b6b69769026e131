//! Truncated lag-polynomial expansions for long-memory components.
//!
//! - [`frac_diff`]: coefficients of `(1 − L)^d`.
//! - [`arfima_psi`]: MA(∞) weights of `(1 − L)^{−d} Θ(L) / Φ(L)`.
//! - [`figarch_lambda`]: ARCH(∞) weights of
//!   `1 − (1 − β(L))^{−1} φ(L) (1 − L)^d`.
//!
//! All vectors have length `trunc + 1` and index 0 is the `L⁰` coefficient.

/// `π_0 = 1`, `π_k = π_{k−1} (k − 1 − d) / k`.
pub fn frac_diff(d: f64, trunc: usize) -> Vec<f64> {
    let mut pi = vec![0.0; trunc + 1];
    pi[0] = 1.0;
    for k in 1..=trunc {
        pi[k] = pi[k - 1] * ((k - 1) as f64 - d) / k as f64;
    }
    pi
}

/// Product of two polynomials truncated to degree `trunc`.
fn convolve(a: &[f64], b: &[f64], trunc: usize) -> Vec<f64> {
    let mut out = vec![0.0; trunc + 1];
    for (i, &ai) in a.iter().enumerate().take(trunc + 1) {
        for (j, &bj) in b.iter().enumerate() {
            if i + j > trunc {
                break;
            }
            out[i + j] += ai * bj;
        }
    }
    out
}

/// Divide by `1 − Σ c_i L^i`: `w_k = b_k + Σ_i c_i w_{k−i}`.
fn divide_by_one_minus(b: &[f64], c: &[f64]) -> Vec<f64> {
    let mut w = b.to_vec();
    for k in 0..w.len() {
        for (i, &ci) in c.iter().enumerate() {
            let lag = i + 1;
            if lag > k {
                break;
            }
            w[k] += ci * w[k - lag];
        }
    }
    w
}

/// ARFIMA weights `ψ_k` with `Φ(L) = 1 − Σ φ_i L^i`, `Θ(L) = 1 + Σ θ_j L^j`.
pub fn arfima_psi(ar: &[f64], ma: &[f64], d: f64, trunc: usize) -> Vec<f64> {
    let a = frac_diff(-d, trunc);
    let mut theta = Vec::with_capacity(ma.len() + 1);
    theta.push(1.0);
    theta.extend_from_slice(ma);
    let b = convolve(&a, &theta, trunc);
    divide_by_one_minus(&b, ar)
}

/// FIGARCH weights `λ_k` with `φ(L) = 1 − Σ φ_i L^i`, `β(L) = Σ β_j L^j`.
pub fn figarch_lambda(phi: &[f64], beta: &[f64], d: f64, trunc: usize) -> Vec<f64> {
    let pi = frac_diff(d, trunc);
    let mut phi_poly = Vec::with_capacity(phi.len() + 1);
    phi_poly.push(1.0);
    phi_poly.extend(phi.iter().map(|v| -v));
    let c = convolve(&phi_poly, &pi, trunc);
    let w = divide_by_one_minus(&c, beta);
    let mut lambda: Vec<f64> = w.iter().map(|v| -v).collect();
    lambda[0] = 1.0 - w[0];
    lambda
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Integer-order and short-memory special cases of the expansions.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // `(1 − L)^1` has coefficients [1, −1, 0, …] and `(1 − L)^{0.5}`
    // starts with [1, −0.5, −0.125].
    //
    // Given
    // -----
    // - d = 1 and d = 0.5 with truncation 4.
    //
    // Expect
    // ------
    // - The binomial coefficients above.
    fn frac_diff_matches_binomial_series() {
        // Arrange + Act
        let one = frac_diff(1.0, 4);
        let half = frac_diff(0.5, 4);

        // Assert
        assert_eq!(one, vec![1.0, -1.0, 0.0, 0.0, 0.0]);
        assert!((half[1] + 0.5).abs() < 1e-15);
        assert!((half[2] + 0.125).abs() < 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // Without fractional differencing the ARFIMA weights are the ARMA
    // MA(∞) weights.
    //
    // Given
    // -----
    // - AR(1) φ = 0.5 and MA(1) θ = 0.3 with d = 0.
    //
    // Expect
    // ------
    // - ψ_k = φ^{k−1}(φ + θ) for k ≥ 1.
    fn arfima_psi_reduces_to_arma() {
        // Arrange + Act
        let psi = arfima_psi(&[0.5], &[0.3], 0.0, 6);

        // Assert
        assert_eq!(psi[0], 1.0);
        for k in 1..=6 {
            let expected = 0.5_f64.powi(k as i32 - 1) * 0.8;
            assert!((psi[k] - expected).abs() < 1e-14, "k = {k}");
        }
    }

    #[test]
    // Purpose
    // -------
    // FIGARCH(0, d, 0) weights are `−π_k(d)` and GARCH-type cases stay
    // non-negative for a standard parameterization.
    //
    // Given
    // -----
    // - d = 0.4 without short-memory terms; then φ = 0.2, β = 0.5, d = 0.4.
    //
    // Expect
    // ------
    // - λ_0 = 0, λ_1 = d, λ_k = −π_k; all weights ≥ 0 in the second case.
    fn figarch_lambda_special_cases() {
        // Arrange + Act
        let pure = figarch_lambda(&[], &[], 0.4, 10);
        let pi = frac_diff(0.4, 10);
        let mixed = figarch_lambda(&[0.2], &[0.5], 0.4, 30);

        // Assert
        assert_eq!(pure[0], 0.0);
        assert!((pure[1] - 0.4).abs() < 1e-15);
        for k in 1..=10 {
            assert!((pure[k] + pi[k]).abs() < 1e-15);
        }
        assert!(mixed.iter().all(|&l| l >= 0.0));
    }
}
