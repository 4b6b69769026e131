//! algorithms::covariance — asymptotic covariance of the ML estimator.
//!
//! Purpose
//! -------
//! Assemble the outer-product-of-gradients matrix `I`, the average negative
//! Hessian `J`, and the covariance estimators built from them, at the
//! model's current parameters.
//!
//! Key behaviors
//! -------------
//! - `I = (1/N) Σ_t ∇l_t ∇l_tᵀ` and `J = −(1/N) Σ_t ∇²l_t`.
//! - `CovKind::Hessian` → `J⁻¹/N`, `CovKind::Opg` → `I⁻¹/N`,
//!   `CovKind::Sandwich` → `J⁻¹ I J⁻¹ / N`.
//! - Inverses are eigen pseudo-inverses from [`crate::inference`].
//! - [`numeric_compute_cov`] builds the same estimators from the
//!   finite-difference per-date derivatives.
//!
//! Invariants & assumptions
//! ------------------------
//! - The parameters are meant to be the ML estimate; nothing here checks
//!   that the gradient vanishes.
use crate::inference::covariance::{avg_outer_product, pseudo_inverse, sandwich};
use crate::regarch::{
    algorithms::{gradient::regarch_grad_lt, numeric::numeric_regarch_grad_and_hess_lt},
    core::{
        data::ValueState,
        options::{CovKind, NumericOpts},
    },
    errors::RegArchResult,
    models::{walk_dates, DerivOrder, RegArchModel},
};
use ndarray::{Array2, Array3, Axis};
use tracing::debug;

/// regarch_compute_i — outer-product-of-gradients matrix `I`.
///
/// Errors
/// ------
/// - Any error of the gradient pass.
/// - `Inference(NonFinite)` if a gradient is not finite.
pub fn regarch_compute_i(
    model: &RegArchModel, st: &mut ValueState, opts: &NumericOpts,
) -> RegArchResult<Array2<f64>> {
    let grads = regarch_grad_lt(model, st, opts)?;
    Ok(avg_outer_product(&grads)?)
}

/// regarch_compute_i_and_j — `I` and `J` from one gradient + Hessian pass.
pub fn regarch_compute_i_and_j(
    model: &RegArchModel, st: &mut ValueState, opts: &NumericOpts,
) -> RegArchResult<(Array2<f64>, Array2<f64>)> {
    let n = model.n_param();
    let n_obs = st.len() as f64;
    let mut acc = (Array2::<f64>::zeros((n, n)), Array2::<f64>::zeros((n, n)));
    walk_dates(
        model,
        st,
        DerivOrder::Hess,
        opts,
        &mut acc,
        |entry, (i_mat, j_mat)| {
            if let Some(g) = entry.grad {
                let col = g.view().insert_axis(Axis(1));
                *i_mat += &col.dot(&col.t());
            }
            if let Some(h) = entry.hess {
                *j_mat -= h;
            }
            Ok(())
        },
        |_, (i_mat, j_mat)| {
            *i_mat /= n_obs;
            *j_mat /= n_obs;
            Ok(())
        },
    )?;
    Ok(acc)
}

/// cov_from_i_and_j — map `I`, `J` to the requested estimator.
///
/// Parameters
/// ----------
/// - `i_mat`, `j_mat`: `&Array2<f64>`
///   Average-scale information matrices.
/// - `n_obs`: `usize`
///   Sample size `N`.
/// - `kind`: `CovKind`
///
/// Errors
/// ------
/// - `Inference(..)` for malformed or fully singular matrices.
pub fn cov_from_i_and_j(
    i_mat: &Array2<f64>, j_mat: &Array2<f64>, n_obs: usize, kind: CovKind,
) -> RegArchResult<Array2<f64>> {
    let scale = 1.0 / n_obs.max(1) as f64;
    let cov = match kind {
        CovKind::Hessian => pseudo_inverse(j_mat)?,
        CovKind::Opg => pseudo_inverse(i_mat)?,
        CovKind::Sandwich => sandwich(&pseudo_inverse(j_mat)?, i_mat)?,
    };
    Ok(cov * scale)
}

/// regarch_compute_cov — asymptotic covariance of θ̂ with analytic
/// derivatives (numeric paths for components without closed forms).
///
/// Errors
/// ------
/// - Any error of the underlying derivative pass.
/// - `Inference(Singular)` when the relevant information matrix has no
///   positive eigenvalue.
pub fn regarch_compute_cov(
    model: &RegArchModel, st: &mut ValueState, kind: CovKind, opts: &NumericOpts,
) -> RegArchResult<Array2<f64>> {
    debug!(?kind, n_obs = st.len(), n_param = model.n_param(), "computing covariance");
    let n_obs = st.len();
    match kind {
        CovKind::Opg => {
            let i_mat = regarch_compute_i(model, st, opts)?;
            cov_from_i_and_j(&i_mat, &i_mat, n_obs, kind)
        }
        CovKind::Hessian | CovKind::Sandwich => {
            let (i_mat, j_mat) = regarch_compute_i_and_j(model, st, opts)?;
            cov_from_i_and_j(&i_mat, &j_mat, n_obs, kind)
        }
    }
}

/// numeric_compute_cov — covariance from finite-difference per-date
/// gradients and Hessians.
pub fn numeric_compute_cov(
    model: &RegArchModel, st: &mut ValueState, kind: CovKind, opts: &NumericOpts,
) -> RegArchResult<Array2<f64>> {
    debug!(?kind, n_obs = st.len(), n_param = model.n_param(), "computing numeric covariance");
    let (grads, hess) = numeric_regarch_grad_and_hess_lt(model, st, opts)?;
    let i_mat = avg_outer_product(&grads)?;
    let j_mat = neg_avg_hessian(&hess);
    cov_from_i_and_j(&i_mat, &j_mat, st.len(), kind)
}

fn neg_avg_hessian(hess: &Array3<f64>) -> Array2<f64> {
    let n_obs = hess.len_of(Axis(0)).max(1) as f64;
    -hess.sum_axis(Axis(0)) / n_obs
}
