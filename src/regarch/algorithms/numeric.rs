//! algorithms::numeric — finite-difference counterparts of the derivative
//! drivers.
//!
//! Purpose
//! -------
//! Differentiate `l_t` and the log-likelihood with respect to θ without any
//! closed-form recursion, either to handle models whose components have no
//! analytic derivatives or to cross-check the analytic drivers.
//!
//! Key behaviors
//! -------------
//! - [`numeric_regarch_grad_lt`] / [`numeric_regarch_hess_lt`] carry
//!   perturbed copies of the whole model through one forward pass
//!   ([`NumericDerivative`]) and difference `l_t` date by date.
//! - [`numeric_regarch_grad_llh`] differences the scalar log-likelihood with
//!   `finitediff` central differences, re-running a full pass per
//!   perturbation.
//!
//! Invariants & assumptions
//! ------------------------
//! - Per-date paths use the relative steps of [`NumericOpts`]; the
//!   whole-likelihood gradient uses the `finitediff` default step.
//! - A perturbation that makes a path inadmissible is an error.
use crate::regarch::{
    core::{data::ValueState, options::NumericOpts},
    distributions::finite_diff::local_grad,
    errors::RegArchResult,
    models::{compute_value_at, log_density_at, NumericDerivative, RegArchModel, Target},
};
use crate::regarch::algorithms::likelihood::regarch_llh;
use ndarray::{Array1, Array2, Array3, ArrayView1, Axis};
use tracing::debug;

/// numeric_regarch_grad_lt — finite-difference `∇l_t` for every date.
///
/// Returns
/// -------
/// `RegArchResult<Array2<f64>>`
///   `N × n` matrix whose row `t` is the central-difference `∇l_t`.
///
/// Errors
/// ------
/// - `InvalidNumericStep` for a bad `opts.grad_step`.
/// - Any error raised on the main path or a perturbed path.
pub fn numeric_regarch_grad_lt(
    model: &RegArchModel, st: &mut ValueState, opts: &NumericOpts,
) -> RegArchResult<Array2<f64>> {
    debug!(step = opts.grad_step, n_param = model.n_param(), "numeric per-date gradients");
    let (grads, _) = numeric_pass(model, st, opts.grad_step, false)?;
    Ok(grads)
}

/// numeric_regarch_hess_lt — finite-difference `∇²l_t` for every date.
///
/// Returns
/// -------
/// `RegArchResult<Array3<f64>>`
///   `N × n × n` tensor; slice `t` is symmetric.
pub fn numeric_regarch_hess_lt(
    model: &RegArchModel, st: &mut ValueState, opts: &NumericOpts,
) -> RegArchResult<Array3<f64>> {
    Ok(numeric_regarch_grad_and_hess_lt(model, st, opts)?.1)
}

/// numeric_regarch_grad_and_hess_lt — both finite-difference derivatives
/// from one set of perturbed paths (step `opts.hess_step`).
pub fn numeric_regarch_grad_and_hess_lt(
    model: &RegArchModel, st: &mut ValueState, opts: &NumericOpts,
) -> RegArchResult<(Array2<f64>, Array3<f64>)> {
    debug!(step = opts.hess_step, n_param = model.n_param(), "numeric per-date Hessians");
    let (grads, hess) = numeric_pass(model, st, opts.hess_step, true)?;
    let n = model.n_param();
    Ok((grads, hess.unwrap_or_else(|| Array3::zeros((st.len(), n, n)))))
}

/// numeric_regarch_grad_llh — central-difference gradient of the
/// log-likelihood.
///
/// Each perturbation re-evaluates the full likelihood on a copy of the model
/// and state; `st` itself is left untouched.
pub fn numeric_regarch_grad_llh(model: &RegArchModel, st: &ValueState) -> RegArchResult<Array1<f64>> {
    debug!(n_param = model.n_param(), "numeric log-likelihood gradient");
    let theta = model.param_to_vector().to_vec();
    local_grad(&theta, |th: &[f64]| {
        let mut m = model.clone();
        m.vector_to_param(ArrayView1::from(th))?;
        let mut s = st.clone();
        regarch_llh(&m, &mut s)
    })
}

fn numeric_pass(
    model: &RegArchModel, st: &mut ValueState, step: f64, hessian: bool,
) -> RegArchResult<(Array2<f64>, Option<Array3<f64>>)> {
    model.check_data(st)?;
    let (n_obs, n) = (st.len(), model.n_param());
    let mut nd = NumericDerivative::new(model, st, step, hessian)?;
    let mut grads = Array2::<f64>::zeros((n_obs, n));
    let mut hess = hessian.then(|| Array3::<f64>::zeros((n_obs, n, n)));
    for t in 0..n_obs {
        compute_value_at(model, st, t)?;
        nd.advance(t)?;
        grads.row_mut(t).assign(&nd.grad(Target::Lt, t)?);
        if let Some(h) = hess.as_mut() {
            let f0 = log_density_at(model, st, t)?;
            h.index_axis_mut(Axis(0), t).assign(&nd.hess(Target::Lt, t, f0)?);
        }
    }
    Ok((grads, hess))
}
