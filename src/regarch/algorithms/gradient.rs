//! algorithms::gradient — per-date and total log-likelihood gradients.
//!
//! Purpose
//! -------
//! Run one forward pass with first-order derivatives and collect `∇l_t`
//! per date (rows of an `N × n` matrix) or their sum `∇LLH`.
//!
//! Key behaviors
//! -------------
//! - Closed-form recursions are used wherever a component has them;
//!   components without closed forms go through the numeric derivative
//!   paths with step `opts.grad_step`, and the engagement is logged.
//! - Combined variants return `l_t` / `LLH` from the same pass.
use crate::regarch::{
    core::{data::ValueState, options::NumericOpts},
    errors::RegArchResult,
    models::{walk_dates, DerivOrder, RegArchModel},
};
use ndarray::{Array1, Array2};
use tracing::debug;

/// regarch_lt_and_grad_lt — `l_t` and `∇l_t` for every date.
///
/// Parameters
/// ----------
/// - `model`: `&RegArchModel`
/// - `st`: `&mut ValueState`
///   Data; derived arrays are overwritten.
/// - `opts`: `&NumericOpts`
///   Steps for components without a closed-form gradient.
///
/// Returns
/// -------
/// `RegArchResult<(Array1<f64>, Array2<f64>)>`
///   `l` of length `N` and the `N × n` matrix whose row `t` is `∇l_t`.
///
/// Errors
/// ------
/// - Any structural or numerical error of the forward pass.
pub fn regarch_lt_and_grad_lt(
    model: &RegArchModel, st: &mut ValueState, opts: &NumericOpts,
) -> RegArchResult<(Array1<f64>, Array2<f64>)> {
    debug!(n_obs = st.len(), n_param = model.n_param(), "evaluating per-date gradients");
    let mut acc = (Array1::<f64>::zeros(st.len()), Array2::<f64>::zeros((st.len(), model.n_param())));
    walk_dates(
        model,
        st,
        DerivOrder::Grad,
        opts,
        &mut acc,
        |entry, (lt, grads)| {
            lt[entry.t] = entry.lt;
            if let Some(g) = entry.grad {
                grads.row_mut(entry.t).assign(g);
            }
            Ok(())
        },
        |_, _| Ok(()),
    )?;
    Ok(acc)
}

/// regarch_grad_lt — `N × n` matrix of per-date gradients.
pub fn regarch_grad_lt(
    model: &RegArchModel, st: &mut ValueState, opts: &NumericOpts,
) -> RegArchResult<Array2<f64>> {
    Ok(regarch_lt_and_grad_lt(model, st, opts)?.1)
}

/// regarch_llh_and_grad_llh — `Σ_t l_t` and `Σ_t ∇l_t` in one pass.
pub fn regarch_llh_and_grad_llh(
    model: &RegArchModel, st: &mut ValueState, opts: &NumericOpts,
) -> RegArchResult<(f64, Array1<f64>)> {
    debug!(n_obs = st.len(), n_param = model.n_param(), "evaluating log-likelihood gradient");
    let mut acc = (0.0, Array1::<f64>::zeros(model.n_param()));
    walk_dates(
        model,
        st,
        DerivOrder::Grad,
        opts,
        &mut acc,
        |entry, (llh, grad)| {
            *llh += entry.lt;
            if let Some(g) = entry.grad {
                *grad += g;
            }
            Ok(())
        },
        |_, _| Ok(()),
    )?;
    Ok(acc)
}

/// regarch_grad_llh — `∇LLH = Σ_t ∇l_t`.
pub fn regarch_grad_llh(
    model: &RegArchModel, st: &mut ValueState, opts: &NumericOpts,
) -> RegArchResult<Array1<f64>> {
    Ok(regarch_llh_and_grad_llh(model, st, opts)?.1)
}
