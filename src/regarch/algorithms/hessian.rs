//! algorithms::hessian — per-date and total log-likelihood Hessians.
//!
//! Purpose
//! -------
//! Run one forward pass with first- and second-order derivatives and
//! collect `∇²l_t` per date (an `N × n × n` tensor) or their sum.
//!
//! Key behaviors
//! -------------
//! - Components without a closed-form Hessian are routed to numeric paths
//!   with step `opts.hess_step`; components without a closed-form gradient
//!   get their first derivatives from separate paths with `opts.grad_step`.
//! - Per-date Hessians are symmetric by construction.
use crate::regarch::{
    core::{data::ValueState, options::NumericOpts},
    errors::RegArchResult,
    models::{walk_dates, DerivOrder, RegArchModel},
};
use ndarray::{Array1, Array2, Array3};
use tracing::debug;

/// regarch_lt_grad_and_hess_lt — `l_t`, `∇l_t` and `∇²l_t` for every date.
///
/// Returns
/// -------
/// `RegArchResult<(Array1<f64>, Array2<f64>, Array3<f64>)>`
///   `l` (`N`), gradients (`N × n`) and Hessians (`N × n × n`).
///
/// Errors
/// ------
/// - Any structural or numerical error of the forward pass.
pub fn regarch_lt_grad_and_hess_lt(
    model: &RegArchModel, st: &mut ValueState, opts: &NumericOpts,
) -> RegArchResult<(Array1<f64>, Array2<f64>, Array3<f64>)> {
    let (n_obs, n) = (st.len(), model.n_param());
    debug!(n_obs, n_param = n, "evaluating per-date Hessians");
    let mut acc = (
        Array1::<f64>::zeros(n_obs),
        Array2::<f64>::zeros((n_obs, n)),
        Array3::<f64>::zeros((n_obs, n, n)),
    );
    walk_dates(
        model,
        st,
        DerivOrder::Hess,
        opts,
        &mut acc,
        |entry, (lt, grads, hess)| {
            lt[entry.t] = entry.lt;
            if let Some(g) = entry.grad {
                grads.row_mut(entry.t).assign(g);
            }
            if let Some(h) = entry.hess {
                hess.index_axis_mut(ndarray::Axis(0), entry.t).assign(h);
            }
            Ok(())
        },
        |_, _| Ok(()),
    )?;
    Ok(acc)
}

/// regarch_grad_and_hess_lt — per-date gradients and Hessians.
pub fn regarch_grad_and_hess_lt(
    model: &RegArchModel, st: &mut ValueState, opts: &NumericOpts,
) -> RegArchResult<(Array2<f64>, Array3<f64>)> {
    let (_, g, h) = regarch_lt_grad_and_hess_lt(model, st, opts)?;
    Ok((g, h))
}

/// regarch_hess_lt — `N × n × n` tensor of per-date Hessians.
pub fn regarch_hess_lt(
    model: &RegArchModel, st: &mut ValueState, opts: &NumericOpts,
) -> RegArchResult<Array3<f64>> {
    Ok(regarch_lt_grad_and_hess_lt(model, st, opts)?.2)
}

/// regarch_hess_llh — `∇²LLH = Σ_t ∇²l_t`.
pub fn regarch_hess_llh(
    model: &RegArchModel, st: &mut ValueState, opts: &NumericOpts,
) -> RegArchResult<Array2<f64>> {
    let n = model.n_param();
    debug!(n_obs = st.len(), n_param = n, "evaluating log-likelihood Hessian");
    let mut total = Array2::<f64>::zeros((n, n));
    walk_dates(
        model,
        st,
        DerivOrder::Hess,
        opts,
        &mut total,
        |entry, acc| {
            if let Some(h) = entry.hess {
                *acc += h;
            }
            Ok(())
        },
        |_, _| Ok(()),
    )?;
    Ok(total)
}
