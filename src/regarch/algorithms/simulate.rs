//! algorithms::simulate — forward simulation of a RegArch model.
//!
//! Purpose
//! -------
//! Generate a path `y_t = m_t + σ_t ε_t` where `m_t` and `h_t = σ_t²` are
//! computed from already simulated past values and `ε_t` is drawn from the
//! model's residual law (or supplied by the caller).
//!
//! Key behaviors
//! -------------
//! - [`regarch_simul`] draws `burn_in + n` residuals from a `StdRng`
//!   (seeded when `SimOpts::seed` is set) and discards the burn-in. The
//!   returned state keeps the last `n_lags` burn-in dates as its
//!   pre-sample window, so re-evaluating it reproduces the simulated
//!   `m_t` and `h_t` exactly.
//! - [`regarch_simul_with_draws`] consumes a fixed standardized residual
//!   sequence and is bit-reproducible.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every `h_t` is checked strictly positive; a violation aborts the
//!   simulation with `NonPositiveVariance`.
//! - Regressor matrices, when present, cover burn-in and sample dates
//!   (`burn_in + n` rows).
use crate::regarch::{
    core::{
        constants::{MAX_COND_MEAN, MAX_COND_VAR},
        data::{PreSample, ValueState},
        options::SimOpts,
        validation::{check_mean, check_variance, validate_finite},
    },
    errors::{RegArchError, RegArchResult},
    models::RegArchModel,
};
use ndarray::{s, Array1, Array2};
use rand::{rngs::StdRng, SeedableRng};
use tracing::debug;

/// regarch_simul — simulate `n` dates after an optional burn-in.
///
/// Parameters
/// ----------
/// - `model`: `&RegArchModel`
///   Model whose current parameters drive the simulation.
/// - `n`: `usize`
///   Number of dates returned (must be > 0).
/// - `xt`, `xvt`: `Option<Array2<f64>>`
///   Mean / variance regressors with `opts.burn_in + n` rows.
/// - `opts`: `&SimOpts`
///   Seed and burn-in length.
///
/// Returns
/// -------
/// `RegArchResult<ValueState>`
///   A state with `yt` simulated and `mt`, `ht`, `ut`, `epst` filled. With a
///   burn-in, the pre-sample window holds the burn-in tail.
///
/// Errors
/// ------
/// - `EmptySeries` if `n = 0`.
/// - `RegressorLengthMismatch` / `MissingRegressors` for unusable
///   regressors.
/// - `NonPositiveVariance` / `NonFiniteValue` if the recursion degenerates.
/// - `InvalidDistributionParam` if the residual law rejects its shape.
pub fn regarch_simul(
    model: &RegArchModel, n: usize, xt: Option<Array2<f64>>, xvt: Option<Array2<f64>>,
    opts: &SimOpts,
) -> RegArchResult<ValueState> {
    if n == 0 {
        return Err(RegArchError::EmptySeries);
    }
    debug!(n, burn_in = opts.burn_in, seed = ?opts.seed, "simulating RegArch path");
    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let draws = model.distr().generate(opts.burn_in + n, &mut rng)?;
    let full = regarch_simul_with_draws(model, &draws, xt, xvt)?;
    split_burn_in(full, opts.burn_in, model.n_lags())
}

/// regarch_simul_with_draws — simulate from caller-supplied residuals.
///
/// Parameters
/// ----------
/// - `model`: `&RegArchModel`
/// - `draws`: `&Array1<f64>`
///   Standardized residuals `ε_0..ε_{N−1}`; its length sets `N`.
/// - `xt`, `xvt`: `Option<Array2<f64>>`
///   Regressors with `N` rows.
///
/// Errors
/// ------
/// - `EmptySeries` / `NonFiniteData` for an empty or non-finite draw
///   sequence.
/// - Same recursion errors as [`regarch_simul`].
pub fn regarch_simul_with_draws(
    model: &RegArchModel, draws: &Array1<f64>, xt: Option<Array2<f64>>, xvt: Option<Array2<f64>>,
) -> RegArchResult<ValueState> {
    let mut st = ValueState::zeros(draws.len(), xt, xvt)?;
    validate_finite(draws)?;
    model.check_data(&st)?;
    let esp = model.esp_abs_eps();
    for (t, &eps) in draws.iter().enumerate() {
        let h = check_variance(t, model.var().value(t, &st, esp), MAX_COND_VAR)?;
        st.ht[t] = h;
        let m = check_mean(t, model.mean().value(t, &st), MAX_COND_MEAN)?;
        st.mt[t] = m;
        let u = h.sqrt() * eps;
        st.ut[t] = u;
        st.epst[t] = eps;
        st.yt[t] = m + u;
    }
    Ok(st)
}

/// Drop the first `burn_in` dates, keeping the last `window` of them as the
/// pre-sample window of the returned state.
fn split_burn_in(full: ValueState, burn_in: usize, window: usize) -> RegArchResult<ValueState> {
    if burn_in == 0 {
        return Ok(full);
    }
    let tail = |x: &Option<Array2<f64>>| x.as_ref().map(|m| m.slice(s![burn_in.., ..]).to_owned());
    let mut st = ValueState::new(
        full.yt.slice(s![burn_in..]).to_owned(),
        tail(&full.xt),
        tail(&full.xvt),
    )?;
    st.mt = full.mt.slice(s![burn_in..]).to_owned();
    st.ht = full.ht.slice(s![burn_in..]).to_owned();
    st.ut = full.ut.slice(s![burn_in..]).to_owned();
    st.epst = full.epst.slice(s![burn_in..]).to_owned();

    let keep = window.min(burn_in);
    if keep == 0 {
        return Ok(st);
    }
    let pre = s![burn_in - keep..burn_in];
    let presample = PreSample::new(
        full.yt.slice(pre).to_owned(),
        full.ut.slice(pre).to_owned(),
        full.ht.slice(pre).to_owned(),
    )?;
    Ok(st.with_presample(presample))
}
