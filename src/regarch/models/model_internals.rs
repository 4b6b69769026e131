//! models::model_internals — per-date recursion driver.
//!
//! Purpose
//! -------
//! Provide the date-by-date machinery every top-level algorithm shares:
//! filling `h_t, m_t, u_t, ε_t` at one date, evaluating the log-likelihood
//! contribution, propagating first and second derivatives through the
//! gradient/Hessian stacks, and walking all dates with caller-supplied
//! step/finish closures.
//!
//! Key behaviors
//! -------------
//! - [`compute_value_at`] evaluates the variance first (checked strictly
//!   positive, never clamped), then the mean (in-mean terms read the
//!   current `h_t`), then `u_t` and `ε_t`.
//! - [`compute_grad_at`] fills, in order, `∇h_t`, `∇σ_t`, `∇m_t`, `∇ε_t` and
//!   `∇l_t` into the current stack slots; [`compute_hess_at`] mirrors this
//!   with second derivatives. Components without closed forms are routed
//!   to [`NumericDerivative`] paths.
//! - [`walk_dates`] drives Init → Compute → Differentiate → Advance for
//!   `t = 0..N−1` and hands each date's `(l_t, ∇l_t, ∇²l_t)` to `step`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Stacks are created fresh per pass with window `model.n_lags()`; slots
//!   addressing dates before the sample stay zero, which is the derivative
//!   of both omitted lag terms and constant pre-sample values.
//! - A stack sized for another layout is rejected by `ensure_size`.
//!
//! Conventions
//! -----------
//! - `l_t = log f(ε_t; β) − ½ ln h_t`.
//! - `∇σ = ∇h / (2σ)`, `∇ε = (−∇m − ε ∇σ) / σ`,
//!   `∇l = e_β ∇_β log f + f′ ∇ε − ∇σ / σ`.
//! - `∇²σ = ∇²h / (2σ) − ∇h ∇hᵀ / (4σ³)`,
//!   `∇²ε = −(∇²m + ∇ε ∇σᵀ + ∇σ ∇εᵀ + ε ∇²σ) / σ`,
//!   `∇²l = e_β ∇²_β log f e_βᵀ + (∂_β f′) ∇εᵀ + ∇ε (∂_β f′)ᵀ + f″ ∇ε ∇εᵀ
//!   + f′ ∇²ε − ∇²σ / σ + ∇σ ∇σᵀ / σ²`.
use crate::regarch::{
    components::{add_outer, add_sym_outer, DerivCtx, EspAbsEps},
    core::{
        constants::{MAX_COND_MEAN, MAX_COND_VAR},
        data::ValueState,
        options::NumericOpts,
        stack::{GradStack, HessStack},
        validation::{check_mean, check_variance},
    },
    errors::{RegArchError, RegArchResult},
    models::{
        model::RegArchModel,
        numeric::{NumericDerivative, Target},
    },
};
use ndarray::{s, Array1, Array2};
use tracing::debug;

/// Derivative order requested from a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DerivOrder {
    Value,
    Grad,
    Hess,
}

/// One date handed to a [`walk_dates`] step closure.
#[derive(Debug, Clone, Copy)]
pub struct DateEntry<'a> {
    pub t: usize,
    /// `l_t`.
    pub lt: f64,
    /// `∇l_t` (present from `DerivOrder::Grad`).
    pub grad: Option<&'a Array1<f64>>,
    /// `∇²l_t` (present for `DerivOrder::Hess`).
    pub hess: Option<&'a Array2<f64>>,
}

/// Fill `h_t`, `m_t`, `u_t` and `ε_t` at date `t`.
///
/// Errors
/// ------
/// - `NonPositiveVariance` if `h_t ≤ 0` or is not finite.
/// - `NonFiniteValue` if `h_t` or `m_t` explodes.
pub fn compute_value_at(model: &RegArchModel, st: &mut ValueState, t: usize) -> RegArchResult<()> {
    let h = check_variance(t, model.var().value(t, st, model.esp_abs_eps()), MAX_COND_VAR)?;
    st.ht[t] = h;
    let m = check_mean(t, model.mean().value(t, st), MAX_COND_MEAN)?;
    st.mt[t] = m;
    let u = st.yt[t] - m;
    st.ut[t] = u;
    st.epst[t] = u / h.sqrt();
    Ok(())
}

/// `l_t` from already filled values.
pub fn log_density_at(model: &RegArchModel, st: &ValueState, t: usize) -> RegArchResult<f64> {
    Ok(model.distr().log_density(st.epst[t])? - 0.5 * st.ht[t].ln())
}

/// Forward pass over every date without derivatives.
pub fn fill_value(model: &RegArchModel, st: &mut ValueState) -> RegArchResult<()> {
    model.check_data(st)?;
    (0..st.len()).try_for_each(|t| compute_value_at(model, st, t))
}

/// First-order derivatives at date `t` (values at `t` must be filled).
///
/// Errors
/// ------
/// - `StackSizeMismatch` / `LagOutOfWindow` for a stack sized for another
///   model.
/// - `InvalidStructure` if a component needs the numeric fallback and no
///   paths were supplied.
pub fn compute_grad_at(
    model: &RegArchModel, st: &ValueState, t: usize, gs: &mut GradStack, esp: &EspAbsEps,
    numeric: Option<&NumericDerivative>,
) -> RegArchResult<()> {
    let n = model.n_param();
    gs.ensure_size(n, model.n_lags())?;
    let off = model.offsets();
    let (h, eps) = (st.ht[t], st.epst[t]);
    let sigma = h.sqrt();

    let mut gh = Array1::<f64>::zeros(n);
    {
        let ctx = DerivCtx { t, state: st, grad: gs, hess: None, esp, offset: off.var };
        if model.var().has_analytic_grad() {
            model.var().add_grad(&ctx, &mut gh)?;
        } else {
            gh += &paths(numeric)?.grad(Target::Variance, t)?;
        }
    }
    gs.grad_sigma = &gh / (2.0 * sigma);
    *gs.grad_var.current_mut() = gh;

    let mut gm = Array1::<f64>::zeros(n);
    {
        let ctx = DerivCtx { t, state: st, grad: gs, hess: None, esp, offset: off.mean };
        model.mean().add_grad(&ctx, &mut gm, |k, out| {
            *out += &paths(numeric)?.grad(Target::Mean(k), t)?;
            Ok(())
        })?;
    }

    let mut ge = -&gm;
    ge.scaled_add(-eps, &gs.grad_sigma);
    ge /= sigma;
    *gs.grad_mu.current_mut() = gm;

    let d = model.distr();
    let f1 = d.diff_log_density(eps);
    let mut gl = &ge * f1;
    gl.scaled_add(-1.0 / sigma, &gs.grad_sigma);
    if d.n_param() > 0 {
        let gb = d.grad_log_density(eps)?;
        let mut block = gl.slice_mut(s![off.distr..off.distr + d.n_param()]);
        block += &gb;
    }
    *gs.grad_eps.current_mut() = ge;
    gs.diff_log_density = f1;
    gs.grad_log_dens = gl;
    Ok(())
}

/// Second-order derivatives at date `t`; `compute_grad_at` must have run
/// for the same date on `gs`.
///
/// Errors
/// ------
/// - `NonFiniteValue` when `∂² log f / ∂x²` is infinite at `ε_t` (GED with
///   shape below 2 at `ε_t = 0`).
pub fn compute_hess_at(
    model: &RegArchModel, st: &ValueState, t: usize, gs: &GradStack, hs: &mut HessStack,
    esp: &EspAbsEps, numeric: Option<&NumericDerivative>,
) -> RegArchResult<()> {
    let n = model.n_param();
    hs.ensure_size(n, model.n_lags())?;
    let off = model.offsets();
    let (h, eps) = (st.ht[t], st.epst[t]);
    let sigma = h.sqrt();

    let mut hh = Array2::<f64>::zeros((n, n));
    {
        let ctx = DerivCtx { t, state: st, grad: gs, hess: Some(&*hs), esp, offset: off.var };
        if model.var().has_analytic_hess() {
            model.var().add_hess(&ctx, &mut hh)?;
        } else {
            hh += &paths(numeric)?.hess(Target::Variance, t, h)?;
        }
    }
    let gh = gs.grad_var.current();
    let mut hsig = &hh / (2.0 * sigma);
    add_outer(&mut hsig, gh.view(), -1.0 / (4.0 * sigma * sigma * sigma));
    *hs.hess_var.current_mut() = hh;
    hs.hess_sigma = hsig;

    let mut hm = Array2::<f64>::zeros((n, n));
    {
        let ctx = DerivCtx { t, state: st, grad: gs, hess: Some(&*hs), esp, offset: off.mean };
        model.mean().add_hess(&ctx, &mut hm, |k, out| {
            let f0 = model.mean().components()[k].value(t, st);
            *out += &paths(numeric)?.hess(Target::Mean(k), t, f0)?;
            Ok(())
        })?;
    }

    let (ge, gsig) = (gs.grad_eps.current(), &gs.grad_sigma);
    let mut he = -&hm;
    add_sym_outer(&mut he, ge.view(), gsig.view(), -1.0);
    he.scaled_add(-eps, &hs.hess_sigma);
    he /= sigma;
    *hs.hess_mu.current_mut() = hm;

    let d = model.distr();
    let f1 = gs.diff_log_density;
    let f2 = d.diff2_log_density(eps);
    if !f2.is_finite() {
        return Err(RegArchError::NonFiniteValue {
            t,
            what: "second x-derivative of log density",
            value: f2,
        });
    }
    let mut hl = &he * f1;
    add_outer(&mut hl, ge.view(), f2);
    hl.scaled_add(-1.0 / sigma, &hs.hess_sigma);
    add_outer(&mut hl, gsig.view(), 1.0 / h);
    let k = d.n_param();
    if k > 0 {
        let mut gdf = Array1::<f64>::zeros(n);
        gdf.slice_mut(s![off.distr..off.distr + k]).assign(&d.grad_diff_log_density(eps)?);
        add_sym_outer(&mut hl, gdf.view(), ge.view(), 1.0);
        let mut block = hl.slice_mut(s![off.distr..off.distr + k, off.distr..off.distr + k]);
        block += &d.hess_log_density(eps)?;
        hs.grad_diff_log_density = gdf;
    }
    *hs.hess_eps.current_mut() = he;
    hs.hess_log_dens = hl;
    Ok(())
}

fn paths(numeric: Option<&NumericDerivative>) -> RegArchResult<&NumericDerivative> {
    numeric.ok_or(RegArchError::InvalidStructure {
        reason: "numeric fallback required but no perturbed paths were built",
    })
}

/// Walk every date of `st`, filling values and (per `order`) derivatives.
///
/// Parameters
/// ----------
/// - `model`: parameters and structure.
/// - `st`: data and derived arrays; derived arrays are overwritten.
/// - `order`: `Value`, `Grad` or `Hess`.
/// - `opts`: finite-difference steps for components without closed forms.
///   First-derivative fallbacks always use `grad_step`, so `∇l_t` does
///   not depend on the requested order; second-derivative fallbacks use
///   `hess_step` on a separate set of perturbed paths.
/// - `acc`: caller accumulator threaded through `step` and `finish`.
/// - `step`: called once per date, in date order, after differentiation.
/// - `finish`: called once after the last date.
///
/// Errors
/// ------
/// - The first structural or numerical error aborts the walk.
pub fn walk_dates<S, Step, Finish>(
    model: &RegArchModel, st: &mut ValueState, order: DerivOrder, opts: &NumericOpts, acc: &mut S,
    mut step: Step, mut finish: Finish,
) -> RegArchResult<()>
where
    Step: FnMut(DateEntry<'_>, &mut S) -> RegArchResult<()>,
    Finish: FnMut(&ValueState, &mut S) -> RegArchResult<()>,
{
    model.check_data(st)?;
    let n = model.n_param();
    let window = model.n_lags();
    let want_grad = order >= DerivOrder::Grad;
    let want_hess = order == DerivOrder::Hess;
    let esp = model.esp_terms(want_grad, want_hess)?;
    let mut gs = want_grad.then(|| GradStack::new(n, window));
    let mut hs = want_hess.then(|| HessStack::new(n, window));

    let grad_fallback = if want_grad { model.numeric_components(false) } else { Vec::new() };
    let hess_fallback = if want_hess { model.numeric_components(true) } else { Vec::new() };
    let mut numeric_grad = if grad_fallback.is_empty() {
        None
    } else {
        debug!(components = ?grad_fallback, step = opts.grad_step, "numeric derivative fallback engaged");
        Some(NumericDerivative::new(model, st, opts.grad_step, false)?)
    };
    let mut numeric_hess = if hess_fallback.is_empty() {
        None
    } else {
        debug!(components = ?hess_fallback, step = opts.hess_step, "numeric derivative fallback engaged");
        Some(NumericDerivative::new(model, st, opts.hess_step, true)?)
    };

    for t in 0..st.len() {
        compute_value_at(model, st, t)?;
        for nd in numeric_grad.iter_mut().chain(numeric_hess.iter_mut()) {
            nd.advance(t)?;
        }
        let lt = log_density_at(model, st, t)?;
        if let Some(g) = gs.as_mut() {
            compute_grad_at(model, st, t, g, &esp, numeric_grad.as_ref())?;
        }
        if let (Some(g), Some(hstack)) = (gs.as_ref(), hs.as_mut()) {
            compute_hess_at(model, st, t, g, hstack, &esp, numeric_hess.as_ref())?;
        }
        let entry = DateEntry {
            t,
            lt,
            grad: gs.as_ref().map(|g| &g.grad_log_dens),
            hess: hs.as_ref().map(|h| &h.hess_log_dens),
        };
        step(entry, acc)?;
        if let Some(g) = gs.as_mut() {
            g.advance();
        }
        if let Some(h) = hs.as_mut() {
            h.advance();
        }
    }
    finish(st, acc)
}
