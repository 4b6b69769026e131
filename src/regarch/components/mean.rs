//! components::mean — conditional-mean terms.
//!
//! Purpose
//! -------
//! Implement the additive terms of `m_t`: constant, AR(p), MA(q), linear
//! regression on exogenous regressors, standard-deviation-in-mean,
//! variance-in-mean and a truncated ARFIMA(p, d, q).
//!
//! Key behaviors
//! -------------
//! - [`MeanComponent::value`] evaluates the term at date `t` from the
//!   observed series, earlier residuals and the current `h_t`.
//! - [`MeanComponent::add_grad`] / [`MeanComponent::add_hess`] accumulate
//!   the term's first and second θ-derivatives into full-length buffers.
//!   ARFIMA has no closed form and is differentiated numerically by the
//!   caller.
//! - [`MeanComponent::update_proxy`] refreshes the cached ARFIMA MA(∞)
//!   weights after every parameter change.
//!
//! Invariants & assumptions
//! ------------------------
//! - In-mean terms read `h_t` (and its derivatives) for the current date,
//!   so the variance must be evaluated before the mean at each date.
//! - Residual lags before the sample are dropped unless a pre-sample window
//!   supplies them; such values carry zero derivative.
//!
//! Conventions
//! -----------
//! - AR: `Σ φ_i y_{t−i}`; MA: `Σ θ_j u_{t−j}`; ARFIMA:
//!   `Σ_{k=1}^{K} ψ_k u_{t−k}` with `ψ` from
//!   [`fractional::arfima_psi`].
use crate::regarch::{
    components::{add_sym_unit, fractional, validate_trunc, DerivCtx},
    core::{constants::DEFAULT_TRUNC_LAG, data::ValueState, params::ParamBlock},
    errors::{RegArchError, RegArchResult},
};
use ndarray::{Array1, Array2};

/// Mean component type tag; at most one component per tag in a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeanType {
    Const,
    Ar,
    Ma,
    LinReg,
    StdDevInMean,
    VarInMean,
    Arfima,
}

impl MeanType {
    pub fn name(&self) -> &'static str {
        match self {
            MeanType::Const => "Const",
            MeanType::Ar => "Ar",
            MeanType::Ma => "Ma",
            MeanType::LinReg => "LinReg",
            MeanType::StdDevInMean => "StdDevInMean",
            MeanType::VarInMean => "VarInMean",
            MeanType::Arfima => "Arfima",
        }
    }
}

/// Structural orders of a mean component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeanSpec {
    Const,
    Ar { p: usize },
    Ma { q: usize },
    LinReg { k: usize },
    StdDevInMean,
    VarInMean,
    Arfima { p: usize, q: usize, trunc: usize },
}

impl MeanSpec {
    /// ARFIMA(p, d, q) truncated at [`DEFAULT_TRUNC_LAG`].
    pub fn arfima(p: usize, q: usize) -> MeanSpec {
        MeanSpec::Arfima { p, q, trunc: DEFAULT_TRUNC_LAG }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeanComponent {
    spec: MeanSpec,
    params: ParamBlock,
    psi: Vec<f64>,
}

impl MeanComponent {
    /// Build a component with all parameters at zero.
    ///
    /// Errors
    /// ------
    /// - `InvalidStructure` for a zero ARFIMA truncation lag.
    pub fn new(spec: MeanSpec) -> RegArchResult<Self> {
        let params = match spec {
            MeanSpec::Const => ParamBlock::builder().scalar("Const").build(),
            MeanSpec::Ar { p } => ParamBlock::builder().lags("Ar", p).build(),
            MeanSpec::Ma { q } => ParamBlock::builder().lags("Ma", q).build(),
            MeanSpec::LinReg { k } => ParamBlock::builder().lags("LinReg", k).build(),
            MeanSpec::StdDevInMean => ParamBlock::builder().scalar("StdDevInMean").build(),
            MeanSpec::VarInMean => ParamBlock::builder().scalar("VarInMean").build(),
            MeanSpec::Arfima { p, q, trunc } => {
                validate_trunc(trunc)?;
                ParamBlock::builder().lags("ArfimaAr", p).lags("ArfimaMa", q).scalar("FracD").build()
            }
        };
        let mut comp = MeanComponent { spec, params, psi: Vec::new() };
        comp.update_proxy();
        Ok(comp)
    }

    /// Builder-style assignment of the whole block.
    pub fn with_values(mut self, values: &[f64]) -> RegArchResult<Self> {
        self.assign(values)?;
        Ok(self)
    }

    pub fn kind(&self) -> MeanType {
        match self.spec {
            MeanSpec::Const => MeanType::Const,
            MeanSpec::Ar { .. } => MeanType::Ar,
            MeanSpec::Ma { .. } => MeanType::Ma,
            MeanSpec::LinReg { .. } => MeanType::LinReg,
            MeanSpec::StdDevInMean => MeanType::StdDevInMean,
            MeanSpec::VarInMean => MeanType::VarInMean,
            MeanSpec::Arfima { .. } => MeanType::Arfima,
        }
    }

    pub fn spec(&self) -> MeanSpec {
        self.spec
    }

    pub fn params(&self) -> &ParamBlock {
        &self.params
    }

    pub fn n_param(&self) -> usize {
        self.params.len()
    }

    /// Largest lag the component reads.
    pub fn n_lags(&self) -> usize {
        match self.spec {
            MeanSpec::Ar { p } => p,
            MeanSpec::Ma { q } => q,
            MeanSpec::Arfima { trunc, .. } => trunc,
            _ => 0,
        }
    }

    pub fn has_analytic_grad(&self) -> bool {
        !matches!(self.spec, MeanSpec::Arfima { .. })
    }

    pub fn has_analytic_hess(&self) -> bool {
        self.has_analytic_grad()
    }

    pub fn assign(&mut self, values: &[f64]) -> RegArchResult<()> {
        self.params.assign(values)?;
        self.update_proxy();
        Ok(())
    }

    pub fn set_by_name(&mut self, name: &str, value: f64) -> RegArchResult<()> {
        self.params.set_by_name(name, value)?;
        self.update_proxy();
        Ok(())
    }

    pub(crate) fn set_at(&mut self, i: usize, value: f64) -> RegArchResult<()> {
        self.params.set(i, value)?;
        self.update_proxy();
        Ok(())
    }

    /// Refresh parameter-derived caches (ARFIMA weights).
    pub fn update_proxy(&mut self) {
        if let MeanSpec::Arfima { p, q, trunc } = self.spec {
            let b = self.params.as_slice();
            self.psi = fractional::arfima_psi(&b[..p], &b[p..p + q], b[p + q], trunc);
        }
    }

    /// ARFIMA MA(∞) weights (empty for other types).
    pub fn psi(&self) -> &[f64] {
        &self.psi
    }

    /// Starting values: the constant gets the sample mean, the ARFIMA
    /// memory parameter starts at 0.1 and everything else at zero.
    pub fn set_default_init_point(&mut self, mean: f64) -> RegArchResult<()> {
        let n = self.n_param();
        let mut values = vec![0.0; n];
        if let MeanSpec::Const = self.spec {
            values[0] = mean;
        }
        if let MeanSpec::Arfima { p, q, .. } = self.spec {
            values[p + q] = 0.1;
        }
        self.assign(&values)
    }

    /// Fail when the data do not carry enough mean regressors.
    pub fn check_data(&self, state: &ValueState) -> RegArchResult<()> {
        if let MeanSpec::LinReg { k } = self.spec {
            let available = state.n_mean_regressors();
            if available < k {
                return Err(RegArchError::MissingRegressors { which: "mean", needed: k, available });
            }
        }
        Ok(())
    }

    /// Term value at date `t`. Requires `h_t` to be already filled.
    pub fn value(&self, t: usize, state: &ValueState) -> f64 {
        let b = self.params.as_slice();
        match self.spec {
            MeanSpec::Const => b[0],
            MeanSpec::Ar { p } => {
                (1..=p).filter_map(|i| state.y_lag(t, i).map(|y| b[i - 1] * y)).sum()
            }
            MeanSpec::Ma { q } => {
                (1..=q).filter_map(|j| state.u_lag(t, j).map(|u| b[j - 1] * u)).sum()
            }
            MeanSpec::LinReg { k } => (0..k).map(|i| b[i] * state.x(t, i)).sum(),
            MeanSpec::StdDevInMean => b[0] * state.ht[t].sqrt(),
            MeanSpec::VarInMean => b[0] * state.ht[t],
            MeanSpec::Arfima { trunc, .. } => (1..=trunc)
                .filter_map(|k| state.u_lag(t, k).map(|u| self.psi[k] * u))
                .sum(),
        }
    }

    /// Add `∇m_t` contributions of this term to `out`.
    ///
    /// Errors
    /// ------
    /// - `InvalidStructure` for ARFIMA (numeric path only).
    /// - `LagOutOfWindow` if the derivative stack window is too short.
    pub fn add_grad(&self, ctx: &DerivCtx<'_>, out: &mut Array1<f64>) -> RegArchResult<()> {
        let (t, st, o) = (ctx.t, ctx.state, ctx.offset);
        let b = self.params.as_slice();
        match self.spec {
            MeanSpec::Const => out[o] += 1.0,
            MeanSpec::Ar { p } => {
                for i in 1..=p {
                    if let Some(y) = st.y_lag(t, i) {
                        out[o + i - 1] += y;
                    }
                }
            }
            MeanSpec::Ma { q } => {
                for j in 1..=q {
                    if let Some(u) = st.u_lag(t, j) {
                        out[o + j - 1] += u;
                        out.scaled_add(-b[j - 1], ctx.grad_mu(j)?);
                    }
                }
            }
            MeanSpec::LinReg { k } => {
                for i in 0..k {
                    out[o + i] += st.x(t, i);
                }
            }
            MeanSpec::StdDevInMean => {
                out[o] += st.ht[t].sqrt();
                out.scaled_add(b[0], &ctx.grad.grad_sigma);
            }
            MeanSpec::VarInMean => {
                out[o] += st.ht[t];
                out.scaled_add(b[0], ctx.grad.grad_var.current());
            }
            MeanSpec::Arfima { .. } => return Err(no_closed_form()),
        }
        Ok(())
    }

    /// Add `∇²m_t` contributions of this term to `out`.
    pub fn add_hess(&self, ctx: &DerivCtx<'_>, out: &mut Array2<f64>) -> RegArchResult<()> {
        let o = ctx.offset;
        let b = self.params.as_slice();
        match self.spec {
            MeanSpec::Const | MeanSpec::Ar { .. } | MeanSpec::LinReg { .. } => {}
            MeanSpec::Ma { q } => {
                let hs = ctx.hess_stack()?;
                for j in 1..=q {
                    if ctx.state.u_lag(ctx.t, j).is_some() {
                        add_sym_unit(out, o + j - 1, ctx.grad_mu(j)?.view(), -1.0);
                        out.scaled_add(-b[j - 1], hs.hess_mu.lag(j)?);
                    }
                }
            }
            MeanSpec::StdDevInMean => {
                let hs = ctx.hess_stack()?;
                add_sym_unit(out, o, ctx.grad.grad_sigma.view(), 1.0);
                out.scaled_add(b[0], &hs.hess_sigma);
            }
            MeanSpec::VarInMean => {
                let hs = ctx.hess_stack()?;
                add_sym_unit(out, o, ctx.grad.grad_var.current().view(), 1.0);
                out.scaled_add(b[0], hs.hess_var.current());
            }
            MeanSpec::Arfima { .. } => return Err(no_closed_form()),
        }
        Ok(())
    }
}

fn no_closed_form() -> RegArchError {
    RegArchError::InvalidStructure { reason: "component has no closed-form derivative" }
}
