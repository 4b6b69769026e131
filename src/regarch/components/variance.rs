//! components::variance — conditional-variance equations.
//!
//! Purpose
//! -------
//! Implement the single conditional-variance component of a model: constant,
//! ARCH, GARCH, EGARCH, APARCH, TARCH, GTARCH, NAGARCH, NGARCH, FIGARCH,
//! square-root GARCH (Heston–Nandi), TS-GARCH and a user GARCH with variance
//! regressors.
//!
//! Key behaviors
//! -------------
//! - Types are grouped into computational families sharing one value and
//!   derivative routine:
//!   - quadratic: `h = ω + Σ α_i u²_{t−i} + Σ β_j h_{t−j} + Σ b_k xv_{t,k}`
//!     with sign-dependent α for threshold models (Const, ARCH, GARCH,
//!     TARCH, GTARCH, UGARCH); closed-form gradient and Hessian.
//!   - log (EGARCH): `ln h = ω + Σ α_i (θ ε + γ(|ε| − E|ε|)) + Σ β_j ln h`.
//!   - power (APARCH, NGARCH, TS-GARCH): `σ^δ = ω + Σ α_i (|u| − γ_i u)^δ
//!     + Σ β_j σ^δ_{t−j}`; TS-GARCH fixes δ = 1 and NGARCH fixes γ = 0.
//!   - shifted quadratic (NAGARCH on `u − θσ`, square-root GARCH on
//!     `ε − γσ`).
//!   - fractional (FIGARCH): `h = ω / (1 − Σβ) + Σ_k λ_k u²_{t−k}`.
//! - Quadratic and log families have closed-form gradients and Hessians;
//!   power and shifted families a closed-form gradient only; FIGARCH is
//!   fully numeric. Callers consult the capability flags.
//!
//! Invariants & assumptions
//! ------------------------
//! - The value is returned unchecked; the fill pass rejects non-positive or
//!   exploding variances without clamping.
//! - Lags before the sample are omitted unless a pre-sample window exists.
//!
//! Conventions
//! -----------
//! - FIGARCH `Arch[i]` are the coefficients of `φ(L) = 1 − Σ φ_i L^i`.
//! - TARCH/GTARCH use `ArchPos` for `u > 0` and `ArchNeg` otherwise.
use crate::regarch::{
    components::{add_outer, add_sym_unit, fractional, validate_trunc, DerivCtx},
    core::{
        constants::{DEFAULT_TRUNC_LAG, SQRT_2_OVER_PI},
        data::ValueState,
        params::ParamBlock,
    },
    errors::{RegArchError, RegArchResult},
};
use ndarray::{Array1, Array2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    Const,
    Arch,
    Garch,
    Egarch,
    Aparch,
    Tarch,
    Gtarch,
    Nagarch,
    Ngarch,
    Figarch,
    Sqrgarch,
    Tsgarch,
    Ugarch,
}

impl VarType {
    pub fn name(&self) -> &'static str {
        match self {
            VarType::Const => "Const",
            VarType::Arch => "Arch",
            VarType::Garch => "Garch",
            VarType::Egarch => "Egarch",
            VarType::Aparch => "Aparch",
            VarType::Tarch => "Tarch",
            VarType::Gtarch => "Gtarch",
            VarType::Nagarch => "Nagarch",
            VarType::Ngarch => "Ngarch",
            VarType::Figarch => "Figarch",
            VarType::Sqrgarch => "Sqrgarch",
            VarType::Tsgarch => "Tsgarch",
            VarType::Ugarch => "Ugarch",
        }
    }
}

/// Structural orders: `p` ARCH-type lags, `q` GARCH-type lags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarSpec {
    Const,
    Arch { p: usize },
    Garch { p: usize, q: usize },
    Egarch { p: usize, q: usize },
    Aparch { p: usize, q: usize },
    Tarch { p: usize },
    Gtarch { p: usize, q: usize },
    Nagarch { p: usize, q: usize },
    Ngarch { p: usize, q: usize },
    Figarch { p: usize, q: usize, trunc: usize },
    Sqrgarch { p: usize, q: usize },
    Tsgarch { p: usize, q: usize },
    Ugarch { cste: bool, k: usize, p: usize, q: usize },
}

impl VarSpec {
    /// FIGARCH(p, d, q) truncated at [`DEFAULT_TRUNC_LAG`].
    pub fn figarch(p: usize, q: usize) -> VarSpec {
        VarSpec::Figarch { p, q, trunc: DEFAULT_TRUNC_LAG }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Family {
    Quadratic,
    Log,
    Power,
    Shifted,
    Fractional,
}

/// Resolved offsets of each group inside the block.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Slots {
    omega: Option<usize>,
    arch: usize,
    arch_neg: Option<usize>,
    p: usize,
    garch: usize,
    q: usize,
    regs: usize,
    k: usize,
    delta: Option<usize>,
    gamma: Option<usize>,
    teta: Option<usize>,
    frac_d: Option<usize>,
}

impl Slots {
    fn resolve(params: &ParamBlock) -> Slots {
        let group = |name: &str| params.group(name).ok().map(|g| (g.start, g.len));
        let (arch, p) = group("Arch").or_else(|| group("ArchPos")).unwrap_or((0, 0));
        let (garch, q) = group("Garch").unwrap_or((0, 0));
        let (regs, k) = group("Beta").unwrap_or((0, 0));
        Slots {
            omega: group("Const").map(|g| g.0),
            arch,
            arch_neg: group("ArchNeg").map(|g| g.0),
            p,
            garch,
            q,
            regs,
            k,
            delta: group("Delta").map(|g| g.0),
            gamma: group("Gamma").map(|g| g.0),
            teta: group("Teta").map(|g| g.0),
            frac_d: group("FracD").map(|g| g.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarComponent {
    spec: VarSpec,
    params: ParamBlock,
    slots: Slots,
    lambda: Vec<f64>,
}

impl VarComponent {
    /// Build a component with all parameters at zero.
    ///
    /// Errors
    /// ------
    /// - `InvalidStructure` for a zero FIGARCH truncation lag.
    pub fn new(spec: VarSpec) -> RegArchResult<Self> {
        let b = ParamBlock::builder();
        let params = match spec {
            VarSpec::Const => b.scalar("Const").build(),
            VarSpec::Arch { p } => b.scalar("Const").lags("Arch", p).build(),
            VarSpec::Garch { p, q } | VarSpec::Tsgarch { p, q } => {
                b.scalar("Const").lags("Arch", p).lags("Garch", q).build()
            }
            VarSpec::Egarch { p, q } => b
                .scalar("Const")
                .lags("Arch", p)
                .lags("Garch", q)
                .scalar("Teta")
                .scalar("Gamma")
                .build(),
            VarSpec::Aparch { p, q } => b
                .scalar("Const")
                .scalar("Delta")
                .lags("Arch", p)
                .lags("Gamma", p)
                .lags("Garch", q)
                .build(),
            VarSpec::Tarch { p } => b.scalar("Const").lags("ArchPos", p).lags("ArchNeg", p).build(),
            VarSpec::Gtarch { p, q } => b
                .scalar("Const")
                .lags("ArchPos", p)
                .lags("ArchNeg", p)
                .lags("Garch", q)
                .build(),
            VarSpec::Nagarch { p, q } => {
                b.scalar("Const").lags("Arch", p).lags("Garch", q).scalar("Teta").build()
            }
            VarSpec::Ngarch { p, q } => {
                b.scalar("Const").lags("Arch", p).lags("Garch", q).scalar("Delta").build()
            }
            VarSpec::Figarch { p, q, trunc } => {
                validate_trunc(trunc)?;
                b.scalar("Const").lags("Arch", p).lags("Garch", q).scalar("FracD").build()
            }
            VarSpec::Sqrgarch { p, q } => {
                b.scalar("Const").lags("Arch", p).lags("Garch", q).scalar("Gamma").build()
            }
            VarSpec::Ugarch { cste, k, p, q } => {
                let b = if cste { b.scalar("Const") } else { b };
                b.lags("Beta", k).lags("Arch", p).lags("Garch", q).build()
            }
        };
        let slots = Slots::resolve(&params);
        let mut comp = VarComponent { spec, params, slots, lambda: Vec::new() };
        comp.update_proxy();
        Ok(comp)
    }

    pub fn with_values(mut self, values: &[f64]) -> RegArchResult<Self> {
        self.assign(values)?;
        Ok(self)
    }

    pub fn kind(&self) -> VarType {
        match self.spec {
            VarSpec::Const => VarType::Const,
            VarSpec::Arch { .. } => VarType::Arch,
            VarSpec::Garch { .. } => VarType::Garch,
            VarSpec::Egarch { .. } => VarType::Egarch,
            VarSpec::Aparch { .. } => VarType::Aparch,
            VarSpec::Tarch { .. } => VarType::Tarch,
            VarSpec::Gtarch { .. } => VarType::Gtarch,
            VarSpec::Nagarch { .. } => VarType::Nagarch,
            VarSpec::Ngarch { .. } => VarType::Ngarch,
            VarSpec::Figarch { .. } => VarType::Figarch,
            VarSpec::Sqrgarch { .. } => VarType::Sqrgarch,
            VarSpec::Tsgarch { .. } => VarType::Tsgarch,
            VarSpec::Ugarch { .. } => VarType::Ugarch,
        }
    }

    pub fn spec(&self) -> VarSpec {
        self.spec
    }

    fn family(&self) -> Family {
        match self.spec {
            VarSpec::Const
            | VarSpec::Arch { .. }
            | VarSpec::Garch { .. }
            | VarSpec::Tarch { .. }
            | VarSpec::Gtarch { .. }
            | VarSpec::Ugarch { .. } => Family::Quadratic,
            VarSpec::Egarch { .. } => Family::Log,
            VarSpec::Aparch { .. } | VarSpec::Ngarch { .. } | VarSpec::Tsgarch { .. } => {
                Family::Power
            }
            VarSpec::Nagarch { .. } | VarSpec::Sqrgarch { .. } => Family::Shifted,
            VarSpec::Figarch { .. } => Family::Fractional,
        }
    }

    pub fn params(&self) -> &ParamBlock {
        &self.params
    }

    pub fn n_param(&self) -> usize {
        self.params.len()
    }

    pub fn n_lags(&self) -> usize {
        match self.spec {
            VarSpec::Figarch { trunc, .. } => trunc,
            _ => self.slots.p.max(self.slots.q),
        }
    }

    pub fn has_analytic_grad(&self) -> bool {
        self.family() != Family::Fractional
    }

    pub fn has_analytic_hess(&self) -> bool {
        matches!(self.family(), Family::Quadratic | Family::Log)
    }

    /// Whether the value reads `E|ε|` (and hence the distribution block).
    pub fn uses_esp_abs_eps(&self) -> bool {
        self.family() == Family::Log
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

    /// Refresh parameter-derived caches (FIGARCH weights).
    pub fn update_proxy(&mut self) {
        if let VarSpec::Figarch { trunc, .. } = self.spec {
            let b = self.params.as_slice();
            let s = self.slots;
            let d = s.frac_d.map_or(0.0, |i| b[i]);
            self.lambda = fractional::figarch_lambda(
                &b[s.arch..s.arch + s.p],
                &b[s.garch..s.garch + s.q],
                d,
                trunc,
            );
        }
    }

    /// FIGARCH ARCH(∞) weights (empty for other types).
    pub fn lambda(&self) -> &[f64] {
        &self.lambda
    }

    /// Starting values scaled to the sample variance `var`: ARCH weights sum
    /// to 0.1, GARCH weights to 0.8, asymmetry terms start at zero and the
    /// intercept matches the unconditional level.
    pub fn set_default_init_point(&mut self, var: f64) -> RegArchResult<()> {
        let s = self.slots;
        let var = if var > 0.0 { var } else { 1.0 };
        let a = if s.p > 0 { 0.1 / s.p as f64 } else { 0.0 };
        let g = if s.q > 0 { 0.8 / s.q as f64 } else { 0.0 };
        let a_tot = a * s.p as f64;
        let g_tot = g * s.q as f64;
        let mut v = vec![0.0; self.n_param()];
        let fill = |v: &mut Vec<f64>, start: usize, len: usize, x: f64| {
            v[start..start + len].iter_mut().for_each(|e| *e = x);
        };
        fill(&mut v, s.arch, s.p, a);
        if let Some(neg) = s.arch_neg {
            fill(&mut v, neg, s.p, a);
        }
        fill(&mut v, s.garch, s.q, g);
        let omega = match self.spec {
            VarSpec::Egarch { .. } => var.ln() * (1.0 - g_tot),
            VarSpec::Tsgarch { .. } => var.sqrt() * (1.0 - g_tot - a_tot * SQRT_2_OVER_PI),
            VarSpec::Sqrgarch { .. } => {
                fill(&mut v, s.arch, s.p, a * var);
                var * (1.0 - g_tot - a_tot)
            }
            VarSpec::Figarch { .. } => {
                let phi = if s.p > 0 { 0.2 / s.p as f64 } else { 0.0 };
                let beta = if s.q > 0 { 0.5 / s.q as f64 } else { 0.0 };
                fill(&mut v, s.arch, s.p, phi);
                fill(&mut v, s.garch, s.q, beta);
                if let Some(d) = s.frac_d {
                    v[d] = 0.4;
                }
                0.1 * var * (1.0 - beta * s.q as f64)
            }
            _ => var * (1.0 - a_tot - g_tot),
        };
        if let Some(i) = s.omega {
            v[i] = omega;
        }
        if let Some(d) = s.delta {
            v[d] = 2.0;
        }
        self.assign(&v)
    }

    /// Fail when the data do not carry enough variance regressors.
    pub fn check_data(&self, state: &ValueState) -> RegArchResult<()> {
        let available = state.n_var_regressors();
        if available < self.slots.k {
            return Err(RegArchError::MissingRegressors {
                which: "variance",
                needed: self.slots.k,
                available,
            });
        }
        Ok(())
    }

    /// Conditional variance at date `t` (unchecked).
    pub fn value(&self, t: usize, st: &ValueState, esp_abs_eps: f64) -> f64 {
        match self.family() {
            Family::Quadratic => self.quad_value(t, st),
            Family::Log => self.log_value(t, st, esp_abs_eps),
            Family::Power => self.power_value(t, st),
            Family::Shifted => self.shifted_value(t, st),
            Family::Fractional => self.frac_value(t, st),
        }
    }

    /// Add `∇h_t` to `out`.
    ///
    /// Errors
    /// ------
    /// - `InvalidStructure` for FIGARCH (numeric path only).
    /// - `LagOutOfWindow` if the stack window is too short.
    pub fn add_grad(&self, ctx: &DerivCtx<'_>, out: &mut Array1<f64>) -> RegArchResult<()> {
        match self.family() {
            Family::Quadratic => self.quad_grad(ctx, out),
            Family::Log => self.log_grad(ctx, out),
            Family::Power => self.power_grad(ctx, out),
            Family::Shifted => self.shifted_grad(ctx, out),
            Family::Fractional => Err(no_closed_form()),
        }
    }

    /// Add `∇²h_t` to `out` (quadratic and log families). Reads the current
    /// `∇h_t`, so the gradient must be stored first.
    pub fn add_hess(&self, ctx: &DerivCtx<'_>, out: &mut Array2<f64>) -> RegArchResult<()> {
        match self.family() {
            Family::Quadratic => self.quad_hess(ctx, out),
            Family::Log => self.log_hess(ctx, out),
            _ => Err(no_closed_form()),
        }
    }

    // ---- Quadratic family ----

    fn arch_index(&self, i: usize, u: f64) -> usize {
        match self.slots.arch_neg {
            Some(neg) if u <= 0.0 => neg + i - 1,
            _ => self.slots.arch + i - 1,
        }
    }

    fn quad_value(&self, t: usize, st: &ValueState) -> f64 {
        let b = self.params.as_slice();
        let s = self.slots;
        let mut h = s.omega.map_or(0.0, |i| b[i]);
        for i in 1..=s.p {
            if let Some(u) = st.u_lag(t, i) {
                h += b[self.arch_index(i, u)] * u * u;
            }
        }
        for j in 1..=s.q {
            if let Some(hl) = st.h_lag(t, j) {
                h += b[s.garch + j - 1] * hl;
            }
        }
        for k in 0..s.k {
            h += b[s.regs + k] * st.xv(t, k);
        }
        h
    }

    fn quad_grad(&self, ctx: &DerivCtx<'_>, out: &mut Array1<f64>) -> RegArchResult<()> {
        let b = self.params.as_slice();
        let s = self.slots;
        let (t, st, o) = (ctx.t, ctx.state, ctx.offset);
        if let Some(i) = s.omega {
            out[o + i] += 1.0;
        }
        for i in 1..=s.p {
            if let Some(u) = st.u_lag(t, i) {
                let c = self.arch_index(i, u);
                out[o + c] += u * u;
                out.scaled_add(-2.0 * b[c] * u, ctx.grad_mu(i)?);
            }
        }
        for j in 1..=s.q {
            if let Some(hl) = st.h_lag(t, j) {
                out[o + s.garch + j - 1] += hl;
                out.scaled_add(b[s.garch + j - 1], ctx.grad_var(j)?);
            }
        }
        for k in 0..s.k {
            out[o + s.regs + k] += st.xv(t, k);
        }
        Ok(())
    }

    fn quad_hess(&self, ctx: &DerivCtx<'_>, out: &mut Array2<f64>) -> RegArchResult<()> {
        let b = self.params.as_slice();
        let s = self.slots;
        let (t, st, o) = (ctx.t, ctx.state, ctx.offset);
        let hs = ctx.hess_stack()?;
        for i in 1..=s.p {
            if let Some(u) = st.u_lag(t, i) {
                let c = self.arch_index(i, u);
                let g = ctx.grad_mu(i)?;
                add_sym_unit(out, o + c, g.view(), -2.0 * u);
                add_outer(out, g.view(), 2.0 * b[c]);
                out.scaled_add(-2.0 * b[c] * u, hs.hess_mu.lag(i)?);
            }
        }
        for j in 1..=s.q {
            if st.h_lag(t, j).is_some() {
                add_sym_unit(out, o + s.garch + j - 1, ctx.grad_var(j)?.view(), 1.0);
                out.scaled_add(b[s.garch + j - 1], hs.hess_var.lag(j)?);
            }
        }
        Ok(())
    }

    // ---- Log family (EGARCH) ----

    fn egarch_terms(&self) -> (f64, f64, usize, usize) {
        let b = self.params.as_slice();
        let teta = self.slots.teta.unwrap_or(0);
        let gamma = self.slots.gamma.unwrap_or(0);
        (b[teta], b[gamma], teta, gamma)
    }

    fn log_value(&self, t: usize, st: &ValueState, esp: f64) -> f64 {
        let b = self.params.as_slice();
        let s = self.slots;
        let (teta, gamma, _, _) = self.egarch_terms();
        let mut lnh = s.omega.map_or(0.0, |i| b[i]);
        for i in 1..=s.p {
            if let Some(e) = st.eps_lag(t, i) {
                lnh += b[s.arch + i - 1] * (teta * e + gamma * (e.abs() - esp));
            }
        }
        for j in 1..=s.q {
            if let Some(hl) = st.h_lag(t, j) {
                lnh += b[s.garch + j - 1] * hl.ln();
            }
        }
        lnh.exp()
    }

    fn log_grad(&self, ctx: &DerivCtx<'_>, out: &mut Array1<f64>) -> RegArchResult<()> {
        let b = self.params.as_slice();
        let s = self.slots;
        let (t, st, o) = (ctx.t, ctx.state, ctx.offset);
        let (teta, gamma, it, ig) = self.egarch_terms();
        let esp = ctx.esp;
        let mut gl = Array1::<f64>::zeros(out.len());
        if let Some(i) = s.omega {
            gl[o + i] += 1.0;
        }
        for i in 1..=s.p {
            if let Some(e) = st.eps_lag(t, i) {
                let a = b[s.arch + i - 1];
                gl[o + s.arch + i - 1] += teta * e + gamma * (e.abs() - esp.value);
                gl[o + it] += a * e;
                gl[o + ig] += a * (e.abs() - esp.value);
                gl.scaled_add(a * (teta + gamma * sign(e)), ctx.grad_eps(i)?);
                gl.scaled_add(-a * gamma, &esp.grad);
            }
        }
        for j in 1..=s.q {
            if let Some(hl) = st.h_lag(t, j) {
                gl[o + s.garch + j - 1] += hl.ln();
                gl.scaled_add(b[s.garch + j - 1] / hl, ctx.grad_var(j)?);
            }
        }
        out.scaled_add(st.ht[t], &gl);
        Ok(())
    }

    /// `∇²h = h (∇² ln h + ∇ln h ∇ln hᵀ)`.
    fn log_hess(&self, ctx: &DerivCtx<'_>, out: &mut Array2<f64>) -> RegArchResult<()> {
        let b = self.params.as_slice();
        let s = self.slots;
        let (t, st, o) = (ctx.t, ctx.state, ctx.offset);
        let (teta, gamma, it, ig) = self.egarch_terms();
        let hs = ctx.hess_stack()?;
        let esp = ctx.esp;
        let n = out.nrows();
        let h = st.ht[t];
        let mut hl = Array2::<f64>::zeros((n, n));
        for i in 1..=s.p {
            let Some(e) = st.eps_lag(t, i) else { continue };
            let a = b[s.arch + i - 1];
            let sg = sign(e);
            let ge = ctx.grad_eps(i)?;
            let mut dg = Array1::<f64>::zeros(n);
            dg[o + it] += e;
            dg[o + ig] += e.abs() - esp.value;
            dg.scaled_add(teta + gamma * sg, ge);
            dg.scaled_add(-gamma, &esp.grad);
            add_sym_unit(&mut hl, o + s.arch + i - 1, dg.view(), 1.0);
            add_sym_unit(&mut hl, o + it, ge.view(), a);
            let mut v = ge * sg;
            v.scaled_add(-1.0, &esp.grad);
            add_sym_unit(&mut hl, o + ig, v.view(), a);
            hl.scaled_add(a * (teta + gamma * sg), hs.hess_eps.lag(i)?);
            hl.scaled_add(-a * gamma, &esp.hess);
        }
        for j in 1..=s.q {
            let Some(hj) = st.h_lag(t, j) else { continue };
            let beta = b[s.garch + j - 1];
            let gh = ctx.grad_var(j)?;
            add_sym_unit(&mut hl, o + s.garch + j - 1, (gh / hj).view(), 1.0);
            hl.scaled_add(beta / hj, hs.hess_var.lag(j)?);
            add_outer(&mut hl, gh.view(), -beta / (hj * hj));
        }
        let gl = ctx.grad.grad_var.current() / h;
        out.scaled_add(h, &hl);
        add_outer(out, gl.view(), h);
        Ok(())
    }

    // ---- Power family (APARCH, NGARCH, TS-GARCH) ----

    fn delta(&self) -> f64 {
        self.slots.delta.map_or(1.0, |i| self.params.as_slice()[i])
    }

    fn gamma_at(&self, i: usize) -> f64 {
        match (self.spec, self.slots.gamma) {
            (VarSpec::Aparch { .. }, Some(g)) => self.params.as_slice()[g + i - 1],
            _ => 0.0,
        }
    }

    fn power_value(&self, t: usize, st: &ValueState) -> f64 {
        let b = self.params.as_slice();
        let s = self.slots;
        let delta = self.delta();
        let mut sd = s.omega.map_or(0.0, |i| b[i]);
        for i in 1..=s.p {
            if let Some(u) = st.u_lag(t, i) {
                let base = u.abs() - self.gamma_at(i) * u;
                if base > 0.0 {
                    sd += b[s.arch + i - 1] * base.powf(delta);
                }
            }
        }
        for j in 1..=s.q {
            if let Some(hl) = st.h_lag(t, j) {
                sd += b[s.garch + j - 1] * hl.powf(delta / 2.0);
            }
        }
        if sd > 0.0 {
            sd.powf(2.0 / delta)
        } else {
            sd
        }
    }

    fn power_grad(&self, ctx: &DerivCtx<'_>, out: &mut Array1<f64>) -> RegArchResult<()> {
        let b = self.params.as_slice();
        let s = self.slots;
        let (t, st, o) = (ctx.t, ctx.state, ctx.offset);
        let delta = self.delta();
        let aparch_gamma = match self.spec {
            VarSpec::Aparch { .. } => s.gamma,
            _ => None,
        };
        let mut gs = Array1::<f64>::zeros(out.len());
        if let Some(i) = s.omega {
            gs[o + i] += 1.0;
        }
        for i in 1..=s.p {
            let Some(u) = st.u_lag(t, i) else { continue };
            let gam = self.gamma_at(i);
            let base = u.abs() - gam * u;
            if base <= 0.0 {
                continue;
            }
            let a = b[s.arch + i - 1];
            let bd = base.powf(delta);
            let slope = a * delta * base.powf(delta - 1.0);
            gs[o + s.arch + i - 1] += bd;
            if let Some(d) = s.delta {
                gs[o + d] += a * bd * base.ln();
            }
            if let Some(g) = aparch_gamma {
                gs[o + g + i - 1] -= slope * u;
            }
            gs.scaled_add(-slope * (sign(u) - gam), ctx.grad_mu(i)?);
        }
        for j in 1..=s.q {
            let Some(hl) = st.h_lag(t, j) else { continue };
            let beta = b[s.garch + j - 1];
            let sj = hl.powf(delta / 2.0);
            gs[o + s.garch + j - 1] += sj;
            if let Some(d) = s.delta {
                gs[o + d] += beta * sj * hl.ln() / 2.0;
            }
            gs.scaled_add(beta * sj * delta / (2.0 * hl), ctx.grad_var(j)?);
        }
        let h = st.ht[t];
        let sd = h.powf(delta / 2.0);
        out.scaled_add(2.0 * h / (delta * sd), &gs);
        if let Some(d) = s.delta {
            out[o + d] -= 2.0 * h * sd.ln() / (delta * delta);
        }
        Ok(())
    }

    // ---- Shifted quadratic family (NAGARCH, square-root GARCH) ----

    fn shift(&self) -> (f64, usize) {
        let idx = match self.spec {
            VarSpec::Nagarch { .. } => self.slots.teta,
            _ => self.slots.gamma,
        };
        let idx = idx.unwrap_or(0);
        (self.params.as_slice()[idx], idx)
    }

    /// Innovation being shifted: `u` for NAGARCH, `ε` for square-root GARCH.
    fn shifted_base(&self, t: usize, st: &ValueState, i: usize) -> Option<f64> {
        match self.spec {
            VarSpec::Nagarch { .. } => st.u_lag(t, i),
            _ => st.eps_lag(t, i),
        }
    }

    fn shifted_value(&self, t: usize, st: &ValueState) -> f64 {
        let b = self.params.as_slice();
        let s = self.slots;
        let (c, _) = self.shift();
        let mut h = s.omega.map_or(0.0, |i| b[i]);
        for i in 1..=s.p {
            if let (Some(x), Some(hl)) = (self.shifted_base(t, st, i), st.h_lag(t, i)) {
                let a = x - c * hl.sqrt();
                h += b[s.arch + i - 1] * a * a;
            }
        }
        for j in 1..=s.q {
            if let Some(hl) = st.h_lag(t, j) {
                h += b[s.garch + j - 1] * hl;
            }
        }
        h
    }

    fn shifted_grad(&self, ctx: &DerivCtx<'_>, out: &mut Array1<f64>) -> RegArchResult<()> {
        let b = self.params.as_slice();
        let s = self.slots;
        let (t, st, o) = (ctx.t, ctx.state, ctx.offset);
        let (c, ic) = self.shift();
        let on_residual = matches!(self.spec, VarSpec::Nagarch { .. });
        if let Some(i) = s.omega {
            out[o + i] += 1.0;
        }
        for i in 1..=s.p {
            let (Some(x), Some(hl)) = (self.shifted_base(t, st, i), st.h_lag(t, i)) else {
                continue;
            };
            let sigma = hl.sqrt();
            let a = x - c * sigma;
            let w = 2.0 * b[s.arch + i - 1] * a;
            out[o + s.arch + i - 1] += a * a;
            out[o + ic] -= w * sigma;
            if on_residual {
                out.scaled_add(-w, ctx.grad_mu(i)?);
            } else {
                out.scaled_add(w, ctx.grad_eps(i)?);
            }
            out.scaled_add(-w * c / (2.0 * sigma), ctx.grad_var(i)?);
        }
        for j in 1..=s.q {
            if let Some(hl) = st.h_lag(t, j) {
                out[o + s.garch + j - 1] += hl;
                out.scaled_add(b[s.garch + j - 1], ctx.grad_var(j)?);
            }
        }
        Ok(())
    }

    // ---- Fractional family (FIGARCH) ----

    fn frac_value(&self, t: usize, st: &ValueState) -> f64 {
        let b = self.params.as_slice();
        let s = self.slots;
        let beta_sum: f64 = b[s.garch..s.garch + s.q].iter().sum();
        let mut h = s.omega.map_or(0.0, |i| b[i]) / (1.0 - beta_sum);
        for (k, &l) in self.lambda.iter().enumerate().skip(1) {
            if let Some(u) = st.u_lag(t, k) {
                h += l * u * u;
            }
        }
        h
    }
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn no_closed_form() -> RegArchError {
    RegArchError::InvalidStructure { reason: "component has no closed-form derivative" }
}
