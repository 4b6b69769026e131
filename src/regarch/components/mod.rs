//! regarch::components — conditional-mean and conditional-variance terms.
//!
//! Purpose
//! -------
//! Define the atomic model terms: each owns a [`ParamBlock`], knows how many
//! lags it reads, computes its value at one date, and (where a closed form
//! exists) adds its contribution to the gradient/Hessian of the conditional
//! mean or variance with respect to the full parameter vector θ.
//!
//! Key behaviors
//! -------------
//! - [`mean::MeanComponent`] and [`variance::VarComponent`] dispatch over a
//!   closed list of model types by `match`, with capability flags
//!   `has_analytic_grad` / `has_analytic_hess`.
//! - [`aggregator::CondMean`] sums mean components, each at its own offset
//!   of the canonical parameter layout.
//! - [`fractional`] holds the truncated lag-polynomial expansions used by
//!   ARFIMA and FIGARCH.
//!
//! Invariants & assumptions
//! ------------------------
//! - Derivatives are full-length θ vectors: a component writes its own
//!   block entries and chains through lagged ∇m, ∇h and ∇ε of every block.
//! - At date `t` the driver has already stored the current ∇h and ∇σ before
//!   asking mean components for derivatives (in-mean terms read them).
//! - Lags that reach before the sample read zero derivatives.
//!
//! Conventions
//! -----------
//! - `u_t = y_t − m_t`, so `∇u = −∇m` and `∇²u = −∇²m`.
use crate::regarch::{
    core::{
        data::ValueState,
        stack::{GradStack, HessStack},
    },
    errors::{RegArchError, RegArchResult},
};
use ndarray::{Array1, Array2, ArrayView1};

pub mod aggregator;
pub mod fractional;
pub mod mean;
pub mod variance;

/// `E|ε|` and its θ-derivatives (distribution block embedded in the full
/// parameter vector), computed once per forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct EspAbsEps {
    pub value: f64,
    pub grad: Array1<f64>,
    pub hess: Array2<f64>,
}

/// Everything a component may read when differentiating at date `t`.
#[derive(Debug, Clone, Copy)]
pub struct DerivCtx<'a> {
    pub t: usize,
    pub state: &'a ValueState,
    pub grad: &'a GradStack,
    pub hess: Option<&'a HessStack>,
    pub esp: &'a EspAbsEps,
    /// Start of the component's block inside θ.
    pub offset: usize,
}

impl<'a> DerivCtx<'a> {
    pub(crate) fn with_offset(&self, offset: usize) -> DerivCtx<'a> {
        DerivCtx { offset, ..*self }
    }

    pub(crate) fn grad_mu(&self, k: usize) -> RegArchResult<&'a Array1<f64>> {
        self.grad.grad_mu.lag(k)
    }

    pub(crate) fn grad_var(&self, k: usize) -> RegArchResult<&'a Array1<f64>> {
        self.grad.grad_var.lag(k)
    }

    pub(crate) fn grad_eps(&self, k: usize) -> RegArchResult<&'a Array1<f64>> {
        self.grad.grad_eps.lag(k)
    }

    pub(crate) fn hess_stack(&self) -> RegArchResult<&'a HessStack> {
        self.hess.ok_or(RegArchError::InvalidStructure {
            reason: "Hessian requested without a Hessian stack",
        })
    }
}

/// `out += s · (e_idx vᵀ + v e_idxᵀ)`.
pub(crate) fn add_sym_unit(out: &mut Array2<f64>, idx: usize, v: ArrayView1<f64>, s: f64) {
    out.row_mut(idx).scaled_add(s, &v);
    out.column_mut(idx).scaled_add(s, &v);
}

/// `out += s · (a bᵀ + b aᵀ)`.
pub(crate) fn add_sym_outer(out: &mut Array2<f64>, a: ArrayView1<f64>, b: ArrayView1<f64>, s: f64) {
    let n = a.len();
    for i in 0..n {
        for j in 0..n {
            out[[i, j]] += s * (a[i] * b[j] + b[i] * a[j]);
        }
    }
}

/// `out += s · a aᵀ`.
pub(crate) fn add_outer(out: &mut Array2<f64>, a: ArrayView1<f64>, s: f64) {
    let n = a.len();
    for i in 0..n {
        if a[i] == 0.0 {
            continue;
        }
        for j in 0..n {
            out[[i, j]] += s * a[i] * a[j];
        }
    }
}

/// Structural order checks shared by the constructors.
pub(crate) fn validate_trunc(trunc: usize) -> RegArchResult<()> {
    if trunc == 0 {
        return Err(RegArchError::InvalidStructure { reason: "truncation lag must be >= 1" });
    }
    Ok(())
}

// ---- Re-exports ----

pub mod prelude {
    pub use super::aggregator::CondMean;
    pub use super::mean::{MeanComponent, MeanSpec, MeanType};
    pub use super::variance::{VarComponent, VarSpec, VarType};
    pub use super::{DerivCtx, EspAbsEps};
}
