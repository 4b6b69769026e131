//! regarch::distributions — parametric laws of the standardized residual.
//!
//! Purpose
//! -------
//! Provide [`Distribution`], a closed set of residual laws evaluated at the
//! standardized residual `x = ε_t`: log-density, its first and second
//! x-derivatives, its gradient and Hessian with respect to the law's own
//! shape parameters β, the mixed partial `∂_β ∂_x log f`, the expectation
//! `E|ε|` with its β-derivatives, and i.i.d. generation.
//!
//! Key behaviors
//! -------------
//! - Dispatch is a `match` over [`DistrKind`]; each family lives in its own
//!   file as plain functions of `(β, x)`.
//! - Laws without closed-form β-derivatives (skew Student-t) fall back to
//!   distribution-local finite differences in β; this is reported through
//!   [`Distribution::has_analytic_grad`] / [`Distribution::has_analytic_hess`].
//! - Shape parameters are validated on construction and on every
//!   assignment, so evaluations assume a valid β.
//!
//! Invariants & assumptions
//! ------------------------
//! - Except for `ScaledNormal` and `MixNorm`, every law has zero mean and
//!   unit variance, so `σ_t` is the conditional standard deviation.
//! - A log-density that is not finite is an `InvalidDensity` error.
//!
//! Conventions
//! -----------
//! - Gradients and Hessians are returned on the block scale (length
//!   [`Distribution::n_param`]); the model embeds them at the distribution
//!   offset of the full parameter vector.
//!
//! Testing notes
//! -------------
//! - Each family's closed forms are checked against finite differences of
//!   its own log-density; `E|ε|` is checked against quadrature.
pub mod finite_diff;
mod ged;
mod mixnorm;
mod normal;
mod skew_student;
pub mod special;
mod student;

use crate::regarch::{
    core::{
        constants::SQRT_2_OVER_PI,
        params::{BlockLayout, ParamBlock},
    },
    distributions::finite_diff::{local_grad, local_grad_stepped, local_hess},
    errors::{RegArchError, RegArchResult},
};
use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::{Bernoulli, Distribution as _, Gamma, StandardNormal, StudentT};

/// Relative step for finite differences of quadrature-based quantities.
const QUAD_FD_STEP: f64 = 1e-4;

/// Residual law type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistrKind {
    Normal,
    ScaledNormal,
    Student,
    Ged,
    MixNorm,
    SkewStudent,
}

impl DistrKind {
    pub fn name(&self) -> &'static str {
        match self {
            DistrKind::Normal => "Normal",
            DistrKind::ScaledNormal => "ScaledNormal",
            DistrKind::Student => "Student",
            DistrKind::Ged => "Ged",
            DistrKind::MixNorm => "MixNorm",
            DistrKind::SkewStudent => "SkewStudent",
        }
    }
}

/// Residual distribution: a type tag plus its shape-parameter block.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    kind: DistrKind,
    params: ParamBlock,
}

impl Distribution {
    /// Standard normal (no parameters).
    pub fn normal() -> Self {
        Distribution { kind: DistrKind::Normal, params: ParamBlock::builder().build() }
    }

    /// `N(0, σ²)` with σ as the single parameter.
    pub fn scaled_normal(sigma: f64) -> RegArchResult<Self> {
        Self::with_values(DistrKind::ScaledNormal, ParamBlock::builder().scalar("Sigma"), &[sigma])
    }

    /// Unit-variance Student-t, `ν > 2`.
    pub fn student(dof: f64) -> RegArchResult<Self> {
        Self::with_values(DistrKind::Student, ParamBlock::builder().scalar("Dof"), &[dof])
    }

    /// Unit-variance generalized error law, `ν > 0`.
    pub fn ged(shape: f64) -> RegArchResult<Self> {
        Self::with_values(DistrKind::Ged, ParamBlock::builder().scalar("Shape"), &[shape])
    }

    /// Normal mixture with weight `p ∈ (0, 1)` on `N(0, σ₁²)`.
    pub fn mix_norm(weight: f64, sigma1: f64, sigma2: f64) -> RegArchResult<Self> {
        let layout = ParamBlock::builder().scalar("Weight").scalar("Sigma1").scalar("Sigma2");
        Self::with_values(DistrKind::MixNorm, layout, &[weight, sigma1, sigma2])
    }

    /// Standardized skew Student-t, `ν > 2`, `ξ > 0`.
    pub fn skew_student(dof: f64, skew: f64) -> RegArchResult<Self> {
        let layout = ParamBlock::builder().scalar("Dof").scalar("Skew");
        Self::with_values(DistrKind::SkewStudent, layout, &[dof, skew])
    }

    fn with_values(
        kind: DistrKind, layout: BlockLayout, values: &[f64],
    ) -> RegArchResult<Self> {
        let mut params = layout.build();
        params.assign(values)?;
        validate_shape(kind, params.as_slice())?;
        Ok(Distribution { kind, params })
    }

    pub fn kind(&self) -> DistrKind {
        self.kind
    }

    pub fn n_param(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &ParamBlock {
        &self.params
    }

    /// Replace all shape parameters, validating the new values.
    pub fn assign(&mut self, values: &[f64]) -> RegArchResult<()> {
        if values.len() != self.params.len() {
            return Err(RegArchError::ParamLengthMismatch {
                expected: self.params.len(),
                actual: values.len(),
            });
        }
        validate_shape(self.kind, values)?;
        self.params.assign(values)
    }

    pub fn set_by_name(&mut self, name: &str, value: f64) -> RegArchResult<()> {
        let mut values = self.params.as_slice().to_vec();
        values[self.params.index_of(name)?] = value;
        self.assign(&values)
    }

    pub fn has_analytic_grad(&self) -> bool {
        !matches!(self.kind, DistrKind::SkewStudent)
    }

    pub fn has_analytic_hess(&self) -> bool {
        self.has_analytic_grad()
    }

    /// Moderate default shapes used as estimation starting points.
    pub fn set_default_init_point(&mut self) -> RegArchResult<()> {
        let values: Vec<f64> = match self.kind {
            DistrKind::Normal => vec![],
            DistrKind::ScaledNormal => vec![1.0],
            DistrKind::Student => vec![10.0],
            DistrKind::Ged => vec![1.5],
            DistrKind::MixNorm => vec![0.8, 0.8, 1.6],
            DistrKind::SkewStudent => vec![10.0, 1.0],
        };
        self.assign(&values)
    }

    fn b(&self, i: usize) -> f64 {
        self.params.at(i)
    }

    // ---- Density and x-derivatives ----

    /// `log f(x; β)`.
    ///
    /// Errors
    /// ------
    /// - `InvalidDensity` if the value is not finite (density zero or
    ///   negative at `x`).
    pub fn log_density(&self, x: f64) -> RegArchResult<f64> {
        let value = match self.kind {
            DistrKind::Normal => normal::std_log_density(x),
            DistrKind::ScaledNormal => normal::log_density(self.b(0), x),
            DistrKind::Student => student::log_density(self.b(0), x),
            DistrKind::Ged => ged::log_density(self.b(0), x),
            DistrKind::MixNorm => mixnorm::log_density(self.b(0), self.b(1), self.b(2), x),
            DistrKind::SkewStudent => skew_student::log_density(self.b(0), self.b(1), x),
        };
        if !value.is_finite() {
            return Err(RegArchError::InvalidDensity { x, value });
        }
        Ok(value)
    }

    /// `∂ log f / ∂x`.
    pub fn diff_log_density(&self, x: f64) -> f64 {
        match self.kind {
            DistrKind::Normal => normal::std_diff_log_density(x),
            DistrKind::ScaledNormal => normal::diff_log_density(self.b(0), x),
            DistrKind::Student => student::diff_log_density(self.b(0), x),
            DistrKind::Ged => ged::diff_log_density(self.b(0), x),
            DistrKind::MixNorm => mixnorm::diff_log_density(self.b(0), self.b(1), self.b(2), x),
            DistrKind::SkewStudent => skew_student::diff_log_density(self.b(0), self.b(1), x),
        }
    }

    /// `∂² log f / ∂x²`.
    pub fn diff2_log_density(&self, x: f64) -> f64 {
        match self.kind {
            DistrKind::Normal => -1.0,
            DistrKind::ScaledNormal => normal::diff2_log_density(self.b(0)),
            DistrKind::Student => student::diff2_log_density(self.b(0), x),
            DistrKind::Ged => ged::diff2_log_density(self.b(0), x),
            DistrKind::MixNorm => mixnorm::diff2_log_density(self.b(0), self.b(1), self.b(2), x),
            DistrKind::SkewStudent => skew_student::diff2_log_density(self.b(0), self.b(1), x),
        }
    }

    // ---- Shape-parameter derivatives ----

    /// `∇_β log f(x; β)`, length [`n_param`](Self::n_param).
    pub fn grad_log_density(&self, x: f64) -> RegArchResult<Array1<f64>> {
        let g = match self.kind {
            DistrKind::Normal => Array1::zeros(0),
            DistrKind::ScaledNormal => Array1::from(vec![normal::grad_sigma(self.b(0), x)]),
            DistrKind::Student => Array1::from(vec![student::grad_nu(self.b(0), x)]),
            DistrKind::Ged => Array1::from(vec![ged::grad_nu(self.b(0), x)]),
            DistrKind::MixNorm => mixnorm::grad_log_density(self.b(0), self.b(1), self.b(2), x),
            DistrKind::SkewStudent => local_grad(self.params.as_slice(), |b: &[f64]| {
                self.shifted(b)?.log_density(x)
            })?,
        };
        Ok(g)
    }

    /// `∇²_β log f(x; β)`.
    pub fn hess_log_density(&self, x: f64) -> RegArchResult<Array2<f64>> {
        let h = match self.kind {
            DistrKind::Normal => Array2::zeros((0, 0)),
            DistrKind::ScaledNormal => Array2::from_elem((1, 1), normal::hess_sigma(self.b(0), x)),
            DistrKind::Student => Array2::from_elem((1, 1), student::hess_nu(self.b(0), x)),
            DistrKind::Ged => Array2::from_elem((1, 1), ged::hess_nu(self.b(0), x)),
            DistrKind::MixNorm => mixnorm::hess_log_density(self.b(0), self.b(1), self.b(2), x),
            DistrKind::SkewStudent => local_hess(
                self.params.as_slice(),
                |b: &[f64]| self.shifted(b)?.log_density(x),
                QUAD_FD_STEP,
            )?,
        };
        Ok(h)
    }

    /// Mixed partial `∇_β (∂ log f / ∂x)` at fixed `x`.
    pub fn grad_diff_log_density(&self, x: f64) -> RegArchResult<Array1<f64>> {
        let g = match self.kind {
            DistrKind::Normal => Array1::zeros(0),
            DistrKind::ScaledNormal => Array1::from(vec![normal::grad_diff_sigma(self.b(0), x)]),
            DistrKind::Student => Array1::from(vec![student::grad_diff_nu(self.b(0), x)]),
            DistrKind::Ged => Array1::from(vec![ged::grad_diff_nu(self.b(0), x)]),
            DistrKind::MixNorm => {
                mixnorm::grad_diff_log_density(self.b(0), self.b(1), self.b(2), x)
            }
            DistrKind::SkewStudent => local_grad(self.params.as_slice(), |b: &[f64]| {
                Ok(self.shifted(b)?.diff_log_density(x))
            })?,
        };
        Ok(g)
    }

    // ---- E|ε| ----

    /// `E|ε|` under the current shape parameters.
    pub fn esp_abs_eps(&self) -> f64 {
        match self.kind {
            DistrKind::Normal => normal::std_esp_abs_eps(),
            DistrKind::ScaledNormal => normal::esp_abs_eps(self.b(0)),
            DistrKind::Student => student::esp_abs_eps(self.b(0)),
            DistrKind::Ged => ged::esp_abs_eps(self.b(0)),
            DistrKind::MixNorm => mixnorm::esp_abs_eps(self.b(0), self.b(1), self.b(2)),
            DistrKind::SkewStudent => skew_student::esp_abs_eps(self.b(0), self.b(1)),
        }
    }

    /// `∇_β E|ε|`.
    pub fn grad_esp_abs_eps(&self) -> RegArchResult<Array1<f64>> {
        let g = match self.kind {
            DistrKind::Normal => Array1::zeros(0),
            DistrKind::ScaledNormal => Array1::from(vec![SQRT_2_OVER_PI]),
            DistrKind::Student => Array1::from(vec![student::grad_esp_abs_eps(self.b(0))]),
            DistrKind::Ged => Array1::from(vec![ged::grad_esp_abs_eps(self.b(0))]),
            DistrKind::MixNorm => mixnorm::grad_esp_abs_eps(self.b(0), self.b(1), self.b(2)),
            DistrKind::SkewStudent => local_grad_stepped(
                self.params.as_slice(),
                |b: &[f64]| Ok(self.shifted(b)?.esp_abs_eps()),
                QUAD_FD_STEP,
            )?,
        };
        Ok(g)
    }

    /// `∇²_β E|ε|`.
    pub fn hess_esp_abs_eps(&self) -> RegArchResult<Array2<f64>> {
        let h = match self.kind {
            DistrKind::Normal => Array2::zeros((0, 0)),
            DistrKind::ScaledNormal => Array2::zeros((1, 1)),
            DistrKind::Student => Array2::from_elem((1, 1), student::hess_esp_abs_eps(self.b(0))),
            DistrKind::Ged => Array2::from_elem((1, 1), ged::hess_esp_abs_eps(self.b(0))),
            DistrKind::MixNorm => mixnorm::hess_esp_abs_eps(),
            DistrKind::SkewStudent => local_hess(
                self.params.as_slice(),
                |b: &[f64]| Ok(self.shifted(b)?.esp_abs_eps()),
                10.0 * QUAD_FD_STEP,
            )?,
        };
        Ok(h)
    }

    // ---- Generation ----

    /// Draw `n` i.i.d. realizations under the current parameters.
    pub fn generate<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> RegArchResult<Array1<f64>> {
        let mut out = Array1::<f64>::zeros(n);
        match self.kind {
            DistrKind::Normal | DistrKind::ScaledNormal => {
                let scale = if self.kind == DistrKind::Normal { 1.0 } else { self.b(0) };
                for v in out.iter_mut() {
                    let z: f64 = StandardNormal.sample(&mut *rng);
                    *v = scale * z;
                }
            }
            DistrKind::Student => {
                let nu = self.b(0);
                let law = StudentT::new(nu).map_err(|_| invalid("Dof", nu, "StudentT rejected"))?;
                let scale = ((nu - 2.0) / nu).sqrt();
                for v in out.iter_mut() {
                    *v = scale * law.sample(&mut *rng);
                }
            }
            DistrKind::Ged => {
                let nu = self.b(0);
                let law =
                    Gamma::new(1.0 / nu, 1.0).map_err(|_| invalid("Shape", nu, "Gamma rejected"))?;
                let coin = fair_coin()?;
                let lambda = ged::lambda(nu);
                for v in out.iter_mut() {
                    let r = lambda * (2.0 * law.sample(&mut *rng)).powf(1.0 / nu);
                    *v = if coin.sample(&mut *rng) { r } else { -r };
                }
            }
            DistrKind::MixNorm => {
                let (p, s1, s2) = (self.b(0), self.b(1), self.b(2));
                let pick = Bernoulli::new(p).map_err(|_| invalid("Weight", p, "not in [0, 1]"))?;
                for v in out.iter_mut() {
                    let z: f64 = StandardNormal.sample(&mut *rng);
                    *v = if pick.sample(&mut *rng) { s1 * z } else { s2 * z };
                }
            }
            DistrKind::SkewStudent => {
                let (nu, xi) = (self.b(0), self.b(1));
                let law = StudentT::new(nu).map_err(|_| invalid("Dof", nu, "StudentT rejected"))?;
                let upper = Bernoulli::new(xi * xi / (1.0 + xi * xi))
                    .map_err(|_| invalid("Skew", xi, "invalid branch probability"))?;
                let (m, s) = skew_student::moments(nu, xi);
                for v in out.iter_mut() {
                    let t: f64 = law.sample(&mut *rng);
                    let z = if upper.sample(&mut *rng) { xi * t.abs() } else { -t.abs() / xi };
                    *v = (z - m) / s;
                }
            }
        }
        Ok(out)
    }

    /// Copy of `self` with shape vector `b`, validated.
    fn shifted(&self, b: &[f64]) -> RegArchResult<Distribution> {
        let mut other = self.clone();
        other.assign(b)?;
        Ok(other)
    }
}

// ---- Helper methods ----

fn invalid(name: &'static str, value: f64, reason: &'static str) -> RegArchError {
    RegArchError::InvalidDistributionParam { name, value, reason }
}

fn fair_coin() -> RegArchResult<Bernoulli> {
    Bernoulli::new(0.5).map_err(|_| invalid("coin", 0.5, "invalid probability"))
}

fn validate_shape(kind: DistrKind, b: &[f64]) -> RegArchResult<()> {
    let finite_above = |name: &'static str, v: f64, low: f64, reason: &'static str| {
        if v.is_finite() && v > low { Ok(()) } else { Err(invalid(name, v, reason)) }
    };
    match kind {
        DistrKind::Normal => Ok(()),
        DistrKind::ScaledNormal => finite_above("Sigma", b[0], 0.0, "must be > 0"),
        DistrKind::Student => finite_above("Dof", b[0], 2.0, "must be > 2 for unit variance"),
        DistrKind::Ged => finite_above("Shape", b[0], 0.0, "must be > 0"),
        DistrKind::MixNorm => {
            finite_above("Weight", b[0], 0.0, "must be in (0, 1)")?;
            if b[0] >= 1.0 {
                return Err(invalid("Weight", b[0], "must be in (0, 1)"));
            }
            finite_above("Sigma1", b[1], 0.0, "must be > 0")?;
            finite_above("Sigma2", b[2], 0.0, "must be > 0")
        }
        DistrKind::SkewStudent => {
            finite_above("Dof", b[0], 2.0, "must be > 2 for unit variance")?;
            finite_above("Skew", b[1], 0.0, "must be > 0")
        }
    }
}

// ---- Re-exports ----

pub mod prelude {
    pub use super::{DistrKind, Distribution};
}
