//! models::numeric — finite-difference derivative paths.
//!
//! Purpose
//! -------
//! Differentiate per-date quantities (a component's value, `h_t`, or the
//! log-likelihood contribution `l_t`) with respect to θ when no closed form
//! is available, by carrying perturbed copies of the model and value state
//! through the same forward pass as the main path.
//!
//! Key behaviors
//! -------------
//! - One path per `θ ± δ_i e_i`, plus four paths per pair `i < j` when
//!   second derivatives are requested.
//! - [`NumericDerivative::advance`] fills date `t` on every path; evaluation
//!   at `t` then reads the perturbed values.
//! - Gradients use central differences; Hessian diagonals use
//!   `[f(+) − 2f(0) + f(−)] / δ²` and off-diagonals the four-point stencil
//!   `[f(++) − f(+−) − f(−+) + f(−−)] / (4 δ_i δ_j)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `δ_i = step · max(|θ_i|, 1)`; the step and the resulting deltas are
//!   exposed so the accuracy of the fallback can be audited.
//! - A perturbation that makes the model inadmissible (invalid distribution
//!   shape, non-positive variance on a path) is an error, not a silent skip.
use crate::regarch::{
    core::{data::ValueState, validation::validate_step},
    errors::{RegArchError, RegArchResult},
    models::{
        model::RegArchModel,
        model_internals::{compute_value_at, log_density_at},
    },
};
use ndarray::{Array1, Array2};

/// Per-date quantity being differentiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// `h_t`.
    Variance,
    /// Value of mean component `k`.
    Mean(usize),
    /// `l_t = log f(ε_t) − ln σ_t`.
    Lt,
}

#[derive(Debug, Clone)]
struct Path {
    model: RegArchModel,
    state: ValueState,
}

impl Path {
    fn perturbed(
        model: &RegArchModel, state: &ValueState, theta: &Array1<f64>, shifts: &[(usize, f64)],
    ) -> RegArchResult<Path> {
        let mut th = theta.clone();
        for &(i, d) in shifts {
            th[i] += d;
        }
        let mut model = model.clone();
        model.vector_to_param(th.view())?;
        Ok(Path { model, state: state.clone() })
    }

    fn eval(&self, target: Target, t: usize) -> RegArchResult<f64> {
        match target {
            Target::Variance => Ok(self.state.ht[t]),
            Target::Mean(k) => self
                .model
                .mean()
                .components()
                .get(k)
                .map(|c| c.value(t, &self.state))
                .ok_or(RegArchError::IndexOutOfRange { index: k, len: self.model.mean().len() }),
            Target::Lt => log_density_at(&self.model, &self.state, t),
        }
    }
}

/// Perturbed forward paths around the current parameter vector.
#[derive(Debug, Clone)]
pub struct NumericDerivative {
    step: f64,
    deltas: Vec<f64>,
    plus: Vec<Path>,
    minus: Vec<Path>,
    /// `[++, +−, −+, −−]` for each pair `i < j`, row-major over pairs.
    cross: Vec<[Path; 4]>,
}

impl NumericDerivative {
    /// Build the perturbed paths.
    ///
    /// Parameters
    /// ----------
    /// - `model`, `state`: main path; `state` supplies data and pre-sample.
    /// - `step`: relative step (finite, > 0).
    /// - `with_hessian`: also build the cross paths for second derivatives.
    ///
    /// Errors
    /// ------
    /// - `InvalidNumericStep` for a bad step.
    /// - Any error raised by assigning a perturbed θ to the model.
    pub fn new(
        model: &RegArchModel, state: &ValueState, step: f64, with_hessian: bool,
    ) -> RegArchResult<NumericDerivative> {
        validate_step(step)?;
        let theta = model.param_to_vector();
        let n = theta.len();
        let deltas: Vec<f64> = theta.iter().map(|v| step * v.abs().max(1.0)).collect();
        let mut plus = Vec::with_capacity(n);
        let mut minus = Vec::with_capacity(n);
        for (i, &d) in deltas.iter().enumerate() {
            plus.push(Path::perturbed(model, state, &theta, &[(i, d)])?);
            minus.push(Path::perturbed(model, state, &theta, &[(i, -d)])?);
        }
        let mut cross = Vec::new();
        if with_hessian {
            for i in 0..n {
                for j in (i + 1)..n {
                    let (di, dj) = (deltas[i], deltas[j]);
                    cross.push([
                        Path::perturbed(model, state, &theta, &[(i, di), (j, dj)])?,
                        Path::perturbed(model, state, &theta, &[(i, di), (j, -dj)])?,
                        Path::perturbed(model, state, &theta, &[(i, -di), (j, dj)])?,
                        Path::perturbed(model, state, &theta, &[(i, -di), (j, -dj)])?,
                    ]);
                }
            }
        }
        Ok(NumericDerivative { step, deltas, plus, minus, cross })
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn deltas(&self) -> &[f64] {
        &self.deltas
    }

    fn n(&self) -> usize {
        self.deltas.len()
    }

    fn pair_index(&self, i: usize, j: usize) -> usize {
        let n = self.n();
        i * n - i * (i + 1) / 2 + (j - i - 1)
    }

    /// Fill date `t` on every perturbed path.
    pub fn advance(&mut self, t: usize) -> RegArchResult<()> {
        let singles = self.plus.iter_mut().chain(self.minus.iter_mut());
        let pairs = self.cross.iter_mut().flat_map(|quad| quad.iter_mut());
        for path in singles.chain(pairs) {
            compute_value_at(&path.model, &mut path.state, t)?;
        }
        Ok(())
    }

    /// Central-difference gradient of `target` at date `t`.
    pub fn grad(&self, target: Target, t: usize) -> RegArchResult<Array1<f64>> {
        let mut g = Array1::zeros(self.n());
        for (i, &d) in self.deltas.iter().enumerate() {
            let up = self.plus[i].eval(target, t)?;
            let down = self.minus[i].eval(target, t)?;
            g[i] = (up - down) / (2.0 * d);
        }
        Ok(g)
    }

    /// Hessian of `target` at date `t`; `f0` is its value on the main path.
    ///
    /// Errors
    /// ------
    /// - `InvalidStructure` if the paths were built without cross terms.
    pub fn hess(&self, target: Target, t: usize, f0: f64) -> RegArchResult<Array2<f64>> {
        let n = self.n();
        if n > 1 && self.cross.is_empty() {
            return Err(RegArchError::InvalidStructure {
                reason: "numeric Hessian requested without cross paths",
            });
        }
        let mut h = Array2::zeros((n, n));
        for i in 0..n {
            let d = self.deltas[i];
            let up = self.plus[i].eval(target, t)?;
            let down = self.minus[i].eval(target, t)?;
            h[[i, i]] = (up - 2.0 * f0 + down) / (d * d);
            for j in (i + 1)..n {
                let quad = &self.cross[self.pair_index(i, j)];
                let pp = quad[0].eval(target, t)?;
                let pm = quad[1].eval(target, t)?;
                let mp = quad[2].eval(target, t)?;
                let mm = quad[3].eval(target, t)?;
                let v = (pp - pm - mp + mm) / (4.0 * d * self.deltas[j]);
                h[[i, j]] = v;
                h[[j, i]] = v;
            }
        }
        Ok(h)
    }
}
