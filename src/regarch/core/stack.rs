//! core::stack — fixed-window derivative buffers carried across dates.
//!
//! Purpose
//! -------
//! Store, for the current date and the last `L` dates, the first and second
//! derivatives of the conditional variance, conditional mean and
//! standardized residual with respect to the full parameter vector, plus the
//! current-date-only quantities (σ, log-density) the drivers need.
//!
//! Key behaviors
//! -------------
//! - [`LagRing`] is an arena of `L + 1` slots with a write cursor advanced
//!   modulo the capacity. Reads take a relative lag, never an absolute date.
//! - Slots start at zero, so lags reaching before date 0 read a zero
//!   derivative. Pre-sample values are constants, which makes this exact.
//! - [`GradStack`] / [`HessStack`] group the rings and the current-only
//!   buffers; `advance` is called exactly once per date by the driver.
//!
//! Invariants & assumptions
//! ------------------------
//! - A lag `k > L` is a structural error (`LagOutOfWindow`).
//! - Writers overwrite the current slot completely before it is read.
//! - A stack is sized for one parameter count; drivers call
//!   [`GradStack::ensure_size`] so that a stack built before a component
//!   was added or removed cannot be reused silently.
use crate::regarch::errors::{RegArchError, RegArchResult};
use ndarray::{Array1, Array2};

/// Circular buffer of `window + 1` slots addressed by relative lag.
#[derive(Debug, Clone, PartialEq)]
pub struct LagRing<T> {
    slots: Vec<T>,
    cursor: usize,
    window: usize,
}

impl<T: Clone> LagRing<T> {
    pub fn new(window: usize, zero: T) -> Self {
        LagRing { slots: vec![zero; window + 1], cursor: 0, window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn current(&self) -> &T {
        &self.slots[self.cursor]
    }

    pub fn current_mut(&mut self) -> &mut T {
        &mut self.slots[self.cursor]
    }

    /// Slot written `k` dates ago (`k = 0` is the current slot).
    pub fn lag(&self, k: usize) -> RegArchResult<&T> {
        if k > self.window {
            return Err(RegArchError::LagOutOfWindow { lag: k, window: self.window });
        }
        let cap = self.slots.len();
        Ok(&self.slots[(self.cursor + cap - k) % cap])
    }

    /// Move the cursor to the next date, recycling the oldest slot.
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % self.slots.len();
    }
}

/// First-order derivative state for one forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct GradStack {
    n_param: usize,
    /// ∇h_t.
    pub grad_var: LagRing<Array1<f64>>,
    /// ∇m_t.
    pub grad_mu: LagRing<Array1<f64>>,
    /// ∇ε_t.
    pub grad_eps: LagRing<Array1<f64>>,
    /// ∇σ_t (current date only).
    pub grad_sigma: Array1<f64>,
    /// ∇l_t (current date only).
    pub grad_log_dens: Array1<f64>,
    /// ∂ log f / ∂x at ε_t (current date only).
    pub diff_log_density: f64,
}

impl GradStack {
    pub fn new(n_param: usize, window: usize) -> Self {
        let zero = Array1::<f64>::zeros(n_param);
        GradStack {
            n_param,
            grad_var: LagRing::new(window, zero.clone()),
            grad_mu: LagRing::new(window, zero.clone()),
            grad_eps: LagRing::new(window, zero.clone()),
            grad_sigma: zero.clone(),
            grad_log_dens: zero,
            diff_log_density: 0.0,
        }
    }

    pub fn n_param(&self) -> usize {
        self.n_param
    }

    pub fn window(&self) -> usize {
        self.grad_var.window()
    }

    /// Fail if the stack was built for another parameter count or a smaller
    /// lag window than `window`.
    pub fn ensure_size(&self, n_param: usize, window: usize) -> RegArchResult<()> {
        if self.n_param != n_param {
            return Err(RegArchError::StackSizeMismatch { expected: n_param, actual: self.n_param });
        }
        if self.window() < window {
            return Err(RegArchError::LagOutOfWindow { lag: window, window: self.window() });
        }
        Ok(())
    }

    pub fn advance(&mut self) {
        self.grad_var.advance();
        self.grad_mu.advance();
        self.grad_eps.advance();
    }
}

/// Second-order derivative state for one forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct HessStack {
    n_param: usize,
    /// ∇²h_t.
    pub hess_var: LagRing<Array2<f64>>,
    /// ∇²m_t.
    pub hess_mu: LagRing<Array2<f64>>,
    /// ∇²ε_t.
    pub hess_eps: LagRing<Array2<f64>>,
    /// ∇²σ_t (current date only).
    pub hess_sigma: Array2<f64>,
    /// ∇²l_t (current date only).
    pub hess_log_dens: Array2<f64>,
    /// ∇_θ (∂ log f / ∂x) holding ε fixed, embedded in the full vector.
    pub grad_diff_log_density: Array1<f64>,
}

impl HessStack {
    pub fn new(n_param: usize, window: usize) -> Self {
        let zero = Array2::<f64>::zeros((n_param, n_param));
        HessStack {
            n_param,
            hess_var: LagRing::new(window, zero.clone()),
            hess_mu: LagRing::new(window, zero.clone()),
            hess_eps: LagRing::new(window, zero.clone()),
            hess_sigma: zero.clone(),
            hess_log_dens: zero,
            grad_diff_log_density: Array1::zeros(n_param),
        }
    }

    pub fn n_param(&self) -> usize {
        self.n_param
    }

    pub fn ensure_size(&self, n_param: usize, window: usize) -> RegArchResult<()> {
        if self.n_param != n_param {
            return Err(RegArchError::StackSizeMismatch { expected: n_param, actual: self.n_param });
        }
        if self.hess_var.window() < window {
            return Err(RegArchError::LagOutOfWindow { lag: window, window: self.hess_var.window() });
        }
        Ok(())
    }

    pub fn advance(&mut self) {
        self.hess_var.advance();
        self.hess_mu.advance();
        self.hess_eps.advance();
    }
}
