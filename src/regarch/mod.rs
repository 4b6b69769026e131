//! regarch — regression models with conditional mean, GARCH-family
//! conditional variance and a parametric residual law.
//!
//! Purpose
//! -------
//! Specify and evaluate models `y_t = m_t + σ_t ε_t` where the conditional
//! mean `m_t` is a sum of elementary terms (constant, AR, MA, ARFIMA,
//! regression, in-mean terms), the conditional variance `h_t = σ_t²`
//! follows one GARCH-family recursion, and `ε_t` is i.i.d. from a residual
//! law (normal, Student-t, GED, normal mixture, skew Student-t). The engine
//! simulates such models and computes the log-likelihood with its exact
//! per-date gradients and Hessians for maximum-likelihood estimation.
//!
//! Key behaviors
//! -------------
//! - [`core`]: parameter blocks, value state, derivative lag stacks, options.
//! - [`components`]: mean and variance terms with closed-form derivative
//!   recursions where they exist.
//! - [`distributions`]: residual laws with x- and shape-derivatives and
//!   `E|ε|` terms.
//! - [`models`]: [`RegArchModel`] and the per-date recursion driver.
//! - [`algorithms`]: simulation, likelihood, derivatives, covariance and the
//!   statistics table.
//!
//! Invariants & assumptions
//! ------------------------
//! - The flat parameter vector is `[mean blocks…, variance block,
//!   distribution block]`, mean blocks in insertion order.
//! - Recursions are strictly sequential in `t`; a non-positive conditional
//!   variance aborts the current call.
//!
//! Downstream usage
//! ----------------
//! - Typical end-to-end flow:
//!   1. Build mean components and a [`CondMean`], a [`VarComponent`] and a
//!      [`Distribution`]; bind them with `RegArchModel::new`.
//!   2. Simulate with [`regarch_simul`] or wrap observed data in a
//!      [`ValueState`].
//!   3. Hand [`regarch_llh_and_grad_llh`] (and [`regarch_hess_llh`]) to an
//!      external optimizer through `param_to_vector` / `vector_to_param`.
//!   4. At the optimum, call [`regarch_compute_cov`] and
//!      [`regarch_stat_table`].
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests; `tests/` holds end-to-end pipelines
//!   and analytic-vs-numeric derivative checks for every component type.

pub mod algorithms;
pub mod components;
pub mod core;
pub mod distributions;
pub mod errors;
pub mod models;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::algorithms::{
    numeric_compute_cov, numeric_regarch_grad_llh, numeric_regarch_grad_lt,
    numeric_regarch_hess_lt, regarch_compute_cov, regarch_compute_i, regarch_compute_i_and_j,
    regarch_grad_llh, regarch_grad_lt, regarch_hess_llh, regarch_hess_lt, regarch_llh,
    regarch_llh_and_grad_llh, regarch_lt, regarch_simul, regarch_simul_with_draws,
    regarch_stat_table, StatTable,
};
pub use self::components::{
    aggregator::CondMean,
    mean::{MeanComponent, MeanSpec, MeanType},
    variance::{VarComponent, VarSpec, VarType},
};
pub use self::core::{
    data::{PreSample, ValueState},
    options::{CovKind, NumericOpts, SimOpts},
};
pub use self::distributions::{DistrKind, Distribution};
pub use self::errors::{RegArchError, RegArchResult};
pub use self::models::RegArchModel;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_regarch::regarch::prelude::*;
//
// to import the main model surface in a single line.

pub mod prelude {
    pub use super::algorithms::prelude::*;
    pub use super::{
        CondMean, CovKind, DistrKind, Distribution, MeanComponent, MeanSpec, MeanType,
        NumericOpts, PreSample, RegArchError, RegArchModel, RegArchResult, SimOpts, ValueState,
        VarComponent, VarSpec, VarType,
    };
}
