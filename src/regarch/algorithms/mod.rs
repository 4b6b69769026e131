//! regarch::algorithms — top-level entry points over a whole sample.
//!
//! Purpose
//! -------
//! Reduce the per-date recursion of [`crate::regarch::models`] into the
//! quantities callers ask for: simulated paths, the log-likelihood and its
//! per-date contributions, gradients and Hessians (analytic and numeric),
//! asymptotic covariance matrices and a per-parameter statistics table.
//!
//! Key behaviors
//! -------------
//! - [`simulate`]: [`regarch_simul`], [`regarch_simul_with_draws`].
//! - [`likelihood`]: [`regarch_lt`], [`regarch_llh`].
//! - [`gradient`] / [`hessian`]: per-date and summed derivatives, plus
//!   combined variants sharing one pass.
//! - [`numeric`]: finite-difference counterparts for cross-checks and for
//!   models without closed forms.
//! - [`covariance`]: `I`, `J` and the Hessian / OPG / sandwich estimators.
//! - [`stat_table`]: estimates, standard errors, t-statistics, p-values.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every call is one sequential pass (or one pass per perturbation) and
//!   aborts on the first structural or numerical error.
//! - Passes overwrite the derived arrays of the supplied value state.
//!
//! Conventions
//! -----------
//! - Per-date gradients are `N × n` (row = date); per-date Hessians are
//!   `N × n × n`.
//! - Entry points log at `debug` level; the numeric fallback logs the
//!   components it serves and its step.

pub mod covariance;
pub mod gradient;
pub mod hessian;
pub mod likelihood;
pub mod numeric;
pub mod simulate;
pub mod stat_table;

// ---- Re-exports ----

pub use self::covariance::{
    cov_from_i_and_j, numeric_compute_cov, regarch_compute_cov, regarch_compute_i,
    regarch_compute_i_and_j,
};
pub use self::gradient::{
    regarch_grad_llh, regarch_grad_lt, regarch_llh_and_grad_llh, regarch_lt_and_grad_lt,
};
pub use self::hessian::{
    regarch_grad_and_hess_lt, regarch_hess_llh, regarch_hess_lt, regarch_lt_grad_and_hess_lt,
};
pub use self::likelihood::{regarch_llh, regarch_lt};
pub use self::numeric::{
    numeric_regarch_grad_and_hess_lt, numeric_regarch_grad_llh, numeric_regarch_grad_lt,
    numeric_regarch_hess_lt,
};
pub use self::simulate::{regarch_simul, regarch_simul_with_draws};
pub use self::stat_table::{regarch_stat_table, StatRow, StatTable};

pub mod prelude {
    pub use super::covariance::{numeric_compute_cov, regarch_compute_cov};
    pub use super::gradient::{regarch_grad_llh, regarch_grad_lt};
    pub use super::hessian::{regarch_hess_llh, regarch_hess_lt};
    pub use super::likelihood::{regarch_llh, regarch_lt};
    pub use super::numeric::{numeric_regarch_grad_lt, numeric_regarch_hess_lt};
    pub use super::simulate::{regarch_simul, regarch_simul_with_draws};
    pub use super::stat_table::{regarch_stat_table, StatTable};
}
