//! inference — covariance building blocks for maximum-likelihood estimates.
//!
//! Purpose
//! -------
//! Provide the linear algebra the likelihood-level covariance routines
//! compose: averaging per-observation score outer products, eigen-based
//! pseudo-inverses of information matrices, sandwich assembly and standard
//! errors.
//!
//! Key behaviors
//! -------------
//! - Define a unified error and result type, [`InferenceError`] and
//!   [`InferenceResult`], for shape and numerical failures.
//! - [`avg_outer_product`], [`pseudo_inverse`], [`sandwich`] and
//!   [`standard_errors`] in [`covariance`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Score matrices are `N × p` with rows as observations; information and
//!   covariance matrices are `p × p` and symmetric.
//! - All routines return [`InferenceError`] on failure rather than
//!   panicking.
//!
//! Conventions
//! -----------
//! - No explicit matrix inverse is formed; eigenvalues at or below
//!   [`EIGEN_EPS`] are truncated.
//! - Functions are pure: no logging, no global state.
//!
//! Downstream usage
//! ----------------
//! - `regarch::algorithms::covariance` builds `I` and `J` from per-date
//!   derivatives and maps them to `J⁻¹/N`, `I⁻¹/N` or `J⁻¹IJ⁻¹/N` through
//!   this module.

pub mod covariance;
pub mod errors;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::covariance::{avg_outer_product, pseudo_inverse, sandwich, standard_errors, EIGEN_EPS};
pub use self::errors::{InferenceError, InferenceResult};

// ---- Optional convenience prelude for downstream crates ------------------

pub mod prelude {
    pub use super::covariance::{avg_outer_product, pseudo_inverse, sandwich, standard_errors};
    pub use super::errors::{InferenceError, InferenceResult};
}
