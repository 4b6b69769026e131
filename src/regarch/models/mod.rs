//! regarch::models — the RegArch model binding and its per-date driver.
//!
//! Purpose
//! -------
//! Bind a conditional mean, a conditional variance and a residual law into
//! one [`RegArchModel`] with a canonical flat parameter vector, and provide
//! the recursion machinery every top-level algorithm walks: per-date value
//! fill, analytic derivative propagation through lag stacks, and the
//! finite-difference fallback for components without closed forms.
//!
//! Key behaviors
//! -------------
//! - [`RegArchModel`] owns the layout `[mean…, variance, distribution]`,
//!   qualified parameter names and the `E|ε|` cache.
//! - [`model_internals`] holds [`compute_value_at`], [`compute_grad_at`],
//!   [`compute_hess_at`] and the [`walk_dates`] driver.
//! - [`numeric`] builds perturbed forward paths ([`NumericDerivative`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - A pass is strictly sequential in `t`; each date reads only earlier
//!   dates' values and derivatives.
//! - Any parameter change invalidates the derived arrays of a
//!   [`ValueState`](crate::regarch::core::data::ValueState); the next pass
//!   recomputes them from date 0.
//!
//! Testing notes
//! -------------
//! - Unit tests here cover layout, naming, atomic assignment, value order and
//!   the walker protocol. Analytic vs numeric derivative agreement is tested
//!   end to end in `tests/`.

pub mod model;
pub mod model_internals;
pub mod numeric;

// ---- Re-exports ----

pub use self::model::{BlockOffsets, RegArchModel};
pub use self::model_internals::{
    compute_grad_at, compute_hess_at, compute_value_at, fill_value, log_density_at, walk_dates,
    DateEntry, DerivOrder,
};
pub use self::numeric::{NumericDerivative, Target};

pub mod prelude {
    pub use super::model::RegArchModel;
    pub use super::model_internals::DerivOrder;
    pub use super::numeric::NumericDerivative;
}
