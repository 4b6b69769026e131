//! regarch::core — building blocks shared by components, models and drivers.
//!
//! Purpose
//! -------
//! Group the data structures every other `regarch` module reads: named
//! parameter blocks, the per-date value state, the derivative lag rings,
//! option structs, constants and validation helpers.
//!
//! Key behaviors
//! -------------
//! - [`params`]: [`ParamBlock`](params::ParamBlock) with name and index access.
//! - [`data`]: [`ValueState`](data::ValueState) and
//!   [`PreSample`](data::PreSample) initial conditions.
//! - [`stack`]: [`LagRing`](stack::LagRing), [`GradStack`](stack::GradStack),
//!   [`HessStack`](stack::HessStack).
//! - [`options`]: simulation, numeric-step and covariance options.
//! - [`constants`] / [`validation`]: compile-time constants and input guards.
pub mod constants;
pub mod data;
pub mod options;
pub mod params;
pub mod stack;
pub mod validation;

// ---- Re-exports ----

pub mod prelude {
    pub use super::data::{PreSample, ValueState};
    pub use super::options::{CovKind, NumericOpts, SimOpts};
    pub use super::params::{BlockLayout, ParamBlock, ParamGroup};
    pub use super::stack::{GradStack, HessStack, LagRing};
}
