//! rust_regarch — recursive engine for regression models with conditional
//! mean, GARCH-family conditional variance and parametric residual laws.
//!
//! Purpose
//! -------
//! Serve as the crate root. All numerical work lives in the inner modules:
//! [`regarch`] for model specification, simulation, likelihood and its
//! derivatives, and [`inference`] for the covariance linear algebra.
//!
//! Conventions
//! -----------
//! - Every fallible routine returns a typed `Result`
//!   ([`regarch::RegArchResult`], [`inference::InferenceResult`]).
//! - The library emits `tracing` events but installs no subscriber.
//!
//! Downstream usage
//! ----------------
//! - `use rust_regarch::regarch::prelude::*;` imports the everyday surface.

pub mod inference;
pub mod regarch;
