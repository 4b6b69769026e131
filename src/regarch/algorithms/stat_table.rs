//! algorithms::stat_table — per-parameter inference summary.
//!
//! For each parameter of the model, in canonical order: its qualified name,
//! the current estimate, the standard error from a covariance matrix, the
//! t-statistic and the two-sided normal p-value `2(1 − Φ(|t|))`.
use crate::inference::covariance::standard_errors;
use crate::regarch::{
    errors::{RegArchError, RegArchResult},
    models::RegArchModel,
};
use ndarray::Array2;
use statrs::function::erf::erfc;

#[derive(Debug, Clone, PartialEq)]
pub struct StatRow {
    pub name: String,
    pub estimate: f64,
    pub std_err: f64,
    pub t_stat: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatTable {
    pub rows: Vec<StatRow>,
}

impl StatTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for a qualified parameter name (e.g. `"var.Arch[1]"`).
    pub fn get(&self, name: &str) -> Option<&StatRow> {
        self.rows.iter().find(|r| r.name == name)
    }
}

/// regarch_stat_table — estimates, standard errors, t-statistics and
/// p-values.
///
/// Parameters
/// ----------
/// - `model`: `&RegArchModel`
///   Supplies names and estimates.
/// - `cov`: `&Array2<f64>`
///   `n × n` covariance of the estimates (e.g. from `regarch_compute_cov`).
///
/// Errors
/// ------
/// - `ParamLengthMismatch` if `cov` is not `n × n`.
/// - `Inference(..)` for a non-finite covariance.
///
/// Notes
/// -----
/// - A zero standard error yields a non-finite t-statistic and a NaN or
///   zero p-value; it is reported, not rejected.
pub fn regarch_stat_table(model: &RegArchModel, cov: &Array2<f64>) -> RegArchResult<StatTable> {
    let n = model.n_param();
    if cov.nrows() != n || cov.ncols() != n {
        return Err(RegArchError::ParamLengthMismatch { expected: n, actual: cov.nrows() });
    }
    let se = standard_errors(cov)?;
    let rows = model
        .param_names()
        .into_iter()
        .zip(model.param_to_vector())
        .zip(se)
        .map(|((name, estimate), std_err)| {
            let t_stat = estimate / std_err;
            StatRow { name, estimate, std_err, t_stat, p_value: erfc(t_stat.abs() / std::f64::consts::SQRT_2) }
        })
        .collect();
    Ok(StatTable { rows })
}
