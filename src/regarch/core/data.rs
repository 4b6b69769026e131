//! core::data — observed series, regressors and per-date derived values.
//!
//! Purpose
//! -------
//! Hold everything the recursions read or write date by date: the observed
//! series `y_t`, optional regressor matrices for the mean and variance
//! equations, the derived arrays (`m_t`, `h_t`, `u_t`, `ε_t`), and optional
//! pre-sample initial conditions.
//!
//! Key behaviors
//! -------------
//! - [`ValueState::new`] validates the series and regressors once; the
//!   derived arrays are zero until a fill pass writes them.
//! - Lag accessors (`y_lag`, `u_lag`, `h_lag`, `eps_lag`) return `None` for
//!   dates before the sample unless a [`PreSample`] supplies them.
//!
//! Invariants & assumptions
//! ------------------------
//! - All arrays have the series length `N`; regressor matrices have `N` rows.
//! - Derived arrays are only meaningful for dates already filled in the
//!   current forward pass; any parameter change invalidates them.
//! - Pre-sample values are constants: they carry no parameter derivative.
//!
//! Conventions
//! -----------
//! - Pre-sample arrays are stored oldest first, so the last entry is the
//!   value at date `−1`.
use crate::regarch::{
    core::validation::{validate_finite, validate_regressors, validate_series},
    errors::{RegArchError, RegArchResult},
};
use ndarray::{Array1, Array2};

/// Explicit initial conditions for dates `−k..−1`.
#[derive(Debug, Clone, PartialEq)]
pub struct PreSample {
    pub y: Array1<f64>,
    pub u: Array1<f64>,
    pub h: Array1<f64>,
}

impl PreSample {
    /// Build a pre-sample window.
    ///
    /// Errors
    /// ------
    /// - `InvalidPreSample` if lengths differ or any `h` is not strictly
    ///   positive.
    /// - `NonFiniteData` if any value is non-finite.
    pub fn new(y: Array1<f64>, u: Array1<f64>, h: Array1<f64>) -> RegArchResult<Self> {
        if y.len() != u.len() || y.len() != h.len() {
            return Err(RegArchError::InvalidPreSample { reason: "y, u and h lengths differ" });
        }
        validate_finite(&y)?;
        validate_finite(&u)?;
        validate_finite(&h)?;
        if h.iter().any(|&v| v <= 0.0) {
            return Err(RegArchError::InvalidPreSample { reason: "variances must be > 0" });
        }
        Ok(PreSample { y, u, h })
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Value `back` dates before the sample start (`back = 1` is date −1).
    fn back(arr: &Array1<f64>, back: usize) -> Option<f64> {
        let len = arr.len();
        if back == 0 || back > len { None } else { Some(arr[len - back]) }
    }
}

/// Observed data plus the derived per-date arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueState {
    pub yt: Array1<f64>,
    pub xt: Option<Array2<f64>>,
    pub xvt: Option<Array2<f64>>,
    pub mt: Array1<f64>,
    pub ht: Array1<f64>,
    pub ut: Array1<f64>,
    pub epst: Array1<f64>,
    pub presample: Option<PreSample>,
}

impl ValueState {
    /// Validate the series and regressors and allocate zeroed derived arrays.
    ///
    /// Errors
    /// ------
    /// - `EmptySeries` / `NonFiniteData` for a bad series.
    /// - `RegressorLengthMismatch` if a regressor matrix row count differs
    ///   from `yt.len()`.
    pub fn new(
        yt: Array1<f64>, xt: Option<Array2<f64>>, xvt: Option<Array2<f64>>,
    ) -> RegArchResult<Self> {
        validate_series(&yt)?;
        Self::build(yt, xt, xvt)
    }

    /// State of length `n` with zero observations, to be overwritten by
    /// simulation.
    pub fn zeros(
        n: usize, xt: Option<Array2<f64>>, xvt: Option<Array2<f64>>,
    ) -> RegArchResult<Self> {
        if n == 0 {
            return Err(RegArchError::EmptySeries);
        }
        Self::build(Array1::zeros(n), xt, xvt)
    }

    fn build(
        yt: Array1<f64>, xt: Option<Array2<f64>>, xvt: Option<Array2<f64>>,
    ) -> RegArchResult<Self> {
        let n = yt.len();
        if let Some(x) = &xt {
            validate_regressors("mean", x, n)?;
        }
        if let Some(x) = &xvt {
            validate_regressors("variance", x, n)?;
        }
        Ok(ValueState {
            yt,
            xt,
            xvt,
            mt: Array1::zeros(n),
            ht: Array1::zeros(n),
            ut: Array1::zeros(n),
            epst: Array1::zeros(n),
            presample: None,
        })
    }

    pub fn with_presample(mut self, presample: PreSample) -> Self {
        self.presample = Some(presample);
        self
    }

    pub fn len(&self) -> usize {
        self.yt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.yt.is_empty()
    }

    pub fn n_mean_regressors(&self) -> usize {
        self.xt.as_ref().map_or(0, |x| x.ncols())
    }

    pub fn n_var_regressors(&self) -> usize {
        self.xvt.as_ref().map_or(0, |x| x.ncols())
    }

    pub(crate) fn x(&self, t: usize, i: usize) -> f64 {
        self.xt.as_ref().map_or(0.0, |x| x[[t, i]])
    }

    pub(crate) fn xv(&self, t: usize, i: usize) -> f64 {
        self.xvt.as_ref().map_or(0.0, |x| x[[t, i]])
    }

    fn lagged(
        &self, own: &Array1<f64>, pre: impl Fn(&PreSample) -> &Array1<f64>, t: usize, k: usize,
    ) -> Option<f64> {
        if k <= t {
            Some(own[t - k])
        } else {
            self.presample.as_ref().and_then(|p| PreSample::back(pre(p), k - t))
        }
    }

    pub fn y_lag(&self, t: usize, k: usize) -> Option<f64> {
        self.lagged(&self.yt, |p| &p.y, t, k)
    }

    pub fn u_lag(&self, t: usize, k: usize) -> Option<f64> {
        self.lagged(&self.ut, |p| &p.u, t, k)
    }

    pub fn h_lag(&self, t: usize, k: usize) -> Option<f64> {
        self.lagged(&self.ht, |p| &p.h, t, k)
    }

    pub fn eps_lag(&self, t: usize, k: usize) -> Option<f64> {
        if k <= t {
            Some(self.epst[t - k])
        } else {
            let u = self.u_lag(t, k)?;
            let h = self.h_lag(t, k)?;
            Some(u / h.sqrt())
        }
    }

    /// Sample mean and (population) variance of the observed series.
    pub fn sample_moments(&self) -> (f64, f64) {
        let n = self.yt.len().max(1) as f64;
        let mean = self.yt.sum() / n;
        let var = self.yt.iter().map(|y| (y - mean) * (y - mean)).sum::<f64>() / n;
        (mean, var)
    }
}
