//! RegArch model: conditional mean + conditional variance + residual law.
//!
//! [`RegArchModel`] binds one [`CondMean`], one [`VarComponent`] and one
//! [`Distribution`], and owns the canonical flat parameter layout
//! `θ = [mean blocks (insertion order), variance block, distribution block]`.
//!
//! Key ideas:
//! - Every mutator goes through the model so parameter-derived caches
//!   (ARFIMA/FIGARCH weights, `E|ε|`) are refreshed before the next pass.
//! - Parameter names are qualified by block: `mean.Ar[1]`, `var.Garch[1]`,
//!   `distr.Dof`. Name lookup resolves to an index; index access is the
//!   single source of truth.
//! - `vector_to_param` is all-or-nothing: a rejected vector (bad length or
//!   invalid distribution shape) leaves the model untouched.
use crate::regarch::{
    components::{
        aggregator::CondMean,
        mean::{MeanComponent, MeanType},
        variance::VarComponent,
        EspAbsEps,
    },
    core::data::ValueState,
    distributions::Distribution,
    errors::{RegArchError, RegArchResult},
};
use ndarray::{Array1, Array2, ArrayView1};

/// Start of each block inside θ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockOffsets {
    pub mean: usize,
    pub var: usize,
    pub distr: usize,
}

/// Conditional mean, conditional variance and residual distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct RegArchModel {
    mean: CondMean,
    var: VarComponent,
    distr: Distribution,
    /// `E|ε|` under the current distribution parameters.
    esp_abs_eps: f64,
}

impl RegArchModel {
    pub fn new(mean: CondMean, var: VarComponent, distr: Distribution) -> RegArchModel {
        let mut model = RegArchModel { mean, var, distr, esp_abs_eps: 0.0 };
        model.update_proxy();
        model
    }

    pub fn mean(&self) -> &CondMean {
        &self.mean
    }

    pub fn var(&self) -> &VarComponent {
        &self.var
    }

    pub fn distr(&self) -> &Distribution {
        &self.distr
    }

    /// Refresh every parameter-derived cache.
    pub fn update_proxy(&mut self) {
        self.mean.update_proxy();
        self.var.update_proxy();
        self.esp_abs_eps = self.distr.esp_abs_eps();
    }

    pub fn esp_abs_eps(&self) -> f64 {
        self.esp_abs_eps
    }

    // ---- Structure ----

    pub fn add_one_mean(&mut self, component: MeanComponent) -> RegArchResult<()> {
        self.mean.add_one_mean(component)
    }

    pub fn delete_mean_by_kind(&mut self, kind: MeanType) -> RegArchResult<MeanComponent> {
        self.mean.delete_by_kind(kind)
    }

    /// Remove the mean component owning `name` (`"mean.Ar[1]"` or `"Ar[1]"`).
    pub fn delete_mean_by_param_name(&mut self, name: &str) -> RegArchResult<MeanComponent> {
        self.mean.delete_by_param_name(name.strip_prefix("mean.").unwrap_or(name))
    }

    pub fn set_var(&mut self, var: VarComponent) {
        self.var = var;
        self.update_proxy();
    }

    pub fn set_distr(&mut self, distr: Distribution) {
        self.distr = distr;
        self.update_proxy();
    }

    pub fn n_param(&self) -> usize {
        self.mean.n_param() + self.var.n_param() + self.distr.n_param()
    }

    /// Largest lag read by any component (the derivative window).
    pub fn n_lags(&self) -> usize {
        self.mean.n_lags().max(self.var.n_lags())
    }

    pub fn offsets(&self) -> BlockOffsets {
        let var = self.mean.n_param();
        BlockOffsets { mean: 0, var, distr: var + self.var.n_param() }
    }

    /// Fail when the data cannot feed the model (missing regressors).
    pub fn check_data(&self, state: &ValueState) -> RegArchResult<()> {
        self.mean.check_data(state)?;
        self.var.check_data(state)
    }

    /// True when every mean and variance component has a closed-form
    /// gradient (the distribution handles its own fallback).
    pub fn has_analytic_grad(&self) -> bool {
        self.mean.components().iter().all(|c| c.has_analytic_grad()) && self.var.has_analytic_grad()
    }

    pub fn has_analytic_hess(&self) -> bool {
        self.mean.components().iter().all(|c| c.has_analytic_hess()) && self.var.has_analytic_hess()
    }

    /// Type names of components routed to the numeric fallback.
    pub fn numeric_components(&self, hessian: bool) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .mean
            .components()
            .iter()
            .filter(|c| if hessian { !c.has_analytic_hess() } else { !c.has_analytic_grad() })
            .map(|c| c.kind().name())
            .collect();
        let var_numeric =
            if hessian { !self.var.has_analytic_hess() } else { !self.var.has_analytic_grad() };
        if var_numeric {
            names.push(self.var.kind().name());
        }
        names
    }

    // ---- Flat parameter vector ----

    /// Parameters in canonical order.
    pub fn param_to_vector(&self) -> Array1<f64> {
        let mut theta = Vec::with_capacity(self.n_param());
        theta.extend(self.mean.values());
        theta.extend_from_slice(self.var.params().as_slice());
        theta.extend_from_slice(self.distr.params().as_slice());
        Array1::from(theta)
    }

    /// Load every block from `theta` and refresh caches.
    ///
    /// Errors
    /// ------
    /// - `ParamLengthMismatch` if `theta.len() != n_param()`.
    /// - `InvalidDistributionParam` for an inadmissible distribution block.
    ///   The model is left unchanged on error.
    pub fn vector_to_param(&mut self, theta: ArrayView1<'_, f64>) -> RegArchResult<()> {
        let n = self.n_param();
        if theta.len() != n {
            return Err(RegArchError::ParamLengthMismatch { expected: n, actual: theta.len() });
        }
        let values = theta.to_vec();
        let off = self.offsets();
        let mut next = self.clone();
        next.mean.assign(&values[..off.var])?;
        next.var.assign(&values[off.var..off.distr])?;
        next.distr.assign(&values[off.distr..])?;
        next.update_proxy();
        *self = next;
        Ok(())
    }

    /// Qualified names in canonical order.
    pub fn param_names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.mean.param_names().into_iter().map(|n| format!("mean.{n}")).collect();
        names.extend(self.var.params().names().iter().map(|n| format!("var.{n}")));
        names.extend(self.distr.params().names().iter().map(|n| format!("distr.{n}")));
        names
    }

    /// Index in θ of a qualified parameter name.
    ///
    /// Errors
    /// ------
    /// - `UnknownParamName` for an unknown block prefix or name.
    pub fn param_index(&self, name: &str) -> RegArchResult<usize> {
        let unknown = || RegArchError::UnknownParamName { name: name.to_string() };
        let (block, rest) = name.split_once('.').ok_or_else(unknown)?;
        let off = self.offsets();
        let found = match block {
            "mean" => self.mean.index_of(rest),
            "var" => self.var.params().index_of(rest).map(|i| off.var + i),
            "distr" => self.distr.params().index_of(rest).map(|i| off.distr + i),
            _ => return Err(unknown()),
        };
        found.map_err(|_| unknown())
    }

    pub fn get_param(&self, i: usize) -> RegArchResult<f64> {
        let theta = self.param_to_vector();
        theta.get(i).copied().ok_or(RegArchError::IndexOutOfRange { index: i, len: theta.len() })
    }

    /// Set one parameter by θ index.
    pub fn set_param(&mut self, i: usize, value: f64) -> RegArchResult<()> {
        let off = self.offsets();
        let n = self.n_param();
        if i >= n {
            return Err(RegArchError::IndexOutOfRange { index: i, len: n });
        }
        if i < off.var {
            self.mean.set_at(i, value)?;
        } else if i < off.distr {
            self.var.set_at(i - off.var, value)?;
        } else {
            let mut values = self.distr.params().as_slice().to_vec();
            values[i - off.distr] = value;
            self.distr.assign(&values)?;
        }
        self.update_proxy();
        Ok(())
    }

    pub fn get_param_by_name(&self, name: &str) -> RegArchResult<f64> {
        self.get_param(self.param_index(name)?)
    }

    pub fn set_param_by_name(&mut self, name: &str, value: f64) -> RegArchResult<()> {
        let i = self.param_index(name)?;
        self.set_param(i, value)
    }

    /// Starting values from the sample mean and variance of `state.yt`.
    pub fn set_default_init_point(&mut self, state: &ValueState) -> RegArchResult<()> {
        let (mean, var) = state.sample_moments();
        self.mean.set_default_init_point(mean)?;
        self.var.set_default_init_point(var)?;
        self.distr.set_default_init_point()?;
        self.update_proxy();
        Ok(())
    }

    /// `E|ε|` with its gradient (and Hessian when `hessian`) embedded at the
    /// distribution offset. Derivatives stay zero when the variance equation
    /// does not read `E|ε|`.
    pub(crate) fn esp_terms(&self, grad: bool, hessian: bool) -> RegArchResult<EspAbsEps> {
        let n = self.n_param();
        let d = self.offsets().distr;
        let mut esp = EspAbsEps {
            value: self.esp_abs_eps,
            grad: Array1::zeros(n),
            hess: Array2::zeros((n, n)),
        };
        if !self.var.uses_esp_abs_eps() || self.distr.n_param() == 0 {
            return Ok(esp);
        }
        let k = self.distr.n_param();
        if grad || hessian {
            let g = self.distr.grad_esp_abs_eps()?;
            esp.grad.slice_mut(ndarray::s![d..d + k]).assign(&g);
        }
        if hessian {
            let h = self.distr.hess_esp_abs_eps()?;
            esp.hess.slice_mut(ndarray::s![d..d + k, d..d + k]).assign(&h);
        }
        Ok(esp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regarch::components::{mean::MeanSpec, variance::VarSpec};
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Canonical layout, qualified names and name → index lookup.
    // - Vector round-trip and all-or-nothing assignment.
    // - Cache refresh (`E|ε|`) after distribution changes.
    // - Mean component removal shrinking the layout.
    // -------------------------------------------------------------------------

    fn ar_garch_student() -> RegArchModel {
        let mean = CondMean::from_components(vec![
            MeanComponent::new(MeanSpec::Const).unwrap().with_values(&[0.1]).unwrap(),
            MeanComponent::new(MeanSpec::Ar { p: 1 }).unwrap().with_values(&[0.3]).unwrap(),
        ])
        .unwrap();
        let var = VarComponent::new(VarSpec::Garch { p: 1, q: 1 })
            .unwrap()
            .with_values(&[0.05, 0.1, 0.85])
            .unwrap();
        RegArchModel::new(mean, var, Distribution::student(8.0).unwrap())
    }

    #[test]
    // Purpose
    // -------
    // θ follows [mean, variance, distribution] with qualified names.
    //
    // Given
    // -----
    // - Const + AR(1) / GARCH(1,1) / Student(8).
    //
    // Expect
    // ------
    // - 6 parameters, offsets (0, 2, 5), names and index lookup agree.
    fn canonical_layout_and_names() {
        // Arrange
        let model = ar_garch_student();

        // Act
        let names = model.param_names();

        // Assert
        assert_eq!(model.n_param(), 6);
        assert_eq!(model.offsets(), BlockOffsets { mean: 0, var: 2, distr: 5 });
        assert_eq!(
            names,
            vec!["mean.Const", "mean.Ar[1]", "var.Const", "var.Arch[1]", "var.Garch[1]", "distr.Dof"]
        );
        for (i, n) in names.iter().enumerate() {
            assert_eq!(model.param_index(n).unwrap(), i);
        }
        assert_eq!(model.param_to_vector(), array![0.1, 0.3, 0.05, 0.1, 0.85, 8.0]);
        assert!(model.param_index("var.Nope").is_err());
        assert!(model.param_index("Const").is_err());
        assert_eq!(model.n_lags(), 1);
    }

    #[test]
    // Purpose
    // -------
    // Vector round-trip is the identity and rejected vectors leave the model
    // unchanged.
    //
    // Given
    // -----
    // - A new θ, a too-short θ and a θ with an invalid Student dof.
    //
    // Expect
    // ------
    // - Exact round-trip; `ParamLengthMismatch`; invalid dof error and the
    //   previous θ intact.
    fn vector_round_trip_is_atomic() {
        // Arrange
        let mut model = ar_garch_student();
        let theta = array![0.0, -0.2, 0.1, 0.2, 0.7, 5.0];

        // Act
        model.vector_to_param(theta.view()).unwrap();
        let short = model.vector_to_param(array![1.0].view());
        let bad = model.vector_to_param(array![9.0, 9.0, 9.0, 9.0, 9.0, 1.5].view());

        // Assert
        assert_eq!(model.param_to_vector(), theta);
        assert_eq!(short.unwrap_err(), RegArchError::ParamLengthMismatch { expected: 6, actual: 1 });
        assert!(bad.is_err());
        assert_eq!(model.param_to_vector(), theta);
    }

    #[test]
    // Purpose
    // -------
    // Setting the distribution parameter by name refreshes the cached E|ε|.
    //
    // Given
    // -----
    // - Student(8) changed to Student(4) via `distr.Dof`.
    //
    // Expect
    // ------
    // - Cached value equals a fresh Student(4) E|ε|.
    fn name_setter_refreshes_cache() {
        // Arrange
        let mut model = ar_garch_student();

        // Act
        model.set_param_by_name("distr.Dof", 4.0).unwrap();

        // Assert
        let expected = Distribution::student(4.0).unwrap().esp_abs_eps();
        assert!((model.esp_abs_eps() - expected).abs() < 1e-15);
        assert_eq!(model.get_param_by_name("distr.Dof").unwrap(), 4.0);
        assert!(model.set_param(6, 1.0).is_err());
    }

    #[test]
    // Purpose
    // -------
    // Removing a mean component shrinks θ and shifts later blocks.
    //
    // Given
    // -----
    // - Model with Const + AR(1); AR removed by qualified name.
    //
    // Expect
    // ------
    // - 5 parameters and the variance block starting at 1.
    fn mean_removal_shrinks_layout() {
        // Arrange
        let mut model = ar_garch_student();

        // Act
        let removed = model.delete_mean_by_param_name("mean.Ar[1]").unwrap();

        // Assert
        assert_eq!(removed.kind(), MeanType::Ar);
        assert_eq!(model.n_param(), 5);
        assert_eq!(model.offsets().var, 1);
        assert_eq!(model.n_lags(), 1);
    }
}
