//! Integration tests for analytic derivative recursions.
//!
//! Purpose
//! -------
//! - Check that the per-date gradients and Hessians of `l_t` produced by the
//!   closed-form recursions agree with finite differences of the
//!   log-likelihood, for every mean component, variance family and residual
//!   law the crate supports.
//!
//! Coverage
//! --------
//! - Mean: Const, Ar, Ma, LinReg, StdDevInMean, VarInMean, Arfima.
//! - Variance: Arch, Garch, Egarch, Aparch, Tarch, Gtarch, Nagarch, Ngarch,
//!   Sqrgarch, Tsgarch, Ugarch, Figarch.
//! - Distributions: Normal, ScaledNormal, Student, Ged, MixNorm,
//!   SkewStudent.
//! - Multi-lag orders (AR(2), MA(2), GARCH(2,2), EGARCH(2,1)/(1,2),
//!   APARCH(2,2), SQRGARCH(2,1), NAGARCH(1,2), GTARCH(2,1)) that read
//!   several slots of the derivative stacks.
//! - EGARCH coupled to every parameterized law through `E|ε|`.
//! - Explicit pre-sample windows feeding the first dates' lags.
//! - Each case runs at the nominal parameters and at a 0.95 rescaling, on
//!   a 50-date path simulated from the model itself.
//!
//! Exclusions
//! ----------
//! - Covariance assembly and the statistics table; see
//!   `integration_regarch_pipeline.rs`.
use ndarray::{Array1, Array2, Array3};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rust_regarch::regarch::{
    algorithms::{
        numeric_regarch_grad_llh, numeric_regarch_grad_lt, numeric_regarch_hess_lt,
        regarch_grad_lt, regarch_hess_lt, regarch_lt, regarch_simul,
    },
    components::{
        aggregator::CondMean,
        mean::{MeanComponent, MeanSpec},
        variance::{VarComponent, VarSpec},
    },
    core::{
        data::{PreSample, ValueState},
        options::{NumericOpts, SimOpts},
    },
    distributions::Distribution,
    models::RegArchModel,
};

const N_OBS: usize = 50;
const GRAD_TOL: f64 = 1e-4;
const HESS_TOL: f64 = 1e-3;

// ---- Fixtures ----

fn mean(parts: &[(MeanSpec, &[f64])]) -> CondMean {
    CondMean::from_components(
        parts
            .iter()
            .map(|(spec, values)| MeanComponent::new(*spec).unwrap().with_values(values).unwrap())
            .collect(),
    )
    .unwrap()
}

fn var(spec: VarSpec, values: &[f64]) -> VarComponent {
    VarComponent::new(spec).unwrap().with_values(values).unwrap()
}

/// Regressors with `cols` columns; `positive` keeps every entry in (0.5, 1.5).
fn regressors(seed: u64, cols: usize, positive: bool) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let (lo, hi) = if positive { (0.5, 1.5) } else { (-1.0, 1.0) };
    Array2::from_shape_fn((N_OBS, cols), |_| rng.gen_range(lo..hi))
}

/// Model, observations and regressors of one derivative scenario.
struct Case {
    model: RegArchModel,
    yt: Array1<f64>,
    xt: Option<Array2<f64>>,
    xvt: Option<Array2<f64>>,
    presample: Option<PreSample>,
}

impl Case {
    fn new(model: RegArchModel, xt: Option<Array2<f64>>, xvt: Option<Array2<f64>>) -> Case {
        let sim = regarch_simul(&model, N_OBS, xt.clone(), xvt.clone(), &SimOpts::new(Some(1234), 0))
            .unwrap();
        Case { model, yt: sim.yt, xt, xvt, presample: None }
    }

    fn with_presample(mut self, presample: PreSample) -> Case {
        self.presample = Some(presample);
        self
    }

    fn state(&self) -> ValueState {
        let st = ValueState::new(self.yt.clone(), self.xt.clone(), self.xvt.clone()).unwrap();
        match &self.presample {
            Some(pre) => st.with_presample(pre.clone()),
            None => st,
        }
    }

    /// The model evaluated at `scale · θ`.
    fn model_at(&self, scale: f64) -> RegArchModel {
        let mut m = self.model.clone();
        let theta = m.param_to_vector() * scale;
        m.vector_to_param(theta.view()).unwrap();
        m
    }
}

fn assert_close_2d(label: &str, analytic: &Array2<f64>, numeric: &Array2<f64>, tol: f64) {
    assert_eq!(analytic.dim(), numeric.dim(), "{label}: shape");
    for ((idx, a), n) in analytic.indexed_iter().zip(numeric.iter()) {
        assert!(
            (a - n).abs() <= tol * a.abs().max(1.0),
            "{label}: entry {idx:?} analytic {a} vs numeric {n}"
        );
    }
}

fn assert_close_3d(label: &str, analytic: &Array3<f64>, numeric: &Array3<f64>, tol: f64) {
    assert_eq!(analytic.dim(), numeric.dim(), "{label}: shape");
    for ((idx, a), n) in analytic.indexed_iter().zip(numeric.iter()) {
        assert!(
            (a - n).abs() <= tol * a.abs().max(1.0),
            "{label}: entry {idx:?} analytic {a} vs numeric {n}"
        );
    }
}

/// Compare analytic and finite-difference per-date gradients (and Hessians
/// when `hessian`) at θ and 0.95·θ.
fn check_case(label: &str, case: &Case, hessian: bool) {
    let opts = NumericOpts::default();
    for scale in [1.0, 0.95] {
        let model = case.model_at(scale);
        let tag = format!("{label} @ {scale}");

        let ga = regarch_grad_lt(&model, &mut case.state(), &opts).unwrap();
        let gn = numeric_regarch_grad_lt(&model, &mut case.state(), &opts).unwrap();
        assert_close_2d(&tag, &ga, &gn, GRAD_TOL);

        if hessian {
            let ha = regarch_hess_lt(&model, &mut case.state(), &opts).unwrap();
            let hn = numeric_regarch_hess_lt(&model, &mut case.state(), &opts).unwrap();
            assert_close_3d(&tag, &ha, &hn, HESS_TOL);
        }
    }
}

// ---- Mean components ----

#[test]
// Purpose
// -------
// Const + AR(1) mean over GARCH(1,1) with Gaussian residuals.
//
// Expect
// ------
// - Per-date gradients and Hessians match finite differences.
fn ar_garch_normal_derivatives_match() {
    let model = RegArchModel::new(
        mean(&[(MeanSpec::Const, &[0.05]), (MeanSpec::Ar { p: 1 }, &[0.3])]),
        var(VarSpec::Garch { p: 1, q: 1 }, &[0.05, 0.1, 0.85]),
        Distribution::normal(),
    );
    check_case("ar-garch-normal", &Case::new(model, None, None), true);
}

#[test]
// Purpose
// -------
// Const + MA(1) mean over ARCH(2) with Student-t residuals, exercising the
// MA feedback through lagged residual derivatives and the Dof block.
//
// Expect
// ------
// - Per-date gradients and Hessians match finite differences.
fn ma_arch_student_derivatives_match() {
    let model = RegArchModel::new(
        mean(&[(MeanSpec::Const, &[0.02]), (MeanSpec::Ma { q: 1 }, &[0.25])]),
        var(VarSpec::Arch { p: 2 }, &[0.1, 0.2, 0.1]),
        Distribution::student(6.0).unwrap(),
    );
    check_case("ma-arch-student", &Case::new(model, None, None), true);
}

#[test]
// Purpose
// -------
// Regression mean on two exogenous columns with a TARCH(1) variance and GED
// residuals.
//
// Expect
// ------
// - Per-date gradients and Hessians match finite differences.
fn linreg_tarch_ged_derivatives_match() {
    let model = RegArchModel::new(
        mean(&[(MeanSpec::Const, &[0.1]), (MeanSpec::LinReg { k: 2 }, &[0.5, -0.3])]),
        var(VarSpec::Tarch { p: 1 }, &[0.1, 0.05, 0.2]),
        Distribution::ged(4.0).unwrap(),
    );
    let xt = regressors(7, 2, false);
    check_case("linreg-tarch-ged", &Case::new(model, Some(xt), None), true);
}

#[test]
// Purpose
// -------
// In-mean terms (σ_t and h_t in the mean) over GTARCH(1,1) with a normal
// mixture: the mean depends on the variance derivatives of the same date.
//
// Expect
// ------
// - Per-date gradients and Hessians match finite differences.
fn in_mean_gtarch_mixnorm_derivatives_match() {
    let model = RegArchModel::new(
        mean(&[
            (MeanSpec::Const, &[0.01]),
            (MeanSpec::StdDevInMean, &[0.1]),
            (MeanSpec::VarInMean, &[0.05]),
        ]),
        var(VarSpec::Gtarch { p: 1, q: 1 }, &[0.05, 0.05, 0.1, 0.8]),
        Distribution::mix_norm(0.3, 0.5, 1.5).unwrap(),
    );
    check_case("inmean-gtarch-mixnorm", &Case::new(model, None, None), true);
}

// ---- Variance families ----

#[test]
// Purpose
// -------
// EGARCH(1,1), whose recursion reads E|ε| and therefore couples the
// variance block to the distribution block.
//
// Given
// -----
// - Student-t(7) and scaled-normal(1.2) residuals.
//
// Expect
// ------
// - Per-date gradients and Hessians match finite differences for both laws.
fn egarch_derivatives_match_for_student_and_scaled_normal() {
    for (label, distr) in [
        ("egarch-student", Distribution::student(7.0).unwrap()),
        ("egarch-scaled-normal", Distribution::scaled_normal(1.2).unwrap()),
    ] {
        let model = RegArchModel::new(
            mean(&[(MeanSpec::Const, &[0.02])]),
            var(VarSpec::Egarch { p: 1, q: 1 }, &[-0.1, 0.1, 0.9, -0.5, 0.3]),
            distr,
        );
        check_case(label, &Case::new(model, None, None), true);
    }
}

#[test]
// Purpose
// -------
// APARCH(1,1): analytic gradient, Hessian served by the numeric fallback.
//
// Expect
// ------
// - Gradients match finite differences and the mixed Hessian path agrees
//   with the fully numeric one.
fn aparch_derivatives_match() {
    let model = RegArchModel::new(
        mean(&[(MeanSpec::Const, &[0.0])]),
        var(VarSpec::Aparch { p: 1, q: 1 }, &[0.05, 1.5, 0.1, 0.2, 0.85]),
        Distribution::normal(),
    );
    check_case("aparch", &Case::new(model, None, None), true);
}

#[test]
// Purpose
// -------
// Power and asymmetric quadratic families with closed-form gradients.
//
// Given
// -----
// - NGARCH(1,1), NAGARCH(1,1), SQRGARCH(1,1) and TSGARCH(1,1) with a
//   constant mean and Gaussian residuals.
//
// Expect
// ------
// - Per-date gradients match finite differences.
fn power_and_asymmetric_families_gradients_match() {
    let cases: [(&str, VarSpec, &[f64]); 4] = [
        ("ngarch", VarSpec::Ngarch { p: 1, q: 1 }, &[0.05, 0.1, 0.85, 1.6]),
        ("nagarch", VarSpec::Nagarch { p: 1, q: 1 }, &[0.05, 0.1, 0.8, 0.3]),
        ("sqrgarch", VarSpec::Sqrgarch { p: 1, q: 1 }, &[0.05, 0.1, 0.8, 0.5]),
        ("tsgarch", VarSpec::Tsgarch { p: 1, q: 1 }, &[0.05, 0.1, 0.85]),
    ];
    for (label, spec, values) in cases {
        let model = RegArchModel::new(
            mean(&[(MeanSpec::Const, &[0.01])]),
            var(spec, values),
            Distribution::normal(),
        );
        check_case(label, &Case::new(model, None, None), false);
    }
}

#[test]
// Purpose
// -------
// UGARCH with a constant and one positive variance regressor.
//
// Expect
// ------
// - Per-date gradients and Hessians match finite differences.
fn ugarch_with_variance_regressor_derivatives_match() {
    let model = RegArchModel::new(
        mean(&[(MeanSpec::Const, &[0.0])]),
        var(VarSpec::Ugarch { cste: true, k: 1, p: 1, q: 1 }, &[0.05, 0.1, 0.1, 0.8]),
        Distribution::normal(),
    );
    let xvt = regressors(8, 1, true);
    check_case("ugarch", &Case::new(model, None, Some(xvt)), true);
}

// ---- Distributions ----

#[test]
// Purpose
// -------
// Skew Student-t residuals, whose shape derivatives are differenced inside
// the distribution.
//
// Expect
// ------
// - Per-date gradients and Hessians match finite differences.
fn skew_student_garch_derivatives_match() {
    let model = RegArchModel::new(
        mean(&[(MeanSpec::Const, &[0.02])]),
        var(VarSpec::Garch { p: 1, q: 1 }, &[0.05, 0.1, 0.85]),
        Distribution::skew_student(6.0, 1.2).unwrap(),
    );
    check_case("skew-student-garch", &Case::new(model, None, None), true);
}

// ---- Multi-lag recursions ----

#[test]
// Purpose
// -------
// Second-order AR and MA terms over GARCH(2,2): every lag slot of the mean
// and variance stacks is read.
//
// Expect
// ------
// - Per-date gradients and Hessians match finite differences.
fn ar2_ma2_garch22_derivatives_match() {
    let model = RegArchModel::new(
        mean(&[
            (MeanSpec::Const, &[0.02]),
            (MeanSpec::Ar { p: 2 }, &[0.3, -0.15]),
            (MeanSpec::Ma { q: 2 }, &[0.2, 0.1]),
        ]),
        var(VarSpec::Garch { p: 2, q: 2 }, &[0.05, 0.08, 0.05, 0.4, 0.35]),
        Distribution::normal(),
    );
    check_case("ar2-ma2-garch22", &Case::new(model, None, None), true);
}

#[test]
// Purpose
// -------
// EGARCH with two ARCH lags and, separately, two GARCH lags.
//
// Given
// -----
// - EGARCH(2,1) and EGARCH(1,2) with Student-t(7) residuals.
//
// Expect
// ------
// - Per-date gradients and Hessians match finite differences.
fn egarch_multi_lag_derivatives_match() {
    let cases: [(&str, VarSpec, &[f64]); 2] = [
        ("egarch21", VarSpec::Egarch { p: 2, q: 1 }, &[-0.1, 0.1, 0.05, 0.85, -0.4, 0.3]),
        ("egarch12", VarSpec::Egarch { p: 1, q: 2 }, &[-0.1, 0.1, 0.5, 0.4, -0.4, 0.3]),
    ];
    for (label, spec, values) in cases {
        let model = RegArchModel::new(
            mean(&[(MeanSpec::Const, &[0.02])]),
            var(spec, values),
            Distribution::student(7.0).unwrap(),
        );
        check_case(label, &Case::new(model, None, None), true);
    }
}

#[test]
// Purpose
// -------
// Multi-lag power, square-root and asymmetric families.
//
// Given
// -----
// - APARCH(2,2), SQRGARCH(2,1) and NAGARCH(1,2) with Gaussian residuals.
//
// Expect
// ------
// - Per-date gradients and Hessians (numeric fallback for the second
//   order) match finite differences.
fn multi_lag_power_and_asymmetric_families_match() {
    let cases: [(&str, VarSpec, &[f64]); 3] = [
        (
            "aparch22",
            VarSpec::Aparch { p: 2, q: 2 },
            &[0.05, 1.5, 0.05, 0.05, 0.2, -0.1, 0.5, 0.3],
        ),
        ("sqrgarch21", VarSpec::Sqrgarch { p: 2, q: 1 }, &[0.05, 0.05, 0.05, 0.8, 0.5]),
        ("nagarch12", VarSpec::Nagarch { p: 1, q: 2 }, &[0.05, 0.1, 0.4, 0.4, 0.3]),
    ];
    for (label, spec, values) in cases {
        let model = RegArchModel::new(
            mean(&[(MeanSpec::Const, &[0.01])]),
            var(spec, values),
            Distribution::normal(),
        );
        check_case(label, &Case::new(model, None, None), true);
    }
}

#[test]
// Purpose
// -------
// GTARCH(2,1) under a variance-in-mean term: the mean reads the current
// variance derivatives, which themselves read two lag slots.
//
// Expect
// ------
// - Per-date gradients and Hessians match finite differences.
fn gtarch21_var_in_mean_derivatives_match() {
    let model = RegArchModel::new(
        mean(&[(MeanSpec::Const, &[0.01]), (MeanSpec::VarInMean, &[0.05])]),
        var(VarSpec::Gtarch { p: 2, q: 1 }, &[0.05, 0.05, 0.03, 0.1, 0.05, 0.7]),
        Distribution::student(8.0).unwrap(),
    );
    check_case("gtarch21-var-in-mean", &Case::new(model, None, None), true);
}

// ---- E|ε| coupling ----

#[test]
// Purpose
// -------
// EGARCH(1,1) reads E|ε| and its shape derivatives; each parameterized law
// carries its own closed forms (or quadrature) for them.
//
// Given
// -----
// - GED(2.6), MixNorm(0.3, 0.6, 1.3) and SkewStudent(6, 1.2) residuals.
//
// Expect
// ------
// - Per-date gradients and Hessians match finite differences for each law.
fn egarch_couples_to_every_law_through_esp_abs_eps() {
    for (label, distr) in [
        ("egarch-ged", Distribution::ged(2.6).unwrap()),
        ("egarch-mixnorm", Distribution::mix_norm(0.3, 0.6, 1.3).unwrap()),
        ("egarch-skew-student", Distribution::skew_student(6.0, 1.2).unwrap()),
    ] {
        let model = RegArchModel::new(
            mean(&[(MeanSpec::Const, &[0.02])]),
            var(VarSpec::Egarch { p: 1, q: 1 }, &[-0.1, 0.1, 0.9, -0.5, 0.3]),
            distr,
        );
        check_case(label, &Case::new(model, None, None), true);
    }
}

// ---- Pre-sample windows ----

#[test]
// Purpose
// -------
// Explicit pre-sample values are constants in θ: the first dates read
// them through the lag accessors while their derivative slots stay zero.
//
// Given
// -----
// - Const + MA(2) over EGARCH(2,1), Student-t(7); a two-date pre-sample
//   y = (0.1, −0.2), u = (0.3, −0.5), h = (1.1, 0.9).
//
// Expect
// ------
// - Per-date gradients and Hessians match finite differences, and the
//   first date's variance differs from the run without pre-sample.
fn presample_window_derivatives_match() {
    let model = RegArchModel::new(
        mean(&[(MeanSpec::Const, &[0.02]), (MeanSpec::Ma { q: 2 }, &[0.25, 0.1])]),
        var(VarSpec::Egarch { p: 2, q: 1 }, &[-0.1, 0.1, 0.05, 0.85, -0.4, 0.3]),
        Distribution::student(7.0).unwrap(),
    );
    let pre = PreSample::new(
        Array1::from(vec![0.1, -0.2]),
        Array1::from(vec![0.3, -0.5]),
        Array1::from(vec![1.1, 0.9]),
    )
    .unwrap();
    let plain = Case::new(model.clone(), None, None);
    let case = Case::new(model, None, None).with_presample(pre);

    let mut with_pre = case.state();
    let mut without = plain.state();
    regarch_lt(&case.model, &mut with_pre).unwrap();
    regarch_lt(&plain.model, &mut without).unwrap();
    assert_ne!(with_pre.ht[0], without.ht[0]);

    check_case("presample-ma2-egarch21", &case, true);
}

// ---- Numeric fallback ----

#[test]
// Purpose
// -------
// Fractional components have no closed-form recursion; the driver routes
// them through perturbed paths. Summed per-date gradients must equal the
// central-difference gradient of the whole log-likelihood.
//
// Given
// -----
// - ARFIMA(1,1) mean with FIGARCH(1,1) variance (truncation 10).
//
// Expect
// ------
// - Σ_t ∇l_t matches `numeric_regarch_grad_llh` within 1e-4 relative.
fn fractional_components_match_whole_likelihood_gradient() {
    let model = RegArchModel::new(
        mean(&[
            (MeanSpec::Const, &[0.01]),
            (MeanSpec::Arfima { p: 1, q: 1, trunc: 10 }, &[0.2, 0.1, 0.3]),
        ]),
        var(VarSpec::Figarch { p: 1, q: 1, trunc: 10 }, &[0.1, 0.2, 0.5, 0.4]),
        Distribution::normal(),
    );
    let case = Case::new(model, None, None);
    let opts = NumericOpts::default();

    let per_date = regarch_grad_lt(&case.model, &mut case.state(), &opts).unwrap();
    let summed = per_date.sum_axis(ndarray::Axis(0));
    let whole = numeric_regarch_grad_llh(&case.model, &case.state()).unwrap();

    for (i, (a, n)) in summed.iter().zip(whole.iter()).enumerate() {
        assert!(
            (a - n).abs() <= GRAD_TOL * a.abs().max(1.0),
            "fractional: param {i} per-date sum {a} vs whole-likelihood {n}"
        );
    }
}
