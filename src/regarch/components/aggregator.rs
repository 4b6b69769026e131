//! components::aggregator — sum of conditional-mean components.
//!
//! Purpose
//! -------
//! Hold the ordered list of mean components of a model (at most one per
//! type) and present them as a single conditional mean whose parameter
//! block is the concatenation of the member blocks in insertion order.
//!
//! Key behaviors
//! -------------
//! - [`CondMean::add_one_mean`] appends and rejects duplicate types.
//! - [`CondMean::delete_by_kind`] / [`CondMean::delete_by_param_name`]
//!   remove a member; the aggregate block shrinks, so any derivative stack
//!   sized for the old layout fails its size check afterwards.
//! - [`CondMean::add_grad`] / [`CondMean::add_hess`] dispatch to each member
//!   at its own offset and hand members without a closed form to a caller
//!   supplied fallback.
//!
//! Invariants & assumptions
//! ------------------------
//! - Member offsets are relative to the start of the mean block, which is
//!   also the start of θ.
use crate::regarch::{
    components::{
        mean::{MeanComponent, MeanType},
        DerivCtx,
    },
    core::data::ValueState,
    errors::{RegArchError, RegArchResult},
};
use ndarray::{Array1, Array2};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CondMean {
    components: Vec<MeanComponent>,
}

impl CondMean {
    pub fn new() -> Self {
        CondMean { components: Vec::new() }
    }

    /// Build from a list, rejecting duplicate types.
    pub fn from_components(components: Vec<MeanComponent>) -> RegArchResult<Self> {
        let mut agg = CondMean::new();
        for c in components {
            agg.add_one_mean(c)?;
        }
        Ok(agg)
    }

    /// Append a component after the existing ones.
    ///
    /// Errors
    /// ------
    /// - `DuplicateComponent` if a component of the same type is present.
    pub fn add_one_mean(&mut self, component: MeanComponent) -> RegArchResult<()> {
        let kind = component.kind();
        if self.components.iter().any(|c| c.kind() == kind) {
            return Err(RegArchError::DuplicateComponent { kind: kind.name() });
        }
        self.components.push(component);
        Ok(())
    }

    /// Remove and return the component of type `kind`.
    pub fn delete_by_kind(&mut self, kind: MeanType) -> RegArchResult<MeanComponent> {
        match self.components.iter().position(|c| c.kind() == kind) {
            Some(i) => Ok(self.components.remove(i)),
            None => Err(RegArchError::ComponentNotFound { kind: kind.name() }),
        }
    }

    /// Remove the component owning the block-level parameter `name`
    /// (e.g. `"Ar[2]"`).
    pub fn delete_by_param_name(&mut self, name: &str) -> RegArchResult<MeanComponent> {
        match self.components.iter().position(|c| c.params().index_of(name).is_ok()) {
            Some(i) => Ok(self.components.remove(i)),
            None => Err(RegArchError::UnknownParamName { name: name.to_string() }),
        }
    }

    pub fn components(&self) -> &[MeanComponent] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn n_param(&self) -> usize {
        self.components.iter().map(|c| c.n_param()).sum()
    }

    pub fn n_lags(&self) -> usize {
        self.components.iter().map(|c| c.n_lags()).max().unwrap_or(0)
    }

    /// Start of each member's block, relative to the mean block.
    pub fn offsets(&self) -> Vec<usize> {
        let mut acc = 0;
        self.components
            .iter()
            .map(|c| {
                let o = acc;
                acc += c.n_param();
                o
            })
            .collect()
    }

    pub fn param_names(&self) -> Vec<String> {
        self.components.iter().flat_map(|c| c.params().names().iter().cloned()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.components.iter().flat_map(|c| c.params().as_slice().iter().copied()).collect()
    }

    /// Assign the whole mean block.
    ///
    /// Errors
    /// ------
    /// - `ParamLengthMismatch` if `values.len() != n_param()`.
    pub fn assign(&mut self, values: &[f64]) -> RegArchResult<()> {
        if values.len() != self.n_param() {
            return Err(RegArchError::ParamLengthMismatch {
                expected: self.n_param(),
                actual: values.len(),
            });
        }
        let mut start = 0;
        for c in &mut self.components {
            let n = c.n_param();
            c.assign(&values[start..start + n])?;
            start += n;
        }
        Ok(())
    }

    /// Member index and within-block index of mean parameter `i`.
    fn locate(&self, i: usize) -> RegArchResult<(usize, usize)> {
        let mut start = 0;
        for (k, c) in self.components.iter().enumerate() {
            if i < start + c.n_param() {
                return Ok((k, i - start));
            }
            start += c.n_param();
        }
        Err(RegArchError::IndexOutOfRange { index: i, len: self.n_param() })
    }

    pub(crate) fn set_at(&mut self, i: usize, value: f64) -> RegArchResult<()> {
        let (k, j) = self.locate(i)?;
        self.components[k].set_at(j, value)
    }

    /// Index inside the mean block of the block-level name `name`.
    pub fn index_of(&self, name: &str) -> RegArchResult<usize> {
        let mut start = 0;
        for c in &self.components {
            if let Ok(j) = c.params().index_of(name) {
                return Ok(start + j);
            }
            start += c.n_param();
        }
        Err(RegArchError::UnknownParamName { name: name.to_string() })
    }

    pub fn update_proxy(&mut self) {
        self.components.iter_mut().for_each(|c| c.update_proxy());
    }

    pub fn set_default_init_point(&mut self, mean: f64) -> RegArchResult<()> {
        self.components.iter_mut().try_for_each(|c| c.set_default_init_point(mean))
    }

    pub fn check_data(&self, state: &ValueState) -> RegArchResult<()> {
        self.components.iter().try_for_each(|c| c.check_data(state))
    }

    /// `m_t` as the sum of member values.
    pub fn value(&self, t: usize, state: &ValueState) -> f64 {
        self.components.iter().map(|c| c.value(t, state)).sum()
    }

    /// Accumulate `∇m_t`; `fallback(k, out)` handles member `k` when it has
    /// no closed-form gradient.
    pub fn add_grad<F>(&self, ctx: &DerivCtx<'_>, out: &mut Array1<f64>, mut fallback: F) -> RegArchResult<()>
    where
        F: FnMut(usize, &mut Array1<f64>) -> RegArchResult<()>,
    {
        for (k, (c, o)) in self.components.iter().zip(self.offsets()).enumerate() {
            if c.has_analytic_grad() {
                c.add_grad(&ctx.with_offset(ctx.offset + o), out)?;
            } else {
                fallback(k, out)?;
            }
        }
        Ok(())
    }

    /// Accumulate `∇²m_t`; same fallback protocol as [`CondMean::add_grad`].
    pub fn add_hess<F>(&self, ctx: &DerivCtx<'_>, out: &mut Array2<f64>, mut fallback: F) -> RegArchResult<()>
    where
        F: FnMut(usize, &mut Array2<f64>) -> RegArchResult<()>,
    {
        for (k, (c, o)) in self.components.iter().zip(self.offsets()).enumerate() {
            if c.has_analytic_hess() {
                c.add_hess(&ctx.with_offset(ctx.offset + o), out)?;
            } else {
                fallback(k, out)?;
            }
        }
        Ok(())
    }
}
