//! core::params — named parameter blocks.
//!
//! Purpose
//! -------
//! Provide [`ParamBlock`], the ordered and named sequence of scalar
//! parameters owned by one mean component, the variance component, or the
//! residual distribution.
//!
//! Key behaviors
//! -------------
//! - A block is a list of named groups (`Const`, `Arch[1..p]`, `Dof`, …)
//!   laid out contiguously; the group order is the block's flat order.
//! - Values live in a single index-based store. A name→index table is built
//!   once at construction and name access is sugar over index access.
//! - Unknown names and out-of-range indices are errors, never defaults.
//!
//! Invariants & assumptions
//! ------------------------
//! - The parameter count is fixed by the structural order given to the
//!   builder. Changing an order means building a new block.
//!
//! Conventions
//! -----------
//! - Lag-indexed groups name their elements `Group[i]` with `i` starting at
//!   1 (e.g. `Arch[1]` multiplies `u²_{t−1}`); scalar groups use the bare
//!   group name.
//! - Within-group indices passed to [`ParamBlock::get_in`] are 0-based.
use crate::regarch::errors::{RegArchError, RegArchResult};
use std::collections::HashMap;
use std::ops::Range;

/// A contiguous named run of parameters inside a [`ParamBlock`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGroup {
    pub name: &'static str,
    pub start: usize,
    pub len: usize,
    pub indexed: bool,
}

impl ParamGroup {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// Builder collecting group declarations in layout order.
#[derive(Debug, Clone, Default)]
pub struct BlockLayout {
    groups: Vec<(&'static str, usize, bool)>,
}

impl BlockLayout {
    pub fn new() -> Self {
        BlockLayout { groups: Vec::new() }
    }

    /// Single parameter named after the group.
    pub fn scalar(mut self, name: &'static str) -> Self {
        self.groups.push((name, 1, false));
        self
    }

    /// `len` parameters named `name[1]..name[len]`. Empty groups are kept so
    /// that group lookup still succeeds for zero orders.
    pub fn lags(mut self, name: &'static str, len: usize) -> Self {
        self.groups.push((name, len, true));
        self
    }

    pub fn build(self) -> ParamBlock {
        ParamBlock::from_layout(self)
    }
}

/// Ordered, named parameter storage for one component or distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamBlock {
    values: Vec<f64>,
    groups: Vec<ParamGroup>,
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl ParamBlock {
    pub fn builder() -> BlockLayout {
        BlockLayout::new()
    }

    fn from_layout(layout: BlockLayout) -> Self {
        let mut groups = Vec::with_capacity(layout.groups.len());
        let mut names = Vec::new();
        let mut start = 0;
        for (name, len, indexed) in layout.groups {
            groups.push(ParamGroup { name, start, len, indexed });
            if indexed {
                names.extend((1..=len).map(|i| format!("{name}[{i}]")));
            } else {
                names.push(name.to_string());
            }
            start += len;
        }
        let index = names.iter().enumerate().map(|(i, n)| (n.clone(), i)).collect();
        ParamBlock { values: vec![0.0; start], groups, names, index }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn groups(&self) -> &[ParamGroup] {
        &self.groups
    }

    /// Unchecked read used inside recursions where the layout is known.
    pub(crate) fn at(&self, i: usize) -> f64 {
        self.values[i]
    }

    pub fn get(&self, i: usize) -> RegArchResult<f64> {
        self.values
            .get(i)
            .copied()
            .ok_or(RegArchError::IndexOutOfRange { index: i, len: self.values.len() })
    }

    pub fn set(&mut self, i: usize, value: f64) -> RegArchResult<()> {
        let len = self.values.len();
        let slot = self.values.get_mut(i).ok_or(RegArchError::IndexOutOfRange { index: i, len })?;
        *slot = value;
        Ok(())
    }

    pub fn group(&self, name: &str) -> RegArchResult<&ParamGroup> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| RegArchError::UnknownParamName { name: name.to_string() })
    }

    pub fn group_slice(&self, name: &str) -> RegArchResult<&[f64]> {
        let range = self.group(name)?.range();
        Ok(&self.values[range])
    }

    /// Read element `idx` (0-based) of group `name`.
    pub fn get_in(&self, name: &str, idx: usize) -> RegArchResult<f64> {
        let group = self.group(name)?;
        if idx >= group.len {
            return Err(RegArchError::IndexOutOfRange { index: idx, len: group.len });
        }
        Ok(self.values[group.start + idx])
    }

    pub fn set_in(&mut self, name: &str, idx: usize, value: f64) -> RegArchResult<()> {
        let group = self.group(name)?;
        if idx >= group.len {
            return Err(RegArchError::IndexOutOfRange { index: idx, len: group.len });
        }
        let pos = group.start + idx;
        self.values[pos] = value;
        Ok(())
    }

    pub fn index_of(&self, name: &str) -> RegArchResult<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| RegArchError::UnknownParamName { name: name.to_string() })
    }

    pub fn get_by_name(&self, name: &str) -> RegArchResult<f64> {
        Ok(self.values[self.index_of(name)?])
    }

    pub fn set_by_name(&mut self, name: &str, value: f64) -> RegArchResult<()> {
        let i = self.index_of(name)?;
        self.values[i] = value;
        Ok(())
    }

    /// Overwrite all values from a slice of exactly [`len`](Self::len) entries.
    pub fn assign(&mut self, values: &[f64]) -> RegArchResult<()> {
        if values.len() != self.values.len() {
            return Err(RegArchError::ParamLengthMismatch {
                expected: self.values.len(),
                actual: values.len(),
            });
        }
        self.values.copy_from_slice(values);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Layout and naming of groups built through `BlockLayout`.
    // - Index, group and name access, including error paths.
    // - Whole-block assignment length checks.
    //
    // They intentionally DO NOT cover:
    // - Component-specific layouts (tested with each component).
    // -------------------------------------------------------------------------

    fn garch_like() -> ParamBlock {
        ParamBlock::builder().scalar("Const").lags("Arch", 2).lags("Garch", 1).build()
    }

    #[test]
    // Purpose
    // -------
    // Groups are laid out contiguously in declaration order with 1-based
    // element names for lag groups.
    //
    // Given
    // -----
    // - A block `Const, Arch[2], Garch[1]`.
    //
    // Expect
    // ------
    // - Four parameters named in layout order and group ranges that tile them.
    fn builder_lays_out_groups_in_declaration_order() {
        // Arrange + Act
        let block = garch_like();

        // Assert
        assert_eq!(block.len(), 4);
        assert_eq!(block.names(), &["Const", "Arch[1]", "Arch[2]", "Garch[1]"]);
        assert_eq!(block.group("Arch").unwrap().range(), 1..3);
        assert_eq!(block.group("Garch").unwrap().range(), 3..4);
    }

    #[test]
    // Purpose
    // -------
    // Name access and group access address the same underlying storage.
    //
    // Given
    // -----
    // - A value written through `set_in("Arch", 1, ..)`.
    //
    // Expect
    // ------
    // - It is visible through `get_by_name("Arch[2]")` and `get(2)`.
    fn name_and_index_access_share_storage() {
        // Arrange
        let mut block = garch_like();

        // Act
        block.set_in("Arch", 1, 0.25).unwrap();

        // Assert
        assert_eq!(block.get_by_name("Arch[2]").unwrap(), 0.25);
        assert_eq!(block.get(2).unwrap(), 0.25);
        assert_eq!(block.index_of("Garch[1]").unwrap(), 3);
    }

    #[test]
    // Purpose
    // -------
    // Unknown names and bad indices surface as errors.
    //
    // Given
    // -----
    // - A `Const, Arch[2], Garch[1]` block.
    //
    // Expect
    // ------
    // - `UnknownParamName` for a foreign name and `IndexOutOfRange` for an
    //   index past the group end.
    fn unknown_name_and_bad_index_are_errors() {
        // Arrange
        let mut block = garch_like();

        // Act + Assert
        assert!(matches!(
            block.get_by_name("Dof"),
            Err(RegArchError::UnknownParamName { ref name }) if name == "Dof"
        ));
        assert_eq!(
            block.get_in("Arch", 2),
            Err(RegArchError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert!(block.set(4, 1.0).is_err());
    }

    #[test]
    // Purpose
    // -------
    // `assign` rejects slices whose length differs from the block size.
    //
    // Given
    // -----
    // - A 4-parameter block and slices of length 3 and 4.
    //
    // Expect
    // ------
    // - Length 3 fails with `ParamLengthMismatch`; length 4 is copied.
    fn assign_checks_length() {
        // Arrange
        let mut block = garch_like();

        // Act
        let bad = block.assign(&[1.0, 2.0, 3.0]);
        let good = block.assign(&[0.1, 0.2, 0.3, 0.4]);

        // Assert
        assert_eq!(bad, Err(RegArchError::ParamLengthMismatch { expected: 4, actual: 3 }));
        assert!(good.is_ok());
        assert_eq!(block.as_slice(), &[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(block.group_slice("Arch").unwrap(), &[0.2, 0.3]);
    }
}
