//! inference::covariance — eigen-based covariance building blocks.
//!
//! Purpose
//! -------
//! Turn per-observation scores and average Hessians into asymptotic
//! covariance matrices without ever forming an explicit inverse. This
//! module handles the conversion between `ndarray` and `nalgebra` types and
//! supplies the outer-product, pseudo-inverse and sandwich steps that the
//! likelihood-level covariance routines compose.
//!
//! Key behaviors
//! -------------
//! - [`avg_outer_product`] computes `(1/N) SᵀS` from an `N×p` score matrix.
//! - [`pseudo_inverse`] returns the Moore–Penrose pseudo-inverse of a
//!   symmetric matrix via `symmetric_eigen`, dropping eigenvalues at or
//!   below [`EIGEN_EPS`].
//! - [`sandwich`] forms `B M B` for a symmetric bread `B` and meat `M`.
//! - [`standard_errors`] takes square roots of a covariance diagonal.
//!
//! Invariants & assumptions
//! ------------------------
//! - Matrices passed to [`pseudo_inverse`] are treated as symmetric; only
//!   the lower triangle is read by the eigen solver.
//! - Every input is checked for shape and finiteness before any linear
//!   algebra runs.
//!
//! Conventions
//! -----------
//! - Directions with eigenvalue `λ ≤ EIGEN_EPS` (including negative ones)
//!   contribute nothing, which leaves weakly identified directions with
//!   zero rather than exploding variance.
//! - Errors are reported via [`InferenceResult<T>`].
//!
//! Testing notes
//! -------------
//! - Unit tests cover the `ndarray → DMatrix` copy, pseudo-inverses of
//!   diagonal and rank-deficient matrices, sandwich assembly and the shape
//!   and finiteness guards.
use crate::inference::errors::{InferenceError, InferenceResult};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// Eigenvalues at or below this threshold are treated as zero.
pub const EIGEN_EPS: f64 = 1e-12;

/// avg_outer_product — average outer product of per-observation scores.
///
/// Parameters
/// ----------
/// - `scores`: `&Array2<f64>`
///   `N×p` matrix, one row per observation.
///
/// Returns
/// -------
/// `InferenceResult<Array2<f64>>`
///   The `p×p` matrix `(1/N) Σ_t g_t g_tᵀ`.
///
/// Errors
/// ------
/// - `EmptyScores` if `N = 0`.
/// - `NonFinite` for any non-finite score.
pub fn avg_outer_product(scores: &Array2<f64>) -> InferenceResult<Array2<f64>> {
    let n = scores.nrows();
    if n == 0 {
        return Err(InferenceError::EmptyScores);
    }
    check_finite(scores)?;
    Ok(scores.t().dot(scores) / n as f64)
}

/// pseudo_inverse — Moore–Penrose pseudo-inverse of a symmetric matrix.
///
/// Parameters
/// ----------
/// - `a`: `&Array2<f64>`
///   Symmetric `p×p` matrix.
///
/// Returns
/// -------
/// `InferenceResult<Array2<f64>>`
///   `Σ_{k: λ_k > EIGEN_EPS} q_k q_kᵀ / λ_k` where `A = Q Λ Qᵀ`.
///
/// Errors
/// ------
/// - `NotSquare` / `NonFinite` for malformed input.
/// - `Singular` if no eigenvalue exceeds [`EIGEN_EPS`].
pub fn pseudo_inverse(a: &Array2<f64>) -> InferenceResult<Array2<f64>> {
    check_square(a)?;
    check_finite(a)?;
    let p = a.nrows();
    let mut a_nalg = DMatrix::<f64>::zeros(p, p);
    fill_dmatrix(a, &mut a_nalg);
    let eigen_decomp = a_nalg.symmetric_eigen();
    let q = eigen_decomp.eigenvectors;
    let eigenvals = eigen_decomp.eigenvalues;

    let max_eigenvalue = eigenvals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if p > 0 && !(max_eigenvalue > EIGEN_EPS) {
        return Err(InferenceError::Singular { max_eigenvalue });
    }

    let mut inv = Array2::<f64>::zeros((p, p));
    for (k, &lambda) in eigenvals.iter().enumerate() {
        if lambda > EIGEN_EPS {
            for i in 0..p {
                let coeff = q[(i, k)] / lambda;
                for j in 0..p {
                    inv[[i, j]] += coeff * q[(j, k)];
                }
            }
        }
    }
    Ok(inv)
}

/// sandwich — `B M B` for symmetric bread `B` and meat `M`.
///
/// Errors
/// ------
/// - `NotSquare` if either operand is not square.
/// - `DimensionMismatch` if their sizes differ.
pub fn sandwich(bread: &Array2<f64>, meat: &Array2<f64>) -> InferenceResult<Array2<f64>> {
    check_square(bread)?;
    check_square(meat)?;
    if bread.nrows() != meat.nrows() {
        return Err(InferenceError::DimensionMismatch { expected: bread.nrows(), actual: meat.nrows() });
    }
    Ok(bread.dot(meat).dot(bread))
}

/// Square roots of the covariance diagonal. Tiny negative entries from
/// rounding are floored at zero.
pub fn standard_errors(cov: &Array2<f64>) -> InferenceResult<Array1<f64>> {
    check_square(cov)?;
    check_finite(cov)?;
    Ok(cov.diag().mapv(|v| v.max(0.0).sqrt()))
}

// ---- Helper methods ----

/// Copy a square `ndarray` matrix into a preallocated `DMatrix`, column by
/// column. No symmetrization is performed.
fn fill_dmatrix(a: &Array2<f64>, a_nalg: &mut DMatrix<f64>) {
    let n = a.ncols();
    for j in 0..n {
        for i in j..n {
            if j == i {
                a_nalg[(i, i)] = a[[i, i]];
            } else {
                a_nalg[(i, j)] = a[[i, j]];
                a_nalg[(j, i)] = a[[j, i]];
            }
        }
    }
}

fn check_square(a: &Array2<f64>) -> InferenceResult<()> {
    if a.nrows() != a.ncols() {
        return Err(InferenceError::NotSquare { rows: a.nrows(), cols: a.ncols() });
    }
    Ok(())
}

fn check_finite(a: &Array2<f64>) -> InferenceResult<()> {
    match a.indexed_iter().find(|(_, v)| !v.is_finite()) {
        Some(((row, col), &value)) => Err(InferenceError::NonFinite { row, col, value }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Correct copying of matrices from `ndarray` into `DMatrix`.
    // - Pseudo-inverses of full-rank and rank-deficient symmetric matrices.
    // - OPG averaging, sandwich assembly and SE extraction.
    // - Shape, finiteness and singularity guards.
    //
    // They intentionally DO NOT cover:
    // - Likelihood-level covariance (see `regarch::algorithms::covariance`).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that `fill_dmatrix` copies entries without altering values.
    //
    // Given
    // -----
    // - A 2×2 symmetric matrix with distinct entries.
    //
    // Expect
    // ------
    // - Identical entries at all positions.
    fn fill_dmatrix_copies_ndarray_into_dmatrix_without_modification() {
        // Arrange
        let a: Array2<f64> = array![[2.0, 0.5], [0.5, 1.0]];
        let mut a_nalg = DMatrix::<f64>::zeros(2, 2);

        // Act
        fill_dmatrix(&a, &mut a_nalg);

        // Assert
        assert_eq!(a_nalg[(0, 0)], 2.0);
        assert_eq!(a_nalg[(0, 1)], 0.5);
        assert_eq!(a_nalg[(1, 0)], 0.5);
        assert_eq!(a_nalg[(1, 1)], 1.0);
    }

    #[test]
    // Purpose
    // -------
    // For a full-rank symmetric matrix the pseudo-inverse is the inverse.
    //
    // Given
    // -----
    // - A = [[2, 1], [1, 2]] with inverse (1/3)[[2, −1], [−1, 2]].
    //
    // Expect
    // ------
    // - Entry-wise agreement to 1e-12.
    fn pseudo_inverse_of_full_rank_matrix_is_inverse() {
        // Arrange
        let a = array![[2.0, 1.0], [1.0, 2.0]];

        // Act
        let inv = pseudo_inverse(&a).unwrap();

        // Assert
        assert_abs_diff_eq!(inv[[0, 0]], 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(inv[[0, 1]], -1.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(inv[[1, 0]], -1.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(inv[[1, 1]], 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A zero eigen-direction is dropped instead of blowing up.
    //
    // Given
    // -----
    // - diag(4, 0).
    //
    // Expect
    // ------
    // - diag(0.25, 0); the all-zero matrix is reported `Singular`.
    fn pseudo_inverse_truncates_null_directions() {
        // Arrange
        let a = array![[4.0, 0.0], [0.0, 0.0]];

        // Act
        let inv = pseudo_inverse(&a).unwrap();
        let err = pseudo_inverse(&Array2::zeros((2, 2))).unwrap_err();

        // Assert
        assert_abs_diff_eq!(inv[[0, 0]], 0.25, epsilon = 1e-14);
        assert_abs_diff_eq!(inv[[1, 1]], 0.0, epsilon = 1e-14);
        assert!(matches!(err, InferenceError::Singular { .. }));
    }

    #[test]
    // Purpose
    // -------
    // OPG averaging and sandwich assembly on hand-checkable inputs.
    //
    // Given
    // -----
    // - Scores [[1, 0], [0, 2]] (N = 2); bread diag(1, 2), meat 2·I.
    //
    // Expect
    // ------
    // - OPG = diag(0.5, 2); sandwich = diag(2, 8); SE = (sqrt 2, sqrt 8).
    fn opg_and_sandwich_match_hand_computation() {
        // Arrange
        let scores = array![[1.0, 0.0], [0.0, 2.0]];
        let bread = array![[1.0, 0.0], [0.0, 2.0]];
        let meat = array![[2.0, 0.0], [0.0, 2.0]];

        // Act
        let opg = avg_outer_product(&scores).unwrap();
        let sw = sandwich(&bread, &meat).unwrap();
        let se = standard_errors(&sw).unwrap();

        // Assert
        assert_eq!(opg, array![[0.5, 0.0], [0.0, 2.0]]);
        assert_eq!(sw, array![[2.0, 0.0], [0.0, 8.0]]);
        assert_abs_diff_eq!(se[0], 2.0_f64.sqrt(), epsilon = 1e-15);
        assert_abs_diff_eq!(se[1], 8.0_f64.sqrt(), epsilon = 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // Shape and finiteness guards fire before any linear algebra.
    //
    // Given
    // -----
    // - A 2×3 matrix, a matrix with NaN, mismatched sandwich operands and
    //   an empty score matrix.
    //
    // Expect
    // ------
    // - `NotSquare`, `NonFinite`, `DimensionMismatch`, `EmptyScores`.
    fn guards_reject_malformed_inputs() {
        // Arrange
        let rect = Array2::<f64>::zeros((2, 3));
        let nan = array![[1.0, f64::NAN], [0.0, 1.0]];
        let empty = Array2::<f64>::zeros((0, 2));

        // Act + Assert
        assert_eq!(pseudo_inverse(&rect), Err(InferenceError::NotSquare { rows: 2, cols: 3 }));
        assert!(matches!(pseudo_inverse(&nan), Err(InferenceError::NonFinite { row: 0, col: 1, .. })));
        assert_eq!(
            sandwich(&Array2::eye(2), &Array2::eye(3)),
            Err(InferenceError::DimensionMismatch { expected: 2, actual: 3 })
        );
        assert_eq!(avg_outer_product(&empty), Err(InferenceError::EmptyScores));
    }
}
