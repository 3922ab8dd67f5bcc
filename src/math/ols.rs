//! Linear least squares.
//!
//! Polynomial models are linear in their coefficients, so fitting one is a
//! single least-squares solve:
//!
//! ```text
//! minimize Σ w_i (y_i - x_i^T β)^2
//! ```
//!
//! Rows are scaled by `sqrt(w_i)` by the caller. The solve goes through SVD,
//! which copes with tall design matrices and with the near-collinear columns
//! that high-degree monomials produce on narrow x ranges.

use nalgebra::{DMatrix, DVector};

use crate::math::errors::{NumericError, NumericResult};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Progressively looser singular-value cutoffs.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Inverse of the normal matrix `XᵀX`, i.e. the unscaled parameter covariance.
///
/// Multiply by the residual variance `SSE / (n - k)` to get the covariance of
/// the estimates.
pub fn normal_inverse(x: &DMatrix<f64>) -> NumericResult<DMatrix<f64>> {
    let xtx = x.transpose() * x;
    let inv = xtx.pseudo_inverse(1e-12).map_err(|_| NumericError::Singular)?;
    if inv.iter().all(|v| v.is_finite()) {
        Ok(inv)
    } else {
        Err(NumericError::Singular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn normal_inverse_of_orthogonal_design() {
        // Columns [1, x] with x centred: XᵀX = diag(4, 20).
        let x = DMatrix::from_row_slice(4, 2, &[1.0, -3.0, 1.0, -1.0, 1.0, 1.0, 1.0, 3.0]);
        let inv = normal_inverse(&x).unwrap();
        assert!((inv[(0, 0)] - 0.25).abs() < 1e-12);
        assert!((inv[(1, 1)] - 0.05).abs() < 1e-12);
        assert!(inv[(0, 1)].abs() < 1e-12);
    }
}
