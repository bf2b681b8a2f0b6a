//! Least squares solvers for the linear regressors.
//!
//! Both solvers work on small dense systems (a few hundred rows, about a dozen
//! columns), so we solve them directly with `nalgebra` rather than iterating.
//!
//! - [`solve_least_squares`] uses SVD so tall and rank-deficient designs still
//!   produce a minimum-norm answer. Lag columns are highly collinear, which is
//!   the normal case here rather than an edge case.
//! - [`solve_ridge`] forms the regularised normal equations, which are
//!   symmetric positive definite for `alpha > 0`, and falls back to SVD when
//!   Cholesky fails (e.g. `alpha = 0` on a singular design).

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve `(XᵀX + αI) β = Xᵀy`.
///
/// `x` and `y` are expected to be centred already; the caller owns the intercept.
pub fn solve_ridge(x: &DMatrix<f64>, y: &DVector<f64>, alpha: f64) -> Option<DVector<f64>> {
    let p = x.ncols();
    let xt = x.transpose();
    let gram = &xt * x + DMatrix::<f64>::identity(p, p) * alpha;
    let rhs = &xt * y;

    if let Some(chol) = gram.clone().cholesky() {
        let beta = chol.solve(&rhs);
        if beta.iter().all(|v| v.is_finite()) {
            return Some(beta);
        }
    }

    solve_least_squares(&gram, &rhs)
}
