//! Linear regressors: ordinary least squares and ridge.
//!
//! Both fit on centred data and recover the intercept afterwards, so ridge
//! never penalises the intercept and OLS stays well conditioned when raw score
//! levels are large relative to their spread.

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;
use crate::math::{solve_least_squares, solve_ridge};

#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    /// Ordinary least squares.
    pub fn fit_ols(x: &[Vec<f64>], y: &[f64]) -> Result<Self, AppError> {
        fit_centred(x, y, None)
    }

    /// Ridge regression with penalty `alpha` on the coefficients.
    pub fn fit_ridge(x: &[Vec<f64>], y: &[f64], alpha: f64) -> Result<Self, AppError> {
        if !(alpha.is_finite() && alpha >= 0.0) {
            return Err(AppError::new(4, format!("Invalid ridge penalty alpha={alpha}.")));
        }
        fit_centred(x, y, Some(alpha))
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row.iter())
                .map(|(b, v)| b * v)
                .sum::<f64>()
    }
}

fn fit_centred(x: &[Vec<f64>], y: &[f64], alpha: Option<f64>) -> Result<LinearModel, AppError> {
    let n = x.len();
    let p = x.first().map(Vec::len).unwrap_or(0);

    let x_bar: Vec<f64> = (0..p)
        .map(|j| x.iter().map(|r| r[j]).sum::<f64>() / n as f64)
        .collect();
    let y_bar = y.iter().sum::<f64>() / n as f64;

    let xc = DMatrix::from_fn(n, p, |i, j| x[i][j] - x_bar[j]);
    let yc = DVector::from_fn(n, |i, _| y[i] - y_bar);

    let beta = match alpha {
        None => solve_least_squares(&xc, &yc),
        Some(a) => solve_ridge(&xc, &yc, a),
    }
    .ok_or_else(|| AppError::new(4, "Least squares system is too ill-conditioned to solve."))?;

    let coefficients: Vec<f64> = beta.iter().copied().collect();
    let intercept = y_bar
        - coefficients
            .iter()
            .zip(x_bar.iter())
            .map(|(b, m)| b * m)
            .sum::<f64>();

    if !intercept.is_finite() {
        return Err(AppError::new(4, "Non-finite intercept in linear fit."));
    }

    Ok(LinearModel {
        intercept,
        coefficients,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane() -> (Vec<Vec<f64>>, Vec<f64>) {
        // y = 3 + 2*a - b
        let x: Vec<Vec<f64>> = (0..12)
            .map(|i| vec![i as f64, ((i * 7) % 5) as f64])
            .collect();
        let y = x.iter().map(|r| 3.0 + 2.0 * r[0] - r[1]).collect();
        (x, y)
    }

    #[test]
    fn ols_recovers_exact_plane() {
        let (x, y) = plane();
        let m = LinearModel::fit_ols(&x, &y).unwrap();
        assert!((m.intercept - 3.0).abs() < 1e-8);
        assert!((m.coefficients[0] - 2.0).abs() < 1e-8);
        assert!((m.coefficients[1] + 1.0).abs() < 1e-8);
        assert!((m.predict(&[10.0, 4.0]) - 19.0).abs() < 1e-8);
    }

    #[test]
    fn ridge_shrinks_coefficients_but_not_intercept_level() {
        let (x, y) = plane();
        let ols = LinearModel::fit_ols(&x, &y).unwrap();
        let ridge = LinearModel::fit_ridge(&x, &y, 50.0).unwrap();
        let norm = |m: &LinearModel| m.coefficients.iter().map(|b| b * b).sum::<f64>();
        assert!(norm(&ridge) < norm(&ols));

        // Predictions at the training mean equal the target mean for both.
        let x_bar = [5.5, x.iter().map(|r| r[1]).sum::<f64>() / 12.0];
        let y_bar = y.iter().sum::<f64>() / 12.0;
        assert!((ridge.predict(&x_bar) - y_bar).abs() < 1e-8);
    }
}
