//! Column standardization (zero mean, unit variance).
//!
//! The scaler is fit on training rows only and then applied unchanged to test
//! rows and to forecast inputs. Statistics use the population standard
//! deviation; a constant column gets scale `1.0` so it maps to all zeros.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::math::{mean, population_std};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
}

impl Standardizer {
    /// Fit per-column mean and scale.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, AppError> {
        let Some(first) = rows.first() else {
            return Err(AppError::new(3, "Cannot fit a standardizer on zero rows."));
        };
        let n_cols = first.len();
        if rows.iter().any(|r| r.len() != n_cols) {
            return Err(AppError::new(4, "Ragged feature matrix passed to standardizer."));
        }

        let mut means = Vec::with_capacity(n_cols);
        let mut scales = Vec::with_capacity(n_cols);
        let mut column = Vec::with_capacity(rows.len());
        for j in 0..n_cols {
            column.clear();
            column.extend(rows.iter().map(|r| r[j]));
            let sd = population_std(&column);
            means.push(mean(&column));
            scales.push(if sd > 1e-12 && sd.is_finite() { sd } else { 1.0 });
        }

        Ok(Self { means, scales })
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(self.scales.iter()))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_use_training_statistics() {
        let train = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = Standardizer::fit(&train).unwrap();
        assert_eq!(scaler.means, vec![2.0, 10.0]);
        assert_eq!(scaler.scales, vec![1.0, 1.0]);

        // A test row far from the training data is not re-centred.
        let t = scaler.transform(&[7.0, 12.0]);
        assert_eq!(t, vec![5.0, 2.0]);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(Standardizer::fit(&[]).unwrap_err().exit_code(), 3);
    }

    mod props {
        use super::*;
        use crate::math::population_std;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn transformed_training_columns_are_standard(
                rows in prop::collection::vec(prop::collection::vec(-100.0f64..100.0, 3), 2..40),
            ) {
                let scaler = Standardizer::fit(&rows).unwrap();
                let out = scaler.transform_all(&rows);
                for j in 0..3 {
                    let col: Vec<f64> = out.iter().map(|r| r[j]).collect();
                    let m = mean(&col);
                    prop_assert!(m.abs() < 1e-9);
                    let sd = population_std(&col);
                    // Constant columns map to zero; everything else has unit spread.
                    prop_assert!(sd < 1e-9 || (sd - 1.0).abs() < 1e-9);
                }
            }
        }
    }
}
