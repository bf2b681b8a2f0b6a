//! Regression accuracy metrics over paired `(actual, predicted)` slices.
//!
//! Mismatched or empty inputs return NaN rather than panicking; the trainer
//! treats a NaN metric as a failed model.

use crate::domain::ModelMetrics;

pub fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    sum / actual.len() as f64
}

pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    mse(actual, predicted).sqrt()
}

pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();
    sum / actual.len() as f64
}

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// With a constant target (`SS_tot = 0`) this is 1 for a perfect fit and 0 otherwise.
pub fn r2(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    if ss_tot <= 1e-18 {
        return if ss_res <= 1e-18 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// All held-out metrics at once.
pub fn evaluate(actual: &[f64], predicted: &[f64]) -> ModelMetrics {
    let mse = mse(actual, predicted);
    ModelMetrics {
        mse,
        rmse: mse.sqrt(),
        mae: mae(actual, predicted),
        r2: r2(actual, predicted),
        n_test: actual.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let a = [60.0, 65.0, 70.0];
        let m = evaluate(&a, &a);
        assert_eq!(m.mse, 0.0);
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.r2, 1.0);
        assert_eq!(m.n_test, 3);
    }

    #[test]
    fn known_errors() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let p = [2.0, 2.0, 3.0, 2.0];
        // residuals: -1, 0, 0, 2 -> SS_res = 5, SS_tot = 5
        assert!((mse(&a, &p) - 1.25).abs() < 1e-12);
        assert!((rmse(&a, &p) - 1.25_f64.sqrt()).abs() < 1e-12);
        assert!((mae(&a, &p) - 0.75).abs() < 1e-12);
        assert!(r2(&a, &p).abs() < 1e-12);
    }

    #[test]
    fn mean_prediction_scores_zero_and_worse_is_negative() {
        let a = [1.0, 2.0, 3.0];
        assert!(r2(&a, &[2.0, 2.0, 2.0]).abs() < 1e-12);
        assert!(r2(&a, &[3.0, 2.0, 1.0]) < 0.0);
    }

    #[test]
    fn mismatched_lengths_are_nan() {
        assert!(mse(&[1.0], &[]).is_nan());
        assert!(r2(&[], &[]).is_nan());
    }
}
