//! Small-sample descriptive statistics.
//!
//! All functions here are total: degenerate inputs (empty slices, a single
//! value, zero variance in the predictor) return `0.0` instead of NaN so that
//! callers can use them directly as model features.

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (`n - 1` denominator); `0.0` for fewer than 2 values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (n as f64 - 1.0)).sqrt()
}

/// Population standard deviation; `0.0` for an empty slice.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / values.len() as f64).sqrt()
}

/// OLS slope of `values[i]` against position `i`.
///
/// Returns `0.0` for fewer than 2 values.
pub fn index_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_bar = (n as f64 - 1.0) / 2.0;
    let y_bar = mean(values);

    let mut cov = 0.0;
    let mut var = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_bar;
        cov += dx * (y - y_bar);
        var += dx * dx;
    }
    if var <= 1e-18 || !cov.is_finite() {
        return 0.0;
    }
    cov / var
}
