//! Lag windows over a single country's history.
//!
//! For a series `s` and width `W`, every index `i >= W` yields one window:
//! scores `s[i-W..i]` (chronological), the `W-1` changes ending at `i-1`, and
//! the target `s[i]`. A series with `W` points or fewer yields nothing.

use crate::domain::CountrySeries;

/// One historical window and the value that followed it.
#[derive(Debug, Clone, PartialEq)]
pub struct LagWindow {
    /// Year of the target observation.
    pub target_year: i32,
    /// The `W` scores before the target, oldest first.
    pub scores: Vec<f64>,
    /// Up to `W-1` year-over-year changes ending at the last window score, oldest first.
    pub changes: Vec<f64>,
    pub target: f64,
}

/// All windows of width `width` over `series`, in chronological order.
pub fn lag_windows(series: &CountrySeries, width: usize) -> Vec<LagWindow> {
    let points = series.points();
    if width == 0 || points.len() <= width {
        return Vec::new();
    }

    let changes = series.changes();
    (width..points.len())
        .map(|i| {
            let scores = points[i - width..i].iter().map(|p| p.score).collect();
            let change_start = (i + 1).saturating_sub(width);
            let window_changes = changes[change_start..i].iter().flatten().copied().collect();
            LagWindow {
                target_year: points[i].year,
                scores,
                changes: window_changes,
                target: points[i].score,
            }
        })
        .collect()
}
