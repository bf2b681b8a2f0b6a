//! Trend statistics derived from a single lag window.
//!
//! Every function is a pure function of its inputs. Short or degenerate
//! windows never fail: slopes fall back to `0.0` and change averages use
//! whatever history is available (or `0.0` when there is none).

use crate::domain::FeatureRow;
use crate::math::{index_slope, mean, sample_std};

/// The four window-level trend features.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendFeatures {
    pub trend_slope: f64,
    pub trend_acceleration: f64,
    pub score_volatility: f64,
    pub recent_momentum: f64,
}

/// Slope of score against position (per year).
pub fn trend_slope(scores: &[f64]) -> f64 {
    index_slope(scores)
}

/// Slope of change against position; `0.0` with fewer than 2 changes.
pub fn trend_acceleration(changes: &[f64]) -> f64 {
    index_slope(changes)
}

/// Sample standard deviation of the window scores.
pub fn score_volatility(scores: &[f64]) -> f64 {
    sample_std(scores)
}

/// Mean of the last `min(2, len)` changes; `0.0` with no changes.
pub fn recent_momentum(changes: &[f64]) -> f64 {
    tail_mean(changes, 2)
}

/// Mean of the last `min(k, len)` values; `0.0` for an empty slice.
pub fn tail_mean(values: &[f64], k: usize) -> f64 {
    let start = values.len().saturating_sub(k);
    mean(&values[start..])
}

/// Compute all four trend features for a window (both slices oldest first).
pub fn trend_features(scores: &[f64], changes: &[f64]) -> TrendFeatures {
    TrendFeatures {
        trend_slope: trend_slope(scores),
        trend_acceleration: trend_acceleration(changes),
        score_volatility: score_volatility(scores),
        recent_momentum: recent_momentum(changes),
    }
}

/// Build a feature row from a chronological window.
///
/// `scores` and `changes` are oldest first; the row stores lags most recent first.
pub fn build_feature_row(
    country: &str,
    reference_year: i32,
    scores: &[f64],
    changes: &[f64],
    target_score: Option<f64>,
) -> FeatureRow {
    let trend = trend_features(scores, changes);
    FeatureRow {
        country: country.to_string(),
        reference_year,
        lags: scores.iter().rev().copied().collect(),
        recent_change: changes.last().copied().unwrap_or(0.0),
        avg_change_2yr: tail_mean(changes, 2),
        avg_change_3yr: tail_mean(changes, 3),
        trend_slope: trend.trend_slope,
        trend_acceleration: trend.trend_acceleration,
        score_volatility: trend.score_volatility,
        recent_momentum: trend.recent_momentum,
        target_score,
    }
}
