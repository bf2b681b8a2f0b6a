//! Iterative (recursive) multi-step forecaster.
//!
//! Per country:
//!
//! - a country with fewer than `window` observations is skipped
//! - otherwise a [`RollingBuffer`] is seeded with the last `window` scores and
//!   the last `window - 1` changes
//! - for each step: build an inference row from the buffer, predict, clamp to
//!   `[clamp_min, clamp_max]`, emit, then slide the clamped value into the
//!   buffer (its change is taken against the previous newest score)
//!
//! The buffer never grows past its capacity and is dropped once the country's
//! horizon is exhausted. Countries are independent and run in parallel; the
//! model and scaler are only read.

use std::collections::VecDeque;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::{CountrySeries, FeatureRow, ForecastPoint, PipelineConfig, SkippedCountry};
use crate::features::{Standardizer, build_feature_row};
use crate::fit::ModelResult;

/// Rollout parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastSettings {
    pub window: usize,
    pub horizon: usize,
    pub clamp_min: f64,
    pub clamp_max: f64,
}

impl ForecastSettings {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            window: config.window,
            horizon: config.horizon,
            clamp_min: config.clamp_min,
            clamp_max: config.clamp_max,
        }
    }
}

/// Fixed-capacity window of recent scores and changes for one country.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingBuffer {
    scores: VecDeque<f64>,
    changes: VecDeque<f64>,
    window: usize,
    last_year: i32,
}

impl RollingBuffer {
    /// Seed from the tail of `series`; `None` when it has fewer than `window` points.
    pub fn from_series(series: &CountrySeries, window: usize) -> Option<Self> {
        let n = series.len();
        if window == 0 || n < window {
            return None;
        }
        let points = series.points();
        let scores: VecDeque<f64> = points[n - window..].iter().map(|p| p.score).collect();

        let all_changes = series.changes();
        let change_start = n - (window - 1);
        let changes: VecDeque<f64> = all_changes[change_start..].iter().flatten().copied().collect();

        Some(Self {
            scores,
            changes,
            window,
            last_year: series.last().year,
        })
    }

    /// Scores oldest first.
    pub fn scores(&self) -> Vec<f64> {
        self.scores.iter().copied().collect()
    }

    /// Changes oldest first.
    pub fn changes(&self) -> Vec<f64> {
        self.changes.iter().copied().collect()
    }

    pub fn last_year(&self) -> i32 {
        self.last_year
    }

    /// Inference row for the year after the buffer's newest score.
    pub fn feature_row(&self, country: &str) -> FeatureRow {
        build_feature_row(country, self.last_year + 1, &self.scores(), &self.changes(), None)
    }

    /// Slide `score` in as the next year's value.
    pub fn push(&mut self, score: f64) {
        let previous = self.scores.back().copied().unwrap_or(score);
        if self.scores.len() == self.window {
            self.scores.pop_front();
        }
        self.scores.push_back(score);

        let change_capacity = self.window.saturating_sub(1);
        if change_capacity > 0 {
            if self.changes.len() == change_capacity {
                self.changes.pop_front();
            }
            self.changes.push_back(score - previous);
        }
        self.last_year += 1;
    }
}

/// Forecasts for every country, plus the countries that could not be forecast.
#[derive(Debug, Clone, Default)]
pub struct ForecastOutput {
    /// Grouped by country (input order), then by year.
    pub points: Vec<ForecastPoint>,
    pub skipped: Vec<SkippedCountry>,
}

/// Clamp a raw prediction into the plausible score range.
pub fn clamp_score(value: f64, min: f64, max: f64) -> f64 {
    value.clamp(min, max)
}

/// Roll one country forward `settings.horizon` years.
///
/// Returns `Err(reason)` when the country cannot be forecast.
pub fn forecast_country(
    series: &CountrySeries,
    model: &ModelResult,
    scaler: &Standardizer,
    settings: &ForecastSettings,
) -> Result<Vec<ForecastPoint>, String> {
    let Some(mut buffer) = RollingBuffer::from_series(series, settings.window) else {
        return Err(format!(
            "{} points < window ({}) for forecasting",
            series.len(),
            settings.window
        ));
    };

    let mut out = Vec::with_capacity(settings.horizon);
    for _ in 0..settings.horizon {
        let row = buffer.feature_row(series.country());
        let raw = model.predict_raw(&row.values(), scaler);
        if !raw.is_finite() {
            return Err(format!("non-finite prediction for {}", row.reference_year));
        }
        let score = clamp_score(raw, settings.clamp_min, settings.clamp_max);
        out.push(ForecastPoint {
            country: series.country().to_string(),
            year: row.reference_year,
            predicted_score: score,
            model_name: model.name().to_string(),
        });
        buffer.push(score);
    }
    Ok(out)
}

/// Forecast every country with the selected model.
pub fn forecast_all(
    series: &[CountrySeries],
    model: &ModelResult,
    scaler: &Standardizer,
    settings: &ForecastSettings,
) -> ForecastOutput {
    let per_country: Vec<(&CountrySeries, Result<Vec<ForecastPoint>, String>)> = series
        .par_iter()
        .map(|s| (s, forecast_country(s, model, scaler, settings)))
        .collect();

    let mut output = ForecastOutput::default();
    for (s, outcome) in per_country {
        match outcome {
            Ok(points) => output.points.extend(points),
            Err(reason) => {
                debug!(country = s.country(), %reason, "country not forecast");
                output.skipped.push(SkippedCountry {
                    country: s.country().to_string(),
                    reason,
                });
            }
        }
    }

    info!(
        model = model.name(),
        points = output.points.len(),
        skipped = output.skipped.len(),
        horizon = settings.horizon,
        "forecast complete"
    );
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelKind, ModelMetrics, ModelSpec, ScorePoint};
    use crate::models::{FittedModel, LinearModel};

    fn series(country: &str, first_year: i32, scores: &[f64]) -> CountrySeries {
        let points = scores
            .iter()
            .enumerate()
            .map(|(i, &score)| ScorePoint {
                country: country.to_string(),
                year: first_year + i as i32,
                score,
                change: None,
            })
            .collect();
        CountrySeries::new(country, points).unwrap()
    }

    /// `prediction = intercept + slope * lag_1` on raw features.
    fn lag_model(intercept: f64, slope: f64, window: usize) -> ModelResult {
        let mut coefficients = vec![0.0; window + 7];
        coefficients[0] = slope;
        ModelResult {
            spec: ModelSpec {
                name: "lag".to_string(),
                kind: ModelKind::Linear,
                requires_standardized_input: false,
            },
            model: FittedModel::Linear(LinearModel {
                intercept,
                coefficients,
            }),
            predictions: vec![],
            metrics: ModelMetrics {
                mse: 0.0,
                rmse: 0.0,
                mae: 0.0,
                r2: 1.0,
                n_test: 0,
            },
            feature_importance: None,
        }
    }

    fn identity_scaler(width: usize) -> Standardizer {
        Standardizer {
            means: vec![0.0; width],
            scales: vec![1.0; width],
        }
    }

    fn settings() -> ForecastSettings {
        ForecastSettings {
            window: 4,
            horizon: 3,
            clamp_min: 40.0,
            clamp_max: 95.0,
        }
    }

    #[test]
    fn rollout_feeds_predictions_back() {
        let s = series("X", 2017, &[60.0, 62.0, 64.0, 66.0, 68.0]);
        let model = lag_model(2.0, 1.0, 4);
        let points = forecast_country(&s, &model, &identity_scaler(11), &settings()).unwrap();

        let years: Vec<i32> = points.iter().map(|p| p.year).collect();
        let scores: Vec<f64> = points.iter().map(|p| p.predicted_score).collect();
        assert_eq!(years, vec![2022, 2023, 2024]);
        assert_eq!(scores, vec![70.0, 72.0, 74.0]);
        assert!(points.iter().all(|p| p.model_name == "lag"));
    }

    #[test]
    fn predictions_are_clamped_before_feedback() {
        let s = series("X", 2017, &[90.0, 92.0, 94.0, 95.0]);
        // Every step overshoots; the clamped value is what feeds the next step.
        let model = lag_model(10.0, 1.0, 4);
        let points = forecast_country(&s, &model, &identity_scaler(11), &settings()).unwrap();
        assert!(points.iter().all(|p| p.predicted_score == 95.0));

        let low = lag_model(-500.0, 0.0, 4);
        let points = forecast_country(&s, &low, &identity_scaler(11), &settings()).unwrap();
        assert!(points.iter().all(|p| p.predicted_score == 40.0));
    }

    #[test]
    fn buffer_slides_and_tracks_changes() {
        let s = series("X", 2000, &[50.0, 51.0, 53.0, 56.0, 60.0]);
        let mut buffer = RollingBuffer::from_series(&s, 4).unwrap();
        assert_eq!(buffer.scores(), vec![51.0, 53.0, 56.0, 60.0]);
        assert_eq!(buffer.changes(), vec![2.0, 3.0, 4.0]);

        buffer.push(58.0);
        assert_eq!(buffer.scores(), vec![53.0, 56.0, 60.0, 58.0]);
        assert_eq!(buffer.changes(), vec![3.0, 4.0, -2.0]);
        assert_eq!(buffer.last_year(), 2005);
    }

    #[test]
    fn exactly_window_points_is_ready_with_short_change_history() {
        let s = series("X", 2000, &[50.0, 52.0, 54.0, 56.0]);
        let buffer = RollingBuffer::from_series(&s, 4).unwrap();
        assert_eq!(buffer.changes(), vec![2.0, 2.0, 2.0]);

        let two = series("Y", 2000, &[50.0, 52.0]);
        let buffer = RollingBuffer::from_series(&two, 2).unwrap();
        // One change: acceleration falls back to zero instead of failing.
        assert_eq!(buffer.feature_row("Y").trend_acceleration, 0.0);
    }

    #[test]
    fn short_history_is_skipped() {
        let data = vec![
            series("long", 2015, &[60.0, 61.0, 62.0, 63.0, 64.0, 65.0]),
            series("short", 2020, &[70.0, 71.0]),
        ];
        let out = forecast_all(&data, &lag_model(1.0, 1.0, 4), &identity_scaler(11), &settings());
        assert_eq!(out.points.len(), 3);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].country, "short");
    }

    #[test]
    fn standardized_models_see_scaled_inputs() {
        let s = series("X", 2017, &[60.0, 62.0, 64.0, 66.0, 68.0]);
        let mut model = lag_model(0.0, 1.0, 4);
        model.spec.requires_standardized_input = true;
        let mut scaler = identity_scaler(11);
        scaler.means[0] = 60.0;
        scaler.scales[0] = 2.0;
        // (68 - 60) / 2 = 4, far below the clamp floor.
        let points = forecast_country(&s, &model, &scaler, &settings()).unwrap();
        assert_eq!(points[0].predicted_score, 40.0);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn forecasts_always_within_clamp(
                scores in prop::collection::vec(0.0f64..100.0, 4..12),
                intercept in -1000.0f64..1000.0,
                slope in -5.0f64..5.0,
            ) {
                let s = series("P", 2000, &scores);
                let model = lag_model(intercept, slope, 4);
                let points = forecast_country(&s, &model, &identity_scaler(11), &settings()).unwrap();
                prop_assert_eq!(points.len(), 3);
                for p in points {
                    prop_assert!((40.0..=95.0).contains(&p.predicted_score));
                }
            }
        }
    }
}
