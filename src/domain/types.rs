//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between pipeline stages in-memory
//! - exported to CSV/JSON for audit or plotting elsewhere
//! - compared in tests without touching the filesystem

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Lag window width used when none is configured.
pub const DEFAULT_WINDOW: usize = 4;
/// Number of future years forecast per country.
pub const DEFAULT_HORIZON: usize = 3;
/// First reference year that belongs to the held-out split.
pub const DEFAULT_CUTOFF_YEAR: i32 = 2018;
/// Plausible score range; forecasts are clamped into it.
pub const DEFAULT_CLAMP_MIN: f64 = 40.0;
pub const DEFAULT_CLAMP_MAX: f64 = 95.0;
/// Countries with fewer observed years are dropped before feature engineering.
pub const DEFAULT_MIN_HISTORY: usize = 5;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_CLUSTERS: usize = 4;

/// One observed `(country, year)` score in long format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorePoint {
    pub country: String,
    pub year: i32,
    pub score: f64,
    /// Change from the previous observed year; absent for a country's first year.
    pub change: Option<f64>,
}

/// A single country's history, strictly increasing by year.
#[derive(Debug, Clone, PartialEq)]
pub struct CountrySeries {
    country: String,
    points: Vec<ScorePoint>,
}

impl CountrySeries {
    /// Build a series from points already sorted by year.
    ///
    /// Rejects empty input, points for other countries, and non-increasing years.
    pub fn new(country: impl Into<String>, points: Vec<ScorePoint>) -> Result<Self, AppError> {
        let country = country.into();
        if points.is_empty() {
            return Err(AppError::new(3, format!("Country '{country}' has no observations.")));
        }
        for p in &points {
            if p.country != country {
                return Err(AppError::new(
                    3,
                    format!("Point for '{}' found in series for '{country}'.", p.country),
                ));
            }
        }
        for w in points.windows(2) {
            if w[1].year <= w[0].year {
                return Err(AppError::new(
                    3,
                    format!(
                        "Years for '{country}' are not strictly increasing ({} then {}).",
                        w[0].year, w[1].year
                    ),
                ));
            }
        }
        Ok(Self { country, points })
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn points(&self) -> &[ScorePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the series holds no observations.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.score).collect()
    }

    /// Year-over-year changes aligned with `points`.
    ///
    /// A missing change is derived from the previous score when one exists, so
    /// only index 0 can come back as `None`.
    pub fn changes(&self) -> Vec<Option<f64>> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| match p.change {
                Some(c) if c.is_finite() => Some(c),
                _ if i > 0 => Some(p.score - self.points[i - 1].score),
                _ => None,
            })
            .collect()
    }

    pub fn first(&self) -> &ScorePoint {
        &self.points[0]
    }

    pub fn last(&self) -> &ScorePoint {
        &self.points[self.points.len() - 1]
    }
}

/// Group long-format points into per-country series, ordered by country name.
pub fn group_by_country(points: &[ScorePoint]) -> Result<Vec<CountrySeries>, AppError> {
    let mut grouped: BTreeMap<&str, Vec<ScorePoint>> = BTreeMap::new();
    for p in points {
        grouped.entry(p.country.as_str()).or_default().push(p.clone());
    }

    grouped
        .into_iter()
        .map(|(country, mut pts)| {
            pts.sort_by_key(|p| p.year);
            CountrySeries::new(country, pts)
        })
        .collect()
}

/// One supervised-learning example: a lag window and the value that followed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub country: String,
    /// The year being predicted.
    pub reference_year: i32,
    /// Lagged scores, most recent first.
    pub lags: Vec<f64>,
    pub recent_change: f64,
    pub avg_change_2yr: f64,
    pub avg_change_3yr: f64,
    pub trend_slope: f64,
    pub trend_acceleration: f64,
    pub score_volatility: f64,
    pub recent_momentum: f64,
    /// `None` for inference rows built during forecasting.
    pub target_score: Option<f64>,
}

/// Names of the derived (non-lag) columns, in model input order.
pub const DERIVED_FEATURES: [&str; 7] = [
    "recent_change",
    "avg_change_2yr",
    "avg_change_3yr",
    "trend_slope",
    "trend_acceleration",
    "score_volatility",
    "recent_momentum",
];

impl FeatureRow {
    /// Model input vector: lags (most recent first) followed by derived features.
    pub fn values(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.lags.len() + DERIVED_FEATURES.len());
        out.extend_from_slice(&self.lags);
        out.extend_from_slice(&[
            self.recent_change,
            self.avg_change_2yr,
            self.avg_change_3yr,
            self.trend_slope,
            self.trend_acceleration,
            self.score_volatility,
            self.recent_momentum,
        ]);
        out
    }

    /// Column names matching [`FeatureRow::values`] for a window of `window` lags.
    pub fn feature_names(window: usize) -> Vec<String> {
        (1..=window)
            .map(|k| format!("lag_{k}"))
            .chain(DERIVED_FEATURES.iter().map(|s| s.to_string()))
            .collect()
    }

    pub fn is_finite(&self) -> bool {
        self.values().iter().all(|v| v.is_finite())
            && self.target_score.is_none_or(|t| t.is_finite())
    }
}

/// Regressor family plus its hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelKind {
    /// Ordinary least squares with intercept.
    Linear,
    /// L2-penalised least squares; the intercept is not penalised.
    Ridge { alpha: f64 },
    RandomForest {
        n_trees: usize,
        max_depth: usize,
        min_samples_split: usize,
        min_samples_leaf: usize,
        seed: u64,
    },
    GradientBoosting {
        n_estimators: usize,
        learning_rate: f64,
        max_depth: usize,
        min_samples_split: usize,
        min_samples_leaf: usize,
    },
}

impl ModelKind {
    pub fn family(&self) -> &'static str {
        match self {
            ModelKind::Linear => "linear",
            ModelKind::Ridge { .. } => "ridge",
            ModelKind::RandomForest { .. } => "random_forest",
            ModelKind::GradientBoosting { .. } => "gradient_boosting",
        }
    }

    /// Tree ensembles expose impurity-based feature importances.
    pub fn has_feature_importance(&self) -> bool {
        matches!(self, ModelKind::RandomForest { .. } | ModelKind::GradientBoosting { .. })
    }
}

/// One entry of the model registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub kind: ModelKind,
    /// Whether the model is fit on (and predicts from) standardized features.
    pub requires_standardized_input: bool,
}

/// Built-in registry, in canonical (tie-breaking) order.
pub fn default_registry(seed: u64) -> Vec<ModelSpec> {
    vec![
        ModelSpec {
            name: "Linear Regression".to_string(),
            kind: ModelKind::Linear,
            requires_standardized_input: true,
        },
        ModelSpec {
            name: "Ridge Regression".to_string(),
            kind: ModelKind::Ridge { alpha: 1.0 },
            requires_standardized_input: true,
        },
        ModelSpec {
            name: "Random Forest".to_string(),
            kind: ModelKind::RandomForest {
                n_trees: 100,
                max_depth: 10,
                min_samples_split: 2,
                min_samples_leaf: 1,
                seed,
            },
            requires_standardized_input: false,
        },
        ModelSpec {
            name: "Gradient Boosting".to_string(),
            kind: ModelKind::GradientBoosting {
                n_estimators: 100,
                learning_rate: 0.1,
                max_depth: 3,
                min_samples_split: 2,
                min_samples_leaf: 1,
            },
            requires_standardized_input: false,
        },
    ]
}

/// Held-out evaluation metrics for one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    pub n_test: usize,
}

/// Relative contribution of one input column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// A predicted score for a year beyond the observed range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub country: String,
    pub year: i32,
    pub predicted_score: f64,
    pub model_name: String,
}

/// Score tier of the latest observed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    High,
    Emerging,
    Developing,
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Tier::High => "high",
            Tier::Emerging => "emerging",
            Tier::Developing => "developing",
        }
    }
}

/// Direction of the forecast relative to the latest observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trajectory {
    Improving,
    Stable,
    Declining,
}

impl Trajectory {
    pub fn label(self) -> &'static str {
        match self {
            Trajectory::Improving => "improving",
            Trajectory::Stable => "stable",
            Trajectory::Declining => "declining",
        }
    }
}

/// Suggested collaboration role derived from tier and trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaborationRole {
    Leader,
    RisingPerformer,
    SteadyPartner,
    NeedsSupport,
}

impl CollaborationRole {
    pub fn label(self) -> &'static str {
        match self {
            CollaborationRole::Leader => "leader",
            CollaborationRole::RisingPerformer => "rising_performer",
            CollaborationRole::SteadyPartner => "steady_partner",
            CollaborationRole::NeedsSupport => "needs_support",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub country: String,
    pub latest_year: i32,
    pub latest_score: f64,
    pub forecast_year: i32,
    pub forecast_score: f64,
    pub delta: f64,
    pub tier: Tier,
    pub trajectory: Trajectory,
    pub role: CollaborationRole,
}

/// Summary stats about the observations actually loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStats {
    pub n_points: usize,
    pub n_countries: usize,
    pub year_min: i32,
    pub year_max: i32,
    pub score_min: f64,
    pub score_max: f64,
}

impl DatasetStats {
    pub fn from_points(points: &[ScorePoint]) -> Option<Self> {
        let mut year_min = i32::MAX;
        let mut year_max = i32::MIN;
        let mut score_min = f64::INFINITY;
        let mut score_max = f64::NEG_INFINITY;
        let mut countries = std::collections::BTreeSet::new();

        for p in points {
            year_min = year_min.min(p.year);
            year_max = year_max.max(p.year);
            score_min = score_min.min(p.score);
            score_max = score_max.max(p.score);
            countries.insert(p.country.as_str());
        }

        if points.is_empty() || !score_min.is_finite() || !score_max.is_finite() {
            return None;
        }

        Some(Self {
            n_points: points.len(),
            n_countries: countries.len(),
            year_min,
            year_max,
            score_min,
            score_max,
        })
    }
}

/// A country left out of some stage, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedCountry {
    pub country: String,
    pub reason: String,
}

/// A registry entry that could not be fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedModel {
    pub name: String,
    pub reason: String,
}

/// Soft failures collected over a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub skipped_countries: Vec<SkippedCountry>,
    pub failed_models: Vec<FailedModel>,
    /// Feature rows discarded because a feature or target was non-finite.
    pub dropped_rows: usize,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// CSV input; `None` means generate a synthetic panel.
    pub input: Option<PathBuf>,
    pub synthetic_countries: usize,
    pub synthetic_first_year: i32,
    pub synthetic_last_year: i32,
    pub seed: u64,

    pub window: usize,
    pub horizon: usize,
    pub cutoff_year: i32,
    pub clamp_min: f64,
    pub clamp_max: f64,
    pub min_history: usize,

    pub registry: Vec<ModelSpec>,

    pub clusters: usize,
    pub top_n: usize,

    pub export_features: Option<PathBuf>,
    pub export_forecasts: Option<PathBuf>,
    pub export_recommendations: Option<PathBuf>,
    pub export_report: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: None,
            synthetic_countries: 60,
            synthetic_first_year: 2000,
            synthetic_last_year: 2023,
            seed: DEFAULT_SEED,
            window: DEFAULT_WINDOW,
            horizon: DEFAULT_HORIZON,
            cutoff_year: DEFAULT_CUTOFF_YEAR,
            clamp_min: DEFAULT_CLAMP_MIN,
            clamp_max: DEFAULT_CLAMP_MAX,
            min_history: DEFAULT_MIN_HISTORY,
            registry: default_registry(DEFAULT_SEED),
            clusters: DEFAULT_CLUSTERS,
            top_n: 10,
            export_features: None,
            export_forecasts: None,
            export_recommendations: None,
            export_report: None,
        }
    }
}

impl PipelineConfig {
    /// Check settings that do not depend on the data.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.window < 2 {
            return Err(AppError::new(
                2,
                format!("Invalid window width {} (must be >= 2).", self.window),
            ));
        }
        if self.horizon < 1 {
            return Err(AppError::new(2, "Forecast horizon must be >= 1."));
        }
        if !(self.clamp_min.is_finite() && self.clamp_max.is_finite() && self.clamp_min < self.clamp_max) {
            return Err(AppError::new(
                2,
                format!(
                    "Invalid clamp bounds [{}, {}] (must be finite with min < max).",
                    self.clamp_min, self.clamp_max
                ),
            ));
        }
        if self.registry.is_empty() {
            return Err(AppError::new(2, "Model registry is empty."));
        }
        if self.input.is_none() && self.synthetic_last_year <= self.synthetic_first_year {
            return Err(AppError::new(2, "Synthetic year range must span at least two years."));
        }
        Ok(())
    }

    /// The cutoff must fall within the observed year range.
    pub fn validate_cutoff(&self, year_min: i32, year_max: i32) -> Result<(), AppError> {
        if self.cutoff_year < year_min || self.cutoff_year > year_max {
            return Err(AppError::new(
                2,
                format!(
                    "Cutoff year {} is outside the observed range {year_min}..={year_max}.",
                    self.cutoff_year
                ),
            ));
        }
        Ok(())
    }

    /// Minimum points a country needs to contribute any feature row.
    pub fn effective_min_history(&self) -> usize {
        self.min_history.max(self.window + 1)
    }
}
