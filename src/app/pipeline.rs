//! Shared pipeline logic used by every subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> group -> min-history filter -> feature table -> train/select ->
//! forecast -> recommend, with trend summaries and clusters alongside.
//!
//! Nothing here prints; the caller decides what to render.

use tracing::info;

use crate::analysis::{Clustering, CountryTrend, TrendRankings, cluster_trajectories, rank_improvers, summarize_trends};
use crate::data::generate_panel;
use crate::domain::{
    CountrySeries, DatasetStats, ForecastPoint, PipelineConfig, Recommendation, RunSummary, ScorePoint,
    SkippedCountry, group_by_country,
};
use crate::error::AppError;
use crate::features::{Dataset, assemble_dataset};
use crate::fit::{ModelSelection, train_and_select};
use crate::forecast::{ForecastSettings, forecast_all};
use crate::io::load_score_points;
use crate::report::recommend;

/// Loaded, filtered and windowed data; everything up to (not including) training.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub stats: DatasetStats,
    /// Every country in the input.
    pub all_series: Vec<CountrySeries>,
    /// Countries with enough history to model.
    pub series: Vec<CountrySeries>,
    pub dataset: Dataset,
    pub summary: RunSummary,
}

/// All computed outputs of a full run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stats: DatasetStats,
    pub series: Vec<CountrySeries>,
    pub dataset: Dataset,
    pub selection: ModelSelection,
    pub forecasts: Vec<ForecastPoint>,
    pub recommendations: Vec<Recommendation>,
    pub trends: Vec<CountryTrend>,
    pub rankings: TrendRankings,
    pub clustering: Clustering,
    pub summary: RunSummary,
}

/// Read the configured CSV or generate the synthetic panel.
pub fn load_points(config: &PipelineConfig) -> Result<Vec<ScorePoint>, AppError> {
    match &config.input {
        Some(path) => Ok(load_score_points(path)?.points),
        None => {
            let panel = generate_panel(
                config.synthetic_countries,
                config.synthetic_first_year,
                config.synthetic_last_year,
                config.seed,
            )?;
            info!(
                countries = panel.stats.n_countries,
                points = panel.stats.n_points,
                seed = config.seed,
                "generated synthetic panel"
            );
            Ok(panel.points)
        }
    }
}

/// Validate, load and build the feature table.
pub fn run_features(config: &PipelineConfig) -> Result<PreparedData, AppError> {
    config.validate()?;
    let points = load_points(config)?;
    prepare(config, &points)
}

/// Everything up to training, from already-loaded points.
pub fn prepare(config: &PipelineConfig, points: &[ScorePoint]) -> Result<PreparedData, AppError> {
    config.validate()?;

    let stats = DatasetStats::from_points(points)
        .ok_or_else(|| AppError::new(3, "No score observations to work with."))?;
    config.validate_cutoff(stats.year_min, stats.year_max)?;

    let all_series = group_by_country(points)?;
    let (series, mut skipped) = filter_min_history(&all_series, config.effective_min_history());
    info!(
        countries = all_series.len(),
        eligible = series.len(),
        min_history = config.effective_min_history(),
        "filtered countries by history length"
    );

    let dataset = assemble_dataset(&series, config.window, config.cutoff_year);
    merge_skipped(&mut skipped, &dataset.skipped);

    let summary = RunSummary {
        skipped_countries: skipped,
        failed_models: Vec::new(),
        dropped_rows: dataset.dropped_rows,
    };

    Ok(PreparedData {
        stats,
        all_series,
        series,
        dataset,
        summary,
    })
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunOutput, AppError> {
    config.validate()?;
    let points = load_points(config)?;
    run_pipeline_with_points(config, &points)
}

/// Execute the full pipeline on already-loaded points.
pub fn run_pipeline_with_points(config: &PipelineConfig, points: &[ScorePoint]) -> Result<RunOutput, AppError> {
    let PreparedData {
        stats,
        all_series,
        series,
        dataset,
        mut summary,
    } = prepare(config, points)?;

    let selection = train_and_select(&dataset, &config.registry)?;
    summary.failed_models = selection.failed.clone();

    let settings = ForecastSettings::from_config(config);
    let forecast = forecast_all(&series, selection.best(), &selection.scaler, &settings);
    merge_skipped(&mut summary.skipped_countries, &forecast.skipped);

    let recommendations = recommend(&series, &forecast.points);

    let trends = summarize_trends(&all_series);
    let rankings = rank_improvers(&trends, config.top_n);
    let clustering = cluster_trajectories(&all_series, config.clusters, config.seed)?;

    info!(
        best = selection.best().name(),
        forecasts = forecast.points.len(),
        recommendations = recommendations.len(),
        skipped = summary.skipped_countries.len(),
        failed_models = summary.failed_models.len(),
        "pipeline complete"
    );

    Ok(RunOutput {
        stats,
        series,
        dataset,
        selection,
        forecasts: forecast.points,
        recommendations,
        trends,
        rankings,
        clustering,
        summary,
    })
}

/// Split off countries with fewer than `min_points` observations.
pub fn filter_min_history(series: &[CountrySeries], min_points: usize) -> (Vec<CountrySeries>, Vec<SkippedCountry>) {
    let mut kept = Vec::with_capacity(series.len());
    let mut skipped = Vec::new();
    for s in series {
        if s.len() >= min_points {
            kept.push(s.clone());
        } else {
            skipped.push(SkippedCountry {
                country: s.country().to_string(),
                reason: format!("{} points < minimum history ({min_points})", s.len()),
            });
        }
    }
    (kept, skipped)
}

/// Append skips for countries not already listed; the first reason wins.
fn merge_skipped(into: &mut Vec<SkippedCountry>, more: &[SkippedCountry]) {
    for s in more {
        if !into.iter().any(|e| e.country == s.country) {
            into.push(s.clone());
        }
    }
}
