//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline stays free of console side effects and testable
//! - output changes are localized
//!
//! Every function here returns a `String`; only `app` prints.

use crate::analysis::{Clustering, TrendRankings};
use crate::domain::{DatasetStats, ForecastPoint, PipelineConfig, Recommendation, RunSummary};
use crate::features::Dataset;
use crate::fit::ModelSelection;

/// Dataset stats, split sizes and soft failures.
pub fn format_run_summary(
    stats: &DatasetStats,
    dataset: &Dataset,
    summary: &RunSummary,
    config: &PipelineConfig,
) -> String {
    let mut out = String::new();

    out.push_str("=== sdg - SDG score trends and forecasts ===\n");
    match &config.input {
        Some(path) => out.push_str(&format!("Input: {}\n", path.display())),
        None => out.push_str(&format!(
            "Input: synthetic panel (countries={}, years={}..={}, seed={})\n",
            config.synthetic_countries, config.synthetic_first_year, config.synthetic_last_year, config.seed
        )),
    }
    out.push_str(&format!(
        "Points: n={} | countries={} | years=[{}, {}] | score=[{:.2}, {:.2}]\n",
        stats.n_points, stats.n_countries, stats.year_min, stats.year_max, stats.score_min, stats.score_max
    ));
    out.push_str(&format!(
        "Window={} | horizon={} | cutoff={} | clamp=[{:.1}, {:.1}]\n",
        config.window, config.horizon, config.cutoff_year, config.clamp_min, config.clamp_max
    ));
    out.push_str(&format!(
        "Feature rows: train={} | test={} | dropped={}\n",
        dataset.train.len(),
        dataset.test.len(),
        summary.dropped_rows
    ));

    if !summary.skipped_countries.is_empty() {
        out.push_str(&format!("\nSkipped countries ({}):\n", summary.skipped_countries.len()));
        for s in &summary.skipped_countries {
            out.push_str(&format!("  {:<24} {}\n", truncate(&s.country, 24), s.reason));
        }
    }
    if !summary.failed_models.is_empty() {
        out.push_str(&format!("\nFailed models ({}):\n", summary.failed_models.len()));
        for f in &summary.failed_models {
            out.push_str(&format!("  {:<24} {}\n", truncate(&f.name, 24), f.reason));
        }
    }

    out
}

/// Metrics table with the selected model starred, then its top importances.
pub fn format_model_comparison(selection: &ModelSelection, top_n: usize) -> String {
    let mut out = String::new();

    out.push_str("Model comparison (held-out):\n");
    push_line(
        &mut out,
        format!("  {:<24} {:>10} {:>10} {:>10} {:>8}", "model", "rmse", "mae", "r2", "n_test"),
    );
    push_line(&mut out, format!("  {:-<24} {:-<10} {:-<10} {:-<10} {:-<8}", "", "", "", "", ""));
    for (i, r) in selection.results.iter().enumerate() {
        let chosen = if i == selection.best_index { "*" } else { " " };
        push_line(
            &mut out,
            format!(
                "{chosen} {:<24} {:>10.4} {:>10.4} {:>10.4} {:>8}",
                truncate(r.name(), 24),
                r.metrics.rmse,
                r.metrics.mae,
                r.metrics.r2,
                r.metrics.n_test
            ),
        );
    }
    for f in &selection.failed {
        out.push_str(&format!("  (failed {}) {}\n", f.name, f.reason));
    }

    let best = selection.best();
    out.push_str(&format!(
        "\nBest model: {} ({}, standardized input: {})\n",
        best.name(),
        best.spec.kind.family(),
        best.requires_standardized_input()
    ));

    for r in &selection.results {
        let Some(importances) = &r.feature_importance else {
            continue;
        };
        out.push_str(&format!("\nTop features ({}):\n", r.name()));
        for fi in importances.iter().take(top_n) {
            out.push_str(&format!("  {:<24} {:.4}\n", fi.feature, fi.importance));
        }
    }

    out
}

pub fn format_forecasts(forecasts: &[ForecastPoint]) -> String {
    let mut out = String::new();
    out.push_str("Forecasts:\n");
    push_line(&mut out, format!("{:<24} {:>6} {:>10} {:<24}", "country", "year", "score", "model"));
    push_line(&mut out, format!("{:-<24} {:-<6} {:-<10} {:-<24}", "", "", "", ""));
    for f in forecasts {
        push_line(
            &mut out,
            format!(
                "{:<24} {:>6} {:>10.2} {:<24}",
                truncate(&f.country, 24),
                f.year,
                f.predicted_score,
                truncate(&f.model_name, 24)
            ),
        );
    }
    out
}

pub fn format_recommendations(recommendations: &[Recommendation]) -> String {
    let mut out = String::new();
    out.push_str("Recommendations:\n");
    push_line(
        &mut out,
        format!(
            "{:<24} {:>8} {:>8} {:>8} {:<10} {:<10} {:<16}",
            "country", "latest", "forecast", "delta", "tier", "trajectory", "role"
        ),
    );
    push_line(
        &mut out,
        format!("{:-<24} {:-<8} {:-<8} {:-<8} {:-<10} {:-<10} {:-<16}", "", "", "", "", "", "", ""),
    );
    for r in recommendations {
        push_line(
            &mut out,
            format!(
                "{:<24} {:>8.2} {:>8.2} {:>+8.2} {:<10} {:<10} {:<16}",
                truncate(&r.country, 24),
                r.latest_score,
                r.forecast_score,
                r.delta,
                r.tier.label(),
                r.trajectory.label(),
                r.role.label()
            ),
        );
    }
    out
}

pub fn format_trend_rankings(rankings: &TrendRankings) -> String {
    let mut out = String::new();

    out.push_str("Top improvers (total change):\n");
    out.push_str(&trend_table(&rankings.improvers));
    out.push('\n');

    out.push_str("Top decliners (total change):\n");
    out.push_str(&trend_table(&rankings.decliners));

    out
}

fn trend_table(rows: &[crate::analysis::CountryTrend]) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!("{:<24} {:>11} {:>8} {:>8} {:>8} {:>8}", "country", "years", "first", "last", "change", "per_yr"),
    );
    push_line(&mut out, format!("{:-<24} {:-<11} {:-<8} {:-<8} {:-<8} {:-<8}", "", "", "", "", "", ""));
    for t in rows {
        push_line(
            &mut out,
            format!(
                "{:<24} {:>11} {:>8.2} {:>8.2} {:>+8.2} {:>+8.2}",
                truncate(&t.country, 24),
                format!("{}-{}", t.first_year, t.last_year),
                t.first_score,
                t.last_score,
                t.total_change,
                t.mean_annual_change
            ),
        );
    }
    out
}

pub fn format_clusters(clustering: &Clustering) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Trajectory clusters (k={}, iterations={}):\n",
        clustering.k, clustering.iterations
    ));
    for c in &clustering.clusters {
        let members: Vec<&str> = clustering
            .assignments
            .iter()
            .filter(|a| a.cluster == c.id)
            .map(|a| a.country.as_str())
            .collect();
        out.push_str(&format!(
            "  #{} n={:<4} centroid={} members: {}\n",
            c.id,
            c.size,
            fmt_vec(&[c.centroid.latest_score, c.centroid.recent_change, c.centroid.recent_volatility]),
            members.join(", ")
        ));
    }
    out
}

/// Short description of an assembled feature table.
pub fn format_feature_summary(dataset: &Dataset, preview: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Feature table: rows={} (train={}, test={}) | columns={}\n",
        dataset.len(),
        dataset.train.len(),
        dataset.test.len(),
        dataset.feature_names.len()
    ));
    out.push_str(&format!("Columns: {}\n", dataset.feature_names.join(", ")));
    for row in dataset.rows().take(preview) {
        out.push_str(&format!(
            "  {:<24} {} target={} x={}\n",
            truncate(&row.country, 24),
            row.reference_year,
            row.target_score.map(|t| format!("{t:.2}")).unwrap_or_else(|| "-".to_string()),
            fmt_vec(&row.values())
        ));
    }
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.3}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
