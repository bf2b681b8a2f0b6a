//! Command-line parsing for the SDG trend forecaster.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    DEFAULT_CLAMP_MAX, DEFAULT_CLAMP_MIN, DEFAULT_CLUSTERS, DEFAULT_CUTOFF_YEAR, DEFAULT_HORIZON,
    DEFAULT_MIN_HISTORY, DEFAULT_SEED, DEFAULT_WINDOW,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sdg", version, about = "SDG score trend analysis and multi-year forecasting")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full pipeline: trends, model comparison, forecasts, recommendations, clusters.
    Forecast(RunArgs),
    /// Train and evaluate the model registry, printing the comparison only.
    Compare(RunArgs),
    /// Build the lagged feature table and stop (pair with `--export-features`).
    Features(RunArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Score table (wide or long CSV). Omit to use a synthetic panel.
    #[arg(short = 'i', long, value_name = "CSV")]
    pub input: Option<PathBuf>,

    /// Countries in the synthetic panel.
    #[arg(long, default_value_t = 60)]
    pub countries: usize,

    /// First year of the synthetic panel.
    #[arg(long, default_value_t = 2000)]
    pub first_year: i32,

    /// Last year of the synthetic panel.
    #[arg(long, default_value_t = 2023)]
    pub last_year: i32,

    /// Seed for synthetic data, random forests and clustering.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Lag window width (number of past scores per example).
    #[arg(short = 'w', long, default_value_t = DEFAULT_WINDOW)]
    pub window: usize,

    /// Years to forecast past each country's last observation.
    #[arg(long, default_value_t = DEFAULT_HORIZON)]
    pub horizon: usize,

    /// Rows targeting years before this train; the rest are held out.
    #[arg(long, default_value_t = DEFAULT_CUTOFF_YEAR)]
    pub cutoff: i32,

    /// Lower bound for forecast scores.
    #[arg(long, default_value_t = DEFAULT_CLAMP_MIN)]
    pub clamp_min: f64,

    /// Upper bound for forecast scores.
    #[arg(long, default_value_t = DEFAULT_CLAMP_MAX)]
    pub clamp_max: f64,

    /// Countries with fewer observations are skipped.
    #[arg(long, default_value_t = DEFAULT_MIN_HISTORY)]
    pub min_history: usize,

    /// Number of trajectory clusters.
    #[arg(long, default_value_t = DEFAULT_CLUSTERS)]
    pub clusters: usize,

    /// Show top-N improvers/decliners and feature importances.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// JSON model registry replacing the built-in one.
    #[arg(long, value_name = "JSON")]
    pub registry: Option<PathBuf>,

    /// Write the registry in effect to JSON (a starting point for `--registry`).
    #[arg(long, value_name = "JSON")]
    pub save_registry: Option<PathBuf>,

    /// Export the feature table to CSV.
    #[arg(long)]
    pub export_features: Option<PathBuf>,

    /// Export forecasts to CSV.
    #[arg(long)]
    pub export_forecasts: Option<PathBuf>,

    /// Export recommendations to CSV.
    #[arg(long)]
    pub export_recommendations: Option<PathBuf>,

    /// Export the model comparison report to JSON.
    #[arg(long)]
    pub export_report: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_defaults() {
        let cli = Cli::parse_from(["sdg", "forecast"]);
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.window, 4);
        assert_eq!(args.horizon, 3);
        assert_eq!(args.cutoff, 2018);
        assert_eq!(args.clamp_min, 40.0);
        assert_eq!(args.clamp_max, 95.0);
        assert!(args.input.is_none());
    }

    #[test]
    fn flags_parse() {
        let cli = Cli::parse_from([
            "sdg", "compare", "-i", "scores.csv", "-w", "3", "--cutoff", "2015", "--registry", "models.json",
        ]);
        let Command::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(args.input, Some(PathBuf::from("scores.csv")));
        assert_eq!(args.window, 3);
        assert_eq!(args.cutoff, 2015);
        assert_eq!(args.registry, Some(PathBuf::from("models.json")));
        assert!(args.save_registry.is_none());
    }

    #[test]
    fn save_registry_flag_parses() {
        let cli = Cli::parse_from(["sdg", "features", "--save-registry", "out.json"]);
        let Command::Features(args) = cli.command else {
            panic!("expected features");
        };
        assert_eq!(args.save_registry, Some(PathBuf::from("out.json")));
    }
}
