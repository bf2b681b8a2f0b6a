//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and starts logging
//! - parses CLI arguments
//! - runs the pipeline (or the part a subcommand needs)
//! - prints reports
//! - writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Command, RunArgs};
use crate::domain::{PipelineConfig, default_registry};
use crate::error::AppError;
use crate::io::{
    build_model_report, read_registry_json, write_features_csv, write_forecasts_csv, write_model_report_json,
    write_recommendations_csv, write_registry_json,
};

pub mod pipeline;

/// Entry point for the `sdg` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is fine.
    dotenvy::dotenv().ok();
    crate::logging::init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Forecast(args) => handle_run(&args, OutputMode::Full),
        Command::Compare(args) => handle_run(&args, OutputMode::CompareOnly),
        Command::Features(args) => handle_features(&args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    CompareOnly,
}

fn handle_run(args: &RunArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = config_from_args(args)?;
    save_registry(args, &config)?;
    let run = pipeline::run_pipeline(&config)?;

    match mode {
        OutputMode::Full => {
            println!(
                "{}",
                crate::report::format_run_summary(&run.stats, &run.dataset, &run.summary, &config)
            );
            println!("{}", crate::report::format_trend_rankings(&run.rankings));
            println!("{}", crate::report::format_model_comparison(&run.selection, config.top_n));
            println!("{}", crate::report::format_forecasts(&run.forecasts));
            println!("{}", crate::report::format_recommendations(&run.recommendations));
            println!("{}", crate::report::format_clusters(&run.clustering));
        }
        OutputMode::CompareOnly => {
            println!("{}", crate::report::format_model_comparison(&run.selection, config.top_n));
        }
    }

    // Optional exports.
    if let Some(path) = &config.export_features {
        write_features_csv(path, &run.dataset)?;
        info!(path = %path.display(), "wrote feature table");
    }
    if let Some(path) = &config.export_forecasts {
        write_forecasts_csv(path, &run.forecasts)?;
        info!(path = %path.display(), "wrote forecasts");
    }
    if let Some(path) = &config.export_recommendations {
        write_recommendations_csv(path, &run.recommendations)?;
        info!(path = %path.display(), "wrote recommendations");
    }
    if let Some(path) = &config.export_report {
        let report = build_model_report(&run.selection, &run.dataset, &run.summary);
        write_model_report_json(path, &report)?;
        info!(path = %path.display(), "wrote model report");
    }

    Ok(())
}

fn handle_features(args: &RunArgs) -> Result<(), AppError> {
    let config = config_from_args(args)?;
    save_registry(args, &config)?;
    let prepared = pipeline::run_features(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&prepared.stats, &prepared.dataset, &prepared.summary, &config)
    );
    println!("{}", crate::report::format_feature_summary(&prepared.dataset, config.top_n));

    if let Some(path) = &config.export_features {
        write_features_csv(path, &prepared.dataset)?;
        info!(path = %path.display(), "wrote feature table");
    }
    Ok(())
}

/// Write the effective registry when `--save-registry` is given.
fn save_registry(args: &RunArgs, config: &PipelineConfig) -> Result<(), AppError> {
    if let Some(path) = &args.save_registry {
        write_registry_json(path, &config.registry)?;
        info!(path = %path.display(), models = config.registry.len(), "wrote model registry");
    }
    Ok(())
}

/// Map CLI flags onto a pipeline config, loading the registry file if given.
pub fn config_from_args(args: &RunArgs) -> Result<PipelineConfig, AppError> {
    let registry = match &args.registry {
        Some(path) => read_registry_json(path)?,
        None => default_registry(args.seed),
    };

    Ok(PipelineConfig {
        input: args.input.clone(),
        synthetic_countries: args.countries,
        synthetic_first_year: args.first_year,
        synthetic_last_year: args.last_year,
        seed: args.seed,
        window: args.window,
        horizon: args.horizon,
        cutoff_year: args.cutoff,
        clamp_min: args.clamp_min,
        clamp_max: args.clamp_max,
        min_history: args.min_history,
        registry,
        clusters: args.clusters,
        top_n: args.top,
        export_features: args.export_features.clone(),
        export_forecasts: args.export_forecasts.clone(),
        export_recommendations: args.export_recommendations.clone(),
        export_report: args.export_report.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flags_give_default_config() {
        let cli = Cli::parse_from(["sdg", "forecast"]);
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        let config = config_from_args(&args).unwrap();
        let defaults = PipelineConfig::default();
        assert_eq!(config.window, defaults.window);
        assert_eq!(config.horizon, defaults.horizon);
        assert_eq!(config.cutoff_year, defaults.cutoff_year);
        assert_eq!(config.registry, defaults.registry);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_registry_file_is_exit_2() {
        let cli = Cli::parse_from(["sdg", "compare", "--registry", "/nonexistent/registry.json"]);
        let Command::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(config_from_args(&args).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn saved_registry_loads_back_through_the_registry_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        let path_arg = path.to_str().unwrap();

        let cli = Cli::parse_from(["sdg", "features", "--seed", "9", "--save-registry", path_arg]);
        let Command::Features(args) = cli.command else {
            panic!("expected features");
        };
        let config = config_from_args(&args).unwrap();
        save_registry(&args, &config).unwrap();

        let cli = Cli::parse_from(["sdg", "compare", "--registry", path_arg]);
        let Command::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(config_from_args(&args).unwrap().registry, default_registry(9));
    }
}
