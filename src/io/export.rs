//! Export pipeline outputs.
//!
//! Tables go to CSV (easy to consume in spreadsheets or downstream scripts);
//! the model comparison report goes to JSON.

use std::fs::File;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::{
    FailedModel, FeatureImportance, ForecastPoint, ModelKind, ModelMetrics, Recommendation, RunSummary,
    SkippedCountry,
};
use crate::error::AppError;
use crate::features::Dataset;
use crate::fit::ModelSelection;

/// Write the assembled feature table: one row per example, train rows first.
pub fn write_features_csv(path: &Path, dataset: &Dataset) -> Result<(), AppError> {
    let mut writer = csv_writer(path)?;

    let mut header = vec!["country".to_string(), "reference_year".to_string(), "split".to_string()];
    header.extend(dataset.feature_names.iter().cloned());
    header.push("target_score".to_string());
    writer.write_record(&header).map_err(write_err)?;

    let splits = [("train", &dataset.train), ("test", &dataset.test)];
    for (split, rows) in splits {
        for row in rows.iter() {
            let mut record = vec![row.country.clone(), row.reference_year.to_string(), split.to_string()];
            record.extend(row.values().iter().map(|v| format!("{v:.6}")));
            record.push(row.target_score.map(|t| format!("{t:.6}")).unwrap_or_default());
            writer.write_record(&record).map_err(write_err)?;
        }
    }

    writer.flush().map_err(|e| AppError::new(2, format!("Failed to flush CSV: {e}")))
}

pub fn write_forecasts_csv(path: &Path, forecasts: &[ForecastPoint]) -> Result<(), AppError> {
    write_rows_csv(path, forecasts)
}

pub fn write_recommendations_csv(path: &Path, recommendations: &[Recommendation]) -> Result<(), AppError> {
    write_rows_csv(path, recommendations)
}

/// JSON model comparison report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub tool: String,
    /// RFC 3339, UTC.
    pub generated_at: String,
    pub window: usize,
    pub cutoff_year: i32,
    pub best_model: String,
    pub models: Vec<ModelReportEntry>,
    pub failed_models: Vec<FailedModel>,
    pub skipped_countries: Vec<SkippedCountry>,
    pub dropped_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReportEntry {
    pub name: String,
    pub kind: ModelKind,
    pub requires_standardized_input: bool,
    pub metrics: ModelMetrics,
    pub feature_importance: Option<Vec<FeatureImportance>>,
}

pub fn build_model_report(selection: &ModelSelection, dataset: &Dataset, summary: &RunSummary) -> ModelReport {
    ModelReport {
        tool: "sdg".to_string(),
        generated_at: Utc::now().to_rfc3339(),
        window: dataset.window,
        cutoff_year: dataset.cutoff_year,
        best_model: selection.best().name().to_string(),
        models: selection
            .results
            .iter()
            .map(|r| ModelReportEntry {
                name: r.spec.name.clone(),
                kind: r.spec.kind.clone(),
                requires_standardized_input: r.spec.requires_standardized_input,
                metrics: r.metrics,
                feature_importance: r.feature_importance.clone(),
            })
            .collect(),
        failed_models: summary.failed_models.clone(),
        skipped_countries: summary.skipped_countries.clone(),
        dropped_rows: summary.dropped_rows,
    }
}

pub fn write_model_report_json(path: &Path, report: &ModelReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))
}

pub fn read_model_report_json(path: &Path) -> Result<ModelReport, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open report JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid report JSON: {e}")))
}

fn write_rows_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), AppError> {
    let mut writer = csv_writer(path)?;
    for row in rows {
        writer.serialize(row).map_err(write_err)?;
    }
    writer.flush().map_err(|e| AppError::new(2, format!("Failed to flush CSV: {e}")))
}

fn csv_writer(path: &Path) -> Result<csv::Writer<File>, AppError> {
    csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))
}

fn write_err(e: csv::Error) -> AppError {
    AppError::new(2, format!("Failed to write export CSV row: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CollaborationRole, Tier, Trajectory};

    #[test]
    fn forecasts_csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecasts.csv");
        let rows = vec![ForecastPoint {
            country: "Chile".to_string(),
            year: 2024,
            predicted_score: 77.5,
            model_name: "Ridge Regression".to_string(),
        }];
        write_forecasts_csv(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("country,year,predicted_score,model_name"));
        assert_eq!(lines.next(), Some("Chile,2024,77.5,Ridge Regression"));
    }

    #[test]
    fn recommendation_enums_are_snake_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recs.csv");
        let rows = vec![Recommendation {
            country: "Peru".to_string(),
            latest_year: 2023,
            latest_score: 71.0,
            forecast_year: 2026,
            forecast_score: 73.0,
            delta: 2.0,
            tier: Tier::Emerging,
            trajectory: Trajectory::Improving,
            role: CollaborationRole::RisingPerformer,
        }];
        write_recommendations_csv(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("emerging,improving,rising_performer"));
    }

    #[test]
    fn unwritable_path_is_exit_2() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let err = write_forecasts_csv(&path, &[]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
