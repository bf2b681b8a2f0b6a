//! Training and held-out evaluation of the model registry.
//!
//! Given an assembled [`Dataset`], we:
//! - fit a standardizer on the training rows only
//! - fit every registry entry on either standardized or raw features, per
//!   its `requires_standardized_input` flag (in parallel; entries share no
//!   mutable state)
//! - predict the test rows and compute MSE / RMSE / MAE / R²
//! - rank feature importances for the tree ensembles
//!
//! A model that fails to fit (or predicts non-finite values) is recorded as a
//! [`FailedModel`] and the remaining entries carry on.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::{FailedModel, FeatureImportance, ModelMetrics, ModelSpec};
use crate::error::AppError;
use crate::features::{Dataset, Standardizer, feature_matrix, targets};
use crate::fit::metrics::evaluate;
use crate::models::FittedModel;

/// Train/test matrices in both raw and standardized form.
#[derive(Debug, Clone)]
pub struct ModelInputs {
    pub feature_names: Vec<String>,
    pub scaler: Standardizer,
    pub train_raw: Vec<Vec<f64>>,
    pub train_std: Vec<Vec<f64>>,
    pub y_train: Vec<f64>,
    pub test_raw: Vec<Vec<f64>>,
    pub test_std: Vec<Vec<f64>>,
    pub y_test: Vec<f64>,
}

impl ModelInputs {
    /// Build inputs from a split dataset. Both splits must be non-empty.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self, AppError> {
        if dataset.train.is_empty() {
            return Err(AppError::new(
                3,
                format!("No training rows before cutoff year {}.", dataset.cutoff_year),
            ));
        }
        if dataset.test.is_empty() {
            return Err(AppError::new(
                3,
                format!("No held-out rows at or after cutoff year {}.", dataset.cutoff_year),
            ));
        }

        let train_raw = feature_matrix(&dataset.train);
        let test_raw = feature_matrix(&dataset.test);
        let scaler = Standardizer::fit(&train_raw)?;
        let train_std = scaler.transform_all(&train_raw);
        let test_std = scaler.transform_all(&test_raw);

        Ok(Self {
            feature_names: dataset.feature_names.clone(),
            scaler,
            train_raw,
            train_std,
            y_train: targets(&dataset.train),
            test_raw,
            test_std,
            y_test: targets(&dataset.test),
        })
    }
}

/// A fitted and evaluated registry entry.
#[derive(Debug, Clone)]
pub struct ModelResult {
    pub spec: ModelSpec,
    pub model: FittedModel,
    /// Predictions for the test rows, in dataset order.
    pub predictions: Vec<f64>,
    pub metrics: ModelMetrics,
    /// Sorted descending; `None` for models without importances.
    pub feature_importance: Option<Vec<FeatureImportance>>,
}

impl ModelResult {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn requires_standardized_input(&self) -> bool {
        self.spec.requires_standardized_input
    }

    /// Predict one raw feature row, standardizing first when the model needs it.
    pub fn predict_raw(&self, raw: &[f64], scaler: &Standardizer) -> f64 {
        if self.spec.requires_standardized_input {
            self.model.predict(&scaler.transform(raw))
        } else {
            self.model.predict(raw)
        }
    }
}

/// Fit and evaluate one registry entry.
pub fn train_model(spec: &ModelSpec, inputs: &ModelInputs) -> Result<ModelResult, AppError> {
    let (x_train, x_test) = if spec.requires_standardized_input {
        (&inputs.train_std, &inputs.test_std)
    } else {
        (&inputs.train_raw, &inputs.test_raw)
    };

    let model = FittedModel::fit(&spec.kind, x_train, &inputs.y_train)?;
    let predictions = model.predict_all(x_test);
    if predictions.iter().any(|p| !p.is_finite()) {
        return Err(AppError::new(4, "Model produced non-finite predictions."));
    }

    let metrics = evaluate(&inputs.y_test, &predictions);
    if !metrics.r2.is_finite() {
        return Err(AppError::new(4, "Held-out R² is not finite."));
    }

    let feature_importance = model
        .feature_importances()
        .map(|values| rank_importances(&inputs.feature_names, &values));

    Ok(ModelResult {
        spec: spec.clone(),
        model,
        predictions,
        metrics,
        feature_importance,
    })
}

/// Fit every registry entry; failures are collected rather than propagated.
///
/// Results keep registry order.
pub fn train_registry(registry: &[ModelSpec], inputs: &ModelInputs) -> (Vec<ModelResult>, Vec<FailedModel>) {
    let outcomes: Vec<(&ModelSpec, Result<ModelResult, AppError>)> = registry
        .par_iter()
        .map(|spec| (spec, train_model(spec, inputs)))
        .collect();

    let mut results = Vec::new();
    let mut failed = Vec::new();
    for (spec, outcome) in outcomes {
        match outcome {
            Ok(result) => {
                info!(
                    model = %spec.name,
                    rmse = result.metrics.rmse,
                    mae = result.metrics.mae,
                    r2 = result.metrics.r2,
                    "model evaluated"
                );
                results.push(result);
            }
            Err(e) => {
                warn!(model = %spec.name, error = %e, "model failed to fit");
                failed.push(FailedModel {
                    name: spec.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    (results, failed)
}

/// Pair importances with feature names, sorted descending.
///
/// The sort is stable, so equal importances keep column order.
pub fn rank_importances(names: &[String], values: &[f64]) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = names
        .iter()
        .zip(values.iter())
        .map(|(feature, &importance)| FeatureImportance {
            feature: feature.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;

    fn inputs() -> ModelInputs {
        let train_raw: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, 1.0]).collect();
        let test_raw: Vec<Vec<f64>> = (20..25).map(|i| vec![i as f64, 1.0]).collect();
        let y_train = train_raw.iter().map(|r| 50.0 + r[0]).collect();
        let y_test = test_raw.iter().map(|r| 50.0 + r[0]).collect();
        let scaler = Standardizer::fit(&train_raw).unwrap();
        ModelInputs {
            feature_names: vec!["a".to_string(), "b".to_string()],
            train_std: scaler.transform_all(&train_raw),
            test_std: scaler.transform_all(&test_raw),
            scaler,
            train_raw,
            y_train,
            test_raw,
            y_test,
        }
    }

    #[test]
    fn linear_model_extrapolates_linear_data() {
        let spec = ModelSpec {
            name: "ols".to_string(),
            kind: ModelKind::Linear,
            requires_standardized_input: true,
        };
        let result = train_model(&spec, &inputs()).unwrap();
        assert!(result.metrics.rmse < 1e-8);
        assert!((result.metrics.r2 - 1.0).abs() < 1e-9);
        assert!(result.feature_importance.is_none());
    }

    #[test]
    fn failures_are_collected_not_fatal() {
        let registry = vec![
            ModelSpec {
                name: "bad ridge".to_string(),
                kind: ModelKind::Ridge { alpha: f64::NAN },
                requires_standardized_input: true,
            },
            ModelSpec {
                name: "ols".to_string(),
                kind: ModelKind::Linear,
                requires_standardized_input: false,
            },
        ];
        let (results, failed) = train_registry(&registry, &inputs());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name(), "ols");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].name, "bad ridge");
    }

    #[test]
    fn importances_are_sorted_with_stable_ties() {
        let names: Vec<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
        let ranked = rank_importances(&names, &[0.25, 0.5, 0.25]);
        let order: Vec<&str> = ranked.iter().map(|f| f.feature.as_str()).collect();
        assert_eq!(order, vec!["y", "x", "z"]);
    }
}
