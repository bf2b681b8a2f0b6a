//! Fitting and prediction dispatch for every registered model kind.
//!
//! The trainer relies on three primitive operations:
//! - fit a model kind on a feature matrix
//! - predict one row
//! - report feature importances (tree ensembles only)
//!
//! These are implemented here by matching on `ModelKind`.

use crate::domain::ModelKind;
use crate::error::AppError;
use crate::models::boosting::GradientBoosting;
use crate::models::forest::RandomForest;
use crate::models::linear::LinearModel;
use crate::models::tree::TreeParams;

/// A trained regressor.
#[derive(Debug, Clone, PartialEq)]
pub enum FittedModel {
    Linear(LinearModel),
    Forest(RandomForest),
    Boosting(GradientBoosting),
}

impl FittedModel {
    /// Fit `kind` on rows `x` with targets `y`.
    ///
    /// Fails (exit code 4) on unusable hyperparameters, on empty, ragged or
    /// non-finite input, or when the underlying solver cannot produce finite
    /// coefficients. The trainer records such a failure against this model only.
    pub fn fit(kind: &ModelKind, x: &[Vec<f64>], y: &[f64]) -> Result<Self, AppError> {
        check_hyperparameters(kind)?;
        check_training_data(x, y)?;

        let model = match *kind {
            ModelKind::Linear => FittedModel::Linear(LinearModel::fit_ols(x, y)?),
            ModelKind::Ridge { alpha } => FittedModel::Linear(LinearModel::fit_ridge(x, y, alpha)?),
            ModelKind::RandomForest {
                n_trees,
                max_depth,
                min_samples_split,
                min_samples_leaf,
                seed,
            } => {
                let params = TreeParams {
                    max_depth,
                    min_samples_split,
                    min_samples_leaf,
                };
                FittedModel::Forest(RandomForest::fit(x, y, n_trees, &params, seed))
            }
            ModelKind::GradientBoosting {
                n_estimators,
                learning_rate,
                max_depth,
                min_samples_split,
                min_samples_leaf,
            } => {
                let params = TreeParams {
                    max_depth,
                    min_samples_split,
                    min_samples_leaf,
                };
                FittedModel::Boosting(GradientBoosting::fit(x, y, n_estimators, learning_rate, &params))
            }
        };

        Ok(model)
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        match self {
            FittedModel::Linear(m) => m.predict(row),
            FittedModel::Forest(m) => m.predict(row),
            FittedModel::Boosting(m) => m.predict(row),
        }
    }

    pub fn predict_all(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.predict(r)).collect()
    }

    /// Per-column importances, or `None` for models that do not define them.
    pub fn feature_importances(&self) -> Option<Vec<f64>> {
        match self {
            FittedModel::Linear(_) => None,
            FittedModel::Forest(m) => Some(m.feature_importances()),
            FittedModel::Boosting(m) => Some(m.feature_importances()),
        }
    }
}

fn check_hyperparameters(kind: &ModelKind) -> Result<(), AppError> {
    let bad = |what: &str, value: String| Err(AppError::new(4, format!("Invalid {what}={value}.")));
    match *kind {
        ModelKind::Linear => Ok(()),
        ModelKind::Ridge { alpha } if !(alpha.is_finite() && alpha >= 0.0) => bad("ridge alpha", alpha.to_string()),
        ModelKind::Ridge { .. } => Ok(()),
        ModelKind::RandomForest {
            n_trees,
            max_depth,
            min_samples_leaf,
            ..
        } => {
            if n_trees == 0 {
                bad("n_trees", n_trees.to_string())
            } else if max_depth == 0 {
                bad("max_depth", max_depth.to_string())
            } else if min_samples_leaf == 0 {
                bad("min_samples_leaf", min_samples_leaf.to_string())
            } else {
                Ok(())
            }
        }
        ModelKind::GradientBoosting {
            n_estimators,
            learning_rate,
            max_depth,
            min_samples_leaf,
            ..
        } => {
            if n_estimators == 0 {
                bad("n_estimators", n_estimators.to_string())
            } else if !(learning_rate.is_finite() && learning_rate > 0.0) {
                bad("learning_rate", learning_rate.to_string())
            } else if max_depth == 0 {
                bad("max_depth", max_depth.to_string())
            } else if min_samples_leaf == 0 {
                bad("min_samples_leaf", min_samples_leaf.to_string())
            } else {
                Ok(())
            }
        }
    }
}

fn check_training_data(x: &[Vec<f64>], y: &[f64]) -> Result<(), AppError> {
    if x.is_empty() {
        return Err(AppError::new(4, "No training rows."));
    }
    if x.len() != y.len() {
        return Err(AppError::new(
            4,
            format!("Feature/target length mismatch: {} rows vs {} targets.", x.len(), y.len()),
        ));
    }
    let p = x[0].len();
    if p == 0 {
        return Err(AppError::new(4, "Feature rows have no columns."));
    }
    if x.iter().any(|r| r.len() != p) {
        return Err(AppError::new(4, "Ragged feature matrix."));
    }
    if x.iter().flatten().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(AppError::new(4, "Non-finite value in training data."));
    }
    Ok(())
}
