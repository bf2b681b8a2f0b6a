//! Model selection by held-out R².
//!
//! Selection rules:
//! 1. Every registry entry that fit successfully is a candidate.
//! 2. The candidate with the highest R² on the test split wins.
//! 3. Ties go to the entry that appears first in the registry.
//!
//! The whole run fails only if no entry could be fit.

use tracing::info;

use crate::domain::{FailedModel, ModelSpec};
use crate::error::AppError;
use crate::features::{Dataset, Standardizer};
use crate::fit::trainer::{ModelInputs, ModelResult, train_registry};

/// Output of training + selection.
#[derive(Debug, Clone)]
pub struct ModelSelection {
    /// Successfully fitted models, in registry order.
    pub results: Vec<ModelResult>,
    pub best_index: usize,
    /// Models that failed and why (for diagnostics).
    pub failed: Vec<FailedModel>,
    /// Training-split standardizer shared by every scale-sensitive model.
    pub scaler: Standardizer,
}

impl ModelSelection {
    pub fn best(&self) -> &ModelResult {
        &self.results[self.best_index]
    }
}

/// Train the registry on `dataset` and pick the best model.
pub fn train_and_select(dataset: &Dataset, registry: &[ModelSpec]) -> Result<ModelSelection, AppError> {
    if registry.is_empty() {
        return Err(AppError::new(2, "Model registry is empty."));
    }

    let inputs = ModelInputs::from_dataset(dataset)?;
    let (results, failed) = train_registry(registry, &inputs);

    let Some(best_index) = select_best(&results) else {
        let reasons: Vec<String> = failed.iter().map(|f| format!("{}: {}", f.name, f.reason)).collect();
        return Err(AppError::new(
            4,
            format!("Every registered model failed to fit ({}).", reasons.join("; ")),
        ));
    };

    info!(
        best = results[best_index].name(),
        r2 = results[best_index].metrics.r2,
        candidates = results.len(),
        failed = failed.len(),
        "selected best model"
    );

    Ok(ModelSelection {
        results,
        best_index,
        failed,
        scaler: inputs.scaler,
    })
}

/// Index of the highest-R² result; first occurrence wins ties.
pub fn select_best(results: &[ModelResult]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, r) in results.iter().enumerate() {
        if !r.metrics.r2.is_finite() {
            continue;
        }
        match best {
            Some(b) if r.metrics.r2 <= results[b].metrics.r2 => {}
            _ => best = Some(i),
        }
    }
    best
}
