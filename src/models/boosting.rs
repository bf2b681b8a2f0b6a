//! Gradient boosted regression trees (squared loss).
//!
//! Starts from the target mean and adds shallow trees fit to the current
//! residuals, each scaled by the learning rate. No row subsampling, so the
//! result is deterministic without a seed.

use crate::models::forest::average_importances;
use crate::models::tree::{RegressionTree, TreeParams};

#[derive(Debug, Clone, PartialEq)]
pub struct GradientBoosting {
    init: f64,
    learning_rate: f64,
    stages: Vec<RegressionTree>,
}

impl GradientBoosting {
    pub fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        n_estimators: usize,
        learning_rate: f64,
        params: &TreeParams,
    ) -> Self {
        let n = y.len();
        let init = if n > 0 { y.iter().sum::<f64>() / n as f64 } else { 0.0 };
        let all: Vec<usize> = (0..n).collect();

        let mut fitted = vec![init; n];
        let mut residuals = vec![0.0; n];
        let mut stages = Vec::with_capacity(n_estimators);

        for _ in 0..n_estimators {
            for i in 0..n {
                residuals[i] = y[i] - fitted[i];
            }
            let tree = RegressionTree::fit(x, &residuals, &all, params);
            for (i, row) in x.iter().enumerate() {
                fitted[i] += learning_rate * tree.predict(row);
            }
            stages.push(tree);
        }

        Self {
            init,
            learning_rate,
            stages,
        }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.init
            + self.learning_rate * self.stages.iter().map(|t| t.predict(row)).sum::<f64>()
    }

    pub fn n_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn feature_importances(&self) -> Vec<f64> {
        average_importances(self.stages.iter())
    }
}
