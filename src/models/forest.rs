//! Random forest regressor (bagged CART trees).
//!
//! Each tree draws its bootstrap sample from its own `StdRng` seeded with
//! `seed + tree_index`, so trees can be grown in parallel and the forest is
//! still bit-for-bit reproducible for a fixed seed.

use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::models::tree::{RegressionTree, TreeParams};

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn fit(x: &[Vec<f64>], y: &[f64], n_trees: usize, params: &TreeParams, seed: u64) -> Self {
        let n = x.len();
        if n == 0 {
            return Self { trees: Vec::new() };
        }
        let trees = (0..n_trees)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(t as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(x, y, &sample, params)
            })
            .collect();
        Self { trees }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return f64::NAN;
        }
        self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean of per-tree normalised importances, renormalised.
    pub fn feature_importances(&self) -> Vec<f64> {
        average_importances(self.trees.iter())
    }
}

/// Average normalised importances over trees, skipping trees that never split.
pub(crate) fn average_importances<'a>(trees: impl Iterator<Item = &'a RegressionTree>) -> Vec<f64> {
    let mut acc: Vec<f64> = Vec::new();
    let mut counted = 0usize;
    for tree in trees {
        let imp = tree.feature_importances();
        if acc.is_empty() {
            acc = vec![0.0; imp.len()];
        }
        if imp.iter().sum::<f64>() <= 0.0 {
            continue;
        }
        for (a, v) in acc.iter_mut().zip(imp.iter()) {
            *a += v;
        }
        counted += 1;
    }

    let total: f64 = acc.iter().sum();
    if counted == 0 || total <= 0.0 {
        return acc;
    }
    acc.iter().map(|v| v / total).collect()
}
