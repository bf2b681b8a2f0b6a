//! k-means clustering of country trajectories.
//!
//! Each country with at least two observations is described by three
//! trajectory features:
//!
//! - latest score
//! - mean of its last (up to) 5 annual changes
//! - sample std of its last (up to) 5 scores
//!
//! Features are standardized before clustering so the score level does not
//! dominate. Seeding is k-means++ from a seeded `StdRng`, followed by Lloyd
//! iterations until assignments stop changing (or the iteration cap).
//! Clusters are relabelled by descending centroid score, so cluster 0 is
//! always the strongest group.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::debug;

use crate::domain::CountrySeries;
use crate::error::AppError;
use crate::features::Standardizer;
use crate::math::{mean, sample_std};

const TAIL: usize = 5;
const MAX_ITERATIONS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryFeatures {
    pub latest_score: f64,
    pub recent_change: f64,
    pub recent_volatility: f64,
}

impl TrajectoryFeatures {
    fn to_vec(self) -> Vec<f64> {
        vec![self.latest_score, self.recent_change, self.recent_volatility]
    }

    fn from_slice(v: &[f64]) -> Self {
        Self {
            latest_score: v[0],
            recent_change: v[1],
            recent_volatility: v[2],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssignment {
    pub country: String,
    pub cluster: usize,
    pub features: TrajectoryFeatures,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub id: usize,
    pub size: usize,
    /// Centroid in original (unstandardized) units.
    pub centroid: TrajectoryFeatures,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Clustering {
    pub k: usize,
    pub iterations: usize,
    pub assignments: Vec<ClusterAssignment>,
    pub clusters: Vec<ClusterSummary>,
}

/// Trajectory features for one country; `None` with fewer than two points.
pub fn trajectory_features(series: &CountrySeries) -> Option<TrajectoryFeatures> {
    if series.len() < 2 {
        return None;
    }
    let scores = series.scores();
    let changes: Vec<f64> = series.changes().into_iter().flatten().collect();

    let recent_scores = &scores[scores.len().saturating_sub(TAIL)..];
    let recent_changes = &changes[changes.len().saturating_sub(TAIL)..];

    Some(TrajectoryFeatures {
        latest_score: series.last().score,
        recent_change: if recent_changes.is_empty() { 0.0 } else { mean(recent_changes) },
        recent_volatility: sample_std(recent_scores),
    })
}

/// Cluster country trajectories into (at most) `k` groups.
pub fn cluster_trajectories(series: &[CountrySeries], k: usize, seed: u64) -> Result<Clustering, AppError> {
    let labelled: Vec<(&str, TrajectoryFeatures)> = series
        .iter()
        .filter_map(|s| trajectory_features(s).map(|f| (s.country(), f)))
        .collect();

    let k = k.min(labelled.len());
    if k == 0 {
        return Ok(Clustering::default());
    }

    let raw: Vec<Vec<f64>> = labelled.iter().map(|(_, f)| f.to_vec()).collect();
    let scaler = Standardizer::fit(&raw)?;
    let points = scaler.transform_all(&raw);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = seed_plus_plus(&points, k, &mut rng);
    let mut labels = vec![usize::MAX; points.len()];
    let mut iterations = 0;

    while iterations < MAX_ITERATIONS {
        iterations += 1;
        let mut changed = false;
        for (i, p) in points.iter().enumerate() {
            let c = nearest(&centroids, p);
            if labels[i] != c {
                labels[i] = c;
                changed = true;
            }
        }
        if !changed {
            break;
        }
        update_centroids(&points, &labels, &mut centroids);
    }

    // Relabel by descending centroid score.
    let original: Vec<Vec<f64>> = centroids.iter().map(|c| inverse(&scaler, c)).collect();
    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| {
        original[b][0]
            .partial_cmp(&original[a][0])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    let mut relabel = vec![0; k];
    for (new_id, &old_id) in order.iter().enumerate() {
        relabel[old_id] = new_id;
    }

    let assignments: Vec<ClusterAssignment> = labelled
        .iter()
        .zip(labels.iter())
        .map(|((country, features), &label)| ClusterAssignment {
            country: country.to_string(),
            cluster: relabel[label],
            features: *features,
        })
        .collect();

    let clusters = order
        .iter()
        .enumerate()
        .map(|(new_id, &old_id)| ClusterSummary {
            id: new_id,
            size: labels.iter().filter(|&&l| l == old_id).count(),
            centroid: TrajectoryFeatures::from_slice(&original[old_id]),
        })
        .collect();

    debug!(k, iterations, countries = assignments.len(), "k-means converged");

    Ok(Clustering {
        k,
        iterations,
        assignments,
        clusters,
    })
}

fn seed_plus_plus(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())].clone());

    while centroids.len() < k {
        let d2: Vec<f64> = points
            .iter()
            .map(|p| {
                centroids
                    .iter()
                    .map(|c| squared_distance(p, c))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = d2.iter().sum();

        let next = if total > 0.0 && total.is_finite() {
            let mut target = rng.gen_range(0.0..total);
            let mut chosen = d2.len() - 1;
            for (i, &w) in d2.iter().enumerate() {
                if target < w {
                    chosen = i;
                    break;
                }
                target -= w;
            }
            chosen
        } else {
            // Every point coincides with a centroid already.
            rng.gen_range(0..points.len())
        };
        centroids.push(points[next].clone());
    }
    centroids
}

fn nearest(centroids: &[Vec<f64>], p: &[f64]) -> usize {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_distance(p, c);
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

/// Move each centroid to the mean of its members; empty clusters stay put.
fn update_centroids(points: &[Vec<f64>], labels: &[usize], centroids: &mut [Vec<f64>]) {
    let dim = centroids.first().map(Vec::len).unwrap_or(0);
    for (c, centroid) in centroids.iter_mut().enumerate() {
        let mut sum = vec![0.0; dim];
        let mut count = 0usize;
        for (p, &l) in points.iter().zip(labels.iter()) {
            if l == c {
                for (s, v) in sum.iter_mut().zip(p.iter()) {
                    *s += v;
                }
                count += 1;
            }
        }
        if count > 0 {
            *centroid = sum.into_iter().map(|s| s / count as f64).collect();
        }
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

fn inverse(scaler: &Standardizer, z: &[f64]) -> Vec<f64> {
    z.iter()
        .zip(scaler.means.iter().zip(scaler.scales.iter()))
        .map(|(v, (m, s))| v * s + m)
        .collect()
}
