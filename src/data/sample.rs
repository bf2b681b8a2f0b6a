//! Synthetic score panel generation.
//!
//! Each country gets a base level, a yearly drift that bends slowly, and
//! Gaussian noise on top:
//!
//!   score(t) = base + drift * t + curvature * t² + noise
//!
//! clipped to `[0, 100]`. A deterministic subset of countries is truncated so
//! the skip paths (too little history to window or forecast) are always
//! exercised.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{DatasetStats, ScorePoint};
use crate::error::AppError;

/// Every `SHORT_EVERY`-th country keeps only its last two years.
const SHORT_EVERY: usize = 10;
/// Every `LATE_EVERY`-th country starts six years before the panel ends.
const LATE_EVERY: usize = 7;
const LATE_YEARS: i32 = 6;

const BASE_MEAN: f64 = 64.0;
const BASE_SD: f64 = 8.0;
const DRIFT_MEAN: f64 = 0.35;
const DRIFT_SD: f64 = 0.45;
const CURVATURE_SD: f64 = 0.01;
const NOISE_SD: f64 = 0.6;

#[derive(Debug, Clone)]
pub struct SamplePanel {
    /// Sorted by country then year.
    pub points: Vec<ScorePoint>,
    pub stats: DatasetStats,
}

pub fn country_name(index: usize) -> String {
    format!("Country {:03}", index + 1)
}

/// Generate a seeded panel of `countries` over `first_year..=last_year`.
pub fn generate_panel(countries: usize, first_year: i32, last_year: i32, seed: u64) -> Result<SamplePanel, AppError> {
    if countries == 0 {
        return Err(AppError::new(2, "Synthetic country count must be > 0."));
    }
    if last_year <= first_year {
        return Err(AppError::new(2, "Synthetic year range must span at least two years."));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let unit = Normal::new(0.0, 1.0).map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut points = Vec::new();
    for i in 0..countries {
        let country = country_name(i);
        let base = (BASE_MEAN + BASE_SD * unit.sample(&mut rng)).clamp(35.0, 90.0);
        let drift = DRIFT_MEAN + DRIFT_SD * unit.sample(&mut rng);
        let curvature = CURVATURE_SD * unit.sample(&mut rng);

        let start = if i % SHORT_EVERY == SHORT_EVERY - 1 {
            last_year - 1
        } else if i % LATE_EVERY == LATE_EVERY - 1 {
            (last_year - LATE_YEARS + 1).max(first_year)
        } else {
            first_year
        };

        let mut previous: Option<f64> = None;
        for year in first_year..=last_year {
            let t = f64::from(year - first_year);
            let noise = NOISE_SD * unit.sample(&mut rng);
            let score = (base + drift * t + curvature * t * t + noise).clamp(0.0, 100.0);
            // Draws happen for every year so truncation never shifts the stream.
            if year < start {
                continue;
            }
            points.push(ScorePoint {
                country: country.clone(),
                year,
                score,
                change: previous.map(|p| score - p),
            });
            previous = Some(score);
        }
    }

    let stats =
        DatasetStats::from_points(&points).ok_or_else(|| AppError::new(4, "Failed to compute sample stats."))?;
    Ok(SamplePanel { points, stats })
}
