//! Flat feature table assembly and the temporal train/test split.
//!
//! Countries are processed independently (in parallel) and their rows are
//! concatenated in country order, so the table is identical across runs.
//!
//! The split uses one global cutoff year: rows predicting a year before the
//! cutoff train, the rest test. A country whose history does not straddle the
//! cutoff lands wholly on one side; that is accepted.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::{CountrySeries, FeatureRow, SkippedCountry};
use crate::features::trend::build_feature_row;
use crate::features::window::lag_windows;

/// Assembled feature table, already split.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub window: usize,
    pub cutoff_year: i32,
    pub feature_names: Vec<String>,
    pub train: Vec<FeatureRow>,
    pub test: Vec<FeatureRow>,
    /// Countries with too little history to yield a single row.
    pub skipped: Vec<SkippedCountry>,
    /// Rows discarded because a feature or the target was non-finite.
    pub dropped_rows: usize,
}

impl Dataset {
    /// All rows in table order (train rows first).
    pub fn rows(&self) -> impl Iterator<Item = &FeatureRow> {
        self.train.iter().chain(self.test.iter())
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Feature rows for one country, in chronological order.
pub fn country_rows(series: &CountrySeries, window: usize) -> Vec<FeatureRow> {
    lag_windows(series, window)
        .into_iter()
        .map(|w| {
            build_feature_row(
                series.country(),
                w.target_year,
                &w.scores,
                &w.changes,
                Some(w.target),
            )
        })
        .collect()
}

/// Split rows by reference year: `< cutoff` trains, `>= cutoff` tests.
pub fn split_by_year(rows: Vec<FeatureRow>, cutoff_year: i32) -> (Vec<FeatureRow>, Vec<FeatureRow>) {
    rows.into_iter().partition(|r| r.reference_year < cutoff_year)
}

/// Build the feature table for every country and split it at `cutoff_year`.
pub fn assemble_dataset(series: &[CountrySeries], window: usize, cutoff_year: i32) -> Dataset {
    let per_country: Vec<(&CountrySeries, Vec<FeatureRow>)> = series
        .par_iter()
        .map(|s| (s, country_rows(s, window)))
        .collect();

    let mut rows = Vec::new();
    let mut skipped = Vec::new();
    let mut dropped_rows = 0usize;

    for (s, produced) in per_country {
        if produced.is_empty() {
            debug!(country = s.country(), points = s.len(), "not enough history for a lag window");
            skipped.push(SkippedCountry {
                country: s.country().to_string(),
                reason: format!("{} points < window+1 ({})", s.len(), window + 1),
            });
            continue;
        }
        for row in produced {
            if row.is_finite() {
                rows.push(row);
            } else {
                dropped_rows += 1;
            }
        }
    }

    let (train, test) = split_by_year(rows, cutoff_year);
    info!(
        train = train.len(),
        test = test.len(),
        skipped = skipped.len(),
        dropped = dropped_rows,
        cutoff_year,
        "assembled feature table"
    );

    Dataset {
        window,
        cutoff_year,
        feature_names: FeatureRow::feature_names(window),
        train,
        test,
        skipped,
        dropped_rows,
    }
}

/// Model inputs for a set of rows.
pub fn feature_matrix(rows: &[FeatureRow]) -> Vec<Vec<f64>> {
    rows.iter().map(FeatureRow::values).collect()
}

/// Targets for a set of rows; rows without a target contribute NaN.
pub fn targets(rows: &[FeatureRow]) -> Vec<f64> {
    rows.iter().map(|r| r.target_score.unwrap_or(f64::NAN)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScorePoint;

    fn series(country: &str, first_year: i32, scores: &[f64]) -> CountrySeries {
        let points = scores
            .iter()
            .enumerate()
            .map(|(i, &score)| ScorePoint {
                country: country.to_string(),
                year: first_year + i as i32,
                score,
                change: None,
            })
            .collect();
        CountrySeries::new(country, points).unwrap()
    }

    #[test]
    fn short_countries_are_skipped_not_fatal() {
        let data = vec![
            series("A", 2010, &[50.0, 51.0, 52.0, 53.0, 54.0, 55.0, 56.0, 57.0, 58.0, 59.0]),
            series("B", 2020, &[70.0, 71.0]),
        ];
        let ds = assemble_dataset(&data, 4, 2018);
        assert_eq!(ds.len(), 6);
        assert_eq!(ds.skipped.len(), 1);
        assert_eq!(ds.skipped[0].country, "B");
    }

    #[test]
    fn split_uses_global_cutoff() {
        let data = vec![series("A", 2010, &[50.0, 51.0, 52.0, 53.0, 54.0, 55.0, 56.0, 57.0, 58.0, 59.0])];
        let ds = assemble_dataset(&data, 4, 2017);
        // Reference years 2014..=2019
        assert!(ds.train.iter().all(|r| r.reference_year < 2017));
        assert!(ds.test.iter().all(|r| r.reference_year >= 2017));
        assert_eq!(ds.train.len(), 3);
        assert_eq!(ds.test.len(), 3);
    }

    #[test]
    fn country_can_land_entirely_in_test() {
        let data = vec![series("late", 2017, &[60.0, 62.0, 64.0, 66.0, 68.0])];
        let ds = assemble_dataset(&data, 4, 2018);
        assert!(ds.train.is_empty());
        assert_eq!(ds.test.len(), 1);
        let row = &ds.test[0];
        assert_eq!(row.reference_year, 2021);
        assert_eq!(row.lags, vec![66.0, 64.0, 62.0, 60.0]);
        assert!((row.trend_slope - 2.0).abs() < 1e-9);
    }

    #[test]
    fn non_finite_rows_are_dropped() {
        let data = vec![series("A", 2000, &[50.0, 51.0, 52.0, 53.0, f64::NAN, 55.0])];
        let ds = assemble_dataset(&data, 4, 2003);
        // Both windows touch the NaN (as target or lag).
        assert_eq!(ds.dropped_rows, 2);
        assert!(ds.is_empty());
    }
}
