//! Per-country trend summaries and improver/decliner rankings.

use serde::Serialize;

use crate::domain::CountrySeries;
use crate::math::{mean, sample_std};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryTrend {
    pub country: String,
    pub first_year: i32,
    pub last_year: i32,
    pub first_score: f64,
    pub last_score: f64,
    /// `last_score - first_score`.
    pub total_change: f64,
    pub mean_annual_change: f64,
    /// Sample std of the annual changes (0 with fewer than two changes).
    pub change_std: f64,
}

/// Top improvers and decliners by total change.
#[derive(Debug, Clone, Default)]
pub struct TrendRankings {
    pub improvers: Vec<CountryTrend>,
    pub decliners: Vec<CountryTrend>,
}

pub fn summarize_trend(series: &CountrySeries) -> CountryTrend {
    let first = series.first();
    let last = series.last();
    let changes: Vec<f64> = series.changes().into_iter().flatten().collect();

    CountryTrend {
        country: series.country().to_string(),
        first_year: first.year,
        last_year: last.year,
        first_score: first.score,
        last_score: last.score,
        total_change: last.score - first.score,
        mean_annual_change: if changes.is_empty() { 0.0 } else { mean(&changes) },
        change_std: sample_std(&changes),
    }
}

pub fn summarize_trends(series: &[CountrySeries]) -> Vec<CountryTrend> {
    series.iter().map(summarize_trend).collect()
}

/// Rank the top-N improvers (largest total change) and decliners (smallest).
///
/// Equal changes are ordered by country name so the output is stable.
pub fn rank_improvers(summaries: &[CountryTrend], top_n: usize) -> TrendRankings {
    let mut sorted = summaries.to_vec();
    sorted.sort_by(|a, b| {
        b.total_change
            .partial_cmp(&a.total_change)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.country.cmp(&b.country))
    });
    let improvers = sorted.iter().take(top_n).cloned().collect();

    let mut sorted_down = summaries.to_vec();
    sorted_down.sort_by(|a, b| {
        a.total_change
            .partial_cmp(&b.total_change)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.country.cmp(&b.country))
    });
    let decliners = sorted_down.iter().take(top_n).cloned().collect();

    TrendRankings { improvers, decliners }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScorePoint;

    fn series(country: &str, scores: &[f64]) -> CountrySeries {
        let points = scores
            .iter()
            .enumerate()
            .map(|(i, &score)| ScorePoint {
                country: country.to_string(),
                year: 2010 + i as i32,
                score,
                change: None,
            })
            .collect();
        CountrySeries::new(country, points).unwrap()
    }

    #[test]
    fn summary_basic() {
        let t = summarize_trend(&series("A", &[50.0, 52.0, 56.0]));
        assert_eq!(t.first_year, 2010);
        assert_eq!(t.last_year, 2012);
        assert_eq!(t.total_change, 6.0);
        assert_eq!(t.mean_annual_change, 3.0);
        // changes 2, 4 -> sample std sqrt(2)
        assert!((t.change_std - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn single_point_has_zero_change() {
        let t = summarize_trend(&series("A", &[70.0]));
        assert_eq!(t.total_change, 0.0);
        assert_eq!(t.mean_annual_change, 0.0);
        assert_eq!(t.change_std, 0.0);
    }

    #[test]
    fn rankings_break_ties_by_name() {
        let summaries = summarize_trends(&[
            series("C", &[50.0, 55.0]),
            series("B", &[50.0, 55.0]),
            series("A", &[60.0, 58.0]),
            series("D", &[60.0, 61.0]),
        ]);
        let r = rank_improvers(&summaries, 2);
        let up: Vec<&str> = r.improvers.iter().map(|t| t.country.as_str()).collect();
        let down: Vec<&str> = r.decliners.iter().map(|t| t.country.as_str()).collect();
        assert_eq!(up, vec!["B", "C"]);
        assert_eq!(down, vec!["A", "D"]);
    }
}
