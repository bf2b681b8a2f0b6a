//! Recommendation synthesis: tier, trajectory and collaboration role per country.
//!
//! Purely derived from the observed series and the forecasts; recomputed on
//! demand and never stored.

use std::collections::BTreeMap;

use crate::domain::{CollaborationRole, CountrySeries, ForecastPoint, Recommendation, Tier, Trajectory};

pub const HIGH_TIER_MIN: f64 = 78.0;
pub const EMERGING_TIER_MIN: f64 = 70.0;
pub const DECLINING_BELOW: f64 = -0.5;
pub const IMPROVING_ABOVE: f64 = 1.0;

pub fn tier_for(latest_score: f64) -> Tier {
    if latest_score >= HIGH_TIER_MIN {
        Tier::High
    } else if latest_score >= EMERGING_TIER_MIN {
        Tier::Emerging
    } else {
        Tier::Developing
    }
}

/// Bucket `latest forecast - latest actual`.
pub fn trajectory_for(delta: f64) -> Trajectory {
    if delta < DECLINING_BELOW {
        Trajectory::Declining
    } else if delta > IMPROVING_ABOVE {
        Trajectory::Improving
    } else {
        Trajectory::Stable
    }
}

pub fn role_for(tier: Tier, trajectory: Trajectory) -> CollaborationRole {
    match (tier, trajectory) {
        (_, Trajectory::Declining) => CollaborationRole::NeedsSupport,
        (Tier::High, _) => CollaborationRole::Leader,
        (_, Trajectory::Improving) => CollaborationRole::RisingPerformer,
        _ => CollaborationRole::SteadyPartner,
    }
}

/// One recommendation per country that has at least one forecast, in `series` order.
///
/// The trajectory compares the furthest forecast year with the latest actual score.
pub fn recommend(series: &[CountrySeries], forecasts: &[ForecastPoint]) -> Vec<Recommendation> {
    let mut latest_forecast: BTreeMap<&str, &ForecastPoint> = BTreeMap::new();
    for f in forecasts {
        latest_forecast
            .entry(f.country.as_str())
            .and_modify(|cur| {
                if f.year > cur.year {
                    *cur = f;
                }
            })
            .or_insert(f);
    }

    series
        .iter()
        .filter_map(|s| {
            let f = latest_forecast.get(s.country())?;
            let latest = s.last();
            let delta = f.predicted_score - latest.score;
            let tier = tier_for(latest.score);
            let trajectory = trajectory_for(delta);
            Some(Recommendation {
                country: s.country().to_string(),
                latest_year: latest.year,
                latest_score: latest.score,
                forecast_year: f.year,
                forecast_score: f.predicted_score,
                delta,
                tier,
                trajectory,
                role: role_for(tier, trajectory),
            })
        })
        .collect()
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
                year: 2019 + i as i32,
                score,
                change: None,
            })
            .collect();
        CountrySeries::new(country, points).unwrap()
    }

    fn forecast(country: &str, year: i32, score: f64) -> ForecastPoint {
        ForecastPoint {
            country: country.to_string(),
            year,
            predicted_score: score,
            model_name: "m".to_string(),
        }
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(tier_for(78.0), Tier::High);
        assert_eq!(tier_for(77.99), Tier::Emerging);
        assert_eq!(tier_for(70.0), Tier::Emerging);
        assert_eq!(tier_for(69.99), Tier::Developing);
    }

    #[test]
    fn trajectory_boundaries() {
        assert_eq!(trajectory_for(-0.51), Trajectory::Declining);
        assert_eq!(trajectory_for(-0.5), Trajectory::Stable);
        assert_eq!(trajectory_for(1.0), Trajectory::Stable);
        assert_eq!(trajectory_for(1.01), Trajectory::Improving);
    }

    #[test]
    fn roles() {
        assert_eq!(role_for(Tier::High, Trajectory::Declining), CollaborationRole::NeedsSupport);
        assert_eq!(role_for(Tier::High, Trajectory::Stable), CollaborationRole::Leader);
        assert_eq!(role_for(Tier::Developing, Trajectory::Improving), CollaborationRole::RisingPerformer);
        assert_eq!(role_for(Tier::Emerging, Trajectory::Stable), CollaborationRole::SteadyPartner);
    }

    #[test]
    fn uses_latest_forecast_and_skips_unforecast_countries() {
        let data = vec![series("A", &[72.0, 74.0]), series("B", &[60.0, 61.0])];
        let forecasts = vec![forecast("A", 2023, 73.0), forecast("A", 2022, 80.0), forecast("A", 2021, 75.0)];
        let recs = recommend(&data, &forecasts);
        assert_eq!(recs.len(), 1);
        let r = &recs[0];
        assert_eq!(r.country, "A");
        assert_eq!(r.forecast_year, 2023);
        assert!((r.delta + 1.0).abs() < 1e-12);
        assert_eq!(r.tier, Tier::Emerging);
        assert_eq!(r.trajectory, Trajectory::Declining);
        assert_eq!(r.role, CollaborationRole::NeedsSupport);
    }
}
