//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - observations (`ScorePoint`, `CountrySeries`)
//! - engineered rows and model registry entries (`FeatureRow`, `ModelSpec`)
//! - pipeline outputs (`ForecastPoint`, `Recommendation`, `RunSummary`)
//! - run configuration (`PipelineConfig`)

pub mod types;

pub use types::*;
