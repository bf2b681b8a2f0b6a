//! Descriptive analysis over the observed panel: per-country trend summaries
//! and trajectory clustering. Nothing here feeds the models.

pub mod cluster;
pub mod trends;

pub use cluster::*;
pub use trends::*;
