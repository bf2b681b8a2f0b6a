//! Model training, evaluation and selection.
//!
//! Responsibilities:
//!
//! - compute held-out regression metrics (`metrics`)
//! - fit every registry entry on raw or standardized features (parallel) (`trainer`)
//! - pick the best model by R² with registry-order tie breaking (`selection`)

pub mod metrics;
pub mod selection;
pub mod trainer;

pub use metrics::*;
pub use selection::*;
pub use trainer::*;
