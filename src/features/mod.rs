//! Feature engineering.
//!
//! Responsibilities:
//!
//! - slide a fixed-width lag window over each country's history (`window`)
//! - derive trend statistics from a window (`trend`)
//! - assemble the flat feature table and split it by year (`dataset`)
//! - standardize columns with train-only statistics (`scaler`)

pub mod dataset;
pub mod scaler;
pub mod trend;
pub mod window;

pub use dataset::*;
pub use scaler::*;
pub use trend::*;
pub use window::*;
