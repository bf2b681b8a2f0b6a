//! Multi-step forecasting.
//!
//! Each country rolls forward on its own buffer: predict one year, clamp it,
//! push it back into the buffer, repeat.

pub mod forecaster;

pub use forecaster::*;
