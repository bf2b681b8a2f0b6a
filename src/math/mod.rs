//! Mathematical utilities: least squares solvers and small-sample statistics.

pub mod ols;
pub mod stats;

pub use ols::*;
pub use stats::*;
