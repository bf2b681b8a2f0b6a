//! Regression model implementations.
//!
//! Models are implemented as small, self-contained fitters so that the
//! training/evaluation code can stay generic over the registry:
//!
//! - `linear`: OLS and ridge on centred data
//! - `tree`: CART regression tree shared by both ensembles
//! - `forest`: bagged trees with deterministic per-tree seeds
//! - `boosting`: squared-loss gradient boosting
//! - `model`: dispatch from a `ModelKind` to a fitted model

pub mod boosting;
pub mod forest;
pub mod linear;
pub mod model;
pub mod tree;

pub use boosting::*;
pub use forest::*;
pub use linear::*;
pub use model::*;
pub use tree::*;
