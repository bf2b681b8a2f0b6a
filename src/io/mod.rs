//! Input/output helpers.
//!
//! - CSV ingest + reshape (`ingest`)
//! - table and report exports (CSV/JSON) (`export`)
//! - model registry JSON (`registry`)

pub mod export;
pub mod ingest;
pub mod registry;

pub use export::*;
pub use ingest::*;
pub use registry::*;
