//! Built-in data sources.
//!
//! - seeded synthetic score panels for demos and tests (`sample`)

pub mod sample;

pub use sample::*;
