//! Reporting: recommendation synthesis and formatted terminal output.

pub mod format;
pub mod recommend;

pub use format::*;
pub use recommend::*;
