//! Mathematical utilities: descriptive statistics on monthly series.

pub mod stats;

pub use stats::*;
