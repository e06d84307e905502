//! Terminal reporting for forecast results.

pub mod format;

pub use format::*;
