//! `spendcast` library crate.
//!
//! The binary (`spendcast`) is a thin wrapper around this library so that:
//!
//! - the forecasting core is testable without spawning processes
//! - the core can be embedded behind other front-ends (an HTTP service, a job)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod features;
pub mod forecast;
pub mod io;
pub mod math;
pub mod oracle;
pub mod report;
