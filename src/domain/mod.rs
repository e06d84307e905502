//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - context enums (`UserProfile`, `BudgetTier`)
//! - per-request context (`ForecastContext`)
//! - request/response shapes (`ForecastRequest`, `ForecastOutcome`, etc.)

pub mod types;

pub use types::*;
