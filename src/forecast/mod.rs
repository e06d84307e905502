//! Forecast orchestration.
//!
//! Responsibilities:
//!
//! - predict one step through the model oracle (`step`)
//! - bound each prediction (`guardrail`) and perturb later steps (`jitter`)
//! - run the iterative loop with fallback on failure (`engine`)
//! - forecast many categories at once (`batch`)
//! - infer a user profile from spending (`profile`)

pub mod batch;
pub mod cancel;
pub mod engine;
pub mod fallback;
pub mod guardrail;
pub mod jitter;
pub mod profile;
pub mod step;

pub use cancel::*;
pub use engine::*;
pub use fallback::*;
pub use guardrail::*;
pub use jitter::*;
pub use profile::*;
pub use step::*;
