//! Input/output helpers.
//!
//! - request JSON decode + validation (`request`)
//! - model bundle loading (`model_file`)
//! - CSV expense ingest (`ingest`)
//! - forecast exports (JSON/CSV) (`export`)

pub mod export;
pub mod ingest;
pub mod model_file;
pub mod request;

pub use export::*;
pub use ingest::*;
pub use model_file::*;
pub use request::*;
