//! Model-input features.
//!
//! - `deriver`: history + calendar month + context → named features
//! - `schema`: named features → positional vector in model order

pub mod deriver;
pub mod schema;

pub use deriver::*;
pub use schema::*;
