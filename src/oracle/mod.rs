//! Trained-model seam.
//!
//! The forecasting core only needs one capability from a trained model:
//! "ordered feature vector in, one log-space scalar out". `Oracle` captures
//! that; `ModelBundle` pairs an oracle with the feature schema it was trained
//! on and is shared read-only across requests.

use std::sync::Arc;

use crate::error::AppError;
use crate::features::FeatureSchema;

pub mod linear;
pub mod remote;

pub use linear::*;
pub use remote::*;

/// A trained regression model, treated as opaque.
pub trait Oracle: Send + Sync {
    /// Predict one value (log space) from a schema-aligned feature vector.
    fn predict(&self, features: &[f64]) -> Result<f64, AppError>;
}

impl<F> Oracle for F
where
    F: Fn(&[f64]) -> Result<f64, AppError> + Send + Sync,
{
    fn predict(&self, features: &[f64]) -> Result<f64, AppError> {
        self(features)
    }
}

/// A loaded model together with its declared feature schema.
#[derive(Clone)]
pub struct ModelBundle {
    schema: FeatureSchema,
    oracle: Arc<dyn Oracle>,
}

impl ModelBundle {
    pub fn new(schema: FeatureSchema, oracle: Arc<dyn Oracle>) -> Self {
        Self { schema, oracle }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn oracle(&self) -> &dyn Oracle {
        self.oracle.as_ref()
    }
}

impl std::fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBundle")
            .field("features", &self.schema.len())
            .finish_non_exhaustive()
    }
}
