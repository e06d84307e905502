//! Read/write model bundle JSON files.
//!
//! A bundle file declares the ordered feature schema and either the
//! parameters of an in-process linear model or the URL of a model server:
//!
//! ```json
//! { "features": ["lag_1", "Rolling3"], "intercept": 0.1, "coefficients": [0.7, 0.2] }
//! { "features": ["lag_1", "Rolling3"], "remote_url": "http://localhost:8000/predict" }
//! ```

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::features::FeatureSchema;
use crate::oracle::{LinearModel, ModelBundle, Oracle, RemoteOracle};

/// On-disk bundle layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub features: FeatureSchema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intercept: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coefficients: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
}

impl ModelFile {
    /// Build the runtime bundle described by this file.
    pub fn into_bundle(self) -> Result<ModelBundle, AppError> {
        let oracle: Arc<dyn Oracle> = match (self.coefficients, self.remote_url) {
            (Some(_), Some(_)) => {
                return Err(AppError::new(
                    2,
                    "Model file must set either `coefficients` or `remote_url`, not both.",
                ));
            }
            (Some(coefficients), None) => {
                if coefficients.len() != self.features.len() {
                    return Err(AppError::new(
                        2,
                        format!(
                            "Model has {} coefficients but declares {} features.",
                            coefficients.len(),
                            self.features.len()
                        ),
                    ));
                }
                Arc::new(LinearModel::new(self.intercept.unwrap_or(0.0), coefficients)?)
            }
            (None, Some(url)) => Arc::new(RemoteOracle::new(url)?),
            (None, None) => {
                return Err(AppError::new(
                    2,
                    "Model file has neither `coefficients` nor `remote_url`.",
                ));
            }
        };
        Ok(ModelBundle::new(self.features, oracle))
    }
}

/// Load a model bundle. Any failure here is a configuration error.
pub fn load_model_bundle(path: &Path) -> Result<ModelBundle, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open model file '{}': {e}", path.display())))?;
    let model: ModelFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid model file '{}': {e}", path.display())))?;
    let bundle = model.into_bundle()?;
    info!(path = %path.display(), features = bundle.schema().len(), "model bundle loaded");
    Ok(bundle)
}
