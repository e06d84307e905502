//! Single-step prediction through the model oracle.

use crate::error::AppError;
use crate::features::FeatureMap;
use crate::oracle::ModelBundle;

/// Align `features` to the bundle schema, query the oracle once, and map the
/// log-space output back to a non-negative amount.
pub fn predict_step(bundle: &ModelBundle, features: &FeatureMap) -> Result<f64, AppError> {
    let x = bundle.schema().align(features);
    let log_pred = bundle.oracle().predict(&x)?;
    if !log_pred.is_finite() {
        return Err(AppError::new(4, format!("Model returned a non-finite value ({log_pred}).")));
    }
    let amount = log_pred.exp_m1();
    if !amount.is_finite() {
        return Err(AppError::new(4, format!("Model output {log_pred} overflows on inversion.")));
    }
    Ok(amount.max(0.0))
}
