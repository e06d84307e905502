//! In-process linear model.
//!
//! `y = intercept + Σ coefficient_i · x_i`, evaluated in log space. The
//! coefficient order is the schema order, so the vector handed in by the step
//! predictor must already be aligned.

use nalgebra::DVector;

use crate::error::AppError;
use crate::oracle::Oracle;

#[derive(Debug, Clone)]
pub struct LinearModel {
    intercept: f64,
    coefficients: DVector<f64>,
}

impl LinearModel {
    pub fn new(intercept: f64, coefficients: Vec<f64>) -> Result<Self, AppError> {
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(AppError::new(2, "Linear model parameters must be finite."));
        }
        Ok(Self {
            intercept,
            coefficients: DVector::from_vec(coefficients),
        })
    }

    pub fn width(&self) -> usize {
        self.coefficients.len()
    }
}

impl Oracle for LinearModel {
    fn predict(&self, features: &[f64]) -> Result<f64, AppError> {
        if features.len() != self.width() {
            return Err(AppError::new(
                4,
                format!(
                    "Feature width {} does not match model width {}.",
                    features.len(),
                    self.width()
                ),
            ));
        }
        let x = DVector::from_row_slice(features);
        let y = self.intercept + self.coefficients.dot(&x);
        if y.is_finite() {
            Ok(y)
        } else {
            Err(AppError::new(4, "Linear model produced a non-finite prediction."))
        }
    }
}
