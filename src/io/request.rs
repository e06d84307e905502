//! Request decoding and validation.
//!
//! The forecasting core assumes clean input (finite, non-negative amounts);
//! this is where that is enforced for anything arriving from files or flags.

use std::fs::File;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::domain::{BatchRequest, ForecastRequest};
use crate::error::AppError;

/// Horizons above this are rejected as input errors.
pub const MAX_HORIZON: i64 = 120;

/// Horizons above this are accepted but carry no accuracy expectations.
pub const RELIABLE_HORIZON: usize = 12;

pub fn read_forecast_request(path: &Path) -> Result<ForecastRequest, AppError> {
    let req: ForecastRequest = read_json(path)?;
    validate_series("series", &req.series)?;
    validate_common(req.horizon, req.budget, req.start_month)?;
    Ok(req)
}

pub fn read_batch_request(path: &Path) -> Result<BatchRequest, AppError> {
    let req: BatchRequest = read_json(path)?;
    for (name, series) in &req.categories {
        if name.trim().is_empty() {
            return Err(AppError::new(2, "Category names must not be blank."));
        }
        validate_series(name, series)?;
    }
    validate_common(req.horizon, req.budget, req.start_month)?;
    Ok(req)
}

/// Reject non-finite or negative amounts.
pub fn validate_series(label: &str, series: &[f64]) -> Result<(), AppError> {
    if let Some((i, v)) = series
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(AppError::new(
            2,
            format!("Invalid amount {v} at position {i} in '{label}' (must be finite and >= 0)."),
        ));
    }
    Ok(())
}

pub fn validate_common(horizon: i64, budget: Option<f64>, start_month: Option<u32>) -> Result<(), AppError> {
    if horizon > MAX_HORIZON {
        return Err(AppError::new(2, format!("Horizon {horizon} exceeds the maximum of {MAX_HORIZON}.")));
    }
    if let Some(b) = budget {
        if !b.is_finite() || b < 0.0 {
            return Err(AppError::new(2, format!("Budget must be finite and >= 0, got {b}.")));
        }
    }
    if let Some(m) = start_month {
        if !(1..=12).contains(&m) {
            return Err(AppError::new(2, format!("Start month must be in 1..=12, got {m}.")));
        }
    }
    Ok(())
}

/// Parse a comma-separated list of amounts (`"1000, 1100,1050"`).
pub fn parse_series_list(list: &str) -> Result<Vec<f64>, AppError> {
    let series = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| AppError::new(2, format!("Invalid amount '{s}' in series.")))
        })
        .collect::<Result<Vec<f64>, AppError>>()?;
    validate_series("series", &series)?;
    Ok(series)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open request '{}': {e}", path.display())))?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid request JSON '{}': {e}", path.display())))
}
