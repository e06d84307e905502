//! Statistical extrapolation used when the model path is unavailable.
//!
//! The method depends only on history length:
//!
//! - `n >= 6`: double exponential smoothing (level + trend)
//! - `3 <= n < 6`: weighted moving average of the last three values plus a
//!   linear trend
//! - `1 <= n < 3`: flat mean
//! - `n == 0`: zeros
//!
//! Every value is floored at 0.

use serde::{Deserialize, Serialize};

/// Weights for the last three values, most recent first.
const WMA_WEIGHTS: [f64; 3] = [0.5, 0.3, 0.2];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMethod {
    ExponentialSmoothing,
    WeightedMovingAverage,
    FlatMean,
    Zeros,
}

impl FallbackMethod {
    pub fn for_len(n: usize) -> Self {
        match n {
            0 => FallbackMethod::Zeros,
            1 | 2 => FallbackMethod::FlatMean,
            3..=5 => FallbackMethod::WeightedMovingAverage,
            _ => FallbackMethod::ExponentialSmoothing,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            FallbackMethod::ExponentialSmoothing => "double exponential smoothing",
            FallbackMethod::WeightedMovingAverage => "weighted moving average",
            FallbackMethod::FlatMean => "flat mean",
            FallbackMethod::Zeros => "zeros",
        }
    }
}

/// Smoothing constants for the exponential method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingParams {
    /// Level smoothing.
    pub alpha: f64,
    /// Trend smoothing.
    pub beta: f64,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self { alpha: 0.3, beta: 0.1 }
    }
}

/// Forecast `horizon` steps from `history` without a model.
pub fn fallback_forecast(history: &[f64], horizon: usize, params: &SmoothingParams) -> Vec<f64> {
    let raw = match FallbackMethod::for_len(history.len()) {
        FallbackMethod::Zeros => vec![0.0; horizon],
        FallbackMethod::FlatMean => {
            let avg = history.iter().sum::<f64>() / history.len() as f64;
            vec![avg; horizon]
        }
        FallbackMethod::WeightedMovingAverage => weighted_moving_average(history, horizon),
        FallbackMethod::ExponentialSmoothing => double_exponential(history, horizon, params),
    };
    raw.into_iter()
        .map(|v| if v.is_finite() { v.max(0.0) } else { 0.0 })
        .collect()
}

fn weighted_moving_average(history: &[f64], horizon: usize) -> Vec<f64> {
    let n = history.len();
    let recent = WMA_WEIGHTS
        .iter()
        .enumerate()
        .map(|(i, w)| w * history[n - 1 - i])
        .sum::<f64>();
    let trend = (history[n - 1] - history[n - 3]) / 2.0;
    (1..=horizon).map(|h| recent + trend * h as f64).collect()
}

fn double_exponential(history: &[f64], horizon: usize, params: &SmoothingParams) -> Vec<f64> {
    let (alpha, beta) = (params.alpha, params.beta);
    let mut level = history[0];
    let mut trend = history[1] - history[0];

    for &x in &history[1..] {
        let new_level = alpha * x + (1.0 - alpha) * (level + trend);
        trend = beta * (new_level - level) + (1.0 - beta) * trend;
        level = new_level;
    }

    (1..=horizon).map(|h| level + h as f64 * trend).collect()
}
