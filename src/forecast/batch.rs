//! Multi-category forecasts.
//!
//! Each category runs through the single-series pipeline on its own (in
//! parallel); a failure in one category only degrades that category. The
//! total is the step-wise sum of all category forecasts.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::info;

use crate::domain::{BatchOutcome, ForecastContext, ForecastOutcome};
use crate::forecast::engine::SpendForecaster;
use crate::math::round_cents;

impl SpendForecaster {
    /// Forecast every category in `categories` for `horizon` steps.
    ///
    /// `base` supplies budget, profile, and start month; its category is
    /// replaced by each map key.
    pub fn forecast_batch(
        &self,
        categories: &BTreeMap<String, Vec<f64>>,
        horizon: usize,
        base: &ForecastContext,
    ) -> BatchOutcome {
        let results: Vec<(String, ForecastOutcome)> = categories
            .par_iter()
            .map(|(name, history)| {
                let ctx = ForecastContext {
                    category: Some(name.clone()),
                    ..base.clone()
                };
                (name.clone(), self.forecast(history, horizon, &ctx))
            })
            .collect();

        let mut total = vec![0.0; horizon];
        let mut per_category = BTreeMap::new();
        let mut degraded = Vec::new();

        for (name, outcome) in results {
            for (slot, v) in total.iter_mut().zip(&outcome.predictions) {
                *slot += v;
            }
            if outcome.degraded {
                degraded.push(name.clone());
            }
            per_category.insert(name, outcome.predictions);
        }

        let total: Vec<f64> = total.into_iter().map(round_cents).collect();
        info!(
            categories = per_category.len(),
            degraded = degraded.len(),
            horizon,
            "batch forecast complete"
        );

        BatchOutcome {
            per_category,
            total,
            degraded,
        }
    }
}
