//! Multi-step forecast loop.
//!
//! For each step `i` in `0..horizon`:
//!
//! 1. build the evolving input series (true history, then prior forecasts
//!    pulled toward the recent true mean)
//! 2. derive features for the target calendar month
//! 3. predict through the model oracle
//! 4. apply the seeded jitter (steps after the first)
//! 5. apply guardrails against the true history and append
//!
//! A model failure at any step abandons the model path for the whole series
//! and the fallback forecaster answers instead. Callers always get `horizon`
//! non-negative values.

use std::sync::Arc;

use chrono::{Datelike, Local};
use tracing::{debug, warn};

use crate::domain::{ForecastContext, ForecastOutcome, ForecastSource};
use crate::error::AppError;
use crate::features::derive_features;
use crate::forecast::cancel::{CancelFlag, Interrupted};
use crate::forecast::fallback::{FallbackMethod, SmoothingParams, fallback_forecast};
use crate::forecast::guardrail::{CategoryClassifier, GuardrailPolicy, StepCategories, apply_guardrails};
use crate::forecast::jitter::JitterPolicy;
use crate::forecast::step::predict_step;
use crate::math::{mean, tail};
use crate::oracle::ModelBundle;

/// Tunable constants for the whole pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPolicy {
    pub guardrail: GuardrailPolicy,
    pub jitter: JitterPolicy,
    pub smoothing: SmoothingParams,
    /// Weight of the recent true mean when feeding a forecast back in.
    pub blend_anchor_weight: f64,
    /// True points required before forecasts are blended.
    pub blend_min_history: usize,
    /// True points required before the model path is attempted.
    pub min_model_history: usize,
}

impl Default for ForecastPolicy {
    fn default() -> Self {
        Self {
            guardrail: GuardrailPolicy::default(),
            jitter: JitterPolicy::default(),
            smoothing: SmoothingParams::default(),
            blend_anchor_weight: 0.85,
            blend_min_history: 3,
            min_model_history: 3,
        }
    }
}

enum LoopError {
    Model { step: usize, error: AppError },
    Interrupted(Interrupted),
}

/// Forecasting core. Holds only immutable state, so one instance can serve
/// any number of requests (and threads) concurrently.
#[derive(Clone)]
pub struct SpendForecaster {
    model: Option<ModelBundle>,
    classifier: Arc<dyn CategoryClassifier>,
    policy: ForecastPolicy,
}

impl SpendForecaster {
    pub fn new(
        model: Option<ModelBundle>,
        classifier: Arc<dyn CategoryClassifier>,
        policy: ForecastPolicy,
    ) -> Self {
        Self {
            model,
            classifier,
            policy,
        }
    }

    /// Model-backed forecaster with default policy and step categories.
    pub fn with_model(model: ModelBundle) -> Self {
        Self::new(
            Some(model),
            Arc::new(StepCategories::default()),
            ForecastPolicy::default(),
        )
    }

    /// Statistical-only forecaster.
    pub fn fallback_only() -> Self {
        Self::new(None, Arc::new(StepCategories::default()), ForecastPolicy::default())
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Forecast `horizon` months after `history`.
    pub fn forecast(&self, history: &[f64], horizon: usize, ctx: &ForecastContext) -> ForecastOutcome {
        let never = CancelFlag::new();
        match self.forecast_with_cancel(history, horizon, ctx, &never) {
            Ok(outcome) => outcome,
            // A flag nobody else holds cannot be raised.
            Err(_) => self.fallback_outcome(history, horizon, ctx.category.as_deref(), true),
        }
    }

    /// Like [`forecast`](Self::forecast) but stops between steps once `cancel`
    /// is raised, returning the steps already produced.
    pub fn forecast_with_cancel(
        &self,
        history: &[f64],
        horizon: usize,
        ctx: &ForecastContext,
        cancel: &CancelFlag,
    ) -> Result<ForecastOutcome, Interrupted> {
        if history.is_empty() || horizon == 0 {
            return Ok(ForecastOutcome::zeros(horizon));
        }
        let category = ctx.category.as_deref();

        let Some(bundle) = &self.model else {
            debug!(category = category.unwrap_or("-"), "no model loaded, using fallback");
            return Ok(self.fallback_outcome(history, horizon, category, true));
        };

        if history.len() < self.policy.min_model_history {
            debug!(
                category = category.unwrap_or("-"),
                n = history.len(),
                min = self.policy.min_model_history,
                "history too short for model, using fallback"
            );
            return Ok(self.fallback_outcome(history, horizon, category, false));
        }

        match self.model_loop(bundle, history, horizon, ctx, cancel) {
            Ok(predictions) => Ok(ForecastOutcome {
                predictions,
                source: ForecastSource::Model,
                degraded: false,
            }),
            Err(LoopError::Interrupted(interrupted)) => Err(interrupted),
            Err(LoopError::Model { step, error }) => {
                warn!(
                    category = category.unwrap_or("-"),
                    step,
                    error = %error,
                    "model path failed, using fallback for the whole series"
                );
                Ok(self.fallback_outcome(history, horizon, category, true))
            }
        }
    }

    fn model_loop(
        &self,
        bundle: &ModelBundle,
        history: &[f64],
        horizon: usize,
        ctx: &ForecastContext,
        cancel: &CancelFlag,
    ) -> Result<Vec<f64>, LoopError> {
        let category = ctx.category.as_deref();
        let start_month = ctx.start_month.unwrap_or_else(default_start_month);
        let mut produced = Vec::with_capacity(horizon);

        for step in 0..horizon {
            let month = calendar_index(start_month, step);
            let series = evolving_series(history, &produced, &self.policy);

            let features = derive_features(&series, month, ctx)
                .map_err(|error| LoopError::Model { step, error })?;
            let raw = predict_step(bundle, &features).map_err(|error| LoopError::Model { step, error })?;

            let jittered = raw * self.policy.jitter.factor(step);
            let value = apply_guardrails(
                jittered,
                history,
                category,
                self.classifier.as_ref(),
                &self.policy.guardrail,
            );
            debug!(step, month, raw, value, "forecast step");
            produced.push(value);

            if cancel.is_cancelled() && produced.len() < horizon {
                return Err(LoopError::Interrupted(Interrupted {
                    completed: produced,
                    horizon,
                }));
            }
        }

        Ok(produced)
    }

    fn fallback_outcome(
        &self,
        history: &[f64],
        horizon: usize,
        category: Option<&str>,
        degraded: bool,
    ) -> ForecastOutcome {
        let method = FallbackMethod::for_len(history.len());
        debug!(method = method.display_name(), horizon, "fallback forecast");

        let predictions = fallback_forecast(history, horizon, &self.policy.smoothing)
            .into_iter()
            .map(|v| {
                apply_guardrails(
                    v,
                    history,
                    category,
                    self.classifier.as_ref(),
                    &self.policy.guardrail,
                )
            })
            .collect();

        ForecastOutcome {
            predictions,
            source: ForecastSource::Fallback,
            degraded,
        }
    }
}

/// Series the features are derived from at the next step.
///
/// With enough true history each prior forecast `p` is fed back as
/// `w·mean(last 3 true) + (1 − w)·p`, which damps compounding drift; with a
/// short history the forecasts are appended unchanged.
pub fn evolving_series(history: &[f64], produced: &[f64], policy: &ForecastPolicy) -> Vec<f64> {
    let mut series = Vec::with_capacity(history.len() + produced.len());
    series.extend_from_slice(history);

    let anchor = if history.len() >= policy.blend_min_history {
        mean(tail(history, 3))
    } else {
        None
    };

    match anchor {
        Some(anchor) => {
            let w = policy.blend_anchor_weight;
            series.extend(produced.iter().map(|p| w * anchor + (1.0 - w) * p));
        }
        None => series.extend_from_slice(produced),
    }
    series
}

/// Calendar month (1–12) targeted by `step`, counting from `start_month`.
pub fn calendar_index(start_month: u32, step: usize) -> u32 {
    let start = start_month.clamp(1, 12) - 1;
    // step % 12 < 12, so the cast is lossless.
    (start + (step % 12) as u32) % 12 + 1
}

/// The month after the current local month.
pub fn default_start_month() -> u32 {
    Local::now().month() % 12 + 1
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::features::FeatureSchema;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(
            ["lag_1", "Rolling3", "month_sin", "Category_Rent"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap()
    }

    /// Stub that predicts `lag_1 * scale` in log space.
    fn scaled_lag(scale: f64) -> SpendForecaster {
        let oracle = move |x: &[f64]| -> Result<f64, AppError> { Ok(x[0] * scale) };
        SpendForecaster::with_model(ModelBundle::new(schema(), Arc::new(oracle)))
    }

    fn failing() -> SpendForecaster {
        let oracle = |_: &[f64]| -> Result<f64, AppError> { Err(AppError::new(4, "model offline")) };
        SpendForecaster::with_model(ModelBundle::new(schema(), Arc::new(oracle)))
    }

    fn ctx(category: &str) -> ForecastContext {
        ForecastContext::for_category(category).with_start_month(1)
    }

    #[test]
    fn output_length_matches_horizon() {
        let f = scaled_lag(1.0);
        for h in 1..=14 {
            let out = f.forecast(&[100.0, 120.0, 110.0, 130.0], h, &ctx("Food"));
            assert_eq!(out.predictions.len(), h);
            assert_eq!(out.source, ForecastSource::Model);
        }
    }

    #[test]
    fn empty_history_or_zero_horizon_gives_zeros() {
        let f = scaled_lag(1.0);
        let out = f.forecast(&[], 4, &ForecastContext::default());
        assert_eq!(out.predictions, vec![0.0; 4]);
        assert_eq!(out.source, ForecastSource::Empty);
        assert!(f.forecast(&[100.0], 0, &ForecastContext::default()).predictions.is_empty());
    }

    #[test]
    fn rent_example_stays_within_fifteen_percent() {
        // Oracle wildly overshoots; guardrails must hold every step.
        let f = scaled_lag(1.5);
        let out = f.forecast(&[1000.0, 1100.0, 1050.0], 3, &ctx("Rent"));
        assert_eq!(out.predictions.len(), 3);
        for v in &out.predictions {
            assert!(*v >= 1050.0 * 0.85 - 1e-9 && *v <= 1050.0 * 1.15 + 1e-9, "{v}");
        }
    }

    #[test]
    fn step_category_with_zero_last_actual_is_not_clamped() {
        let oracle = |_: &[f64]| -> Result<f64, AppError> { Ok(5000.0_f64.ln_1p()) };
        let f = SpendForecaster::new(
            Some(ModelBundle::new(schema(), Arc::new(oracle))),
            Arc::new(StepCategories::default()),
            ForecastPolicy {
                jitter: JitterPolicy::disabled(),
                ..ForecastPolicy::default()
            },
        );
        let out = f.forecast(&[1000.0, 1000.0, 0.0], 2, &ctx("Rent"));
        for v in &out.predictions {
            assert!((v - 5000.0).abs() < 0.01, "{v}");
        }
    }

    #[test]
    fn variable_category_stays_within_recent_mean_band() {
        let history = [400.0, 90.0, 100.0, 110.0];
        let m = 100.0;
        for scale in [0.2, 1.0, 3.0] {
            let out = scaled_lag(scale).forecast(&history, 6, &ctx("Shopping"));
            for v in &out.predictions {
                assert!(*v >= 0.3 * m && *v <= 2.0 * m, "scale {scale}: {v}");
            }
        }
    }

    #[test]
    fn identical_inputs_are_reproducible() {
        let f = scaled_lag(1.02);
        let a = f.forecast(&[300.0, 320.0, 310.0, 305.0], 6, &ctx("Food"));
        let b = f.forecast(&[300.0, 320.0, 310.0, 305.0], 6, &ctx("Food"));
        assert_eq!(a, b);
    }

    #[test]
    fn jitter_only_touches_later_steps() {
        let history = [300.0, 320.0, 310.0, 305.0];
        let with = scaled_lag(1.0).forecast(&history, 3, &ctx("Food"));
        let without = SpendForecaster::new(
            scaled_lag(1.0).model.clone(),
            Arc::new(StepCategories::default()),
            ForecastPolicy {
                jitter: JitterPolicy::disabled(),
                ..ForecastPolicy::default()
            },
        )
        .forecast(&history, 3, &ctx("Food"));
        assert_eq!(with.predictions[0], without.predictions[0]);
        assert_ne!(with.predictions[1..], without.predictions[1..]);
    }

    #[test]
    fn oracle_failure_degrades_to_fallback() {
        let out = failing().forecast(&[500.0, 520.0, 480.0, 510.0, 530.0, 500.0], 2, &ctx("Food"));
        assert_eq!(out.source, ForecastSource::Fallback);
        assert!(out.degraded);
        assert_eq!(out.predictions.len(), 2);
        assert!(out.predictions.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn failure_mid_loop_replaces_whole_series() {
        let calls = AtomicUsize::new(0);
        let oracle = move |x: &[f64]| -> Result<f64, AppError> {
            if calls.fetch_add(1, Ordering::SeqCst) >= 1 {
                return Err(AppError::new(4, "second call fails"));
            }
            Ok(x[0])
        };
        let f = SpendForecaster::with_model(ModelBundle::new(schema(), Arc::new(oracle)));
        let history = [100.0, 200.0, 300.0];
        let out = f.forecast(&history, 3, &ctx("Food"));
        assert_eq!(out.source, ForecastSource::Fallback);

        let expected = SpendForecaster::fallback_only().forecast(&history, 3, &ctx("Food"));
        assert_eq!(out.predictions, expected.predictions);
    }

    #[test]
    fn missing_model_uses_smoothing_for_six_points() {
        let history = [500.0, 520.0, 480.0, 510.0, 530.0, 500.0];
        let out = SpendForecaster::fallback_only().forecast(&history, 2, &ForecastContext::default());
        assert_eq!(out.source, ForecastSource::Fallback);
        assert!(out.degraded);
        assert_eq!(out.predictions.len(), 2);
        assert!(out.predictions.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn short_history_uses_fallback_without_degrading() {
        let out = scaled_lag(1.0).forecast(&[100.0, 200.0], 2, &ForecastContext::default());
        assert_eq!(out.source, ForecastSource::Fallback);
        assert!(!out.degraded);
        assert_eq!(out.predictions, vec![150.0, 150.0]);
    }

    #[test]
    fn loop_feeds_blended_forecasts_back() {
        let seen: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let oracle = move |x: &[f64]| -> Result<f64, AppError> {
            if let Ok(mut v) = sink.lock() {
                v.push(x[0]);
            }
            Ok(1000.0_f64.ln_1p())
        };
        let f = SpendForecaster::new(
            Some(ModelBundle::new(schema(), Arc::new(oracle))),
            Arc::new(StepCategories::new(Vec::<String>::new())),
            ForecastPolicy {
                jitter: JitterPolicy::disabled(),
                ..ForecastPolicy::default()
            },
        );
        let history = [100.0, 100.0, 100.0];
        let out = f.forecast(&history, 2, &ForecastContext::default().with_start_month(5));

        // Variable band caps the first forecast at 2 * 100.
        assert_eq!(out.predictions[0], 200.0);
        let lags = seen.lock().unwrap().clone();
        assert!((lags[0] - 100.0_f64.ln_1p()).abs() < 1e-12);
        // 0.85 * 100 + 0.15 * 200 = 115
        assert!((lags[1] - 115.0_f64.ln_1p()).abs() < 1e-9);
    }

    #[test]
    fn cancellation_keeps_completed_steps() {
        let cancel = CancelFlag::new();
        let trigger = cancel.clone();
        let oracle = move |x: &[f64]| -> Result<f64, AppError> {
            trigger.cancel();
            Ok(x[0])
        };
        let f = SpendForecaster::with_model(ModelBundle::new(schema(), Arc::new(oracle)));
        let err = f
            .forecast_with_cancel(&[100.0, 110.0, 120.0], 5, &ctx("Food"), &cancel)
            .unwrap_err();
        assert_eq!(err.horizon, 5);
        assert_eq!(err.completed.len(), 1);
        let uncancelled = scaled_lag(1.0).forecast(&[100.0, 110.0, 120.0], 5, &ctx("Food"));
        assert_eq!(err.completed[0], uncancelled.predictions[0]);
    }

    #[test]
    fn evolving_series_without_enough_history_appends_raw() {
        let p = ForecastPolicy::default();
        assert_eq!(evolving_series(&[10.0, 20.0], &[30.0], &p), vec![10.0, 20.0, 30.0]);
        let blended = evolving_series(&[10.0, 20.0, 30.0], &[40.0], &p);
        assert!((blended[3] - (0.85 * 20.0 + 0.15 * 40.0)).abs() < 1e-12);
    }

    #[test]
    fn calendar_index_wraps() {
        assert_eq!(calendar_index(11, 0), 11);
        assert_eq!(calendar_index(11, 1), 12);
        assert_eq!(calendar_index(11, 2), 1);
        assert_eq!(calendar_index(1, 24), 1);
        assert!((1..=12).contains(&default_start_month()));
    }
}
