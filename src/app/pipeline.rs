//! Shared forecast workflows used by the CLI handlers.
//!
//! Input decoding happens in `app`; presentation happens in `report`. These
//! functions only resolve the request context and drive the forecaster.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{
    BatchOutcome, BatchRequest, ForecastContext, ForecastOutcome, ForecastRequest, ForecastSource, horizon_steps,
};
use crate::error::AppError;
use crate::features::derive_features;
use crate::forecast::{CancelFlag, SpendForecaster, default_start_month, detect_profile};
use crate::oracle::ModelBundle;

/// Horizon used when neither a flag nor a request supplies one.
pub const DEFAULT_HORIZON: i64 = 1;

/// A single-series forecast together with the context it ran under.
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub outcome: ForecastOutcome,
    /// Context with the start month resolved.
    pub context: ForecastContext,
    pub history_len: usize,
    pub start_month: u32,
    /// Set when the deadline stopped the loop; `outcome` then holds the
    /// completed prefix.
    pub interrupted: Option<AppError>,
}

/// A batch forecast together with the context it ran under.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub outcome: BatchOutcome,
    pub context: ForecastContext,
    pub start_month: u32,
}

/// One schema entry and whether the feature deriver produces it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaEntry {
    pub position: usize,
    pub name: String,
    /// `false` means the model always sees 0.0 here.
    pub derived: bool,
}

/// Fix the start month so the forecast and its report agree on the calendar.
pub fn resolve_start_month(ctx: &mut ForecastContext) -> u32 {
    let month = ctx.start_month.unwrap_or_else(default_start_month);
    ctx.start_month = Some(month);
    month
}

/// Forecast one request, optionally stopping after `deadline`.
pub fn run_forecast(
    forecaster: &SpendForecaster,
    request: &ForecastRequest,
    deadline: Option<Duration>,
) -> ForecastRun {
    let history = &request.series;
    let steps = horizon_steps(request.horizon);
    let mut context = request.context();
    let start_month = resolve_start_month(&mut context);

    let cancel = CancelFlag::new();
    let timer = deadline.map(|deadline| arm_deadline(&cancel, deadline));

    let result = forecaster.forecast_with_cancel(history, steps, &context, &cancel);
    if let Some((disarm, handle)) = timer {
        drop(disarm);
        let _ = handle.join();
    }

    let (outcome, interrupted) = match result {
        Ok(outcome) => (outcome, None),
        Err(stopped) => {
            warn!(
                completed = stopped.completed.len(),
                horizon = stopped.horizon,
                "deadline reached, returning completed steps"
            );
            let partial = ForecastOutcome {
                predictions: stopped.completed.clone(),
                source: ForecastSource::Model,
                degraded: false,
            };
            (partial, Some(AppError::from(stopped)))
        }
    };

    info!(
        category = context.category.as_deref().unwrap_or("-"),
        n = history.len(),
        horizon = steps,
        source = ?outcome.source,
        degraded = outcome.degraded,
        "forecast complete"
    );

    ForecastRun {
        outcome,
        context,
        history_len: history.len(),
        start_month,
        interrupted,
    }
}

/// Cancel `cancel` after `deadline` unless the returned sender is dropped
/// first, which wakes the timer thread and lets it exit.
fn arm_deadline(cancel: &CancelFlag, deadline: Duration) -> (Sender<()>, JoinHandle<()>) {
    let (disarm, disarmed) = mpsc::channel::<()>();
    let timer = cancel.clone();
    let handle = thread::spawn(move || {
        if let Err(RecvTimeoutError::Timeout) = disarmed.recv_timeout(deadline) {
            timer.cancel();
        }
    });
    (disarm, handle)
}

/// Forecast every category of a batch request. With `detect_profile`, a
/// missing budget or profile is inferred from the histories.
pub fn run_batch(forecaster: &SpendForecaster, request: &BatchRequest) -> BatchRun {
    let detected = request.detect_profile.then(|| detect_profile(&request.categories));
    if let Some((profile, budget)) = detected {
        info!(profile = profile.label(), budget, "profile detected from history");
    }

    let mut context = ForecastContext {
        budget: request
            .budget
            .or(detected.map(|(_, budget)| budget))
            .unwrap_or(0.0),
        user_profile: request
            .user_profile
            .or(detected.map(|(profile, _)| profile))
            .unwrap_or_default(),
        category: None,
        start_month: request.start_month,
    };
    let start_month = resolve_start_month(&mut context);
    let outcome = forecaster.forecast_batch(&request.categories, horizon_steps(request.horizon), &context);

    BatchRun {
        outcome,
        context,
        start_month,
    }
}

/// List the model's schema and flag features the deriver never produces.
pub fn schema_report(bundle: &ModelBundle, ctx: &ForecastContext) -> Result<Vec<SchemaEntry>, AppError> {
    // A full year of history exercises every rolling window.
    let sample = vec![1.0; 12];
    let features = derive_features(&sample, 1, ctx)?;
    let missing = bundle.schema().missing(&features);
    Ok(bundle
        .schema()
        .names()
        .iter()
        .enumerate()
        .map(|(position, name)| SchemaEntry {
            position,
            name: name.clone(),
            derived: !missing.contains(&name.as_str()),
        })
        .collect())
}
