//! Post-prediction guardrails.
//!
//! Two policies, chosen per category:
//!
//! - **step** categories (near-fixed obligations such as rent) may move at most
//!   `max_change_pct` away from the last actual value
//! - **variable** categories are kept within a wide band around the mean of the
//!   last three actual values
//!
//! Bounds always come from the *true* history, never from earlier forecasts, so
//! a multi-step forecast cannot walk itself out of the band.

use std::collections::HashSet;

use tracing::debug;

use crate::math::{mean, round_cents, tail};

/// Categories treated as step categories when nothing else is configured.
pub const DEFAULT_STEP_CATEGORIES: [&str; 2] = ["Rent", "Personal Care"];

/// Decides which guardrail policy a category gets.
pub trait CategoryClassifier: Send + Sync {
    fn is_step(&self, category: &str) -> bool;
}

/// Case-insensitive set of step category names.
#[derive(Debug, Clone)]
pub struct StepCategories {
    names: HashSet<String>,
}

impl StepCategories {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        Self { names }
    }

    /// Parse a comma-separated list (`"Rent, Insurance"`).
    pub fn parse_list(list: &str) -> Self {
        Self::new(list.split(','))
    }
}

impl Default for StepCategories {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_CATEGORIES)
    }
}

impl CategoryClassifier for StepCategories {
    fn is_step(&self, category: &str) -> bool {
        self.names.contains(&category.trim().to_lowercase())
    }
}

/// Guardrail constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardrailPolicy {
    /// Maximum relative move from the last actual for step categories.
    pub max_change_pct: f64,
    /// Lower band multiplier on the recent mean for variable categories.
    pub variable_floor: f64,
    /// Upper band multiplier on the recent mean for variable categories.
    pub variable_ceiling: f64,
    /// Actual points required before the variable band applies.
    pub variable_min_history: usize,
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self {
            max_change_pct: 0.15,
            variable_floor: 0.3,
            variable_ceiling: 2.0,
            variable_min_history: 3,
        }
    }
}

/// Bounds a prediction may take, `None` when unconstrained.
pub fn guardrail_bounds(
    history: &[f64],
    category: Option<&str>,
    classifier: &dyn CategoryClassifier,
    policy: &GuardrailPolicy,
) -> Option<(f64, f64)> {
    let is_step = category.is_some_and(|c| classifier.is_step(c));

    if is_step {
        let last = *history.last()?;
        if last <= 0.0 {
            // Nothing to anchor to; trust the model.
            return None;
        }
        return Some((
            last * (1.0 - policy.max_change_pct),
            last * (1.0 + policy.max_change_pct),
        ));
    }

    if history.len() < policy.variable_min_history {
        return None;
    }
    let recent = mean(tail(history, 3))?;
    Some((recent * policy.variable_floor, recent * policy.variable_ceiling))
}

/// Shrink a band to whole cents so rounding a clamped value cannot leave it.
///
/// Bounds already on a cent (up to float noise) are kept as they are.
fn cent_bounds(lo: f64, hi: f64) -> (f64, f64) {
    const SNAP: f64 = 1e-6;
    let lo_c = (lo * 100.0 - SNAP).ceil() / 100.0;
    let hi_c = (hi * 100.0 + SNAP).floor() / 100.0;
    if lo_c <= hi_c { (lo_c, hi_c) } else { (lo_c, lo_c) }
}

/// Clamp `raw` into the category's band, floor at 0, and round to cents.
///
/// The band is narrowed to whole cents first, so the rounded result still
/// lies inside it.
pub fn apply_guardrails(
    raw: f64,
    history: &[f64],
    category: Option<&str>,
    classifier: &dyn CategoryClassifier,
    policy: &GuardrailPolicy,
) -> f64 {
    let raw = if raw.is_finite() { raw.max(0.0) } else { 0.0 };
    let guarded = match guardrail_bounds(history, category, classifier, policy) {
        Some((lo, hi)) => {
            let (lo, hi) = cent_bounds(lo, hi);
            let clamped = raw.clamp(lo, hi);
            if clamped != raw {
                debug!(
                    category = category.unwrap_or("-"),
                    raw,
                    clamped,
                    lower = lo,
                    upper = hi,
                    "prediction clamped"
                );
            }
            clamped
        }
        None => raw,
    };
    round_cents(guarded.max(0.0))
}
