//! Feature derivation for one forecast step.
//!
//! All series statistics are computed on `ln(1 + amount)`, the same
//! variance-stabilizing transform the model was trained on. The model output
//! is therefore in log space and must be inverted with `expm1` by the caller.
//!
//! Short histories never fail: lags fall back to `lag_1`, rolling windows
//! shrink or reuse the next smaller window, and dispersion/trend features
//! become 0 when their window is not available.

use std::f64::consts::PI;

use crate::domain::{BudgetTier, ForecastContext, UserProfile};
use crate::error::AppError;
use crate::features::schema::FeatureMap;
use crate::math::{mean, median, sample_std, tail};

/// Denominator guard for ratios.
pub const EPS: f64 = 1e-6;

/// Calendar months treated as festival season.
const FESTIVAL_MONTHS: [u32; 3] = [10, 11, 12];

/// Derive the named feature set for predicting the month after `series`.
///
/// `series` holds raw amounts (oldest first); `month` is the calendar index
/// (1–12) of the month being predicted.
pub fn derive_features(
    series: &[f64],
    month: u32,
    ctx: &ForecastContext,
) -> Result<FeatureMap, AppError> {
    let Some(&latest_raw) = series.last() else {
        return Err(AppError::new(3, "Cannot derive features from an empty series."));
    };

    let s: Vec<f64> = series.iter().map(|v| v.max(0.0).ln_1p()).collect();
    let n = s.len();
    let lag1 = s[n - 1];
    let lag = |k: usize| if n >= k { s[n - k] } else { lag1 };

    let rolling3 = mean(tail(&s, 3)).unwrap_or(lag1);
    let rolling6 = if n >= 6 { mean(tail(&s, 6)).unwrap_or(rolling3) } else { rolling3 };
    let rolling12 = if n >= 12 { mean(tail(&s, 12)).unwrap_or(rolling6) } else { rolling6 };
    let volatility6 = if n >= 6 { sample_std(tail(&s, 6)).unwrap_or(0.0) } else { 0.0 };
    let trend3 = if n >= 4 { lag1 - s[n - 4] } else { 0.0 };
    let pct_change = if n >= 2 {
        (lag1 - s[n - 2]) / (s[n - 2] + EPS)
    } else {
        0.0
    };
    let month_total: f64 = tail(&s, 3).iter().sum();

    let mut f = FeatureMap::new();
    let mut set = |name: &str, value: f64| {
        f.insert(name.to_string(), value);
    };

    set("lag_1", lag1);
    set("lag_2", lag(2));
    set("lag_3", lag(3));
    set("lag_12", lag(12));
    set("Rolling3", rolling3);
    set("Rolling6", rolling6);
    set("Rolling12", rolling12);
    set("Rolling3_Median", median(tail(&s, 3)).unwrap_or(lag1));
    set("Volatility_6", volatility6);
    set("trend_3", trend3);
    set("pct_change", pct_change);
    set("month_total", month_total);
    set("category_ratio", lag1 / (month_total + EPS));

    let angle = 2.0 * PI * f64::from(month) / 12.0;
    set("month_num", f64::from(month));
    set("month_sin", angle.sin());
    set("month_cos", angle.cos());
    set(
        "is_festival_season",
        if FESTIVAL_MONTHS.contains(&month) { 1.0 } else { 0.0 },
    );

    let budget = ctx.budget.max(0.0);
    let log_budget = budget.ln_1p();
    set("TotalBudget", budget);
    set("log_total_budget", log_budget);
    set("spend_ratio", latest_raw.max(0.0).ln_1p() / (log_budget + EPS));

    let tier = BudgetTier::for_budget(budget);
    for t in BudgetTier::ALL {
        set(
            &format!("budget_category_{}", t.label()),
            if t == tier { 1.0 } else { 0.0 },
        );
    }

    for p in UserProfile::ALL {
        set(
            &format!("UserType_{}", p.label()),
            if p == ctx.user_profile { 1.0 } else { 0.0 },
        );
    }

    if let Some(category) = ctx.category.as_deref() {
        set(&format!("Category_{category}"), 1.0);
    }

    Ok(f)
}
