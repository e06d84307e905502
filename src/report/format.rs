//! Formatted terminal output.
//!
//! Formatting lives in one place so the forecasting code stays free of
//! presentation concerns and output changes stay localized.

use chrono::Month;

use crate::domain::{BatchOutcome, BudgetTier, ForecastContext, ForecastOutcome, ForecastSource};
use crate::forecast::{FallbackMethod, calendar_index};
use crate::io::RELIABLE_HORIZON;

/// Format a single-series forecast with one row per step.
pub fn format_forecast(
    outcome: &ForecastOutcome,
    ctx: &ForecastContext,
    history_len: usize,
    start_month: u32,
) -> String {
    let mut out = String::new();

    out.push_str("=== spendcast - Spend Forecast ===\n");
    out.push_str(&format!(
        "Category: {}\n",
        ctx.category.as_deref().unwrap_or("(uncategorized)")
    ));
    out.push_str(&format!(
        "Profile: {} | Budget: {:.2} ({})\n",
        ctx.user_profile.label(),
        ctx.budget,
        BudgetTier::for_budget(ctx.budget).label()
    ));
    out.push_str(&format!(
        "History: n={history_len} | Source: {}\n",
        source_label(outcome.source, history_len)
    ));
    if outcome.degraded {
        out.push_str("Note: model unavailable for this series; statistical fallback used.\n");
    }
    if outcome.predictions.len() > RELIABLE_HORIZON {
        out.push_str(&format!(
            "Note: horizons beyond {RELIABLE_HORIZON} months are extrapolations.\n"
        ));
    }
    out.push('\n');

    out.push_str(&format!("{:>4} {:<10} {:>12}\n", "step", "month", "forecast"));
    out.push_str(&format!("{:-<4} {:-<10} {:-<12}\n", "", "", ""));
    for (i, v) in outcome.predictions.iter().enumerate() {
        out.push_str(&format!(
            "{:>4} {:<10} {:>12.2}\n",
            i + 1,
            month_name(calendar_index(start_month, i)),
            v
        ));
    }
    if !outcome.predictions.is_empty() {
        let sum: f64 = outcome.predictions.iter().sum();
        out.push_str(&format!("{:>4} {:<10} {:>12.2}\n", "", "sum", sum));
    }

    out
}

/// Format a batch forecast as a step-by-category table with totals.
pub fn format_batch(outcome: &BatchOutcome, ctx: &ForecastContext, start_month: u32) -> String {
    let mut out = String::new();

    out.push_str("=== spendcast - Batch Forecast ===\n");
    out.push_str(&format!(
        "Profile: {} | Budget: {:.2} ({})\n",
        ctx.user_profile.label(),
        ctx.budget,
        BudgetTier::for_budget(ctx.budget).label()
    ));
    out.push_str(&format!("Categories: {}\n", outcome.per_category.len()));
    if !outcome.degraded.is_empty() {
        out.push_str(&format!("Degraded: {}\n", outcome.degraded.join(", ")));
    }
    out.push('\n');

    let mut header = format!("{:<10}", "month");
    let mut rule = format!("{:-<10}", "");
    for name in outcome.per_category.keys() {
        header.push_str(&format!(" {:>14}", truncate(name, 14)));
        rule.push_str(&format!(" {:-<14}", ""));
    }
    header.push_str(&format!(" {:>14}", "total"));
    rule.push_str(&format!(" {:-<14}", ""));
    out.push_str(&header);
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    for (i, total) in outcome.total.iter().enumerate() {
        let mut row = format!("{:<10}", month_name(calendar_index(start_month, i)));
        for series in outcome.per_category.values() {
            let v = series.get(i).copied().unwrap_or(0.0);
            row.push_str(&format!(" {v:>14.2}"));
        }
        row.push_str(&format!(" {total:>14.2}"));
        out.push_str(&row);
        out.push('\n');
    }

    out
}

fn source_label(source: ForecastSource, history_len: usize) -> &'static str {
    match source {
        ForecastSource::Model => "model",
        ForecastSource::Fallback => FallbackMethod::for_len(history_len).display_name(),
        ForecastSource::Empty => "empty input",
    }
}

fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("?")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn forecast_rows_follow_calendar() {
        let outcome = ForecastOutcome {
            predictions: vec![1000.0, 1010.5],
            source: ForecastSource::Model,
            degraded: false,
        };
        let ctx = ForecastContext::for_category("Rent");
        let text = format_forecast(&outcome, &ctx, 3, 12);
        assert!(text.contains("Category: Rent"));
        assert!(text.contains("December"));
        assert!(text.contains("January"));
        assert!(text.contains("2010.50"));
        assert!(!text.contains("Note:"));
    }

    #[test]
    fn degraded_fallback_is_called_out() {
        let outcome = ForecastOutcome {
            predictions: vec![500.0],
            source: ForecastSource::Fallback,
            degraded: true,
        };
        let text = format_forecast(&outcome, &ForecastContext::default(), 6, 1);
        assert!(text.contains("double exponential smoothing"));
        assert!(text.contains("fallback used"));
    }

    #[test]
    fn batch_table_has_total_column_and_degraded_list() {
        let mut per_category = BTreeMap::new();
        per_category.insert("Food".to_string(), vec![10.0, 20.0]);
        per_category.insert("A very long category name".to_string(), vec![1.0, 2.0]);
        let outcome = BatchOutcome {
            per_category,
            total: vec![11.0, 22.0],
            degraded: vec!["Food".to_string()],
        };
        let text = format_batch(&outcome, &ForecastContext::default(), 3);
        assert!(text.contains("total"));
        assert!(text.contains("Degraded: Food"));
        assert!(text.contains("A very long c."));
        assert!(text.contains("March"));
        assert!(text.contains("22.00"));
    }
}
