//! Small descriptive statistics over `f64` slices.
//!
//! Every helper tolerates empty input (returning `None` or `0.0`) so the
//! feature pipeline can degrade on short histories without special cases.

/// Last `n` values of `values` (fewer if the slice is shorter).
pub fn tail(values: &[f64], n: usize) -> &[f64] {
    &values[values.len().saturating_sub(n)..]
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median without mutating the caller's data.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Sample standard deviation (n - 1 denominator). Needs at least two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    Some(var.sqrt())
}

/// Round to two decimal places (currency precision).
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_shrinks_on_short_input() {
        assert_eq!(tail(&[1.0, 2.0], 3), &[1.0, 2.0]);
        assert_eq!(tail(&[1.0, 2.0, 3.0, 4.0], 3), &[2.0, 3.0, 4.0]);
        assert!(tail(&[], 3).is_empty());
    }

    #[test]
    fn median_handles_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn sample_std_matches_known_value() {
        // mean 5, squared deviations sum to 32, / 7 -> 4.571..
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let s = sample_std(&v).unwrap();
        assert!((s - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(sample_std(&[1.0]), None);
    }

    #[test]
    fn round_cents_keeps_two_decimals() {
        assert_eq!(round_cents(1207.4999), 1207.5);
        assert_eq!(round_cents(10.126), 10.13);
    }
}
