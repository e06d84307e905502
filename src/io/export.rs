//! Export forecasts to JSON or CSV.
//!
//! JSON mirrors the response shapes; CSV is meant for spreadsheets (one row
//! per forecast step, one column per category).

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::{BatchOutcome, ForecastOutcome};
use crate::error::AppError;

/// Serialize any response shape as pretty JSON into `out`.
pub fn write_json<W: Write, T: Serialize>(out: W, value: &T) -> Result<(), AppError> {
    serde_json::to_writer_pretty(out, value)
        .map_err(|e| AppError::new(2, format!("Failed to write JSON: {e}")))
}

/// Write a single-series forecast as `step,prediction` rows.
pub fn write_forecast_csv(path: &Path, outcome: &ForecastOutcome) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(file, "step,prediction")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;
    for (i, v) in outcome.predictions.iter().enumerate() {
        writeln!(file, "{},{:.2}", i + 1, v)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }
    Ok(())
}

/// Write a batch forecast as `step,<category...>,total` rows.
pub fn write_batch_csv(path: &Path, outcome: &BatchOutcome) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    let mut header = vec!["step".to_string()];
    header.extend(outcome.per_category.keys().map(|k| csv_field(k)));
    header.push("total".to_string());
    writeln!(file, "{}", header.join(","))
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for (i, total) in outcome.total.iter().enumerate() {
        let mut row = vec![(i + 1).to_string()];
        row.extend(
            outcome
                .per_category
                .values()
                .map(|v| v.get(i).map(|x| format!("{x:.2}")).unwrap_or_default()),
        );
        row.push(format!("{total:.2}"));
        writeln!(file, "{}", row.join(","))
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }
    Ok(())
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::ForecastSource;

    #[test]
    fn json_uses_camel_case_response_fields() {
        let mut per_category = BTreeMap::new();
        per_category.insert("Rent".to_string(), vec![1000.0]);
        let outcome = BatchOutcome {
            per_category,
            total: vec![1000.0],
            degraded: Vec::new(),
        };
        let mut buf = Vec::new();
        write_json(&mut buf, &outcome).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\"perCategory\""));
        assert!(text.contains("\"total\""));
    }

    #[test]
    fn batch_csv_has_one_row_per_step() {
        let mut per_category = BTreeMap::new();
        per_category.insert("Food, Drink".to_string(), vec![1.0, 2.0]);
        per_category.insert("Rent".to_string(), vec![10.0, 20.0]);
        let outcome = BatchOutcome {
            per_category,
            total: vec![11.0, 22.0],
            degraded: Vec::new(),
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_batch_csv(&path, &outcome).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "step,\"Food, Drink\",Rent,total");
        assert_eq!(lines[2], "2,2.00,20.00,22.00");
    }

    #[test]
    fn forecast_csv_numbers_steps_from_one() {
        let outcome = ForecastOutcome {
            predictions: vec![5.0, 6.5],
            source: ForecastSource::Model,
            degraded: false,
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.csv");
        write_forecast_csv(&path, &outcome).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "step,prediction\n1,5.00\n2,6.50\n");
    }
}
