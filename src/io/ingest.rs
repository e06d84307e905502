//! CSV expense ingest.
//!
//! Turns a transaction export (`Date, Amount, Category, Type`) into one
//! monthly-total series per category, ready for a batch forecast.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Calendar-complete series**: months without spending become 0 so every
//!   series has one value per elapsed month

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use csv::StringRecord;

use crate::error::AppError;

const REQUIRED_COLUMNS: [&str; 3] = ["date", "amount", "category"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// One accepted expense transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRow {
    pub date: NaiveDate,
    pub amount: f64,
    pub category: String,
}

/// Per-category monthly totals over a contiguous month range.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    pub categories: BTreeMap<String, Vec<f64>>,
    /// First day of the earliest month covered.
    pub first_month: NaiveDate,
    /// First day of the latest month covered.
    pub last_month: NaiveDate,
}

impl MonthlySeries {
    /// Calendar month (1–12) following the last covered month.
    pub fn next_month(&self) -> u32 {
        self.last_month.month() % 12 + 1
    }

    pub fn months(&self) -> usize {
        self.categories.values().map(Vec::len).max().unwrap_or(0)
    }
}

/// Ingest output: monthly series + row diagnostics.
#[derive(Debug, Clone)]
pub struct IngestedExpenses {
    pub series: MonthlySeries,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load an expense CSV and aggregate it into monthly per-category series.
pub fn load_expenses(path: &Path) -> Result<IngestedExpenses, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for col in REQUIRED_COLUMNS {
        if !header_map.contains_key(col) {
            return Err(AppError::new(2, format!("Missing required column: `{col}`")));
        }
    }

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => {} // not an expense
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let rows_used = rows.len();
    let series = aggregate_monthly(&rows)
        .ok_or_else(|| AppError::new(3, "No valid expense rows found in CSV."))?;

    Ok(IngestedExpenses {
        series,
        row_errors,
        rows_read,
        rows_used,
    })
}

/// Sum expenses per (category, month), zero-filling months with no spending.
pub fn aggregate_monthly(rows: &[ExpenseRow]) -> Option<MonthlySeries> {
    let first = rows.iter().map(|r| month_index(r.date)).min()?;
    let last = rows.iter().map(|r| month_index(r.date)).max()?;
    let len = usize::try_from(last - first + 1).ok()?;

    let mut categories: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in rows {
        let slot = usize::try_from(month_index(row.date) - first).ok()?;
        let series = categories
            .entry(row.category.clone())
            .or_insert_with(|| vec![0.0; len]);
        series[slot] += row.amount;
    }

    Some(MonthlySeries {
        categories,
        first_month: month_start(first)?,
        last_month: month_start(last)?,
    })
}

fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

fn month_start(index: i32) -> Option<NaiveDate> {
    let year = index.div_euclid(12);
    let month0 = u32::try_from(index.rem_euclid(12)).ok()?;
    NaiveDate::from_ymd_opt(year, month0 + 1, 1)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            // Spreadsheet exports may carry a BOM on the first header.
            let name = name.trim().trim_start_matches('\u{feff}');
            (name.to_ascii_lowercase(), idx)
        })
        .collect()
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<Option<ExpenseRow>, String> {
    let get = |col: &str| {
        header_map
            .get(col)
            .and_then(|&i| record.get(i))
            .filter(|s| !s.is_empty())
    };

    if let Some(kind) = get("type") {
        if !kind.eq_ignore_ascii_case("expense") {
            return Ok(None);
        }
    }

    let date = parse_date(get("date").ok_or("Missing date.")?)?;
    let raw_amount = get("amount").ok_or("Missing amount.")?;
    let amount = raw_amount
        .parse::<f64>()
        .map_err(|_| format!("Invalid amount '{raw_amount}'."))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("Amount must be a finite non-negative number, got '{raw_amount}'."));
    }
    let category = get("category").ok_or("Missing category.")?.to_string();

    Ok(Some(ExpenseRow {
        date,
        amount,
        category,
    }))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // ISO dates preferred; spreadsheet exports often use day-first formats.
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD."
    ))
}
