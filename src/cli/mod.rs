//! Command-line parsing for the spend forecaster.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! forecasting code; `app` turns these structs into settings and requests.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::UserProfile;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "spendcast", version, about = "Monthly spend forecaster")]
pub struct Cli {
    /// Model bundle JSON (overrides SPENDCAST_MODEL_PATH).
    #[arg(long, global = true, value_name = "JSON")]
    pub model: Option<PathBuf>,

    /// Skip the model entirely and use statistical extrapolation.
    #[arg(long, global = true)]
    pub fallback_only: bool,

    /// Disable the seeded step-to-step jitter.
    #[arg(long, global = true)]
    pub no_jitter: bool,

    /// Base seed for the jitter generator.
    #[arg(long, global = true)]
    pub jitter_seed: Option<u64>,

    /// Comma-separated step categories (default: "Rent,Personal Care").
    #[arg(long, global = true, value_name = "LIST")]
    pub step_categories: Option<String>,

    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Forecast one category's monthly spend.
    Forecast(ForecastArgs),
    /// Forecast several categories and their total.
    ///
    /// Input is either a batch request JSON or a transaction CSV export
    /// (`Date, Amount, Category, Type`) aggregated to monthly totals.
    Batch(BatchArgs),
    /// Show the loaded model's feature schema.
    Schema(SchemaArgs),
}

/// Request context shared by `forecast` and `batch`.
#[derive(Debug, Args, Clone, Default)]
pub struct ContextArgs {
    /// Months to forecast (non-positive yields an empty forecast).
    #[arg(long, allow_negative_numbers = true)]
    pub horizon: Option<i64>,

    /// Total monthly budget.
    #[arg(long)]
    pub budget: Option<f64>,

    /// User profile.
    #[arg(long, value_enum)]
    pub profile: Option<UserProfile>,

    /// Calendar month (1-12) of the first forecast step (default: next month).
    #[arg(long)]
    pub start_month: Option<u32>,

    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,

    /// Also write the forecast to a CSV file.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    /// Monthly amounts, oldest first ("1000,1100,1050").
    #[arg(long, conflicts_with = "request", required_unless_present = "request")]
    pub series: Option<String>,

    /// Forecast request JSON; flags below override its fields.
    #[arg(long, value_name = "JSON")]
    pub request: Option<PathBuf>,

    /// Spend category (selects the guardrail policy).
    #[arg(long)]
    pub category: Option<String>,

    /// Stop after this many milliseconds, keeping completed steps.
    #[arg(long, value_name = "MS")]
    pub deadline_ms: Option<u64>,

    #[command(flatten)]
    pub context: ContextArgs,
}

#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    /// Batch request JSON; flags below override its fields.
    #[arg(long, value_name = "JSON", conflicts_with = "csv", required_unless_present = "csv")]
    pub request: Option<PathBuf>,

    /// Transaction CSV export.
    #[arg(long, value_name = "CSV")]
    pub csv: Option<PathBuf>,

    /// Infer budget and profile from the histories when not given.
    #[arg(long)]
    pub detect_profile: bool,

    #[command(flatten)]
    pub context: ContextArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SchemaArgs {
    /// Category used when checking which schema features are derived.
    #[arg(long)]
    pub category: Option<String>,

    /// Print JSON instead of a list.
    #[arg(long)]
    pub json: bool,
}
