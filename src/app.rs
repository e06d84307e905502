//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and layers them over environment settings
//! - sets up logging
//! - decodes and validates the request (flags, JSON, or CSV)
//! - runs the forecast and prints a table or JSON
//! - writes optional exports

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use crate::cli::{BatchArgs, Cli, Command, ContextArgs, ForecastArgs, SchemaArgs};
use crate::config::{Settings, init_tracing};
use crate::domain::{BatchRequest, ForecastContext, ForecastRequest, UserProfile};
use crate::error::AppError;
use crate::io::{
    load_expenses, load_model_bundle, parse_series_list, read_batch_request, read_forecast_request,
    validate_common, write_batch_csv, write_forecast_csv, write_json,
};

pub mod pipeline;

/// Entry point for the `spendcast` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let settings = settings_from_cli(&cli, Settings::from_env()?);
    init_tracing(&settings.log_filter, cli.verbose);

    match cli.command {
        Command::Forecast(args) => handle_forecast(&settings, cli.fallback_only, args),
        Command::Batch(args) => handle_batch(&settings, cli.fallback_only, args),
        Command::Schema(args) => handle_schema(&settings, args),
    }
}

/// CLI flags win over environment values.
pub fn settings_from_cli(cli: &Cli, mut settings: Settings) -> Settings {
    if let Some(model) = &cli.model {
        settings.model_path = Some(model.clone());
    }
    if let Some(list) = &cli.step_categories {
        settings.step_categories = Some(list.clone());
    }
    if cli.no_jitter {
        settings.jitter_enabled = false;
    }
    if let Some(seed) = cli.jitter_seed {
        settings.jitter_seed = seed;
    }
    settings
}

fn handle_forecast(settings: &Settings, fallback_only: bool, args: ForecastArgs) -> Result<(), AppError> {
    let request = forecast_request_from_args(&args)?;
    let forecaster = settings.build_forecaster(fallback_only)?;

    let deadline = args.deadline_ms.map(Duration::from_millis);
    let run = pipeline::run_forecast(&forecaster, &request, deadline);

    if args.context.json {
        print_json(&run.outcome)?;
    } else {
        println!(
            "{}",
            crate::report::format_forecast(&run.outcome, &run.context, run.history_len, run.start_month)
        );
    }
    if let Some(path) = &args.context.export {
        write_forecast_csv(path, &run.outcome)?;
        info!(path = %path.display(), "forecast exported");
    }

    match run.interrupted {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn handle_batch(settings: &Settings, fallback_only: bool, args: BatchArgs) -> Result<(), AppError> {
    let request = batch_request_from_args(&args)?;
    let forecaster = settings.build_forecaster(fallback_only)?;
    let run = pipeline::run_batch(&forecaster, &request);

    if args.context.json {
        print_json(&run.outcome)?;
    } else {
        println!(
            "{}",
            crate::report::format_batch(&run.outcome, &run.context, run.start_month)
        );
    }
    if let Some(path) = &args.context.export {
        write_batch_csv(path, &run.outcome)?;
        info!(path = %path.display(), "batch forecast exported");
    }
    Ok(())
}

fn handle_schema(settings: &Settings, args: SchemaArgs) -> Result<(), AppError> {
    let path = settings
        .model_path
        .as_deref()
        .ok_or_else(|| AppError::new(2, "No model configured (use --model or SPENDCAST_MODEL_PATH)."))?;
    let bundle = load_model_bundle(path)?;

    let ctx = ForecastContext {
        category: args.category,
        ..ForecastContext::default()
    };
    let entries = pipeline::schema_report(&bundle, &ctx)?;

    if args.json {
        return print_json(&entries);
    }
    println!("Model schema: {} features ({})", entries.len(), path.display());
    for e in &entries {
        let marker = if e.derived { " " } else { "!" };
        println!("{marker} {:>3} {}", e.position, e.name);
    }
    let missing = entries.iter().filter(|e| !e.derived).count();
    if missing > 0 {
        println!("\n! = not derived from history; the model receives 0.0 ({missing} features)");
    }
    Ok(())
}

/// Assemble a forecast request from `--request` and/or flags.
pub fn forecast_request_from_args(args: &ForecastArgs) -> Result<ForecastRequest, AppError> {
    let mut request = match (&args.request, &args.series) {
        (Some(path), _) => read_forecast_request(path)?,
        (None, Some(list)) => ForecastRequest {
            series: parse_series_list(list)?,
            horizon: pipeline::DEFAULT_HORIZON,
            budget: None,
            user_profile: None,
            category: None,
            start_month: None,
        },
        (None, None) => return Err(AppError::new(2, "Provide --series or --request.")),
    };

    if let Some(category) = &args.category {
        request.category = Some(category.clone());
    }
    apply_context(
        &args.context,
        &mut request.horizon,
        &mut request.budget,
        &mut request.user_profile,
        &mut request.start_month,
    );
    validate_common(request.horizon, request.budget, request.start_month)?;
    Ok(request)
}

/// Assemble a batch request from `--request` or `--csv`, then flags.
pub fn batch_request_from_args(args: &BatchArgs) -> Result<BatchRequest, AppError> {
    let mut request = match (&args.request, &args.csv) {
        (Some(path), _) => read_batch_request(path)?,
        (None, Some(path)) => {
            let ingested = load_expenses(path)?;
            for e in &ingested.row_errors {
                warn!(line = e.line, "{}", e.message);
            }
            info!(
                rows_read = ingested.rows_read,
                rows_used = ingested.rows_used,
                months = ingested.series.months(),
                categories = ingested.series.categories.len(),
                "expenses loaded"
            );
            let start_month = ingested.series.next_month();
            BatchRequest {
                categories: ingested.series.categories,
                horizon: pipeline::DEFAULT_HORIZON,
                budget: None,
                user_profile: None,
                start_month: Some(start_month),
                detect_profile: false,
            }
        }
        (None, None) => return Err(AppError::new(2, "Provide --request or --csv.")),
    };

    request.detect_profile |= args.detect_profile;
    apply_context(
        &args.context,
        &mut request.horizon,
        &mut request.budget,
        &mut request.user_profile,
        &mut request.start_month,
    );
    validate_common(request.horizon, request.budget, request.start_month)?;
    Ok(request)
}

fn apply_context(
    ctx: &ContextArgs,
    horizon: &mut i64,
    budget: &mut Option<f64>,
    profile: &mut Option<UserProfile>,
    start_month: &mut Option<u32>,
) {
    if let Some(h) = ctx.horizon {
        *horizon = h;
    }
    if ctx.budget.is_some() {
        *budget = ctx.budget;
    }
    if ctx.profile.is_some() {
        *profile = ctx.profile;
    }
    if ctx.start_month.is_some() {
        *start_month = ctx.start_month;
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let mut out = std::io::stdout().lock();
    write_json(&mut out, value)?;
    writeln!(out).map_err(|e| AppError::new(2, format!("Failed to write output: {e}")))
}
