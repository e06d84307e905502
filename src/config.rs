//! Runtime settings and logging setup.
//!
//! Settings come from the environment (optionally a `.env` file); CLI flags
//! override them in `app`.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::AppError;
use crate::forecast::{ForecastPolicy, JitterPolicy, SpendForecaster, StepCategories};
use crate::io::load_model_bundle;

pub const DEFAULT_LOG_FILTER: &str = "spendcast=info";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub model_path: Option<PathBuf>,
    /// Comma-separated step category names; `None` keeps the defaults.
    pub step_categories: Option<String>,
    pub jitter_enabled: bool,
    pub jitter_seed: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        let jitter = JitterPolicy::default();
        Self {
            model_path: None,
            step_categories: None,
            jitter_enabled: jitter.enabled,
            jitter_seed: jitter.base_seed,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Settings {
    /// Load `.env` (if present) and read `SPENDCAST_*` variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut settings = Self::default();

        if let Some(path) = get("SPENDCAST_MODEL_PATH") {
            settings.model_path = Some(PathBuf::from(path));
        }
        settings.step_categories = get("SPENDCAST_STEP_CATEGORIES");
        if let Some(raw) = get("SPENDCAST_JITTER") {
            settings.jitter_enabled = parse_switch(&raw)
                .ok_or_else(|| AppError::new(2, format!("SPENDCAST_JITTER must be on/off, got '{raw}'.")))?;
        }
        if let Some(raw) = get("SPENDCAST_JITTER_SEED") {
            settings.jitter_seed = raw
                .parse()
                .map_err(|_| AppError::new(2, format!("SPENDCAST_JITTER_SEED must be an integer, got '{raw}'.")))?;
        }
        if let Some(filter) = get("SPENDCAST_LOG") {
            settings.log_filter = filter;
        }
        Ok(settings)
    }

    pub fn policy(&self) -> ForecastPolicy {
        ForecastPolicy {
            jitter: JitterPolicy {
                enabled: self.jitter_enabled,
                base_seed: self.jitter_seed,
                ..JitterPolicy::default()
            },
            ..ForecastPolicy::default()
        }
    }

    pub fn step_categories(&self) -> StepCategories {
        self.step_categories
            .as_deref()
            .map(StepCategories::parse_list)
            .unwrap_or_default()
    }

    /// Build the forecaster, loading the model bundle unless `fallback_only`.
    ///
    /// A configured model that cannot be loaded is a configuration error.
    pub fn build_forecaster(&self, fallback_only: bool) -> Result<SpendForecaster, AppError> {
        let model = match (&self.model_path, fallback_only) {
            (Some(path), false) => Some(load_model_bundle(path)?),
            _ => None,
        };
        if model.is_none() && !fallback_only {
            warn!("no model configured; every forecast will use the statistical fallback");
        }
        Ok(SpendForecaster::new(
            model,
            Arc::new(self.step_categories()),
            self.policy(),
        ))
    }
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Install the stderr log subscriber. `verbose` forces debug for this crate.
pub fn init_tracing(filter: &str, verbose: bool) {
    let directives = if verbose {
        format!("{filter},spendcast=debug")
    } else {
        filter.to_string()
    };
    let env_filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::forecast::CategoryClassifier;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let s = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(s, Settings::default());
        assert!(s.jitter_enabled);
        assert_eq!(s.jitter_seed, 42);
    }

    #[test]
    fn reads_all_variables() {
        let s = Settings::from_lookup(lookup(&[
            ("SPENDCAST_MODEL_PATH", "model.json"),
            ("SPENDCAST_STEP_CATEGORIES", "Rent, Insurance"),
            ("SPENDCAST_JITTER", "off"),
            ("SPENDCAST_JITTER_SEED", "7"),
            ("SPENDCAST_LOG", "spendcast=warn"),
        ]))
        .unwrap();
        assert_eq!(s.model_path, Some(PathBuf::from("model.json")));
        assert!(!s.jitter_enabled);
        assert_eq!(s.policy().jitter.base_seed, 7);
        assert_eq!(s.log_filter, "spendcast=warn");
        assert!(s.step_categories().is_step("insurance"));
        assert!(!s.step_categories().is_step("Personal Care"));
    }

    #[test]
    fn invalid_values_are_configuration_errors() {
        let err = Settings::from_lookup(lookup(&[("SPENDCAST_JITTER", "maybe")])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(Settings::from_lookup(lookup(&[("SPENDCAST_JITTER_SEED", "x")])).is_err());
    }

    #[test]
    fn unreadable_model_is_fatal_unless_fallback_only() {
        let s = Settings {
            model_path: Some(PathBuf::from("/nonexistent/model.json")),
            ..Settings::default()
        };
        assert_eq!(s.build_forecaster(false).err().map(|e| e.exit_code()), Some(2));
        let forecaster = s.build_forecaster(true).unwrap();
        assert!(!forecaster.has_model());
    }
}
