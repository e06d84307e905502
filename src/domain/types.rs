//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - decoded from JSON request files
//! - passed through the forecasting core by reference
//! - encoded back to JSON/CSV for downstream consumers

use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Budget ceilings for the tiers below `Luxury`, in ascending order.
const BUDGET_TIER_LIMITS: [(f64, BudgetTier); 4] = [
    (5_000.0, BudgetTier::Low),
    (10_000.0, BudgetTier::Moderate),
    (20_000.0, BudgetTier::High),
    (40_000.0, BudgetTier::VeryHigh),
];

/// Spending profile of the user the forecast is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum UserProfile {
    #[default]
    CollegeStudent,
    YoungProfessional,
    FamilyModerate,
    FamilyHigh,
    SeniorRetired,
    LuxuryLifestyle,
}

impl UserProfile {
    pub const ALL: [UserProfile; 6] = [
        UserProfile::CollegeStudent,
        UserProfile::YoungProfessional,
        UserProfile::FamilyModerate,
        UserProfile::FamilyHigh,
        UserProfile::SeniorRetired,
        UserProfile::LuxuryLifestyle,
    ];

    /// Label used in feature names (`UserType_<label>`) and reports.
    pub fn label(self) -> &'static str {
        match self {
            UserProfile::CollegeStudent => "college_student",
            UserProfile::YoungProfessional => "young_professional",
            UserProfile::FamilyModerate => "family_moderate",
            UserProfile::FamilyHigh => "family_high",
            UserProfile::SeniorRetired => "senior_retired",
            UserProfile::LuxuryLifestyle => "luxury_lifestyle",
        }
    }
}

/// Monthly budget bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    Low,
    Moderate,
    High,
    VeryHigh,
    Luxury,
}

impl BudgetTier {
    pub const ALL: [BudgetTier; 5] = [
        BudgetTier::Low,
        BudgetTier::Moderate,
        BudgetTier::High,
        BudgetTier::VeryHigh,
        BudgetTier::Luxury,
    ];

    /// Classify a budget using inclusive upper limits.
    pub fn for_budget(budget: f64) -> Self {
        BUDGET_TIER_LIMITS
            .iter()
            .find(|(limit, _)| budget <= *limit)
            .map(|(_, tier)| *tier)
            .unwrap_or(BudgetTier::Luxury)
    }

    pub fn label(self) -> &'static str {
        match self {
            BudgetTier::Low => "low",
            BudgetTier::Moderate => "moderate",
            BudgetTier::High => "high",
            BudgetTier::VeryHigh => "very_high",
            BudgetTier::Luxury => "luxury",
        }
    }
}

/// Per-request context for a single series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastContext {
    /// Total monthly budget (non-negative, 0 when unknown).
    pub budget: f64,
    pub user_profile: UserProfile,
    /// Free-text spend category; selects the guardrail policy.
    pub category: Option<String>,
    /// Calendar month (1–12) of the first forecast step.
    pub start_month: Option<u32>,
}

impl ForecastContext {
    pub fn for_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn with_start_month(mut self, month: u32) -> Self {
        self.start_month = Some(month);
        self
    }
}

/// Which strategy produced a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastSource {
    /// Iterative model-based loop.
    Model,
    /// Statistical extrapolation.
    Fallback,
    /// Empty history or zero horizon.
    Empty,
}

/// Result of forecasting one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastOutcome {
    pub predictions: Vec<f64>,
    pub source: ForecastSource,
    /// Set when the model path was wanted but could not be used.
    pub degraded: bool,
}

impl ForecastOutcome {
    pub fn zeros(horizon: usize) -> Self {
        Self {
            predictions: vec![0.0; horizon],
            source: ForecastSource::Empty,
            degraded: false,
        }
    }
}

/// Result of forecasting several categories together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub per_category: BTreeMap<String, Vec<f64>>,
    pub total: Vec<f64>,
    /// Categories whose forecast came from a degraded path.
    pub degraded: Vec<String>,
}

/// Single-series forecast request as decoded from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    pub series: Vec<f64>,
    pub horizon: i64,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub start_month: Option<u32>,
}

impl ForecastRequest {
    pub fn context(&self) -> ForecastContext {
        ForecastContext {
            budget: self.budget.unwrap_or(0.0),
            user_profile: self.user_profile.unwrap_or_default(),
            category: self.category.clone(),
            start_month: self.start_month,
        }
    }
}

/// Multi-category forecast request as decoded from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub categories: BTreeMap<String, Vec<f64>>,
    pub horizon: i64,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
    #[serde(default)]
    pub start_month: Option<u32>,
    /// Infer missing budget/profile from the category histories.
    #[serde(default)]
    pub detect_profile: bool,
}

/// Clamp a signed request horizon to a step count (non-positive → 0).
pub fn horizon_steps(horizon: i64) -> usize {
    usize::try_from(horizon.max(0)).unwrap_or(0)
}
