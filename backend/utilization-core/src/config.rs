// src/config.rs
use chrono_tz::Tz;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

use crate::error::ReportError;
use crate::input::load_visibility_rules;
use crate::targets::MonthlyTarget;
use crate::visibility::VisibilityRules;

pub const DEFAULT_TIMEZONE: &str = "America/New_York";
pub const DEFAULT_SAMPLE_LIMIT: usize = 50;
pub const DEFAULT_TOP_CATEGORIES: usize = 5;

// --- Environment Configuration ---

/// `REPORT_*` environment variables (a `.env` file is honoured by the binary).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub visibility_rules: Option<PathBuf>,
    #[serde(default = "default_sample_limit")]
    pub sample_limit: usize,
    #[serde(default = "default_top_categories")]
    pub top_categories: usize,
    #[serde(default = "default_billable_target")]
    pub default_billable_target: Decimal,
    #[serde(default = "default_ops_target")]
    pub default_ops_target: Decimal,
    #[serde(default = "default_total_target")]
    pub default_total_target: Decimal,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}
fn default_sample_limit() -> usize {
    DEFAULT_SAMPLE_LIMIT
}
fn default_top_categories() -> usize {
    DEFAULT_TOP_CATEGORIES
}
fn default_billable_target() -> Decimal {
    dec!(100)
}
fn default_ops_target() -> Decimal {
    dec!(50)
}
fn default_total_target() -> Decimal {
    dec!(150)
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ReportError> {
        Ok(envy::prefixed("REPORT_").from_env::<AppConfig>()?)
    }
}

// --- Engine Configuration ---

/// Immutable configuration handed to every engine call.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub timezone: Tz,
    pub default_target: MonthlyTarget,
    pub visibility: VisibilityRules,
    pub sample_limit: usize,
    pub top_categories: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::New_York,
            default_target: MonthlyTarget::default(),
            visibility: VisibilityRules::default(),
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            top_categories: DEFAULT_TOP_CATEGORIES,
        }
    }
}

impl EngineConfig {
    pub fn with_visibility(mut self, visibility: VisibilityRules) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Builds the engine configuration, loading the visibility table if one is
    /// configured. `visibility_override` takes precedence over the environment.
    pub fn from_app_config(
        app: &AppConfig,
        visibility_override: Option<&PathBuf>,
    ) -> Result<Self, ReportError> {
        let timezone = parse_timezone(&app.timezone)?;
        let visibility = match visibility_override.or(app.visibility_rules.as_ref()) {
            Some(path) => {
                let rules = load_visibility_rules(path)?;
                info!(
                    "Loaded {} visibility rules from {}",
                    rules.len(),
                    path.display()
                );
                rules.into_iter().collect()
            }
            None => VisibilityRules::default(),
        };

        Ok(Self {
            timezone,
            default_target: MonthlyTarget {
                billable_target: app.default_billable_target,
                ops_target: app.default_ops_target,
                total_target: app.default_total_target,
            },
            visibility,
            sample_limit: app.sample_limit,
            top_categories: app.top_categories,
        })
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, ReportError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ReportError::UnknownTimezone(name.to_string()))
}
