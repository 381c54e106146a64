use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration. Loaded from an optional TOML file and environment
/// variables with the prefix `TRAVEL_PERKS__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerksConfig {
    #[serde(default)]
    pub eligibility: EligibilityConfig,
    #[serde(default)]
    pub rules: RuleThresholds,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EligibilityConfig {
    /// Only sessions starting after this date are aggregated.
    #[serde(default = "default_cutoff_date")]
    pub cutoff_date: NaiveDate,
    /// A user needs strictly more post-cutoff sessions than this.
    #[serde(default = "default_min_sessions")]
    pub min_sessions: usize,
}

/// Thresholds of the perk rule table, in rule order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleThresholds {
    #[serde(default = "default_no_orders_all")]
    pub no_orders_all: f64,
    #[serde(default = "default_min_avg_spent")]
    pub min_avg_spent: f64,
    #[serde(default = "default_single_hotel_count")]
    pub single_hotel_count: u32,
    #[serde(default = "default_min_flight_count")]
    pub min_flight_count: u32,
    #[serde(default = "default_no_orders_high")]
    pub no_orders_high: f64,
    #[serde(default = "default_max_cancellation_ratio")]
    pub max_cancellation_ratio: f64,
    #[serde(default = "default_married_with_children")]
    pub married_with_children: f64,
    #[serde(default = "default_min_bags_ratio")]
    pub min_bags_ratio: f64,
    #[serde(default = "default_max_hotel_discount")]
    pub max_hotel_discount: f64,
    #[serde(default = "default_min_hotel_count")]
    pub min_hotel_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Date ages are computed against; today when unset.
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Csv,
    JsonLines,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "jsonl" | "json_lines" | "json-lines" => Ok(OutputFormat::JsonLines),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

// Default functions
fn default_cutoff_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 4).unwrap_or_default()
}
fn default_min_sessions() -> usize {
    7
}
fn default_no_orders_all() -> f64 {
    1.0
}
fn default_min_avg_spent() -> f64 {
    80.0
}
fn default_single_hotel_count() -> u32 {
    1
}
fn default_min_flight_count() -> u32 {
    1
}
fn default_no_orders_high() -> f64 {
    0.78
}
fn default_max_cancellation_ratio() -> f64 {
    0.032
}
fn default_married_with_children() -> f64 {
    1.0
}
fn default_min_bags_ratio() -> f64 {
    0.49
}
fn default_max_hotel_discount() -> f64 {
    0.11
}
fn default_min_hotel_count() -> u32 {
    1
}
fn default_workers() -> usize {
    4
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            cutoff_date: default_cutoff_date(),
            min_sessions: default_min_sessions(),
        }
    }
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            no_orders_all: default_no_orders_all(),
            min_avg_spent: default_min_avg_spent(),
            single_hotel_count: default_single_hotel_count(),
            min_flight_count: default_min_flight_count(),
            no_orders_high: default_no_orders_high(),
            max_cancellation_ratio: default_max_cancellation_ratio(),
            married_with_children: default_married_with_children(),
            min_bags_ratio: default_min_bags_ratio(),
            max_hotel_discount: default_max_hotel_discount(),
            min_hotel_count: default_min_hotel_count(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            reference_date: None,
        }
    }
}

impl PerksConfig {
    /// Load configuration from an optional TOML file and the environment.
    /// Environment variables win over the file.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("TRAVEL_PERKS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        config.try_deserialize()
    }
}
