use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::RangePreset;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_base_url() -> String {
    "https://api.coincap.io/v2".into()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_requests_per_second() -> u32 {
    5
}

fn default_range() -> String {
    "90d".into()
}

fn default_page_limit() -> usize {
    20
}

/// Upper bound the listing endpoint accepts for `limit`.
pub const MAX_PAGE_LIMIT: usize = 2000;

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub coincap: CoinCapConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinCapConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent as a bearer token when non-empty.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl Default for CoinCapConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    /// One of `24h`, `7d`, `30d`, `90d`, `1y`.
    #[serde(default = "default_range")]
    pub default_range: String,
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_range: default_range(),
            page_limit: default_page_limit(),
        }
    }
}

impl AnalysisConfig {
    /// The configured range; validation guarantees it parses.
    pub fn range(&self) -> RangePreset {
        RangePreset::from_str(&self.default_range).unwrap_or(RangePreset::Quarter)
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
///
/// A missing file yields the built-in defaults.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    let config: AppConfig = toml::from_str(&content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_general(&config.general)?;
    validate_coincap(&config.coincap)?;
    validate_analysis(&config.analysis)?;
    Ok(())
}

fn invalid(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_general(general: &GeneralConfig) -> Result<(), Report<ConfigError>> {
    if !VALID_LOG_FORMATS.contains(&general.log_format.as_str()) {
        return Err(invalid(format!(
            "general.log_format \"{}\" is not one of text, json",
            general.log_format
        )));
    }
    Ok(())
}

fn validate_coincap(coincap: &CoinCapConfig) -> Result<(), Report<ConfigError>> {
    if !(coincap.base_url.starts_with("https://") || coincap.base_url.starts_with("http://")) {
        return Err(invalid(format!(
            "coincap.base_url \"{}\" must be an http(s) URL",
            coincap.base_url
        )));
    }
    if coincap.timeout_secs == 0 {
        return Err(invalid("coincap.timeout_secs must be > 0".into()));
    }
    if coincap.requests_per_second == 0 {
        return Err(invalid("coincap.requests_per_second must be > 0".into()));
    }
    Ok(())
}

fn validate_analysis(analysis: &AnalysisConfig) -> Result<(), Report<ConfigError>> {
    if RangePreset::from_str(&analysis.default_range).is_none() {
        return Err(invalid(format!(
            "analysis.default_range: unknown range \"{}\"",
            analysis.default_range
        )));
    }
    if !(1..=MAX_PAGE_LIMIT).contains(&analysis.page_limit) {
        return Err(invalid(format!(
            "analysis.page_limit must be between 1 and {MAX_PAGE_LIMIT}"
        )));
    }
    Ok(())
}
