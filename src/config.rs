//! Engagement configuration loaded from `~/.engagement/config.json`.
//!
//! Every field has a serde default, so an empty object (`{}`) is a valid
//! config. `ENGAGEMENT_CONFIG` overrides the file location.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engagement::AggregationOptions;

/// Environment variable that points at an alternate config file.
pub const CONFIG_ENV_VAR: &str = "ENGAGEMENT_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementConfig {
    /// SQLite record store location. Defaults to `~/.engagement/engagement.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,
    /// Principals aggregated concurrently in batch mode.
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
    /// ISO weeks covered by the engagement timeline.
    #[serde(default = "default_timeline_weeks")]
    pub timeline_weeks: u32,
    /// Calendar months covered by communication trends.
    #[serde(default = "default_trend_months")]
    pub trend_months: u32,
    /// Sections computed when a caller does not pass explicit options.
    #[serde(default)]
    pub default_options: AggregationOptions,
}

fn default_batch_concurrency() -> usize {
    4
}

fn default_timeline_weeks() -> u32 {
    12
}

fn default_trend_months() -> u32 {
    12
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            batch_concurrency: default_batch_concurrency(),
            timeline_weeks: default_timeline_weeks(),
            trend_months: default_trend_months(),
            default_options: AggregationOptions::default(),
        }
    }
}

impl EngagementConfig {
    /// Reject settings the aggregation cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_concurrency == 0 {
            return Err("batchConcurrency must be at least 1".to_string());
        }
        if self.timeline_weeks == 0 {
            return Err("timelineWeeks must be at least 1".to_string());
        }
        if self.trend_months < 6 {
            return Err("trendMonths must be at least 6".to_string());
        }
        Ok(())
    }
}

/// Resolve the config file path: `$ENGAGEMENT_CONFIG` or `~/.engagement/config.json`.
pub fn config_path() -> Result<PathBuf, String> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".engagement").join("config.json"))
}

/// Load config from the default location. A missing file yields defaults.
pub fn load_config() -> Result<EngagementConfig, String> {
    let path = config_path()?;
    if !path.exists() {
        log::info!(
            "No config at {}, using defaults",
            path.display()
        );
        return Ok(EngagementConfig::default());
    }
    load_config_from(&path)
}

/// Load and validate config from an explicit path.
pub fn load_config_from(path: &Path) -> Result<EngagementConfig, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read config: {}", e))?;

    let config: EngagementConfig =
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))?;

    config.validate()?;
    Ok(config)
}
