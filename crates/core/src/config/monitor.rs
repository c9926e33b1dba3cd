//! Monitor runtime configuration.
//!
//! Timing and batching parameters shared by every tracked instance.
//! Per-instance settings live in [`super::InstanceConfig`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Main configuration structure for the sync engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Interval of the unconditional full sync
    #[serde(default = "default_auto_sync_interval")]
    pub auto_sync_interval_secs: u64,

    /// Debounce applied to instances that do not set their own
    #[serde(default = "default_debounce")]
    pub default_debounce_secs: u64,

    /// Widest block span per withdraw log query, unless the instance overrides it
    #[serde(default = "default_event_chunk_span")]
    pub default_event_chunk_span: u64,

    /// Accounts per aggregated position read
    #[serde(default = "default_account_batch_size")]
    pub account_batch_size: usize,

    /// Interval of the at-risk summary log
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,

    /// Borrowers listed per instance in the at-risk summary
    #[serde(default = "default_report_top_n")]
    pub report_top_n: usize,
}

fn default_auto_sync_interval() -> u64 {
    3600
}
fn default_debounce() -> u64 {
    90
}
fn default_event_chunk_span() -> u64 {
    500_000
}
fn default_account_batch_size() -> usize {
    1000
}
fn default_report_interval() -> u64 {
    300
}
fn default_report_top_n() -> usize {
    10
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            auto_sync_interval_secs: default_auto_sync_interval(),
            default_debounce_secs: default_debounce(),
            default_event_chunk_span: default_event_chunk_span(),
            account_batch_size: default_account_batch_size(),
            report_interval_secs: default_report_interval(),
            report_top_n: default_report_top_n(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load `monitor.toml` from `config_dir` if present, defaults otherwise.
    pub fn from_dir(config_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = config_dir.as_ref().join("monitor.toml");
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn auto_sync_interval(&self) -> Duration {
        Duration::from_secs(self.auto_sync_interval_secs)
    }

    pub fn default_debounce(&self) -> Duration {
        Duration::from_secs(self.default_debounce_secs)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }

    /// Log the effective configuration.
    pub fn log_config(&self) {
        info!(
            auto_sync_interval_secs = self.auto_sync_interval_secs,
            default_debounce_secs = self.default_debounce_secs,
            default_event_chunk_span = self.default_event_chunk_span,
            account_batch_size = self.account_batch_size,
            report_interval_secs = self.report_interval_secs,
            report_top_n = self.report_top_n,
            "Monitor configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.auto_sync_interval(), Duration::from_secs(3600));
        assert_eq!(config.default_debounce(), Duration::from_secs(90));
        assert_eq!(config.default_event_chunk_span, 500_000);
        assert_eq!(config.account_batch_size, 1000);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: MonitorConfig = toml::from_str("account_batch_size = 250").unwrap();
        assert_eq!(config.account_batch_size, 250);
        assert_eq!(config.auto_sync_interval_secs, 3600);
    }

    #[test]
    fn test_serialization() {
        let config = MonitorConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("default_event_chunk_span = 500000"));

        let parsed: MonitorConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }
}
