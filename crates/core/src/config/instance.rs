//! Per-instance configuration.
//!
//! One TOML file describes one tracked market deployment:
//!
//! ```toml
//! [instance]
//! id = "cUSDCv3_ETH"
//! market = "0xc3d688B66703497DAA19211EEdff47f25384cdc3"
//! rpc = "${MAINNET_PROVIDER_URL}"
//! debounce_secs = 90
//!
//! [instance.base_asset]
//! symbol = "USDC"
//! address = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
//! decimals = 6
//! price_feed = "0x8fFfFfd4AfB6115b954Bd326cbe7B4BA576818f6"
//! ```

use alloy::primitives::Address;
use anyhow::Context;
use comet_monitor_chain::MULTICALL3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use super::MonitorConfig;

/// Instance configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub instance: InstanceDetails,
}

/// Instance details as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceDetails {
    /// Short identifier, e.g. "cUSDCv3_ETH"
    pub id: String,
    /// Comet proxy address
    pub market: String,
    /// HTTP RPC endpoint, `${VAR}` references are expanded
    pub rpc: String,
    /// Minimum time between two syncs of this instance
    #[serde(default)]
    pub debounce_secs: Option<u64>,
    /// Widest block span per withdraw log query
    #[serde(default)]
    pub event_chunk_span: Option<u64>,
    /// First block of the tracked range
    #[serde(default)]
    pub start_block: Option<u64>,
    /// Multicall3 override for chains without the canonical deployment
    #[serde(default)]
    pub multicall: Option<String>,
    /// Base asset, configured statically
    pub base_asset: BaseAssetConfig,
}

/// Base asset as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseAssetConfig {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
    pub price_feed: String,
}

/// Base asset with parsed addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseAsset {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
    pub price_feed: Address,
}

/// Fully resolved instance configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInstance {
    pub id: String,
    pub market: Address,
    pub rpc: String,
    pub debounce: Duration,
    pub event_chunk_span: u64,
    pub start_block: u64,
    pub multicall: Address,
    pub base_asset: BaseAsset,
}

impl InstanceConfig {
    /// Load an instance config from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: InstanceConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Expand environment variables in config values.
    pub fn expand_env_vars(&mut self) {
        self.instance.rpc = expand_env(&self.instance.rpc);
    }

    /// Parse addresses and fill unset values from the monitor defaults.
    pub fn resolve(&self, defaults: &MonitorConfig) -> anyhow::Result<ResolvedInstance> {
        let details = &self.instance;
        let base = &details.base_asset;

        let event_chunk_span = details
            .event_chunk_span
            .unwrap_or(defaults.default_event_chunk_span);
        if event_chunk_span == 0 {
            anyhow::bail!("Instance '{}': event_chunk_span must be positive", details.id);
        }

        let multicall = match &details.multicall {
            Some(addr) => parse_address(addr, "multicall", &details.id)?,
            None => MULTICALL3,
        };

        Ok(ResolvedInstance {
            id: details.id.clone(),
            market: parse_address(&details.market, "market", &details.id)?,
            rpc: details.rpc.clone(),
            debounce: details
                .debounce_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| defaults.default_debounce()),
            event_chunk_span,
            start_block: details.start_block.unwrap_or(0),
            multicall,
            base_asset: BaseAsset {
                symbol: base.symbol.clone(),
                address: parse_address(&base.address, "base_asset.address", &details.id)?,
                decimals: base.decimals,
                price_feed: parse_address(&base.price_feed, "base_asset.price_feed", &details.id)?,
            },
        })
    }
}

fn parse_address(value: &str, field: &str, id: &str) -> anyhow::Result<Address> {
    value
        .parse()
        .with_context(|| format!("Instance '{}': invalid {} '{}'", id, field, value))
}

/// Expand ${VAR_NAME} patterns with environment variable values.
pub(crate) fn expand_env(s: &str) -> String {
    static ENV_PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    let re = ENV_PATTERN
        .get_or_init(|| regex_lite::Regex::new(r"\$\{([^}]+)\}").expect("static pattern"));

    let mut result = s.to_string();
    for cap in re.captures_iter(s) {
        if let (Some(full_match), Some(var_match)) = (cap.get(0), cap.get(1)) {
            if let Ok(value) = std::env::var(var_match.as_str()) {
                result = result.replace(full_match.as_str(), &value);
            }
        }
    }

    result
}
