//! Configuration for the sync engine.
//!
//! This module provides:
//! - Monitor runtime configuration (sync cadence, batching, reporting)
//! - Per-instance configuration (market, endpoint, base asset)
//! - The instance registry loaded from the config directory

mod instance;
mod monitor;
mod registry;

pub use instance::{BaseAsset, BaseAssetConfig, InstanceConfig, InstanceDetails, ResolvedInstance};
pub use monitor::MonitorConfig;
pub use registry::InstanceRegistry;

/// Config directory from `CONFIG_DIR`, defaulting to `./config`.
pub fn config_dir() -> std::path::PathBuf {
    std::env::var("CONFIG_DIR")
        .unwrap_or_else(|_| "./config".to_string())
        .into()
}
