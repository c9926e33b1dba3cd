//! Comet monitor core logic.
//!
//! This crate provides the borrower-risk sync engine:
//! - Asset registry loading and oracle price refresh
//! - Borrower discovery from Withdraw logs
//! - Batched position reads and snapshot merging
//! - Health metrics (limits, percent to liquidation, liquidation price)
//! - Per-instance sync orchestration with debounce and read-through refresh
//!
//! One snapshot is kept per tracked Comet deployment.

mod assets;
pub mod config;
mod discovery;
mod error;
mod health;
mod merge;
#[cfg(test)]
mod mock;
mod orchestrator;
mod positions;
mod prices;
mod report;
mod snapshot;
pub mod u256_math;

pub use assets::load_registry;
pub use config::{
    config_dir, BaseAsset, InstanceConfig, InstanceRegistry, MonitorConfig, ResolvedInstance,
};
pub use discovery::{discover_candidates, BlockChunks};
pub use error::{Result, SyncError};
pub use health::{compute_health, recompute_health, PERCENT_PRECISION};
pub use merge::merge_positions;
pub use orchestrator::{schedule_ticker, SyncOrchestrator, SyncOutcome};
pub use positions::fetch_positions;
pub use prices::refresh_prices;
pub use report::{RankedBorrower, SnapshotReport};
pub use snapshot::{Asset, AssetMap, BorrowerPosition, InstanceSnapshot};
