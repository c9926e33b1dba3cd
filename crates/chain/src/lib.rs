//! Comet monitor chain interaction layer.
//!
//! This crate provides:
//! - Provider management for an HTTP RPC endpoint
//! - Contract bindings for Comet, ERC-20 metadata and Multicall3
//! - The [`MarketReader`] capability consumed by the sync engine
//! - A Comet implementation with Multicall3-aggregated account reads

mod contracts;
mod error;
pub mod protocol;
mod provider;

pub use contracts::{FACTOR_SCALE_DECIMALS, MULTICALL3, PRICE_SCALE_DECIMALS};
pub use error::{ChainError, ChainResult};
pub use protocol::{
    AccountData, BlockSpan, CollateralInfo, CometReader, MarketReader, TokenMetadata,
    WithdrawEvent, WITHDRAW_SIGNATURE,
};
pub use provider::ProviderManager;
