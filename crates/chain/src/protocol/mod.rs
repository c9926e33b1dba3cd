//! Market read abstraction.
//!
//! [`MarketReader`] is the only way the sync engine touches the chain. The
//! production implementation is [`CometReader`]; tests substitute an
//! in-memory reader.
//!
//! # Example
//!
//! ```rust,ignore
//! use comet_monitor_chain::{CometReader, MarketReader, ProviderManager};
//!
//! let provider = ProviderManager::new(&rpc_url)?;
//! let reader = CometReader::new(market, MULTICALL3, provider);
//!
//! let count = reader.collateral_count().await?;
//! let info = reader.collateral_info(0).await?;
//! ```

mod comet;
mod events;

pub use comet::CometReader;
pub use events::{BlockSpan, WithdrawEvent, WITHDRAW_SIGNATURE};

use crate::error::ChainResult;
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use smallvec::SmallVec;
use std::fmt::Debug;

/// Collateral asset configuration read from the market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollateralInfo {
    /// Position in the market's asset list
    pub index: u8,
    /// Token address
    pub asset: Address,
    /// Price feed passed to `getPrice`
    pub price_feed: Address,
    /// Borrow collateral factor (18 decimals)
    pub borrow_collateral_factor: u64,
    /// Liquidate collateral factor (18 decimals)
    pub liquidate_collateral_factor: u64,
}

/// ERC-20 metadata of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub symbol: String,
    pub decimals: u8,
}

/// Raw account state returned by one aggregated read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountData {
    /// Liquidatable flag as reported by the market
    pub is_liquidatable: bool,
    /// Borrow balance (base asset decimals)
    pub borrow_balance: U256,
    /// Non-zero collateral holdings, (asset, raw balance)
    pub collaterals: SmallVec<[(Address, u128); 4]>,
}

/// Read capability over one lending market deployment.
///
/// Every method is a suspension point that performs network I/O; timeouts
/// and retries belong to the underlying transport.
#[async_trait]
pub trait MarketReader: Send + Sync + Debug {
    /// Market (proxy) contract address.
    fn market_address(&self) -> Address;

    /// Latest block number known to the endpoint.
    async fn latest_block(&self) -> ChainResult<u64>;

    /// Number of collateral assets configured on the market.
    async fn collateral_count(&self) -> ChainResult<u8>;

    /// Configuration of the collateral asset at `index`.
    async fn collateral_info(&self, index: u8) -> ChainResult<CollateralInfo>;

    /// Symbol and decimals of a token.
    async fn token_metadata(&self, token: Address) -> ChainResult<TokenMetadata>;

    /// Raw oracle price (8 decimals) for a price feed.
    async fn price(&self, price_feed: Address) -> ChainResult<U256>;

    /// Withdraw logs emitted by the market within one inclusive span.
    ///
    /// Callers are responsible for keeping the span within provider limits.
    async fn withdrawals(&self, span: BlockSpan) -> ChainResult<Vec<WithdrawEvent>>;

    /// Account state for every address in `accounts`, in one round trip.
    ///
    /// The result is index-aligned with `accounts`. Any failing sub-call
    /// fails the whole batch.
    async fn account_data(
        &self,
        accounts: &[Address],
        collateral_assets: &[Address],
    ) -> ChainResult<Vec<AccountData>>;
}
