//! Compound III (Comet) market reader.
//!
//! Implements [`MarketReader`] over typed Alloy contract calls. Account state
//! is read through Multicall3 so a whole batch of accounts costs one
//! `eth_call`.

use super::{
    AccountData, BlockSpan, CollateralInfo, MarketReader, TokenMetadata, WithdrawEvent,
    WITHDRAW_SIGNATURE,
};
use crate::contracts::{Call3, Call3Result, IComet, IERC20Metadata, IMulticall3};
use crate::error::{ChainError, ChainResult};
use crate::provider::ProviderManager;
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use alloy::rpc::types::Filter;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use smallvec::SmallVec;
use tracing::debug;

/// Calls issued per account besides one per collateral asset.
const FIXED_CALLS_PER_ACCOUNT: usize = 2;

/// Comet market reader.
#[derive(Debug, Clone)]
pub struct CometReader {
    /// Market proxy address
    market: Address,
    /// Multicall3 deployment used for aggregated reads
    multicall: Address,
    /// Provider for RPC calls
    provider: ProviderManager,
}

impl CometReader {
    /// Create a reader for the market at `market`.
    pub fn new(market: Address, multicall: Address, provider: ProviderManager) -> Self {
        Self {
            market,
            multicall,
            provider,
        }
    }

    fn market_call<C: SolCall>(&self, call: C) -> Call3 {
        Call3 {
            target: self.market,
            allowFailure: false,
            callData: call.abi_encode().into(),
        }
    }

    /// Build the call list for one account.
    fn account_calls(&self, account: Address, collateral_assets: &[Address]) -> Vec<Call3> {
        let mut calls = Vec::with_capacity(FIXED_CALLS_PER_ACCOUNT + collateral_assets.len());
        calls.push(self.market_call(IComet::isLiquidatableCall { account }));
        calls.push(self.market_call(IComet::borrowBalanceOfCall { account }));
        for &asset in collateral_assets {
            calls.push(self.market_call(IComet::collateralBalanceOfCall { account, asset }));
        }
        calls
    }
}

#[async_trait]
impl MarketReader for CometReader {
    fn market_address(&self) -> Address {
        self.market
    }

    async fn latest_block(&self) -> ChainResult<u64> {
        self.provider.block_number().await
    }

    async fn collateral_count(&self) -> ChainResult<u8> {
        let provider = self.provider.provider();
        let comet = IComet::new(self.market, &provider);
        let count = comet.numAssets().call().await?;
        Ok(count._0)
    }

    async fn collateral_info(&self, index: u8) -> ChainResult<CollateralInfo> {
        let provider = self.provider.provider();
        let comet = IComet::new(self.market, &provider);
        let info = comet.getAssetInfo(index).call().await?._0;

        Ok(CollateralInfo {
            index,
            asset: info.asset,
            price_feed: info.priceFeed,
            borrow_collateral_factor: info.borrowCollateralFactor,
            liquidate_collateral_factor: info.liquidateCollateralFactor,
        })
    }

    async fn token_metadata(&self, token: Address) -> ChainResult<TokenMetadata> {
        let provider = self.provider.provider();
        let erc20 = IERC20Metadata::new(token, &provider);

        let symbol_call = erc20.symbol();
        let decimals_call = erc20.decimals();
        let (symbol, decimals) = tokio::join!(symbol_call.call(), decimals_call.call());

        Ok(TokenMetadata {
            symbol: symbol?._0,
            decimals: decimals?._0,
        })
    }

    async fn price(&self, price_feed: Address) -> ChainResult<U256> {
        let provider = self.provider.provider();
        let comet = IComet::new(self.market, &provider);
        let price = comet.getPrice(price_feed).call().await?;
        Ok(price._0)
    }

    async fn withdrawals(&self, span: BlockSpan) -> ChainResult<Vec<WithdrawEvent>> {
        let provider = self.provider.provider();
        let filter = Filter::new()
            .address(self.market)
            .event_signature(WITHDRAW_SIGNATURE)
            .from_block(span.from)
            .to_block(span.to);

        let logs = provider.get_logs(&filter).await?;
        debug!(
            market = %self.market,
            from = span.from,
            to = span.to,
            logs = logs.len(),
            "Fetched withdraw logs"
        );

        logs.iter()
            .map(|log| -> ChainResult<WithdrawEvent> {
                let decoded = log.log_decode::<IComet::Withdraw>()?;
                let event = &decoded.inner.data;
                Ok(WithdrawEvent {
                    src: event.src,
                    to: event.to,
                    amount: event.amount,
                    block_number: log.block_number.unwrap_or(span.from),
                })
            })
            .collect()
    }

    async fn account_data(
        &self,
        accounts: &[Address],
        collateral_assets: &[Address],
    ) -> ChainResult<Vec<AccountData>> {
        if accounts.is_empty() {
            return Ok(Vec::new());
        }

        let calls: Vec<Call3> = accounts
            .iter()
            .flat_map(|&account| self.account_calls(account, collateral_assets))
            .collect();
        let expected = calls.len();

        let provider = self.provider.provider();
        let multicall = IMulticall3::new(self.multicall, &provider);
        let results = multicall.aggregate3(calls).call().await?.returnData;

        if results.len() != expected {
            return Err(ChainError::Decode(format!(
                "multicall returned {} results, expected {}",
                results.len(),
                expected
            )));
        }

        debug!(
            market = %self.market,
            accounts = accounts.len(),
            calls = expected,
            "Fetched account data"
        );

        results
            .chunks(FIXED_CALLS_PER_ACCOUNT + collateral_assets.len())
            .map(|chunk| decode_account(chunk, collateral_assets))
            .collect()
    }
}

/// Decode the results of one account's calls, as laid out by `account_calls`.
fn decode_account(results: &[Call3Result], collateral_assets: &[Address]) -> ChainResult<AccountData> {
    if let Some(failed) = results.iter().position(|r| !r.success) {
        return Err(ChainError::Decode(format!("sub-call {} reported failure", failed)));
    }

    let [liquidatable, borrow, balances @ ..] = results else {
        return Err(ChainError::Decode("truncated account result".to_string()));
    };

    let is_liquidatable =
        IComet::isLiquidatableCall::abi_decode_returns(&liquidatable.returnData, true)?._0;
    let borrow_balance =
        IComet::borrowBalanceOfCall::abi_decode_returns(&borrow.returnData, true)?._0;

    let mut collaterals = SmallVec::new();
    for (result, &asset) in balances.iter().zip(collateral_assets) {
        let balance =
            IComet::collateralBalanceOfCall::abi_decode_returns(&result.returnData, true)?._0;
        if balance > 0 {
            collaterals.push((asset, balance));
        }
    }

    Ok(AccountData {
        is_liquidatable,
        borrow_balance,
        collaterals,
    })
}
