//! In-memory market for engine tests.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use comet_monitor_chain::{
    AccountData, BlockSpan, ChainError, ChainResult, CollateralInfo, MarketReader, TokenMetadata,
    WithdrawEvent,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Read that should fail with a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailPoint {
    LatestBlock,
    CollateralCount,
    CollateralInfo,
    Metadata,
    Price,
    Withdrawals,
    AccountData,
}

#[derive(Debug, Default)]
struct MarketState {
    latest_block: u64,
    collaterals: Vec<CollateralInfo>,
    metadata: HashMap<Address, TokenMetadata>,
    prices: HashMap<Address, U256>,
    withdrawals: Vec<WithdrawEvent>,
    accounts: HashMap<Address, AccountData>,
    fail: Option<FailPoint>,
}

#[derive(Debug, Default)]
pub(crate) struct MockReader {
    state: Mutex<MarketState>,
    pub collateral_info_calls: AtomicUsize,
    pub metadata_calls: AtomicUsize,
    pub price_calls: AtomicUsize,
    pub latest_block_calls: AtomicUsize,
    pub spans: Mutex<Vec<BlockSpan>>,
    pub batches: Mutex<Vec<Vec<Address>>>,
}

/// Scale a decimal factor to its 18-decimal on-chain form.
pub(crate) fn raw_factor(factor: f64) -> u64 {
    (factor * 1e18).round() as u64
}

/// Scale a price to its 8-decimal on-chain form.
pub(crate) fn raw_price(price: f64) -> U256 {
    U256::from((price * 1e8).round() as u64)
}

impl MockReader {
    pub fn new(latest_block: u64) -> Self {
        let reader = Self::default();
        reader.state.lock().latest_block = latest_block;
        reader
    }

    pub fn set_latest_block(&self, block: u64) {
        self.state.lock().latest_block = block;
    }

    pub fn add_collateral(
        &self,
        asset: Address,
        price_feed: Address,
        symbol: &str,
        decimals: u8,
        collateral_factor: f64,
        liquidation_factor: f64,
    ) {
        let mut state = self.state.lock();
        let index = state.collaterals.len() as u8;
        state.collaterals.push(CollateralInfo {
            index,
            asset,
            price_feed,
            borrow_collateral_factor: raw_factor(collateral_factor),
            liquidate_collateral_factor: raw_factor(liquidation_factor),
        });
        state.metadata.insert(
            asset,
            TokenMetadata {
                symbol: symbol.to_string(),
                decimals,
            },
        );
    }

    pub fn set_price(&self, price_feed: Address, price: f64) {
        self.state.lock().prices.insert(price_feed, raw_price(price));
    }

    pub fn add_withdraw(&self, src: Address, amount: u64, block_number: u64) {
        self.state.lock().withdrawals.push(WithdrawEvent {
            src,
            to: src,
            amount: U256::from(amount),
            block_number,
        });
    }

    pub fn set_account(
        &self,
        account: Address,
        is_liquidatable: bool,
        borrow_balance: u128,
        collaterals: &[(Address, u128)],
    ) {
        self.state.lock().accounts.insert(
            account,
            AccountData {
                is_liquidatable,
                borrow_balance: U256::from(borrow_balance),
                collaterals: collaterals.iter().copied().collect(),
            },
        );
    }

    pub fn fail_at(&self, point: FailPoint) {
        self.state.lock().fail = Some(point);
    }

    pub fn clear_failure(&self) {
        self.state.lock().fail = None;
    }

    fn check(&self, point: FailPoint) -> ChainResult<()> {
        if self.state.lock().fail == Some(point) {
            Err(ChainError::Transport(format!("injected failure at {:?}", point)))
        } else {
            Ok(())
        }
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketReader for MockReader {
    fn market_address(&self) -> Address {
        Address::repeat_byte(0xcc)
    }

    async fn latest_block(&self) -> ChainResult<u64> {
        self.latest_block_calls.fetch_add(1, Ordering::SeqCst);
        self.check(FailPoint::LatestBlock)?;
        Ok(self.state.lock().latest_block)
    }

    async fn collateral_count(&self) -> ChainResult<u8> {
        self.check(FailPoint::CollateralCount)?;
        Ok(self.state.lock().collaterals.len() as u8)
    }

    async fn collateral_info(&self, index: u8) -> ChainResult<CollateralInfo> {
        self.collateral_info_calls.fetch_add(1, Ordering::SeqCst);
        self.check(FailPoint::CollateralInfo)?;
        self.state
            .lock()
            .collaterals
            .get(index as usize)
            .cloned()
            .ok_or_else(|| ChainError::Decode(format!("no asset at index {}", index)))
    }

    async fn token_metadata(&self, token: Address) -> ChainResult<TokenMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.check(FailPoint::Metadata)?;
        self.state
            .lock()
            .metadata
            .get(&token)
            .cloned()
            .ok_or_else(|| ChainError::Decode(format!("no metadata for {}", token)))
    }

    async fn price(&self, price_feed: Address) -> ChainResult<U256> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        self.check(FailPoint::Price)?;
        Ok(self
            .state
            .lock()
            .prices
            .get(&price_feed)
            .copied()
            .unwrap_or_default())
    }

    async fn withdrawals(&self, span: BlockSpan) -> ChainResult<Vec<WithdrawEvent>> {
        self.check(FailPoint::Withdrawals)?;
        self.spans.lock().push(span);
        Ok(self
            .state
            .lock()
            .withdrawals
            .iter()
            .filter(|e| e.block_number >= span.from && e.block_number <= span.to)
            .cloned()
            .collect())
    }

    async fn account_data(
        &self,
        accounts: &[Address],
        collateral_assets: &[Address],
    ) -> ChainResult<Vec<AccountData>> {
        self.check(FailPoint::AccountData)?;
        self.batches.lock().push(accounts.to_vec());
        let state = self.state.lock();
        Ok(accounts
            .iter()
            .map(|account| {
                let mut data = state.accounts.get(account).cloned().unwrap_or_default();
                data.collaterals
                    .retain(|(asset, balance)| *balance > 0 && collateral_assets.contains(asset));
                data
            })
            .collect())
    }
}
