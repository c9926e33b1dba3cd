//! Per-instance snapshot data model.
//!
//! A snapshot is an immutable value once published. Each sync cycle builds
//! a complete replacement and swaps it in, so readers holding an
//! `Arc<InstanceSnapshot>` never see a half-merged state.

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

/// One asset known to an instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(skip)]
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
    pub price_feed: Address,
    /// Normalised oracle price
    pub price: f64,
    /// Borrow collateral factor, absent for the base asset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collateral_factor: Option<f64>,
    /// Liquidate collateral factor, absent for the base asset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidation_factor: Option<f64>,
}

/// Symbol-keyed asset mapping that preserves insertion order.
///
/// The first entry is the base asset. Lookups by token address go through
/// a reverse index kept in step with the entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetMap {
    entries: Vec<Asset>,
    by_address: HashMap<Address, usize>,
}

impl AssetMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an asset. An existing entry with the same symbol is replaced
    /// in place and keeps its position.
    pub fn insert(&mut self, asset: Asset) {
        match self.entries.iter().position(|a| a.symbol == asset.symbol) {
            Some(i) => {
                self.by_address.remove(&self.entries[i].address);
                self.by_address.insert(asset.address, i);
                self.entries[i] = asset;
            }
            None => {
                self.by_address.insert(asset.address, self.entries.len());
                self.entries.push(asset);
            }
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&Asset> {
        self.entries.iter().find(|a| a.symbol == symbol)
    }

    /// Asset registered under a token address.
    pub fn by_address(&self, address: &Address) -> Option<&Asset> {
        self.by_address.get(address).map(|&i| &self.entries[i])
    }

    /// The base asset, if the registry has been loaded.
    pub fn base(&self) -> Option<&Asset> {
        self.entries.first()
    }

    /// Token addresses of every collateral asset, in registry order.
    pub fn collateral_addresses(&self) -> Vec<Address> {
        self.entries.iter().skip(1).map(|a| a.address).collect()
    }

    /// Set the price of the asset at `index` in iteration order.
    pub(crate) fn set_price(&mut self, index: usize, price: f64) {
        if let Some(asset) = self.entries.get_mut(index) {
            asset.price = price;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for AssetMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for asset in &self.entries {
            map.serialize_entry(&asset.symbol, asset)?;
        }
        map.end()
    }
}

/// Risk state of one borrowing account.
///
/// The derived fields are rewritten by the health calculator every cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowerPosition {
    pub is_liquidatable: bool,
    /// Borrow balance in base asset units
    pub borrow_balance: f64,
    /// Held amount per collateral symbol, positive balances only
    pub collaterals: BTreeMap<String, f64>,
    /// Borrow capacity in base asset units
    pub borrow_limit: f64,
    /// Liquidation threshold in base asset units
    pub liquidation_limit: f64,
    pub percent_to_liquidation: f64,
    /// Collateral price that triggers liquidation, single-collateral borrowers only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidation_price: Option<f64>,
}

impl BorrowerPosition {
    /// Position with no derived values computed yet.
    pub fn new(
        is_liquidatable: bool,
        borrow_balance: f64,
        collaterals: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            is_liquidatable,
            borrow_balance,
            collaterals,
            borrow_limit: 0.0,
            liquidation_limit: 0.0,
            percent_to_liquidation: 0.0,
            liquidation_price: None,
        }
    }
}

/// Synchronised state of one instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceSnapshot {
    /// Highest block whose events have been incorporated
    pub last_synced_block: u64,
    /// Start of the last sync attempt that passed the debounce check
    pub last_synced_at: Option<DateTime<Utc>>,
    pub assets: AssetMap,
    pub borrowers: HashMap<Address, BorrowerPosition>,
    /// Collateral count observed when the registry was last loaded
    pub collateral_asset_count: u8,
}

impl InstanceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }
}
