//! Read-side view of an instance snapshot.

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::snapshot::{AssetMap, BorrowerPosition, InstanceSnapshot};

/// Borrower entry of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedBorrower {
    pub account: Address,
    #[serde(flatten)]
    pub position: BorrowerPosition,
}

/// Snapshot as served to readers, borrowers ranked closest to liquidation first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotReport {
    pub instance: String,
    pub last_synced_block: u64,
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Start of the latest cycle, including ones that failed
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub collateral_asset_count: u8,
    pub assets: AssetMap,
    pub borrowers: Vec<RankedBorrower>,
}

impl SnapshotReport {
    pub fn new(instance: &str, snapshot: &InstanceSnapshot) -> Self {
        let mut borrowers: Vec<RankedBorrower> = snapshot
            .borrowers
            .iter()
            .map(|(account, position)| RankedBorrower {
                account: *account,
                position: position.clone(),
            })
            .collect();

        // Descending; infinite values rank first, ties broken by account
        borrowers.sort_by(|a, b| {
            b.position
                .percent_to_liquidation
                .total_cmp(&a.position.percent_to_liquidation)
                .then_with(|| a.account.cmp(&b.account))
        });

        Self {
            instance: instance.to_string(),
            last_synced_block: snapshot.last_synced_block,
            last_synced_at: snapshot.last_synced_at,
            last_attempt_at: snapshot.last_synced_at,
            collateral_asset_count: snapshot.collateral_asset_count,
            assets: snapshot.assets.clone(),
            borrowers,
        }
    }

    /// Override the attempt stamp, which runs ahead of `last_synced_at`
    /// while cycles are failing.
    pub fn with_last_attempt(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.last_attempt_at = at;
        self
    }

    /// Borrowers the market already reports as liquidatable.
    pub fn liquidatable(&self) -> impl Iterator<Item = &RankedBorrower> {
        self.borrowers.iter().filter(|b| b.position.is_liquidatable)
    }
}
