//! Building the borrower set from fetched account data.

use alloy::primitives::Address;
use comet_monitor_chain::AccountData;
use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, SyncError};
use crate::snapshot::{AssetMap, BorrowerPosition};
use crate::u256_math::{scale_down, scale_down_u128};

/// Build a fresh borrower map from `positions`, index-aligned with `candidates`.
///
/// Accounts whose normalised borrow balance is not positive are left out;
/// that is how a full repayment drops a borrower. Nothing from the previous
/// borrower map is carried over. Derived health fields are left for the
/// health calculator.
pub fn merge_positions(
    assets: &AssetMap,
    candidates: &[Address],
    positions: Vec<AccountData>,
) -> Result<HashMap<Address, BorrowerPosition>> {
    let base = assets
        .base()
        .ok_or_else(|| SyncError::Decode("asset registry is empty".to_string()))?;

    if candidates.len() != positions.len() {
        return Err(SyncError::Decode(format!(
            "{} positions for {} candidates",
            positions.len(),
            candidates.len()
        )));
    }

    let mut borrowers = HashMap::new();
    for (account, data) in candidates.iter().zip(positions) {
        let borrow_balance = scale_down(data.borrow_balance, base.decimals);
        if borrow_balance <= 0.0 {
            continue;
        }

        let mut collaterals = BTreeMap::new();
        for (asset_address, raw) in data.collaterals {
            if raw == 0 {
                continue;
            }
            let asset = assets.by_address(&asset_address).ok_or_else(|| {
                SyncError::Decode(format!("collateral {} is not in the registry", asset_address))
            })?;
            collaterals.insert(asset.symbol.clone(), scale_down_u128(raw, asset.decimals));
        }

        borrowers.insert(
            *account,
            BorrowerPosition::new(data.is_liquidatable, borrow_balance, collaterals),
        );
    }

    Ok(borrowers)
}
