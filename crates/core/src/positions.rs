//! Batched account position reads.

use alloy::primitives::Address;
use comet_monitor_chain::{AccountData, MarketReader};
use tracing::debug;

use crate::error::{Result, SyncError};

/// Fetch account data for every candidate, index-aligned with `candidates`.
///
/// Candidates are read in batches of `batch_size`, one batch at a time. A
/// failing batch fails the whole fetch.
pub async fn fetch_positions(
    reader: &dyn MarketReader,
    candidates: &[Address],
    collateral_assets: &[Address],
    batch_size: usize,
) -> Result<Vec<AccountData>> {
    let mut positions = Vec::with_capacity(candidates.len());

    for (batch_index, batch) in candidates.chunks(batch_size.max(1)).enumerate() {
        let data = reader.account_data(batch, collateral_assets).await?;
        if data.len() != batch.len() {
            return Err(SyncError::Decode(format!(
                "batch {} returned {} accounts, expected {}",
                batch_index,
                data.len(),
                batch.len()
            )));
        }
        debug!(batch = batch_index, accounts = batch.len(), "Fetched account batch");
        positions.extend(data);
    }

    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FailPoint, MockReader};
    use crate::snapshot::tests::WETH;
    use alloy::primitives::U256;

    fn accounts(n: u8) -> Vec<Address> {
        (1..=n).map(Address::repeat_byte).collect()
    }

    #[tokio::test]
    async fn test_batches_are_sequential_and_aligned() {
        let reader = MockReader::new(0);
        let candidates = accounts(5);
        reader.set_account(candidates[3], true, 42, &[(WETH, 7)]);

        let positions = fetch_positions(&reader, &candidates, &[WETH], 2).await.unwrap();

        assert_eq!(positions.len(), 5);
        assert!(positions[3].is_liquidatable);
        assert_eq!(positions[3].borrow_balance, U256::from(42u64));
        assert!(positions[0].borrow_balance.is_zero());

        let batches = reader.batches.lock();
        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 2, 1]);
        assert_eq!(batches[1][1], candidates[3]);
    }

    #[tokio::test]
    async fn test_no_candidates_no_calls() {
        let reader = MockReader::new(0);
        let positions = fetch_positions(&reader, &[], &[WETH], 1000).await.unwrap();
        assert!(positions.is_empty());
        assert!(reader.batches.lock().is_empty());
    }

    #[tokio::test]
    async fn test_batch_failure_aborts() {
        let reader = MockReader::new(0);
        reader.fail_at(FailPoint::AccountData);
        let err = fetch_positions(&reader, &accounts(3), &[WETH], 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
    }
}
