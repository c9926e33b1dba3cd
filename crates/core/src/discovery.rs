//! Borrower candidate discovery from Withdraw logs.
//!
//! Comet has no "list borrowers" call. Any account that withdrew a positive
//! amount may hold a borrow, and every account already known to borrow may
//! still do so. The union of both sets is re-checked against live balances.

use alloy::primitives::Address;
use comet_monitor_chain::{BlockSpan, MarketReader};
use std::collections::BTreeSet;
use tracing::debug;

use crate::error::Result;

/// Splits the half-open block range `[from, to)` into inclusive spans of at
/// most `span` blocks.
#[derive(Debug, Clone)]
pub struct BlockChunks {
    next: u64,
    end: u64,
    span: u64,
}

impl BlockChunks {
    pub fn new(from: u64, to: u64, span: u64) -> Self {
        Self {
            next: from,
            end: to,
            span: span.max(1),
        }
    }
}

impl Iterator for BlockChunks {
    type Item = BlockSpan;

    fn next(&mut self) -> Option<BlockSpan> {
        if self.next >= self.end {
            return None;
        }
        let chunk_end = self.next.saturating_add(self.span).min(self.end);
        let span = BlockSpan::new(self.next, chunk_end - 1);
        self.next = chunk_end;
        Some(span)
    }
}

/// Collect candidate borrowers for the block range `[from, to)`.
///
/// Sources of positive withdrawals in the range are unioned with `previous`.
/// Chunks are queried one after another.
pub async fn discover_candidates(
    reader: &dyn MarketReader,
    from: u64,
    to: u64,
    chunk_span: u64,
    previous: impl IntoIterator<Item = Address>,
) -> Result<BTreeSet<Address>> {
    let mut candidates: BTreeSet<Address> = previous.into_iter().collect();
    let known = candidates.len();

    for span in BlockChunks::new(from, to, chunk_span) {
        let events = reader.withdrawals(span).await?;
        debug!(
            from = span.from,
            to = span.to,
            events = events.len(),
            "Scanned withdraw logs"
        );
        candidates.extend(events.iter().filter(|e| e.is_borrow_signal()).map(|e| e.src));
    }

    debug!(
        from,
        to,
        previous = known,
        candidates = candidates.len(),
        "Discovered borrower candidates"
    );
    Ok(candidates)
}
