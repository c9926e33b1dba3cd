//! Withdraw event type and block ranges for historical log queries.

use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolEvent;

use crate::contracts::IComet;

/// Keccak256 of `Withdraw(address,address,uint256)`.
pub const WITHDRAW_SIGNATURE: B256 = IComet::Withdraw::SIGNATURE_HASH;

/// Inclusive block span for a single `eth_getLogs` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    pub from: u64,
    pub to: u64,
}

impl BlockSpan {
    pub fn new(from: u64, to: u64) -> Self {
        Self { from, to }
    }

    /// Number of blocks covered.
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.to - self.from + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to < self.from
    }
}

/// Decoded Comet `Withdraw` log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawEvent {
    /// Account the base asset was withdrawn from
    pub src: Address,
    /// Recipient
    pub to: Address,
    /// Raw amount (base asset decimals)
    pub amount: U256,
    /// Block the log was emitted in
    pub block_number: u64,
}

impl WithdrawEvent {
    /// A withdrawal of a positive amount marks `src` as a possible borrower.
    pub fn is_borrow_signal(&self) -> bool {
        !self.amount.is_zero()
    }
}
