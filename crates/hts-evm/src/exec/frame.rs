//! Per-invocation call context.

use alloy_primitives::{Address, Bytes};

use crate::{ledger::WorldLedgers, types::AccountId, types::Timestamp};

/// The calling frame's view of one system-contract invocation.
///
/// Created at dispatch entry and discarded at call exit; never persisted. The frame exclusively
/// owns the ledger facade for the duration of the call chain; a nested invocation borrows the
/// same facade and pushes its own staging frame onto it.
#[derive(Debug)]
pub struct MessageFrame<'a> {
    /// The (unaliased) sender address of the frame.
    pub sender: Address,
    /// The called contract address.
    pub recipient: Address,
    /// Value sent with the call, in tinybars.
    pub value: i64,
    /// Gas remaining in the frame before this call.
    pub remaining_gas: u64,
    /// Whether the frame is executing a static call.
    pub is_static: bool,
    /// Consensus second of the enclosing transaction.
    pub timestamp: Timestamp,
    /// The world the call chain operates on.
    pub ledgers: &'a mut WorldLedgers,
    /// Revert reason, set when the call signals revert upstream.
    pub revert_reason: Option<Bytes>,
}

impl<'a> MessageFrame<'a> {
    /// Creates a frame for a top-level call.
    pub fn new(
        sender: Address,
        recipient: Address,
        remaining_gas: u64,
        timestamp: Timestamp,
        ledgers: &'a mut WorldLedgers,
    ) -> Self {
        Self {
            sender,
            recipient,
            value: 0,
            remaining_gas,
            is_static: false,
            timestamp,
            ledgers,
            revert_reason: None,
        }
    }

    /// Marks the frame static.
    pub fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Sets the value sent with the call.
    pub fn with_value(mut self, value: i64) -> Self {
        self.value = value;
        self
    }

    /// The sender resolved to an account id, defaulting to the missing id for unknown aliases.
    pub fn sender_account(&self) -> AccountId {
        self.ledgers.resolve_account(self.sender)
    }

    /// Flags revert with the given reason.
    pub fn set_revert(&mut self, reason: &'static [u8]) {
        self.revert_reason = Some(Bytes::from_static(reason));
    }
}
