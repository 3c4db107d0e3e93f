//! Externalized records of system-contract calls.
//!
//! Every call produces exactly one record: successful calls carry the canonical body and the
//! side effects observed during logic application; failed calls carry the failure status and no
//! side effects. The sink is an external collaborator (the node's record stream); an in-memory
//! sink is provided for tests and auditing.

use alloy_primitives::Bytes;

use crate::{ledger::SideEffect, status::ResponseCode, synth::TransactionBody};

/// The externally visible record of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxnRecord {
    /// The canonical transaction the call resolved to, if it got far enough to build one.
    pub body: Option<TransactionBody>,
    /// Final status of the call.
    pub status: ResponseCode,
    /// Ledger-visible effects, in production order. Empty unless the call committed.
    pub side_effects: Vec<SideEffect>,
    /// The gas requirement charged to the frame.
    pub gas_requirement: u64,
    /// The encoded call result, when result export is enabled.
    pub result: Option<Bytes>,
}

/// Consumes one record per call.
#[auto_impl::auto_impl(&mut, Box)]
pub trait RecordSink {
    /// Accepts the record of a completed call.
    fn track(&mut self, record: TxnRecord);
}

/// A sink that keeps records in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecords {
    records: Vec<TxnRecord>,
}

impl InMemoryRecords {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The records tracked so far, oldest first.
    pub fn records(&self) -> &[TxnRecord] {
        &self.records
    }

    /// The most recent record.
    pub fn last(&self) -> Option<&TxnRecord> {
        self.records.last()
    }
}

impl RecordSink for InMemoryRecords {
    fn track(&mut self, record: TxnRecord) {
        self.records.push(record);
    }
}
