//! The token service system contract engine.
//!
//! Smart-contract bytecode reaches native token operations by calling a fixed system-contract
//! address with ABI-encoded arguments. This crate implements everything between that call and
//! the committed ledger state: selector dispatch over two ABI dialects, decoding into typed
//! operation descriptors, synthetic transaction construction, fee and gas pricing against a
//! live exchange rate, signature-authorization gating, domain logic application over staged
//! ledger tables, and the commit-or-rollback protocol that keeps every replica byte-identical.
//!
//! External collaborators (the signature oracle, canonical price and exchange-rate providers,
//! and the record sink) are traits; the engine is deterministic given their answers.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod abi;

pub mod codec;

mod config;
pub use config::*;

mod exec;
pub use exec::*;

pub mod ledger;

mod pricing;
pub use pricing::*;

mod records;
pub use records::*;

mod sigs;
pub use sigs::*;

mod status;
pub use status::*;

mod synth;
pub use synth::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

mod types;
pub use types::*;
