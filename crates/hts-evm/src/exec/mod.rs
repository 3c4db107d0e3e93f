//! The execution engine: dispatch, call frames, logic collaborators and the state machine.

use alloy_primitives::{address, Address};

mod dispatch;
pub use dispatch::*;

mod frame;
pub use frame::*;

mod logic;
pub use logic::*;

mod machine;
pub use machine::*;

mod view;
pub use view::*;

/// The address contracts call to reach the token service.
pub const SYSTEM_CONTRACT_ADDRESS: Address = address!("0000000000000000000000000000000000000167");
