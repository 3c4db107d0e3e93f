//! Synthetic transaction construction.

mod body;
pub use body::*;

mod factory;
pub use factory::*;
