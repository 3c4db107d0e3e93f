//! Decoding of calldata into operation descriptors and encoding of results.

pub mod decoders;
pub use decoders::{DecodeError, DecodeResult};

pub mod encoding;

mod wrappers;
pub use wrappers::*;
