//! Core identifier and entity types shared across the engine.
//!
//! Entities are addressed by 64-bit entity numbers (shard and realm are fixed at zero for this
//! network). An entity number maps to the EVM address space as a "long-zero" address: twelve zero
//! bytes followed by the big-endian number. Any 20-byte address that is not long-zero is an alias
//! and must be resolved through [`crate::ledger::AliasResolver`] before it can name an entity.

use alloy_primitives::Address;

/// Number of leading zero bytes in a long-zero EVM address.
const LONG_ZERO_PREFIX_LEN: usize = 12;

/// A ledger account, addressed by entity number.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    derive_more::Display,
    serde::Serialize,
    serde::Deserialize,
)]
#[display("0.0.{_0}")]
pub struct AccountId(pub u64);

/// A token type, addressed by entity number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, derive_more::Display,
)]
#[display("0.0.{_0}")]
pub struct TokenId(pub u64);

/// A single minted serial of a non-fungible token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NftId {
    /// The non-fungible token type.
    pub token: TokenId,
    /// The serial number within the token type.
    pub serial: i64,
}

impl NftId {
    /// Creates an NFT id from its token type and serial number.
    pub const fn new(token: TokenId, serial: i64) -> Self {
        Self { token, serial }
    }
}

impl AccountId {
    /// The default (missing) account id, entity number zero.
    pub const MISSING: Self = Self(0);

    /// Returns the long-zero EVM address for this account.
    pub fn to_evm_address(self) -> Address {
        long_zero_address(self.0)
    }

    /// Interprets a long-zero EVM address as an account id.
    ///
    /// Returns `None` for aliased (non-long-zero) addresses; callers must resolve those first.
    pub fn from_evm_address(address: Address) -> Option<Self> {
        entity_num_of(address).map(Self)
    }

    /// Whether this is the default "no account" id.
    pub const fn is_missing(self) -> bool {
        self.0 == 0
    }
}

impl TokenId {
    /// The default (missing) token id, entity number zero.
    pub const MISSING: Self = Self(0);

    /// Returns the long-zero EVM address for this token.
    pub fn to_evm_address(self) -> Address {
        long_zero_address(self.0)
    }

    /// Interprets a long-zero EVM address as a token id.
    pub fn from_evm_address(address: Address) -> Option<Self> {
        entity_num_of(address).map(Self)
    }

    /// Whether this is the default "no token" id.
    pub const fn is_missing(self) -> bool {
        self.0 == 0
    }
}

/// Builds the long-zero address for an entity number.
pub fn long_zero_address(num: u64) -> Address {
    let mut bytes = [0u8; 20];
    bytes[LONG_ZERO_PREFIX_LEN..].copy_from_slice(&num.to_be_bytes());
    Address::from(bytes)
}

/// Extracts the entity number from a long-zero address, or `None` if the address is an alias.
pub fn entity_num_of(address: Address) -> Option<u64> {
    let bytes = address.as_slice();
    if bytes[..LONG_ZERO_PREFIX_LEN].iter().any(|b| *b != 0) {
        return None;
    }
    let mut num = [0u8; 8];
    num.copy_from_slice(&bytes[LONG_ZERO_PREFIX_LEN..]);
    Some(u64::from_be_bytes(num))
}

/// Whether the address is in the long-zero ("mirror") form.
pub fn is_mirror_address(address: Address) -> bool {
    entity_num_of(address).is_some()
}

/// The kind of a token type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenType {
    /// Interchangeable units with a common denomination.
    #[default]
    FungibleCommon,
    /// Uniquely identified serials with per-serial metadata.
    NonFungibleUnique,
}

impl TokenType {
    /// Whether the token is fungible.
    pub const fn is_fungible(self) -> bool {
        matches!(self, Self::FungibleCommon)
    }
}

/// A consensus second, as observed by the executing frame.
pub type Timestamp = i64;

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn long_zero_round_trip() {
        let id = AccountId(0x3ea);
        let address = id.to_evm_address();
        assert_eq!(address, address!("00000000000000000000000000000000000003ea"));
        assert_eq!(AccountId::from_evm_address(address), Some(id));
    }

    #[test]
    fn aliases_are_not_entity_numbers() {
        let alias = address!("3e3d62efc552b8b8a9cf66a93f6bd194b5b1ccf9");
        assert_eq!(entity_num_of(alias), None);
        assert!(!is_mirror_address(alias));
    }

    #[test]
    fn max_entity_number_survives() {
        let id = TokenId(u64::MAX);
        assert_eq!(TokenId::from_evm_address(id.to_evm_address()), Some(id));
    }
}
