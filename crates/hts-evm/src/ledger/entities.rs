//! Value types stored in the ledger tables.

use alloy_primitives::Bytes;
use std::collections::{BTreeMap, BTreeSet};

use crate::types::{AccountId, Timestamp, TokenId, TokenType};

/// An opaque cryptographic key, carried but never interpreted by the engine.
///
/// Key activation is decided by the externally supplied signature oracle; the engine only needs
/// to know whether a role has a key at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Key(pub Bytes);

impl Key {
    /// Creates a key from raw bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }
}

/// The role-indexed key set of a token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenKeys {
    /// Authorizes update and delete.
    pub admin: Option<Key>,
    /// Authorizes KYC grant/revoke.
    pub kyc: Option<Key>,
    /// Authorizes freeze/unfreeze.
    pub freeze: Option<Key>,
    /// Authorizes wiping balances.
    pub wipe: Option<Key>,
    /// Authorizes mint/burn.
    pub supply: Option<Key>,
    /// Authorizes fee schedule updates.
    pub fee_schedule: Option<Key>,
    /// Authorizes pause/unpause.
    pub pause: Option<Key>,
}

/// Expiry metadata of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenExpiry {
    /// Consensus second at which the token expires.
    pub second: Timestamp,
    /// Account charged for auto-renewal, if configured.
    pub auto_renew_account: Option<AccountId>,
    /// Auto-renew period in seconds.
    pub auto_renew_period: i64,
}

/// A custom fee attached to a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomFee {
    /// A flat fee, denominated in hbar or in units of another token.
    Fixed {
        /// Fee amount in the denominating unit.
        amount: i64,
        /// Denominating token; `None` means hbar.
        denominating_token: Option<TokenId>,
        /// The account collecting the fee.
        collector: AccountId,
    },
    /// A fractional fee assessed on fungible transfers.
    Fractional {
        /// Numerator of the assessed fraction.
        numerator: i64,
        /// Denominator of the assessed fraction.
        denominator: i64,
        /// Minimum assessed amount.
        minimum: i64,
        /// Maximum assessed amount, zero meaning unbounded.
        maximum: i64,
        /// Whether the fee is charged on top of the transfer instead of out of it.
        net_of_transfers: bool,
        /// The account collecting the fee.
        collector: AccountId,
    },
    /// A royalty fee assessed on NFT exchanges.
    Royalty {
        /// Numerator of the royalty fraction.
        numerator: i64,
        /// Denominator of the royalty fraction.
        denominator: i64,
        /// Fallback flat fee charged when the exchange carries no fungible value.
        fallback_amount: i64,
        /// Denominating token of the fallback fee; `None` means hbar.
        fallback_token: Option<TokenId>,
        /// The account collecting the fee.
        collector: AccountId,
    },
}

/// A token type as stored in the tokens table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Token {
    /// Fungible or non-fungible.
    pub token_type: TokenType,
    /// Human-readable name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Free-form memo.
    pub memo: String,
    /// Display decimals (fungible only).
    pub decimals: u32,
    /// Circulating supply, in smallest units or minted serial count.
    pub total_supply: i64,
    /// Maximum supply for finite-supply tokens.
    pub max_supply: i64,
    /// Whether the supply is capped at `max_supply`.
    pub supply_type_finite: bool,
    /// The treasury account.
    pub treasury: AccountId,
    /// Role-indexed keys.
    pub keys: TokenKeys,
    /// Expiry metadata.
    pub expiry: TokenExpiry,
    /// Whether new relationships start frozen.
    pub default_freeze_status: bool,
    /// Whether new relationships start KYC-granted.
    pub default_kyc_status: bool,
    /// Whether the token has been deleted.
    pub deleted: bool,
    /// Whether the token is currently paused.
    pub paused: bool,
    /// Custom fee schedule.
    pub custom_fees: Vec<CustomFee>,
    /// Serial number that will be assigned to the next minted NFT.
    pub next_serial: i64,
}

impl Token {
    /// Whether mint/burn style supply operations can possibly be authorized.
    pub fn has_supply_key(&self) -> bool {
        self.keys.supply.is_some()
    }
}

/// An account as stored in the accounts table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Account {
    /// Hbar balance in tinybars.
    pub balance: i64,
    /// The account's key, if any.
    pub key: Option<Key>,
    /// Whether credits to the account require its signature.
    pub receiver_sig_required: bool,
    /// Whether the account has been deleted.
    pub deleted: bool,
    /// Remaining hbar allowances granted by this account, keyed by spender.
    pub hbar_allowances: BTreeMap<AccountId, i64>,
    /// Remaining fungible allowances granted by this account, keyed by (token, spender).
    pub fungible_allowances: BTreeMap<(TokenId, AccountId), i64>,
    /// Operators approved for all serials of a token, keyed by (token, operator).
    pub approved_for_all: BTreeSet<(TokenId, AccountId)>,
}

/// One account's relationship with one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenRelationship {
    /// Balance in the token's smallest units (serial count for NFTs).
    pub balance: i64,
    /// Whether the relationship is frozen.
    pub frozen: bool,
    /// Whether KYC has been granted.
    pub kyc_granted: bool,
}

/// A minted serial of a non-fungible token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Nft {
    /// Current owner. [`AccountId::MISSING`] means the serial is held by the treasury.
    pub owner: AccountId,
    /// Spender approved for this specific serial, if any.
    pub spender: Option<AccountId>,
    /// Immutable metadata attached at mint.
    pub metadata: Bytes,
    /// Consensus second of the mint.
    pub creation_time: Timestamp,
}
