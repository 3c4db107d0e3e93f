//! Canonical transaction bodies.
//!
//! A body is the ledger-native representation of one operation, built exactly once per call from
//! its decoded descriptor. It carries domain fields only (ids, amounts, keys) and no EVM
//! concepts, so the same body feeds fee pricing and record construction regardless of the call
//! having originated from contract bytecode.

use alloy_primitives::Bytes;

use crate::{
    ledger::{CustomFee, Key, TokenExpiry, TokenKeys},
    types::{AccountId, TokenId, TokenType},
};

/// A signed balance adjustment within a transfer body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountAmount {
    /// The adjusted account.
    pub account: AccountId,
    /// Signed adjustment; debits negative, credits positive.
    pub amount: i64,
    /// Whether the adjustment is authorized by an allowance.
    pub is_approval: bool,
}

/// An NFT ownership change within a transfer body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NftTransferLeg {
    /// Current owner of record.
    pub sender: AccountId,
    /// New owner.
    pub receiver: AccountId,
    /// The exchanged serial.
    pub serial: i64,
    /// Whether the exchange is authorized by an approval.
    pub is_approval: bool,
}

/// All transfer legs scoped to one token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenTransferList {
    /// The scoping token.
    pub token: TokenId,
    /// Fungible adjustments.
    pub transfers: Vec<AccountAmount>,
    /// NFT legs, in encounter order.
    pub nft_transfers: Vec<NftTransferLeg>,
}

/// The canonical transfer body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CryptoTransferBody {
    /// Hbar adjustments.
    pub hbar_transfers: Vec<AccountAmount>,
    /// Per-token transfer lists; token ids never repeat.
    pub token_transfers: Vec<TokenTransferList>,
}

/// A mint body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMintBody {
    /// The minted token.
    pub token: TokenId,
    /// Fungible amount; zero for NFT mints.
    pub amount: i64,
    /// Per-serial metadata for NFT mints.
    pub metadata: Vec<Bytes>,
}

/// A burn body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBurnBody {
    /// The burned token.
    pub token: TokenId,
    /// Fungible amount; zero for NFT burns.
    pub amount: i64,
    /// Burned serials.
    pub serial_numbers: Vec<i64>,
}

/// A wipe body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenWipeBody {
    /// The wiped token.
    pub token: TokenId,
    /// The wiped account.
    pub account: AccountId,
    /// Fungible amount; zero for NFT wipes.
    pub amount: i64,
    /// Wiped serials.
    pub serial_numbers: Vec<i64>,
}

/// An associate/dissociate body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAssociateBody {
    /// The account whose relationships change.
    pub account: AccountId,
    /// The affected tokens, in call order.
    pub tokens: Vec<TokenId>,
}

/// A freeze/unfreeze/KYC body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccountFlagBody {
    /// The scoping token.
    pub token: TokenId,
    /// The affected account.
    pub account: AccountId,
}

/// A token update body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUpdateBody {
    /// The updated token.
    pub token: TokenId,
    /// New name, empty meaning unchanged.
    pub name: String,
    /// New symbol, empty meaning unchanged.
    pub symbol: String,
    /// New memo, empty meaning unchanged.
    pub memo: String,
    /// New treasury, if stated.
    pub treasury: Option<AccountId>,
    /// Replacement keys for the roles present.
    pub keys: TokenKeys,
    /// New expiry metadata.
    pub expiry: TokenExpiry,
}

/// A key replacement body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUpdateKeysBody {
    /// The updated token.
    pub token: TokenId,
    /// (role bit set value, key) pairs in call order.
    pub keys: Vec<(u8, Key)>,
}

/// A token create body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCreateBody {
    /// Fungible or non-fungible.
    pub token_type: TokenType,
    /// Name of the new token.
    pub name: String,
    /// Symbol of the new token.
    pub symbol: String,
    /// Memo of the new token.
    pub memo: String,
    /// Treasury account.
    pub treasury: AccountId,
    /// Initial fungible supply.
    pub initial_supply: i64,
    /// Display decimals.
    pub decimals: u32,
    /// Whether the supply is capped.
    pub supply_type_finite: bool,
    /// Maximum supply for finite tokens.
    pub max_supply: i64,
    /// Whether new relationships start frozen.
    pub freeze_default: bool,
    /// Role-indexed keys.
    pub keys: TokenKeys,
    /// Expiry metadata.
    pub expiry: TokenExpiry,
    /// Custom fee schedule.
    pub custom_fees: Vec<CustomFee>,
}

/// An allowance grant body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoApproveAllowanceBody {
    /// The granting owner.
    pub owner: AccountId,
    /// The scoping token.
    pub token: TokenId,
    /// The spender or operator.
    pub spender: AccountId,
    /// Fungible allowance amount, if fungible.
    pub amount: Option<i64>,
    /// Approved serial, if non-fungible.
    pub serial_number: Option<i64>,
    /// Approve-for-all grant or revocation, if an operator approval.
    pub approved_for_all: Option<bool>,
}

/// The canonical transaction built from one decoded call.
///
/// Immutable after construction; shared by the pricing utility and the record sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionBody {
    /// Any transfer-family call.
    CryptoTransfer(CryptoTransferBody),
    /// `mintToken`
    TokenMint(TokenMintBody),
    /// `burnToken`
    TokenBurn(TokenBurnBody),
    /// Wipe calls.
    TokenWipe(TokenWipeBody),
    /// Associate calls.
    TokenAssociate(TokenAssociateBody),
    /// Dissociate calls.
    TokenDissociate(TokenAssociateBody),
    /// `freezeToken`
    TokenFreeze(TokenAccountFlagBody),
    /// `unfreezeToken`
    TokenUnfreeze(TokenAccountFlagBody),
    /// `grantTokenKyc`
    TokenGrantKyc(TokenAccountFlagBody),
    /// `revokeTokenKyc`
    TokenRevokeKyc(TokenAccountFlagBody),
    /// `pauseToken`
    TokenPause {
        /// The paused token.
        token: TokenId,
    },
    /// `unpauseToken`
    TokenUnpause {
        /// The unpaused token.
        token: TokenId,
    },
    /// `deleteToken`
    TokenDelete {
        /// The deleted token.
        token: TokenId,
    },
    /// Update calls (both ABI versions).
    TokenUpdate(TokenUpdateBody),
    /// `updateTokenKeys`
    TokenUpdateKeys(TokenUpdateKeysBody),
    /// `updateTokenExpiryInfo`
    TokenUpdateExpiry {
        /// The updated token.
        token: TokenId,
        /// New expiry metadata.
        expiry: TokenExpiry,
    },
    /// The create family.
    TokenCreate(TokenCreateBody),
    /// The approve/setApprovalForAll family.
    CryptoApproveAllowance(CryptoApproveAllowanceBody),
    /// Marker body for read-only operations, kept for record construction.
    ViewCall,
}
