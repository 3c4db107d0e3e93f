//! Typed operation descriptors produced by the decoder layer.
//!
//! Wrappers are immutable value types constructed only from validated ABI input; no handler ever
//! sees raw calldata. Numeric fields have already been through overflow-checked narrowing and
//! addresses through alias resolution by the time a wrapper exists.

use alloy_primitives::Bytes;

use crate::{
    ledger::{CustomFee, Key, TokenExpiry, TokenKeys},
    types::{AccountId, TokenId, TokenType},
};

/// An hbar transfer leg: exactly one of `sender`/`receiver` is set, `amount` is non-negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HbarTransfer {
    /// Transferred amount in tinybars (non-negative).
    pub amount: i64,
    /// Debited account, if this is the debit half.
    pub sender: Option<AccountId>,
    /// Credited account, if this is the credit half.
    pub receiver: Option<AccountId>,
    /// Whether the debit is authorized by an allowance instead of a signature.
    pub is_approval: bool,
}

/// A fungible token transfer leg scoped to one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FungibleTokenTransfer {
    /// The denominating token.
    pub token: TokenId,
    /// Transferred amount in the token's smallest units (non-negative).
    pub amount: i64,
    /// Debited account, if this is the debit half.
    pub sender: Option<AccountId>,
    /// Credited account, if this is the credit half.
    pub receiver: Option<AccountId>,
    /// Whether the debit is authorized by an allowance instead of a signature.
    pub is_approval: bool,
}

impl FungibleTokenTransfer {
    /// A two-sided transfer: `sender` debited, `receiver` credited.
    pub fn two_sided(
        token: TokenId,
        amount: i64,
        sender: AccountId,
        receiver: AccountId,
        is_approval: bool,
    ) -> Self {
        Self { token, amount, sender: Some(sender), receiver: Some(receiver), is_approval }
    }
}

/// An NFT ownership exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NftExchange {
    /// The non-fungible token type.
    pub token: TokenId,
    /// The exchanged serial number.
    pub serial: i64,
    /// Current owner of record as stated by the call.
    pub sender: AccountId,
    /// New owner.
    pub receiver: AccountId,
    /// Whether the exchange is authorized by an approval.
    pub is_approval: bool,
}

/// Transfer legs scoped to one token id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenTransferWrapper {
    /// The scoping token.
    pub token: TokenId,
    /// Fungible adjustments.
    pub fungible_transfers: Vec<FungibleTokenTransfer>,
    /// NFT exchanges, in call order.
    pub nft_exchanges: Vec<NftExchange>,
}

/// The full transfer plan of one call: hbar legs plus per-token legs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CryptoTransferWrapper {
    /// Hbar legs.
    pub hbar_transfers: Vec<HbarTransfer>,
    /// Token-scoped legs, in call order.
    pub token_transfers: Vec<TokenTransferWrapper>,
}

/// A mint of fungible units or new NFT serials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintWrapper {
    /// The target token.
    pub token: TokenId,
    /// Fungible amount; zero for NFT mints.
    pub amount: i64,
    /// Metadata blobs, one per minted serial; empty for fungible mints.
    pub metadata: Vec<Bytes>,
}

impl MintWrapper {
    /// Whether this mints fungible units.
    pub fn is_fungible(&self) -> bool {
        self.amount > 0
    }
}

/// A burn of fungible units or existing NFT serials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurnWrapper {
    /// The target token.
    pub token: TokenId,
    /// Fungible amount; zero for NFT burns.
    pub amount: i64,
    /// Burned serial numbers; empty for fungible burns.
    pub serial_numbers: Vec<i64>,
}

impl BurnWrapper {
    /// Whether this burns fungible units.
    pub fn is_fungible(&self) -> bool {
        self.amount > 0
    }
}

/// A wipe of fungible units or NFT serials from one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WipeWrapper {
    /// The target token.
    pub token: TokenId,
    /// The account being wiped.
    pub account: AccountId,
    /// Fungible amount; zero for NFT wipes.
    pub amount: i64,
    /// Wiped serial numbers; empty for fungible wipes.
    pub serial_numbers: Vec<i64>,
}

/// An association of one account with one or more tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    /// The associating account.
    pub account: AccountId,
    /// Tokens to associate, in call order.
    pub tokens: Vec<TokenId>,
}

/// A dissociation of one account from one or more tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dissociation {
    /// The dissociating account.
    pub account: AccountId,
    /// Tokens to dissociate, in call order.
    pub tokens: Vec<TokenId>,
}

/// Freeze or unfreeze one account for one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenFreezeWrapper {
    /// The scoping token.
    pub token: TokenId,
    /// The affected account.
    pub account: AccountId,
}

/// Grant or revoke KYC for one account on one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantRevokeKycWrapper {
    /// The scoping token.
    pub token: TokenId,
    /// The affected account.
    pub account: AccountId,
}

/// Pause or unpause a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PauseWrapper {
    /// The affected token.
    pub token: TokenId,
}

/// Delete a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteWrapper {
    /// The deleted token.
    pub token: TokenId,
}

/// Update a token's mutable metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUpdateWrapper {
    /// The updated token.
    pub token: TokenId,
    /// New name, if non-empty.
    pub name: String,
    /// New symbol, if non-empty.
    pub symbol: String,
    /// New memo, if non-empty.
    pub memo: String,
    /// New treasury, if stated.
    pub treasury: Option<AccountId>,
    /// Replacement keys for the roles present.
    pub keys: TokenKeys,
    /// New expiry metadata.
    pub expiry: TokenExpiry,
}

/// Replace a token's keys for the roles named in the bit sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUpdateKeysWrapper {
    /// The updated token.
    pub token: TokenId,
    /// (role bit set, key) pairs in call order.
    pub keys: Vec<(TokenKeyType, Key)>,
}

/// Update a token's expiry metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenExpiryWrapper {
    /// The updated token.
    pub token: TokenId,
    /// New expiry metadata.
    pub expiry: TokenExpiry,
}

bitflags::bitflags! {
    /// The role bit set carried in the ABI's `TokenKey.keyType` field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TokenKeyType: u8 {
        /// Update/delete authority.
        const ADMIN = 1;
        /// KYC authority.
        const KYC = 2;
        /// Freeze authority.
        const FREEZE = 4;
        /// Wipe authority.
        const WIPE = 8;
        /// Mint/burn authority.
        const SUPPLY = 16;
        /// Fee schedule authority.
        const FEE_SCHEDULE = 32;
        /// Pause authority.
        const PAUSE = 64;
    }
}

/// Create a new token type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCreateWrapper {
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
    /// Initial supply in smallest units (fungible only).
    pub initial_supply: i64,
    /// Display decimals (fungible only).
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

/// Grant or adjust an allowance for a spender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveWrapper {
    /// The scoping token.
    pub token: TokenId,
    /// The spender being approved.
    pub spender: AccountId,
    /// Fungible allowance amount, if the token is fungible.
    pub amount: Option<i64>,
    /// Approved serial number, if the token is non-fungible.
    pub serial_number: Option<i64>,
}

/// Approve or revoke an operator for all serials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetApprovalForAllWrapper {
    /// The scoping token.
    pub token: TokenId,
    /// The operator.
    pub operator: AccountId,
    /// Grant (`true`) or revoke (`false`).
    pub approved: bool,
}

/// Query the remaining allowance of a spender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowanceWrapper {
    /// The scoping token.
    pub token: TokenId,
    /// The granting owner.
    pub owner: AccountId,
    /// The spender.
    pub spender: AccountId,
}

/// Query the approved spender of a serial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetApprovedWrapper {
    /// The scoping token.
    pub token: TokenId,
    /// The serial number.
    pub serial_number: i64,
}

/// Query whether an operator is approved for all serials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsApproveForAllWrapper {
    /// The scoping token.
    pub token: TokenId,
    /// The owner.
    pub owner: AccountId,
    /// The operator.
    pub operator: AccountId,
}

/// Query a fungible balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceOfWrapper {
    /// The scoping token.
    pub token: TokenId,
    /// The queried account.
    pub account: AccountId,
}

/// Query the owner of a serial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerOfWrapper {
    /// The scoping token.
    pub token: TokenId,
    /// The serial number.
    pub serial_number: i64,
}

/// Query the metadata URI of a serial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenUriWrapper {
    /// The scoping token.
    pub token: TokenId,
    /// The serial number.
    pub serial_number: i64,
}

/// Query a KYC or freeze flag for an account on a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountFlagQueryWrapper {
    /// The scoping token.
    pub token: TokenId,
    /// The queried account.
    pub account: AccountId,
}

/// Query token-level info.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenInfoWrapper {
    /// The queried token.
    pub token: TokenId,
    /// A serial number, for non-fungible info queries.
    pub serial_number: Option<i64>,
}

/// Query a token-level key by role bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetTokenKeyWrapper {
    /// The queried token.
    pub token: TokenId,
    /// The role bit set (exactly one bit).
    pub key_type: TokenKeyType,
}

/// A read-only operation's decoded form, dispatched on the view path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOp {
    /// `getTokenInfo`
    TokenInfo(TokenInfoWrapper),
    /// `getFungibleTokenInfo`
    FungibleTokenInfo(TokenInfoWrapper),
    /// `getNonFungibleTokenInfo`
    NonFungibleTokenInfo(TokenInfoWrapper),
    /// `getTokenCustomFees`
    TokenCustomFees(TokenInfoWrapper),
    /// `getTokenDefaultFreezeStatus`
    DefaultFreezeStatus(TokenInfoWrapper),
    /// `getTokenDefaultKycStatus`
    DefaultKycStatus(TokenInfoWrapper),
    /// `getTokenKey`
    TokenKey(GetTokenKeyWrapper),
    /// `getTokenType`
    TokenType(TokenInfoWrapper),
    /// `getTokenExpiryInfo`
    TokenExpiryInfo(TokenInfoWrapper),
    /// `isKyc`
    IsKyc(AccountFlagQueryWrapper),
    /// `isFrozen`
    IsFrozen(AccountFlagQueryWrapper),
    /// `isToken`
    IsToken(TokenInfoWrapper),
    /// native `allowance`
    Allowance(AllowanceWrapper),
    /// native `getApproved`
    GetApproved(GetApprovedWrapper),
    /// native `isApprovedForAll`
    IsApprovedForAll(IsApproveForAllWrapper),
    /// ERC `name`
    ErcName(TokenId),
    /// ERC `symbol`
    ErcSymbol(TokenId),
    /// ERC `decimals`
    ErcDecimals(TokenId),
    /// ERC `totalSupply`
    ErcTotalSupply(TokenId),
    /// ERC `balanceOf`
    ErcBalanceOf(BalanceOfWrapper),
    /// ERC `ownerOf`
    ErcOwnerOf(OwnerOfWrapper),
    /// ERC `tokenURI`
    ErcTokenUri(TokenUriWrapper),
    /// ERC `allowance`
    ErcAllowance(AllowanceWrapper),
    /// ERC `getApproved`
    ErcGetApproved(GetApprovedWrapper),
    /// ERC `isApprovedForAll`
    ErcIsApprovedForAll(IsApproveForAllWrapper),
}

/// The decoded intent of one system-contract call.
///
/// One variant per operation kind; the execution engine drives every variant through the same
/// prepare/price/authorize/apply/commit protocol without any runtime type inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtsCall {
    /// Any of the transfer-family selectors, normalized into one plan.
    Transfer(CryptoTransferWrapper),
    /// `mintToken`
    Mint(MintWrapper),
    /// `burnToken`
    Burn(BurnWrapper),
    /// `wipeTokenAccount` / `wipeTokenAccountNFT`
    Wipe(WipeWrapper),
    /// `associateToken(s)`
    Associate(Association),
    /// `dissociateToken(s)`
    Dissociate(Dissociation),
    /// `freezeToken`
    Freeze(TokenFreezeWrapper),
    /// `unfreezeToken`
    Unfreeze(TokenFreezeWrapper),
    /// `grantTokenKyc`
    GrantKyc(GrantRevokeKycWrapper),
    /// `revokeTokenKyc`
    RevokeKyc(GrantRevokeKycWrapper),
    /// `pauseToken`
    Pause(PauseWrapper),
    /// `unpauseToken`
    Unpause(PauseWrapper),
    /// `deleteToken`
    Delete(DeleteWrapper),
    /// `updateTokenInfo` (either version)
    Update(TokenUpdateWrapper),
    /// `updateTokenKeys`
    UpdateKeys(TokenUpdateKeysWrapper),
    /// `updateTokenExpiryInfo`
    UpdateExpiry(TokenExpiryWrapper),
    /// `createFungibleToken` family
    Create(TokenCreateWrapper),
    /// native/ERC `approve` and `approveNFT`
    Approve {
        /// The decoded approval.
        op: ApproveWrapper,
        /// The owner granting it (the effective caller).
        owner: AccountId,
    },
    /// native/ERC `setApprovalForAll`
    SetApprovalForAll {
        /// The decoded operator approval.
        op: SetApprovalForAllWrapper,
        /// The owner granting it (the effective caller).
        owner: AccountId,
    },
    /// Read-only operations.
    View(ViewOp),
}
