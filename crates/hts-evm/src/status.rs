//! Protocol status codes returned by the token service system contract.
//!
//! Every state-changing call resolves to exactly one of these codes, encoded as a single
//! left-padded 32-byte word in the call output. The numeric values are part of the replicated
//! protocol and are frozen: changing one would make independently operated nodes disagree on the
//! bytes of a call result.

/// Outcome of validating or applying a token service operation.
///
/// `Ok` is the validation-level "nothing wrong" code; `Success` is the code externalized for a
/// completed call. Everything else is a terminal, recoverable failure for the current call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum ResponseCode {
    /// The operation passed validation.
    Ok = 0,
    /// A required signature was missing or invalid.
    InvalidSignature = 7,
    /// The payer cannot cover the assessed fee.
    InsufficientPayerBalance = 10,
    /// The operation is disabled or not implemented on this network.
    NotSupported = 13,
    /// The referenced account does not exist.
    InvalidAccountId = 15,
    /// An internal invariant was violated while handling the call.
    FailInvalid = 21,
    /// The operation completed and its effects were committed.
    Success = 22,
    /// The calling frame did not have enough gas left to cover the requirement.
    InsufficientGas = 30,
    /// The referenced token does not exist.
    InvalidTokenId = 167,
    /// The token was deleted and can no longer be operated on.
    TokenWasDeleted = 170,
    /// The account's relationship with the token is frozen.
    AccountFrozenForToken = 172,
    /// The token has no supply key, so mint/burn cannot be performed.
    TokenHasNoSupplyKey = 173,
    /// The token has no KYC key, so KYC cannot be granted or revoked.
    TokenHasNoKycKey = 174,
    /// The token has no freeze key, so accounts cannot be frozen or unfrozen.
    TokenHasNoFreezeKey = 175,
    /// The token has no wipe key, so balances cannot be wiped.
    TokenHasNoWipeKey = 176,
    /// The token has no pause key, so it cannot be paused or unpaused.
    TokenHasNoPauseKey = 177,
    /// The account's token balance is smaller than the requested debit.
    InsufficientTokenBalance = 178,
    /// Minting would push the supply past the token's configured maximum.
    TokenMaxSupplyReached = 179,
    /// The account has not granted KYC for the token.
    AccountKycNotGrantedForToken = 180,
    /// The treasury account's balance cannot be wiped.
    CannotWipeTokenTreasuryAccount = 181,
    /// The referenced NFT serial number does not exist.
    InvalidNftId = 182,
    /// The token is paused; no operations may touch it.
    TokenIsPaused = 183,
    /// The account is not associated with the token.
    TokenNotAssociatedToAccount = 184,
    /// The account is already associated with the token.
    TokenAlreadyAssociatedToAccount = 185,
    /// The operation may not target the token's treasury account.
    AccountIsTreasury = 186,
    /// The burn amount is zero, negative, or exceeds the circulating supply.
    InvalidTokenBurnAmount = 187,
    /// The mint amount is zero or negative.
    InvalidTokenMintAmount = 188,
    /// The wipe amount is zero, negative, or exceeds the account's balance.
    InvalidWipingAmount = 189,
    /// The stated sender is not the owner of record for the NFT serial.
    SenderDoesNotOwnNftSerialNo = 190,
    /// The operator has no approval for the NFT being transferred.
    SpenderDoesNotHaveAllowance = 191,
    /// The transfer amount exceeds the spender's remaining allowance.
    AmountExceedsAllowance = 192,
    /// The allowance owner account is missing or invalid.
    InvalidAllowanceOwnerId = 193,
    /// The serial number is out of range for the token.
    InvalidTokenNftSerialNumber = 194,
    /// The treasury account for a new token is missing or invalid.
    InvalidTreasuryAccountForToken = 195,
    /// Burned serials must currently be held by the treasury.
    TreasuryMustOwnBurnedNft = 196,
    /// Wiped serials must currently be held by the wiped account.
    AccountDoesNotOwnWipedNft = 197,
    /// Dissociation requires the relationship balance to be zero.
    TransactionRequiresZeroTokenBalances = 198,
    /// The token has no admin key and cannot be updated or deleted.
    TokenIsImmutable = 199,
    /// The sender key never signed the wrapping transaction with a usable prefix.
    InvalidFullPrefixSignatureForPrecompile = 200,
    /// Value was sent along with a call that does not accept value.
    InvalidFeeSubmitted = 201,
    /// A transfer list does not net to zero for hbar or for some token.
    InvalidAccountAmounts = 202,
    /// An allowance amount was negative.
    NegativeAllowanceAmount = 203,
    /// The token has no fee schedule key, so its fee schedule cannot be updated.
    TokenHasNoFeeScheduleKey = 204,
}

impl ResponseCode {
    /// Returns the frozen numeric protocol value of the code.
    pub const fn protocol_id(self) -> i64 {
        self as i64
    }

    /// Whether this code reports a completed, committed operation.
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::Ok)
    }
}

impl core::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?} ({})", self.protocol_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_ids_are_frozen() {
        // Spot-check the anchors other components rely on. These values are consensus-visible
        // and must never drift.
        assert_eq!(ResponseCode::Ok.protocol_id(), 0);
        assert_eq!(ResponseCode::InvalidSignature.protocol_id(), 7);
        assert_eq!(ResponseCode::Success.protocol_id(), 22);
        assert_eq!(ResponseCode::InsufficientGas.protocol_id(), 30);
        assert_eq!(ResponseCode::InvalidTokenId.protocol_id(), 167);
        assert_eq!(ResponseCode::InsufficientTokenBalance.protocol_id(), 178);
        assert_eq!(ResponseCode::TokenNotAssociatedToAccount.protocol_id(), 184);
    }

    #[test]
    fn success_predicate() {
        assert!(ResponseCode::Success.is_success());
        assert!(ResponseCode::Ok.is_success());
        assert!(!ResponseCode::InvalidTokenId.is_success());
    }
}
