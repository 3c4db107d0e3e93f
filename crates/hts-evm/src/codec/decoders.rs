//! Pure decoding functions from ABI calldata into operation descriptors.
//!
//! Every function here is total over its error domain: truncated payloads, malformed structures
//! and 32-byte words that do not fit the 64-bit target domain produce a [`DecodeError`], never a
//! partially constructed wrapper and never a silently wrapped value. Aliased addresses are pushed
//! through the facade's resolver; an unlinked alias collapses to the default (zero) id where the
//! ABI permits it.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;

use super::wrappers::*;
use crate::{
    abi::{IErcToken, IHederaTokenService as Hts, IHederaTokenServiceV2 as HtsV2},
    ledger::{CustomFee, Key, TokenExpiry, TokenKeys, WorldLedgers},
    types::{AccountId, NftId, TokenId, TokenType},
};

/// Why a payload failed to decode.
///
/// A decode failure is structural: the engine treats the call as a no-op at the EVM level and
/// signals revert upstream without touching ledger state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The ABI structure was malformed or truncated.
    #[error("malformed call payload: {0}")]
    Abi(String),
    /// A 32-byte word exceeds the 64-bit domain of its target field.
    #[error("word value does not fit in 64 bits")]
    WordOverflow,
    /// An amount that must be non-negative was negative.
    #[error("amount must be non-negative")]
    NegativeAmount,
    /// Paired arrays (accounts/amounts, senders/receivers) have different lengths.
    #[error("paired array lengths differ")]
    LengthMismatch,
    /// A `redirectForToken` payload was too short to carry a nested call.
    #[error("malformed token redirect payload")]
    MalformedRedirect,
}

impl From<alloy_sol_types::Error> for DecodeError {
    fn from(err: alloy_sol_types::Error) -> Self {
        Self::Abi(err.to_string())
    }
}

/// Result alias for decoders.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Narrows a 32-byte word to `i64`, rejecting values outside the signed 64-bit domain.
pub fn checked_i64(word: U256) -> DecodeResult<i64> {
    i64::try_from(word).map_err(|_| DecodeError::WordOverflow)
}

/// Narrows an unsigned 64-bit ABI value into the signed domain used by ledger amounts.
pub fn checked_amount(raw: u64) -> DecodeResult<i64> {
    i64::try_from(raw).map_err(|_| DecodeError::WordOverflow)
}

/// Reads the low-order 64 bits of an address as a token entity number.
///
/// Token addresses are produced by the ledger itself, so the upper bytes are not interpreted.
pub fn token_from_address(address: Address) -> TokenId {
    let mut num = [0u8; 8];
    num.copy_from_slice(&address.as_slice()[12..]);
    TokenId(u64::from_be_bytes(num))
}

/// Resolves a possibly-aliased address to an account id via the facade's alias links.
pub fn account_from_address(address: Address, ledgers: &WorldLedgers) -> AccountId {
    ledgers.resolve_account(address)
}

fn abi_decode<C: SolCall>(input: &[u8]) -> DecodeResult<C> {
    C::abi_decode(input, true).map_err(DecodeError::from)
}

// --- Transfer family -------------------------------------------------------------------------

/// Decodes version-1 `cryptoTransfer` (no approval flags, no hbar list).
pub fn decode_crypto_transfer(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<CryptoTransferWrapper> {
    let call = abi_decode::<Hts::cryptoTransferCall>(input)?;
    let mut token_transfers = Vec::with_capacity(call.tokenTransfers.len());
    for list in &call.tokenTransfers {
        let token = token_from_address(list.token);
        let mut wrapper = TokenTransferWrapper { token, ..Default::default() };
        for adjust in &list.transfers {
            wrapper.fungible_transfers.push(bind_signed_adjustment(
                token,
                account_from_address(adjust.accountID, ledgers),
                adjust.amount,
                false,
            )?);
        }
        for exchange in &list.nftTransfers {
            wrapper.nft_exchanges.push(NftExchange {
                token,
                serial: exchange.serialNumber,
                sender: account_from_address(exchange.senderAccountID, ledgers),
                receiver: account_from_address(exchange.receiverAccountID, ledgers),
                is_approval: false,
            });
        }
        token_transfers.push(wrapper);
    }
    Ok(CryptoTransferWrapper { hbar_transfers: Vec::new(), token_transfers })
}

/// Decodes version-2 `cryptoTransfer` (hbar list plus per-leg approval flags).
pub fn decode_crypto_transfer_v2(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<CryptoTransferWrapper> {
    let call = abi_decode::<HtsV2::cryptoTransferCall>(input)?;
    let mut hbar_transfers = Vec::with_capacity(call.transferList.transfers.len());
    for adjust in &call.transferList.transfers {
        let account = account_from_address(adjust.accountID, ledgers);
        hbar_transfers.push(if adjust.amount < 0 {
            HbarTransfer {
                amount: adjust.amount.checked_neg().ok_or(DecodeError::WordOverflow)?,
                sender: Some(account),
                receiver: None,
                is_approval: adjust.isApproval,
            }
        } else {
            HbarTransfer {
                amount: adjust.amount,
                sender: None,
                receiver: Some(account),
                is_approval: adjust.isApproval,
            }
        });
    }
    let mut token_transfers = Vec::with_capacity(call.tokenTransfers.len());
    for list in &call.tokenTransfers {
        let token = token_from_address(list.token);
        let mut wrapper = TokenTransferWrapper { token, ..Default::default() };
        for adjust in &list.transfers {
            wrapper.fungible_transfers.push(bind_signed_adjustment(
                token,
                account_from_address(adjust.accountID, ledgers),
                adjust.amount,
                adjust.isApproval,
            )?);
        }
        for exchange in &list.nftTransfers {
            wrapper.nft_exchanges.push(NftExchange {
                token,
                serial: exchange.serialNumber,
                sender: account_from_address(exchange.senderAccountID, ledgers),
                receiver: account_from_address(exchange.receiverAccountID, ledgers),
                is_approval: exchange.isApproval,
            });
        }
        token_transfers.push(wrapper);
    }
    Ok(CryptoTransferWrapper { hbar_transfers, token_transfers })
}

fn bind_signed_adjustment(
    token: TokenId,
    account: AccountId,
    amount: i64,
    is_approval: bool,
) -> DecodeResult<FungibleTokenTransfer> {
    if amount < 0 {
        Ok(FungibleTokenTransfer {
            token,
            amount: amount.checked_neg().ok_or(DecodeError::WordOverflow)?,
            sender: Some(account),
            receiver: None,
            is_approval,
        })
    } else {
        Ok(FungibleTokenTransfer {
            token,
            amount,
            sender: None,
            receiver: Some(account),
            is_approval,
        })
    }
}

/// Decodes `transferTokens`: one token, paired account/amount arrays of signed adjustments.
pub fn decode_transfer_tokens(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<CryptoTransferWrapper> {
    let call = abi_decode::<Hts::transferTokensCall>(input)?;
    if call.accountId.len() != call.amount.len() {
        return Err(DecodeError::LengthMismatch);
    }
    let token = token_from_address(call.token);
    let mut wrapper = TokenTransferWrapper { token, ..Default::default() };
    for (address, amount) in call.accountId.iter().zip(call.amount.iter()) {
        wrapper.fungible_transfers.push(bind_signed_adjustment(
            token,
            account_from_address(*address, ledgers),
            *amount,
            false,
        )?);
    }
    Ok(CryptoTransferWrapper { hbar_transfers: Vec::new(), token_transfers: vec![wrapper] })
}

/// Decodes `transferToken`: a single two-sided fungible transfer. Negative amounts are malformed.
pub fn decode_transfer_token(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<CryptoTransferWrapper> {
    let call = abi_decode::<Hts::transferTokenCall>(input)?;
    if call.amount < 0 {
        return Err(DecodeError::NegativeAmount);
    }
    let token = token_from_address(call.token);
    let transfer = FungibleTokenTransfer::two_sided(
        token,
        call.amount,
        account_from_address(call.sender, ledgers),
        account_from_address(call.receiver, ledgers),
        false,
    );
    Ok(CryptoTransferWrapper {
        hbar_transfers: Vec::new(),
        token_transfers: vec![TokenTransferWrapper {
            token,
            fungible_transfers: vec![transfer],
            nft_exchanges: Vec::new(),
        }],
    })
}

/// Decodes `transferNFTs`: paired sender/receiver/serial arrays.
pub fn decode_transfer_nfts(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<CryptoTransferWrapper> {
    let call = abi_decode::<Hts::transferNFTsCall>(input)?;
    if call.sender.len() != call.receiver.len() || call.sender.len() != call.serialNumber.len() {
        return Err(DecodeError::LengthMismatch);
    }
    let token = token_from_address(call.token);
    let mut wrapper = TokenTransferWrapper { token, ..Default::default() };
    for i in 0..call.sender.len() {
        wrapper.nft_exchanges.push(NftExchange {
            token,
            serial: call.serialNumber[i],
            sender: account_from_address(call.sender[i], ledgers),
            receiver: account_from_address(call.receiver[i], ledgers),
            is_approval: false,
        });
    }
    Ok(CryptoTransferWrapper { hbar_transfers: Vec::new(), token_transfers: vec![wrapper] })
}

/// Decodes `transferNFT`: a single ownership exchange.
pub fn decode_transfer_nft(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<CryptoTransferWrapper> {
    let call = abi_decode::<Hts::transferNFTCall>(input)?;
    let token = token_from_address(call.token);
    let exchange = NftExchange {
        token,
        serial: call.serialNumber,
        sender: account_from_address(call.sender, ledgers),
        receiver: account_from_address(call.receiver, ledgers),
        is_approval: false,
    };
    Ok(CryptoTransferWrapper {
        hbar_transfers: Vec::new(),
        token_transfers: vec![TokenTransferWrapper {
            token,
            fungible_transfers: Vec::new(),
            nft_exchanges: vec![exchange],
        }],
    })
}

/// Decodes the native `transferFrom(address,address,address,uint256)` (fungible allowance
/// transfer).
///
/// The approval flag follows the caller-vs-from rule: a transfer initiated by the owner of the
/// debited balance is not approval-based; anyone else must be spending an allowance.
pub fn decode_transfer_from(
    input: &[u8],
    operator: AccountId,
    ledgers: &WorldLedgers,
) -> DecodeResult<CryptoTransferWrapper> {
    let call = abi_decode::<Hts::transferFromCall>(input)?;
    let token = token_from_address(call.token);
    let from = account_from_address(call.from, ledgers);
    let to = account_from_address(call.to, ledgers);
    let amount = checked_i64(call.amount)?;
    let transfer = FungibleTokenTransfer::two_sided(token, amount, from, to, operator != from);
    Ok(CryptoTransferWrapper {
        hbar_transfers: Vec::new(),
        token_transfers: vec![TokenTransferWrapper {
            token,
            fungible_transfers: vec![transfer],
            nft_exchanges: Vec::new(),
        }],
    })
}

/// Decodes the native `transferFromNFT`.
///
/// The approval flag is owner-based: when the ledger's owner of record for the serial equals the
/// stated `from` party the exchange is not approval-based, otherwise it is. This distinction is
/// load-bearing for authorization and must be preserved exactly.
pub fn decode_transfer_from_nft(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<CryptoTransferWrapper> {
    let call = abi_decode::<Hts::transferFromNFTCall>(input)?;
    let token = token_from_address(call.token);
    let from = account_from_address(call.from, ledgers);
    let to = account_from_address(call.to, ledgers);
    let serial = checked_i64(call.serialNumber)?;
    let owner_of_record = ledgers.owner_of(NftId::new(token, serial));
    let is_approval = owner_of_record != Some(from);
    let exchange = NftExchange { token, serial, sender: from, receiver: to, is_approval };
    Ok(CryptoTransferWrapper {
        hbar_transfers: Vec::new(),
        token_transfers: vec![TokenTransferWrapper {
            token,
            fungible_transfers: Vec::new(),
            nft_exchanges: vec![exchange],
        }],
    })
}

/// Decodes ERC `transfer(address,uint256)` against the redirect token.
pub fn decode_erc_transfer(
    nested: &[u8],
    token: TokenId,
    caller: AccountId,
    ledgers: &WorldLedgers,
) -> DecodeResult<CryptoTransferWrapper> {
    let call = abi_decode::<IErcToken::transferCall>(nested)?;
    let amount = checked_i64(call.amount)?;
    let recipient = account_from_address(call.recipient, ledgers);
    let transfer = FungibleTokenTransfer::two_sided(token, amount, caller, recipient, false);
    Ok(CryptoTransferWrapper {
        hbar_transfers: Vec::new(),
        token_transfers: vec![TokenTransferWrapper {
            token,
            fungible_transfers: vec![transfer],
            nft_exchanges: Vec::new(),
        }],
    })
}

/// Decodes ERC `transferFrom(address,address,uint256)` against the redirect token.
///
/// For a fungible token the third word is an amount and the caller-vs-from rule applies; for a
/// non-fungible token it is a serial number and the owner-of-record rule applies.
pub fn decode_erc_transfer_from(
    nested: &[u8],
    token: TokenId,
    is_fungible: bool,
    operator: AccountId,
    ledgers: &WorldLedgers,
) -> DecodeResult<CryptoTransferWrapper> {
    let call = abi_decode::<IErcToken::transferFromCall>(nested)?;
    let from = account_from_address(call.from, ledgers);
    let to = account_from_address(call.to, ledgers);
    if is_fungible {
        let amount = checked_i64(call.amount)?;
        let transfer = FungibleTokenTransfer::two_sided(token, amount, from, to, operator != from);
        Ok(CryptoTransferWrapper {
            hbar_transfers: Vec::new(),
            token_transfers: vec![TokenTransferWrapper {
                token,
                fungible_transfers: vec![transfer],
                nft_exchanges: Vec::new(),
            }],
        })
    } else {
        let serial = checked_i64(call.amount)?;
        let owner_of_record = ledgers.owner_of(NftId::new(token, serial));
        let is_approval = owner_of_record != Some(from);
        let exchange = NftExchange { token, serial, sender: from, receiver: to, is_approval };
        Ok(CryptoTransferWrapper {
            hbar_transfers: Vec::new(),
            token_transfers: vec![TokenTransferWrapper {
                token,
                fungible_transfers: Vec::new(),
                nft_exchanges: vec![exchange],
            }],
        })
    }
}

// --- Supply, wipe, association --------------------------------------------------------------

/// Decodes `mintToken`. A positive amount mints fungible units; amount zero mints one serial per
/// metadata entry.
pub fn decode_mint(input: &[u8]) -> DecodeResult<MintWrapper> {
    let call = abi_decode::<Hts::mintTokenCall>(input)?;
    let amount = checked_amount(call.amount)?;
    Ok(MintWrapper { token: token_from_address(call.token), amount, metadata: call.metadata })
}

/// Decodes `burnToken`. A positive amount burns fungible units; amount zero burns the serials.
pub fn decode_burn(input: &[u8]) -> DecodeResult<BurnWrapper> {
    let call = abi_decode::<Hts::burnTokenCall>(input)?;
    let amount = checked_amount(call.amount)?;
    Ok(BurnWrapper {
        token: token_from_address(call.token),
        amount,
        serial_numbers: call.serialNumbers,
    })
}

/// Decodes `wipeTokenAccount` (fungible).
pub fn decode_wipe_fungible(input: &[u8], ledgers: &WorldLedgers) -> DecodeResult<WipeWrapper> {
    let call = abi_decode::<Hts::wipeTokenAccountCall>(input)?;
    Ok(WipeWrapper {
        token: token_from_address(call.token),
        account: account_from_address(call.account, ledgers),
        amount: i64::from(call.amount),
        serial_numbers: Vec::new(),
    })
}

/// Decodes `wipeTokenAccountNFT`.
pub fn decode_wipe_nft(input: &[u8], ledgers: &WorldLedgers) -> DecodeResult<WipeWrapper> {
    let call = abi_decode::<Hts::wipeTokenAccountNFTCall>(input)?;
    Ok(WipeWrapper {
        token: token_from_address(call.token),
        account: account_from_address(call.account, ledgers),
        amount: 0,
        serial_numbers: call.serialNumbers,
    })
}

/// Decodes `associateToken`.
pub fn decode_associate(input: &[u8], ledgers: &WorldLedgers) -> DecodeResult<Association> {
    let call = abi_decode::<Hts::associateTokenCall>(input)?;
    Ok(Association {
        account: account_from_address(call.account, ledgers),
        tokens: vec![token_from_address(call.token)],
    })
}

/// Decodes `associateTokens`.
pub fn decode_multi_associate(input: &[u8], ledgers: &WorldLedgers) -> DecodeResult<Association> {
    let call = abi_decode::<Hts::associateTokensCall>(input)?;
    Ok(Association {
        account: account_from_address(call.account, ledgers),
        tokens: call.tokens.iter().copied().map(token_from_address).collect(),
    })
}

/// Decodes `dissociateToken`.
pub fn decode_dissociate(input: &[u8], ledgers: &WorldLedgers) -> DecodeResult<Dissociation> {
    let call = abi_decode::<Hts::dissociateTokenCall>(input)?;
    Ok(Dissociation {
        account: account_from_address(call.account, ledgers),
        tokens: vec![token_from_address(call.token)],
    })
}

/// Decodes `dissociateTokens`.
pub fn decode_multi_dissociate(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<Dissociation> {
    let call = abi_decode::<Hts::dissociateTokensCall>(input)?;
    Ok(Dissociation {
        account: account_from_address(call.account, ledgers),
        tokens: call.tokens.iter().copied().map(token_from_address).collect(),
    })
}

// --- Token administration -------------------------------------------------------------------

/// Decodes `freezeToken`/`unfreezeToken` (same shape).
pub fn decode_freeze(input: &[u8], ledgers: &WorldLedgers) -> DecodeResult<TokenFreezeWrapper> {
    let call = abi_decode::<Hts::freezeTokenCall>(input)?;
    Ok(TokenFreezeWrapper {
        token: token_from_address(call.token),
        account: account_from_address(call.account, ledgers),
    })
}

/// Decodes `unfreezeToken`.
pub fn decode_unfreeze(input: &[u8], ledgers: &WorldLedgers) -> DecodeResult<TokenFreezeWrapper> {
    let call = abi_decode::<Hts::unfreezeTokenCall>(input)?;
    Ok(TokenFreezeWrapper {
        token: token_from_address(call.token),
        account: account_from_address(call.account, ledgers),
    })
}

/// Decodes `grantTokenKyc`.
pub fn decode_grant_kyc(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<GrantRevokeKycWrapper> {
    let call = abi_decode::<Hts::grantTokenKycCall>(input)?;
    Ok(GrantRevokeKycWrapper {
        token: token_from_address(call.token),
        account: account_from_address(call.account, ledgers),
    })
}

/// Decodes `revokeTokenKyc`.
pub fn decode_revoke_kyc(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<GrantRevokeKycWrapper> {
    let call = abi_decode::<Hts::revokeTokenKycCall>(input)?;
    Ok(GrantRevokeKycWrapper {
        token: token_from_address(call.token),
        account: account_from_address(call.account, ledgers),
    })
}

/// Decodes `pauseToken`.
pub fn decode_pause(input: &[u8]) -> DecodeResult<PauseWrapper> {
    let call = abi_decode::<Hts::pauseTokenCall>(input)?;
    Ok(PauseWrapper { token: token_from_address(call.token) })
}

/// Decodes `unpauseToken`.
pub fn decode_unpause(input: &[u8]) -> DecodeResult<PauseWrapper> {
    let call = abi_decode::<Hts::unpauseTokenCall>(input)?;
    Ok(PauseWrapper { token: token_from_address(call.token) })
}

/// Decodes `deleteToken`.
pub fn decode_delete(input: &[u8]) -> DecodeResult<DeleteWrapper> {
    let call = abi_decode::<Hts::deleteTokenCall>(input)?;
    Ok(DeleteWrapper { token: token_from_address(call.token) })
}

/// Decodes version-1 `updateTokenInfo`.
pub fn decode_token_update(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<TokenUpdateWrapper> {
    let call = abi_decode::<Hts::updateTokenInfoCall>(input)?;
    let t = &call.tokenInfo;
    Ok(TokenUpdateWrapper {
        token: token_from_address(call.token),
        name: t.name.clone(),
        symbol: t.symbol.clone(),
        memo: t.memo.clone(),
        treasury: stated_account(t.treasury, ledgers),
        keys: keys_from_abi(&t.tokenKeys)?,
        expiry: expiry_from_abi(&t.expiry, ledgers),
    })
}

/// Decodes version-2 `updateTokenInfo`.
pub fn decode_token_update_v2(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<TokenUpdateWrapper> {
    let call = abi_decode::<HtsV2::updateTokenInfoCall>(input)?;
    let t = &call.tokenInfo;
    Ok(TokenUpdateWrapper {
        token: token_from_address(call.token),
        name: t.name.clone(),
        symbol: t.symbol.clone(),
        memo: t.memo.clone(),
        treasury: stated_account(t.treasury, ledgers),
        keys: keys_from_abi(&t.tokenKeys)?,
        expiry: expiry_from_abi(&t.expiry, ledgers),
    })
}

/// Decodes `updateTokenKeys`.
pub fn decode_token_update_keys(input: &[u8]) -> DecodeResult<TokenUpdateKeysWrapper> {
    let call = abi_decode::<Hts::updateTokenKeysCall>(input)?;
    let mut keys = Vec::with_capacity(call.keys.len());
    for entry in &call.keys {
        keys.push((key_type_from_word(entry.keyType)?, key_from_abi(&entry.key)));
    }
    Ok(TokenUpdateKeysWrapper { token: token_from_address(call.token), keys })
}

/// Decodes `updateTokenExpiryInfo`.
pub fn decode_token_update_expiry(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<TokenExpiryWrapper> {
    let call = abi_decode::<Hts::updateTokenExpiryInfoCall>(input)?;
    Ok(TokenExpiryWrapper {
        token: token_from_address(call.token),
        expiry: expiry_from_abi(&call.expiryInfo, ledgers),
    })
}

// --- Token create ---------------------------------------------------------------------------

/// Decodes `createFungibleToken`.
pub fn decode_create_fungible(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<TokenCreateWrapper> {
    let call = abi_decode::<Hts::createFungibleTokenCall>(input)?;
    create_wrapper(
        TokenType::FungibleCommon,
        &call.token,
        checked_i64(call.initialTotalSupply)?,
        decimals_from_word(call.decimals)?,
        Vec::new(),
        ledgers,
    )
}

/// Decodes `createFungibleTokenWithCustomFees`.
pub fn decode_create_fungible_with_fees(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<TokenCreateWrapper> {
    let call = abi_decode::<Hts::createFungibleTokenWithCustomFeesCall>(input)?;
    let mut fees = fixed_fees_from_abi(&call.fixedFees, ledgers);
    fees.extend(fractional_fees_from_abi(&call.fractionalFees, ledgers));
    create_wrapper(
        TokenType::FungibleCommon,
        &call.token,
        checked_i64(call.initialTotalSupply)?,
        decimals_from_word(call.decimals)?,
        fees,
        ledgers,
    )
}

/// Decodes `createNonFungibleToken`.
pub fn decode_create_non_fungible(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<TokenCreateWrapper> {
    let call = abi_decode::<Hts::createNonFungibleTokenCall>(input)?;
    create_wrapper(TokenType::NonFungibleUnique, &call.token, 0, 0, Vec::new(), ledgers)
}

/// Decodes `createNonFungibleTokenWithCustomFees`.
pub fn decode_create_non_fungible_with_fees(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<TokenCreateWrapper> {
    let call = abi_decode::<Hts::createNonFungibleTokenWithCustomFeesCall>(input)?;
    let mut fees = fixed_fees_from_abi(&call.fixedFees, ledgers);
    fees.extend(royalty_fees_from_abi(&call.royaltyFees, ledgers));
    create_wrapper(TokenType::NonFungibleUnique, &call.token, 0, 0, fees, ledgers)
}

fn create_wrapper(
    token_type: TokenType,
    token: &crate::abi::HederaToken,
    initial_supply: i64,
    decimals: u32,
    custom_fees: Vec<CustomFee>,
    ledgers: &WorldLedgers,
) -> DecodeResult<TokenCreateWrapper> {
    if initial_supply < 0 {
        return Err(DecodeError::NegativeAmount);
    }
    Ok(TokenCreateWrapper {
        token_type,
        name: token.name.clone(),
        symbol: token.symbol.clone(),
        memo: token.memo.clone(),
        treasury: account_from_address(token.treasury, ledgers),
        initial_supply,
        decimals,
        supply_type_finite: token.tokenSupplyType,
        max_supply: i64::from(token.maxSupply),
        freeze_default: token.freezeDefault,
        keys: keys_from_abi(&token.tokenKeys)?,
        expiry: expiry_from_abi(&token.expiry, ledgers),
        custom_fees,
    })
}

// --- Approvals ------------------------------------------------------------------------------

/// Decodes native `approve(address,address,uint256)`. The third word is an amount for fungible
/// tokens and a serial number for NFTs; the facade's token table disambiguates.
pub fn decode_token_approve(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<ApproveWrapper> {
    let call = abi_decode::<Hts::approveCall>(input)?;
    let token = token_from_address(call.token);
    let spender = account_from_address(call.spender, ledgers);
    let value = checked_i64(call.amount)?;
    let fungible = ledgers.type_of(token).unwrap_or_default().is_fungible();
    Ok(approve_wrapper(token, spender, value, fungible))
}

/// Decodes native `approveNFT(address,address,uint256)`.
pub fn decode_token_approve_nft(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<ApproveWrapper> {
    let call = abi_decode::<Hts::approveNFTCall>(input)?;
    Ok(approve_wrapper(
        token_from_address(call.token),
        account_from_address(call.approved, ledgers),
        checked_i64(call.serialNumber)?,
        false,
    ))
}

/// Decodes ERC `approve(address,uint256)` against the redirect token.
pub fn decode_erc_approve(
    nested: &[u8],
    token: TokenId,
    is_fungible: bool,
    ledgers: &WorldLedgers,
) -> DecodeResult<ApproveWrapper> {
    let call = abi_decode::<IErcToken::approveCall>(nested)?;
    let spender = account_from_address(call.spender, ledgers);
    let value = checked_i64(call.amount)?;
    Ok(approve_wrapper(token, spender, value, is_fungible))
}

fn approve_wrapper(token: TokenId, spender: AccountId, value: i64, fungible: bool) -> ApproveWrapper {
    if fungible {
        ApproveWrapper { token, spender, amount: Some(value), serial_number: None }
    } else {
        ApproveWrapper { token, spender, amount: None, serial_number: Some(value) }
    }
}

/// Decodes native `setApprovalForAll(address,address,bool)`.
pub fn decode_set_approval_for_all(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<SetApprovalForAllWrapper> {
    let call = abi_decode::<Hts::setApprovalForAllCall>(input)?;
    Ok(SetApprovalForAllWrapper {
        token: token_from_address(call.token),
        operator: account_from_address(call.operator, ledgers),
        approved: call.approved,
    })
}

/// Decodes ERC `setApprovalForAll(address,bool)` against the redirect token.
pub fn decode_erc_set_approval_for_all(
    nested: &[u8],
    token: TokenId,
    ledgers: &WorldLedgers,
) -> DecodeResult<SetApprovalForAllWrapper> {
    let call = abi_decode::<IErcToken::setApprovalForAllCall>(nested)?;
    Ok(SetApprovalForAllWrapper {
        token,
        operator: account_from_address(call.operator, ledgers),
        approved: call.approved,
    })
}

// --- Views ----------------------------------------------------------------------------------

/// Decodes native `allowance(address,address,address)`.
pub fn decode_token_allowance(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<AllowanceWrapper> {
    let call = abi_decode::<Hts::allowanceCall>(input)?;
    Ok(AllowanceWrapper {
        token: token_from_address(call.token),
        owner: account_from_address(call.owner, ledgers),
        spender: account_from_address(call.spender, ledgers),
    })
}

/// Decodes ERC `allowance(address,address)` against the redirect token.
pub fn decode_erc_allowance(
    nested: &[u8],
    token: TokenId,
    ledgers: &WorldLedgers,
) -> DecodeResult<AllowanceWrapper> {
    let call = abi_decode::<IErcToken::allowanceCall>(nested)?;
    Ok(AllowanceWrapper {
        token,
        owner: account_from_address(call.owner, ledgers),
        spender: account_from_address(call.spender, ledgers),
    })
}

/// Decodes native `getApproved(address,uint256)`.
pub fn decode_get_approved(input: &[u8]) -> DecodeResult<GetApprovedWrapper> {
    let call = abi_decode::<Hts::getApprovedCall>(input)?;
    Ok(GetApprovedWrapper {
        token: token_from_address(call.token),
        serial_number: checked_i64(call.serialNumber)?,
    })
}

/// Decodes ERC `getApproved(uint256)` against the redirect token.
pub fn decode_erc_get_approved(nested: &[u8], token: TokenId) -> DecodeResult<GetApprovedWrapper> {
    let call = abi_decode::<IErcToken::getApprovedCall>(nested)?;
    Ok(GetApprovedWrapper { token, serial_number: checked_i64(call.tokenId)? })
}

/// Decodes native `isApprovedForAll(address,address,address)`.
pub fn decode_is_approved_for_all(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<IsApproveForAllWrapper> {
    let call = abi_decode::<Hts::isApprovedForAllCall>(input)?;
    Ok(IsApproveForAllWrapper {
        token: token_from_address(call.token),
        owner: account_from_address(call.owner, ledgers),
        operator: account_from_address(call.operator, ledgers),
    })
}

/// Decodes ERC `isApprovedForAll(address,address)` against the redirect token.
pub fn decode_erc_is_approved_for_all(
    nested: &[u8],
    token: TokenId,
    ledgers: &WorldLedgers,
) -> DecodeResult<IsApproveForAllWrapper> {
    let call = abi_decode::<IErcToken::isApprovedForAllCall>(nested)?;
    Ok(IsApproveForAllWrapper {
        token,
        owner: account_from_address(call.owner, ledgers),
        operator: account_from_address(call.operator, ledgers),
    })
}

/// Decodes ERC `balanceOf(address)` against the redirect token.
pub fn decode_balance_of(
    nested: &[u8],
    token: TokenId,
    ledgers: &WorldLedgers,
) -> DecodeResult<BalanceOfWrapper> {
    let call = abi_decode::<IErcToken::balanceOfCall>(nested)?;
    Ok(BalanceOfWrapper { token, account: account_from_address(call.account, ledgers) })
}

/// Decodes ERC `ownerOf(uint256)` against the redirect token.
pub fn decode_owner_of(nested: &[u8], token: TokenId) -> DecodeResult<OwnerOfWrapper> {
    let call = abi_decode::<IErcToken::ownerOfCall>(nested)?;
    Ok(OwnerOfWrapper { token, serial_number: checked_i64(call.tokenId)? })
}

/// Decodes ERC `tokenURI(uint256)` against the redirect token.
pub fn decode_token_uri(nested: &[u8], token: TokenId) -> DecodeResult<TokenUriWrapper> {
    let call = abi_decode::<IErcToken::tokenURICall>(nested)?;
    Ok(TokenUriWrapper { token, serial_number: checked_i64(call.tokenId)? })
}

/// Decodes `isKyc(address,address)`.
pub fn decode_is_kyc(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<AccountFlagQueryWrapper> {
    let call = abi_decode::<Hts::isKycCall>(input)?;
    Ok(AccountFlagQueryWrapper {
        token: token_from_address(call.token),
        account: account_from_address(call.account, ledgers),
    })
}

/// Decodes `isFrozen(address,address)`.
pub fn decode_is_frozen(
    input: &[u8],
    ledgers: &WorldLedgers,
) -> DecodeResult<AccountFlagQueryWrapper> {
    let call = abi_decode::<Hts::isFrozenCall>(input)?;
    Ok(AccountFlagQueryWrapper {
        token: token_from_address(call.token),
        account: account_from_address(call.account, ledgers),
    })
}

/// Decodes the single-token-address views (`getTokenInfo`, `isToken`, …).
pub fn decode_token_info_query<C: SolCall>(
    input: &[u8],
    token_of: impl Fn(&C) -> Address,
) -> DecodeResult<TokenInfoWrapper> {
    let call = abi_decode::<C>(input)?;
    Ok(TokenInfoWrapper { token: token_from_address(token_of(&call)), serial_number: None })
}

/// Decodes `getNonFungibleTokenInfo(address,int64)`.
pub fn decode_non_fungible_token_info_query(input: &[u8]) -> DecodeResult<TokenInfoWrapper> {
    let call = abi_decode::<Hts::getNonFungibleTokenInfoCall>(input)?;
    Ok(TokenInfoWrapper {
        token: token_from_address(call.token),
        serial_number: Some(call.serialNumber),
    })
}

/// Decodes `getTokenKey(address,uint256)`.
pub fn decode_get_token_key(input: &[u8]) -> DecodeResult<GetTokenKeyWrapper> {
    let call = abi_decode::<Hts::getTokenKeyCall>(input)?;
    Ok(GetTokenKeyWrapper {
        token: token_from_address(call.token),
        key_type: key_type_from_word(call.keyType)?,
    })
}

// --- Shared struct conversions --------------------------------------------------------------

fn stated_account(address: Address, ledgers: &WorldLedgers) -> Option<AccountId> {
    if address == Address::ZERO {
        None
    } else {
        Some(account_from_address(address, ledgers))
    }
}

fn expiry_from_abi(expiry: &crate::abi::Expiry, ledgers: &WorldLedgers) -> TokenExpiry {
    TokenExpiry {
        second: expiry.second,
        auto_renew_account: stated_account(expiry.autoRenewAccount, ledgers),
        auto_renew_period: expiry.autoRenewPeriod,
    }
}

fn key_type_from_word(word: U256) -> DecodeResult<TokenKeyType> {
    let bits = u8::try_from(word).map_err(|_| DecodeError::WordOverflow)?;
    TokenKeyType::from_bits(bits).ok_or(DecodeError::WordOverflow)
}

fn key_from_abi(value: &crate::abi::KeyValue) -> Key {
    if !value.ed25519.is_empty() {
        Key::new(value.ed25519.clone())
    } else if !value.ECDSA_secp256k1.is_empty() {
        Key::new(value.ECDSA_secp256k1.clone())
    } else if value.contractId != Address::ZERO {
        Key::new(value.contractId.to_vec())
    } else if value.delegatableContractId != Address::ZERO {
        Key::new(value.delegatableContractId.to_vec())
    } else {
        Key::default()
    }
}

fn keys_from_abi(entries: &[crate::abi::TokenKey]) -> DecodeResult<TokenKeys> {
    let mut keys = TokenKeys::default();
    for entry in entries {
        let bits = key_type_from_word(entry.keyType)?;
        let key = key_from_abi(&entry.key);
        if bits.contains(TokenKeyType::ADMIN) {
            keys.admin = Some(key.clone());
        }
        if bits.contains(TokenKeyType::KYC) {
            keys.kyc = Some(key.clone());
        }
        if bits.contains(TokenKeyType::FREEZE) {
            keys.freeze = Some(key.clone());
        }
        if bits.contains(TokenKeyType::WIPE) {
            keys.wipe = Some(key.clone());
        }
        if bits.contains(TokenKeyType::SUPPLY) {
            keys.supply = Some(key.clone());
        }
        if bits.contains(TokenKeyType::FEE_SCHEDULE) {
            keys.fee_schedule = Some(key.clone());
        }
        if bits.contains(TokenKeyType::PAUSE) {
            keys.pause = Some(key);
        }
    }
    Ok(keys)
}

fn fixed_fees_from_abi(fees: &[crate::abi::FixedFee], ledgers: &WorldLedgers) -> Vec<CustomFee> {
    fees.iter()
        .map(|fee| CustomFee::Fixed {
            amount: fee.amount,
            denominating_token: if fee.useHbarsForPayment {
                None
            } else {
                Some(token_from_address(fee.tokenId))
            },
            collector: account_from_address(fee.feeCollector, ledgers),
        })
        .collect()
}

fn fractional_fees_from_abi(
    fees: &[crate::abi::FractionalFee],
    ledgers: &WorldLedgers,
) -> Vec<CustomFee> {
    fees.iter()
        .map(|fee| CustomFee::Fractional {
            numerator: fee.numerator,
            denominator: fee.denominator,
            minimum: fee.minimumAmount,
            maximum: fee.maximumAmount,
            net_of_transfers: fee.netOfTransfers,
            collector: account_from_address(fee.feeCollector, ledgers),
        })
        .collect()
}

fn royalty_fees_from_abi(
    fees: &[crate::abi::RoyaltyFee],
    ledgers: &WorldLedgers,
) -> Vec<CustomFee> {
    fees.iter()
        .map(|fee| CustomFee::Royalty {
            numerator: fee.numerator,
            denominator: fee.denominator,
            fallback_amount: fee.amount,
            fallback_token: if fee.useHbarsForPayment {
                None
            } else {
                Some(token_from_address(fee.tokenId))
            },
            collector: account_from_address(fee.feeCollector, ledgers),
        })
        .collect()
}

fn decimals_from_word(word: U256) -> DecodeResult<u32> {
    u32::try_from(word).map_err(|_| DecodeError::WordOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Nft, Token};
    use alloy_primitives::U256;

    fn world() -> WorldLedgers {
        let mut world = WorldLedgers::new();
        world.begin();
        world.tokens_mut().put(
            TokenId(0x1234),
            Token {
                token_type: TokenType::NonFungibleUnique,
                treasury: AccountId(2),
                ..Default::default()
            },
        );
        world.nfts_mut().put(
            NftId::new(TokenId(0x1234), 1),
            Nft { owner: AccountId(5), ..Default::default() },
        );
        world.commit();
        world
    }

    #[test]
    fn mint_amount_overflow_is_rejected() {
        let input = Hts::mintTokenCall {
            token: TokenId(0x1234).to_evm_address(),
            amount: u64::MAX,
            metadata: Vec::new(),
        }
        .abi_encode();
        assert_eq!(decode_mint(&input), Err(DecodeError::WordOverflow));
    }

    #[test]
    fn burn_serials_decode() {
        let input = Hts::burnTokenCall {
            token: TokenId(0x1234).to_evm_address(),
            amount: 0,
            serialNumbers: vec![1, 2, 3],
        }
        .abi_encode();
        let wrapper = decode_burn(&input).expect("decodes");
        assert!(!wrapper.is_fungible());
        assert_eq!(wrapper.serial_numbers, vec![1, 2, 3]);
    }

    #[test]
    fn negative_transfer_token_amount_is_malformed() {
        let world = world();
        let input = Hts::transferTokenCall {
            token: TokenId(0x1234).to_evm_address(),
            sender: AccountId(5).to_evm_address(),
            receiver: AccountId(6).to_evm_address(),
            amount: -1,
        }
        .abi_encode();
        assert_eq!(decode_transfer_token(&input, &world), Err(DecodeError::NegativeAmount));
    }

    #[test]
    fn transfer_tokens_length_mismatch_is_malformed() {
        let world = world();
        let input = Hts::transferTokensCall {
            token: TokenId(0x1234).to_evm_address(),
            accountId: vec![AccountId(5).to_evm_address()],
            amount: vec![1, -1],
        }
        .abi_encode();
        assert_eq!(decode_transfer_tokens(&input, &world), Err(DecodeError::LengthMismatch));
    }

    #[test]
    fn truncated_payload_is_malformed() {
        let world = world();
        let input = Hts::transferTokenCall {
            token: TokenId(0x1234).to_evm_address(),
            sender: AccountId(5).to_evm_address(),
            receiver: AccountId(6).to_evm_address(),
            amount: 7,
        }
        .abi_encode();
        let truncated = &input[..input.len() - 8];
        assert!(matches!(decode_transfer_token(truncated, &world), Err(DecodeError::Abi(_))));
    }

    #[test]
    fn transfer_from_nft_owner_of_record_sets_approval_flag() {
        let world = world();
        let token = TokenId(0x1234);
        // Stated sender is the owner of record: not an approval.
        let input = Hts::transferFromNFTCall {
            token: token.to_evm_address(),
            from: AccountId(5).to_evm_address(),
            to: AccountId(6).to_evm_address(),
            serialNumber: U256::from(1u64),
        }
        .abi_encode();
        let plan = decode_transfer_from_nft(&input, &world).expect("decodes");
        assert!(!plan.token_transfers[0].nft_exchanges[0].is_approval);

        // Stated sender differs from the owner of record: approval-based.
        let input = Hts::transferFromNFTCall {
            token: token.to_evm_address(),
            from: AccountId(9).to_evm_address(),
            to: AccountId(6).to_evm_address(),
            serialNumber: U256::from(1u64),
        }
        .abi_encode();
        let plan = decode_transfer_from_nft(&input, &world).expect("decodes");
        assert!(plan.token_transfers[0].nft_exchanges[0].is_approval);
    }

    #[test]
    fn transfer_from_caller_rule_for_fungible() {
        let world = world();
        let input = Hts::transferFromCall {
            token: TokenId(0x1234).to_evm_address(),
            from: AccountId(5).to_evm_address(),
            to: AccountId(6).to_evm_address(),
            amount: U256::from(10u64),
        }
        .abi_encode();
        let by_owner = decode_transfer_from(&input, AccountId(5), &world).expect("decodes");
        assert!(!by_owner.token_transfers[0].fungible_transfers[0].is_approval);
        let by_operator = decode_transfer_from(&input, AccountId(7), &world).expect("decodes");
        assert!(by_operator.token_transfers[0].fungible_transfers[0].is_approval);
    }

    #[test]
    fn erc_amount_past_i64_is_rejected() {
        let world = world();
        let nested = IErcToken::transferCall {
            recipient: AccountId(6).to_evm_address(),
            amount: U256::from(1u128 << 64),
        }
        .abi_encode();
        assert_eq!(
            decode_erc_transfer(&nested, TokenId(0x1234), AccountId(5), &world),
            Err(DecodeError::WordOverflow)
        );
    }

    #[test]
    fn approve_serial_decode_matches_embedded_integers() {
        // approve(address,uint256) through the redirect with token 0x1234: spender account
        // 0x3ea resolves to entity 1002, the second word is serial 1.
        let world = world();
        let nested = IErcToken::approveCall {
            spender: AccountId(0x3ea).to_evm_address(),
            amount: U256::from(1u64),
        }
        .abi_encode();
        let wrapper =
            decode_erc_approve(&nested, TokenId(0x1234), false, &world).expect("decodes");
        assert_eq!(wrapper.spender, AccountId(1002));
        assert_eq!(wrapper.token, TokenId(0x1234));
        assert_eq!(wrapper.serial_number, Some(1));
        assert_eq!(wrapper.amount, None);
    }

    #[test]
    fn update_keys_bit_set_maps_roles() {
        let input = Hts::updateTokenKeysCall {
            token: TokenId(0x1234).to_evm_address(),
            keys: vec![crate::abi::TokenKey {
                keyType: U256::from((TokenKeyType::SUPPLY | TokenKeyType::WIPE).bits()),
                key: crate::abi::KeyValue {
                    ed25519: vec![0xaa; 32].into(),
                    ..Default::default()
                },
            }],
        }
        .abi_encode();
        let wrapper = decode_token_update_keys(&input).expect("decodes");
        assert_eq!(wrapper.keys.len(), 1);
        assert_eq!(wrapper.keys[0].0, TokenKeyType::SUPPLY | TokenKeyType::WIPE);
    }

    #[test]
    fn unlinked_alias_decodes_to_missing_account() {
        let world = world();
        let alias = Address::repeat_byte(0x9c);
        let input = Hts::associateTokenCall {
            account: alias,
            token: TokenId(0x1234).to_evm_address(),
        }
        .abi_encode();
        let assoc = decode_associate(&input, &world).expect("decodes");
        assert_eq!(assoc.account, AccountId::MISSING);
    }
}
