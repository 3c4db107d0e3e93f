//! Selector dispatch: from raw calldata to a decoded operation and its result shape.
//!
//! The table covers both dialects. Native selectors resolve directly; ERC-style selectors are
//! reached through the `redirectForToken` proxy, which scopes the nested call to an embedded
//! token address. Logically equivalent selectors from the two dialects resolve to the same
//! descriptor shapes, so handlers are never duplicated.

use alloy_sol_types::SolCall;

use crate::{
    abi::{self, IErcToken as Erc, IHederaTokenService as Hts, IHederaTokenServiceV2 as HtsV2},
    codec::{decoders, DecodeError, HtsCall, ViewOp},
    config::EngineProperties,
    ledger::WorldLedgers,
    status::ResponseCode,
    types::AccountId,
};

/// How the result of a successful call is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// A single 32-byte status word.
    Status,
    /// `(status, newTotalSupply, serialNumbers)`.
    MintResult,
    /// `(status, newTotalSupply)`.
    BurnResult,
    /// `(status, tokenAddress)`.
    CreateResult,
    /// `(status, bool)` for the native `approve`.
    ApproveBool,
    /// A single ERC boolean.
    ErcBool,
    /// Empty bytes (ERC functions without a return value).
    ErcEmpty,
    /// Query-specific tuple, produced by the view executor.
    View,
}

/// Why dispatch did not produce an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareFailure {
    /// The selector is not part of the table; the call is not a system-contract call.
    Unrecognized,
    /// The selector matched but its payload did not decode.
    Decode(DecodeError),
    /// The selector family is gated off or the token kind does not support the operation.
    Status(ResponseCode),
}

impl From<DecodeError> for PrepareFailure {
    fn from(err: DecodeError) -> Self {
        Self::Decode(err)
    }
}

/// Result alias for dispatch.
pub type PrepareResult = Result<(HtsCall, ResultShape), PrepareFailure>;

fn gate(enabled: bool) -> Result<(), PrepareFailure> {
    if enabled {
        Ok(())
    } else {
        Err(PrepareFailure::Status(ResponseCode::NotSupported))
    }
}

/// Resolves the selector and runs the matching decoder.
///
/// `caller` is the frame sender resolved to an account id; several decoders need it for the
/// approval-flag rules and for owner-scoped approvals.
pub fn prepare_computation(
    input: &[u8],
    caller: AccountId,
    ledgers: &WorldLedgers,
    props: &EngineProperties,
) -> PrepareResult {
    let selector = abi::selector_of(input).ok_or(PrepareFailure::Unrecognized)?;

    // Native dialect.
    match selector {
        s if s == Hts::cryptoTransferCall::SELECTOR => {
            let op = decoders::decode_crypto_transfer(input, ledgers)?;
            Ok((HtsCall::Transfer(op), ResultShape::Status))
        }
        s if s == HtsV2::cryptoTransferCall::SELECTOR => {
            let op = decoders::decode_crypto_transfer_v2(input, ledgers)?;
            Ok((HtsCall::Transfer(op), ResultShape::Status))
        }
        s if s == Hts::transferTokensCall::SELECTOR => {
            let op = decoders::decode_transfer_tokens(input, ledgers)?;
            Ok((HtsCall::Transfer(op), ResultShape::Status))
        }
        s if s == Hts::transferTokenCall::SELECTOR => {
            let op = decoders::decode_transfer_token(input, ledgers)?;
            Ok((HtsCall::Transfer(op), ResultShape::Status))
        }
        s if s == Hts::transferNFTsCall::SELECTOR => {
            let op = decoders::decode_transfer_nfts(input, ledgers)?;
            Ok((HtsCall::Transfer(op), ResultShape::Status))
        }
        s if s == Hts::transferNFTCall::SELECTOR => {
            let op = decoders::decode_transfer_nft(input, ledgers)?;
            Ok((HtsCall::Transfer(op), ResultShape::Status))
        }
        s if s == Hts::transferFromCall::SELECTOR => {
            gate(props.allowances_enabled)?;
            let op = decoders::decode_transfer_from(input, caller, ledgers)?;
            Ok((HtsCall::Transfer(op), ResultShape::Status))
        }
        s if s == Hts::transferFromNFTCall::SELECTOR => {
            gate(props.allowances_enabled)?;
            let op = decoders::decode_transfer_from_nft(input, ledgers)?;
            Ok((HtsCall::Transfer(op), ResultShape::Status))
        }
        s if s == Hts::mintTokenCall::SELECTOR => {
            Ok((HtsCall::Mint(decoders::decode_mint(input)?), ResultShape::MintResult))
        }
        s if s == Hts::burnTokenCall::SELECTOR => {
            Ok((HtsCall::Burn(decoders::decode_burn(input)?), ResultShape::BurnResult))
        }
        s if s == Hts::wipeTokenAccountCall::SELECTOR => {
            let op = decoders::decode_wipe_fungible(input, ledgers)?;
            Ok((HtsCall::Wipe(op), ResultShape::Status))
        }
        s if s == Hts::wipeTokenAccountNFTCall::SELECTOR => {
            let op = decoders::decode_wipe_nft(input, ledgers)?;
            Ok((HtsCall::Wipe(op), ResultShape::Status))
        }
        s if s == Hts::associateTokenCall::SELECTOR => {
            let op = decoders::decode_associate(input, ledgers)?;
            Ok((HtsCall::Associate(op), ResultShape::Status))
        }
        s if s == Hts::associateTokensCall::SELECTOR => {
            let op = decoders::decode_multi_associate(input, ledgers)?;
            Ok((HtsCall::Associate(op), ResultShape::Status))
        }
        s if s == Hts::dissociateTokenCall::SELECTOR => {
            let op = decoders::decode_dissociate(input, ledgers)?;
            Ok((HtsCall::Dissociate(op), ResultShape::Status))
        }
        s if s == Hts::dissociateTokensCall::SELECTOR => {
            let op = decoders::decode_multi_dissociate(input, ledgers)?;
            Ok((HtsCall::Dissociate(op), ResultShape::Status))
        }
        s if s == Hts::freezeTokenCall::SELECTOR => {
            let op = decoders::decode_freeze(input, ledgers)?;
            Ok((HtsCall::Freeze(op), ResultShape::Status))
        }
        s if s == Hts::unfreezeTokenCall::SELECTOR => {
            let op = decoders::decode_unfreeze(input, ledgers)?;
            Ok((HtsCall::Unfreeze(op), ResultShape::Status))
        }
        s if s == Hts::grantTokenKycCall::SELECTOR => {
            let op = decoders::decode_grant_kyc(input, ledgers)?;
            Ok((HtsCall::GrantKyc(op), ResultShape::Status))
        }
        s if s == Hts::revokeTokenKycCall::SELECTOR => {
            let op = decoders::decode_revoke_kyc(input, ledgers)?;
            Ok((HtsCall::RevokeKyc(op), ResultShape::Status))
        }
        s if s == Hts::pauseTokenCall::SELECTOR => {
            Ok((HtsCall::Pause(decoders::decode_pause(input)?), ResultShape::Status))
        }
        s if s == Hts::unpauseTokenCall::SELECTOR => {
            Ok((HtsCall::Unpause(decoders::decode_unpause(input)?), ResultShape::Status))
        }
        s if s == Hts::deleteTokenCall::SELECTOR => {
            Ok((HtsCall::Delete(decoders::decode_delete(input)?), ResultShape::Status))
        }
        s if s == Hts::updateTokenInfoCall::SELECTOR => {
            let op = decoders::decode_token_update(input, ledgers)?;
            Ok((HtsCall::Update(op), ResultShape::Status))
        }
        s if s == HtsV2::updateTokenInfoCall::SELECTOR => {
            let op = decoders::decode_token_update_v2(input, ledgers)?;
            Ok((HtsCall::Update(op), ResultShape::Status))
        }
        s if s == Hts::updateTokenKeysCall::SELECTOR => {
            let op = decoders::decode_token_update_keys(input)?;
            Ok((HtsCall::UpdateKeys(op), ResultShape::Status))
        }
        s if s == Hts::updateTokenExpiryInfoCall::SELECTOR => {
            let op = decoders::decode_token_update_expiry(input, ledgers)?;
            Ok((HtsCall::UpdateExpiry(op), ResultShape::Status))
        }
        s if s == Hts::createFungibleTokenCall::SELECTOR => {
            gate(props.create_enabled)?;
            let op = decoders::decode_create_fungible(input, ledgers)?;
            Ok((HtsCall::Create(op), ResultShape::CreateResult))
        }
        s if s == Hts::createFungibleTokenWithCustomFeesCall::SELECTOR => {
            gate(props.create_enabled)?;
            let op = decoders::decode_create_fungible_with_fees(input, ledgers)?;
            Ok((HtsCall::Create(op), ResultShape::CreateResult))
        }
        s if s == Hts::createNonFungibleTokenCall::SELECTOR => {
            gate(props.create_enabled)?;
            let op = decoders::decode_create_non_fungible(input, ledgers)?;
            Ok((HtsCall::Create(op), ResultShape::CreateResult))
        }
        s if s == Hts::createNonFungibleTokenWithCustomFeesCall::SELECTOR => {
            gate(props.create_enabled)?;
            let op = decoders::decode_create_non_fungible_with_fees(input, ledgers)?;
            Ok((HtsCall::Create(op), ResultShape::CreateResult))
        }
        s if s == Hts::approveCall::SELECTOR => {
            gate(props.allowances_enabled)?;
            let op = decoders::decode_token_approve(input, ledgers)?;
            Ok((HtsCall::Approve { op, owner: caller }, ResultShape::ApproveBool))
        }
        s if s == Hts::approveNFTCall::SELECTOR => {
            gate(props.allowances_enabled)?;
            let op = decoders::decode_token_approve_nft(input, ledgers)?;
            Ok((HtsCall::Approve { op, owner: caller }, ResultShape::Status))
        }
        s if s == Hts::setApprovalForAllCall::SELECTOR => {
            gate(props.allowances_enabled)?;
            let op = decoders::decode_set_approval_for_all(input, ledgers)?;
            Ok((HtsCall::SetApprovalForAll { op, owner: caller }, ResultShape::Status))
        }
        s if s == Hts::allowanceCall::SELECTOR => {
            gate(props.allowances_enabled)?;
            let op = decoders::decode_token_allowance(input, ledgers)?;
            Ok((HtsCall::View(ViewOp::Allowance(op)), ResultShape::View))
        }
        s if s == Hts::getApprovedCall::SELECTOR => {
            gate(props.allowances_enabled)?;
            let op = decoders::decode_get_approved(input)?;
            Ok((HtsCall::View(ViewOp::GetApproved(op)), ResultShape::View))
        }
        s if s == Hts::isApprovedForAllCall::SELECTOR => {
            gate(props.allowances_enabled)?;
            let op = decoders::decode_is_approved_for_all(input, ledgers)?;
            Ok((HtsCall::View(ViewOp::IsApprovedForAll(op)), ResultShape::View))
        }
        s if s == Hts::getTokenInfoCall::SELECTOR => {
            let op = decoders::decode_token_info_query::<Hts::getTokenInfoCall>(input, |c| c.token)?;
            Ok((HtsCall::View(ViewOp::TokenInfo(op)), ResultShape::View))
        }
        s if s == Hts::getFungibleTokenInfoCall::SELECTOR => {
            let op = decoders::decode_token_info_query::<Hts::getFungibleTokenInfoCall>(input, |c| {
                c.token
            })?;
            Ok((HtsCall::View(ViewOp::FungibleTokenInfo(op)), ResultShape::View))
        }
        s if s == Hts::getNonFungibleTokenInfoCall::SELECTOR => {
            let op = decoders::decode_non_fungible_token_info_query(input)?;
            Ok((HtsCall::View(ViewOp::NonFungibleTokenInfo(op)), ResultShape::View))
        }
        s if s == Hts::getTokenCustomFeesCall::SELECTOR => {
            let op =
                decoders::decode_token_info_query::<Hts::getTokenCustomFeesCall>(input, |c| c.token)?;
            Ok((HtsCall::View(ViewOp::TokenCustomFees(op)), ResultShape::View))
        }
        s if s == Hts::getTokenDefaultFreezeStatusCall::SELECTOR => {
            let op = decoders::decode_token_info_query::<Hts::getTokenDefaultFreezeStatusCall>(
                input,
                |c| c.token,
            )?;
            Ok((HtsCall::View(ViewOp::DefaultFreezeStatus(op)), ResultShape::View))
        }
        s if s == Hts::getTokenDefaultKycStatusCall::SELECTOR => {
            let op = decoders::decode_token_info_query::<Hts::getTokenDefaultKycStatusCall>(
                input,
                |c| c.token,
            )?;
            Ok((HtsCall::View(ViewOp::DefaultKycStatus(op)), ResultShape::View))
        }
        s if s == Hts::getTokenKeyCall::SELECTOR => {
            let op = decoders::decode_get_token_key(input)?;
            Ok((HtsCall::View(ViewOp::TokenKey(op)), ResultShape::View))
        }
        s if s == Hts::getTokenTypeCall::SELECTOR => {
            let op = decoders::decode_token_info_query::<Hts::getTokenTypeCall>(input, |c| c.token)?;
            Ok((HtsCall::View(ViewOp::TokenType(op)), ResultShape::View))
        }
        s if s == Hts::getTokenExpiryInfoCall::SELECTOR => {
            let op =
                decoders::decode_token_info_query::<Hts::getTokenExpiryInfoCall>(input, |c| c.token)?;
            Ok((HtsCall::View(ViewOp::TokenExpiryInfo(op)), ResultShape::View))
        }
        s if s == Hts::isKycCall::SELECTOR => {
            let op = decoders::decode_is_kyc(input, ledgers)?;
            Ok((HtsCall::View(ViewOp::IsKyc(op)), ResultShape::View))
        }
        s if s == Hts::isFrozenCall::SELECTOR => {
            let op = decoders::decode_is_frozen(input, ledgers)?;
            Ok((HtsCall::View(ViewOp::IsFrozen(op)), ResultShape::View))
        }
        s if s == Hts::isTokenCall::SELECTOR => {
            let op = decoders::decode_token_info_query::<Hts::isTokenCall>(input, |c| c.token)?;
            Ok((HtsCall::View(ViewOp::IsToken(op)), ResultShape::View))
        }
        s if s == Hts::redirectForTokenCall::SELECTOR => {
            prepare_redirect(input, caller, ledgers, props)
        }
        _ => Err(PrepareFailure::Unrecognized),
    }
}

/// Dispatches the nested call of a `redirectForToken` proxy payload.
fn prepare_redirect(
    input: &[u8],
    caller: AccountId,
    ledgers: &WorldLedgers,
    props: &EngineProperties,
) -> PrepareResult {
    let Some((target, nested)) = abi::redirect_target(input) else {
        return Err(PrepareFailure::Decode(DecodeError::MalformedRedirect));
    };
    let token = decoders::token_from_address(target.token);
    let token_type =
        ledgers.type_of(token).ok_or(PrepareFailure::Status(ResponseCode::InvalidTokenId))?;
    let fungible = token_type.is_fungible();

    let fungible_only = |ok: bool| {
        if ok {
            Ok(())
        } else {
            Err(PrepareFailure::Status(ResponseCode::InvalidTokenId))
        }
    };

    match target.descriptor {
        s if s == Erc::nameCall::SELECTOR => {
            Ok((HtsCall::View(ViewOp::ErcName(token)), ResultShape::View))
        }
        s if s == Erc::symbolCall::SELECTOR => {
            Ok((HtsCall::View(ViewOp::ErcSymbol(token)), ResultShape::View))
        }
        s if s == Erc::decimalsCall::SELECTOR => {
            fungible_only(fungible)?;
            Ok((HtsCall::View(ViewOp::ErcDecimals(token)), ResultShape::View))
        }
        s if s == Erc::totalSupplyCall::SELECTOR => {
            Ok((HtsCall::View(ViewOp::ErcTotalSupply(token)), ResultShape::View))
        }
        s if s == Erc::balanceOfCall::SELECTOR => {
            let op = decoders::decode_balance_of(nested, token, ledgers)?;
            Ok((HtsCall::View(ViewOp::ErcBalanceOf(op)), ResultShape::View))
        }
        s if s == Erc::ownerOfCall::SELECTOR => {
            fungible_only(!fungible)?;
            let op = decoders::decode_owner_of(nested, token)?;
            Ok((HtsCall::View(ViewOp::ErcOwnerOf(op)), ResultShape::View))
        }
        s if s == Erc::tokenURICall::SELECTOR => {
            fungible_only(!fungible)?;
            let op = decoders::decode_token_uri(nested, token)?;
            Ok((HtsCall::View(ViewOp::ErcTokenUri(op)), ResultShape::View))
        }
        s if s == Erc::transferCall::SELECTOR => {
            fungible_only(fungible)?;
            let op = decoders::decode_erc_transfer(nested, token, caller, ledgers)?;
            Ok((HtsCall::Transfer(op), ResultShape::ErcBool))
        }
        s if s == Erc::transferFromCall::SELECTOR => {
            gate(props.allowances_enabled)?;
            let op = decoders::decode_erc_transfer_from(nested, token, fungible, caller, ledgers)?;
            Ok((HtsCall::Transfer(op), ResultShape::ErcBool))
        }
        s if s == Erc::allowanceCall::SELECTOR => {
            gate(props.allowances_enabled)?;
            let op = decoders::decode_erc_allowance(nested, token, ledgers)?;
            Ok((HtsCall::View(ViewOp::ErcAllowance(op)), ResultShape::View))
        }
        s if s == Erc::approveCall::SELECTOR => {
            gate(props.allowances_enabled)?;
            let op = decoders::decode_erc_approve(nested, token, fungible, ledgers)?;
            Ok((HtsCall::Approve { op, owner: caller }, ResultShape::ErcBool))
        }
        s if s == Erc::setApprovalForAllCall::SELECTOR => {
            gate(props.allowances_enabled)?;
            let op = decoders::decode_erc_set_approval_for_all(nested, token, ledgers)?;
            Ok((HtsCall::SetApprovalForAll { op, owner: caller }, ResultShape::ErcEmpty))
        }
        s if s == Erc::getApprovedCall::SELECTOR => {
            gate(props.allowances_enabled)?;
            let op = decoders::decode_erc_get_approved(nested, token)?;
            Ok((HtsCall::View(ViewOp::ErcGetApproved(op)), ResultShape::View))
        }
        s if s == Erc::isApprovedForAllCall::SELECTOR => {
            gate(props.allowances_enabled)?;
            let op = decoders::decode_erc_is_approved_for_all(nested, token, ledgers)?;
            Ok((HtsCall::View(ViewOp::ErcIsApprovedForAll(op)), ResultShape::View))
        }
        _ => Err(PrepareFailure::Unrecognized),
    }
}

/// Whether the prepared operation is read-only.
pub fn is_view(call: &HtsCall) -> bool {
    matches!(call, HtsCall::View(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Token;
    use crate::types::{TokenId, TokenType};
    use alloy_sol_types::SolCall;

    fn world_with(token: TokenId, token_type: TokenType) -> WorldLedgers {
        let mut world = WorldLedgers::new();
        world.begin();
        world.tokens_mut().put(token, Token { token_type, ..Default::default() });
        world.commit();
        world
    }

    #[test]
    fn unknown_selector_is_unrecognized() {
        let world = WorldLedgers::new();
        let result =
            prepare_computation(&[0xde, 0xad, 0xbe, 0xef], AccountId(1), &world, &Default::default());
        assert_eq!(result.unwrap_err(), PrepareFailure::Unrecognized);
    }

    #[test]
    fn short_input_is_unrecognized() {
        let world = WorldLedgers::new();
        let result = prepare_computation(&[0xde], AccountId(1), &world, &Default::default());
        assert_eq!(result.unwrap_err(), PrepareFailure::Unrecognized);
    }

    #[test]
    fn allowance_family_is_feature_gated() {
        let world = world_with(TokenId(7), TokenType::FungibleCommon);
        let props = EngineProperties { allowances_enabled: false, ..Default::default() };
        let input = Hts::approveCall {
            token: TokenId(7).to_evm_address(),
            spender: AccountId(2).to_evm_address(),
            amount: alloy_primitives::U256::from(5u64),
        }
        .abi_encode();
        let result = prepare_computation(&input, AccountId(1), &world, &props);
        assert_eq!(result.unwrap_err(), PrepareFailure::Status(ResponseCode::NotSupported));
    }

    #[test]
    fn decimals_on_non_fungible_is_invalid_token() {
        let token = TokenId(7);
        let world = world_with(token, TokenType::NonFungibleUnique);
        let mut input = Hts::redirectForTokenCall::SELECTOR.to_vec();
        input.extend_from_slice(token.to_evm_address().as_slice());
        input.extend_from_slice(&Erc::decimalsCall {}.abi_encode());
        let result = prepare_computation(&input, AccountId(1), &world, &Default::default());
        assert_eq!(result.unwrap_err(), PrepareFailure::Status(ResponseCode::InvalidTokenId));
    }

    #[test]
    fn erc_and_native_approve_share_descriptor_shape() {
        let token = TokenId(7);
        let world = world_with(token, TokenType::FungibleCommon);
        let props = EngineProperties::default();

        let native = Hts::approveCall {
            token: token.to_evm_address(),
            spender: AccountId(2).to_evm_address(),
            amount: alloy_primitives::U256::from(5u64),
        }
        .abi_encode();
        let (native_call, _) =
            prepare_computation(&native, AccountId(1), &world, &props).expect("native");

        let mut redirect = Hts::redirectForTokenCall::SELECTOR.to_vec();
        redirect.extend_from_slice(token.to_evm_address().as_slice());
        redirect.extend_from_slice(
            &Erc::approveCall {
                spender: AccountId(2).to_evm_address(),
                amount: alloy_primitives::U256::from(5u64),
            }
            .abi_encode(),
        );
        let (erc_call, _) =
            prepare_computation(&redirect, AccountId(1), &world, &props).expect("erc");

        assert_eq!(native_call, erc_call);
    }
}
