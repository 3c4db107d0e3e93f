//! ABI encoding of call results.
//!
//! State-changing calls externalize a single 32-byte word holding the numeric status code (success
//! included); queries encode their Solidity return tuple. Unrecognized calls produce empty bytes
//! and are not handled here.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolValue;

use crate::{
    abi,
    ledger::{CustomFee, Key, Token, TokenKeys},
    status::ResponseCode,
    types::{AccountId, TokenId, TokenType},
};

/// The ledger id reported in token info views.
pub const LEDGER_ID: &str = "0x00";

fn code_word(code: ResponseCode) -> i64 {
    code.protocol_id()
}

/// Encodes a bare status word, the result shape of most state-changing calls.
pub fn encode_status(code: ResponseCode) -> Bytes {
    code_word(code).abi_encode().into()
}

/// Encodes the `mintToken` result: status, new total supply, minted serial numbers.
pub fn encode_mint_success(new_total_supply: i64, serial_numbers: Vec<i64>) -> Bytes {
    (code_word(ResponseCode::Success), new_total_supply, serial_numbers).abi_encode().into()
}

/// Encodes a failed `mintToken` result carrying the failure status.
pub fn encode_mint_failure(code: ResponseCode) -> Bytes {
    (code_word(code), 0i64, Vec::<i64>::new()).abi_encode().into()
}

/// Encodes the `burnToken` result: status and new total supply.
pub fn encode_burn_success(new_total_supply: i64) -> Bytes {
    (code_word(ResponseCode::Success), new_total_supply).abi_encode().into()
}

/// Encodes a failed `burnToken` result.
pub fn encode_burn_failure(code: ResponseCode) -> Bytes {
    (code_word(code), 0i64).abi_encode().into()
}

/// Encodes the token create result: status and the new token's address.
pub fn encode_create_success(token: TokenId) -> Bytes {
    (code_word(ResponseCode::Success), token.to_evm_address()).abi_encode().into()
}

/// Encodes a failed token create result.
pub fn encode_create_failure(code: ResponseCode) -> Bytes {
    (code_word(code), Address::ZERO).abi_encode().into()
}

/// Encodes a `(status, bool)` pair, the result shape of the flag queries and native `approve`.
pub fn encode_status_bool(code: ResponseCode, flag: bool) -> Bytes {
    (code_word(code), flag).abi_encode().into()
}

/// Encodes the native `allowance` result.
pub fn encode_allowance(amount: i64) -> Bytes {
    (code_word(ResponseCode::Success), U256::from(amount.max(0))).abi_encode().into()
}

/// Encodes the native `getApproved` result.
pub fn encode_get_approved(approved: Option<AccountId>) -> Bytes {
    let address = approved.map_or(Address::ZERO, AccountId::to_evm_address);
    (code_word(ResponseCode::Success), address).abi_encode().into()
}

/// Encodes the `getTokenType` result.
pub fn encode_token_type(token_type: TokenType) -> Bytes {
    let ordinal: i32 = match token_type {
        TokenType::FungibleCommon => 0,
        TokenType::NonFungibleUnique => 1,
    };
    (code_word(ResponseCode::Success), ordinal).abi_encode().into()
}

/// Encodes the `getTokenExpiryInfo` result.
pub fn encode_expiry_info(expiry: abi::Expiry) -> Bytes {
    (code_word(ResponseCode::Success), expiry).abi_encode().into()
}

/// Encodes the `getTokenKey` result.
pub fn encode_token_key(key: abi::KeyValue) -> Bytes {
    (code_word(ResponseCode::Success), key).abi_encode().into()
}

/// Encodes the `getTokenInfo` result.
pub fn encode_token_info(info: abi::TokenInfo) -> Bytes {
    (code_word(ResponseCode::Success), info).abi_encode().into()
}

/// Encodes the `getFungibleTokenInfo` result.
pub fn encode_fungible_token_info(info: abi::FungibleTokenInfo) -> Bytes {
    (code_word(ResponseCode::Success), info).abi_encode().into()
}

/// Encodes the `getNonFungibleTokenInfo` result.
pub fn encode_non_fungible_token_info(info: abi::NonFungibleTokenInfo) -> Bytes {
    (code_word(ResponseCode::Success), info).abi_encode().into()
}

/// Encodes the `getTokenCustomFees` result.
pub fn encode_token_custom_fees(fees: &[CustomFee]) -> Bytes {
    let (fixed, fractional, royalty) = abi_fees(fees);
    (code_word(ResponseCode::Success), fixed, fractional, royalty).abi_encode().into()
}

/// Encodes a single ERC string return (`name`, `symbol`, `tokenURI`).
pub fn encode_erc_string(value: String) -> Bytes {
    value.abi_encode().into()
}

/// Encodes a single ERC unsigned word return (`totalSupply`, `balanceOf`, `allowance`).
pub fn encode_erc_uint(value: i64) -> Bytes {
    U256::from(value.max(0)).abi_encode().into()
}

/// Encodes a single ERC `uint8` return (`decimals`). A `uint8` occupies a full left-padded
/// word, so the `uint256` encoding is byte-identical.
pub fn encode_erc_u8(value: u8) -> Bytes {
    U256::from(value).abi_encode().into()
}

/// Encodes a single ERC boolean return (`transfer`, `approve`, `isApprovedForAll`).
pub fn encode_erc_bool(value: bool) -> Bytes {
    value.abi_encode().into()
}

/// Encodes a single ERC address return (`ownerOf`, `getApproved`).
pub fn encode_erc_address(account: Option<AccountId>) -> Bytes {
    account.map_or(Address::ZERO, AccountId::to_evm_address).abi_encode().into()
}

// --- Entity-to-ABI conversions ---------------------------------------------------------------

fn abi_key_value(key: &Key) -> abi::KeyValue {
    abi::KeyValue { ed25519: key.0.clone(), ..Default::default() }
}

fn abi_token_keys(keys: &TokenKeys) -> Vec<abi::TokenKey> {
    use super::wrappers::TokenKeyType;
    let roles: [(TokenKeyType, &Option<Key>); 7] = [
        (TokenKeyType::ADMIN, &keys.admin),
        (TokenKeyType::KYC, &keys.kyc),
        (TokenKeyType::FREEZE, &keys.freeze),
        (TokenKeyType::WIPE, &keys.wipe),
        (TokenKeyType::SUPPLY, &keys.supply),
        (TokenKeyType::FEE_SCHEDULE, &keys.fee_schedule),
        (TokenKeyType::PAUSE, &keys.pause),
    ];
    roles
        .into_iter()
        .filter_map(|(bits, key)| {
            key.as_ref().map(|key| abi::TokenKey {
                keyType: U256::from(bits.bits()),
                key: abi_key_value(key),
            })
        })
        .collect()
}

/// Looks up the ABI key value for one role bit, or an empty key when the role is keyless.
pub fn abi_key_for_role(keys: &TokenKeys, role: super::wrappers::TokenKeyType) -> abi::KeyValue {
    use super::wrappers::TokenKeyType;
    let key = if role == TokenKeyType::ADMIN {
        &keys.admin
    } else if role == TokenKeyType::KYC {
        &keys.kyc
    } else if role == TokenKeyType::FREEZE {
        &keys.freeze
    } else if role == TokenKeyType::WIPE {
        &keys.wipe
    } else if role == TokenKeyType::SUPPLY {
        &keys.supply
    } else if role == TokenKeyType::FEE_SCHEDULE {
        &keys.fee_schedule
    } else if role == TokenKeyType::PAUSE {
        &keys.pause
    } else {
        &None
    };
    key.as_ref().map(abi_key_value).unwrap_or_default()
}

/// Converts a stored expiry into its ABI form.
pub fn abi_expiry(expiry: &crate::ledger::TokenExpiry) -> abi::Expiry {
    abi::Expiry {
        second: expiry.second,
        autoRenewAccount: expiry
            .auto_renew_account
            .map_or(Address::ZERO, AccountId::to_evm_address),
        autoRenewPeriod: expiry.auto_renew_period,
    }
}

fn abi_fees(fees: &[CustomFee]) -> (Vec<abi::FixedFee>, Vec<abi::FractionalFee>, Vec<abi::RoyaltyFee>)
{
    let mut fixed = Vec::new();
    let mut fractional = Vec::new();
    let mut royalty = Vec::new();
    for fee in fees {
        match fee {
            CustomFee::Fixed { amount, denominating_token, collector } => {
                fixed.push(abi::FixedFee {
                    amount: *amount,
                    tokenId: denominating_token.map_or(Address::ZERO, TokenId::to_evm_address),
                    useHbarsForPayment: denominating_token.is_none(),
                    useCurrentTokenForPayment: false,
                    feeCollector: collector.to_evm_address(),
                });
            }
            CustomFee::Fractional {
                numerator,
                denominator,
                minimum,
                maximum,
                net_of_transfers,
                collector,
            } => {
                fractional.push(abi::FractionalFee {
                    numerator: *numerator,
                    denominator: *denominator,
                    minimumAmount: *minimum,
                    maximumAmount: *maximum,
                    netOfTransfers: *net_of_transfers,
                    feeCollector: collector.to_evm_address(),
                });
            }
            CustomFee::Royalty {
                numerator,
                denominator,
                fallback_amount,
                fallback_token,
                collector,
            } => {
                royalty.push(abi::RoyaltyFee {
                    numerator: *numerator,
                    denominator: *denominator,
                    amount: *fallback_amount,
                    tokenId: fallback_token.map_or(Address::ZERO, TokenId::to_evm_address),
                    useHbarsForPayment: fallback_token.is_none(),
                    feeCollector: collector.to_evm_address(),
                });
            }
        }
    }
    (fixed, fractional, royalty)
}

/// Builds the aggregate `TokenInfo` view of a stored token.
pub fn abi_token_info(token: &Token) -> abi::TokenInfo {
    let (fixed, fractional, royalty) = abi_fees(&token.custom_fees);
    abi::TokenInfo {
        token: abi::HederaToken {
            name: token.name.clone(),
            symbol: token.symbol.clone(),
            treasury: token.treasury.to_evm_address(),
            memo: token.memo.clone(),
            tokenSupplyType: token.supply_type_finite,
            maxSupply: u32::try_from(token.max_supply).unwrap_or(u32::MAX),
            freezeDefault: token.default_freeze_status,
            tokenKeys: abi_token_keys(&token.keys),
            expiry: abi_expiry(&token.expiry),
        },
        totalSupply: token.total_supply,
        deleted: token.deleted,
        defaultKycStatus: token.default_kyc_status,
        pauseStatus: token.paused,
        fixedFees: fixed,
        fractionalFees: fractional,
        royaltyFees: royalty,
        ledgerId: LEDGER_ID.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_word_is_one_left_padded_word() {
        let word = encode_status(ResponseCode::Success);
        assert_eq!(word.len(), 32);
        assert_eq!(word[31], 22);
        assert!(word[..31].iter().all(|b| *b == 0));
    }

    #[test]
    fn failure_status_encodes_its_protocol_id() {
        let word = encode_status(ResponseCode::InvalidTokenId);
        assert_eq!(word[31], 167);
    }

    #[test]
    fn mint_success_carries_supply_and_serials() {
        let out = encode_mint_success(150, vec![1, 2]);
        // Three head words (status, supply, offset) plus length + 2 serials.
        assert_eq!(out.len(), 32 * 6);
        assert_eq!(out[31], 22);
        assert_eq!(out[63], 150);
    }

    #[test]
    fn erc_bool_is_a_single_word() {
        let out = encode_erc_bool(true);
        assert_eq!(out.len(), 32);
        assert_eq!(out[31], 1);
    }

    #[test]
    fn token_info_round_trips_through_abi() {
        use alloy_sol_types::SolValue as _;
        let token = Token { name: "Alpha".into(), total_supply: 77, ..Default::default() };
        let encoded = encode_token_info(abi_token_info(&token));
        let (code, info) =
            <(i64, abi::TokenInfo)>::abi_decode(&encoded, true).expect("round trips");
        assert_eq!(code, 22);
        assert_eq!(info.token.name, "Alpha");
        assert_eq!(info.totalSupply, 77);
        assert_eq!(info.ledgerId, LEDGER_ID);
    }
}
