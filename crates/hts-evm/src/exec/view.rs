//! The read-only execution path.
//!
//! Views run after decode and pricing but never stage or commit; they read the facade and encode
//! their Solidity return tuple. A failed lookup is a status-coded failure like any other
//! recoverable error.

use alloy_primitives::Bytes;

use crate::{
    codec::{encoding, ViewOp},
    ledger::WorldLedgers,
    status::ResponseCode,
    types::{NftId, TokenId},
};

/// The string served as `tokenURI` for serials that do not exist.
pub const URI_QUERY_NON_EXISTING_TOKEN_ERROR: &str =
    "ERC721Metadata: URI query for nonexistent token";

/// Executes read-only operations against the ledger facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewExecutor;

impl ViewExecutor {
    /// Creates a view executor.
    pub fn new() -> Self {
        Self
    }

    /// Runs the query and encodes its return tuple.
    pub fn execute(&self, op: &ViewOp, ledgers: &WorldLedgers) -> Result<Bytes, ResponseCode> {
        match op {
            ViewOp::TokenInfo(q) => {
                let token = self.existing(ledgers, q.token)?;
                Ok(encoding::encode_token_info(encoding::abi_token_info(&token)))
            }
            ViewOp::FungibleTokenInfo(q) => {
                let token = self.existing(ledgers, q.token)?;
                let info = crate::abi::FungibleTokenInfo {
                    tokenInfo: encoding::abi_token_info(&token),
                    decimals: token.decimals as i32,
                };
                Ok(encoding::encode_fungible_token_info(info))
            }
            ViewOp::NonFungibleTokenInfo(q) => {
                let token = self.existing(ledgers, q.token)?;
                let serial = q.serial_number.ok_or(ResponseCode::InvalidTokenNftSerialNumber)?;
                let nft_id = NftId::new(q.token, serial);
                let nft =
                    ledgers.nfts().get(&nft_id).ok_or(ResponseCode::InvalidNftId)?.clone();
                let owner = ledgers.owner_of(nft_id).unwrap_or_default();
                let info = crate::abi::NonFungibleTokenInfo {
                    tokenInfo: encoding::abi_token_info(&token),
                    serialNumber: serial,
                    ownerId: owner.to_evm_address(),
                    creationTime: nft.creation_time,
                    metadata: nft.metadata.clone(),
                    spenderId: nft
                        .spender
                        .map_or(alloy_primitives::Address::ZERO, |s| s.to_evm_address()),
                };
                Ok(encoding::encode_non_fungible_token_info(info))
            }
            ViewOp::TokenCustomFees(q) => {
                let token = self.existing(ledgers, q.token)?;
                Ok(encoding::encode_token_custom_fees(&token.custom_fees))
            }
            ViewOp::DefaultFreezeStatus(q) => {
                let token = self.existing(ledgers, q.token)?;
                Ok(encoding::encode_status_bool(
                    ResponseCode::Success,
                    token.default_freeze_status,
                ))
            }
            ViewOp::DefaultKycStatus(q) => {
                let token = self.existing(ledgers, q.token)?;
                Ok(encoding::encode_status_bool(ResponseCode::Success, token.default_kyc_status))
            }
            ViewOp::TokenKey(q) => {
                let token = self.existing(ledgers, q.token)?;
                Ok(encoding::encode_token_key(encoding::abi_key_for_role(
                    &token.keys,
                    q.key_type,
                )))
            }
            ViewOp::TokenType(q) => {
                let token = self.existing(ledgers, q.token)?;
                Ok(encoding::encode_token_type(token.token_type))
            }
            ViewOp::TokenExpiryInfo(q) => {
                let token = self.existing(ledgers, q.token)?;
                Ok(encoding::encode_expiry_info(encoding::abi_expiry(&token.expiry)))
            }
            ViewOp::IsKyc(q) => {
                self.existing(ledgers, q.token)?;
                Ok(encoding::encode_status_bool(
                    ResponseCode::Success,
                    ledgers.is_kyc_granted(q.account, q.token),
                ))
            }
            ViewOp::IsFrozen(q) => {
                self.existing(ledgers, q.token)?;
                Ok(encoding::encode_status_bool(
                    ResponseCode::Success,
                    ledgers.is_frozen(q.account, q.token),
                ))
            }
            ViewOp::IsToken(q) => Ok(encoding::encode_status_bool(
                ResponseCode::Success,
                ledgers.token_exists(q.token),
            )),
            ViewOp::Allowance(q) => {
                self.existing(ledgers, q.token)?;
                Ok(encoding::encode_allowance(ledgers.allowance_of(q.owner, q.token, q.spender)))
            }
            ViewOp::GetApproved(q) => {
                self.existing(ledgers, q.token)?;
                let nft_id = NftId::new(q.token, q.serial_number);
                if !ledgers.nfts().contains(&nft_id) {
                    return Err(ResponseCode::InvalidNftId);
                }
                Ok(encoding::encode_get_approved(ledgers.approved_spender_of(nft_id)))
            }
            ViewOp::IsApprovedForAll(q) => {
                self.existing(ledgers, q.token)?;
                Ok(encoding::encode_status_bool(
                    ResponseCode::Success,
                    ledgers.is_approved_for_all(q.owner, q.token, q.operator),
                ))
            }
            ViewOp::ErcName(token) => {
                Ok(encoding::encode_erc_string(self.existing(ledgers, *token)?.name))
            }
            ViewOp::ErcSymbol(token) => {
                Ok(encoding::encode_erc_string(self.existing(ledgers, *token)?.symbol))
            }
            ViewOp::ErcDecimals(token) => {
                let token = self.existing(ledgers, *token)?;
                Ok(encoding::encode_erc_u8(token.decimals.min(u8::MAX.into()) as u8))
            }
            ViewOp::ErcTotalSupply(token) => {
                Ok(encoding::encode_erc_uint(self.existing(ledgers, *token)?.total_supply))
            }
            ViewOp::ErcBalanceOf(q) => {
                self.existing(ledgers, q.token)?;
                Ok(encoding::encode_erc_uint(ledgers.balance_of(q.account, q.token)))
            }
            ViewOp::ErcOwnerOf(q) => {
                self.existing(ledgers, q.token)?;
                let owner = ledgers
                    .owner_of(NftId::new(q.token, q.serial_number))
                    .ok_or(ResponseCode::InvalidNftId)?;
                Ok(encoding::encode_erc_address(Some(owner)))
            }
            ViewOp::ErcTokenUri(q) => {
                self.existing(ledgers, q.token)?;
                let uri = ledgers
                    .metadata_of(NftId::new(q.token, q.serial_number))
                    .map_or_else(
                        || URI_QUERY_NON_EXISTING_TOKEN_ERROR.to_owned(),
                        |metadata| String::from_utf8_lossy(&metadata).into_owned(),
                    );
                Ok(encoding::encode_erc_string(uri))
            }
            ViewOp::ErcAllowance(q) => {
                self.existing(ledgers, q.token)?;
                Ok(encoding::encode_erc_uint(ledgers.allowance_of(q.owner, q.token, q.spender)))
            }
            ViewOp::ErcGetApproved(q) => {
                self.existing(ledgers, q.token)?;
                let nft_id = NftId::new(q.token, q.serial_number);
                if !ledgers.nfts().contains(&nft_id) {
                    return Err(ResponseCode::InvalidNftId);
                }
                Ok(encoding::encode_erc_address(ledgers.approved_spender_of(nft_id)))
            }
            ViewOp::ErcIsApprovedForAll(q) => {
                self.existing(ledgers, q.token)?;
                Ok(encoding::encode_erc_bool(ledgers.is_approved_for_all(
                    q.owner,
                    q.token,
                    q.operator,
                )))
            }
        }
    }

    fn existing(
        &self,
        ledgers: &WorldLedgers,
        token: TokenId,
    ) -> Result<crate::ledger::Token, ResponseCode> {
        ledgers.tokens().get(&token).cloned().ok_or(ResponseCode::InvalidTokenId)
    }
}
