//! The synthetic transaction factory.
//!
//! Total, side-effect-free conversions from operation descriptors to canonical bodies. The only
//! non-trivial construction is `create_crypto_transfer`, which consolidates several token-scoped
//! wrappers into one body: wrappers naming the same token merge into a single transfer list.

use super::body::*;
use crate::{
    codec::{
        Association, BurnWrapper, CryptoTransferWrapper, Dissociation, HbarTransfer, MintWrapper,
        TokenCreateWrapper, TokenTransferWrapper, WipeWrapper,
    },
    types::{AccountId, TokenId},
};

/// Builds canonical transaction bodies from decoded descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticTxnFactory;

impl SyntheticTxnFactory {
    /// Creates a factory.
    pub fn new() -> Self {
        Self
    }

    /// Consolidates token-scoped transfer wrappers into one `CryptoTransfer` body.
    ///
    /// Wrappers referencing the same token id merge into a single per-token list: fungible
    /// adjustments combine by account (amounts summed, entries netting to zero dropped), and NFT
    /// legs concatenate in encounter order without de-duplication. Fungible merging is
    /// commutative; NFT leg order always follows the original call order.
    pub fn create_crypto_transfer(&self, wrappers: &[TokenTransferWrapper]) -> CryptoTransferBody {
        let mut body = CryptoTransferBody::default();
        if let [only] = wrappers {
            body.token_transfers.push(as_transfer_list(only));
            return body;
        }
        for wrapper in wrappers {
            let list = as_transfer_list(wrapper);
            match body.token_transfers.iter_mut().find(|have| have.token == list.token) {
                Some(have) => merge_token_transfers(have, list),
                None => body.token_transfers.push(list),
            }
        }
        body
    }

    /// Adds hbar legs to a transfer body, merging adjustments by account.
    pub fn merge_hbar_transfers(&self, body: &mut CryptoTransferBody, hbar: &[HbarTransfer]) {
        for transfer in hbar {
            if let Some(sender) = transfer.sender {
                merge_adjustment(
                    &mut body.hbar_transfers,
                    AccountAmount {
                        account: sender,
                        amount: -transfer.amount,
                        is_approval: transfer.is_approval,
                    },
                );
            }
            if let Some(receiver) = transfer.receiver {
                merge_adjustment(
                    &mut body.hbar_transfers,
                    AccountAmount {
                        account: receiver,
                        amount: transfer.amount,
                        is_approval: transfer.is_approval,
                    },
                );
            }
        }
    }

    /// Builds the full transfer body of one call: token legs merged per token, hbar legs merged
    /// per account.
    pub fn create_full_transfer(&self, wrapper: &CryptoTransferWrapper) -> TransactionBody {
        let mut body = self.create_crypto_transfer(&wrapper.token_transfers);
        self.merge_hbar_transfers(&mut body, &wrapper.hbar_transfers);
        TransactionBody::CryptoTransfer(body)
    }

    /// Builds a mint body.
    pub fn create_mint(&self, wrapper: &MintWrapper) -> TransactionBody {
        TransactionBody::TokenMint(TokenMintBody {
            token: wrapper.token,
            amount: wrapper.amount,
            metadata: wrapper.metadata.clone(),
        })
    }

    /// Builds a burn body.
    pub fn create_burn(&self, wrapper: &BurnWrapper) -> TransactionBody {
        TransactionBody::TokenBurn(TokenBurnBody {
            token: wrapper.token,
            amount: wrapper.amount,
            serial_numbers: wrapper.serial_numbers.clone(),
        })
    }

    /// Builds a wipe body.
    pub fn create_wipe(&self, wrapper: &WipeWrapper) -> TransactionBody {
        TransactionBody::TokenWipe(TokenWipeBody {
            token: wrapper.token,
            account: wrapper.account,
            amount: wrapper.amount,
            serial_numbers: wrapper.serial_numbers.clone(),
        })
    }

    /// Builds an associate body.
    pub fn create_associate(&self, association: &Association) -> TransactionBody {
        TransactionBody::TokenAssociate(TokenAssociateBody {
            account: association.account,
            tokens: association.tokens.clone(),
        })
    }

    /// Builds a dissociate body.
    pub fn create_dissociate(&self, dissociation: &Dissociation) -> TransactionBody {
        TransactionBody::TokenDissociate(TokenAssociateBody {
            account: dissociation.account,
            tokens: dissociation.tokens.clone(),
        })
    }

    /// Builds a freeze or unfreeze body.
    pub fn create_freeze(&self, token: TokenId, account: AccountId, freeze: bool) -> TransactionBody {
        let body = TokenAccountFlagBody { token, account };
        if freeze {
            TransactionBody::TokenFreeze(body)
        } else {
            TransactionBody::TokenUnfreeze(body)
        }
    }

    /// Builds a KYC grant or revoke body.
    pub fn create_kyc(&self, token: TokenId, account: AccountId, grant: bool) -> TransactionBody {
        let body = TokenAccountFlagBody { token, account };
        if grant {
            TransactionBody::TokenGrantKyc(body)
        } else {
            TransactionBody::TokenRevokeKyc(body)
        }
    }

    /// Builds a pause or unpause body.
    pub fn create_pause(&self, token: TokenId, pause: bool) -> TransactionBody {
        if pause {
            TransactionBody::TokenPause { token }
        } else {
            TransactionBody::TokenUnpause { token }
        }
    }

    /// Builds a delete body.
    pub fn create_delete(&self, token: TokenId) -> TransactionBody {
        TransactionBody::TokenDelete { token }
    }

    /// Builds a create body.
    pub fn create_token_create(&self, wrapper: &TokenCreateWrapper) -> TransactionBody {
        TransactionBody::TokenCreate(TokenCreateBody {
            token_type: wrapper.token_type,
            name: wrapper.name.clone(),
            symbol: wrapper.symbol.clone(),
            memo: wrapper.memo.clone(),
            treasury: wrapper.treasury,
            initial_supply: wrapper.initial_supply,
            decimals: wrapper.decimals,
            supply_type_finite: wrapper.supply_type_finite,
            max_supply: wrapper.max_supply,
            freeze_default: wrapper.freeze_default,
            keys: wrapper.keys.clone(),
            expiry: wrapper.expiry,
            custom_fees: wrapper.custom_fees.clone(),
        })
    }
}

fn as_transfer_list(wrapper: &TokenTransferWrapper) -> TokenTransferList {
    let mut list = TokenTransferList { token: wrapper.token, ..Default::default() };
    for transfer in &wrapper.fungible_transfers {
        if let Some(sender) = transfer.sender {
            list.transfers.push(AccountAmount {
                account: sender,
                amount: -transfer.amount,
                is_approval: transfer.is_approval,
            });
        }
        if let Some(receiver) = transfer.receiver {
            list.transfers.push(AccountAmount {
                account: receiver,
                amount: transfer.amount,
                is_approval: transfer.is_approval,
            });
        }
    }
    for exchange in &wrapper.nft_exchanges {
        list.nft_transfers.push(NftTransferLeg {
            sender: exchange.sender,
            receiver: exchange.receiver,
            serial: exchange.serial,
            is_approval: exchange.is_approval,
        });
    }
    list
}

/// Merges `from` into `to` for the same token id.
fn merge_token_transfers(to: &mut TokenTransferList, from: TokenTransferList) {
    for adjust in from.transfers {
        merge_adjustment(&mut to.transfers, adjust);
    }
    // NFT legs concatenate in encounter order; order is consensus-visible.
    to.nft_transfers.extend(from.nft_transfers);
}

fn merge_adjustment(list: &mut Vec<AccountAmount>, adjust: AccountAmount) {
    match list.iter_mut().find(|have| have.account == adjust.account) {
        Some(have) => {
            have.amount += adjust.amount;
            if have.amount == 0 {
                list.retain(|entry| entry.amount != 0);
            }
        }
        None => list.push(adjust),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FungibleTokenTransfer, NftExchange};

    fn fungible_wrapper(token: TokenId, from: AccountId, to: AccountId, amount: i64) -> TokenTransferWrapper {
        TokenTransferWrapper {
            token,
            fungible_transfers: vec![FungibleTokenTransfer::two_sided(
                token, amount, from, to, false,
            )],
            nft_exchanges: Vec::new(),
        }
    }

    fn nft_wrapper(token: TokenId, serial: i64) -> TokenTransferWrapper {
        TokenTransferWrapper {
            token,
            fungible_transfers: Vec::new(),
            nft_exchanges: vec![NftExchange {
                token,
                serial,
                sender: AccountId(1),
                receiver: AccountId(2),
                is_approval: false,
            }],
        }
    }

    #[test]
    fn same_token_wrappers_merge_into_one_list() {
        let factory = SyntheticTxnFactory::new();
        let token = TokenId(7);
        let body = factory.create_crypto_transfer(&[
            fungible_wrapper(token, AccountId(1), AccountId(2), 10),
            fungible_wrapper(token, AccountId(1), AccountId(3), 5),
        ]);
        assert_eq!(body.token_transfers.len(), 1);
        let list = &body.token_transfers[0];
        let net: i64 = list.transfers.iter().map(|t| t.amount).sum();
        assert_eq!(net, 0);
        let debit = list.transfers.iter().find(|t| t.account == AccountId(1)).unwrap();
        assert_eq!(debit.amount, -15);
    }

    #[test]
    fn fungible_merge_is_commutative() {
        let factory = SyntheticTxnFactory::new();
        let token = TokenId(7);
        let a = fungible_wrapper(token, AccountId(1), AccountId(2), 10);
        let b = fungible_wrapper(token, AccountId(2), AccountId(3), 4);
        let ab = factory.create_crypto_transfer(&[a.clone(), b.clone()]);
        let ba = factory.create_crypto_transfer(&[b, a]);
        let net_of = |body: &CryptoTransferBody, account: AccountId| {
            body.token_transfers[0]
                .transfers
                .iter()
                .filter(|t| t.account == account)
                .map(|t| t.amount)
                .sum::<i64>()
        };
        for account in [AccountId(1), AccountId(2), AccountId(3)] {
            assert_eq!(net_of(&ab, account), net_of(&ba, account));
        }
    }

    #[test]
    fn zero_sum_entries_are_dropped_on_merge() {
        let factory = SyntheticTxnFactory::new();
        let token = TokenId(7);
        let body = factory.create_crypto_transfer(&[
            fungible_wrapper(token, AccountId(1), AccountId(2), 10),
            fungible_wrapper(token, AccountId(2), AccountId(1), 10),
        ]);
        assert!(body.token_transfers[0].transfers.is_empty());
    }

    #[test]
    fn nft_legs_keep_encounter_order_and_duplicates() {
        let factory = SyntheticTxnFactory::new();
        let token = TokenId(7);
        let body = factory.create_crypto_transfer(&[
            nft_wrapper(token, 3),
            nft_wrapper(token, 1),
            nft_wrapper(token, 3),
        ]);
        let serials: Vec<i64> =
            body.token_transfers[0].nft_transfers.iter().map(|leg| leg.serial).collect();
        assert_eq!(serials, vec![3, 1, 3]);
    }

    #[test]
    fn distinct_tokens_stay_separate() {
        let factory = SyntheticTxnFactory::new();
        let body = factory.create_crypto_transfer(&[
            fungible_wrapper(TokenId(7), AccountId(1), AccountId(2), 10),
            nft_wrapper(TokenId(8), 1),
        ]);
        assert_eq!(body.token_transfers.len(), 2);
        assert_eq!(body.token_transfers[0].token, TokenId(7));
        assert_eq!(body.token_transfers[1].token, TokenId(8));
    }

    #[test]
    fn hbar_legs_merge_by_account() {
        let factory = SyntheticTxnFactory::new();
        let mut body = CryptoTransferBody::default();
        factory.merge_hbar_transfers(
            &mut body,
            &[
                HbarTransfer {
                    amount: 5,
                    sender: Some(AccountId(1)),
                    receiver: None,
                    is_approval: false,
                },
                HbarTransfer {
                    amount: 5,
                    sender: None,
                    receiver: Some(AccountId(2)),
                    is_approval: false,
                },
                HbarTransfer {
                    amount: 3,
                    sender: Some(AccountId(1)),
                    receiver: None,
                    is_approval: false,
                },
            ],
        );
        assert_eq!(body.hbar_transfers.len(), 2);
        assert_eq!(body.hbar_transfers[0].amount, -8);
    }
}
