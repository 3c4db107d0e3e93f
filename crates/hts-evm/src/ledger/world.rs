//! The ledger facade aggregating the transactional tables and alias links.

use alloy_primitives::Address;

use super::{
    aliases::{AliasResolver, ContractAliases},
    entities::{Account, Nft, Token, TokenRelationship},
    table::TransactionalLedger,
};
use crate::types::{AccountId, NftId, TokenId, TokenType};

/// Key of the token-relationship table.
pub type RelKey = (AccountId, TokenId);

/// Aggregation of the accounts, tokens, token-relationship and NFT tables, plus alias links.
///
/// The facade is exclusively owned by one call chain at a time. `begin`/`commit`/`revert` always
/// act on all four tables together, so a call can never commit one table and roll back another.
#[derive(Debug, Clone, Default)]
pub struct WorldLedgers {
    accounts: TransactionalLedger<AccountId, Account>,
    tokens: TransactionalLedger<TokenId, Token>,
    token_rels: TransactionalLedger<RelKey, TokenRelationship>,
    nfts: TransactionalLedger<NftId, Nft>,
    aliases: ContractAliases,
}

impl WorldLedgers {
    /// Creates an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a staging frame on every table.
    pub fn begin(&mut self) {
        self.accounts.begin();
        self.tokens.begin();
        self.token_rels.begin();
        self.nfts.begin();
    }

    /// Commits the top staging frame of every table together.
    pub fn commit(&mut self) {
        self.accounts.commit();
        self.tokens.commit();
        self.token_rels.commit();
        self.nfts.commit();
    }

    /// Discards the top staging frame of every table together.
    pub fn revert(&mut self) {
        self.accounts.rollback();
        self.tokens.rollback();
        self.token_rels.rollback();
        self.nfts.rollback();
    }

    /// Current staging depth (identical across tables by construction).
    pub fn depth(&self) -> usize {
        self.accounts.depth()
    }

    /// The accounts table.
    pub fn accounts(&self) -> &TransactionalLedger<AccountId, Account> {
        &self.accounts
    }

    /// The accounts table, writable.
    pub fn accounts_mut(&mut self) -> &mut TransactionalLedger<AccountId, Account> {
        &mut self.accounts
    }

    /// The tokens table.
    pub fn tokens(&self) -> &TransactionalLedger<TokenId, Token> {
        &self.tokens
    }

    /// The tokens table, writable.
    pub fn tokens_mut(&mut self) -> &mut TransactionalLedger<TokenId, Token> {
        &mut self.tokens
    }

    /// The token-relationship table.
    pub fn token_rels(&self) -> &TransactionalLedger<RelKey, TokenRelationship> {
        &self.token_rels
    }

    /// The token-relationship table, writable.
    pub fn token_rels_mut(&mut self) -> &mut TransactionalLedger<RelKey, TokenRelationship> {
        &mut self.token_rels
    }

    /// The NFT table.
    pub fn nfts(&self) -> &TransactionalLedger<NftId, Nft> {
        &self.nfts
    }

    /// The NFT table, writable.
    pub fn nfts_mut(&mut self) -> &mut TransactionalLedger<NftId, Nft> {
        &mut self.nfts
    }

    /// The alias links.
    pub fn aliases(&self) -> &ContractAliases {
        &self.aliases
    }

    /// The alias links, writable.
    pub fn aliases_mut(&mut self) -> &mut ContractAliases {
        &mut self.aliases
    }

    /// Resolves a possibly-aliased address to an account id, defaulting to the missing id.
    pub fn resolve_account(&self, address: Address) -> AccountId {
        let resolved = self.aliases.resolve_for_evm(address);
        AccountId::from_evm_address(resolved).unwrap_or(AccountId::MISSING)
    }

    // --- Typed views used by decoders, pricing and the read path ---

    /// Whether a token with this id exists (deleted tokens still exist).
    pub fn token_exists(&self, token: TokenId) -> bool {
        self.tokens.contains(&token)
    }

    /// The token's kind, if it exists.
    pub fn type_of(&self, token: TokenId) -> Option<TokenType> {
        self.tokens.get(&token).map(|t| t.token_type)
    }

    /// The token's name, if it exists.
    pub fn name_of(&self, token: TokenId) -> Option<String> {
        self.tokens.get(&token).map(|t| t.name.clone())
    }

    /// The token's symbol, if it exists.
    pub fn symbol_of(&self, token: TokenId) -> Option<String> {
        self.tokens.get(&token).map(|t| t.symbol.clone())
    }

    /// The token's decimals, if it exists.
    pub fn decimals_of(&self, token: TokenId) -> Option<u32> {
        self.tokens.get(&token).map(|t| t.decimals)
    }

    /// The token's circulating supply, if it exists.
    pub fn total_supply_of(&self, token: TokenId) -> Option<i64> {
        self.tokens.get(&token).map(|t| t.total_supply)
    }

    /// The account's balance of the token; zero when unassociated.
    pub fn balance_of(&self, account: AccountId, token: TokenId) -> i64 {
        self.token_rels.get(&(account, token)).map_or(0, |rel| rel.balance)
    }

    /// Whether the account has been granted KYC for the token.
    pub fn is_kyc_granted(&self, account: AccountId, token: TokenId) -> bool {
        self.token_rels.get(&(account, token)).is_some_and(|rel| rel.kyc_granted)
    }

    /// Whether the account is frozen for the token.
    pub fn is_frozen(&self, account: AccountId, token: TokenId) -> bool {
        self.token_rels.get(&(account, token)).is_some_and(|rel| rel.frozen)
    }

    /// The owner of record for an NFT serial, with the treasury substituted for serials still
    /// held by the treasury sentinel.
    pub fn owner_of(&self, nft: NftId) -> Option<AccountId> {
        let serial = self.nfts.get(&nft)?;
        if serial.owner.is_missing() {
            self.tokens.get(&nft.token).map(|t| t.treasury)
        } else {
            Some(serial.owner)
        }
    }

    /// The metadata of an NFT serial.
    pub fn metadata_of(&self, nft: NftId) -> Option<alloy_primitives::Bytes> {
        self.nfts.get(&nft).map(|n| n.metadata.clone())
    }

    /// The remaining fungible allowance granted by `owner` to `spender` for `token`.
    pub fn allowance_of(&self, owner: AccountId, token: TokenId, spender: AccountId) -> i64 {
        self.accounts
            .get(&owner)
            .and_then(|a| a.fungible_allowances.get(&(token, spender)).copied())
            .unwrap_or(0)
    }

    /// Whether `operator` is approved for all of `owner`'s serials of `token`.
    pub fn is_approved_for_all(
        &self,
        owner: AccountId,
        token: TokenId,
        operator: AccountId,
    ) -> bool {
        self.accounts.get(&owner).is_some_and(|a| a.approved_for_all.contains(&(token, operator)))
    }

    /// The spender approved for one specific serial, if any.
    pub fn approved_spender_of(&self, nft: NftId) -> Option<AccountId> {
        self.nfts.get(&nft).and_then(|n| n.spender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entities::Token;

    fn world_with_token() -> (WorldLedgers, TokenId) {
        let mut world = WorldLedgers::new();
        let token = TokenId(1234);
        world.begin();
        world.tokens_mut().put(
            token,
            Token { treasury: AccountId(2), total_supply: 100, ..Default::default() },
        );
        world.commit();
        (world, token)
    }

    #[test]
    fn commit_is_all_or_nothing_across_tables() {
        let (mut world, token) = world_with_token();
        world.begin();
        world.accounts_mut().put(AccountId(5), Account { balance: 10, ..Default::default() });
        world
            .token_rels_mut()
            .put((AccountId(5), token), TokenRelationship { balance: 3, ..Default::default() });
        world.revert();
        assert!(!world.accounts().contains(&AccountId(5)));
        assert_eq!(world.balance_of(AccountId(5), token), 0);
    }

    #[test]
    fn treasury_substitution_for_sentinel_owner() {
        let (mut world, token) = world_with_token();
        world.begin();
        world.nfts_mut().put(NftId::new(token, 1), Nft::default());
        world.commit();
        assert_eq!(world.owner_of(NftId::new(token, 1)), Some(AccountId(2)));
    }

    #[test]
    fn unlinked_alias_resolves_to_missing_account() {
        let (world, _) = world_with_token();
        let alias = Address::repeat_byte(0xab);
        assert_eq!(world.resolve_account(alias), AccountId::MISSING);
    }
}
