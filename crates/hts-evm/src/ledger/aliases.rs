//! Alias resolution between EVM addresses and canonical entity numbers.

use alloy_primitives::Address;
use std::collections::BTreeMap;

use crate::types::{is_mirror_address, AccountId};

/// Resolves possibly-aliased EVM addresses to their canonical long-zero form.
///
/// A caller-supplied address may be a key-derived alias that has (or has not yet) been linked to
/// a ledger account. Decoders never assume a 1:1 address-to-id mapping; they ask the resolver,
/// and an unresolved alias collapses to the zero address so the decoded wrapper carries the
/// default id rather than failing.
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait AliasResolver {
    /// Resolves `address` to a long-zero address, or [`Address::ZERO`] if it is an unlinked
    /// alias.
    fn resolve_for_evm(&self, address: Address) -> Address;

    /// Whether `address` is already in canonical long-zero form.
    fn is_mirror(&self, address: Address) -> bool {
        is_mirror_address(address)
    }
}

/// In-memory alias links, the engine's default resolver.
#[derive(Debug, Clone, Default)]
pub struct ContractAliases {
    links: BTreeMap<Address, AccountId>,
}

impl ContractAliases {
    /// Creates a resolver with no links.
    pub fn new() -> Self {
        Self::default()
    }

    /// Links an alias to an account.
    pub fn link(&mut self, alias: Address, account: AccountId) {
        self.links.insert(alias, account);
    }

    /// Removes a link.
    pub fn unlink(&mut self, alias: Address) {
        self.links.remove(&alias);
    }
}

impl AliasResolver for ContractAliases {
    fn resolve_for_evm(&self, address: Address) -> Address {
        if is_mirror_address(address) {
            return address;
        }
        match self.links.get(&address) {
            Some(account) => account.to_evm_address(),
            None => Address::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn mirror_addresses_resolve_to_themselves() {
        let aliases = ContractAliases::new();
        let mirror = AccountId(77).to_evm_address();
        assert_eq!(aliases.resolve_for_evm(mirror), mirror);
        assert!(aliases.is_mirror(mirror));
    }

    #[test]
    fn linked_alias_resolves_to_long_zero() {
        let mut aliases = ContractAliases::new();
        let alias = address!("3e3d62efc552b8b8a9cf66a93f6bd194b5b1ccf9");
        aliases.link(alias, AccountId(1002));
        assert_eq!(aliases.resolve_for_evm(alias), AccountId(1002).to_evm_address());
    }

    #[test]
    fn unlinked_alias_resolves_to_zero() {
        let aliases = ContractAliases::new();
        let alias = address!("3e3d62efc552b8b8a9cf66a93f6bd194b5b1ccf9");
        assert_eq!(aliases.resolve_for_evm(alias), Address::ZERO);
        assert!(!aliases.is_mirror(alias));
    }
}
