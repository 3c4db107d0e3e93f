//! Ordered tracking of ledger-visible effects produced during logic application.
//!
//! The tracker is reset when a call enters the engine and consumed exactly once to build the
//! call's externalized record. Order matters: effects appear in the record in the order the
//! logic produced them.

use crate::types::{AccountId, NftId, TokenId};

/// One ledger-visible effect of an applied operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// An hbar balance adjustment.
    HbarAdjust {
        /// The adjusted account.
        account: AccountId,
        /// Signed adjustment in tinybars.
        amount: i64,
    },
    /// A fungible token balance adjustment.
    TokenUnitsAdjust {
        /// The token being adjusted.
        token: TokenId,
        /// The adjusted account.
        account: AccountId,
        /// Signed adjustment in the token's smallest units.
        amount: i64,
    },
    /// An NFT changed owners.
    NftOwnerChange {
        /// The exchanged serial.
        nft: NftId,
        /// Previous owner.
        from: AccountId,
        /// New owner.
        to: AccountId,
    },
    /// One or more serials were minted.
    NftMint {
        /// The token type minted under.
        token: TokenId,
        /// Serial numbers assigned, in mint order.
        serials: Vec<i64>,
    },
    /// A token's circulating supply changed.
    SupplyChange {
        /// The affected token.
        token: TokenId,
        /// The new total supply.
        new_total_supply: i64,
    },
    /// A new token-account association was created.
    AutoAssociation {
        /// The associated token.
        token: TokenId,
        /// The associated account.
        account: AccountId,
    },
    /// A new token type was created.
    TokenCreation {
        /// The id assigned to the new token.
        token: TokenId,
    },
}

/// Append-only, ordered log of [`SideEffect`]s for the current call.
#[derive(Debug, Clone, Default)]
pub struct SideEffectsTracker {
    effects: Vec<SideEffect>,
}

impl SideEffectsTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all tracked effects. Called once at call entry.
    pub fn reset(&mut self) {
        self.effects.clear();
    }

    /// Appends an effect.
    pub fn track(&mut self, effect: SideEffect) {
        self.effects.push(effect);
    }

    /// Number of tracked effects.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether nothing has been tracked.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Read-only view of the tracked effects, in production order.
    pub fn effects(&self) -> &[SideEffect] {
        &self.effects
    }

    /// Consumes the tracker's contents for record construction, leaving it empty.
    pub fn drain(&mut self) -> Vec<SideEffect> {
        std::mem::take(&mut self.effects)
    }

    /// The new total supply from the most recent supply change, if any.
    pub fn latest_supply_change(&self, token: TokenId) -> Option<i64> {
        self.effects.iter().rev().find_map(|effect| match effect {
            SideEffect::SupplyChange { token: t, new_total_supply } if *t == token => {
                Some(*new_total_supply)
            }
            _ => None,
        })
    }

    /// Serial numbers minted for `token` during this call, in mint order.
    pub fn minted_serials(&self, token: TokenId) -> Vec<i64> {
        self.effects
            .iter()
            .filter_map(|effect| match effect {
                SideEffect::NftMint { token: t, serials } if *t == token => Some(serials.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}
