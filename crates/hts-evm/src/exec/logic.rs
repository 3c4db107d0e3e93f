//! Domain logic collaborators and the factory that builds them.
//!
//! The collaborators are stateless: the factory binds them to nothing, and every method takes
//! the ledger facade and the side-effect tracker for the current call. Each follows
//! validate-then-apply and reports rejections as [`ResponseCode`]s; the execution engine
//! discards the staged frame on any non-OK code, so partially applied logic can never leak into
//! committed state.

use crate::{
    codec::{
        ApproveWrapper, Association, Dissociation, SetApprovalForAllWrapper, TokenExpiryWrapper,
        TokenKeyType, TokenUpdateKeysWrapper, TokenUpdateWrapper, WipeWrapper,
    },
    ledger::{
        Nft, SideEffect, SideEffectsTracker, Token, TokenRelationship, WorldLedgers,
    },
    status::ResponseCode,
    synth::{CryptoTransferBody, TokenCreateBody},
    types::{AccountId, NftId, Timestamp, TokenId, TokenType},
};

/// Result alias for logic application.
pub type LogicResult = Result<(), ResponseCode>;

/// One validated, ledger-level balance or ownership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceChange {
    /// An hbar adjustment.
    Hbar {
        /// The adjusted account.
        account: AccountId,
        /// Signed tinybar units.
        units: i64,
        /// Whether a debit consumes an hbar allowance.
        is_approval: bool,
    },
    /// A fungible token adjustment.
    Fungible {
        /// The denominating token.
        token: TokenId,
        /// The adjusted account.
        account: AccountId,
        /// Signed token units.
        units: i64,
        /// Whether a debit consumes a fungible allowance.
        is_approval: bool,
    },
    /// An NFT ownership change.
    Nft {
        /// The non-fungible token type.
        token: TokenId,
        /// The exchanged serial.
        serial: i64,
        /// Stated current owner.
        sender: AccountId,
        /// New owner.
        receiver: AccountId,
        /// Whether the exchange consumes an approval.
        is_approval: bool,
    },
}

impl BalanceChange {
    /// Whether this change debits the named party.
    pub fn is_debit(&self) -> bool {
        matches!(self, Self::Hbar { units, .. } | Self::Fungible { units, .. } if *units < 0)
    }

    /// Whether the change is authorized via an approval rather than a signature.
    pub fn is_approval(&self) -> bool {
        match self {
            Self::Hbar { is_approval, .. }
            | Self::Fungible { is_approval, .. }
            | Self::Nft { is_approval, .. } => *is_approval,
        }
    }
}

/// Flattens a canonical transfer body into ordered balance changes: hbar legs first, then token
/// lists in body order.
pub fn balance_changes_of(body: &CryptoTransferBody) -> Vec<BalanceChange> {
    let mut changes = Vec::new();
    for adjust in &body.hbar_transfers {
        changes.push(BalanceChange::Hbar {
            account: adjust.account,
            units: adjust.amount,
            is_approval: adjust.is_approval,
        });
    }
    for list in &body.token_transfers {
        for adjust in &list.transfers {
            changes.push(BalanceChange::Fungible {
                token: list.token,
                account: adjust.account,
                units: adjust.amount,
                is_approval: adjust.is_approval,
            });
        }
        for leg in &list.nft_transfers {
            changes.push(BalanceChange::Nft {
                token: list.token,
                serial: leg.serial,
                sender: leg.sender,
                receiver: leg.receiver,
                is_approval: leg.is_approval,
            });
        }
    }
    changes
}

fn usable_token(ledgers: &WorldLedgers, token: TokenId) -> Result<Token, ResponseCode> {
    let token = ledgers.tokens().get(&token).ok_or(ResponseCode::InvalidTokenId)?.clone();
    if token.deleted {
        return Err(ResponseCode::TokenWasDeleted);
    }
    if token.paused {
        return Err(ResponseCode::TokenIsPaused);
    }
    Ok(token)
}

fn rel_of(
    ledgers: &WorldLedgers,
    account: AccountId,
    token: TokenId,
) -> Result<TokenRelationship, ResponseCode> {
    ledgers
        .token_rels()
        .get(&(account, token))
        .copied()
        .ok_or(ResponseCode::TokenNotAssociatedToAccount)
}

fn usable_rel(
    ledgers: &WorldLedgers,
    token_entity: &Token,
    account: AccountId,
    token: TokenId,
) -> Result<TokenRelationship, ResponseCode> {
    let rel = rel_of(ledgers, account, token)?;
    if rel.frozen {
        return Err(ResponseCode::AccountFrozenForToken);
    }
    if token_entity.keys.kyc.is_some() && !rel.kyc_granted {
        return Err(ResponseCode::AccountKycNotGrantedForToken);
    }
    Ok(rel)
}

fn adjust_rel_balance(
    ledgers: &mut WorldLedgers,
    account: AccountId,
    token: TokenId,
    delta: i64,
) -> LogicResult {
    let updated = ledgers.token_rels_mut().update(&(account, token), |rel| {
        rel.balance += delta;
    });
    if updated {
        Ok(())
    } else {
        Err(ResponseCode::TokenNotAssociatedToAccount)
    }
}

// --- Transfer logic -------------------------------------------------------------------------

/// Applies a batch of balance changes atomically (the staged frame makes it so).
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferLogic;

impl TransferLogic {
    /// Validates and applies every change; per-token fungible sums and the hbar sum must be
    /// zero.
    ///
    /// `payer` is the account whose allowances are consumed by approval-authorized debits.
    pub fn do_zero_sum(
        &self,
        payer: AccountId,
        changes: &[BalanceChange],
        ledgers: &mut WorldLedgers,
        effects: &mut SideEffectsTracker,
    ) -> LogicResult {
        self.assert_zero_sum(changes)?;
        for change in changes {
            match *change {
                BalanceChange::Hbar { account, units, is_approval } => {
                    self.apply_hbar(payer, account, units, is_approval, ledgers, effects)?;
                }
                BalanceChange::Fungible { token, account, units, is_approval } => {
                    self.apply_fungible(payer, token, account, units, is_approval, ledgers, effects)?;
                }
                BalanceChange::Nft { token, serial, sender, receiver, is_approval } => {
                    self.apply_nft(payer, token, serial, sender, receiver, is_approval, ledgers, effects)?;
                }
            }
        }
        Ok(())
    }

    fn assert_zero_sum(&self, changes: &[BalanceChange]) -> LogicResult {
        use std::collections::BTreeMap;
        let mut hbar_net = 0i64;
        let mut token_nets: BTreeMap<TokenId, i64> = BTreeMap::new();
        for change in changes {
            match change {
                BalanceChange::Hbar { units, .. } => hbar_net += units,
                BalanceChange::Fungible { token, units, .. } => {
                    *token_nets.entry(*token).or_default() += units;
                }
                BalanceChange::Nft { .. } => {}
            }
        }
        if hbar_net != 0 || token_nets.values().any(|net| *net != 0) {
            return Err(ResponseCode::InvalidAccountAmounts);
        }
        Ok(())
    }

    fn apply_hbar(
        &self,
        payer: AccountId,
        account: AccountId,
        units: i64,
        is_approval: bool,
        ledgers: &mut WorldLedgers,
        effects: &mut SideEffectsTracker,
    ) -> LogicResult {
        let current = ledgers.accounts().get(&account).ok_or(ResponseCode::InvalidAccountId)?;
        if units < 0 {
            if current.balance + units < 0 {
                return Err(ResponseCode::InsufficientPayerBalance);
            }
            if is_approval {
                let allowance = current.hbar_allowances.get(&payer).copied().unwrap_or(0);
                if allowance + units < 0 {
                    return Err(ResponseCode::AmountExceedsAllowance);
                }
                ledgers.accounts_mut().update(&account, |a| {
                    let entry = a.hbar_allowances.entry(payer).or_insert(0);
                    *entry += units;
                    if *entry == 0 {
                        a.hbar_allowances.remove(&payer);
                    }
                });
            }
        }
        ledgers.accounts_mut().update(&account, |a| a.balance += units);
        effects.track(SideEffect::HbarAdjust { account, amount: units });
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_fungible(
        &self,
        payer: AccountId,
        token: TokenId,
        account: AccountId,
        units: i64,
        is_approval: bool,
        ledgers: &mut WorldLedgers,
        effects: &mut SideEffectsTracker,
    ) -> LogicResult {
        let token_entity = usable_token(ledgers, token)?;
        let rel = usable_rel(ledgers, &token_entity, account, token)?;
        if units < 0 {
            if rel.balance + units < 0 {
                return Err(ResponseCode::InsufficientTokenBalance);
            }
            if is_approval {
                let allowance = ledgers.allowance_of(account, token, payer);
                if allowance + units < 0 {
                    return Err(ResponseCode::AmountExceedsAllowance);
                }
                ledgers.accounts_mut().update(&account, |a| {
                    let entry = a.fungible_allowances.entry((token, payer)).or_insert(0);
                    *entry += units;
                    if *entry == 0 {
                        a.fungible_allowances.remove(&(token, payer));
                    }
                });
            }
        }
        adjust_rel_balance(ledgers, account, token, units)?;
        effects.track(SideEffect::TokenUnitsAdjust { token, account, amount: units });
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_nft(
        &self,
        payer: AccountId,
        token: TokenId,
        serial: i64,
        sender: AccountId,
        receiver: AccountId,
        is_approval: bool,
        ledgers: &mut WorldLedgers,
        effects: &mut SideEffectsTracker,
    ) -> LogicResult {
        let token_entity = usable_token(ledgers, token)?;
        usable_rel(ledgers, &token_entity, sender, token)?;
        usable_rel(ledgers, &token_entity, receiver, token)?;

        let nft_id = NftId::new(token, serial);
        let nft = ledgers.nfts().get(&nft_id).ok_or(ResponseCode::InvalidNftId)?.clone();
        let owner = if nft.owner.is_missing() { token_entity.treasury } else { nft.owner };
        if owner != sender {
            return Err(ResponseCode::SenderDoesNotOwnNftSerialNo);
        }
        if is_approval {
            let serial_approved = nft.spender == Some(payer);
            let operator_approved = ledgers.is_approved_for_all(owner, token, payer);
            if !serial_approved && !operator_approved {
                return Err(ResponseCode::SpenderDoesNotHaveAllowance);
            }
        }

        ledgers
            .nfts_mut()
            .put(nft_id, Nft { owner: receiver, spender: None, ..nft });
        adjust_rel_balance(ledgers, sender, token, -1)?;
        adjust_rel_balance(ledgers, receiver, token, 1)?;
        effects.track(SideEffect::NftOwnerChange { nft: nft_id, from: sender, to: receiver });
        Ok(())
    }
}

// --- Supply logic ---------------------------------------------------------------------------

/// Mint and burn.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupplyLogic;

impl SupplyLogic {
    /// Mints fungible units or new serials into the treasury.
    pub fn mint(
        &self,
        token: TokenId,
        amount: i64,
        metadata: &[alloy_primitives::Bytes],
        now: Timestamp,
        ledgers: &mut WorldLedgers,
        effects: &mut SideEffectsTracker,
    ) -> LogicResult {
        let entity = usable_token(ledgers, token)?;
        if entity.keys.supply.is_none() {
            return Err(ResponseCode::TokenHasNoSupplyKey);
        }
        if amount < 0 {
            return Err(ResponseCode::InvalidTokenMintAmount);
        }
        if amount > 0 {
            if entity.token_type != TokenType::FungibleCommon {
                return Err(ResponseCode::InvalidTokenMintAmount);
            }
            let new_total = self.grown_supply(&entity, amount)?;
            adjust_rel_balance(ledgers, entity.treasury, token, amount)?;
            ledgers.tokens_mut().update(&token, |t| t.total_supply = new_total);
            effects.track(SideEffect::TokenUnitsAdjust {
                token,
                account: entity.treasury,
                amount,
            });
            effects.track(SideEffect::SupplyChange { token, new_total_supply: new_total });
            return Ok(());
        }
        if metadata.is_empty() || entity.token_type != TokenType::NonFungibleUnique {
            return Err(ResponseCode::InvalidTokenMintAmount);
        }
        let count = metadata.len() as i64;
        let new_total = self.grown_supply(&entity, count)?;
        let first_serial = entity.next_serial.max(1);
        let mut serials = Vec::with_capacity(metadata.len());
        for (offset, data) in metadata.iter().enumerate() {
            let serial = first_serial + offset as i64;
            serials.push(serial);
            ledgers.nfts_mut().put(
                NftId::new(token, serial),
                Nft {
                    owner: AccountId::MISSING,
                    spender: None,
                    metadata: data.clone(),
                    creation_time: now,
                },
            );
        }
        adjust_rel_balance(ledgers, entity.treasury, token, count)?;
        ledgers.tokens_mut().update(&token, |t| {
            t.total_supply = new_total;
            t.next_serial = first_serial + count;
        });
        effects.track(SideEffect::NftMint { token, serials });
        effects.track(SideEffect::SupplyChange { token, new_total_supply: new_total });
        Ok(())
    }

    /// Burns fungible units or treasury-held serials.
    pub fn burn(
        &self,
        token: TokenId,
        amount: i64,
        serial_numbers: &[i64],
        ledgers: &mut WorldLedgers,
        effects: &mut SideEffectsTracker,
    ) -> LogicResult {
        let entity = usable_token(ledgers, token)?;
        if entity.keys.supply.is_none() {
            return Err(ResponseCode::TokenHasNoSupplyKey);
        }
        if amount < 0 {
            return Err(ResponseCode::InvalidTokenBurnAmount);
        }
        if amount > 0 {
            if entity.token_type != TokenType::FungibleCommon {
                return Err(ResponseCode::InvalidTokenBurnAmount);
            }
            let treasury_rel = rel_of(ledgers, entity.treasury, token)?;
            if treasury_rel.balance < amount {
                return Err(ResponseCode::InsufficientTokenBalance);
            }
            let new_total = entity.total_supply - amount;
            if new_total < 0 {
                return Err(ResponseCode::InvalidTokenBurnAmount);
            }
            adjust_rel_balance(ledgers, entity.treasury, token, -amount)?;
            ledgers.tokens_mut().update(&token, |t| t.total_supply = new_total);
            effects.track(SideEffect::TokenUnitsAdjust {
                token,
                account: entity.treasury,
                amount: -amount,
            });
            effects.track(SideEffect::SupplyChange { token, new_total_supply: new_total });
            return Ok(());
        }
        if serial_numbers.is_empty() || entity.token_type != TokenType::NonFungibleUnique {
            return Err(ResponseCode::InvalidTokenBurnAmount);
        }
        for serial in serial_numbers {
            let nft_id = NftId::new(token, *serial);
            let nft = ledgers.nfts().get(&nft_id).ok_or(ResponseCode::InvalidNftId)?;
            let owner = if nft.owner.is_missing() { entity.treasury } else { nft.owner };
            if owner != entity.treasury {
                return Err(ResponseCode::TreasuryMustOwnBurnedNft);
            }
            ledgers.nfts_mut().remove(nft_id);
        }
        let count = serial_numbers.len() as i64;
        let new_total = entity.total_supply - count;
        if new_total < 0 {
            return Err(ResponseCode::InvalidTokenBurnAmount);
        }
        adjust_rel_balance(ledgers, entity.treasury, token, -count)?;
        ledgers.tokens_mut().update(&token, |t| t.total_supply = new_total);
        effects.track(SideEffect::SupplyChange { token, new_total_supply: new_total });
        Ok(())
    }

    fn grown_supply(&self, entity: &Token, grow_by: i64) -> Result<i64, ResponseCode> {
        let new_total = entity
            .total_supply
            .checked_add(grow_by)
            .ok_or(ResponseCode::TokenMaxSupplyReached)?;
        if entity.supply_type_finite && new_total > entity.max_supply {
            return Err(ResponseCode::TokenMaxSupplyReached);
        }
        Ok(new_total)
    }
}

// --- Wipe logic -----------------------------------------------------------------------------

/// Wiping balances off a non-treasury account.
#[derive(Debug, Clone, Copy, Default)]
pub struct WipeLogic;

impl WipeLogic {
    /// Validates and applies a wipe.
    pub fn wipe(
        &self,
        op: &WipeWrapper,
        ledgers: &mut WorldLedgers,
        effects: &mut SideEffectsTracker,
    ) -> LogicResult {
        let entity = usable_token(ledgers, op.token)?;
        if entity.keys.wipe.is_none() {
            return Err(ResponseCode::TokenHasNoWipeKey);
        }
        if op.account == entity.treasury {
            return Err(ResponseCode::CannotWipeTokenTreasuryAccount);
        }
        let rel = rel_of(ledgers, op.account, op.token)?;
        if op.serial_numbers.is_empty() {
            if op.amount <= 0 || op.amount > rel.balance {
                return Err(ResponseCode::InvalidWipingAmount);
            }
            adjust_rel_balance(ledgers, op.account, op.token, -op.amount)?;
            let new_total = entity.total_supply - op.amount;
            ledgers.tokens_mut().update(&op.token, |t| t.total_supply = new_total);
            effects.track(SideEffect::TokenUnitsAdjust {
                token: op.token,
                account: op.account,
                amount: -op.amount,
            });
            effects.track(SideEffect::SupplyChange { token: op.token, new_total_supply: new_total });
            return Ok(());
        }
        for serial in &op.serial_numbers {
            let nft_id = NftId::new(op.token, *serial);
            let nft = ledgers.nfts().get(&nft_id).ok_or(ResponseCode::InvalidNftId)?;
            if nft.owner != op.account {
                return Err(ResponseCode::AccountDoesNotOwnWipedNft);
            }
            ledgers.nfts_mut().remove(nft_id);
        }
        let count = op.serial_numbers.len() as i64;
        adjust_rel_balance(ledgers, op.account, op.token, -count)?;
        let new_total = entity.total_supply - count;
        ledgers.tokens_mut().update(&op.token, |t| t.total_supply = new_total);
        effects.track(SideEffect::SupplyChange { token: op.token, new_total_supply: new_total });
        Ok(())
    }
}

// --- Association logic ----------------------------------------------------------------------

/// Creating token-account relationships.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssociateLogic;

impl AssociateLogic {
    /// Associates the account with each token in call order.
    pub fn associate(
        &self,
        op: &Association,
        ledgers: &mut WorldLedgers,
        effects: &mut SideEffectsTracker,
    ) -> LogicResult {
        if !ledgers.accounts().contains(&op.account) {
            return Err(ResponseCode::InvalidAccountId);
        }
        for token in &op.tokens {
            let entity = usable_token(ledgers, *token)?;
            if ledgers.token_rels().contains(&(op.account, *token)) {
                return Err(ResponseCode::TokenAlreadyAssociatedToAccount);
            }
            ledgers.token_rels_mut().put(
                (op.account, *token),
                TokenRelationship {
                    balance: 0,
                    frozen: entity.default_freeze_status && entity.keys.freeze.is_some(),
                    kyc_granted: entity.keys.kyc.is_none() || entity.default_kyc_status,
                },
            );
            effects.track(SideEffect::AutoAssociation { token: *token, account: op.account });
        }
        Ok(())
    }
}

/// Removing token-account relationships.
#[derive(Debug, Clone, Copy, Default)]
pub struct DissociateLogic;

impl DissociateLogic {
    /// Dissociates the account from each token in call order.
    pub fn dissociate(
        &self,
        op: &Dissociation,
        ledgers: &mut WorldLedgers,
        _effects: &mut SideEffectsTracker,
    ) -> LogicResult {
        if !ledgers.accounts().contains(&op.account) {
            return Err(ResponseCode::InvalidAccountId);
        }
        for token in &op.tokens {
            let rel = rel_of(ledgers, op.account, *token)?;
            if rel.balance != 0 {
                return Err(ResponseCode::TransactionRequiresZeroTokenBalances);
            }
            if let Some(entity) = ledgers.tokens().get(token) {
                if entity.treasury == op.account {
                    return Err(ResponseCode::AccountIsTreasury);
                }
            }
            ledgers.token_rels_mut().remove((op.account, *token));
        }
        Ok(())
    }
}

// --- Flag logic (freeze / KYC / pause) ------------------------------------------------------

/// Freeze, KYC and pause flag changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenFlagLogic;

impl TokenFlagLogic {
    /// Sets the frozen flag of a relationship.
    pub fn set_frozen(
        &self,
        token: TokenId,
        account: AccountId,
        frozen: bool,
        ledgers: &mut WorldLedgers,
    ) -> LogicResult {
        let entity = usable_token(ledgers, token)?;
        if entity.keys.freeze.is_none() {
            return Err(ResponseCode::TokenHasNoFreezeKey);
        }
        rel_of(ledgers, account, token)?;
        ledgers.token_rels_mut().update(&(account, token), |rel| rel.frozen = frozen);
        Ok(())
    }

    /// Sets the KYC flag of a relationship.
    pub fn set_kyc(
        &self,
        token: TokenId,
        account: AccountId,
        granted: bool,
        ledgers: &mut WorldLedgers,
    ) -> LogicResult {
        let entity = usable_token(ledgers, token)?;
        if entity.keys.kyc.is_none() {
            return Err(ResponseCode::TokenHasNoKycKey);
        }
        rel_of(ledgers, account, token)?;
        ledgers.token_rels_mut().update(&(account, token), |rel| rel.kyc_granted = granted);
        Ok(())
    }

    /// Pauses or unpauses a token.
    pub fn set_paused(
        &self,
        token: TokenId,
        paused: bool,
        ledgers: &mut WorldLedgers,
    ) -> LogicResult {
        let entity = ledgers.tokens().get(&token).ok_or(ResponseCode::InvalidTokenId)?;
        if entity.deleted {
            return Err(ResponseCode::TokenWasDeleted);
        }
        if entity.keys.pause.is_none() {
            return Err(ResponseCode::TokenHasNoPauseKey);
        }
        ledgers.tokens_mut().update(&token, |t| t.paused = paused);
        Ok(())
    }
}

// --- Admin logic (delete / update) ----------------------------------------------------------

/// Admin-keyed token mutations.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenAdminLogic;

impl TokenAdminLogic {
    /// Marks a token deleted.
    pub fn delete(&self, token: TokenId, ledgers: &mut WorldLedgers) -> LogicResult {
        let entity = ledgers.tokens().get(&token).ok_or(ResponseCode::InvalidTokenId)?;
        if entity.deleted {
            return Err(ResponseCode::TokenWasDeleted);
        }
        if entity.keys.admin.is_none() {
            return Err(ResponseCode::TokenIsImmutable);
        }
        ledgers.tokens_mut().update(&token, |t| t.deleted = true);
        Ok(())
    }

    /// Applies a metadata/keys/expiry update; empty fields leave the stored value unchanged.
    pub fn update(&self, op: &TokenUpdateWrapper, ledgers: &mut WorldLedgers) -> LogicResult {
        let entity = usable_token(ledgers, op.token)?;
        if entity.keys.admin.is_none() {
            return Err(ResponseCode::TokenIsImmutable);
        }
        if let Some(treasury) = op.treasury {
            rel_of(ledgers, treasury, op.token)?;
        }
        ledgers.tokens_mut().update(&op.token, |t| {
            if !op.name.is_empty() {
                t.name = op.name.clone();
            }
            if !op.symbol.is_empty() {
                t.symbol = op.symbol.clone();
            }
            if !op.memo.is_empty() {
                t.memo = op.memo.clone();
            }
            if let Some(treasury) = op.treasury {
                t.treasury = treasury;
            }
            apply_present_keys(t, op);
            if op.expiry.second > 0 {
                t.expiry.second = op.expiry.second;
            }
            if op.expiry.auto_renew_account.is_some() {
                t.expiry.auto_renew_account = op.expiry.auto_renew_account;
            }
            if op.expiry.auto_renew_period > 0 {
                t.expiry.auto_renew_period = op.expiry.auto_renew_period;
            }
        });
        Ok(())
    }

    /// Replaces keys for the roles named in the bit sets.
    pub fn update_keys(
        &self,
        op: &TokenUpdateKeysWrapper,
        ledgers: &mut WorldLedgers,
    ) -> LogicResult {
        let entity = usable_token(ledgers, op.token)?;
        if entity.keys.admin.is_none() {
            return Err(ResponseCode::TokenIsImmutable);
        }
        ledgers.tokens_mut().update(&op.token, |t| {
            for (bits, key) in &op.keys {
                if bits.contains(TokenKeyType::ADMIN) {
                    t.keys.admin = Some(key.clone());
                }
                if bits.contains(TokenKeyType::KYC) {
                    t.keys.kyc = Some(key.clone());
                }
                if bits.contains(TokenKeyType::FREEZE) {
                    t.keys.freeze = Some(key.clone());
                }
                if bits.contains(TokenKeyType::WIPE) {
                    t.keys.wipe = Some(key.clone());
                }
                if bits.contains(TokenKeyType::SUPPLY) {
                    t.keys.supply = Some(key.clone());
                }
                if bits.contains(TokenKeyType::FEE_SCHEDULE) {
                    t.keys.fee_schedule = Some(key.clone());
                }
                if bits.contains(TokenKeyType::PAUSE) {
                    t.keys.pause = Some(key.clone());
                }
            }
        });
        Ok(())
    }

    /// Updates expiry metadata only.
    pub fn update_expiry(&self, op: &TokenExpiryWrapper, ledgers: &mut WorldLedgers) -> LogicResult {
        let entity = usable_token(ledgers, op.token)?;
        if entity.keys.admin.is_none() {
            return Err(ResponseCode::TokenIsImmutable);
        }
        ledgers.tokens_mut().update(&op.token, |t| {
            if op.expiry.second > 0 {
                t.expiry.second = op.expiry.second;
            }
            if op.expiry.auto_renew_account.is_some() {
                t.expiry.auto_renew_account = op.expiry.auto_renew_account;
            }
            if op.expiry.auto_renew_period > 0 {
                t.expiry.auto_renew_period = op.expiry.auto_renew_period;
            }
        });
        Ok(())
    }
}

fn apply_present_keys(token: &mut Token, op: &TokenUpdateWrapper) {
    if op.keys.admin.is_some() {
        token.keys.admin = op.keys.admin.clone();
    }
    if op.keys.kyc.is_some() {
        token.keys.kyc = op.keys.kyc.clone();
    }
    if op.keys.freeze.is_some() {
        token.keys.freeze = op.keys.freeze.clone();
    }
    if op.keys.wipe.is_some() {
        token.keys.wipe = op.keys.wipe.clone();
    }
    if op.keys.supply.is_some() {
        token.keys.supply = op.keys.supply.clone();
    }
    if op.keys.fee_schedule.is_some() {
        token.keys.fee_schedule = op.keys.fee_schedule.clone();
    }
    if op.keys.pause.is_some() {
        token.keys.pause = op.keys.pause.clone();
    }
}

// --- Approval logic -------------------------------------------------------------------------

/// Allowance and operator approvals.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproveLogic;

impl ApproveLogic {
    /// Grants, adjusts or clears an allowance.
    pub fn approve(
        &self,
        owner: AccountId,
        op: &ApproveWrapper,
        ledgers: &mut WorldLedgers,
    ) -> LogicResult {
        usable_token(ledgers, op.token)?;
        if !ledgers.accounts().contains(&owner) {
            return Err(ResponseCode::InvalidAllowanceOwnerId);
        }
        if let Some(amount) = op.amount {
            if amount < 0 {
                return Err(ResponseCode::NegativeAllowanceAmount);
            }
            let token = op.token;
            let spender = op.spender;
            ledgers.accounts_mut().update(&owner, |a| {
                if amount == 0 {
                    a.fungible_allowances.remove(&(token, spender));
                } else {
                    a.fungible_allowances.insert((token, spender), amount);
                }
            });
            return Ok(());
        }
        let serial = op.serial_number.ok_or(ResponseCode::FailInvalid)?;
        let nft_id = NftId::new(op.token, serial);
        let owner_of_record =
            ledgers.owner_of(nft_id).ok_or(ResponseCode::InvalidTokenNftSerialNumber)?;
        if owner_of_record != owner {
            return Err(ResponseCode::InvalidAllowanceOwnerId);
        }
        let spender = if op.spender.is_missing() { None } else { Some(op.spender) };
        ledgers.nfts_mut().update(&nft_id, |nft| nft.spender = spender);
        Ok(())
    }

    /// Grants or revokes an operator approval for all serials.
    pub fn set_approval_for_all(
        &self,
        owner: AccountId,
        op: &SetApprovalForAllWrapper,
        ledgers: &mut WorldLedgers,
    ) -> LogicResult {
        usable_token(ledgers, op.token)?;
        if !ledgers.accounts().contains(&owner) {
            return Err(ResponseCode::InvalidAllowanceOwnerId);
        }
        let key = (op.token, op.operator);
        let approved = op.approved;
        ledgers.accounts_mut().update(&owner, |a| {
            if approved {
                a.approved_for_all.insert(key);
            } else {
                a.approved_for_all.remove(&key);
            }
        });
        Ok(())
    }
}

// --- Create logic ---------------------------------------------------------------------------

/// Creation of new token types.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateLogic;

impl CreateLogic {
    /// Creates the token, its treasury relationship and the initial supply; returns the id
    /// assigned to the new token.
    pub fn create(
        &self,
        body: &TokenCreateBody,
        ledgers: &mut WorldLedgers,
        effects: &mut SideEffectsTracker,
    ) -> Result<TokenId, ResponseCode> {
        if !ledgers.accounts().contains(&body.treasury) {
            return Err(ResponseCode::InvalidTreasuryAccountForToken);
        }
        if body.initial_supply < 0 {
            return Err(ResponseCode::InvalidTokenMintAmount);
        }
        let token = self.next_token_id(ledgers);
        ledgers.tokens_mut().put(
            token,
            Token {
                token_type: body.token_type,
                name: body.name.clone(),
                symbol: body.symbol.clone(),
                memo: body.memo.clone(),
                decimals: body.decimals,
                total_supply: body.initial_supply,
                max_supply: body.max_supply,
                supply_type_finite: body.supply_type_finite,
                treasury: body.treasury,
                keys: body.keys.clone(),
                expiry: body.expiry,
                default_freeze_status: body.freeze_default,
                default_kyc_status: false,
                deleted: false,
                paused: false,
                custom_fees: body.custom_fees.clone(),
                next_serial: 1,
            },
        );
        ledgers.token_rels_mut().put(
            (body.treasury, token),
            TokenRelationship { balance: body.initial_supply, frozen: false, kyc_granted: true },
        );
        effects.track(SideEffect::TokenCreation { token });
        if body.initial_supply > 0 {
            effects.track(SideEffect::SupplyChange {
                token,
                new_total_supply: body.initial_supply,
            });
        }
        Ok(token)
    }

    /// Allocates the next entity number past every visible account and token.
    ///
    /// Derived from the effective table view rather than a counter so a rolled-back create
    /// leaves no gap.
    fn next_token_id(&self, ledgers: &WorldLedgers) -> TokenId {
        let max_token = ledgers.tokens().iter_effective().map(|(id, _)| id.0).max().unwrap_or(0);
        let max_account =
            ledgers.accounts().iter_effective().map(|(id, _)| id.0).max().unwrap_or(0);
        TokenId(max_token.max(max_account).max(1000) + 1)
    }
}

// --- The factory ----------------------------------------------------------------------------

/// Constructs the stateless logic collaborators for one call.
///
/// A dependency-injection boundary, not business logic: the execution engine asks the factory
/// for collaborators instead of constructing them inline, and tests substitute the factory to
/// observe or stub logic invocations.
#[derive(Debug, Clone, Copy, Default)]
pub struct InfrastructureFactory;

impl InfrastructureFactory {
    /// Creates a factory.
    pub fn new() -> Self {
        Self
    }

    /// A fresh side-effect tracker.
    pub fn new_side_effects(&self) -> SideEffectsTracker {
        SideEffectsTracker::new()
    }

    /// Transfer logic.
    pub fn new_transfer_logic(&self) -> TransferLogic {
        TransferLogic
    }

    /// Mint/burn logic.
    pub fn new_supply_logic(&self) -> SupplyLogic {
        SupplyLogic
    }

    /// Wipe logic.
    pub fn new_wipe_logic(&self) -> WipeLogic {
        WipeLogic
    }

    /// Associate logic.
    pub fn new_associate_logic(&self) -> AssociateLogic {
        AssociateLogic
    }

    /// Dissociate logic.
    pub fn new_dissociate_logic(&self) -> DissociateLogic {
        DissociateLogic
    }

    /// Freeze/KYC/pause logic.
    pub fn new_flag_logic(&self) -> TokenFlagLogic {
        TokenFlagLogic
    }

    /// Delete/update logic.
    pub fn new_admin_logic(&self) -> TokenAdminLogic {
        TokenAdminLogic
    }

    /// Allowance logic.
    pub fn new_approve_logic(&self) -> ApproveLogic {
        ApproveLogic
    }

    /// Token create logic.
    pub fn new_create_logic(&self) -> CreateLogic {
        CreateLogic
    }
}
