//! The signature-authorization gate.
//!
//! Cryptographic verification lives outside the engine: a [`SigsVerifier`] answers whether the
//! key serving a given role is active for the current call, given the calling frame's
//! (sender, recipient) address pair and the ledger facade. A `false` answer is an ordinary,
//! recoverable outcome that the execution engine turns into a status-coded result, never a
//! fault.

use alloy_primitives::Address;

use crate::{
    ledger::WorldLedgers,
    types::{AccountId, TokenId},
};

/// The key roles an operation can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyRole {
    /// Update and delete authority.
    Admin,
    /// Mint and burn authority.
    Supply,
    /// Wipe authority.
    Wipe,
    /// Freeze and unfreeze authority.
    Freeze,
    /// KYC grant and revoke authority.
    Kyc,
    /// Pause and unpause authority.
    Pause,
    /// Fee schedule update authority.
    FeeSchedule,
}

/// External oracle for key activity.
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait SigsVerifier {
    /// Whether the key serving `role` on `token` is active for the calling context.
    fn has_active_token_key(
        &self,
        role: KeyRole,
        token: TokenId,
        sender: Address,
        recipient: Address,
        ledgers: &WorldLedgers,
    ) -> bool;

    /// Whether `account`'s own key is active for the calling context.
    fn has_active_account_key(
        &self,
        account: AccountId,
        sender: Address,
        recipient: Address,
        ledgers: &WorldLedgers,
    ) -> bool;

    /// Whether `account` has signed, or does not require a receiver signature at all.
    fn has_active_key_or_no_receiver_sig_req(
        &self,
        account: AccountId,
        sender: Address,
        recipient: Address,
        ledgers: &WorldLedgers,
    ) -> bool {
        let requires = ledgers.accounts().get(&account).is_some_and(|a| a.receiver_sig_required);
        !requires || self.has_active_account_key(account, sender, recipient, ledgers)
    }
}

/// Validates an account key with the `msg.sender` shortcut: a call coming from the account's own
/// address needs no signature.
pub fn validate_account_key<S: SigsVerifier + ?Sized>(
    verifier: &S,
    account: AccountId,
    sender: Address,
    recipient: Address,
    ledgers: &WorldLedgers,
) -> bool {
    account.to_evm_address() == sender
        || verifier.has_active_account_key(account, sender, recipient, ledgers)
}

/// Validates a receiver-signature requirement with the `msg.sender` shortcut.
pub fn validate_receiver_sig<S: SigsVerifier + ?Sized>(
    verifier: &S,
    account: AccountId,
    sender: Address,
    recipient: Address,
    ledgers: &WorldLedgers,
) -> bool {
    account.to_evm_address() == sender
        || verifier.has_active_key_or_no_receiver_sig_req(account, sender, recipient, ledgers)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Denies everything; only the `msg.sender` shortcut can authorize.
    #[derive(Debug)]
    struct DenyAll;

    impl SigsVerifier for DenyAll {
        fn has_active_token_key(
            &self,
            _role: KeyRole,
            _token: TokenId,
            _sender: Address,
            _recipient: Address,
            _ledgers: &WorldLedgers,
        ) -> bool {
            false
        }

        fn has_active_account_key(
            &self,
            _account: AccountId,
            _sender: Address,
            _recipient: Address,
            _ledgers: &WorldLedgers,
        ) -> bool {
            false
        }
    }

    #[test]
    fn msg_sender_shortcut_authorizes_own_account() {
        let ledgers = WorldLedgers::new();
        let account = AccountId(42);
        assert!(validate_account_key(
            &DenyAll,
            account,
            account.to_evm_address(),
            Address::ZERO,
            &ledgers,
        ));
        assert!(!validate_account_key(
            &DenyAll,
            account,
            AccountId(43).to_evm_address(),
            Address::ZERO,
            &ledgers,
        ));
    }

    #[test]
    fn receiver_sig_not_required_passes_by_default() {
        use crate::ledger::Account;
        let mut ledgers = WorldLedgers::new();
        ledgers.begin();
        ledgers.accounts_mut().put(AccountId(7), Account::default());
        ledgers
            .accounts_mut()
            .put(AccountId(8), Account { receiver_sig_required: true, ..Default::default() });
        ledgers.commit();

        let sender = AccountId(1).to_evm_address();
        assert!(validate_receiver_sig(&DenyAll, AccountId(7), sender, Address::ZERO, &ledgers));
        assert!(!validate_receiver_sig(&DenyAll, AccountId(8), sender, Address::ZERO, &ledgers));
    }
}
