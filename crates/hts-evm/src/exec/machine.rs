//! The transactional execution engine for system-contract calls.
//!
//! One call runs the fixed sequence *prepare → dispatch/decode → price → authorize → apply →
//! commit-or-rollback → encode*. Every transition is synchronous and deterministic given its
//! inputs; replicas executing the same call against the same world reach the same encoded
//! result. The staged ledger frame pushed at entry is either committed whole (into the parent
//! frame, or the committed store at top level) or dropped whole; no partial state survives a
//! failure.

use alloy_primitives::Bytes;

use super::{
    dispatch::{self, PrepareFailure, ResultShape},
    frame::MessageFrame,
    logic::{balance_changes_of, BalanceChange, InfrastructureFactory},
    view::ViewExecutor,
};
use crate::{
    codec::{encoding, HtsCall},
    config::EngineProperties,
    ledger::{SideEffect, SideEffectsTracker},
    pricing::{CanonicalPrices, PricingUtils, RateSource},
    records::{RecordSink, TxnRecord},
    sigs::{self, KeyRole, SigsVerifier},
    status::ResponseCode,
    synth::{CryptoApproveAllowanceBody, SyntheticTxnFactory, TransactionBody},
    types::TokenId,
};

/// Revert reason for state-changing calls attempted inside a static frame.
const STATIC_CALL_REVERT_REASON: &[u8] = b"HTS precompiles are not static";
/// Revert reason for payloads whose selector matched but whose body did not decode.
const ERROR_DECODING_INPUT_REVERT_REASON: &[u8] = b"Error decoding precompile input";
/// Revert reason for calls that could not be priced.
const FEE_SCHEDULE_UNAVAILABLE_REVERT_REASON: &[u8] = b"Fee schedule unavailable";

/// The outcome of one system-contract invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    /// Gas the call requires from the frame.
    pub gas_requirement: u64,
    /// Encoded output: empty bytes for unrecognized calls, a status word or query tuple
    /// otherwise. `None` means the call halts with no output (revert signalled on the frame).
    pub output: Option<Bytes>,
}

impl CallOutcome {
    fn new(gas_requirement: u64, output: Bytes) -> Self {
        Self { gas_requirement, output: Some(output) }
    }

    const fn halted(gas_requirement: u64) -> Self {
        Self { gas_requirement, output: None }
    }
}

/// The token service system contract.
///
/// Generic over its external collaborators: the signature oracle, the canonical price and rate
/// providers, and the record sink.
#[derive(Debug)]
pub struct HtsPrecompiled<V, P, R, S> {
    sigs: V,
    pricing: PricingUtils<P, R>,
    records: S,
    props: EngineProperties,
    synth: SyntheticTxnFactory,
    infra: InfrastructureFactory,
    views: ViewExecutor,
}

impl<V, P, R, S> HtsPrecompiled<V, P, R, S>
where
    V: SigsVerifier,
    P: CanonicalPrices,
    R: RateSource,
    S: RecordSink,
{
    /// Creates the engine over its collaborators.
    pub fn new(sigs: V, pricing: PricingUtils<P, R>, records: S, props: EngineProperties) -> Self {
        Self {
            sigs,
            pricing,
            records,
            props,
            synth: SyntheticTxnFactory::new(),
            infra: InfrastructureFactory::new(),
            views: ViewExecutor::new(),
        }
    }

    /// The record sink, for inspection.
    pub fn records(&self) -> &S {
        &self.records
    }

    /// Computes one call: decodes, prices, authorizes, applies and commits (or rolls back), and
    /// returns the gas requirement along with the encoded result.
    pub fn compute_costed(&mut self, input: &[u8], frame: &mut MessageFrame<'_>) -> CallOutcome {
        if frame.is_static
            && !crate::abi::is_token_proxy_redirect(input)
            && !crate::abi::is_view_function(input)
        {
            frame.set_revert(STATIC_CALL_REVERT_REASON);
            return CallOutcome::halted(self.props.default_gas_cost);
        }

        // FieldsPrepared: a fresh staging frame and a clean side-effect log.
        frame.ledgers.begin();
        let mut effects = self.infra.new_side_effects();
        effects.reset();
        let caller = frame.sender_account();

        // ComputationPrepared → Decoded.
        let (call, shape) =
            match dispatch::prepare_computation(input, caller, frame.ledgers, &self.props) {
                Ok(prepared) => prepared,
                Err(PrepareFailure::Unrecognized) => {
                    frame.ledgers.revert();
                    return CallOutcome::new(self.props.default_gas_cost, Bytes::new());
                }
                Err(PrepareFailure::Decode(err)) => {
                    tracing::warn!(target: "hts_evm", %err, "precompile input failed to decode");
                    frame.ledgers.revert();
                    frame.set_revert(ERROR_DECODING_INPUT_REVERT_REASON);
                    return CallOutcome::halted(self.props.default_gas_cost);
                }
                Err(PrepareFailure::Status(code)) => {
                    frame.ledgers.revert();
                    let result = encoding::encode_status(code);
                    self.track_record(None, code, Vec::new(), self.props.default_gas_cost, &result);
                    return CallOutcome::new(self.props.default_gas_cost, result);
                }
            };

        // A redirect passes the early static gate on its outer selector alone; the nested call
        // may still be state-changing.
        if frame.is_static && !dispatch::is_view(&call) {
            frame.ledgers.revert();
            frame.set_revert(STATIC_CALL_REVERT_REASON);
            return CallOutcome::halted(self.props.default_gas_cost);
        }

        let body = self.body_of(&call);

        // Priced. A pricing failure is fatal: abort with no mutation.
        let priced = if dispatch::is_view(&call) {
            self.pricing.view_gas_requirement(frame.timestamp)
        } else {
            self.pricing.gas_requirement(&body, frame.timestamp)
        };
        let gas_requirement = match priced {
            Ok(gas) => gas,
            Err(err) => {
                tracing::warn!(target: "hts_evm", %err, "call could not be priced");
                frame.ledgers.revert();
                frame.set_revert(FEE_SCHEDULE_UNAVAILABLE_REVERT_REASON);
                return CallOutcome::halted(self.props.default_gas_cost);
            }
        };
        if frame.remaining_gas < gas_requirement {
            return self.fail(frame, &mut effects, shape, Some(body), gas_requirement, ResponseCode::InsufficientGas);
        }
        if frame.value > 0 && !matches!(call, HtsCall::Create(_)) {
            return self.fail(frame, &mut effects, shape, Some(body), gas_requirement, ResponseCode::InvalidFeeSubmitted);
        }

        // Read path: never stages, still records.
        if let HtsCall::View(op) = &call {
            let outcome = self.views.execute(op, frame.ledgers);
            frame.ledgers.revert();
            return match outcome {
                Ok(result) => {
                    self.track_record(
                        Some(TransactionBody::ViewCall),
                        ResponseCode::Success,
                        Vec::new(),
                        gas_requirement,
                        &result,
                    );
                    CallOutcome::new(gas_requirement, result)
                }
                Err(code) => {
                    let result = encoding::encode_status(code);
                    self.track_record(
                        Some(TransactionBody::ViewCall),
                        code,
                        Vec::new(),
                        gas_requirement,
                        &result,
                    );
                    CallOutcome::new(gas_requirement, result)
                }
            };
        }

        // Authorized.
        if let Err(code) = self.authorize(&call, &body, frame) {
            return self.fail(frame, &mut effects, shape, Some(body), gas_requirement, code);
        }

        // LogicApplied.
        if let Err(code) = self.apply(&call, &body, caller, frame, &mut effects) {
            return self.fail(frame, &mut effects, shape, Some(body), gas_requirement, code);
        }

        // Staged → Committed → ResultEncoded.
        frame.ledgers.commit();
        let result = self.success_result(&call, shape, &effects);
        let side_effects = effects.drain();
        tracing::debug!(
            target: "hts_evm",
            gas = gas_requirement,
            effects = side_effects.len(),
            "call committed"
        );
        self.track_record(
            Some(body),
            ResponseCode::Success,
            side_effects,
            gas_requirement,
            &result,
        );
        CallOutcome::new(gas_requirement, result)
    }

    fn fail(
        &mut self,
        frame: &mut MessageFrame<'_>,
        effects: &mut SideEffectsTracker,
        shape: ResultShape,
        body: Option<TransactionBody>,
        gas_requirement: u64,
        code: ResponseCode,
    ) -> CallOutcome {
        frame.ledgers.revert();
        effects.reset();
        tracing::debug!(target: "hts_evm", status = %code, "call rolled back");
        let result = failure_result(shape, code);
        self.track_record(body, code, Vec::new(), gas_requirement, &result);
        CallOutcome::new(gas_requirement, result)
    }

    fn track_record(
        &mut self,
        body: Option<TransactionBody>,
        status: ResponseCode,
        side_effects: Vec<SideEffect>,
        gas_requirement: u64,
        result: &Bytes,
    ) {
        let result = self.props.export_record_results.then(|| result.clone());
        self.records.track(TxnRecord { body, status, side_effects, gas_requirement, result });
    }

    /// Builds the canonical transaction for the decoded call.
    fn body_of(&self, call: &HtsCall) -> TransactionBody {
        match call {
            HtsCall::Transfer(op) => self.synth.create_full_transfer(op),
            HtsCall::Mint(op) => self.synth.create_mint(op),
            HtsCall::Burn(op) => self.synth.create_burn(op),
            HtsCall::Wipe(op) => self.synth.create_wipe(op),
            HtsCall::Associate(op) => self.synth.create_associate(op),
            HtsCall::Dissociate(op) => self.synth.create_dissociate(op),
            HtsCall::Freeze(op) => self.synth.create_freeze(op.token, op.account, true),
            HtsCall::Unfreeze(op) => self.synth.create_freeze(op.token, op.account, false),
            HtsCall::GrantKyc(op) => self.synth.create_kyc(op.token, op.account, true),
            HtsCall::RevokeKyc(op) => self.synth.create_kyc(op.token, op.account, false),
            HtsCall::Pause(op) => self.synth.create_pause(op.token, true),
            HtsCall::Unpause(op) => self.synth.create_pause(op.token, false),
            HtsCall::Delete(op) => self.synth.create_delete(op.token),
            HtsCall::Update(op) => TransactionBody::TokenUpdate(crate::synth::TokenUpdateBody {
                token: op.token,
                name: op.name.clone(),
                symbol: op.symbol.clone(),
                memo: op.memo.clone(),
                treasury: op.treasury,
                keys: op.keys.clone(),
                expiry: op.expiry,
            }),
            HtsCall::UpdateKeys(op) => {
                TransactionBody::TokenUpdateKeys(crate::synth::TokenUpdateKeysBody {
                    token: op.token,
                    keys: op.keys.iter().map(|(bits, key)| (bits.bits(), key.clone())).collect(),
                })
            }
            HtsCall::UpdateExpiry(op) => {
                TransactionBody::TokenUpdateExpiry { token: op.token, expiry: op.expiry }
            }
            HtsCall::Create(op) => self.synth.create_token_create(op),
            HtsCall::Approve { op, owner } => {
                TransactionBody::CryptoApproveAllowance(CryptoApproveAllowanceBody {
                    owner: *owner,
                    token: op.token,
                    spender: op.spender,
                    amount: op.amount,
                    serial_number: op.serial_number,
                    approved_for_all: None,
                })
            }
            HtsCall::SetApprovalForAll { op, owner } => {
                TransactionBody::CryptoApproveAllowance(CryptoApproveAllowanceBody {
                    owner: *owner,
                    token: op.token,
                    spender: op.operator,
                    amount: None,
                    serial_number: None,
                    approved_for_all: Some(op.approved),
                })
            }
            HtsCall::View(_) => TransactionBody::ViewCall,
        }
    }

    /// A token must carry the key serving `role` before the oracle is even consulted.
    fn require_token_key(
        &self,
        frame: &MessageFrame<'_>,
        token: TokenId,
        role: KeyRole,
    ) -> Result<(), ResponseCode> {
        let entity =
            frame.ledgers.tokens().get(&token).ok_or(ResponseCode::InvalidTokenId)?;
        let present = match role {
            KeyRole::Admin => entity.keys.admin.is_some(),
            KeyRole::Supply => entity.keys.supply.is_some(),
            KeyRole::Wipe => entity.keys.wipe.is_some(),
            KeyRole::Freeze => entity.keys.freeze.is_some(),
            KeyRole::Kyc => entity.keys.kyc.is_some(),
            KeyRole::Pause => entity.keys.pause.is_some(),
            KeyRole::FeeSchedule => entity.keys.fee_schedule.is_some(),
        };
        if !present {
            return Err(match role {
                KeyRole::Admin => ResponseCode::TokenIsImmutable,
                KeyRole::Supply => ResponseCode::TokenHasNoSupplyKey,
                KeyRole::Wipe => ResponseCode::TokenHasNoWipeKey,
                KeyRole::Freeze => ResponseCode::TokenHasNoFreezeKey,
                KeyRole::Kyc => ResponseCode::TokenHasNoKycKey,
                KeyRole::Pause => ResponseCode::TokenHasNoPauseKey,
                KeyRole::FeeSchedule => ResponseCode::TokenHasNoFeeScheduleKey,
            });
        }
        if self.sigs.has_active_token_key(
            role,
            token,
            frame.sender,
            frame.recipient,
            frame.ledgers,
        ) {
            Ok(())
        } else {
            Err(ResponseCode::InvalidFullPrefixSignatureForPrecompile)
        }
    }

    fn require_account_key(
        &self,
        frame: &MessageFrame<'_>,
        account: crate::types::AccountId,
    ) -> Result<(), ResponseCode> {
        if sigs::validate_account_key(
            &self.sigs,
            account,
            frame.sender,
            frame.recipient,
            frame.ledgers,
        ) {
            Ok(())
        } else {
            Err(ResponseCode::InvalidSignature)
        }
    }

    fn authorize(
        &self,
        call: &HtsCall,
        body: &TransactionBody,
        frame: &MessageFrame<'_>,
    ) -> Result<(), ResponseCode> {
        match call {
            HtsCall::Transfer(_) => {
                let TransactionBody::CryptoTransfer(transfer) = body else {
                    return Err(ResponseCode::FailInvalid);
                };
                self.authorize_transfer(&balance_changes_of(transfer), frame)
            }
            HtsCall::Mint(op) => self.require_token_key(frame, op.token, KeyRole::Supply),
            HtsCall::Burn(op) => self.require_token_key(frame, op.token, KeyRole::Supply),
            HtsCall::Wipe(op) => self.require_token_key(frame, op.token, KeyRole::Wipe),
            HtsCall::Freeze(op) | HtsCall::Unfreeze(op) => {
                self.require_token_key(frame, op.token, KeyRole::Freeze)
            }
            HtsCall::GrantKyc(op) | HtsCall::RevokeKyc(op) => {
                self.require_token_key(frame, op.token, KeyRole::Kyc)
            }
            HtsCall::Pause(op) | HtsCall::Unpause(op) => {
                self.require_token_key(frame, op.token, KeyRole::Pause)
            }
            HtsCall::Delete(op) => self.require_token_key(frame, op.token, KeyRole::Admin),
            HtsCall::Update(op) => self.require_token_key(frame, op.token, KeyRole::Admin),
            HtsCall::UpdateKeys(op) => self.require_token_key(frame, op.token, KeyRole::Admin),
            HtsCall::UpdateExpiry(op) => self.require_token_key(frame, op.token, KeyRole::Admin),
            HtsCall::Associate(op) => self.require_account_key(frame, op.account),
            HtsCall::Dissociate(op) => self.require_account_key(frame, op.account),
            HtsCall::Approve { owner, .. } | HtsCall::SetApprovalForAll { owner, .. } => {
                self.require_account_key(frame, *owner)
            }
            // Treasury authorization for creates is carried by the enclosing transaction.
            HtsCall::Create(_) => Ok(()),
            HtsCall::View(_) => Ok(()),
        }
    }

    /// Per-change signature checks: debits and NFT exchanges need the debited party's key unless
    /// approval-authorized; credits and NFT receivers must satisfy receiver-signature
    /// requirements.
    fn authorize_transfer(
        &self,
        changes: &[BalanceChange],
        frame: &MessageFrame<'_>,
    ) -> Result<(), ResponseCode> {
        for change in changes {
            match *change {
                BalanceChange::Hbar { account, units, .. }
                | BalanceChange::Fungible { account, units, .. } => {
                    if units < 0 {
                        if change.is_approval() {
                            continue;
                        }
                        if !sigs::validate_account_key(
                            &self.sigs,
                            account,
                            frame.sender,
                            frame.recipient,
                            frame.ledgers,
                        ) {
                            return Err(ResponseCode::InvalidFullPrefixSignatureForPrecompile);
                        }
                    } else if !sigs::validate_receiver_sig(
                        &self.sigs,
                        account,
                        frame.sender,
                        frame.recipient,
                        frame.ledgers,
                    ) {
                        return Err(ResponseCode::InvalidFullPrefixSignatureForPrecompile);
                    }
                }
                BalanceChange::Nft { sender, receiver, is_approval, .. } => {
                    if !is_approval
                        && !sigs::validate_account_key(
                            &self.sigs,
                            sender,
                            frame.sender,
                            frame.recipient,
                            frame.ledgers,
                        )
                    {
                        return Err(ResponseCode::InvalidFullPrefixSignatureForPrecompile);
                    }
                    if !sigs::validate_receiver_sig(
                        &self.sigs,
                        receiver,
                        frame.sender,
                        frame.recipient,
                        frame.ledgers,
                    ) {
                        return Err(ResponseCode::InvalidFullPrefixSignatureForPrecompile);
                    }
                }
            }
        }
        Ok(())
    }

    fn apply(
        &self,
        call: &HtsCall,
        body: &TransactionBody,
        caller: crate::types::AccountId,
        frame: &mut MessageFrame<'_>,
        effects: &mut SideEffectsTracker,
    ) -> Result<(), ResponseCode> {
        let ledgers = &mut *frame.ledgers;
        match call {
            HtsCall::Transfer(_) => {
                let TransactionBody::CryptoTransfer(transfer) = body else {
                    return Err(ResponseCode::FailInvalid);
                };
                let changes = balance_changes_of(transfer);
                self.infra.new_transfer_logic().do_zero_sum(caller, &changes, ledgers, effects)
            }
            HtsCall::Mint(op) => self.infra.new_supply_logic().mint(
                op.token,
                op.amount,
                &op.metadata,
                frame.timestamp,
                ledgers,
                effects,
            ),
            HtsCall::Burn(op) => self.infra.new_supply_logic().burn(
                op.token,
                op.amount,
                &op.serial_numbers,
                ledgers,
                effects,
            ),
            HtsCall::Wipe(op) => self.infra.new_wipe_logic().wipe(op, ledgers, effects),
            HtsCall::Associate(op) => {
                self.infra.new_associate_logic().associate(op, ledgers, effects)
            }
            HtsCall::Dissociate(op) => {
                self.infra.new_dissociate_logic().dissociate(op, ledgers, effects)
            }
            HtsCall::Freeze(op) => {
                self.infra.new_flag_logic().set_frozen(op.token, op.account, true, ledgers)
            }
            HtsCall::Unfreeze(op) => {
                self.infra.new_flag_logic().set_frozen(op.token, op.account, false, ledgers)
            }
            HtsCall::GrantKyc(op) => {
                self.infra.new_flag_logic().set_kyc(op.token, op.account, true, ledgers)
            }
            HtsCall::RevokeKyc(op) => {
                self.infra.new_flag_logic().set_kyc(op.token, op.account, false, ledgers)
            }
            HtsCall::Pause(op) => self.infra.new_flag_logic().set_paused(op.token, true, ledgers),
            HtsCall::Unpause(op) => {
                self.infra.new_flag_logic().set_paused(op.token, false, ledgers)
            }
            HtsCall::Delete(op) => self.infra.new_admin_logic().delete(op.token, ledgers),
            HtsCall::Update(op) => self.infra.new_admin_logic().update(op, ledgers),
            HtsCall::UpdateKeys(op) => self.infra.new_admin_logic().update_keys(op, ledgers),
            HtsCall::UpdateExpiry(op) => self.infra.new_admin_logic().update_expiry(op, ledgers),
            HtsCall::Create(_) => {
                let TransactionBody::TokenCreate(create) = body else {
                    return Err(ResponseCode::FailInvalid);
                };
                self.infra.new_create_logic().create(create, ledgers, effects)?;
                // Sent value funds node rewards, mirroring the network-level create fee flow.
                let value = frame.value;
                let funding = self.props.funding_account;
                if value > 0 && ledgers.accounts_mut().update(&funding, |a| a.balance += value) {
                    effects.track(SideEffect::HbarAdjust { account: funding, amount: value });
                }
                Ok(())
            }
            HtsCall::Approve { op, owner } => {
                self.infra.new_approve_logic().approve(*owner, op, ledgers)
            }
            HtsCall::SetApprovalForAll { op, owner } => {
                self.infra.new_approve_logic().set_approval_for_all(*owner, op, ledgers)
            }
            HtsCall::View(_) => Err(ResponseCode::FailInvalid),
        }
    }

    fn success_result(
        &self,
        call: &HtsCall,
        shape: ResultShape,
        effects: &SideEffectsTracker,
    ) -> Bytes {
        match shape {
            ResultShape::Status => encoding::encode_status(ResponseCode::Success),
            ResultShape::MintResult => {
                let token = match call {
                    HtsCall::Mint(op) => op.token,
                    _ => TokenId::MISSING,
                };
                encoding::encode_mint_success(
                    effects.latest_supply_change(token).unwrap_or_default(),
                    effects.minted_serials(token),
                )
            }
            ResultShape::BurnResult => {
                let token = match call {
                    HtsCall::Burn(op) => op.token,
                    _ => TokenId::MISSING,
                };
                encoding::encode_burn_success(effects.latest_supply_change(token).unwrap_or_default())
            }
            ResultShape::CreateResult => {
                let created = effects.effects().iter().find_map(|effect| match effect {
                    SideEffect::TokenCreation { token } => Some(*token),
                    _ => None,
                });
                encoding::encode_create_success(created.unwrap_or(TokenId::MISSING))
            }
            ResultShape::ApproveBool => encoding::encode_status_bool(ResponseCode::Success, true),
            ResultShape::ErcBool => encoding::encode_erc_bool(true),
            ResultShape::ErcEmpty => Bytes::new(),
            // Views encode their own tuples before reaching this point.
            ResultShape::View => Bytes::new(),
        }
    }
}

fn failure_result(shape: ResultShape, code: ResponseCode) -> Bytes {
    match shape {
        ResultShape::MintResult => encoding::encode_mint_failure(code),
        ResultShape::BurnResult => encoding::encode_burn_failure(code),
        ResultShape::CreateResult => encoding::encode_create_failure(code),
        ResultShape::ApproveBool => encoding::encode_status_bool(code, false),
        _ => encoding::encode_status(code),
    }
}
