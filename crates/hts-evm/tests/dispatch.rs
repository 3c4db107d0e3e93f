//! Dispatch-level behavior: unrecognized selectors, static frames, decode failures, nesting.

use alloy_primitives::Bytes;
use alloy_sol_types::SolCall;
use hts_evm::{
    abi::{IErcToken, IHederaTokenService as Hts},
    test_utils::{engine, seeded_world, status_of, ApproveAllSigs, FUNGIBLE, PAYER},
    MessageFrame, ResponseCode, SYSTEM_CONTRACT_ADDRESS,
};

const GAS: u64 = 10_000_000;
const NOW: i64 = 1_640_000_000;

#[test]
fn unrecognized_selector_is_an_empty_no_op_twice() {
    let mut world = seeded_world();
    let before: Vec<_> = world.tokens().iter_effective().collect();
    let mut engine = engine(ApproveAllSigs);
    let input = [0xde, 0xad, 0xbe, 0xef, 0x01, 0x02];

    for _ in 0..2 {
        let mut frame =
            MessageFrame::new(PAYER.to_evm_address(), SYSTEM_CONTRACT_ADDRESS, GAS, NOW, &mut world);
        let outcome = engine.compute_costed(&input, &mut frame);
        assert_eq!(outcome.output, Some(Bytes::new()));
        assert!(frame.revert_reason.is_none());
    }

    assert_eq!(world.depth(), 0, "no staging frame survives the call");
    let after: Vec<_> = world.tokens().iter_effective().collect();
    assert_eq!(before, after, "no side effects either time");
    assert!(engine.records().records().is_empty(), "not a system-contract call, no record");
}

#[test]
fn payload_shorter_than_a_selector_is_unrecognized() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let mut frame =
        MessageFrame::new(PAYER.to_evm_address(), SYSTEM_CONTRACT_ADDRESS, GAS, NOW, &mut world);
    let outcome = engine.compute_costed(&[0xab, 0xcd], &mut frame);
    assert_eq!(outcome.output, Some(Bytes::new()));
}

#[test]
fn truncated_payload_halts_with_revert_and_no_mutation() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let full = Hts::pauseTokenCall { token: FUNGIBLE.to_evm_address() }.abi_encode();
    let truncated = &full[..full.len() - 16];

    {
        let mut frame = MessageFrame::new(
            PAYER.to_evm_address(),
            SYSTEM_CONTRACT_ADDRESS,
            GAS,
            NOW,
            &mut world,
        );
        let outcome = engine.compute_costed(truncated, &mut frame);
        assert_eq!(outcome.output, None, "decode failure produces no output");
        assert!(frame.revert_reason.is_some(), "and signals revert upstream");
    }

    assert!(!world.tokens().committed_get(&FUNGIBLE).unwrap().paused);
}

#[test]
fn static_frame_rejects_state_changing_calls() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let input = Hts::pauseTokenCall { token: FUNGIBLE.to_evm_address() }.abi_encode();

    let mut frame =
        MessageFrame::new(PAYER.to_evm_address(), SYSTEM_CONTRACT_ADDRESS, GAS, NOW, &mut world)
            .into_static();
    let outcome = engine.compute_costed(&input, &mut frame);
    assert_eq!(outcome.output, None);
    assert_eq!(
        frame.revert_reason.as_deref().map(|b| b.as_ref()),
        Some(b"HTS precompiles are not static".as_slice())
    );
}

#[test]
fn static_frame_allows_views() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let input = Hts::isTokenCall { token: FUNGIBLE.to_evm_address() }.abi_encode();

    let mut frame =
        MessageFrame::new(PAYER.to_evm_address(), SYSTEM_CONTRACT_ADDRESS, GAS, NOW, &mut world)
            .into_static();
    let outcome = engine.compute_costed(&input, &mut frame);
    assert!(outcome.output.is_some());
    assert!(frame.revert_reason.is_none());
}

#[test]
fn static_frame_allows_token_redirects() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let mut input = Hts::redirectForTokenCall::SELECTOR.to_vec();
    input.extend_from_slice(FUNGIBLE.to_evm_address().as_slice());
    input.extend_from_slice(&IErcToken::nameCall {}.abi_encode());

    let mut frame =
        MessageFrame::new(PAYER.to_evm_address(), SYSTEM_CONTRACT_ADDRESS, GAS, NOW, &mut world)
            .into_static();
    let outcome = engine.compute_costed(&input, &mut frame);
    assert!(outcome.output.is_some());
}

#[test]
fn static_frame_rejects_mutating_redirects() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    // The outer selector is the redirect proxy, but the nested call moves balances.
    let mut input = Hts::redirectForTokenCall::SELECTOR.to_vec();
    input.extend_from_slice(FUNGIBLE.to_evm_address().as_slice());
    input.extend_from_slice(
        &IErcToken::transferCall {
            recipient: hts_evm::AccountId(1002).to_evm_address(),
            amount: alloy_primitives::U256::from(1u64),
        }
        .abi_encode(),
    );

    {
        let mut frame = MessageFrame::new(
            PAYER.to_evm_address(),
            SYSTEM_CONTRACT_ADDRESS,
            GAS,
            NOW,
            &mut world,
        )
        .into_static();
        let outcome = engine.compute_costed(&input, &mut frame);
        assert_eq!(outcome.output, None);
        assert!(frame.revert_reason.is_some());
    }
    assert_eq!(world.token_rels().committed_get(&(PAYER, FUNGIBLE)).unwrap().balance, 500);
}

#[test]
fn insufficient_gas_is_a_status_coded_failure() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let input = Hts::pauseTokenCall { token: FUNGIBLE.to_evm_address() }.abi_encode();

    {
        let mut frame = MessageFrame::new(
            PAYER.to_evm_address(),
            SYSTEM_CONTRACT_ADDRESS,
            1,
            NOW,
            &mut world,
        );
        let outcome = engine.compute_costed(&input, &mut frame);
        let output = outcome.output.expect("status word");
        assert_eq!(status_of(&output), ResponseCode::InsufficientGas);
        assert!(outcome.gas_requirement > 1);
    }
    assert!(!world.tokens().committed_get(&FUNGIBLE).unwrap().paused);
}

#[test]
fn value_is_rejected_outside_token_create() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let input = Hts::pauseTokenCall { token: FUNGIBLE.to_evm_address() }.abi_encode();

    let mut frame =
        MessageFrame::new(PAYER.to_evm_address(), SYSTEM_CONTRACT_ADDRESS, GAS, NOW, &mut world)
            .with_value(100);
    let outcome = engine.compute_costed(&input, &mut frame);
    assert_eq!(status_of(&outcome.output.unwrap()), ResponseCode::InvalidFeeSubmitted);
}

#[test]
fn nested_call_commits_only_into_the_enclosing_stage() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let input = Hts::pauseTokenCall { token: FUNGIBLE.to_evm_address() }.abi_encode();

    // The enclosing EVM transaction holds its own stage; the system-contract call commits into
    // it, not into the committed store.
    world.begin();
    {
        let mut frame =
            MessageFrame::new(PAYER.to_evm_address(), SYSTEM_CONTRACT_ADDRESS, GAS, NOW, &mut world);
        let outcome = engine.compute_costed(&input, &mut frame);
        assert_eq!(status_of(&outcome.output.unwrap()), ResponseCode::Success);
    }
    assert!(world.tokens().get(&FUNGIBLE).unwrap().paused, "visible in the stage");
    assert!(
        !world.tokens().committed_get(&FUNGIBLE).unwrap().paused,
        "not yet in the committed store"
    );

    world.commit();
    assert!(world.tokens().committed_get(&FUNGIBLE).unwrap().paused);
}
