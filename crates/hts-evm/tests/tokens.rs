//! Token operation behavior: supply changes, wipes, associations, flags, admin ops, creation.

use alloy_primitives::{Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use hts_evm::{
    abi::{Expiry, HederaToken, IHederaTokenService as Hts},
    ledger::{Account, SideEffect},
    test_utils::{
        engine, seeded_world, status_of, ApproveAllSigs, COUNTERPARTY, FUNGIBLE, NON_FUNGIBLE,
        PAYER,
    },
    AccountId, MessageFrame, NftId, ResponseCode, TokenId, SYSTEM_CONTRACT_ADDRESS,
};

const GAS: u64 = 10_000_000;
const NOW: i64 = 1_640_000_000;

fn run(
    world: &mut hts_evm::ledger::WorldLedgers,
    engine: &mut hts_evm::test_utils::TestEngine<ApproveAllSigs>,
    input: &[u8],
) -> hts_evm::CallOutcome {
    let mut frame =
        MessageFrame::new(PAYER.to_evm_address(), SYSTEM_CONTRACT_ADDRESS, GAS, NOW, world);
    engine.compute_costed(input, &mut frame)
}

#[test]
fn fungible_mint_reports_the_new_total_supply() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let input = Hts::mintTokenCall {
        token: FUNGIBLE.to_evm_address(),
        amount: 150,
        metadata: Vec::new(),
    }
    .abi_encode();

    let outcome = run(&mut world, &mut engine, &input);
    let (code, new_total, serials) =
        <(i64, i64, Vec<i64>)>::abi_decode(&outcome.output.unwrap(), true).expect("mint tuple");
    assert_eq!(code, ResponseCode::Success.protocol_id());
    assert_eq!(new_total, 1_150);
    assert!(serials.is_empty());
    assert_eq!(world.tokens().committed_get(&FUNGIBLE).unwrap().total_supply, 1_150);
    assert_eq!(world.balance_of(PAYER, FUNGIBLE), 650);
}

#[test]
fn nft_mint_assigns_sequential_serials() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let input = Hts::mintTokenCall {
        token: NON_FUNGIBLE.to_evm_address(),
        amount: 0,
        metadata: vec![Bytes::from_static(b"three"), Bytes::from_static(b"four")],
    }
    .abi_encode();

    let outcome = run(&mut world, &mut engine, &input);
    let (code, new_total, serials) =
        <(i64, i64, Vec<i64>)>::abi_decode(&outcome.output.unwrap(), true).expect("mint tuple");
    assert_eq!(code, ResponseCode::Success.protocol_id());
    assert_eq!(new_total, 4);
    assert_eq!(serials, vec![3, 4]);
    assert_eq!(
        world.metadata_of(NftId::new(NON_FUNGIBLE, 3)),
        Some(Bytes::from_static(b"three"))
    );
}

#[test]
fn mint_on_a_missing_token_fails_with_the_mint_shape() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let input = Hts::mintTokenCall {
        token: TokenId(0xdead).to_evm_address(),
        amount: 1,
        metadata: Vec::new(),
    }
    .abi_encode();

    let outcome = run(&mut world, &mut engine, &input);
    let (code, new_total, serials) =
        <(i64, i64, Vec<i64>)>::abi_decode(&outcome.output.unwrap(), true).expect("mint tuple");
    assert_eq!(code, ResponseCode::InvalidTokenId.protocol_id());
    assert_eq!(new_total, 0);
    assert!(serials.is_empty());
}

#[test]
fn fungible_burn_shrinks_treasury_and_supply() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let input = Hts::burnTokenCall {
        token: FUNGIBLE.to_evm_address(),
        amount: 100,
        serialNumbers: Vec::new(),
    }
    .abi_encode();

    let outcome = run(&mut world, &mut engine, &input);
    let (code, new_total) =
        <(i64, i64)>::abi_decode(&outcome.output.unwrap(), true).expect("burn tuple");
    assert_eq!(code, ResponseCode::Success.protocol_id());
    assert_eq!(new_total, 900);
    assert_eq!(world.balance_of(PAYER, FUNGIBLE), 400);
}

#[test]
fn nft_burn_requires_treasury_held_serials() {
    let mut world = seeded_world();
    // Move serial 1 off the treasury first.
    world.begin();
    world.nfts_mut().update(&NftId::new(NON_FUNGIBLE, 1), |nft| nft.owner = COUNTERPARTY);
    world.commit();

    let mut engine = engine(ApproveAllSigs);
    let input = Hts::burnTokenCall {
        token: NON_FUNGIBLE.to_evm_address(),
        amount: 0,
        serialNumbers: vec![1],
    }
    .abi_encode();

    let outcome = run(&mut world, &mut engine, &input);
    let (code, _) = <(i64, i64)>::abi_decode(&outcome.output.unwrap(), true).expect("burn tuple");
    assert_eq!(code, ResponseCode::TreasuryMustOwnBurnedNft.protocol_id());
    assert!(world.nfts().committed_get(&NftId::new(NON_FUNGIBLE, 1)).is_some());
}

#[test]
fn fungible_wipe_commits_exactly_one_staged_change_set() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let input = Hts::wipeTokenAccountCall {
        token: FUNGIBLE.to_evm_address(),
        account: COUNTERPARTY.to_evm_address(),
        amount: 10,
    }
    .abi_encode();

    let outcome = run(&mut world, &mut engine, &input);
    assert_eq!(status_of(&outcome.output.unwrap()), ResponseCode::Success);
    assert_eq!(world.balance_of(COUNTERPARTY, FUNGIBLE), 490);
    assert_eq!(world.tokens().committed_get(&FUNGIBLE).unwrap().total_supply, 990);
    assert_eq!(world.depth(), 0, "stage fully committed");

    // Exactly one record, carrying the wipe's effects: the balance adjustment and the supply
    // change.
    let records = engine.records().records();
    assert_eq!(records.len(), 1);
    assert!(matches!(
        records[0].side_effects[0],
        SideEffect::TokenUnitsAdjust { account: COUNTERPARTY, amount: -10, .. }
    ));
    assert!(matches!(
        records[0].side_effects[1],
        SideEffect::SupplyChange { new_total_supply: 990, .. }
    ));
}

#[test]
fn wiping_the_treasury_is_rejected() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let input = Hts::wipeTokenAccountCall {
        token: FUNGIBLE.to_evm_address(),
        account: PAYER.to_evm_address(),
        amount: 10,
    }
    .abi_encode();

    let outcome = run(&mut world, &mut engine, &input);
    assert_eq!(
        status_of(&outcome.output.unwrap()),
        ResponseCode::CannotWipeTokenTreasuryAccount
    );
}

#[test]
fn associate_then_dissociate_round_trips() {
    let mut world = seeded_world();
    // A third account with no relationships.
    world.begin();
    world.accounts_mut().put(AccountId(1003), Account::default());
    world.commit();

    let mut engine = engine(ApproveAllSigs);
    let associate = Hts::associateTokenCall {
        account: AccountId(1003).to_evm_address(),
        token: FUNGIBLE.to_evm_address(),
    }
    .abi_encode();
    let outcome = run(&mut world, &mut engine, &associate);
    assert_eq!(status_of(&outcome.output.unwrap()), ResponseCode::Success);
    assert!(world.token_rels().committed_get(&(AccountId(1003), FUNGIBLE)).is_some());

    // Associating again is a domain rejection.
    let outcome = run(&mut world, &mut engine, &associate);
    assert_eq!(
        status_of(&outcome.output.unwrap()),
        ResponseCode::TokenAlreadyAssociatedToAccount
    );

    let dissociate = Hts::dissociateTokenCall {
        account: AccountId(1003).to_evm_address(),
        token: FUNGIBLE.to_evm_address(),
    }
    .abi_encode();
    let outcome = run(&mut world, &mut engine, &dissociate);
    assert_eq!(status_of(&outcome.output.unwrap()), ResponseCode::Success);
    assert!(world.token_rels().committed_get(&(AccountId(1003), FUNGIBLE)).is_none());
}

#[test]
fn dissociate_with_balance_is_rejected() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let input = Hts::dissociateTokenCall {
        account: COUNTERPARTY.to_evm_address(),
        token: FUNGIBLE.to_evm_address(),
    }
    .abi_encode();

    let outcome = run(&mut world, &mut engine, &input);
    assert_eq!(
        status_of(&outcome.output.unwrap()),
        ResponseCode::TransactionRequiresZeroTokenBalances
    );
}

#[test]
fn frozen_relationship_blocks_transfers_until_unfrozen() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let freeze = Hts::freezeTokenCall {
        token: FUNGIBLE.to_evm_address(),
        account: COUNTERPARTY.to_evm_address(),
    }
    .abi_encode();
    let outcome = run(&mut world, &mut engine, &freeze);
    assert_eq!(status_of(&outcome.output.unwrap()), ResponseCode::Success);
    assert!(world.is_frozen(COUNTERPARTY, FUNGIBLE));

    let transfer = Hts::transferTokenCall {
        token: FUNGIBLE.to_evm_address(),
        sender: PAYER.to_evm_address(),
        receiver: COUNTERPARTY.to_evm_address(),
        amount: 5,
    }
    .abi_encode();
    let outcome = run(&mut world, &mut engine, &transfer);
    assert_eq!(status_of(&outcome.output.unwrap()), ResponseCode::AccountFrozenForToken);

    let unfreeze = Hts::unfreezeTokenCall {
        token: FUNGIBLE.to_evm_address(),
        account: COUNTERPARTY.to_evm_address(),
    }
    .abi_encode();
    run(&mut world, &mut engine, &unfreeze);
    let outcome = run(&mut world, &mut engine, &transfer);
    assert_eq!(status_of(&outcome.output.unwrap()), ResponseCode::Success);
}

#[test]
fn kyc_calls_require_a_kyc_key() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    // The seeded fungible token has no KYC key.
    let input = Hts::grantTokenKycCall {
        token: FUNGIBLE.to_evm_address(),
        account: COUNTERPARTY.to_evm_address(),
    }
    .abi_encode();

    let outcome = run(&mut world, &mut engine, &input);
    assert_eq!(status_of(&outcome.output.unwrap()), ResponseCode::TokenHasNoKycKey);
}

#[test]
fn paused_token_rejects_operations_until_unpaused() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let pause = Hts::pauseTokenCall { token: FUNGIBLE.to_evm_address() }.abi_encode();
    let outcome = run(&mut world, &mut engine, &pause);
    assert_eq!(status_of(&outcome.output.unwrap()), ResponseCode::Success);

    let mint =
        Hts::mintTokenCall { token: FUNGIBLE.to_evm_address(), amount: 1, metadata: Vec::new() }
            .abi_encode();
    let outcome = run(&mut world, &mut engine, &mint);
    let (code, _, _) =
        <(i64, i64, Vec<i64>)>::abi_decode(&outcome.output.unwrap(), true).expect("mint tuple");
    assert_eq!(code, ResponseCode::TokenIsPaused.protocol_id());

    let unpause = Hts::unpauseTokenCall { token: FUNGIBLE.to_evm_address() }.abi_encode();
    run(&mut world, &mut engine, &unpause);
    let outcome = run(&mut world, &mut engine, &mint);
    let (code, _, _) =
        <(i64, i64, Vec<i64>)>::abi_decode(&outcome.output.unwrap(), true).expect("mint tuple");
    assert_eq!(code, ResponseCode::Success.protocol_id());
}

#[test]
fn delete_marks_the_token_and_blocks_further_use() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let delete = Hts::deleteTokenCall { token: FUNGIBLE.to_evm_address() }.abi_encode();
    let outcome = run(&mut world, &mut engine, &delete);
    assert_eq!(status_of(&outcome.output.unwrap()), ResponseCode::Success);
    assert!(world.tokens().committed_get(&FUNGIBLE).unwrap().deleted);

    let transfer = Hts::transferTokenCall {
        token: FUNGIBLE.to_evm_address(),
        sender: PAYER.to_evm_address(),
        receiver: COUNTERPARTY.to_evm_address(),
        amount: 5,
    }
    .abi_encode();
    let outcome = run(&mut world, &mut engine, &transfer);
    assert_eq!(status_of(&outcome.output.unwrap()), ResponseCode::TokenWasDeleted);
}

#[test]
fn update_changes_only_the_stated_fields() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let input = Hts::updateTokenInfoCall {
        token: FUNGIBLE.to_evm_address(),
        tokenInfo: HederaToken { name: "Renamed".into(), ..Default::default() },
    }
    .abi_encode();

    let outcome = run(&mut world, &mut engine, &input);
    assert_eq!(status_of(&outcome.output.unwrap()), ResponseCode::Success);
    let token = world.tokens().committed_get(&FUNGIBLE).unwrap();
    assert_eq!(token.name, "Renamed");
    assert_eq!(token.symbol, "FT", "unstated fields keep their values");
}

#[test]
fn expiry_update_applies_positive_fields() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let input = Hts::updateTokenExpiryInfoCall {
        token: FUNGIBLE.to_evm_address(),
        expiryInfo: Expiry {
            second: NOW + 7_776_000,
            autoRenewAccount: COUNTERPARTY.to_evm_address(),
            autoRenewPeriod: 7_776_000,
        },
    }
    .abi_encode();

    let outcome = run(&mut world, &mut engine, &input);
    assert_eq!(status_of(&outcome.output.unwrap()), ResponseCode::Success);
    let token = world.tokens().committed_get(&FUNGIBLE).unwrap();
    assert_eq!(token.expiry.second, NOW + 7_776_000);
    assert_eq!(token.expiry.auto_renew_account, Some(COUNTERPARTY));
}

#[test]
fn create_returns_the_new_token_address() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let input = Hts::createFungibleTokenCall {
        token: HederaToken {
            name: "Brand New".into(),
            symbol: "NEW".into(),
            treasury: PAYER.to_evm_address(),
            ..Default::default()
        },
        initialTotalSupply: U256::from(10_000u64),
        decimals: U256::from(2u64),
    }
    .abi_encode();

    let outcome = {
        let mut frame = MessageFrame::new(
            PAYER.to_evm_address(),
            SYSTEM_CONTRACT_ADDRESS,
            GAS,
            NOW,
            &mut world,
        )
        .with_value(1_000);
        engine.compute_costed(&input, &mut frame)
    };
    let (code, address) =
        <(i64, alloy_primitives::Address)>::abi_decode(&outcome.output.unwrap(), true)
            .expect("create tuple");
    assert_eq!(code, ResponseCode::Success.protocol_id());

    let created = TokenId::from_evm_address(address).expect("long-zero token address");
    let token = world.tokens().committed_get(&created).expect("token exists");
    assert_eq!(token.name, "Brand New");
    assert_eq!(token.total_supply, 10_000);
    assert_eq!(world.balance_of(PAYER, created), 10_000);
}

#[test]
fn approve_and_allowance_round_trip() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let approve = Hts::approveCall {
        token: FUNGIBLE.to_evm_address(),
        spender: COUNTERPARTY.to_evm_address(),
        amount: U256::from(77u64),
    }
    .abi_encode();

    let outcome = run(&mut world, &mut engine, &approve);
    let (code, approved) =
        <(i64, bool)>::abi_decode(&outcome.output.unwrap(), true).expect("approve tuple");
    assert_eq!(code, ResponseCode::Success.protocol_id());
    assert!(approved);
    assert_eq!(world.allowance_of(PAYER, FUNGIBLE, COUNTERPARTY), 77);
}

#[test]
fn nft_serial_approval_requires_the_owner() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    // Serial 1 belongs to the payer, who is also the frame sender: approval succeeds.
    let approve = Hts::approveNFTCall {
        token: NON_FUNGIBLE.to_evm_address(),
        approved: COUNTERPARTY.to_evm_address(),
        serialNumber: U256::from(1u64),
    }
    .abi_encode();
    let outcome = run(&mut world, &mut engine, &approve);
    assert_eq!(status_of(&outcome.output.unwrap()), ResponseCode::Success);
    assert_eq!(world.approved_spender_of(NftId::new(NON_FUNGIBLE, 1)), Some(COUNTERPARTY));
}

#[test]
fn set_approval_for_all_toggles_the_operator() {
    let mut world = seeded_world();
    let mut engine = engine(ApproveAllSigs);
    let grant = Hts::setApprovalForAllCall {
        token: NON_FUNGIBLE.to_evm_address(),
        operator: COUNTERPARTY.to_evm_address(),
        approved: true,
    }
    .abi_encode();
    let outcome = run(&mut world, &mut engine, &grant);
    assert_eq!(status_of(&outcome.output.unwrap()), ResponseCode::Success);
    assert!(world.is_approved_for_all(PAYER, NON_FUNGIBLE, COUNTERPARTY));

    let revoke = Hts::setApprovalForAllCall {
        token: NON_FUNGIBLE.to_evm_address(),
        operator: COUNTERPARTY.to_evm_address(),
        approved: false,
    }
    .abi_encode();
    run(&mut world, &mut engine, &revoke);
    assert!(!world.is_approved_for_all(PAYER, NON_FUNGIBLE, COUNTERPARTY));
}
