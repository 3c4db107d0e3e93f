//! Shared fixtures for unit and integration tests.

use alloy_primitives::Address;

use crate::{
    config::EngineProperties,
    ledger::{Account, Key, Nft, Token, TokenKeys, TokenRelationship, WorldLedgers},
    pricing::{CanonicalPrices, ExchangeRate, FeeComponents, GasCostType, PricingUtils, RateSource},
    records::InMemoryRecords,
    sigs::{KeyRole, SigsVerifier},
    status::ResponseCode,
    types::{AccountId, NftId, Timestamp, TokenId, TokenType},
    HtsPrecompiled,
};

/// A well-funded payer account used by most scenarios.
pub const PAYER: AccountId = AccountId(1001);
/// A second account used as counterparty.
pub const COUNTERPARTY: AccountId = AccountId(1002);
/// The fungible token seeded by [`seeded_world`].
pub const FUNGIBLE: TokenId = TokenId(0x1234);
/// The non-fungible token seeded by [`seeded_world`].
pub const NON_FUNGIBLE: TokenId = TokenId(0x1235);

/// A verifier that approves every key query.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproveAllSigs;

impl SigsVerifier for ApproveAllSigs {
    fn has_active_token_key(
        &self,
        _role: KeyRole,
        _token: TokenId,
        _sender: Address,
        _recipient: Address,
        _ledgers: &WorldLedgers,
    ) -> bool {
        true
    }

    fn has_active_account_key(
        &self,
        _account: AccountId,
        _sender: Address,
        _recipient: Address,
        _ledgers: &WorldLedgers,
    ) -> bool {
        true
    }
}

/// A verifier that denies every key query; only the `msg.sender` shortcut authorizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllSigs;

impl SigsVerifier for DenyAllSigs {
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

/// Flat canonical prices: every operation costs the same tinycent amount.
#[derive(Debug, Clone, Copy)]
pub struct StaticPrices {
    /// Price of every canonical operation, in tinycents.
    pub op_tinycents: u64,
    /// Price of one unit of gas, in tinycents.
    pub gas_tinycents: u64,
}

impl Default for StaticPrices {
    fn default() -> Self {
        Self { op_tinycents: 100_000, gas_tinycents: 1_000 }
    }
}

impl CanonicalPrices for StaticPrices {
    fn canonical_price(&self, _op: GasCostType) -> Option<FeeComponents> {
        Some(FeeComponents::service_only(self.op_tinycents))
    }

    fn gas_price_tinycents(&self, _at: Timestamp) -> Option<u64> {
        Some(self.gas_tinycents)
    }
}

/// A fixed 1:1 exchange rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedRates;

impl RateSource for FixedRates {
    fn active_rate(&self, _at: Timestamp) -> Option<ExchangeRate> {
        Some(ExchangeRate { hbar_equiv: 1, cent_equiv: 1 })
    }
}

/// The engine type used by tests.
pub type TestEngine<V> = HtsPrecompiled<V, StaticPrices, FixedRates, InMemoryRecords>;

/// Builds an engine over the seeded pricing fixtures and an in-memory record sink.
pub fn engine<V: SigsVerifier>(sigs: V) -> TestEngine<V> {
    HtsPrecompiled::new(
        sigs,
        PricingUtils::new(StaticPrices::default(), FixedRates),
        InMemoryRecords::new(),
        EngineProperties::default(),
    )
}

/// A world with two funded accounts, one fungible token (payer holds 500 of 1000), and one NFT
/// token with serials 1 and 2 owned by the payer.
pub fn seeded_world() -> WorldLedgers {
    let mut world = WorldLedgers::new();
    world.begin();

    world
        .accounts_mut()
        .put(PAYER, Account { balance: 1_000_000, ..Default::default() });
    world
        .accounts_mut()
        .put(COUNTERPARTY, Account { balance: 1_000_000, ..Default::default() });

    world.tokens_mut().put(
        FUNGIBLE,
        Token {
            token_type: TokenType::FungibleCommon,
            name: "Fungible".into(),
            symbol: "FT".into(),
            decimals: 2,
            total_supply: 1_000,
            treasury: PAYER,
            keys: TokenKeys {
                admin: Some(Key::new(vec![1u8; 32])),
                supply: Some(Key::new(vec![2u8; 32])),
                wipe: Some(Key::new(vec![3u8; 32])),
                freeze: Some(Key::new(vec![4u8; 32])),
                kyc: None,
                pause: Some(Key::new(vec![5u8; 32])),
                fee_schedule: None,
            },
            ..Default::default()
        },
    );
    world.token_rels_mut().put(
        (PAYER, FUNGIBLE),
        TokenRelationship { balance: 500, frozen: false, kyc_granted: true },
    );
    world.token_rels_mut().put(
        (COUNTERPARTY, FUNGIBLE),
        TokenRelationship { balance: 500, frozen: false, kyc_granted: true },
    );

    world.tokens_mut().put(
        NON_FUNGIBLE,
        Token {
            token_type: TokenType::NonFungibleUnique,
            name: "Unique".into(),
            symbol: "NFT".into(),
            total_supply: 2,
            treasury: PAYER,
            next_serial: 3,
            keys: TokenKeys {
                admin: Some(Key::new(vec![6u8; 32])),
                supply: Some(Key::new(vec![7u8; 32])),
                wipe: Some(Key::new(vec![8u8; 32])),
                ..Default::default()
            },
            ..Default::default()
        },
    );
    world.token_rels_mut().put(
        (PAYER, NON_FUNGIBLE),
        TokenRelationship { balance: 2, frozen: false, kyc_granted: true },
    );
    world.token_rels_mut().put(
        (COUNTERPARTY, NON_FUNGIBLE),
        TokenRelationship { balance: 0, frozen: false, kyc_granted: true },
    );
    world.nfts_mut().put(
        NftId::new(NON_FUNGIBLE, 1),
        Nft { owner: PAYER, metadata: b"one".to_vec().into(), ..Default::default() },
    );
    world.nfts_mut().put(
        NftId::new(NON_FUNGIBLE, 2),
        Nft { owner: PAYER, metadata: b"two".to_vec().into(), ..Default::default() },
    );

    world.commit();
    world
}

/// Decodes a single 32-byte status word.
pub fn status_of(output: &[u8]) -> ResponseCode {
    assert_eq!(output.len(), 32, "expected a single status word");
    let mut word = [0u8; 8];
    word.copy_from_slice(&output[24..]);
    let value = i64::from_be_bytes(word);
    for code in [
        ResponseCode::Ok,
        ResponseCode::InvalidSignature,
        ResponseCode::InsufficientPayerBalance,
        ResponseCode::NotSupported,
        ResponseCode::InvalidAccountId,
        ResponseCode::FailInvalid,
        ResponseCode::Success,
        ResponseCode::InsufficientGas,
        ResponseCode::InvalidTokenId,
        ResponseCode::TokenWasDeleted,
        ResponseCode::AccountFrozenForToken,
        ResponseCode::TokenHasNoSupplyKey,
        ResponseCode::TokenHasNoKycKey,
        ResponseCode::TokenHasNoFreezeKey,
        ResponseCode::TokenHasNoWipeKey,
        ResponseCode::TokenHasNoPauseKey,
        ResponseCode::InsufficientTokenBalance,
        ResponseCode::TokenMaxSupplyReached,
        ResponseCode::AccountKycNotGrantedForToken,
        ResponseCode::CannotWipeTokenTreasuryAccount,
        ResponseCode::InvalidNftId,
        ResponseCode::TokenIsPaused,
        ResponseCode::TokenNotAssociatedToAccount,
        ResponseCode::TokenAlreadyAssociatedToAccount,
        ResponseCode::AccountIsTreasury,
        ResponseCode::InvalidTokenBurnAmount,
        ResponseCode::InvalidTokenMintAmount,
        ResponseCode::InvalidWipingAmount,
        ResponseCode::SenderDoesNotOwnNftSerialNo,
        ResponseCode::SpenderDoesNotHaveAllowance,
        ResponseCode::AmountExceedsAllowance,
        ResponseCode::InvalidAllowanceOwnerId,
        ResponseCode::InvalidTokenNftSerialNumber,
        ResponseCode::InvalidTreasuryAccountForToken,
        ResponseCode::TreasuryMustOwnBurnedNft,
        ResponseCode::AccountDoesNotOwnWipedNft,
        ResponseCode::TransactionRequiresZeroTokenBalances,
        ResponseCode::TokenIsImmutable,
        ResponseCode::InvalidFullPrefixSignatureForPrecompile,
        ResponseCode::InvalidFeeSubmitted,
        ResponseCode::InvalidAccountAmounts,
        ResponseCode::NegativeAllowanceAmount,
        ResponseCode::TokenHasNoFeeScheduleKey,
    ] {
        if code.protocol_id() == value {
            return code;
        }
    }
    panic!("unknown status code {value}");
}
