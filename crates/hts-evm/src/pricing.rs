//! Fee and gas pricing for system-contract calls.
//!
//! Canonical resource prices are quoted in tinycents by an external provider and converted to
//! tinybars with the live exchange rate. All arithmetic is exact integer math over `i128`
//! intermediates; anything that would overflow or divide by zero is a [`PricingError`], which is
//! fatal to the call (the engine aborts before any mutation). Quotes are computed fresh per call
//! because the exchange rate can move between consensus rounds.

use crate::{
    synth::{CryptoTransferBody, TransactionBody},
    types::Timestamp,
};

/// A live hbar/cent exchange rate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeRate {
    /// Hbar units equivalent to `cent_equiv` cents.
    pub hbar_equiv: i32,
    /// Cent units equivalent to `hbar_equiv` hbars.
    pub cent_equiv: i32,
}

/// Canonical price of one resource use, split into fee components, in tinycents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeComponents {
    /// The submitting node's share.
    pub node: u64,
    /// The network share.
    pub network: u64,
    /// The service share.
    pub service: u64,
}

impl FeeComponents {
    /// A flat price carried entirely by the service component.
    pub const fn service_only(tinycents: u64) -> Self {
        Self { node: 0, network: 0, service: tinycents }
    }
}

/// A per-call fee quote in tinybars, plus the gas price it was computed against.
///
/// Never cached across calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    /// The node fee in tinybars.
    pub node: i64,
    /// The network fee in tinybars.
    pub network: i64,
    /// The service fee in tinybars.
    pub service: i64,
    /// The gas price in tinybars used to derive the gas requirement.
    pub gas_price: i64,
}

impl FeeQuote {
    /// Sum of the three components.
    pub const fn total(&self) -> i64 {
        self.node + self.network + self.service
    }
}

/// The canonical operations priced by the fee schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GasCostType {
    /// One hbar adjustment.
    TransferHbar,
    /// One fungible adjustment.
    TransferFungible,
    /// One NFT exchange.
    TransferNft,
    /// Fungible mint.
    MintFungible,
    /// NFT mint, per serial.
    MintNft,
    /// Fungible burn.
    BurnFungible,
    /// NFT burn.
    BurnNft,
    /// Wipe.
    Wipe,
    /// Associate, per token.
    Associate,
    /// Dissociate, per token.
    Dissociate,
    /// Freeze or unfreeze.
    Freeze,
    /// KYC grant or revoke.
    Kyc,
    /// Pause or unpause.
    Pause,
    /// Token delete.
    Delete,
    /// Token update, keys and expiry included.
    UpdateToken,
    /// Token create.
    TokenCreate,
    /// Allowance and operator approvals.
    Approve,
    /// Read-only queries.
    View,
}

/// Why a price could not be computed. Fatal to the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    /// No exchange rate is active for the call's consensus time.
    #[error("no active exchange rate")]
    MissingRate,
    /// The provider has no canonical price for the operation.
    #[error("no canonical price for {0:?}")]
    MissingPrice(GasCostType),
    /// The rate pair would divide by zero or is negative.
    #[error("unusable exchange rate")]
    InvalidRate,
    /// Exact conversion overflowed the 64-bit fee domain.
    #[error("fee conversion overflow")]
    Overflow,
}

/// Supplies the live exchange rate.
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait RateSource {
    /// The rate active at the given consensus second, if any.
    fn active_rate(&self, at: Timestamp) -> Option<ExchangeRate>;
}

/// Supplies canonical resource prices in tinycents.
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait CanonicalPrices {
    /// The canonical price of one operation.
    fn canonical_price(&self, op: GasCostType) -> Option<FeeComponents>;

    /// The canonical price of one unit of gas, in tinycents.
    fn gas_price_tinycents(&self, at: Timestamp) -> Option<u64>;
}

/// Converts tinycents to tinybars with the given rate, exactly.
pub fn tinycents_to_tinybars(tinycents: u64, rate: ExchangeRate) -> Result<i64, PricingError> {
    if rate.cent_equiv <= 0 || rate.hbar_equiv <= 0 {
        return Err(PricingError::InvalidRate);
    }
    let product = i128::from(tinycents)
        .checked_mul(i128::from(rate.hbar_equiv))
        .ok_or(PricingError::Overflow)?;
    let tinybars = product / i128::from(rate.cent_equiv);
    i64::try_from(tinybars).map_err(|_| PricingError::Overflow)
}

/// Prices calls against a canonical price provider and a live rate source.
#[derive(Debug, Clone)]
pub struct PricingUtils<P, R> {
    prices: P,
    rates: R,
}

impl<P: CanonicalPrices, R: RateSource> PricingUtils<P, R> {
    /// Creates a pricing utility over the given providers.
    pub fn new(prices: P, rates: R) -> Self {
        Self { prices, rates }
    }

    /// The minimum fee of one canonical operation in tinybars at the given time.
    pub fn minimum_price_tinybars(
        &self,
        op: GasCostType,
        at: Timestamp,
    ) -> Result<i64, PricingError> {
        let rate = self.rates.active_rate(at).ok_or(PricingError::MissingRate)?;
        let components = self.prices.canonical_price(op).ok_or(PricingError::MissingPrice(op))?;
        let total = components
            .node
            .checked_add(components.network)
            .and_then(|sum| sum.checked_add(components.service))
            .ok_or(PricingError::Overflow)?;
        tinycents_to_tinybars(total, rate)
    }

    /// The live gas price in tinybars; never less than one.
    pub fn gas_price_tinybars(&self, at: Timestamp) -> Result<i64, PricingError> {
        let rate = self.rates.active_rate(at).ok_or(PricingError::MissingRate)?;
        let tinycents = self.prices.gas_price_tinycents(at).ok_or(PricingError::MissingRate)?;
        let price = tinycents_to_tinybars(tinycents, rate)?;
        Ok(price.max(1))
    }

    /// Quotes the fee of a canonical transaction, fresh from the live rate.
    pub fn quote(&self, body: &TransactionBody, at: Timestamp) -> Result<FeeQuote, PricingError> {
        let rate = self.rates.active_rate(at).ok_or(PricingError::MissingRate)?;
        let components = self.body_price_tinycents(body)?;
        Ok(FeeQuote {
            node: tinycents_to_tinybars(components.node, rate)?,
            network: tinycents_to_tinybars(components.network, rate)?,
            service: tinycents_to_tinybars(components.service, rate)?,
            gas_price: self.gas_price_tinybars(at)?,
        })
    }

    /// The gas requirement of a call: break-even gas for the quoted fee plus a 20% premium.
    pub fn gas_requirement(
        &self,
        body: &TransactionBody,
        at: Timestamp,
    ) -> Result<u64, PricingError> {
        let quote = self.quote(body, at)?;
        Self::gas_for(quote.total(), quote.gas_price)
    }

    /// The gas requirement of a read-only call.
    pub fn view_gas_requirement(&self, at: Timestamp) -> Result<u64, PricingError> {
        let fee = self.minimum_price_tinybars(GasCostType::View, at)?;
        Self::gas_for(fee, self.gas_price_tinybars(at)?)
    }

    fn gas_for(total_fee: i64, gas_price: i64) -> Result<u64, PricingError> {
        if gas_price <= 0 || total_fee < 0 {
            return Err(PricingError::InvalidRate);
        }
        let fee = i128::from(total_fee);
        let price = i128::from(gas_price);
        let base = (fee + price - 1) / price;
        // 20% premium over break-even, floored by the integer division.
        let with_premium = base.checked_mul(6).ok_or(PricingError::Overflow)? / 5;
        u64::try_from(with_premium).map_err(|_| PricingError::Overflow)
    }

    fn price_of(&self, op: GasCostType) -> Result<FeeComponents, PricingError> {
        self.prices.canonical_price(op).ok_or(PricingError::MissingPrice(op))
    }

    fn body_price_tinycents(&self, body: &TransactionBody) -> Result<FeeComponents, PricingError> {
        let components = match body {
            TransactionBody::CryptoTransfer(transfer) => {
                return self.transfer_price_tinycents(transfer)
            }
            TransactionBody::TokenMint(mint) => {
                if mint.amount > 0 {
                    self.price_of(GasCostType::MintFungible)?
                } else {
                    let per_serial = self.price_of(GasCostType::MintNft)?;
                    scale(per_serial, mint.metadata.len() as u64)?
                }
            }
            TransactionBody::TokenBurn(burn) => {
                if burn.amount > 0 {
                    self.price_of(GasCostType::BurnFungible)?
                } else {
                    self.price_of(GasCostType::BurnNft)?
                }
            }
            TransactionBody::TokenWipe(_) => self.price_of(GasCostType::Wipe)?,
            TransactionBody::TokenAssociate(body) => {
                scale(self.price_of(GasCostType::Associate)?, body.tokens.len() as u64)?
            }
            TransactionBody::TokenDissociate(body) => {
                scale(self.price_of(GasCostType::Dissociate)?, body.tokens.len() as u64)?
            }
            TransactionBody::TokenFreeze(_) | TransactionBody::TokenUnfreeze(_) => {
                self.price_of(GasCostType::Freeze)?
            }
            TransactionBody::TokenGrantKyc(_) | TransactionBody::TokenRevokeKyc(_) => {
                self.price_of(GasCostType::Kyc)?
            }
            TransactionBody::TokenPause { .. } | TransactionBody::TokenUnpause { .. } => {
                self.price_of(GasCostType::Pause)?
            }
            TransactionBody::TokenDelete { .. } => self.price_of(GasCostType::Delete)?,
            TransactionBody::TokenUpdate(_)
            | TransactionBody::TokenUpdateKeys(_)
            | TransactionBody::TokenUpdateExpiry { .. } => self.price_of(GasCostType::UpdateToken)?,
            TransactionBody::TokenCreate(_) => self.price_of(GasCostType::TokenCreate)?,
            TransactionBody::CryptoApproveAllowance(_) => self.price_of(GasCostType::Approve)?,
            TransactionBody::ViewCall => self.price_of(GasCostType::View)?,
        };
        Ok(components)
    }

    /// Transfer pricing: fungible and hbar adjustments charge half the canonical price each (a
    /// whole transfer always has at least two), NFT exchanges charge the full price per leg.
    fn transfer_price_tinycents(
        &self,
        body: &CryptoTransferBody,
    ) -> Result<FeeComponents, PricingError> {
        let fungible = halve(self.price_of(GasCostType::TransferFungible)?);
        let nft = self.price_of(GasCostType::TransferNft)?;
        let hbar = halve(self.price_of(GasCostType::TransferHbar)?);

        let mut accumulated = FeeComponents::default();
        for list in &body.token_transfers {
            accumulated = add(accumulated, scale(fungible, list.transfers.len() as u64)?)?;
            accumulated = add(accumulated, scale(nft, list.nft_transfers.len() as u64)?)?;
        }
        accumulated = add(accumulated, scale(hbar, body.hbar_transfers.len() as u64)?)?;
        Ok(accumulated)
    }
}

fn halve(components: FeeComponents) -> FeeComponents {
    FeeComponents {
        node: components.node / 2,
        network: components.network / 2,
        service: components.service / 2,
    }
}

fn scale(components: FeeComponents, count: u64) -> Result<FeeComponents, PricingError> {
    Ok(FeeComponents {
        node: components.node.checked_mul(count).ok_or(PricingError::Overflow)?,
        network: components.network.checked_mul(count).ok_or(PricingError::Overflow)?,
        service: components.service.checked_mul(count).ok_or(PricingError::Overflow)?,
    })
}

fn add(a: FeeComponents, b: FeeComponents) -> Result<FeeComponents, PricingError> {
    Ok(FeeComponents {
        node: a.node.checked_add(b.node).ok_or(PricingError::Overflow)?,
        network: a.network.checked_add(b.network).ok_or(PricingError::Overflow)?,
        service: a.service.checked_add(b.service).ok_or(PricingError::Overflow)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{synth::TokenMintBody, types::TokenId};

    #[derive(Debug)]
    struct FlatPrices(u64);

    impl CanonicalPrices for FlatPrices {
        fn canonical_price(&self, _op: GasCostType) -> Option<FeeComponents> {
            Some(FeeComponents::service_only(self.0))
        }

        fn gas_price_tinycents(&self, _at: Timestamp) -> Option<u64> {
            Some(1000)
        }
    }

    #[derive(Debug)]
    struct FixedRate(ExchangeRate);

    impl RateSource for FixedRate {
        fn active_rate(&self, _at: Timestamp) -> Option<ExchangeRate> {
            Some(self.0)
        }
    }

    fn one_to_one() -> ExchangeRate {
        ExchangeRate { hbar_equiv: 1, cent_equiv: 1 }
    }

    fn mint_body() -> TransactionBody {
        TransactionBody::TokenMint(TokenMintBody {
            token: TokenId(1),
            amount: 10,
            metadata: Vec::new(),
        })
    }

    #[test]
    fn conversion_is_exact_integer_math() {
        let rate = ExchangeRate { hbar_equiv: 1, cent_equiv: 12 };
        assert_eq!(tinycents_to_tinybars(120, rate), Ok(10));
        assert_eq!(tinycents_to_tinybars(125, rate), Ok(10));
    }

    #[test]
    fn zero_cent_equiv_is_rejected() {
        let rate = ExchangeRate { hbar_equiv: 1, cent_equiv: 0 };
        assert_eq!(tinycents_to_tinybars(1, rate), Err(PricingError::InvalidRate));
    }

    #[test]
    fn conversion_overflow_is_signalled() {
        let rate = ExchangeRate { hbar_equiv: i32::MAX, cent_equiv: 1 };
        assert_eq!(tinycents_to_tinybars(u64::MAX, rate), Err(PricingError::Overflow));
    }

    #[test]
    fn gas_requirement_includes_twenty_percent_premium() {
        // Fee 10_000 tinycents at 1:1 = 10_000 tinybars; gas price 1000 tinybars.
        // Break-even gas = 10, requirement = 10 * 6 / 5 = 12.
        let utils = PricingUtils::new(FlatPrices(10_000), FixedRate(one_to_one()));
        assert_eq!(utils.gas_requirement(&mint_body(), 0), Ok(12));
    }

    #[test]
    fn gas_requirement_rounds_break_even_up() {
        // Fee 10_500 => ceil(10.5) = 11 gas break-even, requirement 11 * 6 / 5 = 13.
        let utils = PricingUtils::new(FlatPrices(10_500), FixedRate(one_to_one()));
        assert_eq!(utils.gas_requirement(&mint_body(), 0), Ok(13));
    }

    #[test]
    fn missing_rate_is_fatal() {
        #[derive(Debug)]
        struct NoRate;
        impl RateSource for NoRate {
            fn active_rate(&self, _at: Timestamp) -> Option<ExchangeRate> {
                None
            }
        }
        let utils = PricingUtils::new(FlatPrices(1), NoRate);
        assert_eq!(utils.quote(&mint_body(), 0), Err(PricingError::MissingRate));
    }

    #[test]
    fn transfer_pricing_charges_half_per_fungible_leg() {
        use crate::synth::{AccountAmount, CryptoTransferBody, TokenTransferList};
        let utils = PricingUtils::new(FlatPrices(10_000), FixedRate(one_to_one()));
        let body = TransactionBody::CryptoTransfer(CryptoTransferBody {
            hbar_transfers: Vec::new(),
            token_transfers: vec![TokenTransferList {
                token: TokenId(1),
                transfers: vec![
                    AccountAmount { account: crate::types::AccountId(1), amount: -5, is_approval: false },
                    AccountAmount { account: crate::types::AccountId(2), amount: 5, is_approval: false },
                ],
                nft_transfers: Vec::new(),
            }],
        });
        let quote = utils.quote(&body, 0).expect("quotes");
        // Two legs at half price each equal one whole canonical price.
        assert_eq!(quote.total(), 10_000);
    }
}
