use std::collections::BTreeSet;

use common_constants::BPS;
use common_errors::{LendingError, Operation, ERROR_INVALID_LIQUIDATION_PROBABILITY};
use common_events::{ActionLog, ActionRecord, ActionSink, LendingAction};
use common_structs::{MarketStatus, PriceSnapshot, Token};
use multiversx_sc::api::ManagedTypeApi;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

pub mod broker;
pub mod cache;
pub mod config;
pub mod oracle;
pub mod positions;
pub mod storage;
pub mod validation;
pub mod views;
pub mod wallet;

pub use broker::{Broker, Market};
pub use cache::MarketCache;
pub use config::{AssetConfigRow, ConfigError, MarketConfig, RiskParameterTable};
pub use positions::liquidation::{
    LiquidationOutcome, LiquidationRejection, LiquidationReport, LiquidationState,
};
pub use storage::PositionLedger;
pub use wallet::{AssetWallet, Wallet};

/// A single account's positions on an Aave-style lending market.
///
/// The market owns the position ledger and reads the per-step status and prices pushed
/// through [`LendingMarket::set_market_status`]. Spendable balances live in a [`Wallet`]
/// passed to every operation, and each completed operation is handed to the action sink.
pub struct LendingMarket<M: ManagedTypeApi, S: ActionSink<M> = ActionLog<M>> {
    market_id: String,
    tokens: BTreeSet<Token>,
    risk_parameters: RiskParameterTable<M>,
    ledger: PositionLedger<M>,
    status: MarketStatus<M>,
    prices: PriceSnapshot<M>,
    timestamp: u64,
    cache: MarketCache<M>,
    actions: S,
    liquidation_probability_bps: u64,
    rng: ChaCha8Rng,
    last_liquidation: Option<LiquidationReport<M>>,
}

impl<M: ManagedTypeApi> LendingMarket<M> {
    pub fn new(market_id: &str, risk_parameters: RiskParameterTable<M>) -> Self {
        Self::with_sink(market_id, risk_parameters, ActionLog::new())
    }

    pub fn from_config(config: &MarketConfig) -> Result<Self, ConfigError> {
        let market = Self::new(&config.name, config.risk_parameters()?)
            .with_liquidation_probability(config.liquidation_probability_bps, config.seed)
            .map_err(|_| ConfigError::InvalidMarket {
                market: config.name.clone(),
                reason: ERROR_INVALID_LIQUIDATION_PROBABILITY,
            })?;
        Ok(market)
    }
}

impl<M: ManagedTypeApi, S: ActionSink<M>> LendingMarket<M, S> {
    pub fn with_sink(market_id: &str, risk_parameters: RiskParameterTable<M>, actions: S) -> Self {
        LendingMarket {
            market_id: market_id.to_string(),
            tokens: BTreeSet::new(),
            risk_parameters,
            ledger: PositionLedger::new(),
            status: MarketStatus::new(),
            prices: PriceSnapshot::new(),
            timestamp: 0,
            cache: MarketCache::new(),
            actions,
            liquidation_probability_bps: BPS as u64,
            rng: ChaCha8Rng::seed_from_u64(0),
            last_liquidation: None,
        }
    }

    /// Sets the chance, in basis points, that [`LendingMarket::update`] runs a liquidation
    /// pass, and reseeds the draw.
    pub fn with_liquidation_probability(
        mut self,
        probability_bps: u64,
        seed: u64,
    ) -> Result<Self, LendingError> {
        if probability_bps > BPS as u64 {
            return Err(LendingError::configuration(
                Operation::Setup,
                self.market_id.clone(),
                ERROR_INVALID_LIQUIDATION_PROBABILITY,
            ));
        }
        self.liquidation_probability_bps = probability_bps;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        Ok(self)
    }

    pub fn add_token(&mut self, token: Token) {
        self.tokens.replace(token);
    }

    pub fn add_tokens(&mut self, tokens: impl IntoIterator<Item = Token>) {
        for token in tokens {
            self.add_token(token);
        }
    }

    pub fn tokens(&self) -> &BTreeSet<Token> {
        &self.tokens
    }

    pub fn market_id(&self) -> &str {
        &self.market_id
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn risk_parameters(&self) -> &RiskParameterTable<M> {
        &self.risk_parameters
    }

    pub fn ledger(&self) -> &PositionLedger<M> {
        &self.ledger
    }

    pub fn market_status(&self) -> &MarketStatus<M> {
        &self.status
    }

    pub fn prices(&self) -> &PriceSnapshot<M> {
        &self.prices
    }

    pub fn actions(&self) -> &S {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut S {
        &mut self.actions
    }

    pub fn liquidation_probability_bps(&self) -> u64 {
        self.liquidation_probability_bps
    }

    pub fn last_liquidation(&self) -> Option<&LiquidationReport<M>> {
        self.last_liquidation.as_ref()
    }

    /// Number of cache invalidations so far.
    pub fn cache_generation(&self) -> u64 {
        self.cache.generation()
    }

    /// Replaces the status and prices for a new step and drops every derived value.
    pub fn set_market_status(
        &mut self,
        timestamp: u64,
        status: MarketStatus<M>,
        prices: PriceSnapshot<M>,
    ) {
        self.timestamp = timestamp;
        self.status = status;
        self.prices = prices;
        self.cache.invalidate();

        debug!(market = %self.market_id, timestamp, "market status updated");
    }

    fn invalidate_cache(&mut self) {
        self.cache.invalidate();
    }

    fn record_action(&mut self, action: LendingAction<M>) {
        let record = ActionRecord {
            timestamp: self.timestamp,
            market: self.market_id.clone(),
            action,
        };
        self.actions.record(record);
    }
}
