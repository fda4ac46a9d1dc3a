use std::{any::Any, collections::BTreeMap};

use common_errors::{
    LendingError, Operation, ERROR_MARKET_ALREADY_EXISTS, ERROR_MARKET_NOT_FOUND,
};
use common_events::ActionSink;
use common_structs::{MarketSnapshot, PriceSnapshot};
use multiversx_sc::{
    api::ManagedTypeApi,
    types::{ManagedDecimalSigned, NumDecimals},
};
use tracing::debug;

use crate::{wallet::AssetWallet, LendingMarket};

/// Capabilities every market the broker drives has to offer.
pub trait Market<M: ManagedTypeApi + 'static>: Any {
    fn market_id(&self) -> &str;

    /// Replaces the per-step status and prices, then lets the market react to them.
    fn update_status(&mut self, snapshot: &MarketSnapshot<M>) -> Result<(), LendingError>;

    /// Value held in the market net of debt, WAD based.
    fn net_value(&self) -> Result<ManagedDecimalSigned<M, NumDecimals>, LendingError>;

    fn check_invariants(&self) -> Result<(), LendingError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<M, S> Market<M> for LendingMarket<M, S>
where
    M: ManagedTypeApi + 'static,
    S: ActionSink<M> + 'static,
{
    fn market_id(&self) -> &str {
        LendingMarket::<M, S>::market_id(self)
    }

    fn update_status(&mut self, snapshot: &MarketSnapshot<M>) -> Result<(), LendingError> {
        self.set_market_status(
            snapshot.timestamp,
            snapshot.status.clone(),
            snapshot.prices.clone(),
        );
        self.update()?;
        Ok(())
    }

    fn net_value(&self) -> Result<ManagedDecimalSigned<M, NumDecimals>, LendingError> {
        LendingMarket::<M, S>::net_value(self)
    }

    fn check_invariants(&self) -> Result<(), LendingError> {
        LendingMarket::<M, S>::check_invariants(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Owns the wallet and every market, and advances them step by step.
pub struct Broker<M: ManagedTypeApi + 'static> {
    wallet: AssetWallet<M>,
    markets: BTreeMap<String, Box<dyn Market<M>>>,
}

impl<M: ManagedTypeApi + 'static> Broker<M> {
    pub fn new(wallet: AssetWallet<M>) -> Self {
        Broker {
            wallet,
            markets: BTreeMap::new(),
        }
    }

    /// # Errors
    /// - `ERROR_MARKET_ALREADY_EXISTS`: A market with the same id is registered.
    pub fn add_market(&mut self, market: impl Market<M>) -> Result<(), LendingError> {
        let market_id = market.market_id().to_string();
        if self.markets.contains_key(&market_id) {
            return Err(LendingError::configuration(
                Operation::Setup,
                market_id,
                ERROR_MARKET_ALREADY_EXISTS,
            ));
        }
        self.markets.insert(market_id, Box::new(market));
        Ok(())
    }

    /// Feeds `snapshot` to every market, in market id order.
    pub fn step(&mut self, snapshot: &MarketSnapshot<M>) -> Result<(), LendingError> {
        for (market_id, market) in self.markets.iter_mut() {
            debug!(market = %market_id, timestamp = snapshot.timestamp, "step");
            market.update_status(snapshot)?;
        }
        Ok(())
    }

    pub fn market(&self, market_id: &str) -> Result<&dyn Market<M>, LendingError> {
        self.markets
            .get(market_id)
            .map(|market| &**market)
            .ok_or_else(|| {
                LendingError::configuration(Operation::Query, market_id, ERROR_MARKET_NOT_FOUND)
            })
    }

    /// Typed access to a lending market together with the wallet its operations need.
    ///
    /// # Errors
    /// - `ERROR_MARKET_NOT_FOUND`: No lending market registered under `market_id`.
    pub fn lending_market(
        &mut self,
        market_id: &str,
    ) -> Result<(&mut LendingMarket<M>, &mut AssetWallet<M>), LendingError> {
        let market = self
            .markets
            .get_mut(market_id)
            .and_then(|market| market.as_any_mut().downcast_mut::<LendingMarket<M>>())
            .ok_or_else(|| {
                LendingError::configuration(Operation::Query, market_id, ERROR_MARKET_NOT_FOUND)
            })?;
        Ok((market, &mut self.wallet))
    }

    pub fn wallet(&self) -> &AssetWallet<M> {
        &self.wallet
    }

    pub fn wallet_mut(&mut self) -> &mut AssetWallet<M> {
        &mut self.wallet
    }

    pub fn market_ids(&self) -> impl Iterator<Item = &str> {
        self.markets.keys().map(String::as_str)
    }

    /// Wallet holdings at `prices` plus the net value of every market, WAD based.
    pub fn net_value(
        &self,
        prices: &PriceSnapshot<M>,
    ) -> Result<ManagedDecimalSigned<M, NumDecimals>, LendingError> {
        let mut total = self.wallet.value(prices)?.into_signed();
        for market in self.markets.values() {
            total = total + market.net_value()?;
        }
        Ok(total)
    }

    pub fn check_invariants(&self) -> Result<(), LendingError> {
        for market in self.markets.values() {
            market.check_invariants()?;
        }
        Ok(())
    }
}
