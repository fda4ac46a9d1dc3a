use common_errors::{
    LendingError, Operation, ERROR_ASSET_NOT_SUPPORTED, ERROR_MARKET_STATUS_NOT_FOUND,
    ERROR_PRICE_NOT_FOUND, ERROR_RISK_PARAMETER_NOT_FOUND,
};
use common_events::ActionSink;
use common_structs::{AssetConfig, Token, TokenStatus};
use multiversx_sc::{
    api::ManagedTypeApi,
    types::{ManagedDecimal, NumDecimals},
};

use crate::LendingMarket;

/// Lookups of the per-token data an operation depends on. A missing entry is a
/// configuration failure attributed to `operation`.
impl<M: ManagedTypeApi, S: ActionSink<M>> LendingMarket<M, S> {
    /// Resolves `token` to the registered instance, which carries the canonical decimals.
    pub fn registered_token(
        &self,
        token: &Token,
        operation: Operation,
    ) -> Result<Token, LendingError> {
        self.tokens.get(token).cloned().ok_or_else(|| {
            LendingError::configuration(operation, token.symbol(), ERROR_ASSET_NOT_SUPPORTED)
        })
    }

    pub fn asset_config(
        &self,
        token: &Token,
        operation: Operation,
    ) -> Result<&AssetConfig<M>, LendingError> {
        self.risk_parameters.get(token).ok_or_else(|| {
            LendingError::configuration(operation, token.symbol(), ERROR_RISK_PARAMETER_NOT_FOUND)
        })
    }

    pub fn token_status(
        &self,
        token: &Token,
        operation: Operation,
    ) -> Result<&TokenStatus<M>, LendingError> {
        self.status.get(token).ok_or_else(|| {
            LendingError::configuration(operation, token.symbol(), ERROR_MARKET_STATUS_NOT_FOUND)
        })
    }

    pub fn token_price(
        &self,
        token: &Token,
        operation: Operation,
    ) -> Result<&ManagedDecimal<M, NumDecimals>, LendingError> {
        self.prices.price(token).ok_or_else(|| {
            LendingError::configuration(operation, token.symbol(), ERROR_PRICE_NOT_FOUND)
        })
    }
}
