use common_errors::{
    LendingError, Operation, ERROR_ASSET_NOT_SUPPORTED_AS_COLLATERAL,
    ERROR_COLLATERAL_FLAG_MISMATCH,
};
use common_events::{ActionSink, LendingAction, SupplyAction};
use common_math::DecimalDisplay;
use common_rates::to_base_amount;
use common_structs::Token;
use multiversx_sc::{
    api::ManagedTypeApi,
    types::{ManagedDecimal, NumDecimals},
};
use tracing::debug;

use crate::{wallet::Wallet, LendingMarket};

impl<M: ManagedTypeApi, S: ActionSink<M>> LendingMarket<M, S> {
    /// Moves `amount` of `token` from the wallet into a supply position.
    ///
    /// # Arguments
    /// - `wallet`: Source of the tokens.
    /// - `token`: Supplied asset.
    /// - `amount`: Live amount, rounded to the token's precision.
    /// - `collateral`: Whether the supply backs borrows. Has to match an existing supply.
    ///
    /// # Returns
    /// - The resulting live deposit.
    ///
    /// # Errors
    /// - `ERROR_ASSET_NOT_SUPPORTED_AS_COLLATERAL`: Collateral requested for an asset that
    ///   cannot back borrows.
    /// - `ERROR_COLLATERAL_FLAG_MISMATCH`: Existing supply carries the other flag.
    /// - `ERROR_INSUFFICIENT_BALANCE`: The wallet cannot cover `amount`.
    pub fn supply(
        &mut self,
        wallet: &mut impl Wallet<M>,
        token: &Token,
        amount: &ManagedDecimal<M, NumDecimals>,
        collateral: bool,
    ) -> Result<ManagedDecimal<M, NumDecimals>, LendingError> {
        let token = self.registered_token(token, Operation::Supply)?;
        let amount = self.normalize_amount(&token, amount);
        self.require_amount_greater_than_zero(&token, &amount, Operation::Supply)?;

        let config = self.asset_config(&token, Operation::Supply)?;
        if collateral && !config.can_supply_as_collateral() {
            return Err(LendingError::invalid(
                Operation::Supply,
                token.symbol(),
                ERROR_ASSET_NOT_SUPPORTED_AS_COLLATERAL,
            ));
        }
        if let Some(existing) = self.ledger.supply(&token) {
            if existing.collateral != collateral {
                return Err(LendingError::invalid(
                    Operation::Supply,
                    token.symbol(),
                    ERROR_COLLATERAL_FLAG_MISMATCH,
                ));
            }
        }

        let liquidity_index = self
            .token_status(&token, Operation::Supply)?
            .liquidity_index
            .clone();
        let deposit_before = self.deposited_amount(&token, Operation::Supply)?;

        wallet
            .debit(&token, &amount)
            .map_err(|err| err.with_operation(Operation::Supply))?;

        self.ledger
            .add_supply(&token, to_base_amount(&amount, &liquidity_index), collateral);
        self.invalidate_cache();

        let deposit_after = self.deposited_amount(&token, Operation::Supply)?;
        debug!(
            market = %self.market_id,
            %token,
            amount = %DecimalDisplay(&amount),
            collateral,
            deposit = %DecimalDisplay(&deposit_after),
            "supply"
        );

        self.record_action(LendingAction::Supply(SupplyAction {
            token,
            amount,
            collateral,
            deposit_before,
            deposit_after: deposit_after.clone(),
        }));

        Ok(deposit_after)
    }
}
