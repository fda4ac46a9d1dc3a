use common_errors::{
    LendingError, Operation, ERROR_ASSET_NOT_SUPPORTED_AS_COLLATERAL,
    ERROR_HEALTH_FACTOR_TOO_LOW, ERROR_POSITION_NOT_FOUND,
};
use common_events::{ActionSink, CollateralChangeAction, LendingAction};
use common_structs::Token;
use multiversx_sc::api::ManagedTypeApi;
use tracing::debug;

use crate::LendingMarket;

impl<M: ManagedTypeApi, S: ActionSink<M>> LendingMarket<M, S> {
    /// Switches whether the supply of `token` backs borrows.
    ///
    /// Nothing happens when the flag already has the requested value. Turning collateral
    /// off is checked against the health factor after the flip and reverted on a breach.
    ///
    /// # Errors
    /// - `ERROR_POSITION_NOT_FOUND`: Nothing supplied for `token`.
    /// - `ERROR_ASSET_NOT_SUPPORTED_AS_COLLATERAL`: Enabling an asset that cannot back borrows.
    /// - `ERROR_HEALTH_FACTOR_TOO_LOW`: Disabling would drop the health factor below 1.
    pub fn change_collateral(
        &mut self,
        token: &Token,
        collateral: bool,
    ) -> Result<(), LendingError> {
        let token = self.registered_token(token, Operation::ChangeCollateral)?;
        let previous = self.ledger.supply(&token).cloned().ok_or_else(|| {
            LendingError::invalid(
                Operation::ChangeCollateral,
                token.symbol(),
                ERROR_POSITION_NOT_FOUND,
            )
        })?;
        if previous.collateral == collateral {
            return Ok(());
        }

        if collateral
            && !self
                .asset_config(&token, Operation::ChangeCollateral)?
                .can_supply_as_collateral()
        {
            return Err(LendingError::invalid(
                Operation::ChangeCollateral,
                token.symbol(),
                ERROR_ASSET_NOT_SUPPORTED_AS_COLLATERAL,
            ));
        }

        self.ledger.set_collateral(&token, collateral);
        self.invalidate_cache();

        if !collateral {
            self.require_healthy_after_supply_change(
                &token,
                previous,
                Operation::ChangeCollateral,
                ERROR_HEALTH_FACTOR_TOO_LOW,
            )?;
        }

        debug!(market = %self.market_id, %token, collateral, "collateral changed");
        self.record_action(LendingAction::CollateralChange(CollateralChangeAction {
            token,
            collateral,
        }));
        Ok(())
    }
}
