use common_errors::{LendingError, Operation, ERROR_AMOUNT_MUST_BE_GREATER_THAN_ZERO};
use common_events::ActionSink;
use common_math::{is_zero, rescale_half_up, wad, DecimalDisplay};
use common_structs::{SupplyInfo, Token};
use multiversx_sc::{
    api::ManagedTypeApi,
    types::{ManagedDecimal, NumDecimals},
};
use tracing::warn;

use crate::LendingMarket;

impl<M: ManagedTypeApi, S: ActionSink<M>> LendingMarket<M, S> {
    /// Brings a caller supplied amount to the token's own precision.
    pub(crate) fn normalize_amount(
        &self,
        token: &Token,
        amount: &ManagedDecimal<M, NumDecimals>,
    ) -> ManagedDecimal<M, NumDecimals> {
        rescale_half_up(amount, token.decimals())
    }

    /// Ensures an amount is greater than zero.
    ///
    /// # Errors
    /// - `ERROR_AMOUNT_MUST_BE_GREATER_THAN_ZERO`: If the amount is zero.
    pub(crate) fn require_amount_greater_than_zero(
        &self,
        token: &Token,
        amount: &ManagedDecimal<M, NumDecimals>,
        operation: Operation,
    ) -> Result<(), LendingError> {
        if is_zero(amount) {
            return Err(LendingError::invalid(
                operation,
                token.symbol(),
                ERROR_AMOUNT_MUST_BE_GREATER_THAN_ZERO,
            ));
        }
        Ok(())
    }

    /// Checks the health factor after a tentative change to the supply of `token`.
    ///
    /// # Arguments
    /// - `token`: Supply that was changed.
    /// - `previous`: The entry as it was before the change.
    /// - `operation`: Operation the change belongs to.
    /// - `reason`: Failure reason reported on a breach.
    ///
    /// # Returns
    /// - `Ok(())` when the health factor is at least 1. Otherwise the supply is restored to
    ///   `previous` and a solvency error is returned.
    pub(crate) fn require_healthy_after_supply_change(
        &mut self,
        token: &Token,
        previous: SupplyInfo<M>,
        operation: Operation,
        reason: &'static str,
    ) -> Result<(), LendingError> {
        let health_factor = match self.health_factor() {
            Ok(health_factor) => health_factor,
            Err(err) => {
                self.rollback_supply(token, previous);
                return Err(err.with_operation(operation));
            },
        };

        if health_factor < wad() {
            self.rollback_supply(token, previous);
            warn!(
                market = %self.market_id,
                %token,
                %operation,
                health_factor = %DecimalDisplay(&health_factor),
                "rejected, health factor would drop below 1"
            );
            return Err(LendingError::solvency(operation, token.symbol(), reason));
        }
        Ok(())
    }

    fn rollback_supply(&mut self, token: &Token, previous: SupplyInfo<M>) {
        self.ledger.restore_supply(token, Some(previous));
        self.invalidate_cache();
    }
}
