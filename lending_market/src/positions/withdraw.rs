use common_errors::{
    LendingError, Operation, ERROR_HEALTH_FACTOR_WITHDRAW, ERROR_INSUFFICIENT_DEPOSIT,
    ERROR_POSITION_NOT_FOUND,
};
use common_events::{ActionSink, LendingAction, WithdrawAction};
use common_math::DecimalDisplay;
use common_rates::{to_base_amount, to_live_amount};
use common_structs::Token;
use multiversx_sc::{
    api::ManagedTypeApi,
    types::{ManagedDecimal, NumDecimals},
};
use tracing::debug;

use crate::{wallet::Wallet, LendingMarket};

impl<M: ManagedTypeApi, S: ActionSink<M>> LendingMarket<M, S> {
    /// Withdraws from the supply of `token` into the wallet.
    ///
    /// # Arguments
    /// - `wallet`: Receiver of the tokens.
    /// - `token`: Supplied asset.
    /// - `amount`: Live amount to withdraw, the whole deposit when `None`.
    ///
    /// # Returns
    /// - The withdrawn live amount.
    ///
    /// # Errors
    /// - `ERROR_POSITION_NOT_FOUND`: Nothing supplied for `token`.
    /// - `ERROR_INSUFFICIENT_DEPOSIT`: `amount` above the live deposit.
    /// - `ERROR_HEALTH_FACTOR_WITHDRAW`: Withdrawing collateral would drop the health factor
    ///   below 1. The supply is left untouched.
    pub fn withdraw(
        &mut self,
        wallet: &mut impl Wallet<M>,
        token: &Token,
        amount: Option<&ManagedDecimal<M, NumDecimals>>,
    ) -> Result<ManagedDecimal<M, NumDecimals>, LendingError> {
        let token = self.registered_token(token, Operation::Withdraw)?;
        let previous = self.ledger.supply(&token).cloned().ok_or_else(|| {
            LendingError::invalid(Operation::Withdraw, token.symbol(), ERROR_POSITION_NOT_FOUND)
        })?;
        let liquidity_index = self
            .token_status(&token, Operation::Withdraw)?
            .liquidity_index
            .clone();

        let deposit_before = to_live_amount(
            &previous.base_amount,
            &liquidity_index,
            token.decimals(),
        );
        let amount = match amount {
            Some(amount) => self.normalize_amount(&token, amount),
            None => deposit_before.clone(),
        };
        self.require_amount_greater_than_zero(&token, &amount, Operation::Withdraw)?;
        if amount > deposit_before {
            return Err(LendingError::invalid(
                Operation::Withdraw,
                token.symbol(),
                ERROR_INSUFFICIENT_DEPOSIT,
            ));
        }

        // A full withdrawal drops the whole base amount, rounding dust included.
        let base_amount = if amount == deposit_before {
            previous.base_amount.clone()
        } else {
            to_base_amount(&amount, &liquidity_index)
        };

        let collateral = previous.collateral;
        self.ledger.subtract_supply(&token, &base_amount);
        self.invalidate_cache();

        if collateral {
            self.require_healthy_after_supply_change(
                &token,
                previous,
                Operation::Withdraw,
                ERROR_HEALTH_FACTOR_WITHDRAW,
            )?;
        }

        wallet.credit(&token, &amount);

        let deposit_after = self.deposited_amount(&token, Operation::Withdraw)?;
        debug!(
            market = %self.market_id,
            %token,
            amount = %DecimalDisplay(&amount),
            deposit = %DecimalDisplay(&deposit_after),
            "withdraw"
        );

        self.record_action(LendingAction::Withdraw(WithdrawAction {
            token,
            amount: amount.clone(),
            deposit_before,
            deposit_after,
        }));

        Ok(amount)
    }
}
