use common_errors::{
    LendingError, Operation, ERROR_AMOUNT_EXCEEDS_DEBT, ERROR_AMOUNT_MUST_BE_GREATER_THAN_ZERO,
    ERROR_NO_DEBT,
};
use common_events::{ActionSink, LendingAction, RepayAction};
use common_math::{is_zero, DecimalDisplay};
use common_rates::{to_base_amount, to_live_amount};
use common_structs::{BorrowKey, InterestRateMode, Token};
use multiversx_sc::{
    api::ManagedTypeApi,
    types::{ManagedDecimal, NumDecimals},
};
use tracing::debug;

use crate::{wallet::Wallet, LendingMarket};

impl<M: ManagedTypeApi, S: ActionSink<M>> LendingMarket<M, S> {
    /// Pays back debt of `token` under `rate_mode` from the wallet.
    ///
    /// # Arguments
    /// - `wallet`: Source of the tokens.
    /// - `token`: Borrowed asset.
    /// - `rate_mode`: Which of the two debts to repay.
    /// - `amount`: Live amount, the whole debt when `None`.
    ///
    /// # Returns
    /// - The live debt left under the key.
    ///
    /// # Errors
    /// - `ERROR_NO_DEBT`: No debt stored under the key.
    /// - `ERROR_AMOUNT_MUST_BE_GREATER_THAN_ZERO`: The amount maps to a zero base amount.
    /// - `ERROR_AMOUNT_EXCEEDS_DEBT`: `amount` above the live debt.
    /// - `ERROR_INSUFFICIENT_BALANCE`: The wallet cannot cover `amount`.
    pub fn repay(
        &mut self,
        wallet: &mut impl Wallet<M>,
        token: &Token,
        rate_mode: InterestRateMode,
        amount: Option<&ManagedDecimal<M, NumDecimals>>,
    ) -> Result<ManagedDecimal<M, NumDecimals>, LendingError> {
        let token = self.registered_token(token, Operation::Repay)?;
        let key = BorrowKey::new(&token, rate_mode);
        let stored_base = self
            .ledger
            .borrow(&key)
            .map(|info| info.base_amount.clone())
            .ok_or_else(|| LendingError::invalid(Operation::Repay, token.symbol(), ERROR_NO_DEBT))?;
        let variable_borrow_index = self
            .token_status(&token, Operation::Repay)?
            .variable_borrow_index
            .clone();

        let debt_before = to_live_amount(&stored_base, &variable_borrow_index, token.decimals());
        let amount = match amount {
            Some(amount) => self.normalize_amount(&token, amount),
            None => debt_before.clone(),
        };
        if amount > debt_before {
            return Err(LendingError::invalid(
                Operation::Repay,
                token.symbol(),
                ERROR_AMOUNT_EXCEEDS_DEBT,
            ));
        }

        let base_amount = if amount == debt_before {
            stored_base
        } else {
            to_base_amount(&amount, &variable_borrow_index)
        };
        if is_zero(&base_amount) {
            return Err(LendingError::invalid(
                Operation::Repay,
                token.symbol(),
                ERROR_AMOUNT_MUST_BE_GREATER_THAN_ZERO,
            ));
        }

        wallet
            .debit(&token, &amount)
            .map_err(|err| err.with_operation(Operation::Repay))?;

        let remaining = self.ledger.subtract_borrow(&key, &base_amount);
        self.invalidate_cache();

        let debt_after = to_live_amount(&remaining, &variable_borrow_index, token.decimals());
        debug!(
            market = %self.market_id,
            %key,
            amount = %DecimalDisplay(&amount),
            debt = %DecimalDisplay(&debt_after),
            "repay"
        );

        self.record_action(LendingAction::Repay(RepayAction {
            token,
            amount,
            rate_mode,
            debt_before,
            debt_after: debt_after.clone(),
        }));

        Ok(debt_after)
    }
}
