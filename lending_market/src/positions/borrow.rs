use common_constants::{RAY_PRECISION, WAD_PRECISION};
use common_errors::{
    LendingError, Operation, ERROR_ASSET_NOT_BORROWABLE, ERROR_COLLATERAL_SAME_AS_BORROWING,
    ERROR_HEALTH_FACTOR_TOO_LOW, ERROR_INSUFFICIENT_COLLATERAL, ERROR_LTV_VALIDATION_FAILED,
    ERROR_NO_COLLATERAL, ERROR_STABLE_BORROW_NOT_ENABLED,
};
use common_events::{ActionSink, BorrowAction, LendingAction};
use common_math::{div_half_up, is_zero, rescale_half_up, wad, DecimalDisplay};
use common_rates::{to_base_amount, token_value};
use common_structs::{BorrowKey, InterestRateMode, Token};
use multiversx_sc::{
    api::ManagedTypeApi,
    types::{ManagedDecimal, NumDecimals},
};
use tracing::{debug, warn};

use crate::{wallet::Wallet, LendingMarket};

impl<M: ManagedTypeApi, S: ActionSink<M>> LendingMarket<M, S> {
    /// Opens or grows a debt of `token` and credits the borrowed amount to the wallet.
    ///
    /// # Arguments
    /// - `wallet`: Receiver of the tokens.
    /// - `token`: Borrowed asset.
    /// - `amount`: Live amount, rounded to the token's precision.
    /// - `rate_mode`: Stable or variable debt.
    ///
    /// # Returns
    /// - The resulting live debt under (`token`, `rate_mode`).
    pub fn borrow(
        &mut self,
        wallet: &mut impl Wallet<M>,
        token: &Token,
        amount: &ManagedDecimal<M, NumDecimals>,
        rate_mode: InterestRateMode,
    ) -> Result<ManagedDecimal<M, NumDecimals>, LendingError> {
        let token = self.registered_token(token, Operation::Borrow)?;
        let amount = self.normalize_amount(&token, amount);
        self.require_amount_greater_than_zero(&token, &amount, Operation::Borrow)?;

        let config = self.asset_config(&token, Operation::Borrow)?;
        if !config.can_borrow() {
            return Err(LendingError::invalid(
                Operation::Borrow,
                token.symbol(),
                ERROR_ASSET_NOT_BORROWABLE,
            ));
        }
        let can_borrow_stable = config.can_borrow_stable();

        if rate_mode == InterestRateMode::Stable {
            if !can_borrow_stable {
                return Err(LendingError::invalid(
                    Operation::Borrow,
                    token.symbol(),
                    ERROR_STABLE_BORROW_NOT_ENABLED,
                ));
            }
            self.require_not_borrowing_own_collateral(&*wallet, &token, &amount)?;
        }

        let price = self.token_price(&token, Operation::Borrow)?.clone();
        let variable_borrow_index = self
            .token_status(&token, Operation::Borrow)?
            .variable_borrow_index
            .clone();

        self.validate_borrow_collateral(&token, &token_value(&amount, &price))?;

        let key = BorrowKey::new(&token, rate_mode);
        let debt_before = self.debt_amount(&key, Operation::Borrow)?;

        self.ledger
            .add_borrow(&key, to_base_amount(&amount, &variable_borrow_index));
        self.invalidate_cache();
        wallet.credit(&token, &amount);

        let debt_after = self.debt_amount(&key, Operation::Borrow)?;
        debug!(
            market = %self.market_id,
            %key,
            amount = %DecimalDisplay(&amount),
            debt = %DecimalDisplay(&debt_after),
            "borrow"
        );

        self.record_action(LendingAction::Borrow(BorrowAction {
            token,
            amount,
            rate_mode,
            debt_before,
            debt_after: debt_after.clone(),
        }));

        Ok(debt_after)
    }

    /// Checks that the current collateral can carry a new debt worth `value`.
    ///
    /// **Formula**: `debt_value + value / current_ltv <= collateral_value`
    ///
    /// # Errors
    /// - `ERROR_NO_COLLATERAL`: No collateral posted.
    /// - `ERROR_LTV_VALIDATION_FAILED`: The collateral grants no borrowing room.
    /// - `ERROR_HEALTH_FACTOR_TOO_LOW`: Health factor not above 1.
    /// - `ERROR_INSUFFICIENT_COLLATERAL`: The projected need exceeds the collateral.
    fn validate_borrow_collateral(
        &self,
        token: &Token,
        value: &ManagedDecimal<M, NumDecimals>,
    ) -> Result<(), LendingError> {
        let collateral_value = self.total_collateral_value()?;
        if is_zero(&collateral_value) {
            return Err(self.reject_borrow(token, ERROR_NO_COLLATERAL));
        }

        let current_ltv = self.current_ltv()?;
        if is_zero(&current_ltv) {
            return Err(self.reject_borrow(token, ERROR_LTV_VALIDATION_FAILED));
        }

        if self.health_factor()? <= wad() {
            return Err(self.reject_borrow(token, ERROR_HEALTH_FACTOR_TOO_LOW));
        }

        let collateral_needed = self.total_borrows_value()?
            + rescale_half_up(
                &div_half_up(value, &current_ltv, RAY_PRECISION),
                WAD_PRECISION,
            );
        if collateral_needed > collateral_value {
            warn!(
                market = %self.market_id,
                %token,
                needed = %DecimalDisplay(&collateral_needed),
                collateral = %DecimalDisplay(&collateral_value),
                "rejected, collateral cannot cover new borrow"
            );
            return Err(LendingError::solvency(
                Operation::Borrow,
                token.symbol(),
                ERROR_INSUFFICIENT_COLLATERAL,
            ));
        }
        Ok(())
    }

    /// Stable debt may not be taken against the same asset posted as collateral, unless the
    /// asset grants no borrowing room or the amount exceeds what the wallet holds.
    fn require_not_borrowing_own_collateral(
        &self,
        wallet: &impl Wallet<M>,
        token: &Token,
        amount: &ManagedDecimal<M, NumDecimals>,
    ) -> Result<(), LendingError> {
        let is_using_as_collateral = self
            .ledger
            .supply(token)
            .is_some_and(|info| info.collateral);
        if !is_using_as_collateral {
            return Ok(());
        }

        let has_loan_to_value = self
            .asset_config(token, Operation::Borrow)?
            .has_loan_to_value();
        if has_loan_to_value && amount <= &wallet.balance(token) {
            return Err(LendingError::invalid(
                Operation::Borrow,
                token.symbol(),
                ERROR_COLLATERAL_SAME_AS_BORROWING,
            ));
        }
        Ok(())
    }

    fn reject_borrow(&self, token: &Token, reason: &'static str) -> LendingError {
        warn!(market = %self.market_id, %token, reason, "borrow rejected");
        LendingError::solvency(Operation::Borrow, token.symbol(), reason)
    }
}
