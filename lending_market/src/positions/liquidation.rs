use std::{collections::BTreeSet, fmt};

use common_constants::{BPS, RAY_PRECISION};
use common_errors::{LendingError, Operation};
use common_events::{ActionSink, LendingAction, LiquidationAction};
use common_math::{
    div_half_up, get_min, is_zero, mul_half_up, ray_zero, rescale_half_up, wad, DecimalDisplay,
};
use common_rates::{bonus_multiplier, close_factor, to_base_amount, to_live_amount};
use common_structs::{BorrowKey, Token};
use multiversx_sc::{
    api::ManagedTypeApi,
    types::{ManagedDecimal, NumDecimals},
};
use rand::Rng;
use tracing::{debug, info};

use crate::LendingMarket;

/// Where a liquidation pass stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidationState {
    /// Health factor at or above 1.
    Healthy,
    /// Health factor below 1, nothing attempted yet.
    Liquidatable,
    /// Candidates are being liquidated.
    Resolving,
    /// Health factor still below 1 and no eligible debt/collateral pair left.
    Exhausted,
}

/// Why a debt/collateral pair was not liquidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidationRejection {
    /// Zero liquidation threshold, collateral flag off or nothing supplied.
    CollateralNotEnabled,
    /// No debt of the token in either rate mode.
    NoDebt,
    /// The debt to cover rounds to zero.
    NothingToCover,
    /// One of the two tokens is priced at zero.
    ZeroPrice,
}

impl fmt::Display for LiquidationRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiquidationRejection::CollateralNotEnabled => {
                f.write_str("collateral cannot be liquidated")
            },
            LiquidationRejection::NoDebt => f.write_str("specified currency not borrowed"),
            LiquidationRejection::NothingToCover => f.write_str("nothing to cover"),
            LiquidationRejection::ZeroPrice => f.write_str("token priced at zero"),
        }
    }
}

#[derive(Clone)]
pub enum LiquidationOutcome<M: ManagedTypeApi> {
    Applied(LiquidationAction<M>),
    Rejected(LiquidationRejection),
}

impl<M: ManagedTypeApi> LiquidationOutcome<M> {
    pub fn is_applied(&self) -> bool {
        matches!(self, LiquidationOutcome::Applied(_))
    }
}

/// Result of one call to [`LendingMarket::update`].
#[derive(Clone)]
pub struct LiquidationReport<M: ManagedTypeApi> {
    pub state: LiquidationState,
    /// The skip draw decided not to run the pass.
    pub skipped: bool,
    pub applied: Vec<LiquidationAction<M>>,
    pub rejected: Vec<(BorrowKey, LiquidationRejection)>,
    /// Health factor once the pass is over, WAD based.
    pub health_factor: ManagedDecimal<M, NumDecimals>,
}

impl<M: ManagedTypeApi, S: ActionSink<M>> LendingMarket<M, S> {
    /// Runs the liquidation pass for the current step.
    ///
    /// The pass only runs when the seeded draw falls below the configured probability. While
    /// the health factor is below 1, the smallest debt not yet attempted in this pass is
    /// liquidated against the largest collateral. Each debt key is attempted at most once per
    /// pass, so a position can remain below 1 once every key was tried.
    ///
    /// # Returns
    /// - The report of the pass, also kept as [`LendingMarket::last_liquidation`].
    pub fn update(&mut self) -> Result<LiquidationReport<M>, LendingError> {
        let draw = self.rng.random_range(0..BPS as u64);
        let skipped = draw >= self.liquidation_probability_bps;

        let mut health_factor = self.health_factor()?;
        let mut state = if health_factor < wad() {
            LiquidationState::Liquidatable
        } else {
            LiquidationState::Healthy
        };
        let mut applied = Vec::new();
        let mut rejected = Vec::new();

        if skipped {
            debug!(market = %self.market_id, draw, "liquidation pass skipped");
        } else {
            let mut attempted = BTreeSet::new();
            while health_factor < wad() {
                state = LiquidationState::Resolving;

                let Some((debt_key, collateral_token)) = self.next_liquidation_pair(&attempted)?
                else {
                    state = LiquidationState::Exhausted;
                    debug!(
                        market = %self.market_id,
                        health_factor = %DecimalDisplay(&health_factor),
                        "liquidation pass exhausted"
                    );
                    break;
                };
                attempted.insert(debt_key.clone());

                let debt_to_cover = self.debt_amount(&debt_key, Operation::Liquidation)?;
                match self.liquidate(
                    &collateral_token,
                    &debt_key.token,
                    &debt_to_cover,
                    &health_factor,
                )? {
                    LiquidationOutcome::Applied(action) => {
                        info!(
                            market = %self.market_id,
                            collateral = %action.collateral_token,
                            debt = %action.debt_token,
                            collateral_used = %DecimalDisplay(&action.collateral_used),
                            health_factor_before = %DecimalDisplay(&action.health_factor_before),
                            health_factor_after = %DecimalDisplay(&action.health_factor_after),
                            "liquidated"
                        );
                        applied.push(action);
                    },
                    LiquidationOutcome::Rejected(reason) => {
                        debug!(
                            market = %self.market_id,
                            %debt_key,
                            collateral = %collateral_token,
                            %reason,
                            "liquidation rejected"
                        );
                        rejected.push((debt_key, reason));
                    },
                }

                health_factor = self.health_factor()?;
            }
            if health_factor >= wad() {
                state = LiquidationState::Healthy;
            }
        }

        let report = LiquidationReport {
            state,
            skipped,
            applied,
            rejected,
            health_factor,
        };
        self.last_liquidation = Some(report.clone());
        Ok(report)
    }

    /// Picks the smallest debt not in `attempted` and the largest collateral supply. Ties go
    /// to the first key in ledger order.
    fn next_liquidation_pair(
        &self,
        attempted: &BTreeSet<BorrowKey>,
    ) -> Result<Option<(BorrowKey, Token)>, LendingError> {
        let mut smallest_debt: Option<(&BorrowKey, &ManagedDecimal<M, NumDecimals>)> = None;
        for (key, value) in self.borrows_value()? {
            if attempted.contains(key) {
                continue;
            }
            if smallest_debt.map_or(true, |(_, smallest)| value < smallest) {
                smallest_debt = Some((key, value));
            }
        }

        let mut largest_collateral: Option<(&Token, &ManagedDecimal<M, NumDecimals>)> = None;
        for (token, value) in self.collateral_value()? {
            if largest_collateral.map_or(true, |(_, largest)| value > largest) {
                largest_collateral = Some((token, value));
            }
        }

        Ok(match (smallest_debt, largest_collateral) {
            (Some((key, _)), Some((token, _))) => Some((key.clone(), token.clone())),
            _ => None,
        })
    }

    /// Repays up to `debt_to_cover` of `debt_token` by seizing `collateral_token`.
    ///
    /// **Formula**:
    /// - `actual_debt = min(debt_to_cover, total_debt * close_factor)`
    /// - `seized = actual_debt * price_debt / price_collateral * (1 + bonus)`
    /// - When `seized` exceeds the collateral, the whole collateral is seized and
    ///   `actual_debt = collateral * price_collateral / (price_debt * (1 + bonus))`.
    ///
    /// Variable debt is reduced first, stable debt only takes what variable debt cannot.
    ///
    /// # Arguments
    /// - `collateral_token`: Supply to seize.
    /// - `debt_token`: Debt to repay, both rate modes.
    /// - `debt_to_cover`: Live amount the liquidator offers to repay.
    /// - `health_factor`: Health factor before the liquidation, decides the close factor.
    ///
    /// # Returns
    /// - `Applied` with the record of the liquidation, or `Rejected` without any mutation.
    pub fn liquidate(
        &mut self,
        collateral_token: &Token,
        debt_token: &Token,
        debt_to_cover: &ManagedDecimal<M, NumDecimals>,
        health_factor: &ManagedDecimal<M, NumDecimals>,
    ) -> Result<LiquidationOutcome<M>, LendingError> {
        let collateral_token = self.registered_token(collateral_token, Operation::Liquidation)?;
        let debt_token = self.registered_token(debt_token, Operation::Liquidation)?;

        let variable_key = BorrowKey::variable(&debt_token);
        let stable_key = BorrowKey::stable(&debt_token);
        let variable_debt = self.debt_amount(&variable_key, Operation::Liquidation)?;
        let stable_debt = self.debt_amount(&stable_key, Operation::Liquidation)?;
        let total_debt = variable_debt.clone() + stable_debt.clone();

        let max_liquidatable_debt = rescale_half_up(
            &mul_half_up(&total_debt, &close_factor(health_factor), RAY_PRECISION),
            debt_token.decimals(),
        );
        let mut actual_debt = get_min(
            self.normalize_amount(&debt_token, debt_to_cover),
            max_liquidatable_debt,
        );

        let config = self.asset_config(&collateral_token, Operation::Liquidation)?;
        let is_collateral_enabled = config.has_liquidation_threshold()
            && self
                .ledger
                .supply(&collateral_token)
                .is_some_and(|info| info.collateral);
        let bonus = bonus_multiplier(&config.liquidation_bonus_bps);

        if !is_collateral_enabled {
            return Ok(LiquidationOutcome::Rejected(
                LiquidationRejection::CollateralNotEnabled,
            ));
        }
        if is_zero(&total_debt) {
            return Ok(LiquidationOutcome::Rejected(LiquidationRejection::NoDebt));
        }
        if is_zero(&actual_debt) {
            return Ok(LiquidationOutcome::Rejected(
                LiquidationRejection::NothingToCover,
            ));
        }

        let debt_price = self.token_price(&debt_token, Operation::Liquidation)?.clone();
        let collateral_price = self
            .token_price(&collateral_token, Operation::Liquidation)?
            .clone();
        if is_zero(&debt_price) || is_zero(&collateral_price) {
            return Ok(LiquidationOutcome::Rejected(LiquidationRejection::ZeroPrice));
        }

        let liquidity_index = self
            .token_status(&collateral_token, Operation::Liquidation)?
            .liquidity_index
            .clone();
        let variable_borrow_index = self
            .token_status(&debt_token, Operation::Liquidation)?
            .variable_borrow_index
            .clone();
        let collateral_balance =
            self.deposited_amount(&collateral_token, Operation::Liquidation)?;

        let should_seize = div_half_up(
            &mul_half_up(&actual_debt, &debt_price, RAY_PRECISION),
            &collateral_price,
            RAY_PRECISION,
        );
        let max_collateral_to_seize = rescale_half_up(
            &mul_half_up(&should_seize, &bonus, RAY_PRECISION),
            collateral_token.decimals(),
        );

        let collateral_used = if max_collateral_to_seize > collateral_balance {
            let covered = div_half_up(
                &mul_half_up(&collateral_balance, &collateral_price, RAY_PRECISION),
                &mul_half_up(&debt_price, &bonus, RAY_PRECISION),
                RAY_PRECISION,
            );
            actual_debt = get_min(
                actual_debt,
                rescale_half_up(&covered, debt_token.decimals()),
            );
            collateral_balance
        } else {
            max_collateral_to_seize
        };

        let remaining_collateral =
            self.seize_collateral(&collateral_token, &collateral_used, &liquidity_index);

        let (variable_liquidated, stable_liquidated) = if variable_debt > actual_debt {
            (actual_debt.clone(), debt_token.zero())
        } else {
            let remainder = actual_debt.clone() - variable_debt.clone();
            (variable_debt.clone(), get_min(remainder, stable_debt.clone()))
        };
        let remaining_variable = self.settle_debt(
            &variable_key,
            &variable_liquidated,
            &variable_debt,
            &variable_borrow_index,
        );
        let remaining_stable = self.settle_debt(
            &stable_key,
            &stable_liquidated,
            &stable_debt,
            &variable_borrow_index,
        );
        self.invalidate_cache();

        let action = LiquidationAction {
            debt_to_cover: rescale_half_up(debt_to_cover, debt_token.decimals()),
            collateral_used,
            variable_debt_liquidated: variable_liquidated,
            stable_debt_liquidated: stable_liquidated,
            health_factor_before: health_factor.clone(),
            health_factor_after: self.health_factor()?,
            collateral_after: to_live_amount(
                &remaining_collateral,
                &liquidity_index,
                collateral_token.decimals(),
            ),
            variable_debt_after: to_live_amount(
                &remaining_variable,
                &variable_borrow_index,
                debt_token.decimals(),
            ),
            stable_debt_after: to_live_amount(
                &remaining_stable,
                &variable_borrow_index,
                debt_token.decimals(),
            ),
            collateral_token,
            debt_token,
        };
        self.record_action(LendingAction::Liquidation(action.clone()));

        Ok(LiquidationOutcome::Applied(action))
    }

    /// Removes `amount` from the supply of `token`, the whole entry when `amount` is the full
    /// deposit. Returns the base amount left.
    fn seize_collateral(
        &mut self,
        token: &Token,
        amount: &ManagedDecimal<M, NumDecimals>,
        liquidity_index: &ManagedDecimal<M, NumDecimals>,
    ) -> ManagedDecimal<M, NumDecimals> {
        let Some(info) = self.ledger.supply(token) else {
            return ray_zero();
        };
        let deposit = to_live_amount(&info.base_amount, liquidity_index, token.decimals());
        if amount >= &deposit {
            self.ledger.remove_supply(token);
            return ray_zero();
        }
        self.ledger
            .subtract_supply(token, &to_base_amount(amount, liquidity_index))
    }

    /// Removes `amount` of live debt stored under `key`. Returns the base amount left.
    fn settle_debt(
        &mut self,
        key: &BorrowKey,
        amount: &ManagedDecimal<M, NumDecimals>,
        debt: &ManagedDecimal<M, NumDecimals>,
        variable_borrow_index: &ManagedDecimal<M, NumDecimals>,
    ) -> ManagedDecimal<M, NumDecimals> {
        if amount >= debt {
            self.ledger.remove_borrow(key);
            return ray_zero();
        }
        if is_zero(amount) {
            return self
                .ledger
                .borrow(key)
                .map(|info| info.base_amount.clone())
                .unwrap_or_else(ray_zero);
        }
        self.ledger
            .subtract_borrow(key, &to_base_amount(amount, variable_borrow_index))
    }
}
