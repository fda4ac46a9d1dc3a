use std::collections::BTreeMap;

use common_errors::{LendingError, Operation, ERROR_EMPTY_POSITION};
use common_events::ActionSink;
use common_math::is_zero;
use common_rates::{
    health_factor, loan_to_value, net_apy, net_worth, rate_to_apy, to_live_amount, token_value,
    total_value, weighted_apy, weighted_average, weighted_sum,
};
use common_structs::{Borrow, BorrowKey, LendingBalance, Supply, SupplyKey, Token};
use multiversx_sc::{
    api::ManagedTypeApi,
    types::{ManagedDecimal, ManagedDecimalSigned, NumDecimals},
};

use crate::{cache::ValueMap, LendingMarket};

impl<M: ManagedTypeApi, S: ActionSink<M>> LendingMarket<M, S> {
    /// USD value of every supply, collateral or not.
    pub fn supplies_value(&self) -> Result<&ValueMap<SupplyKey, M>, LendingError> {
        self.cache.supply_values(|| {
            let mut values = BTreeMap::new();
            for (token, info) in self.ledger.supplies() {
                let status = self.token_status(token, Operation::Query)?;
                let price = self.token_price(token, Operation::Query)?;
                let amount =
                    to_live_amount(&info.base_amount, &status.liquidity_index, token.decimals());
                values.insert(token.clone(), token_value(&amount, price));
            }
            Ok(values)
        })
    }

    /// USD value of the supplies flagged as collateral.
    pub fn collateral_value(&self) -> Result<&ValueMap<SupplyKey, M>, LendingError> {
        self.cache.collateral_values(|| {
            let supplies = self.supplies_value()?;
            let values = self
                .ledger
                .supplies()
                .iter()
                .filter(|(_, info)| info.collateral)
                .filter_map(|(token, _)| {
                    supplies
                        .get(token)
                        .map(|value| (token.clone(), value.clone()))
                })
                .collect();
            Ok(values)
        })
    }

    /// USD value of every debt. Both rate modes accrue on the variable borrow index.
    pub fn borrows_value(&self) -> Result<&ValueMap<BorrowKey, M>, LendingError> {
        self.cache.borrow_values(|| {
            let mut values = BTreeMap::new();
            for (key, info) in self.ledger.borrows() {
                let status = self.token_status(&key.token, Operation::Query)?;
                let price = self.token_price(&key.token, Operation::Query)?;
                let amount = to_live_amount(
                    &info.base_amount,
                    &status.variable_borrow_index,
                    key.token.decimals(),
                );
                values.insert(key.clone(), token_value(&amount, price));
            }
            Ok(values)
        })
    }

    pub fn total_supply_value(&self) -> Result<ManagedDecimal<M, NumDecimals>, LendingError> {
        Ok(total_value(self.supplies_value()?.values()))
    }

    pub fn total_collateral_value(&self) -> Result<ManagedDecimal<M, NumDecimals>, LendingError> {
        Ok(total_value(self.collateral_value()?.values()))
    }

    pub fn total_borrows_value(&self) -> Result<ManagedDecimal<M, NumDecimals>, LendingError> {
        Ok(total_value(self.borrows_value()?.values()))
    }

    /// Collateral weighted by liquidation threshold, WAD based.
    pub fn weighted_collateral(&self) -> Result<ManagedDecimal<M, NumDecimals>, LendingError> {
        let collateral = self.collateral_value()?;
        let mut weights = Vec::with_capacity(collateral.len());
        for (token, value) in collateral {
            let config = self.asset_config(token, Operation::Query)?;
            weights.push((value, &config.liquidation_threshold_bps));
        }
        Ok(weighted_sum(weights))
    }

    /// Collateral-weighted average liquidation threshold.
    pub fn liquidation_threshold(&self) -> Result<ManagedDecimal<M, NumDecimals>, LendingError> {
        let collateral = self.collateral_value()?;
        let mut weights = Vec::with_capacity(collateral.len());
        for (token, value) in collateral {
            let config = self.asset_config(token, Operation::Query)?;
            weights.push((value, &config.liquidation_threshold_bps));
        }
        Ok(weighted_average(weights.iter().copied()))
    }

    /// Collateral-weighted average maximum loan-to-value, the borrowing room per unit of
    /// collateral.
    pub fn current_ltv(&self) -> Result<ManagedDecimal<M, NumDecimals>, LendingError> {
        let collateral = self.collateral_value()?;
        let mut weights = Vec::with_capacity(collateral.len());
        for (token, value) in collateral {
            let config = self.asset_config(token, Operation::Query)?;
            weights.push((value, &config.loan_to_value_bps));
        }
        Ok(weighted_average(weights.iter().copied()))
    }

    /// Total debt over total collateral.
    pub fn loan_to_value(&self) -> Result<ManagedDecimal<M, NumDecimals>, LendingError> {
        Ok(loan_to_value(
            &self.total_borrows_value()?,
            &self.total_collateral_value()?,
        ))
    }

    /// `Σ(collateral * liquidation threshold) / Σ(debt)`, `u128::MAX` without debt.
    pub fn health_factor(&self) -> Result<ManagedDecimal<M, NumDecimals>, LendingError> {
        Ok(health_factor(
            &self.weighted_collateral()?,
            &self.total_borrows_value()?,
        ))
    }

    pub fn supply_apy(&self) -> Result<ManagedDecimal<M, NumDecimals>, LendingError> {
        let supplies = self.supplies_value()?;
        let mut weights = Vec::with_capacity(supplies.len());
        for (token, value) in supplies {
            let status = self.token_status(token, Operation::Query)?;
            weights.push((value, rate_to_apy(&status.liquidity_rate)));
        }
        Ok(weighted_apy(weights.iter().map(|(value, apy)| (*value, apy))))
    }

    pub fn borrow_apy(&self) -> Result<ManagedDecimal<M, NumDecimals>, LendingError> {
        let borrows = self.borrows_value()?;
        let mut weights = Vec::with_capacity(borrows.len());
        for (key, value) in borrows {
            let status = self.token_status(&key.token, Operation::Query)?;
            weights.push((value, rate_to_apy(status.borrow_rate(key.rate_mode))));
        }
        Ok(weighted_apy(weights.iter().map(|(value, apy)| (*value, apy))))
    }

    pub fn net_apy(&self) -> Result<ManagedDecimalSigned<M, NumDecimals>, LendingError> {
        Ok(net_apy(
            &self.supply_apy()?,
            &self.total_supply_value()?,
            &self.borrow_apy()?,
            &self.total_borrows_value()?,
        ))
    }

    /// Supplied value minus borrowed value.
    pub fn net_value(&self) -> Result<ManagedDecimalSigned<M, NumDecimals>, LendingError> {
        Ok(net_worth(
            &self.total_supply_value()?,
            &self.total_borrows_value()?,
        ))
    }

    pub fn get_supply(&self, token: &Token) -> Result<Option<Supply<M>>, LendingError> {
        let Some((stored, info)) = self.ledger.supplies().get_key_value(token) else {
            return Ok(None);
        };
        let status = self.token_status(stored, Operation::Query)?;
        let price = self.token_price(stored, Operation::Query)?;

        let amount = to_live_amount(&info.base_amount, &status.liquidity_index, stored.decimals());
        Ok(Some(Supply {
            value: token_value(&amount, price),
            apy: rate_to_apy(&status.liquidity_rate),
            base_amount: info.base_amount.clone(),
            collateral: info.collateral,
            amount,
            token: stored.clone(),
        }))
    }

    pub fn get_borrow(&self, key: &BorrowKey) -> Result<Option<Borrow<M>>, LendingError> {
        let Some((stored, info)) = self.ledger.borrows().get_key_value(key) else {
            return Ok(None);
        };
        let status = self.token_status(&stored.token, Operation::Query)?;
        let price = self.token_price(&stored.token, Operation::Query)?;

        let amount = to_live_amount(
            &info.base_amount,
            &status.variable_borrow_index,
            stored.token.decimals(),
        );
        Ok(Some(Borrow {
            value: token_value(&amount, price),
            apy: rate_to_apy(status.borrow_rate(stored.rate_mode)),
            base_amount: info.base_amount.clone(),
            rate_mode: stored.rate_mode,
            amount,
            token: stored.token.clone(),
        }))
    }

    pub fn supplies(&self) -> Result<BTreeMap<SupplyKey, Supply<M>>, LendingError> {
        let mut supplies = BTreeMap::new();
        for token in self.ledger.supplies().keys() {
            if let Some(supply) = self.get_supply(token)? {
                supplies.insert(token.clone(), supply);
            }
        }
        Ok(supplies)
    }

    pub fn borrows(&self) -> Result<BTreeMap<BorrowKey, Borrow<M>>, LendingError> {
        let mut borrows = BTreeMap::new();
        for key in self.ledger.borrows().keys() {
            if let Some(borrow) = self.get_borrow(key)? {
                borrows.insert(key.clone(), borrow);
            }
        }
        Ok(borrows)
    }

    /// Full account view for reporting.
    pub fn market_balance(&self) -> Result<LendingBalance<M>, LendingError> {
        let supply_balance = self.total_supply_value()?;
        let borrow_balance = self.total_borrows_value()?;
        let supply_apy = self.supply_apy()?;
        let borrow_apy = self.borrow_apy()?;

        Ok(LendingBalance {
            net_value: net_worth(&supply_balance, &borrow_balance),
            net_apy: net_apy(&supply_apy, &supply_balance, &borrow_apy, &borrow_balance),
            supplies: self.supplies()?,
            borrows: self.borrows()?,
            liquidation_threshold: self.liquidation_threshold()?,
            health_factor: self.health_factor()?,
            collateral_balance: self.total_collateral_value()?,
            current_ltv: self.current_ltv()?,
            loan_to_value: self.loan_to_value()?,
            supply_balance,
            borrow_balance,
            supply_apy,
            borrow_apy,
        })
    }

    /// Verifies that no stored entry has a zero base amount and that every position's token
    /// has a status and a price for the current step.
    pub fn check_invariants(&self) -> Result<(), LendingError> {
        for (token, info) in self.ledger.supplies() {
            if is_zero(&info.base_amount) {
                return Err(LendingError::invalid(
                    Operation::Query,
                    token.symbol(),
                    ERROR_EMPTY_POSITION,
                ));
            }
            self.token_status(token, Operation::Query)?;
            self.token_price(token, Operation::Query)?;
        }
        for (key, info) in self.ledger.borrows() {
            if is_zero(&info.base_amount) {
                return Err(LendingError::invalid(
                    Operation::Query,
                    key.token.symbol(),
                    ERROR_EMPTY_POSITION,
                ));
            }
            self.token_status(&key.token, Operation::Query)?;
            self.token_price(&key.token, Operation::Query)?;
        }
        Ok(())
    }
}
