pub mod borrow;
pub mod collateral;
pub mod liquidation;
pub mod repay;
pub mod supply;
pub mod withdraw;

use common_errors::{LendingError, Operation};
use common_events::ActionSink;
use common_rates::to_live_amount;
use common_structs::{BorrowKey, Token};
use multiversx_sc::{
    api::ManagedTypeApi,
    types::{ManagedDecimal, NumDecimals},
};

use crate::LendingMarket;

impl<M: ManagedTypeApi, S: ActionSink<M>> LendingMarket<M, S> {
    /// Live deposit of `token`, zero when nothing is supplied.
    pub(crate) fn deposited_amount(
        &self,
        token: &Token,
        operation: Operation,
    ) -> Result<ManagedDecimal<M, NumDecimals>, LendingError> {
        let Some(info) = self.ledger.supply(token) else {
            return Ok(token.zero());
        };
        let status = self.token_status(token, operation)?;
        Ok(to_live_amount(
            &info.base_amount,
            &status.liquidity_index,
            token.decimals(),
        ))
    }

    /// Live debt stored under `key`, zero when nothing is borrowed.
    pub(crate) fn debt_amount(
        &self,
        key: &BorrowKey,
        operation: Operation,
    ) -> Result<ManagedDecimal<M, NumDecimals>, LendingError> {
        let Some(info) = self.ledger.borrow(key) else {
            return Ok(key.token.zero());
        };
        let status = self.token_status(&key.token, operation)?;
        Ok(to_live_amount(
            &info.base_amount,
            &status.variable_borrow_index,
            key.token.decimals(),
        ))
    }
}
