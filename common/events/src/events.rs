use multiversx_sc::{
    api::ManagedTypeApi,
    types::{ManagedDecimal, NumDecimals},
};

pub use common_structs::*;

#[derive(Clone)]
pub struct SupplyAction<M: ManagedTypeApi> {
    pub token: Token,
    pub amount: ManagedDecimal<M, NumDecimals>,
    pub collateral: bool,
    pub deposit_before: ManagedDecimal<M, NumDecimals>,
    pub deposit_after: ManagedDecimal<M, NumDecimals>,
}

#[derive(Clone)]
pub struct WithdrawAction<M: ManagedTypeApi> {
    pub token: Token,
    pub amount: ManagedDecimal<M, NumDecimals>,
    pub deposit_before: ManagedDecimal<M, NumDecimals>,
    pub deposit_after: ManagedDecimal<M, NumDecimals>,
}

#[derive(Clone)]
pub struct BorrowAction<M: ManagedTypeApi> {
    pub token: Token,
    pub amount: ManagedDecimal<M, NumDecimals>,
    pub rate_mode: InterestRateMode,
    pub debt_before: ManagedDecimal<M, NumDecimals>,
    pub debt_after: ManagedDecimal<M, NumDecimals>,
}

#[derive(Clone)]
pub struct RepayAction<M: ManagedTypeApi> {
    pub token: Token,
    pub amount: ManagedDecimal<M, NumDecimals>,
    pub rate_mode: InterestRateMode,
    pub debt_before: ManagedDecimal<M, NumDecimals>,
    pub debt_after: ManagedDecimal<M, NumDecimals>,
}

#[derive(Clone)]
pub struct CollateralChangeAction {
    pub token: Token,
    pub collateral: bool,
}

/// One applied liquidation. Amounts are in the unit of their token, health factors WAD.
#[derive(Clone)]
pub struct LiquidationAction<M: ManagedTypeApi> {
    pub collateral_token: Token,
    pub debt_token: Token,
    pub debt_to_cover: ManagedDecimal<M, NumDecimals>,
    pub collateral_used: ManagedDecimal<M, NumDecimals>,
    pub variable_debt_liquidated: ManagedDecimal<M, NumDecimals>,
    pub stable_debt_liquidated: ManagedDecimal<M, NumDecimals>,
    pub health_factor_before: ManagedDecimal<M, NumDecimals>,
    pub health_factor_after: ManagedDecimal<M, NumDecimals>,
    pub collateral_after: ManagedDecimal<M, NumDecimals>,
    pub variable_debt_after: ManagedDecimal<M, NumDecimals>,
    pub stable_debt_after: ManagedDecimal<M, NumDecimals>,
}

#[derive(Clone)]
pub enum LendingAction<M: ManagedTypeApi> {
    Supply(SupplyAction<M>),
    Withdraw(WithdrawAction<M>),
    Borrow(BorrowAction<M>),
    Repay(RepayAction<M>),
    CollateralChange(CollateralChangeAction),
    Liquidation(LiquidationAction<M>),
}

impl<M: ManagedTypeApi> LendingAction<M> {
    pub fn name(&self) -> &'static str {
        match self {
            LendingAction::Supply(_) => "supply",
            LendingAction::Withdraw(_) => "withdraw",
            LendingAction::Borrow(_) => "borrow",
            LendingAction::Repay(_) => "repay",
            LendingAction::CollateralChange(_) => "collateral_change",
            LendingAction::Liquidation(_) => "liquidation",
        }
    }
}

/// An action stamped with the step it happened in and the market it happened on.
#[derive(Clone)]
pub struct ActionRecord<M: ManagedTypeApi> {
    pub timestamp: u64,
    pub market: String,
    pub action: LendingAction<M>,
}

/// Receiver of completed operations. Only successful operations are ever recorded.
pub trait ActionSink<M: ManagedTypeApi> {
    fn record(&mut self, record: ActionRecord<M>);
}

/// In-memory action log, kept in insertion order.
#[derive(Clone)]
pub struct ActionLog<M: ManagedTypeApi> {
    records: Vec<ActionRecord<M>>,
}

impl<M: ManagedTypeApi> Default for ActionLog<M> {
    fn default() -> Self {
        ActionLog {
            records: Vec::new(),
        }
    }
}

impl<M: ManagedTypeApi> ActionLog<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ActionRecord<M>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&ActionRecord<M>> {
        self.records.last()
    }

    /// Hands the collected records to the caller and starts over.
    pub fn take(&mut self) -> Vec<ActionRecord<M>> {
        core::mem::take(&mut self.records)
    }
}

impl<M: ManagedTypeApi> ActionSink<M> for ActionLog<M> {
    fn record(&mut self, record: ActionRecord<M>) {
        tracing::trace!(
            market = %record.market,
            timestamp = record.timestamp,
            action = record.action.name(),
            "action recorded"
        );
        self.records.push(record);
    }
}
