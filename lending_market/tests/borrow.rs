use common_errors::{
    ErrorKind, ERROR_AMOUNT_MUST_BE_GREATER_THAN_ZERO, ERROR_ASSET_NOT_BORROWABLE,
    ERROR_COLLATERAL_SAME_AS_BORROWING, ERROR_HEALTH_FACTOR_TOO_LOW,
    ERROR_INSUFFICIENT_COLLATERAL, ERROR_LTV_VALIDATION_FAILED, ERROR_NO_COLLATERAL,
    ERROR_STABLE_BORROW_NOT_ENABLED,
};
use common_events::LendingAction;
use common_structs::{BorrowKey, InterestRateMode, TokenStatus};
pub mod constants;
pub mod setup;
use constants::*;
use setup::*;

#[test]
fn test_borrow_variable_against_collateral() {
    let mut state = LendingMarketTestState::new();
    state.supply_asset(&weth(), "10", true).unwrap();

    let debt = state
        .borrow_asset(&usdc(), "500", InterestRateMode::Variable)
        .unwrap();

    assert!(debt == usdc().units(500));
    assert!(state.wallet_balance(&usdc()) == usdc().units(INITIAL_USDC_BALANCE + 500));
    assert!(state.market.total_borrows_value().unwrap() == dollars(500));
    // 1000$ * 82.5% / 500$
    assert!(state.health_factor() == wad_decimal("1.65"));

    match &state.market.actions().last().unwrap().action {
        LendingAction::Borrow(action) => {
            assert_eq!(action.rate_mode, InterestRateMode::Variable);
            assert!(action.debt_before == usdc().zero());
            assert!(action.debt_after == usdc().units(500));
        },
        other => panic!("unexpected action {}", other.name()),
    }
}

#[test]
fn test_borrow_accrues_on_variable_borrow_index() {
    let mut state = LendingMarketTestState::new();
    state.supply_asset(&weth(), "10", true).unwrap();
    state
        .borrow_asset(&dai(), "400", InterestRateMode::Variable)
        .unwrap();

    state.change_status(
        &dai(),
        TokenStatus::with_indexes(wad_decimal("1"), wad_decimal("1.05")),
    );

    let borrow = state
        .market
        .get_borrow(&BorrowKey::variable(&dai()))
        .unwrap()
        .unwrap();
    assert!(borrow.amount == amount(&dai(), "420"));
    assert!(borrow.value == dollars(420));
}

#[test]
fn test_borrow_stable_of_other_asset() {
    let mut state = LendingMarketTestState::new();
    state.supply_asset(&weth(), "10", true).unwrap();

    state
        .borrow_asset(&dai(), "100", InterestRateMode::Stable)
        .unwrap();

    assert!(state.market.ledger().borrow(&BorrowKey::stable(&dai())).is_some());
    assert!(state
        .market
        .ledger()
        .borrow(&BorrowKey::variable(&dai()))
        .is_none());
}

#[test]
fn test_borrow_beyond_loan_to_value_error() {
    let mut state = LendingMarketTestState::new();
    // 1000$ of collateral, 77% loan-to-value
    state.supply_asset(&usdc(), "1000", true).unwrap();
    let wallet_before = state.wallet_balance(&dai());

    let err = state
        .borrow_asset(&dai(), "800", InterestRateMode::Variable)
        .err()
        .unwrap();

    assert_eq!(err.kind(), ErrorKind::SolvencyViolation);
    assert_eq!(err.reason(), ERROR_INSUFFICIENT_COLLATERAL);
    assert!(state.market.ledger().borrows().is_empty());
    assert!(state.wallet_balance(&dai()) == wallet_before);
    assert_eq!(state.market.actions().len(), 1);
}

#[test]
fn test_borrow_collateral_need_counts_existing_debt() {
    let mut state = LendingMarketTestState::new();
    state.supply_asset(&usdc(), "1000", true).unwrap();

    // exactly 770$ / 77% = 1000$ of collateral needed
    state
        .borrow_asset(&dai(), "770", InterestRateMode::Variable)
        .unwrap();
    // 770$ + 300$ / 77% > 1000$
    let err = state
        .borrow_asset(&dai(), "300", InterestRateMode::Variable)
        .err()
        .unwrap();

    assert_eq!(err.reason(), ERROR_INSUFFICIENT_COLLATERAL);
}

#[test]
fn test_borrow_without_collateral_error() {
    let mut state = LendingMarketTestState::new();
    state.supply_asset(&weth(), "10", false).unwrap();

    let err = state
        .borrow_asset(&usdc(), "10", InterestRateMode::Variable)
        .err()
        .unwrap();

    assert_eq!(err.kind(), ErrorKind::SolvencyViolation);
    assert_eq!(err.reason(), ERROR_NO_COLLATERAL);
}

#[test]
fn test_borrow_with_zero_loan_to_value_collateral_error() {
    let mut rows = risk_rows();
    rows[2] = asset_row(DAI_SYMBOL, 0, DAI_LIQ_THRESHOLD, DAI_LIQ_BONUS, true, true, true);
    let mut state = LendingMarketTestState::with_rows(&rows);
    state.supply_asset(&dai(), "1000", true).unwrap();

    let err = state
        .borrow_asset(&usdc(), "10", InterestRateMode::Variable)
        .err()
        .unwrap();

    assert_eq!(err.reason(), ERROR_LTV_VALIDATION_FAILED);
}

#[test]
fn test_borrow_with_low_health_factor_error() {
    let mut state = LendingMarketTestState::new();
    state.supply_asset(&weth(), "10", true).unwrap();
    state
        .borrow_asset(&usdc(), "700", InterestRateMode::Variable)
        .unwrap();

    state.change_price(&weth(), "80");

    let err = state
        .borrow_asset(&dai(), "1", InterestRateMode::Variable)
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::SolvencyViolation);
    assert_eq!(err.reason(), ERROR_HEALTH_FACTOR_TOO_LOW);
}

#[test]
fn test_borrow_not_borrowable_asset_error() {
    let mut rows = risk_rows();
    rows[0] = asset_row(
        WETH_SYMBOL,
        WETH_LTV,
        WETH_LIQ_THRESHOLD,
        WETH_LIQ_BONUS,
        true,
        false,
        false,
    );
    let mut state = LendingMarketTestState::with_rows(&rows);
    state.supply_asset(&usdc(), "10000", true).unwrap();

    let err = state
        .borrow_asset(&weth(), "1", InterestRateMode::Variable)
        .err()
        .unwrap();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(err.reason(), ERROR_ASSET_NOT_BORROWABLE);
}

#[test]
fn test_borrow_stable_not_enabled_error() {
    let mut state = LendingMarketTestState::new();
    state.supply_asset(&usdc(), "10000", true).unwrap();

    let err = state
        .borrow_asset(&weth(), "1", InterestRateMode::Stable)
        .err()
        .unwrap();

    assert_eq!(err.reason(), ERROR_STABLE_BORROW_NOT_ENABLED);
    assert!(state.market.ledger().borrows().is_empty());
}

#[test]
fn test_borrow_stable_not_enabled_reported_before_collateral_check() {
    let mut state = LendingMarketTestState::new();
    state.supply_asset(&usdc(), "10", true).unwrap();

    // 10$ of collateral cannot back 100$, the stable capability fails first
    let err = state
        .borrow_asset(&weth(), "1", InterestRateMode::Stable)
        .err()
        .unwrap();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(err.reason(), ERROR_STABLE_BORROW_NOT_ENABLED);

    let err = state
        .borrow_asset(&weth(), "1", InterestRateMode::Variable)
        .err()
        .unwrap();
    assert_ne!(err.reason(), ERROR_STABLE_BORROW_NOT_ENABLED);
    assert!(state.market.ledger().borrows().is_empty());
}

#[test]
fn test_borrow_stable_same_asset_as_collateral_error() {
    let mut state = LendingMarketTestState::new();
    state.supply_asset(&usdc(), "1000", true).unwrap();

    let err = state
        .borrow_asset(&usdc(), "100", InterestRateMode::Stable)
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(err.reason(), ERROR_COLLATERAL_SAME_AS_BORROWING);

    // variable debt is not subject to the same-asset rule
    state
        .borrow_asset(&usdc(), "100", InterestRateMode::Variable)
        .unwrap();
}

#[test]
fn test_borrow_zero_amount_error() {
    let mut state = LendingMarketTestState::new();
    state.supply_asset(&weth(), "10", true).unwrap();

    let err = state
        .borrow_asset(&usdc(), "0", InterestRateMode::Variable)
        .err()
        .unwrap();

    assert_eq!(err.reason(), ERROR_AMOUNT_MUST_BE_GREATER_THAN_ZERO);
}
