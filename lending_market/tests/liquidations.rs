use common_events::LendingAction;
use common_structs::{BorrowKey, InterestRateMode};
use lending_market::{LiquidationOutcome, LiquidationRejection, LiquidationState};
pub mod constants;
pub mod setup;
use constants::*;
use setup::*;

/// 10 WETH at 100$ backing 800 USDC.
fn state_with_weth_collateral_and_usdc_debt() -> LendingMarketTestState {
    let mut state = LendingMarketTestState::new();
    state.supply_asset(&weth(), "10", true).unwrap();
    state
        .borrow_asset(&usdc(), "800", InterestRateMode::Variable)
        .unwrap();
    state
}

#[test]
fn test_healthy_position_is_left_alone() {
    let mut state = state_with_weth_collateral_and_usdc_debt();

    let report = state.run_liquidations();

    assert_eq!(report.state, LiquidationState::Healthy);
    assert!(!report.skipped);
    assert!(report.applied.is_empty());
    assert!(report.rejected.is_empty());
    assert_eq!(state.market.actions().len(), 2);
}

#[test]
fn test_liquidation_seizure_capped_by_collateral_balance() {
    let mut state = state_with_weth_collateral_and_usdc_debt();
    // 800 USDC / 70$ * 1.05 = 12 WETH to seize, only 10 held
    state.change_price(&weth(), "70");
    assert!(state.health_factor() == wad_decimal("0.721875"));

    let report = state.run_liquidations();

    assert_eq!(report.state, LiquidationState::Exhausted);
    assert_eq!(report.applied.len(), 1);
    let action = &report.applied[0];
    assert_eq!(action.collateral_token, weth());
    assert_eq!(action.debt_token, usdc());
    assert!(action.debt_to_cover == usdc().units(800));
    assert!(action.collateral_used == weth().units(10));
    // 10 WETH * 70$ / (1$ * 1.05)
    assert!(action.variable_debt_liquidated == amount(&usdc(), "666.666667"));
    assert!(action.stable_debt_liquidated == usdc().zero());
    assert!(action.variable_debt_after == amount(&usdc(), "133.333333"));
    assert!(action.collateral_after == weth().zero());
    assert!(action.health_factor_before == wad_decimal("0.721875"));
    assert!(action.health_factor_after == dollars(0));

    assert!(state.market.ledger().supply(&weth()).is_none());
    state.market.check_invariants().unwrap();
    assert!(matches!(
        &state.market.actions().last().unwrap().action,
        LendingAction::Liquidation(_)
    ));
}

#[test]
fn test_half_close_factor_above_threshold() {
    let mut state = state_with_weth_collateral_and_usdc_debt();
    // HF = 950$ * 82.5% / 800$ = 0.9796875
    state.change_price(&weth(), "95");

    let report = state.run_liquidations();

    assert_eq!(report.state, LiquidationState::Healthy);
    assert_eq!(report.applied.len(), 1);
    let action = &report.applied[0];
    assert!(action.variable_debt_liquidated == usdc().units(400));
    assert!(action.collateral_used == amount(&weth(), "4.421052631578947368"));
    assert!(action.collateral_after == amount(&weth(), "5.578947368421052632"));
    assert!(action.variable_debt_after == usdc().units(400));
    assert!(state.health_factor() > wad_decimal("1"));
}

#[test]
fn test_half_close_factor_leaves_position_for_next_pass() {
    let mut rows = risk_rows();
    rows[0] = asset_row(WETH_SYMBOL, 8500, 9000, 1000, true, true, false);
    let mut state = LendingMarketTestState::with_rows(&rows);
    state.supply_asset(&weth(), "10", true).unwrap();
    state
        .borrow_asset(&usdc(), "850", InterestRateMode::Variable)
        .unwrap();
    // HF = 920$ * 90% / 850$ = 0.9741...
    state.change_price(&weth(), "92");

    let report = state.run_liquidations();

    // the only debt key was tried once and the position is still under water
    assert_eq!(report.state, LiquidationState::Exhausted);
    assert_eq!(report.applied.len(), 1);
    assert!(report.applied[0].variable_debt_liquidated == usdc().units(425));
    assert!(report.applied[0].variable_debt_after == usdc().units(425));
    assert!(state.health_factor() == wad_decimal("0.958235294117647059"));
    assert!(state.market.ledger().supply(&weth()).is_some());

    let report = state.run_liquidations();

    assert_eq!(report.state, LiquidationState::Exhausted);
    assert_eq!(report.applied.len(), 1);
    assert!(report.applied[0].variable_debt_liquidated == amount(&usdc(), "212.5"));
}

#[test]
fn test_smallest_debt_is_liquidated_first() {
    let mut state = LendingMarketTestState::new();
    state.supply_asset(&weth(), "10", true).unwrap();
    state
        .borrow_asset(&dai(), "100", InterestRateMode::Variable)
        .unwrap();
    state
        .borrow_asset(&usdc(), "600", InterestRateMode::Variable)
        .unwrap();
    state.change_price(&weth(), "70");

    let report = state.run_liquidations();

    assert_eq!(report.state, LiquidationState::Exhausted);
    assert_eq!(report.applied.len(), 2);
    assert_eq!(report.applied[0].debt_token, dai());
    assert!(report.applied[0].collateral_used == amount(&weth(), "1.5"));
    assert!(report.applied[0].variable_debt_after == dai().zero());
    assert_eq!(report.applied[1].debt_token, usdc());
    assert!(report.applied[1].collateral_used == amount(&weth(), "8.5"));
    assert!(report.applied[1].variable_debt_liquidated == amount(&usdc(), "566.666667"));

    assert!(state.market.ledger().borrow(&BorrowKey::variable(&dai())).is_none());
    assert!(state.market.ledger().supply(&weth()).is_none());
}

#[test]
fn test_liquidation_spills_from_variable_into_stable_debt() {
    let mut state = LendingMarketTestState::new();
    state.supply_asset(&weth(), "10", true).unwrap();
    state
        .borrow_asset(&dai(), "300", InterestRateMode::Variable)
        .unwrap();
    state
        .borrow_asset(&dai(), "400", InterestRateMode::Stable)
        .unwrap();
    state.change_price(&weth(), "70");
    let health_factor = state.health_factor();

    let outcome = state
        .market
        .liquidate(&weth(), &dai(), &dai().units(700), &health_factor)
        .unwrap();

    let LiquidationOutcome::Applied(action) = outcome else {
        panic!("liquidation rejected");
    };
    assert!(action.collateral_used == weth().units(10));
    assert!(action.variable_debt_liquidated == dai().units(300));
    assert!(action.stable_debt_liquidated == amount(&dai(), "366.666666666666666667"));
    assert!(action.variable_debt_after == dai().zero());
    assert!(action.stable_debt_after == amount(&dai(), "33.333333333333333333"));
    assert!(state.market.ledger().borrow(&BorrowKey::variable(&dai())).is_none());
    assert!(state.market.ledger().borrow(&BorrowKey::stable(&dai())).is_some());
}

#[test]
fn test_liquidation_without_debt_is_rejected() {
    let mut state = state_with_weth_collateral_and_usdc_debt();
    state.change_price(&weth(), "70");
    let health_factor = state.health_factor();
    let generation = state.market.cache_generation();

    let outcome = state
        .market
        .liquidate(&weth(), &dai(), &dai().units(100), &health_factor)
        .unwrap();

    assert!(matches!(
        outcome,
        LiquidationOutcome::Rejected(LiquidationRejection::NoDebt)
    ));
    assert_eq!(state.market.cache_generation(), generation);
    assert!(state.market.get_supply(&weth()).unwrap().unwrap().amount == weth().units(10));
}

#[test]
fn test_collateral_without_threshold_is_rejected_and_pass_exhausts() {
    let mut rows = risk_rows();
    rows[2] = asset_row(DAI_SYMBOL, 0, 0, 0, true, true, true);
    let mut state = LendingMarketTestState::with_rows(&rows);
    state.supply_asset(&weth(), "10", true).unwrap();
    state.supply_asset(&dai(), "5000", true).unwrap();
    state
        .borrow_asset(&usdc(), "700", InterestRateMode::Variable)
        .unwrap();
    state.change_price(&weth(), "70");
    let actions_before = state.market.actions().len();

    let report = state.run_liquidations();

    assert_eq!(report.state, LiquidationState::Exhausted);
    assert!(report.applied.is_empty());
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].0, BorrowKey::variable(&usdc()));
    assert_eq!(report.rejected[0].1, LiquidationRejection::CollateralNotEnabled);
    assert_eq!(state.market.actions().len(), actions_before);
    assert!(state.market.get_supply(&weth()).unwrap().unwrap().amount == weth().units(10));
}

#[test]
fn test_zero_probability_skips_every_pass() {
    let mut state = state_with_weth_collateral_and_usdc_debt().with_liquidation_probability(0, 7);
    state.change_price(&weth(), "70");

    for _ in 0..5 {
        let report = state.run_liquidations();
        assert!(report.skipped);
        assert_eq!(report.state, LiquidationState::Liquidatable);
    }
    assert!(state.market.get_supply(&weth()).unwrap().unwrap().amount == weth().units(10));
    assert!(state.market.last_liquidation().unwrap().skipped);
}

#[test]
fn test_seeded_skip_draw_is_reproducible() {
    let draws = |seed: u64| -> Vec<bool> {
        let mut state = LendingMarketTestState::new().with_liquidation_probability(5_000, seed);
        (0..32).map(|_| state.run_liquidations().skipped).collect()
    };

    let first = draws(42);
    assert_eq!(first, draws(42));
    assert!(first.iter().any(|skipped| *skipped));
    assert!(first.iter().any(|skipped| !*skipped));
}
