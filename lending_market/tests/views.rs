use common_errors::{ErrorKind, ERROR_PRICE_NOT_FOUND};
use common_rates::rate_to_apy;
use common_structs::{BorrowKey, InterestRateMode, TokenStatus};
pub mod constants;
pub mod setup;
use constants::*;
use setup::*;

/// 2000 USDC of collateral at an 80% threshold backing 1000 DAI.
fn state_with_usdc_collateral_and_dai_debt() -> LendingMarketTestState {
    let mut state = LendingMarketTestState::new();
    state.supply_asset(&usdc(), "2000", true).unwrap();
    state
        .borrow_asset(&dai(), "1000", InterestRateMode::Variable)
        .unwrap();
    state
}

#[test]
fn test_health_factor_from_threshold_weighted_collateral() {
    let state = state_with_usdc_collateral_and_dai_debt();

    // 2000$ * 0.8 / 1000$
    assert!(state.health_factor() == wad_decimal("1.6"));
    assert!(state.market.weighted_collateral().unwrap() == dollars(1_600));
    assert!(state.market.liquidation_threshold().unwrap() == wad_decimal("0.8"));
    assert!(state.market.current_ltv().unwrap() == wad_decimal("0.77"));
    assert!(state.market.loan_to_value().unwrap() == wad_decimal("0.5"));
}

#[test]
fn test_health_factor_without_debt_is_unbounded() {
    let mut state = LendingMarketTestState::new();
    assert!(state.health_factor() > dollars(1_000_000_000));

    state.supply_asset(&weth(), "1", true).unwrap();
    assert!(state.health_factor() > dollars(1_000_000_000));
    assert!(state.market.loan_to_value().unwrap() == dollars(0));
}

#[test]
fn test_value_weighted_risk_parameters() {
    let mut state = LendingMarketTestState::new();
    state.supply_asset(&weth(), "10", true).unwrap();
    state.supply_asset(&usdc(), "1000", true).unwrap();
    state.supply_asset(&dai(), "1000", false).unwrap();

    assert!(state.market.total_supply_value().unwrap() == dollars(3_000));
    assert!(state.market.total_collateral_value().unwrap() == dollars(2_000));
    // (1000$ * 0.80 + 1000$ * 0.77) / 2000$
    assert!(state.market.current_ltv().unwrap() == wad_decimal("0.785"));
    // (1000$ * 0.825 + 1000$ * 0.80) / 2000$
    assert!(state.market.liquidation_threshold().unwrap() == wad_decimal("0.8125"));

    let collateral = state.market.collateral_value().unwrap();
    assert_eq!(collateral.len(), 2);
    assert!(!collateral.contains_key(&dai()));
    assert_eq!(state.market.supplies_value().unwrap().len(), 3);
}

#[test]
fn test_values_follow_prices_and_indexes() {
    let mut state = state_with_usdc_collateral_and_dai_debt();

    state.change_price(&dai(), "1.2");
    assert!(state.market.total_borrows_value().unwrap() == dollars(1_200));

    state.change_status(
        &dai(),
        TokenStatus::with_indexes(ray_decimal("1"), ray_decimal("1.1")),
    );
    let borrow = state
        .market
        .get_borrow(&BorrowKey::variable(&dai()))
        .unwrap()
        .unwrap();
    assert!(borrow.amount == dai().units(1_100));
    assert!(borrow.value == dollars(1_320));
    assert!(borrow.base_amount == ray_decimal("1000"));
}

#[test]
fn test_apy_per_position_and_weighted() {
    let mut state = LendingMarketTestState::new();
    state.supply_asset(&usdc(), "2000", true).unwrap();
    state
        .borrow_asset(&dai(), "500", InterestRateMode::Stable)
        .unwrap();
    assert!(state.market.supply_apy().unwrap() == dollars(0));
    assert!(state.market.borrow_apy().unwrap() == dollars(0));

    state.change_status(
        &usdc(),
        TokenStatus::initial().with_rates(
            ray_decimal("0.05"),
            ray_decimal("0.1"),
            ray_decimal("0.12"),
        ),
    );
    state.change_status(
        &dai(),
        TokenStatus::initial().with_rates(
            ray_decimal("0.03"),
            ray_decimal("0.08"),
            ray_decimal("0.11"),
        ),
    );

    let supply_apy = rate_to_apy(&ray_decimal("0.05"));
    let stable_apy = rate_to_apy(&ray_decimal("0.11"));
    assert!(supply_apy > wad_decimal("0.05"));
    assert!(state.market.supply_apy().unwrap() == supply_apy);
    assert!(state.market.borrow_apy().unwrap() == stable_apy);

    let supply = state.market.get_supply(&usdc()).unwrap().unwrap();
    assert!(supply.apy == supply_apy);
    let borrow = state
        .market
        .get_borrow(&BorrowKey::stable(&dai()))
        .unwrap()
        .unwrap();
    assert!(borrow.apy == stable_apy);
}

#[test]
fn test_net_value_and_market_balance() {
    let state = state_with_usdc_collateral_and_dai_debt();

    let net_value = state.market.net_value().unwrap();
    assert!(net_value.into_raw_units() == dollars(1_000).into_signed().into_raw_units());

    let balance = state.market.market_balance().unwrap();
    assert!(balance.supply_balance == dollars(2_000));
    assert!(balance.borrow_balance == dollars(1_000));
    assert!(balance.collateral_balance == dollars(2_000));
    assert!(balance.health_factor == wad_decimal("1.6"));
    assert_eq!(balance.supplies.len(), 1);
    assert_eq!(balance.borrows.len(), 1);
    assert!(balance.net_apy.into_raw_units() == dollars(0).into_signed().into_raw_units());
}

#[test]
fn test_net_value_turns_negative_when_debt_exceeds_supply() {
    let mut state = state_with_usdc_collateral_and_dai_debt();
    state.change_price(&dai(), "3");

    let net_value = state.market.net_value().unwrap();
    let expected = dollars(0).into_signed() - dollars(1_000).into_signed();
    assert!(net_value.into_raw_units() == expected.into_raw_units());
}

#[test]
fn test_cache_is_invalidated_by_steps_and_mutations_only() {
    let mut state = LendingMarketTestState::new();
    let initial = state.market.cache_generation();

    state.supply_asset(&weth(), "10", true).unwrap();
    let after_supply = state.market.cache_generation();
    assert!(after_supply > initial);

    state.health_factor();
    state.market.market_balance().unwrap();
    assert_eq!(state.market.cache_generation(), after_supply);

    // a rejected operation leaves the cache intact
    state.supply_asset(&weth(), "0", true).unwrap_err();
    assert_eq!(state.market.cache_generation(), after_supply);

    state.change_price(&weth(), "120");
    assert!(state.market.cache_generation() > after_supply);
    assert!(state.market.total_supply_value().unwrap() == dollars(1_200));
}

#[test]
fn test_missing_price_breaks_invariants_and_queries() {
    let mut state = LendingMarketTestState::new();
    state.supply_asset(&usdc(), "100", true).unwrap();
    state.market.check_invariants().unwrap();

    let prices = initial_prices();
    let mut prices_without_usdc = common_structs::PriceSnapshot::new();
    for (symbol, price) in prices.iter() {
        if symbol != USDC_SYMBOL {
            prices_without_usdc.insert(symbol, price.clone());
        }
    }
    let status = state.market.market_status().clone();
    state.market.set_market_status(60, status, prices_without_usdc);

    let err = state.market.check_invariants().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(err.reason(), ERROR_PRICE_NOT_FOUND);
    assert_eq!(err.token(), USDC_SYMBOL);

    let err = state.market.health_factor().err().unwrap();
    assert_eq!(err.reason(), ERROR_PRICE_NOT_FOUND);
}
