#![allow(dead_code)]

use crate::constants::*;

use common_constants::{RAY_PRECISION, WAD_PRECISION};
use common_errors::LendingError;
use common_math::parse_decimal;
use common_structs::{InterestRateMode, MarketStatus, PriceSnapshot, Token, TokenStatus};
use lending_market::{
    AssetConfigRow, AssetWallet, LendingMarket, LiquidationReport, RiskParameterTable, Wallet,
};
use multiversx_sc::types::{ManagedDecimal, NumDecimals};
use multiversx_sc_scenario::api::StaticApi;

pub type Decimal = ManagedDecimal<StaticApi, NumDecimals>;

pub fn weth() -> Token {
    Token::new(WETH_SYMBOL, WETH_DECIMALS)
}

pub fn usdc() -> Token {
    Token::new(USDC_SYMBOL, USDC_DECIMALS)
}

pub fn dai() -> Token {
    Token::new(DAI_SYMBOL, DAI_DECIMALS)
}

pub fn gho() -> Token {
    Token::new(GHO_SYMBOL, GHO_DECIMALS)
}

pub fn asset_row(
    symbol: &str,
    max_ltv_bps: u64,
    liquidation_threshold_bps: u64,
    liquidation_bonus_bps: u64,
    can_collateral: bool,
    can_borrow: bool,
    can_borrow_stable: bool,
) -> AssetConfigRow {
    AssetConfigRow {
        symbol: symbol.to_string(),
        max_ltv_bps,
        liquidation_threshold_bps,
        liquidation_bonus_bps,
        can_collateral,
        can_borrow,
        can_borrow_stable,
    }
}

pub fn risk_rows() -> Vec<AssetConfigRow> {
    vec![
        asset_row(
            WETH_SYMBOL,
            WETH_LTV,
            WETH_LIQ_THRESHOLD,
            WETH_LIQ_BONUS,
            true,
            true,
            false,
        ),
        asset_row(
            USDC_SYMBOL,
            USDC_LTV,
            USDC_LIQ_THRESHOLD,
            USDC_LIQ_BONUS,
            true,
            true,
            true,
        ),
        asset_row(
            DAI_SYMBOL,
            DAI_LTV,
            DAI_LIQ_THRESHOLD,
            DAI_LIQ_BONUS,
            true,
            true,
            true,
        ),
        asset_row(GHO_SYMBOL, 0, 0, 0, false, true, false),
    ]
}

pub fn risk_parameters() -> RiskParameterTable<StaticApi> {
    RiskParameterTable::from_rows(&risk_rows()).unwrap()
}

/// WAD based decimal from a literal such as `"1.6"`.
pub fn wad_decimal(literal: &str) -> Decimal {
    parse_decimal(literal, WAD_PRECISION).unwrap()
}

/// RAY based decimal, the scale of indexes, rates and base amounts.
pub fn ray_decimal(literal: &str) -> Decimal {
    parse_decimal(literal, RAY_PRECISION).unwrap()
}

pub fn price(literal: &str) -> Decimal {
    wad_decimal(literal)
}

pub fn dollars(whole: u64) -> Decimal {
    wad_decimal(&whole.to_string())
}

pub fn amount(token: &Token, literal: &str) -> Decimal {
    token.parse_amount(literal).unwrap()
}

pub fn initial_status() -> MarketStatus<StaticApi> {
    [weth(), usdc(), dai(), gho()]
        .iter()
        .fold(MarketStatus::new(), |status, token| {
            status.with(token, TokenStatus::initial())
        })
}

pub fn initial_prices() -> PriceSnapshot<StaticApi> {
    PriceSnapshot::new()
        .with(&weth(), dollars(WETH_PRICE_IN_DOLLARS))
        .with(&usdc(), dollars(USDC_PRICE_IN_DOLLARS))
        .with(&dai(), dollars(DAI_PRICE_IN_DOLLARS))
        .with(&gho(), dollars(GHO_PRICE_IN_DOLLARS))
}

pub fn initial_wallet() -> AssetWallet<StaticApi> {
    AssetWallet::new()
        .with_balance(&weth(), weth().units(INITIAL_WETH_BALANCE))
        .with_balance(&usdc(), usdc().units(INITIAL_USDC_BALANCE))
        .with_balance(&dai(), dai().units(INITIAL_DAI_BALANCE))
}

pub fn new_market() -> LendingMarket<StaticApi> {
    new_market_with(&risk_rows())
}

pub fn new_market_with(rows: &[AssetConfigRow]) -> LendingMarket<StaticApi> {
    let risk_parameters = RiskParameterTable::from_rows(rows).unwrap();
    let mut market = LendingMarket::new(MARKET_ID, risk_parameters);
    market.add_tokens([weth(), usdc(), dai(), gho()]);
    market.set_market_status(0, initial_status(), initial_prices());
    market
}

pub struct LendingMarketTestState {
    pub market: LendingMarket<StaticApi>,
    pub wallet: AssetWallet<StaticApi>,
    pub timestamp: u64,
}

impl LendingMarketTestState {
    pub fn new() -> Self {
        LendingMarketTestState {
            market: new_market(),
            wallet: initial_wallet(),
            timestamp: 0,
        }
    }

    pub fn with_rows(rows: &[AssetConfigRow]) -> Self {
        LendingMarketTestState {
            market: new_market_with(rows),
            wallet: initial_wallet(),
            timestamp: 0,
        }
    }

    pub fn with_liquidation_probability(mut self, probability_bps: u64, seed: u64) -> Self {
        self.market = self
            .market
            .with_liquidation_probability(probability_bps, seed)
            .unwrap();
        self
    }

    pub fn supply_asset(
        &mut self,
        token: &Token,
        literal: &str,
        collateral: bool,
    ) -> Result<Decimal, LendingError> {
        let value = amount(token, literal);
        self.market.supply(&mut self.wallet, token, &value, collateral)
    }

    pub fn withdraw_asset(
        &mut self,
        token: &Token,
        literal: Option<&str>,
    ) -> Result<Decimal, LendingError> {
        let value = literal.map(|literal| amount(token, literal));
        self.market.withdraw(&mut self.wallet, token, value.as_ref())
    }

    pub fn borrow_asset(
        &mut self,
        token: &Token,
        literal: &str,
        rate_mode: InterestRateMode,
    ) -> Result<Decimal, LendingError> {
        let value = amount(token, literal);
        self.market.borrow(&mut self.wallet, token, &value, rate_mode)
    }

    pub fn repay_asset(
        &mut self,
        token: &Token,
        rate_mode: InterestRateMode,
        literal: Option<&str>,
    ) -> Result<Decimal, LendingError> {
        let value = literal.map(|literal| amount(token, literal));
        self.market
            .repay(&mut self.wallet, token, rate_mode, value.as_ref())
    }

    pub fn wallet_balance(&self, token: &Token) -> Decimal {
        self.wallet.balance(token)
    }

    pub fn health_factor(&self) -> Decimal {
        self.market.health_factor().unwrap()
    }

    /// Moves to the next step with new prices and unchanged status.
    pub fn change_price(&mut self, token: &Token, literal: &str) {
        let mut prices = self.market.prices().clone();
        prices.insert(token.symbol(), price(literal));
        let status = self.market.market_status().clone();
        self.timestamp += 60;
        self.market.set_market_status(self.timestamp, status, prices);
    }

    /// Moves to the next step with a new status for `token` and unchanged prices.
    pub fn change_status(&mut self, token: &Token, status: TokenStatus<StaticApi>) {
        let mut market_status = self.market.market_status().clone();
        market_status.insert(token.clone(), status);
        let prices = self.market.prices().clone();
        self.timestamp += 60;
        self.market
            .set_market_status(self.timestamp, market_status, prices);
    }

    pub fn run_liquidations(&mut self) -> LiquidationReport<StaticApi> {
        self.market.update().unwrap()
    }
}
