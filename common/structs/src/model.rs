use std::{
    cmp::Ordering,
    collections::BTreeMap,
    fmt,
    hash::{Hash, Hasher},
};

use common_constants::{BPS_PRECISION, RAY_PRECISION, WAD_PRECISION};
use common_errors::{LendingError, Operation, ERROR_INVALID_DECIMAL};
use common_math::{parse_decimal, ray, ray_zero, to_decimal};
use multiversx_sc::{
    api::ManagedTypeApi,
    types::{BigUint, ManagedDecimal, ManagedDecimalSigned, NumDecimals},
};

/// A token known to the market. Identity is the upper-cased symbol; decimals and the
/// optional contract address are descriptive only.
#[derive(Clone, Debug)]
pub struct Token {
    symbol: String,
    decimals: usize,
    address: Option<String>,
}

impl Token {
    pub fn new(symbol: &str, decimals: usize) -> Self {
        Token {
            symbol: symbol.trim().to_uppercase(),
            decimals,
            address: None,
        }
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address = Some(address.trim().to_lowercase());
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> usize {
        self.decimals
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Whole units of this token at its own precision, e.g. `units(5)` is `5.000000` for a
    /// six decimal token.
    pub fn units<M: ManagedTypeApi>(&self, whole: u64) -> ManagedDecimal<M, NumDecimals> {
        let scale = BigUint::<M>::from(10u64).pow(self.decimals as u32);
        to_decimal(BigUint::from(whole) * scale, self.decimals)
    }

    pub fn zero<M: ManagedTypeApi>(&self) -> ManagedDecimal<M, NumDecimals> {
        to_decimal(BigUint::zero(), self.decimals)
    }

    /// Parses a human readable amount (`"12.5"`) at this token's precision.
    pub fn parse_amount<M: ManagedTypeApi>(
        &self,
        literal: &str,
    ) -> Result<ManagedDecimal<M, NumDecimals>, LendingError> {
        parse_decimal(literal, self.decimals).ok_or_else(|| {
            LendingError::invalid(Operation::Setup, self.symbol.clone(), ERROR_INVALID_DECIMAL)
        })
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Eq for Token {}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        self.symbol.cmp(&other.symbol)
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// Risk parameters of one asset. All ratios are BPS based (`10_000 = 100%`).
#[derive(Clone)]
pub struct AssetConfig<M: ManagedTypeApi> {
    pub loan_to_value_bps: ManagedDecimal<M, NumDecimals>,
    pub liquidation_threshold_bps: ManagedDecimal<M, NumDecimals>,
    pub liquidation_bonus_bps: ManagedDecimal<M, NumDecimals>,
    pub is_collateralizable: bool,
    pub is_borrowable: bool,
    pub is_stable_borrowable: bool,
}

impl<M: ManagedTypeApi> AssetConfig<M> {
    pub fn new(
        loan_to_value_bps: u64,
        liquidation_threshold_bps: u64,
        liquidation_bonus_bps: u64,
        is_collateralizable: bool,
        is_borrowable: bool,
        is_stable_borrowable: bool,
    ) -> Self {
        AssetConfig {
            loan_to_value_bps: to_decimal(BigUint::from(loan_to_value_bps), BPS_PRECISION),
            liquidation_threshold_bps: to_decimal(
                BigUint::from(liquidation_threshold_bps),
                BPS_PRECISION,
            ),
            liquidation_bonus_bps: to_decimal(BigUint::from(liquidation_bonus_bps), BPS_PRECISION),
            is_collateralizable,
            is_borrowable,
            is_stable_borrowable,
        }
    }

    pub fn can_supply_as_collateral(&self) -> bool {
        self.is_collateralizable
    }

    pub fn can_borrow(&self) -> bool {
        self.is_borrowable
    }

    pub fn can_borrow_stable(&self) -> bool {
        self.is_borrowable && self.is_stable_borrowable
    }

    pub fn has_liquidation_threshold(&self) -> bool {
        self.liquidation_threshold_bps.into_raw_units() > &BigUint::zero()
    }

    pub fn has_loan_to_value(&self) -> bool {
        self.loan_to_value_bps.into_raw_units() > &BigUint::zero()
    }
}

/// Per-step protocol state of a single token. Indexes and annual rates are RAY based.
#[derive(Clone)]
pub struct TokenStatus<M: ManagedTypeApi> {
    pub liquidity_index: ManagedDecimal<M, NumDecimals>,
    pub variable_borrow_index: ManagedDecimal<M, NumDecimals>,
    pub liquidity_rate: ManagedDecimal<M, NumDecimals>,
    pub variable_borrow_rate: ManagedDecimal<M, NumDecimals>,
    pub stable_borrow_rate: ManagedDecimal<M, NumDecimals>,
}

impl<M: ManagedTypeApi> TokenStatus<M> {
    /// Status at protocol inception: both indexes at one, no interest.
    pub fn initial() -> Self {
        TokenStatus {
            liquidity_index: ray(),
            variable_borrow_index: ray(),
            liquidity_rate: ray_zero(),
            variable_borrow_rate: ray_zero(),
            stable_borrow_rate: ray_zero(),
        }
    }

    pub fn with_indexes(
        liquidity_index: ManagedDecimal<M, NumDecimals>,
        variable_borrow_index: ManagedDecimal<M, NumDecimals>,
    ) -> Self {
        TokenStatus {
            liquidity_index: liquidity_index.rescale(RAY_PRECISION),
            variable_borrow_index: variable_borrow_index.rescale(RAY_PRECISION),
            ..Self::initial()
        }
    }

    pub fn with_rates(
        mut self,
        liquidity_rate: ManagedDecimal<M, NumDecimals>,
        variable_borrow_rate: ManagedDecimal<M, NumDecimals>,
        stable_borrow_rate: ManagedDecimal<M, NumDecimals>,
    ) -> Self {
        self.liquidity_rate = liquidity_rate.rescale(RAY_PRECISION);
        self.variable_borrow_rate = variable_borrow_rate.rescale(RAY_PRECISION);
        self.stable_borrow_rate = stable_borrow_rate.rescale(RAY_PRECISION);
        self
    }

    /// Annual borrow rate applying to debt of the given mode.
    pub fn borrow_rate(&self, mode: InterestRateMode) -> &ManagedDecimal<M, NumDecimals> {
        match mode {
            InterestRateMode::Variable => &self.variable_borrow_rate,
            InterestRateMode::Stable => &self.stable_borrow_rate,
        }
    }
}

/// Status of every token for one simulation step.
#[derive(Clone)]
pub struct MarketStatus<M: ManagedTypeApi> {
    tokens: BTreeMap<Token, TokenStatus<M>>,
}

impl<M: ManagedTypeApi> Default for MarketStatus<M> {
    fn default() -> Self {
        MarketStatus {
            tokens: BTreeMap::new(),
        }
    }
}

impl<M: ManagedTypeApi> MarketStatus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: Token, status: TokenStatus<M>) {
        self.tokens.insert(token, status);
    }

    pub fn with(mut self, token: &Token, status: TokenStatus<M>) -> Self {
        self.insert(token.clone(), status);
        self
    }

    pub fn get(&self, token: &Token) -> Option<&TokenStatus<M>> {
        self.tokens.get(token)
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.tokens.contains_key(token)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Token, &TokenStatus<M>)> {
        self.tokens.iter()
    }
}

/// USD price of every token for one simulation step, WAD based and keyed by symbol.
#[derive(Clone)]
pub struct PriceSnapshot<M: ManagedTypeApi> {
    prices: BTreeMap<String, ManagedDecimal<M, NumDecimals>>,
}

impl<M: ManagedTypeApi> Default for PriceSnapshot<M> {
    fn default() -> Self {
        PriceSnapshot {
            prices: BTreeMap::new(),
        }
    }
}

impl<M: ManagedTypeApi> PriceSnapshot<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: &str, price: ManagedDecimal<M, NumDecimals>) {
        self.prices
            .insert(symbol.trim().to_uppercase(), price.rescale(WAD_PRECISION));
    }

    pub fn with(mut self, token: &Token, price: ManagedDecimal<M, NumDecimals>) -> Self {
        self.insert(token.symbol(), price);
        self
    }

    pub fn price(&self, token: &Token) -> Option<&ManagedDecimal<M, NumDecimals>> {
        self.prices.get(token.symbol())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ManagedDecimal<M, NumDecimals>)> {
        self.prices.iter()
    }
}

/// Everything the market needs to advance one step.
#[derive(Clone)]
pub struct MarketSnapshot<M: ManagedTypeApi> {
    pub timestamp: u64,
    pub status: MarketStatus<M>,
    pub prices: PriceSnapshot<M>,
}

pub type SupplyKey = Token;

/// A stored supply. `base_amount` is RAY based and never zero while stored.
#[derive(Clone)]
pub struct SupplyInfo<M: ManagedTypeApi> {
    pub base_amount: ManagedDecimal<M, NumDecimals>,
    pub collateral: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InterestRateMode {
    Stable,
    Variable,
}

impl fmt::Display for InterestRateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterestRateMode::Stable => f.write_str("stable"),
            InterestRateMode::Variable => f.write_str("variable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BorrowKey {
    pub token: Token,
    pub rate_mode: InterestRateMode,
}

impl BorrowKey {
    pub fn new(token: &Token, rate_mode: InterestRateMode) -> Self {
        BorrowKey {
            token: token.clone(),
            rate_mode,
        }
    }

    pub fn variable(token: &Token) -> Self {
        Self::new(token, InterestRateMode::Variable)
    }

    pub fn stable(token: &Token) -> Self {
        Self::new(token, InterestRateMode::Stable)
    }
}

impl fmt::Display for BorrowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.token, self.rate_mode)
    }
}

/// A stored debt. `base_amount` is RAY based and never zero while stored.
#[derive(Clone)]
pub struct BorrowInfo<M: ManagedTypeApi> {
    pub base_amount: ManagedDecimal<M, NumDecimals>,
}

/// Read-only view of a supply position at the current step.
#[derive(Clone)]
pub struct Supply<M: ManagedTypeApi> {
    pub token: Token,
    pub base_amount: ManagedDecimal<M, NumDecimals>,
    pub collateral: bool,
    /// Live amount at the token's precision.
    pub amount: ManagedDecimal<M, NumDecimals>,
    pub value: ManagedDecimal<M, NumDecimals>,
    pub apy: ManagedDecimal<M, NumDecimals>,
}

/// Read-only view of a borrow position at the current step.
#[derive(Clone)]
pub struct Borrow<M: ManagedTypeApi> {
    pub token: Token,
    pub rate_mode: InterestRateMode,
    pub base_amount: ManagedDecimal<M, NumDecimals>,
    /// Live amount at the token's precision.
    pub amount: ManagedDecimal<M, NumDecimals>,
    pub value: ManagedDecimal<M, NumDecimals>,
    pub apy: ManagedDecimal<M, NumDecimals>,
}

/// Aggregate account view returned by the query surface. Values, ratios and APYs are WAD
/// based.
#[derive(Clone)]
pub struct LendingBalance<M: ManagedTypeApi> {
    pub net_value: ManagedDecimalSigned<M, NumDecimals>,
    pub supplies: BTreeMap<SupplyKey, Supply<M>>,
    pub borrows: BTreeMap<BorrowKey, Borrow<M>>,
    pub liquidation_threshold: ManagedDecimal<M, NumDecimals>,
    pub health_factor: ManagedDecimal<M, NumDecimals>,
    pub supply_balance: ManagedDecimal<M, NumDecimals>,
    pub borrow_balance: ManagedDecimal<M, NumDecimals>,
    pub collateral_balance: ManagedDecimal<M, NumDecimals>,
    pub current_ltv: ManagedDecimal<M, NumDecimals>,
    pub loan_to_value: ManagedDecimal<M, NumDecimals>,
    pub supply_apy: ManagedDecimal<M, NumDecimals>,
    pub borrow_apy: ManagedDecimal<M, NumDecimals>,
    pub net_apy: ManagedDecimalSigned<M, NumDecimals>,
}
