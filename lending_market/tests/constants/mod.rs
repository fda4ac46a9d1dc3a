pub const MARKET_ID: &str = "aave_v3";

pub const WETH_SYMBOL: &str = "WETH";
pub const WETH_DECIMALS: usize = 18;
pub const WETH_PRICE_IN_DOLLARS: u64 = 100;

pub const USDC_SYMBOL: &str = "USDC";
pub const USDC_DECIMALS: usize = 6;
pub const USDC_PRICE_IN_DOLLARS: u64 = 1;

pub const DAI_SYMBOL: &str = "DAI";
pub const DAI_DECIMALS: usize = 18;
pub const DAI_PRICE_IN_DOLLARS: u64 = 1;

pub const GHO_SYMBOL: &str = "GHO";
pub const GHO_DECIMALS: usize = 18;
pub const GHO_PRICE_IN_DOLLARS: u64 = 1;

// WETH risk parameters, in basis points
pub const WETH_LTV: u64 = 8000;
pub const WETH_LIQ_THRESHOLD: u64 = 8250;
pub const WETH_LIQ_BONUS: u64 = 500;

pub const USDC_LTV: u64 = 7700;
pub const USDC_LIQ_THRESHOLD: u64 = 8000;
pub const USDC_LIQ_BONUS: u64 = 450;

pub const DAI_LTV: u64 = 6300;
pub const DAI_LIQ_THRESHOLD: u64 = 7700;
pub const DAI_LIQ_BONUS: u64 = 500;

pub const INITIAL_WETH_BALANCE: u64 = 1_000;
pub const INITIAL_USDC_BALANCE: u64 = 1_000_000;
pub const INITIAL_DAI_BALANCE: u64 = 1_000_000;
