#![no_std]

/// Upper bound accepted for a liquidation bonus in the risk parameter table (15%).
pub const MAX_LIQUIDATION_BONUS: u128 = 1_500;

/// Compounding periods used to annualize protocol rates (365 days).
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

pub const RAY: u128 = 1_000_000_000_000_000_000_000_000_000;
pub const RAY_PRECISION: usize = 27;

/// Represents 1 USD, the common unit every price is quoted in
pub const WAD: u128 = 1_000_000_000_000_000_000;
pub const WAD_PRECISION: usize = 18;

pub const BPS: usize = 10_000; // 100%
pub const BPS_PRECISION: usize = 4;

/// Above this health factor only the default close factor applies (0.95 WAD).
pub const CLOSE_FACTOR_HF_THRESHOLD: u128 = 950_000_000_000_000_000;

/// Share of a debt that can be closed in one liquidation when `HF > 0.95` (50%).
pub const DEFAULT_LIQUIDATION_CLOSE_FACTOR: usize = 5_000;

/// Share of a debt that can be closed in one liquidation when `HF <= 0.95` (100%).
pub const MAX_LIQUIDATION_CLOSE_FACTOR: usize = BPS;

/// Every unhealthy position is liquidated at the first opportunity unless configured otherwise.
pub const DEFAULT_LIQUIDATION_PROBABILITY: u64 = BPS as u64;
