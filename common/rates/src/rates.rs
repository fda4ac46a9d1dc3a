#![no_std]

use common_constants::{
    CLOSE_FACTOR_HF_THRESHOLD, DEFAULT_LIQUIDATION_CLOSE_FACTOR, MAX_LIQUIDATION_CLOSE_FACTOR,
    RAY_PRECISION, SECONDS_PER_YEAR, WAD_PRECISION,
};
use common_math::{
    bps, div_half_up, mul_half_up, pow_half_up, ray, rescale_half_up, safe_div_half_up,
    safe_div_half_up_signed, to_decimal, to_decimal_bps, to_decimal_wad, wad_zero,
};

multiversx_sc::imports!();

/// Converts a live token amount into the rebasing base amount stored in the ledger.
///
/// **Formula**: `base = amount / index`
///
/// # Arguments
/// - `amount`: Live amount at the token's precision.
/// - `index`: Liquidity or variable borrow index (RAY-based).
///
/// # Returns
/// - `ManagedDecimal<M, NumDecimals>`: Base amount (RAY-based).
pub fn to_base_amount<M: ManagedTypeApi>(
    amount: &ManagedDecimal<M, NumDecimals>,
    index: &ManagedDecimal<M, NumDecimals>,
) -> ManagedDecimal<M, NumDecimals> {
    div_half_up(amount, index, RAY_PRECISION)
}

/// Converts a stored base amount back into a live amount.
///
/// **Formula**: `amount = base * index`, rounded half-up to `decimals`.
///
/// # Arguments
/// - `base_amount`: Stored base amount (RAY-based).
/// - `index`: Liquidity or variable borrow index (RAY-based).
/// - `decimals`: Precision of the token the amount is expressed in.
///
/// # Returns
/// - `ManagedDecimal<M, NumDecimals>`: Live amount at the token's precision.
pub fn to_live_amount<M: ManagedTypeApi>(
    base_amount: &ManagedDecimal<M, NumDecimals>,
    index: &ManagedDecimal<M, NumDecimals>,
    decimals: usize,
) -> ManagedDecimal<M, NumDecimals> {
    rescale_half_up(&mul_half_up(base_amount, index, RAY_PRECISION), decimals)
}

/// USD value of a token amount.
///
/// # Arguments
/// - `amount`: Token amount to evaluate.
/// - `price`: USD price of the token (WAD-based).
///
/// # Returns
/// - USD value in WAD precision.
pub fn token_value<M: ManagedTypeApi>(
    amount: &ManagedDecimal<M, NumDecimals>,
    price: &ManagedDecimal<M, NumDecimals>,
) -> ManagedDecimal<M, NumDecimals> {
    rescale_half_up(&mul_half_up(amount, price, RAY_PRECISION), WAD_PRECISION)
}

/// Annualizes a protocol rate assuming per-second compounding.
///
/// **Formula**:
/// - `apy = (1 + rate / SECONDS_PER_YEAR)^SECONDS_PER_YEAR - 1`
/// - The power is evaluated by repeated squaring at RAY precision.
///
/// # Arguments
/// - `rate`: Annual rate as published by the protocol (RAY-based).
///
/// # Returns
/// - `ManagedDecimal<M, NumDecimals>`: Compounded yearly yield (WAD-based).
pub fn rate_to_apy<M: ManagedTypeApi>(
    rate: &ManagedDecimal<M, NumDecimals>,
) -> ManagedDecimal<M, NumDecimals> {
    if rate.into_raw_units() == &BigUint::zero() {
        return wad_zero();
    }

    let per_second = div_half_up(
        rate,
        &to_decimal(BigUint::from(SECONDS_PER_YEAR), 0),
        RAY_PRECISION,
    );
    let growth = pow_half_up(&(ray() + per_second), SECONDS_PER_YEAR, RAY_PRECISION);

    rescale_half_up(&(growth - ray()), WAD_PRECISION)
}

/// Sum of WAD values.
pub fn total_value<'a, M: ManagedTypeApi + 'a>(
    values: impl IntoIterator<Item = &'a ManagedDecimal<M, NumDecimals>>,
) -> ManagedDecimal<M, NumDecimals> {
    let mut total = wad_zero();
    for value in values {
        total += value.rescale(WAD_PRECISION);
    }
    total
}

/// Sum of `value_i * weight_i`, where weights are BPS or WAD fractions.
///
/// # Returns
/// - Weighted sum in WAD precision.
pub fn weighted_sum<'a, M: ManagedTypeApi + 'a>(
    items: impl IntoIterator<
        Item = (
            &'a ManagedDecimal<M, NumDecimals>,
            &'a ManagedDecimal<M, NumDecimals>,
        ),
    >,
) -> ManagedDecimal<M, NumDecimals> {
    let mut total = wad_zero();
    for (value, weight) in items {
        total += rescale_half_up(&mul_half_up(value, weight, RAY_PRECISION), WAD_PRECISION);
    }
    total
}

/// Value-weighted average of `weight_i`.
///
/// **Formula**: `Σ(value_i * weight_i) / Σ(value_i)`, zero when no value is present.
///
/// # Returns
/// - Weighted average in WAD precision.
pub fn weighted_average<'a, M: ManagedTypeApi + 'a>(
    items: impl IntoIterator<
        Item = (
            &'a ManagedDecimal<M, NumDecimals>,
            &'a ManagedDecimal<M, NumDecimals>,
        ),
    > + Clone,
) -> ManagedDecimal<M, NumDecimals> {
    let numerator = weighted_sum(items.clone());
    let denominator = total_value(items.into_iter().map(|(value, _)| value));

    rescale_half_up(
        &safe_div_half_up(&numerator, &denominator, RAY_PRECISION),
        WAD_PRECISION,
    )
}

/// Value-weighted APY of a set of positions, see [`weighted_average`].
pub fn weighted_apy<'a, M: ManagedTypeApi + 'a>(
    items: impl IntoIterator<
        Item = (
            &'a ManagedDecimal<M, NumDecimals>,
            &'a ManagedDecimal<M, NumDecimals>,
        ),
    > + Clone,
) -> ManagedDecimal<M, NumDecimals> {
    weighted_average(items)
}

/// Blended yield of the whole account.
///
/// **Formula**: `(supply_apy * supplied - borrow_apy * borrowed) / (supplied - borrowed)`,
/// zero when the net value is zero.
///
/// # Returns
/// - Signed net APY in WAD precision.
pub fn net_apy<M: ManagedTypeApi>(
    supply_apy: &ManagedDecimal<M, NumDecimals>,
    supply_value: &ManagedDecimal<M, NumDecimals>,
    borrow_apy: &ManagedDecimal<M, NumDecimals>,
    borrow_value: &ManagedDecimal<M, NumDecimals>,
) -> ManagedDecimalSigned<M, NumDecimals> {
    let earned = mul_half_up(supply_apy, supply_value, WAD_PRECISION).into_signed();
    let paid = mul_half_up(borrow_apy, borrow_value, WAD_PRECISION).into_signed();
    let net_value = net_worth(supply_value, borrow_value);

    safe_div_half_up_signed(&(earned - paid), &net_value, WAD_PRECISION)
}

/// `supplied - borrowed`, signed.
pub fn net_worth<M: ManagedTypeApi>(
    supply_value: &ManagedDecimal<M, NumDecimals>,
    borrow_value: &ManagedDecimal<M, NumDecimals>,
) -> ManagedDecimalSigned<M, NumDecimals> {
    supply_value.rescale(WAD_PRECISION).into_signed()
        - borrow_value.rescale(WAD_PRECISION).into_signed()
}

/// Calculates the health factor from weighted collateral and borrowed value.
/// Assesses the risk level of a position; higher values indicate safer positions.
///
/// # Arguments
/// - `weighted_collateral`: Collateral value weighted by liquidation thresholds.
/// - `borrowed_value`: Total borrowed value in USD.
///
/// # Returns
/// - Health factor in WAD precision; `u128::MAX` if no borrows exist.
pub fn health_factor<M: ManagedTypeApi>(
    weighted_collateral: &ManagedDecimal<M, NumDecimals>,
    borrowed_value: &ManagedDecimal<M, NumDecimals>,
) -> ManagedDecimal<M, NumDecimals> {
    if borrowed_value.into_raw_units() == &BigUint::zero() {
        return infinite_health_factor();
    }

    let health_factor = div_half_up(weighted_collateral, borrowed_value, RAY_PRECISION);

    rescale_half_up(&health_factor, WAD_PRECISION)
}

/// Health factor of a position without debt.
pub fn infinite_health_factor<M: ManagedTypeApi>() -> ManagedDecimal<M, NumDecimals> {
    to_decimal_wad(BigUint::from(u128::MAX))
}

/// Debt over collateral, zero when no collateral is posted.
pub fn loan_to_value<M: ManagedTypeApi>(
    borrowed_value: &ManagedDecimal<M, NumDecimals>,
    collateral_value: &ManagedDecimal<M, NumDecimals>,
) -> ManagedDecimal<M, NumDecimals> {
    rescale_half_up(
        &safe_div_half_up(borrowed_value, collateral_value, RAY_PRECISION),
        WAD_PRECISION,
    )
}

/// Share of the debt that a single liquidation may repay.
///
/// **Formula**:
/// - `health_factor > 0.95`: half of the debt (`DEFAULT_LIQUIDATION_CLOSE_FACTOR`).
/// - otherwise: the whole debt (`MAX_LIQUIDATION_CLOSE_FACTOR`).
///
/// # Returns
/// - Close factor in BPS precision.
pub fn close_factor<M: ManagedTypeApi>(
    health_factor: &ManagedDecimal<M, NumDecimals>,
) -> ManagedDecimal<M, NumDecimals> {
    let threshold = to_decimal_wad(BigUint::from(CLOSE_FACTOR_HF_THRESHOLD));
    if health_factor.rescale(WAD_PRECISION) > threshold {
        to_decimal_bps(BigUint::from(DEFAULT_LIQUIDATION_CLOSE_FACTOR))
    } else {
        to_decimal_bps(BigUint::from(MAX_LIQUIDATION_CLOSE_FACTOR))
    }
}

/// `1 + bonus` for a BPS based liquidation bonus, BPS precision.
pub fn bonus_multiplier<M: ManagedTypeApi>(
    liquidation_bonus_bps: &ManagedDecimal<M, NumDecimals>,
) -> ManagedDecimal<M, NumDecimals> {
    bps() + liquidation_bonus_bps.clone()
}
