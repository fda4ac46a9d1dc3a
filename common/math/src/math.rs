#![no_std]

extern crate alloc;

use core::{cmp::Ordering, fmt};

use common_constants::{BPS, BPS_PRECISION, RAY, RAY_PRECISION, WAD, WAD_PRECISION};

multiversx_sc::imports!();

fn power_of_ten<M: ManagedTypeApi>(exponent: NumDecimals) -> BigUint<M> {
    BigUint::from(10u64).pow(exponent as u32)
}

/// `numerator / denominator`, ties rounded up.
fn quotient_half_up<M: ManagedTypeApi>(
    numerator: BigUint<M>,
    denominator: &BigUint<M>,
) -> BigUint<M> {
    &(numerator + denominator / &BigUint::from(2u64)) / denominator
}

/// `numerator / denominator`, ties rounded away from zero.
fn quotient_half_away<M: ManagedTypeApi>(
    numerator: BigInt<M>,
    denominator: &BigInt<M>,
) -> BigInt<M> {
    let half = denominator / &BigInt::from(2i64);
    if numerator.sign() != denominator.sign() {
        &(numerator - half) / denominator
    } else {
        &(numerator + half) / denominator
    }
}

/// `a * b` at `precision`, both operands rescaled to `precision` first.
pub fn mul_half_up<M: ManagedTypeApi>(
    a: &ManagedDecimal<M, NumDecimals>,
    b: &ManagedDecimal<M, NumDecimals>,
    precision: NumDecimals,
) -> ManagedDecimal<M, NumDecimals> {
    let product = a.rescale(precision).into_raw_units() * b.rescale(precision).into_raw_units();

    to_decimal(quotient_half_up(product, &power_of_ten(precision)), precision)
}

/// Callers guarantee a non-zero divisor, see [`safe_div_half_up`] otherwise.
pub fn div_half_up<M: ManagedTypeApi>(
    a: &ManagedDecimal<M, NumDecimals>,
    b: &ManagedDecimal<M, NumDecimals>,
    precision: NumDecimals,
) -> ManagedDecimal<M, NumDecimals> {
    let numerator = a.rescale(precision).into_raw_units() * &power_of_ten::<M>(precision);
    let divisor = b.rescale(precision);

    to_decimal(quotient_half_up(numerator, divisor.into_raw_units()), precision)
}

/// Division where a zero denominator yields zero instead of failing.
pub fn safe_div_half_up<M: ManagedTypeApi>(
    a: &ManagedDecimal<M, NumDecimals>,
    b: &ManagedDecimal<M, NumDecimals>,
    precision: NumDecimals,
) -> ManagedDecimal<M, NumDecimals> {
    if is_zero(b) {
        return to_decimal(BigUint::zero(), precision);
    }
    div_half_up(a, b, precision)
}

pub fn mul_half_up_signed<M: ManagedTypeApi>(
    a: &ManagedDecimalSigned<M, NumDecimals>,
    b: &ManagedDecimalSigned<M, NumDecimals>,
    precision: NumDecimals,
) -> ManagedDecimalSigned<M, NumDecimals> {
    let product = a.rescale(precision).into_raw_units() * b.rescale(precision).into_raw_units();
    let unit = BigInt::<M>::from(10i64).pow(precision as u32);

    ManagedDecimalSigned::from_raw_units(quotient_half_away(product, &unit), precision)
}

pub fn div_half_up_signed<M: ManagedTypeApi>(
    a: &ManagedDecimalSigned<M, NumDecimals>,
    b: &ManagedDecimalSigned<M, NumDecimals>,
    precision: NumDecimals,
) -> ManagedDecimalSigned<M, NumDecimals> {
    let unit = BigInt::<M>::from(10i64).pow(precision as u32);
    let numerator = a.rescale(precision).into_raw_units() * &unit;
    let divisor = b.rescale(precision);

    ManagedDecimalSigned::from_raw_units(
        quotient_half_away(numerator, divisor.into_raw_units()),
        precision,
    )
}

/// Signed division where a zero denominator yields zero.
pub fn safe_div_half_up_signed<M: ManagedTypeApi>(
    a: &ManagedDecimalSigned<M, NumDecimals>,
    b: &ManagedDecimalSigned<M, NumDecimals>,
    precision: NumDecimals,
) -> ManagedDecimalSigned<M, NumDecimals> {
    if b.into_raw_units() == &BigInt::zero() {
        return ManagedDecimalSigned::from_raw_units(BigInt::zero(), precision);
    }
    div_half_up_signed(a, b, precision)
}

/// `base^exponent` by repeated squaring, every step rounded half-up at `precision`.
pub fn pow_half_up<M: ManagedTypeApi>(
    base: &ManagedDecimal<M, NumDecimals>,
    exponent: u64,
    precision: NumDecimals,
) -> ManagedDecimal<M, NumDecimals> {
    let mut result = to_decimal(power_of_ten(precision), precision);
    let mut square = base.rescale(precision);
    let mut remaining = exponent;

    while remaining > 0 {
        if remaining & 1 == 1 {
            result = mul_half_up(&result, &square, precision);
        }
        remaining >>= 1;
        if remaining > 0 {
            square = mul_half_up(&square, &square, precision);
        }
    }

    result
}

pub fn rescale_half_up<M: ManagedTypeApi>(
    value: &ManagedDecimal<M, NumDecimals>,
    new_precision: NumDecimals,
) -> ManagedDecimal<M, NumDecimals> {
    let old_precision = value.scale();
    let raw_value = value.into_raw_units();

    match new_precision.cmp(&old_precision) {
        Ordering::Equal => value.clone(),
        Ordering::Less => {
            let factor = power_of_ten::<M>(old_precision - new_precision);
            ManagedDecimal::from_raw_units(
                quotient_half_up(raw_value.clone(), &factor),
                new_precision,
            )
        },
        Ordering::Greater => value.rescale(new_precision),
    }
}

pub fn to_decimal<M: ManagedTypeApi>(
    value: BigUint<M>,
    precision: NumDecimals,
) -> ManagedDecimal<M, NumDecimals> {
    ManagedDecimal::from_raw_units(value, precision)
}

pub fn to_decimal_wad<M: ManagedTypeApi>(value: BigUint<M>) -> ManagedDecimal<M, NumDecimals> {
    to_decimal(value, WAD_PRECISION)
}

pub fn to_decimal_ray<M: ManagedTypeApi>(value: BigUint<M>) -> ManagedDecimal<M, NumDecimals> {
    to_decimal(value, RAY_PRECISION)
}

pub fn to_decimal_bps<M: ManagedTypeApi>(value: BigUint<M>) -> ManagedDecimal<M, NumDecimals> {
    to_decimal(value, BPS_PRECISION)
}

pub fn bps_zero<M: ManagedTypeApi>() -> ManagedDecimal<M, NumDecimals> {
    to_decimal_bps(BigUint::zero())
}

pub fn wad_zero<M: ManagedTypeApi>() -> ManagedDecimal<M, NumDecimals> {
    to_decimal_wad(BigUint::zero())
}

pub fn ray_zero<M: ManagedTypeApi>() -> ManagedDecimal<M, NumDecimals> {
    to_decimal_ray(BigUint::zero())
}

pub fn ray<M: ManagedTypeApi>() -> ManagedDecimal<M, NumDecimals> {
    to_decimal(BigUint::from(RAY), RAY_PRECISION)
}

pub fn wad<M: ManagedTypeApi>() -> ManagedDecimal<M, NumDecimals> {
    to_decimal(BigUint::from(WAD), WAD_PRECISION)
}

pub fn bps<M: ManagedTypeApi>() -> ManagedDecimal<M, NumDecimals> {
    to_decimal(BigUint::from(BPS), BPS_PRECISION)
}

pub fn is_zero<M: ManagedTypeApi>(value: &ManagedDecimal<M, NumDecimals>) -> bool {
    value.into_raw_units() == &BigUint::zero()
}

pub fn get_min<M: ManagedTypeApi>(
    a: ManagedDecimal<M, NumDecimals>,
    b: ManagedDecimal<M, NumDecimals>,
) -> ManagedDecimal<M, NumDecimals> {
    if a < b {
        a
    } else {
        b
    }
}

pub fn get_max<M: ManagedTypeApi>(
    a: ManagedDecimal<M, NumDecimals>,
    b: ManagedDecimal<M, NumDecimals>,
) -> ManagedDecimal<M, NumDecimals> {
    if a > b {
        a
    } else {
        b
    }
}

/// Parses a plain decimal literal such as `"1250.75"` into a fixed-point value.
///
/// Digits beyond `precision` are rounded half-up. Signs, exponents and separators are
/// rejected.
///
/// # Arguments
/// - `literal`: Decimal string with an optional fractional part.
/// - `precision`: Number of decimals of the returned value.
///
/// # Returns
/// - `Some(value)` at `precision`, `None` when the literal is malformed.
pub fn parse_decimal<M: ManagedTypeApi>(
    literal: &str,
    precision: NumDecimals,
) -> Option<ManagedDecimal<M, NumDecimals>> {
    let literal = literal.trim();
    let (integer_part, fraction_part) = match literal.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (literal, ""),
    };
    if integer_part.is_empty() && fraction_part.is_empty() {
        return None;
    }

    let ten = BigUint::<M>::from(10u64);
    let mut raw = BigUint::<M>::zero();
    for digit in integer_part.bytes() {
        raw = raw * &ten + BigUint::from(ascii_digit(digit)?);
    }

    let mut consumed = 0usize;
    let mut round_up = false;
    for (position, digit) in fraction_part.bytes().enumerate() {
        let value = ascii_digit(digit)?;
        if position < precision {
            raw = raw * &ten + BigUint::from(value);
            consumed += 1;
        } else if position == precision {
            round_up = value >= 5;
        }
    }

    if consumed < precision {
        raw *= ten.pow((precision - consumed) as u32);
    }
    if round_up {
        raw += 1u64;
    }

    Some(to_decimal(raw, precision))
}

fn ascii_digit(byte: u8) -> Option<u64> {
    if byte.is_ascii_digit() {
        Some((byte - b'0') as u64)
    } else {
        None
    }
}

/// `Display` adapter printing a decimal with all of its `scale()` fractional digits.
pub struct DecimalDisplay<'a, M: ManagedTypeApi>(pub &'a ManagedDecimal<M, NumDecimals>);

impl<M: ManagedTypeApi> fmt::Display for DecimalDisplay<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = self.0.scale();
        let ten = BigUint::<M>::from(10u64);
        let zero = BigUint::<M>::zero();

        let mut digits = alloc::vec::Vec::new();
        let mut remaining = self.0.into_raw_units().clone();
        while remaining > zero || digits.len() <= scale {
            let digit = (&remaining % &ten).to_u64().unwrap_or_default() as u8;
            digits.push(b'0' + digit);
            remaining /= &ten;
        }

        for (position, digit) in digits.iter().rev().enumerate() {
            if position == digits.len() - scale {
                f.write_str(".")?;
            }
            write!(f, "{}", *digit as char)?;
        }
        Ok(())
    }
}
