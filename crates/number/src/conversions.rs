//! Exact conversions between human readable token amounts and the integer
//! base units a token contract operates on.
//!
//! Amounts are never routed through binary floating point: `7.5` tokens with
//! 18 decimals is exactly `7_500_000_000_000_000_000` base units and converts
//! back to exactly `7.5`.

use {
    crate::u256_ext::U256Ext,
    alloy::primitives::U256,
    anyhow::{Context, Result, ensure},
    bigdecimal::BigDecimal,
    num::{BigInt, Integer, Zero, bigint::Sign},
};

/// Converts a decimal token amount into base units by scaling it with
/// `10^decimals`.
///
/// Fails if the amount is negative, carries more fractional digits than the
/// token supports or does not fit into a [`U256`].
pub fn to_base_units(amount: &BigDecimal, decimals: u8) -> Result<U256> {
    ensure!(amount.sign() != Sign::Minus, "negative token amount {amount}");

    // amount == digits * 10^-scale
    let (digits, scale) = amount.as_bigint_and_exponent();
    let shift = i64::from(decimals) - scale;
    let units = if shift >= 0 {
        digits * pow10(shift.unsigned_abs())?
    } else {
        let (units, remainder) = digits.div_rem(&pow10(shift.unsigned_abs())?);
        ensure!(
            remainder.is_zero(),
            "token amount {amount} has more than {decimals} decimals"
        );
        units
    };

    U256::from_big_int(&units).with_context(|| format!("token amount {amount} out of range"))
}

/// Converts base units back into a decimal token amount.
pub fn from_base_units(units: U256, decimals: u8) -> BigDecimal {
    BigDecimal::new(units.to_big_int(), i64::from(decimals)).normalized()
}

fn pow10(exponent: u64) -> Result<BigInt> {
    let exponent = u32::try_from(exponent).context("decimal exponent too large")?;
    Ok(num::pow(BigInt::from(10), exponent as usize))
}
